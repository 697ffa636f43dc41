//! th-daemon entry point.
//!
//! Thin: loads config and the calendar export, wires middleware, serves.
//! Handlers live in `routes.rs`; shared state in `state.rs`.

use std::{net::SocketAddr, path::PathBuf, sync::Arc};

use anyhow::Context;
use axum::http::{HeaderValue, Method};
use clap::Parser;
use th_config::{report_unused_keys, AppConfig, UnusedKeyPolicy};
use th_daemon::{routes, state};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::{info, warn, Level};

#[derive(Parser)]
#[command(name = "th-daemon")]
#[command(about = "Read-only trading-hours calendar server", long_about = None)]
struct Args {
    /// Layered config paths in merge order
    #[arg(long = "config")]
    config_paths: Vec<String>,

    /// Calendar export directory; overrides config and TH_DATA_DIR
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Bind address; overrides config and TH_DAEMON_ADDR
    #[arg(long)]
    addr: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Silent if the file does not exist; production injects env vars directly.
    dotenvy::from_filename(".env.local").ok();

    let args = Args::parse();
    let path_refs: Vec<&str> = args.config_paths.iter().map(|s| s.as_str()).collect();
    let (mut config, loaded) = AppConfig::load(&path_refs)?;
    config.apply_env();
    if let Some(dir) = args.data_dir {
        config.data.dir = dir.display().to_string();
    }
    if let Some(addr) = args.addr {
        config.server.addr = addr;
    }

    init_tracing(&config.log.filter);

    let report = report_unused_keys(&loaded.config_json, UnusedKeyPolicy::Warn)?;
    for key in &report.unused_leaf_pointers {
        warn!(key = %key, "unused config key");
    }

    let data_dir = PathBuf::from(&config.data.dir);
    let snapshot = th_store::load_snapshot(&data_dir)
        .with_context(|| format!("load calendar data from {}", data_dir.display()))?;
    let shared = Arc::new(state::AppState::new(snapshot, data_dir, loaded.config_hash));

    let app = routes::build_router(Arc::clone(&shared))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors_localhost_only());

    let addr: SocketAddr = config
        .server
        .addr
        .parse()
        .with_context(|| format!("invalid server.addr '{}'", config.server.addr))?;
    info!("th-daemon listening on http://{}", addr);

    axum::serve(tokio::net::TcpListener::bind(addr).await?, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("calendar server stopped with an error")?;

    Ok(())
}

fn init_tracing(default_filter: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .init();
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("shutdown requested");
    }
}

/// Browser access is limited to local dashboards (bare host or dev ports).
fn cors_localhost_only() -> CorsLayer {
    const HOSTS: [&str; 2] = ["localhost", "127.0.0.1"];
    const PORTS: [Option<u16>; 3] = [None, Some(3000), Some(5173)];

    let origins: Vec<HeaderValue> = HOSTS
        .iter()
        .flat_map(|host| {
            PORTS.iter().map(move |port| match port {
                Some(port) => format!("http://{host}:{port}"),
                None => format!("http://{host}"),
            })
        })
        .filter_map(|origin| HeaderValue::from_str(&origin).ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(tower_http::cors::Any)
}
