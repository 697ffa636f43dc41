use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use th_config::{report_unused_keys, AppConfig, UnusedKeyPolicy};
use tracing::warn;

mod commands;

use commands::Output;

#[derive(Parser)]
#[command(name = "th")]
#[command(about = "Market trading-hours calendar", long_about = None)]
struct Cli {
    /// Layered config paths in merge order (base -> site -> local)
    #[arg(long = "config", global = true)]
    config_paths: Vec<String>,

    /// Calendar export directory; overrides config and TH_DATA_DIR
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Print JSON instead of the display templates
    #[arg(long, global = true, default_value_t = false)]
    json: bool,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List markets, optionally filtered by a FinID glob (e.g. "US.*")
    Markets {
        #[arg(long)]
        pattern: Option<String>,
    },

    /// Show one market by FinID or MIC
    Market {
        id: String,

        /// Do not follow the replacement chain
        #[arg(long, default_value_t = false)]
        no_follow: bool,
    },

    /// Schedule rules of a market, by group
    Schedules { id: String },

    /// Holidays of a market between two dates (inclusive)
    Holidays {
        id: String,
        #[arg(long)]
        start: String,
        #[arg(long)]
        end: String,
    },

    /// Concrete phases of a market between two dates (inclusive)
    Phases {
        id: String,
        #[arg(long)]
        start: String,
        #[arg(long)]
        end: String,
    },

    /// Open/closed status at an instant
    Status {
        id: String,

        /// RFC 3339 instant with offset; defaults to now
        #[arg(long)]
        at: Option<String>,
    },

    /// List currencies
    Currencies,

    /// Holidays of a currency between two dates (inclusive)
    CurrencyHolidays {
        code: String,
        #[arg(long)]
        start: String,
        #[arg(long)]
        end: String,
    },

    /// Compute layered config hash + print canonical JSON
    ConfigHash {
        /// Paths in merge order
        #[arg(required = true)]
        paths: Vec<String>,
    },
}

fn main() -> Result<()> {
    // Silent if the file does not exist.
    let _ = dotenvy::from_filename(".env.local");

    let cli = Cli::parse();

    if let Commands::ConfigHash { paths } = &cli.cmd {
        let path_refs: Vec<&str> = paths.iter().map(|s| s.as_str()).collect();
        let loaded = th_config::load_layered_yaml(&path_refs)?;
        println!("config_hash={}", loaded.config_hash);
        println!("{}", loaded.canonical_json);
        return Ok(());
    }

    let path_refs: Vec<&str> = cli.config_paths.iter().map(|s| s.as_str()).collect();
    let (mut config, loaded) = AppConfig::load(&path_refs)?;
    config.apply_env();
    if let Some(dir) = &cli.data_dir {
        config.data.dir = dir.display().to_string();
    }

    init_tracing(&config.log.filter);

    let report = report_unused_keys(&loaded.config_json, UnusedKeyPolicy::Warn)?;
    for key in &report.unused_leaf_pointers {
        warn!(key = %key, "unused config key");
    }

    let snapshot = th_store::load_snapshot(Path::new(&config.data.dir))
        .with_context(|| format!("load calendar data from {}", config.data.dir))?;
    let out = Output::new(cli.json, &config.display);

    match cli.cmd {
        Commands::Markets { pattern } => commands::markets(&snapshot, &out, pattern.as_deref()),
        Commands::Market { id, no_follow } => commands::market(&snapshot, &out, &id, !no_follow),
        Commands::Schedules { id } => commands::schedules(&snapshot, &out, &id),
        Commands::Holidays { id, start, end } => {
            commands::holidays(&snapshot, &out, &id, &start, &end)
        }
        Commands::Phases { id, start, end } => commands::phases(&snapshot, &out, &id, &start, &end),
        Commands::Status { id, at } => commands::status(&snapshot, &out, &id, at.as_deref()),
        Commands::Currencies => commands::currencies(&snapshot, &out),
        Commands::CurrencyHolidays { code, start, end } => {
            commands::currency_holidays(&snapshot, &out, &code, &start, &end)
        }
        Commands::ConfigHash { .. } => Ok(()),
    }
}

/// Logs go to stderr so stdout stays parseable.
fn init_tracing(default_filter: &str) {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .init();
}
