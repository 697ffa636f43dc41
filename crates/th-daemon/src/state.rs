//! Shared runtime state for th-daemon.
//!
//! Handlers receive `State<Arc<AppState>>` from Axum. The calendar lives in
//! a `SharedSnapshot`: each request takes one `Arc<Snapshot>` and answers
//! entirely from it, so a concurrent reload never mixes two versions.

use std::path::PathBuf;

use serde::Serialize;
use th_calendar::{SharedSnapshot, Snapshot, SnapshotSummary};
use th_store::StoreError;
use tokio::sync::Mutex;
use tracing::info;

/// Static build metadata included in health / info responses.
#[derive(Clone, Debug, Serialize)]
pub struct BuildInfo {
    pub service: &'static str,
    pub version: &'static str,
}

pub struct AppState {
    pub build: BuildInfo,
    pub snapshot: SharedSnapshot,
    /// Export directory re-read by `POST /v1/reload`.
    pub data_dir: PathBuf,
    pub config_hash: String,
    /// Serializes reloads; readers never take it.
    reload_lock: Mutex<()>,
}

impl AppState {
    pub fn new(snapshot: Snapshot, data_dir: PathBuf, config_hash: String) -> Self {
        Self {
            build: BuildInfo {
                service: "th-daemon",
                version: env!("CARGO_PKG_VERSION"),
            },
            snapshot: SharedSnapshot::new(snapshot),
            data_dir,
            config_hash,
            reload_lock: Mutex::new(()),
        }
    }

    /// Re-reads the data directory and publishes the result. On failure the
    /// current snapshot stays in place.
    pub async fn reload(&self) -> Result<SnapshotSummary, StoreError> {
        let _guard = self.reload_lock.lock().await;
        let dir = self.data_dir.clone();
        let loaded = tokio::task::spawn_blocking(move || th_store::load_snapshot(&dir))
            .await
            .map_err(|e| StoreError::Io(format!("reload task failed: {e}")))??;
        let summary = loaded.summary();
        self.snapshot.publish(loaded);
        info!(
            markets = summary.markets,
            schedules = summary.schedules,
            holidays = summary.holidays,
            "snapshot reloaded"
        );
        Ok(summary)
    }
}

/// Seconds since first call (process lifetime).
pub fn uptime_secs() -> u64 {
    static START: std::sync::OnceLock<std::time::Instant> = std::sync::OnceLock::new();
    START
        .get_or_init(std::time::Instant::now)
        .elapsed()
        .as_secs()
}
