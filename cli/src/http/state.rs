//! HTTP服务器共享状态

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use maptoposter_core::api::{JobBridge, JobRegistry};
use tokio::sync::broadcast;

#[derive(Clone)]
pub struct AppState {
    pub bridge: JobBridge,
    pub registry: JobRegistry,
    /// Files under this directory are served at `/posters/{filename}`.
    pub artifacts_dir: Arc<PathBuf>,
    pub started_at: Instant,
    pub shutdown_tx: broadcast::Sender<()>,
}

impl AppState {
    pub fn new(
        bridge: JobBridge,
        artifacts_dir: impl Into<PathBuf>,
        shutdown_tx: broadcast::Sender<()>,
    ) -> Self {
        Self {
            bridge,
            registry: JobRegistry::new(),
            artifacts_dir: Arc::new(artifacts_dir.into()),
            started_at: Instant::now(),
            shutdown_tx,
        }
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}
