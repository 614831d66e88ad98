use maptoposter_core::api::{AppConfig, CliError};
use maptoposter_plugins::build_bridge;
use tokio::sync::broadcast;
use tracing::info;

use crate::commands::cli::ServeArgs;
use crate::http::{server::start_server_with_config, AppState};

pub async fn handle_serve(args: ServeArgs, mut cfg: AppConfig) -> Result<(), CliError> {
    if let Some(host) = args.host {
        cfg.server.host = host;
    }
    if let Some(port) = args.port {
        cfg.server.port = port;
    }
    if let Some(dir) = args.artifacts_dir {
        cfg.server.artifacts_dir = dir;
    }

    let bridge = build_bridge(&cfg).map_err(|e| CliError::Server(format!("{e:#}")))?;
    info!(
        strategy = bridge.strategy_name(),
        artifacts_dir = %cfg.server.artifacts_dir.display(),
        "bridge ready"
    );

    let (shutdown_tx, _) = broadcast::channel(4);
    let state = AppState::new(bridge, cfg.server.artifacts_dir.clone(), shutdown_tx);

    start_server_with_config(&cfg.server, state)
        .await
        .map_err(|e| CliError::Server(e.to_string()))
}
