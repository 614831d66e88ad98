//! HTTP服务器生命周期管理

use crate::http::{
    artifacts::spawn_sweeper,
    middleware::{create_cors_layer, create_trace_layer, request_logger},
    routes::create_router,
    AppState,
};
use axum::middleware;
use maptoposter_core::api::ServerConfig;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::signal;
use tracing::{info, warn};

/// 使用配置启动HTTP服务器, 直到收到关闭信号
pub async fn start_server_with_config(
    config: &ServerConfig,
    state: AppState,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    info!(
        "Starting HTTP server on {}:{} (strategy: {})",
        config.host,
        config.port,
        state.bridge.strategy_name()
    );

    tokio::fs::create_dir_all(state.artifacts_dir.as_path()).await?;

    let mut app = create_router(state.clone(), config)
        .layer(middleware::from_fn(request_logger))
        .layer(create_trace_layer());
    if config.cors {
        app = app.layer(create_cors_layer());
    }

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("HTTP server listening on http://{}", listener.local_addr()?);

    let sweeper = spawn_sweeper(
        state.artifacts_dir.to_path_buf(),
        Duration::from_secs(config.artifact_max_age_hours.saturating_mul(3600)),
        Duration::from_secs(config.sweep_interval_secs.max(1)),
        state.shutdown_tx.subscribe(),
    );

    let mut shutdown_rx = state.shutdown_tx.subscribe();
    let shutdown_state = state.clone();

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            tokio::select! {
                _ = signal::ctrl_c() => {
                    info!("Ctrl+C received");
                }
                _ = shutdown_rx.recv() => {
                    info!("Shutdown requested");
                }
                _ = wait_for_sigterm() => {
                    info!("SIGTERM received");
                }
            }

            // Open event streams only close once their jobs stop.
            let cancelled = shutdown_state.registry.cancel_all();
            let _ = shutdown_state.shutdown_tx.send(());
            info!(cancelled_jobs = cancelled, "Draining connections");
        })
        .await?;

    if let Err(e) = sweeper.await {
        warn!("Artifact sweeper ended abnormally: {}", e);
    }
    info!("HTTP server stopped");
    Ok(())
}

/// 等待 SIGTERM 信号（Unix系统）
#[cfg(unix)]
async fn wait_for_sigterm() {
    use tokio::signal::unix::{signal, SignalKind};

    match signal(SignalKind::terminate()) {
        Ok(mut sigterm) => {
            sigterm.recv().await;
        }
        Err(e) => {
            warn!("Failed to setup SIGTERM handler: {}", e);
            std::future::pending::<()>().await
        }
    }
}

/// Windows 系统不支持 SIGTERM，使用空操作
#[cfg(not(unix))]
async fn wait_for_sigterm() {
    std::future::pending::<()>().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use maptoposter_core::api::{JobBridge, Normalizer};
    use maptoposter_plugins::build_strategy;
    use tokio::sync::broadcast;

    #[tokio::test]
    async fn test_server_lifecycle() {
        let dir = tempfile::tempdir().unwrap();
        let artifacts = dir.path().join("posters");

        let (shutdown_tx, _) = broadcast::channel(4);
        let strategy = build_strategy(&Default::default()).unwrap();
        let state = AppState::new(
            JobBridge::new(strategy, Normalizer::default()),
            &artifacts,
            shutdown_tx.clone(),
        );

        let config = ServerConfig {
            port: 18787,
            ..ServerConfig::default()
        };

        let server_handle =
            tokio::spawn(async move { start_server_with_config(&config, state).await });

        tokio::time::sleep(Duration::from_millis(300)).await;

        let health = reqwest::get("http://127.0.0.1:18787/health").await.unwrap();
        assert!(health.status().is_success());

        let _ = shutdown_tx.send(());

        let result = tokio::time::timeout(Duration::from_secs(5), server_handle).await;
        assert!(result.is_ok(), "Server should shutdown gracefully");
        assert!(artifacts.is_dir());
    }
}
