use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;

use maptoposter_core::api::{
    normalizer_from_config, AppConfig, ExecutionStrategy, JobBridge, StrategyConfig,
};

use crate::client::{HttpTaskApi, InlineRenderer};
use crate::strategy::{InlineStrategy, ProcessStrategy, RemoteStrategy};

pub fn build_strategy(cfg: &AppConfig) -> Result<Arc<dyn ExecutionStrategy>> {
    match &cfg.strategy {
        StrategyConfig::Process(p_cfg) => Ok(Arc::new(ProcessStrategy::new(p_cfg))),
        StrategyConfig::Remote(r_cfg) => {
            let api = HttpTaskApi::new(
                r_cfg.base_url.clone(),
                r_cfg.submit_path.clone(),
                r_cfg.tasks_path.clone(),
                r_cfg.request_timeout_ms,
            )?;
            Ok(Arc::new(RemoteStrategy::new(
                Arc::new(api),
                Duration::from_millis(r_cfg.poll_interval_ms),
                r_cfg.max_poll_attempts,
            )))
        }
        StrategyConfig::Inline(i_cfg) => {
            let renderer = InlineRenderer::new(&i_cfg.base_url, &i_cfg.path, i_cfg.timeout_ms)?;
            Ok(Arc::new(InlineStrategy::new(renderer)))
        }
    }
}

pub fn build_bridge(cfg: &AppConfig) -> Result<JobBridge> {
    let strategy = build_strategy(cfg)?;
    tracing::info!(strategy = strategy.name(), "execution strategy ready");
    Ok(JobBridge::new(strategy, normalizer_from_config(cfg)))
}
