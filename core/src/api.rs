//! Stable re-exports for consumers (`cli`, `plugins`, and external crates).
//!
//! Prefer importing from `maptoposter_core::api` instead of reaching into internal modules.

pub use crate::bridge::{
    new_job_id, JobBridge, JobOutcome, JobRegistration, JobRegistry, JobReport, JobState, Normalizer,
    EVENT_CHANNEL_CAPACITY,
};
pub use crate::config::{
    AppConfig, InlineStrategyConfig, LoggingConfig, ProcessStrategyConfig, RemoteStrategyConfig,
    ServerConfig, StrategyConfig,
};
pub use crate::error::{CliError, ConfigError, JobError, TaskApiError};
pub use crate::events::{
    decode, encode, ErrorEvent, FrameDecoder, JobEvent, ProgressEvent, ResultEvent,
};
pub use crate::extract::ResultExtractor;
pub use crate::progress::{ProgressClassifier, ProgressRule};
pub use crate::remote::{
    ErrorRewriter, RemotePoller, RemoteTask, SubmitResponse, TaskApi, TaskState, TaskStatus,
};
pub use crate::request::{CustomColors, CustomLayer, GenerationRequest};
pub use crate::runner::{CommandSpec, ExitOutcome, LineTap, OutputStream, SupervisedProcess};
pub use crate::strategy::{ExecutionStrategy, InlineResponse, RawSignal, StrategySession};

/// Normalizer built from the `[progress]`, `[result]` and `[errors]` sections.
pub fn normalizer_from_config(cfg: &AppConfig) -> Normalizer {
    Normalizer::new(
        ProgressClassifier::new(cfg.progress.rules.clone()),
        ResultExtractor::new(cfg.result.marker.clone()),
        ErrorRewriter::new(cfg.errors.rewrites.clone()),
    )
}
