use std::collections::HashMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::extract::DEFAULT_MARKER;
use crate::progress::{default_rules, ProgressRule};
use crate::remote::{default_rewrites, ErrorRewrite};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub strategy: StrategyConfig,

    #[serde(default)]
    pub progress: ProgressConfig,

    #[serde(default)]
    pub errors: ErrorsConfig,

    #[serde(default)]
    pub result: ResultConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

// ---------------------------------------------------------------------------
// [server]
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Directory the worker writes posters into; served under `/posters`.
    #[serde(default = "default_artifacts_dir")]
    pub artifacts_dir: PathBuf,

    /// Allow any localhost origin. Off means no CORS layer at all.
    #[serde(default = "default_true")]
    pub cors: bool,

    /// Timeout for the short request/response routes. The event stream is
    /// exempt since a render can legitimately take minutes.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    #[serde(default = "default_artifact_max_age_hours")]
    pub artifact_max_age_hours: u64,

    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8787
}

fn default_artifacts_dir() -> PathBuf {
    PathBuf::from("posters")
}

fn default_true() -> bool {
    true
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_artifact_max_age_hours() -> u64 {
    24
}

fn default_sweep_interval_secs() -> u64 {
    3_600
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            artifacts_dir: default_artifacts_dir(),
            cors: default_true(),
            request_timeout_secs: default_request_timeout_secs(),
            artifact_max_age_hours: default_artifact_max_age_hours(),
            sweep_interval_secs: default_sweep_interval_secs(),
        }
    }
}

// ---------------------------------------------------------------------------
// [strategy]
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum StrategyConfig {
    Process(ProcessStrategyConfig),
    Remote(RemoteStrategyConfig),
    Inline(InlineStrategyConfig),
}

impl StrategyConfig {
    pub fn kind(&self) -> &'static str {
        match self {
            StrategyConfig::Process(_) => "process",
            StrategyConfig::Remote(_) => "remote",
            StrategyConfig::Inline(_) => "inline",
        }
    }
}

impl Default for StrategyConfig {
    fn default() -> Self {
        StrategyConfig::Process(ProcessStrategyConfig::default())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessStrategyConfig {
    /// Worker executable. Resolved through `PATH` when not absolute.
    #[serde(default = "default_program")]
    pub program: String,

    /// Arguments placed before the request flags, e.g. the script path.
    #[serde(default = "default_process_args")]
    pub args: Vec<String>,

    #[serde(default)]
    pub workdir: Option<PathBuf>,

    #[serde(default)]
    pub env: HashMap<String, String>,
}

fn default_program() -> String {
    "python3".to_string()
}

fn default_process_args() -> Vec<String> {
    vec!["create_map_poster.py".to_string()]
}

impl Default for ProcessStrategyConfig {
    fn default() -> Self {
        Self {
            program: default_program(),
            args: default_process_args(),
            workdir: None,
            env: HashMap::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteStrategyConfig {
    #[serde(default = "default_api_url")]
    pub base_url: String,

    #[serde(default = "default_submit_path")]
    pub submit_path: String,

    #[serde(default = "default_tasks_path")]
    pub tasks_path: String,

    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Status checks before giving up with a poll timeout.
    #[serde(default = "default_max_poll_attempts")]
    pub max_poll_attempts: u32,

    #[serde(default = "default_remote_timeout_ms")]
    pub request_timeout_ms: u64,
}

fn default_api_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_submit_path() -> String {
    "/generate".to_string()
}

fn default_tasks_path() -> String {
    "/tasks".to_string()
}

fn default_poll_interval_ms() -> u64 {
    1_000
}

fn default_max_poll_attempts() -> u32 {
    900
}

fn default_remote_timeout_ms() -> u64 {
    10_000
}

impl Default for RemoteStrategyConfig {
    fn default() -> Self {
        Self {
            base_url: default_api_url(),
            submit_path: default_submit_path(),
            tasks_path: default_tasks_path(),
            poll_interval_ms: default_poll_interval_ms(),
            max_poll_attempts: default_max_poll_attempts(),
            request_timeout_ms: default_remote_timeout_ms(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InlineStrategyConfig {
    #[serde(default = "default_api_url")]
    pub base_url: String,

    #[serde(default = "default_submit_path")]
    pub path: String,

    /// A synchronous render holds the connection open for its whole run.
    #[serde(default = "default_inline_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_inline_timeout_ms() -> u64 {
    600_000
}

impl Default for InlineStrategyConfig {
    fn default() -> Self {
        Self {
            base_url: default_api_url(),
            path: default_submit_path(),
            timeout_ms: default_inline_timeout_ms(),
        }
    }
}

// ---------------------------------------------------------------------------
// [progress] / [errors] / [result]
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressConfig {
    #[serde(default = "default_rules")]
    pub rules: Vec<ProgressRule>,
}

impl Default for ProgressConfig {
    fn default() -> Self {
        Self {
            rules: default_rules(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorsConfig {
    #[serde(default = "default_rewrites")]
    pub rewrites: Vec<ErrorRewrite>,
}

impl Default for ErrorsConfig {
    fn default() -> Self {
        Self {
            rewrites: default_rewrites(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultConfig {
    #[serde(default = "default_marker")]
    pub marker: String,
}

fn default_marker() -> String {
    DEFAULT_MARKER.to_string()
}

impl Default for ResultConfig {
    fn default() -> Self {
        Self {
            marker: default_marker(),
        }
    }
}

// ---------------------------------------------------------------------------
// [logging]
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Also write a daily-rotated log file here.
    #[serde(default)]
    pub directory: Option<PathBuf>,

    #[serde(default = "default_log_file_prefix")]
    pub file_prefix: String,

    #[serde(default)]
    pub ansi: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_file_prefix() -> String {
    "maptoposter.log".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            directory: None,
            file_prefix: default_log_file_prefix(),
            ansi: false,
        }
    }
}
