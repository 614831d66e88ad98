// core/src/error/cli_error.rs
use thiserror::Error;

use super::ConfigError;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("command failed: {0}")]
    Command(String),

    #[error("server error: {0}")]
    Server(String),
}
