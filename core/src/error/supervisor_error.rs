// core/src/error/supervisor_error.rs
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SupervisorError {
    #[error("worker executable not found: {program}")]
    NotFound { program: String },

    #[error("permission denied when starting worker: {program}")]
    PermissionDenied { program: String },

    #[error("failed to spawn process: {program}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("worker {stream} pipe was not captured")]
    MissingPipe { stream: &'static str },

    #[error("failed to wait for worker exit")]
    Wait(#[source] std::io::Error),
}

impl SupervisorError {
    pub fn from_spawn(program: &str, source: std::io::Error) -> Self {
        match source.kind() {
            std::io::ErrorKind::NotFound => SupervisorError::NotFound {
                program: program.to_string(),
            },
            std::io::ErrorKind::PermissionDenied => SupervisorError::PermissionDenied {
                program: program.to_string(),
            },
            _ => SupervisorError::Spawn {
                program: program.to_string(),
                source,
            },
        }
    }
}
