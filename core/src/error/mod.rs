mod cli_error;
mod config_error;
mod extract_error;
mod frame_error;
mod job_error;
mod supervisor_error;
mod task_api_error;

pub use cli_error::CliError;
pub use config_error::ConfigError;
pub use extract_error::ExtractError;
pub use frame_error::FrameError;
pub use job_error::JobError;
pub use supervisor_error::SupervisorError;
pub use task_api_error::TaskApiError;
