mod exit;
mod spawn;
mod supervisor;
mod tee;

pub use exit::{normalize_exit, ExitOutcome};
pub use spawn::CommandSpec;
pub use supervisor::SupervisedProcess;
pub use tee::{LineTap, OutputStream};
