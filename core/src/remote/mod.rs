mod api;
mod poller;
mod rewrite;
mod types;

pub use api::TaskApi;
pub use poller::{RemotePoller, RemoteTask};
pub use rewrite::{default_rewrites, ErrorRewrite, ErrorRewriter};
pub use types::{SubmitResponse, TaskProgress, TaskResult, TaskState, TaskStatus};
