pub mod inline;
pub mod process;
pub mod remote;

pub use inline::InlineStrategy;
pub use process::{worker_args, ProcessStrategy};
pub use remote::RemoteStrategy;
