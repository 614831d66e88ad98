mod codec;
mod model;

pub use codec::{decode, encode, FrameDecoder};
pub use model::{ErrorEvent, JobEvent, ProgressEvent, ResultEvent};
