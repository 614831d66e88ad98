//! Drives one strategy session and turns its raw signals into the caller's
//! event sequence.

mod normalize;
mod registry;
mod run;
mod state;

pub use normalize::{Normalizer, Step};
pub use registry::{JobRegistration, JobRegistry};
pub use run::{JobBridge, EVENT_CHANNEL_CAPACITY};
pub use state::{new_job_id, Job, JobOutcome, JobReport, JobState};
