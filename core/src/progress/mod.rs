mod classifier;
mod tracker;

pub use classifier::{default_rules, ProgressClassifier, ProgressRule};
pub use tracker::ProgressTracker;
