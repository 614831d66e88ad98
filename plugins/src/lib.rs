pub mod client;
pub mod factory;
pub mod strategy;

pub use factory::{build_bridge, build_strategy};
