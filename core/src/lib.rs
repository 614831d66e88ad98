pub mod api;
pub mod bridge;
pub mod config;
pub mod error;
pub mod events;
pub mod extract;
pub mod progress;
pub mod remote;
pub mod request;
pub mod runner;
pub mod strategy;
