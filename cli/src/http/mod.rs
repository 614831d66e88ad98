//! HTTP服务: 生成任务事件流、任务取消、海报下载

pub mod artifacts;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod server;
pub mod state;
pub mod stream;

pub use error::HttpServerError;
pub use state::AppState;
