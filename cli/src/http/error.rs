//! HTTP错误响应

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HttpServerError {
    #[error("{0}")]
    InvalidRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Internal(String),
}

impl HttpServerError {
    fn status(&self) -> StatusCode {
        match self {
            HttpServerError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            HttpServerError::NotFound(_) => StatusCode::NOT_FOUND,
            HttpServerError::Conflict(_) => StatusCode::CONFLICT,
            HttpServerError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            HttpServerError::InvalidRequest(_) => "INVALID_REQUEST",
            HttpServerError::NotFound(_) => "NOT_FOUND",
            HttpServerError::Conflict(_) => "JOB_EXISTS",
            HttpServerError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl IntoResponse for HttpServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(json!({
            "success": false,
            "error": self.to_string(),
            "error_code": self.code(),
        }));
        (status, body).into_response()
    }
}
