//! HTTP路由handlers

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::Response,
    routing::{delete, get, post},
    Json, Router,
};
use chrono::Local;
use maptoposter_core::api::{
    new_job_id, GenerationRequest, JobError, JobEvent, ServerConfig, EVENT_CHANNEL_CAPACITY,
};
use serde_json::{json, Value};
use tokio::sync::mpsc;
use tracing::info;

use crate::http::{
    artifacts::poster_handler,
    error::HttpServerError,
    middleware::{create_timeout_layer, JOB_ID_HEADER},
    state::AppState,
    stream::event_stream_response,
};

/// 创建所有路由
///
/// 超时层只包住短请求; 事件流在任务结束前一直保持打开。
pub fn create_router(state: AppState, config: &ServerConfig) -> Router {
    let short = Router::new()
        .route("/api/jobs/:id", delete(cancel_job_handler))
        .route("/posters/:filename", get(poster_handler))
        .route("/health", get(health_handler))
        .route("/api/shutdown", post(shutdown_handler))
        .layer(create_timeout_layer(config.request_timeout_secs));

    Router::new()
        .route("/api/generate", post(generate_handler))
        .merge(short)
        .with_state(state)
}

/// Caller-chosen ids let a client cancel a job before the first frame
/// arrives. Anything unusual falls back to a generated id.
fn requested_job_id(headers: &HeaderMap) -> Option<String> {
    let id = headers.get(JOB_ID_HEADER)?.to_str().ok()?.trim();
    let usable = !id.is_empty()
        && id.len() <= 64
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    usable.then(|| id.to_string())
}

/// POST /api/generate - 启动生成任务并以事件流返回进度
async fn generate_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, HttpServerError> {
    let job_id = requested_job_id(&headers).unwrap_or_else(new_job_id);
    let registration = state
        .registry
        .register(job_id.clone())
        .ok_or_else(|| HttpServerError::Conflict(format!("Job {job_id} is already running")))?;

    let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);

    match serde_json::from_slice::<GenerationRequest>(&body) {
        Ok(request) => {
            let bridge = state.bridge.clone();
            let token = registration.token();
            tokio::spawn(async move {
                let report = bridge.run(job_id, request, tx, token).await;
                info!(
                    target: "maptoposter.http",
                    job_id = %report.id,
                    state = ?report.state,
                    duration_ms = ?report.duration_ms(),
                    "job finished"
                );
            });
        }
        Err(e) => {
            let err = JobError::Validation(format!("Invalid request body: {e}"));
            // Fresh channel with spare capacity; this cannot fail.
            let _ = tx.try_send(JobEvent::Error(err.to_event()));
        }
    }

    Ok(event_stream_response(registration, rx))
}

/// DELETE /api/jobs/{id} - 取消运行中的任务
async fn cancel_job_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, HttpServerError> {
    if state.registry.cancel(&id) {
        info!(target: "maptoposter.http", job_id = %id, "cancel requested");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(HttpServerError::NotFound(format!("No running job {id}")))
    }
}

/// GET /health - 健康检查
async fn health_handler(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "strategy": state.bridge.strategy_name(),
        "active_jobs": state.registry.len(),
        "uptime_seconds": state.uptime_seconds(),
        "timestamp": Local::now().to_rfc3339(),
    }))
}

/// POST /api/shutdown - 触发优雅关闭
async fn shutdown_handler(State(state): State<AppState>) -> Json<Value> {
    let _ = state.shutdown_tx.send(());

    Json(json!({
        "success": true,
        "message": "Shutdown signal sent"
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::Request;
    use maptoposter_core::api::{
        decode, ExecutionStrategy, InlineResponse, JobBridge, Normalizer, ProgressEvent,
        RawSignal, StrategySession,
    };
    use pretty_assertions::assert_eq;
    use std::time::Duration;
    use tokio::sync::broadcast;
    use tower::ServiceExt;

    /// Emits one checkpoint, then either finishes inline or hangs.
    struct FakeStrategy {
        hang: bool,
    }

    struct FakeSession {
        step: u8,
        hang: bool,
    }

    #[async_trait]
    impl ExecutionStrategy for FakeStrategy {
        fn name(&self) -> &str {
            "fake"
        }

        async fn submit(
            &self,
            _request: &GenerationRequest,
        ) -> Result<Box<dyn StrategySession>, JobError> {
            Ok(Box::new(FakeSession {
                step: 0,
                hang: self.hang,
            }))
        }
    }

    #[async_trait]
    impl StrategySession for FakeSession {
        async fn next_signal(&mut self) -> Option<Result<RawSignal, JobError>> {
            self.step += 1;
            match self.step {
                1 => Some(Ok(RawSignal::Checkpoint(ProgressEvent::new(
                    30,
                    "Fetching map data...",
                )))),
                _ if self.hang => std::future::pending().await,
                2 => Some(Ok(RawSignal::Inline(InlineResponse {
                    success: true,
                    file_url: Some("/posters/paris_noir.png".into()),
                    error: None,
                }))),
                _ => None,
            }
        }

        fn cancel(&mut self) {}
    }

    fn test_state(hang: bool, artifacts: &std::path::Path) -> AppState {
        let (shutdown_tx, _) = broadcast::channel(1);
        let bridge = JobBridge::new(
            std::sync::Arc::new(FakeStrategy { hang }),
            Normalizer::default(),
        );
        AppState::new(bridge, artifacts, shutdown_tx)
    }

    fn app(state: AppState) -> Router {
        create_router(state, &ServerConfig::default())
    }

    fn generate_request(body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api/generate")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_events(resp: Response) -> Vec<JobEvent> {
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        let (events, rest) = decode(&String::from_utf8_lossy(&bytes));
        assert_eq!(rest, "");
        events
    }

    #[tokio::test]
    async fn test_generate_streams_progress_then_result() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(false, dir.path());
        let resp = app(state.clone())
            .oneshot(generate_request(r#"{"city":"Paris","country":"France","theme":"noir"}"#))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers()["content-type"], "text/event-stream");
        assert_eq!(resp.headers()["cache-control"], "no-cache");
        assert!(resp.headers().contains_key(JOB_ID_HEADER));

        let events = body_events(resp).await;
        assert_eq!(
            events,
            vec![
                JobEvent::Progress(ProgressEvent::new(30, "Fetching map data...")),
                JobEvent::Result(maptoposter_core::api::ResultEvent {
                    files: vec!["paris_noir.png".into()]
                }),
            ]
        );
        assert!(state.registry.is_empty());
    }

    #[tokio::test]
    async fn test_generate_validation_error_is_single_frame() {
        let dir = tempfile::tempdir().unwrap();
        let resp = app(test_state(false, dir.path()))
            .oneshot(generate_request(r#"{"city":"Paris"}"#))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let events = body_events(resp).await;
        assert_eq!(events.len(), 1);
        let JobEvent::Error(err) = &events[0] else {
            panic!("expected error frame, got {events:?}");
        };
        assert_eq!(err.message, "Missing mandatory fields (city, country)");
    }

    #[tokio::test]
    async fn test_generate_unparseable_body_is_error_frame() {
        let dir = tempfile::tempdir().unwrap();
        let resp = app(test_state(false, dir.path()))
            .oneshot(generate_request("not json"))
            .await
            .unwrap();

        let events = body_events(resp).await;
        assert_eq!(events.len(), 1);
        let JobEvent::Error(err) = &events[0] else {
            panic!("expected error frame");
        };
        assert!(err.message.starts_with("Invalid request body"));
    }

    #[tokio::test]
    async fn test_cancel_running_job() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(true, dir.path());
        let router = app(state.clone());

        let mut req = generate_request(r#"{"city":"Paris","country":"France"}"#);
        req.headers_mut()
            .insert(JOB_ID_HEADER, "job-42".parse().unwrap());
        let resp = router.clone().oneshot(req).await.unwrap();
        assert_eq!(resp.headers()[JOB_ID_HEADER], "job-42");
        assert!(state.registry.contains("job-42"));

        let cancel = Request::builder()
            .method("DELETE")
            .uri("/api/jobs/job-42")
            .body(Body::empty())
            .unwrap();
        let cancelled = router.clone().oneshot(cancel).await.unwrap();
        assert_eq!(cancelled.status(), StatusCode::NO_CONTENT);

        let events = tokio::time::timeout(Duration::from_secs(5), body_events(resp))
            .await
            .unwrap();
        assert_eq!(
            events,
            vec![JobEvent::Progress(ProgressEvent::new(
                30,
                "Fetching map data..."
            ))]
        );
        assert!(!state.registry.contains("job-42"));
    }

    #[tokio::test]
    async fn test_duplicate_job_id_conflicts() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(true, dir.path());
        let router = app(state);

        let mut first = generate_request(r#"{"city":"Paris","country":"France"}"#);
        first
            .headers_mut()
            .insert(JOB_ID_HEADER, "same".parse().unwrap());
        let _held = router.clone().oneshot(first).await.unwrap();

        let mut second = generate_request(r#"{"city":"Paris","country":"France"}"#);
        second
            .headers_mut()
            .insert(JOB_ID_HEADER, "same".parse().unwrap());
        let resp = router.oneshot(second).await.unwrap();
        assert_eq!(resp.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_cancel_unknown_job_is_404() {
        let dir = tempfile::tempdir().unwrap();
        let req = Request::builder()
            .method("DELETE")
            .uri("/api/jobs/nope")
            .body(Body::empty())
            .unwrap();
        let resp = app(test_state(false, dir.path())).oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_health_reports_strategy() {
        let dir = tempfile::tempdir().unwrap();
        let req = Request::builder()
            .uri("/health")
            .body(Body::empty())
            .unwrap();
        let resp = app(test_state(false, dir.path())).oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["status"], "ok");
        assert_eq!(body["strategy"], "fake");
        assert_eq!(body["active_jobs"], 0);
    }

    #[tokio::test]
    async fn test_poster_download_and_errors() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("paris_noir.png"), b"\x89PNG").unwrap();
        let router = app(test_state(false, dir.path()));

        let get = |uri: &str| {
            Request::builder()
                .uri(uri.to_string())
                .body(Body::empty())
                .unwrap()
        };

        let resp = router.clone().oneshot(get("/posters/paris_noir.png")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers()["content-type"], "image/png");
        assert_eq!(
            resp.headers()["content-disposition"],
            "attachment; filename=\"paris_noir.png\""
        );
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&bytes[..], b"\x89PNG");

        let traversal = router
            .clone()
            .oneshot(get("/posters/..%2F..%2Fetc%2Fpasswd"))
            .await
            .unwrap();
        assert_eq!(traversal.status(), StatusCode::NOT_FOUND);

        let dots = router.clone().oneshot(get("/posters/..")).await.unwrap();
        assert_eq!(dots.status(), StatusCode::BAD_REQUEST);

        let missing = router.oneshot(get("/posters/nope.png")).await.unwrap();
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);
    }
}
