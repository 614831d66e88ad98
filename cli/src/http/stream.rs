//! 任务事件流响应

use std::convert::Infallible;

use async_stream::stream;
use axum::{
    body::Body,
    http::{header, HeaderValue},
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use maptoposter_core::api::{encode, JobEvent, JobRegistration};
use tokio::sync::mpsc;

use crate::http::middleware::JOB_ID_HEADER;

/// Wrap a job's event channel into a `text/event-stream` response.
///
/// The body owns the registration: once the client goes away the body is
/// dropped, the receiver closes, and the bridge treats that as a cancel.
pub fn event_stream_response(
    registration: JobRegistration,
    mut rx: mpsc::Receiver<JobEvent>,
) -> Response {
    let job_id = registration.id().to_string();

    let frames = stream! {
        let _registration = registration;
        while let Some(event) = rx.recv().await {
            let terminal = event.is_terminal();
            yield Ok::<_, Infallible>(Bytes::from(encode(&event)));
            if terminal {
                break;
            }
        }
    };

    let mut response = Body::from_stream(frames).into_response();
    let headers = response.headers_mut();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/event-stream"),
    );
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    headers.insert("x-accel-buffering", HeaderValue::from_static("no"));
    if let Ok(value) = HeaderValue::from_str(&job_id) {
        headers.insert(JOB_ID_HEADER, value);
    }
    response
}
