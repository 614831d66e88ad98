//! Client side of `POST /api/generate` for `generate --server`.

use anyhow::{bail, Context, Result};
use futures::StreamExt;
use maptoposter_core::api::{new_job_id, FrameDecoder, GenerationRequest, JobEvent};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::http::middleware::JOB_ID_HEADER;

/// Submit `request` to a running server and forward its event stream.
///
/// Returns after the terminal frame, when the server closes the stream,
/// or on cancel. Cancelling also asks the server to stop the job.
pub async fn stream_job(
    server: String,
    request: GenerationRequest,
    events: mpsc::Sender<JobEvent>,
    cancel: CancellationToken,
) -> Result<()> {
    let base = server.trim_end_matches('/').to_string();
    let client = reqwest::Client::new();
    let job_id = new_job_id();

    let response = tokio::select! {
        biased;
        _ = cancel.cancelled() => return Ok(()),
        res = client
            .post(format!("{base}/api/generate"))
            .header(JOB_ID_HEADER, &job_id)
            .json(&request)
            .send() => res.with_context(|| format!("could not reach {base}"))?,
    };

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        bail!("server answered {status}: {body}");
    }

    let mut body = response.bytes_stream();
    let mut decoder = FrameDecoder::new();
    loop {
        let chunk = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                tracing::info!(target: "maptoposter.client", job_id = %job_id, "cancelling remote job");
                if let Err(e) = client.delete(format!("{base}/api/jobs/{job_id}")).send().await {
                    tracing::warn!(target: "maptoposter.client", error = %e, "cancel request failed");
                }
                return Ok(());
            }
            chunk = body.next() => chunk,
        };

        let Some(chunk) = chunk else {
            return Ok(());
        };
        let bytes = chunk.context("event stream interrupted")?;
        for event in decoder.push(&bytes) {
            let terminal = event.is_terminal();
            if events.send(event).await.is_err() || terminal {
                return Ok(());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use maptoposter_core::api::{encode, ProgressEvent, ResultEvent};
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_stream_job_forwards_frames() {
        let mut server = mockito::Server::new_async().await;
        let frames = [
            JobEvent::Progress(ProgressEvent::new(10, "Resolving location...")),
            JobEvent::Progress(ProgressEvent::new(60, "Rendering map...")),
            JobEvent::Result(ResultEvent {
                files: vec!["paris_noir.png".into()],
            }),
        ];
        let body: String = frames.iter().map(encode).collect();
        let mock = server
            .mock("POST", "/api/generate")
            .match_header("x-job-id", mockito::Matcher::Any)
            .with_status(200)
            .with_header("content-type", "text/event-stream")
            .with_body(body)
            .create_async()
            .await;

        let (tx, mut rx) = mpsc::channel(8);
        stream_job(
            format!("{}/", server.url()),
            GenerationRequest::new("Paris", "France"),
            tx,
            CancellationToken::new(),
        )
        .await
        .unwrap();

        let mut got = Vec::new();
        while let Some(ev) = rx.recv().await {
            got.push(ev);
        }
        assert_eq!(got, frames.to_vec());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_stream_job_reports_http_errors() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/api/generate")
            .with_status(409)
            .with_body(r#"{"success":false,"error":"busy","error_code":"JOB_EXISTS"}"#)
            .create_async()
            .await;

        let (tx, _rx) = mpsc::channel(8);
        let err = stream_job(
            server.url(),
            GenerationRequest::new("Paris", "France"),
            tx,
            CancellationToken::new(),
        )
        .await
        .unwrap_err();
        assert!(err.to_string().contains("409"));
    }
}
