//! 海报文件: 文件名清洗、下载、过期清理

use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use axum::{
    extract::{Path as UrlPath, State},
    http::header,
    response::{IntoResponse, Response},
};
use lazy_static::lazy_static;
use regex::Regex;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::http::{error::HttpServerError, state::AppState};

lazy_static! {
    static ref UNSAFE_CHARS: Regex = Regex::new(r"[^A-Za-z0-9_.\-]").unwrap();
}

/// Reduce a requested name to a bare file name inside the artifacts dir.
///
/// Directory components are dropped, then anything outside `[A-Za-z0-9_.-]`.
/// `None` when nothing usable remains.
pub fn sanitize_filename(raw: &str) -> Option<String> {
    let base = raw.rsplit(['/', '\\']).next().unwrap_or(raw);
    let clean = UNSAFE_CHARS.replace_all(base, "").into_owned();
    if clean.is_empty() || clean.chars().all(|c| c == '.') {
        return None;
    }
    Some(clean)
}

pub fn content_type_for(name: &str) -> &'static str {
    let ext = Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("png") => "image/png",
        Some("svg") => "image/svg+xml",
        Some("pdf") => "application/pdf",
        _ => "application/octet-stream",
    }
}

/// GET /posters/{filename} - 下载海报
pub async fn poster_handler(
    State(state): State<AppState>,
    UrlPath(raw): UrlPath<String>,
) -> Result<Response, HttpServerError> {
    let name = sanitize_filename(&raw)
        .ok_or_else(|| HttpServerError::InvalidRequest("Invalid file name".into()))?;
    let path = state.artifacts_dir.join(&name);

    let bytes = match tokio::fs::read(&path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(HttpServerError::NotFound("Poster not found".into()));
        }
        Err(e) => {
            warn!(target: "maptoposter.http", path = %path.display(), error = %e, "poster read failed");
            return Err(HttpServerError::Internal("Error reading file".into()));
        }
    };

    debug!(target: "maptoposter.http", file = %name, size = bytes.len(), "serving poster");
    Ok((
        [
            (header::CONTENT_TYPE, content_type_for(&name).to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{name}\""),
            ),
        ],
        bytes,
    )
        .into_response())
}

/// Delete regular files under `dir` last modified more than `max_age` ago.
pub async fn sweep_expired(dir: &Path, max_age: Duration) -> io::Result<usize> {
    let now = SystemTime::now();
    let mut removed = 0;
    let mut entries = tokio::fs::read_dir(dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        let meta = match entry.metadata().await {
            Ok(meta) if meta.is_file() => meta,
            _ => continue,
        };
        let age = meta
            .modified()
            .ok()
            .and_then(|m| now.duration_since(m).ok())
            .unwrap_or_default();
        if age <= max_age {
            continue;
        }
        match tokio::fs::remove_file(entry.path()).await {
            Ok(()) => removed += 1,
            Err(e) => warn!(
                target: "maptoposter.http",
                path = %entry.path().display(),
                error = %e,
                "could not remove expired poster"
            ),
        }
    }
    Ok(removed)
}

/// Periodically sweep `dir` until the shutdown signal fires.
pub fn spawn_sweeper(
    dir: PathBuf,
    max_age: Duration,
    every: Duration,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = shutdown_rx.recv() => break,
            }
            match sweep_expired(&dir, max_age).await {
                Ok(0) => {}
                Ok(n) => info!(target: "maptoposter.http", removed = n, "expired posters removed"),
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => warn!(target: "maptoposter.http", error = %e, "poster sweep failed"),
            }
        }
    })
}
