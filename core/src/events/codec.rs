//! Event-stream framing.
//!
//! A frame is `event: <name>\ndata: <json>\n\n`. Decoding is incremental:
//! bytes are buffered until a blank-line boundary shows up, so a frame (or a
//! multi-byte character) split across network chunks decodes the same as a
//! frame delivered whole.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::FrameError;

use super::model::{ErrorEvent, JobEvent, ProgressEvent, ResultEvent};

const BOUNDARY: &[u8] = b"\n\n";

pub fn encode(event: &JobEvent) -> String {
    let data = match event {
        JobEvent::Progress(p) => to_json(p),
        JobEvent::Result(r) => to_json(r),
        JobEvent::Error(e) => to_json(e),
    };
    format!("event: {}\ndata: {}\n\n", event.name(), data)
}

fn to_json<T: Serialize>(payload: &T) -> String {
    serde_json::to_string(payload).unwrap_or_else(|_| "{}".to_string())
}

/// Stateless form of [`FrameDecoder`]: returns the complete frames in
/// `buffer` plus the unconsumed remainder to prepend to the next chunk.
pub fn decode(buffer: &str) -> (Vec<JobEvent>, String) {
    let mut decoder = FrameDecoder::new();
    let events = decoder.push(buffer.as_bytes());
    let remainder = String::from_utf8_lossy(decoder.remainder()).into_owned();
    (events, remainder)
}

#[derive(Debug, Default)]
pub struct FrameDecoder {
    buf: Vec<u8>,
    skipped: u64,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one chunk and return every frame it completed.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<JobEvent> {
        // CR never appears inside a JSON data line, so dropping it turns
        // CRLF framing into LF framing even when the pair is split.
        self.buf.extend(chunk.iter().copied().filter(|b| *b != b'\r'));

        let mut events = Vec::new();
        while let Some(pos) = find(&self.buf, BOUNDARY) {
            let block: Vec<u8> = self.buf.drain(..pos + BOUNDARY.len()).collect();
            let text = String::from_utf8_lossy(&block[..pos]);
            match parse_frame(&text) {
                Ok(Some(ev)) => events.push(ev),
                Ok(None) => {}
                Err(e) => {
                    self.skipped += 1;
                    tracing::warn!(
                        target: "maptoposter.codec",
                        error = %e,
                        frame = %text,
                        "skipping malformed frame"
                    );
                }
            }
        }
        events
    }

    pub fn remainder(&self) -> &[u8] {
        &self.buf
    }

    /// Number of malformed frames dropped so far.
    pub fn skipped(&self) -> u64 {
        self.skipped
    }
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

/// Parse one frame body (without its trailing blank line).
///
/// Comment-only blocks (`: keep-alive`) yield `Ok(None)`.
fn parse_frame(block: &str) -> Result<Option<JobEvent>, FrameError> {
    let mut name: Option<&str> = None;
    let mut data: Option<String> = None;
    let mut saw_field = false;

    for line in block.lines() {
        if line.is_empty() || line.starts_with(':') {
            continue;
        }
        saw_field = true;
        if let Some(v) = line.strip_prefix("event:") {
            name = Some(v.trim());
        } else if let Some(v) = line.strip_prefix("data:") {
            let v = v.strip_prefix(' ').unwrap_or(v);
            match data.as_mut() {
                Some(d) => {
                    d.push('\n');
                    d.push_str(v);
                }
                None => data = Some(v.to_string()),
            }
        }
    }

    if !saw_field {
        return Ok(None);
    }

    let name = name.filter(|n| !n.is_empty()).ok_or(FrameError::MissingEvent)?;
    let data = data.ok_or(FrameError::MissingData)?;

    let event = match name {
        JobEvent::PROGRESS => JobEvent::Progress(payload::<ProgressEvent>(name, &data)?),
        JobEvent::RESULT => JobEvent::Result(payload::<ResultEvent>(name, &data)?),
        JobEvent::ERROR => JobEvent::Error(payload::<ErrorEvent>(name, &data)?),
        other => return Err(FrameError::UnknownEvent(other.to_string())),
    };
    Ok(Some(event))
}

fn payload<T: DeserializeOwned>(event: &str, data: &str) -> Result<T, FrameError> {
    serde_json::from_str(data).map_err(|source| FrameError::InvalidJson {
        event: event.to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn progress(percent: u8, label: &str) -> JobEvent {
        JobEvent::Progress(ProgressEvent::new(percent, label))
    }

    #[test]
    fn encode_uses_wire_field_names() {
        assert_eq!(
            encode(&progress(30, "Fetching map data...")),
            "event: progress\ndata: {\"percent\":30,\"text\":\"Fetching map data...\"}\n\n"
        );
        assert_eq!(
            encode(&JobEvent::Error(ErrorEvent {
                message: "boom".into(),
                detail: None
            })),
            "event: error\ndata: {\"message\":\"boom\"}\n\n"
        );
    }

    #[test]
    fn split_at_every_boundary_decodes_the_same() {
        let frame = encode(&JobEvent::Result(ResultEvent {
            files: vec!["zürich_noir.png".into()],
        }));
        let bytes = frame.as_bytes();
        let (whole, rest) = decode(&frame);
        assert_eq!(rest, "");
        assert_eq!(whole.len(), 1);

        for i in 0..=bytes.len() {
            for j in i..=bytes.len() {
                let mut dec = FrameDecoder::new();
                let mut got = dec.push(&bytes[..i]);
                got.extend(dec.push(&bytes[i..j]));
                got.extend(dec.push(&bytes[j..]));
                assert_eq!(got, whole, "split at {i}/{j}");
                assert!(dec.remainder().is_empty());
            }
        }
    }

    #[test]
    fn decode_returns_partial_remainder() {
        let input = format!("{}event: progress\ndata: {{\"perc", encode(&progress(10, "a")));
        let (events, rest) = decode(&input);
        assert_eq!(events, vec![progress(10, "a")]);
        assert_eq!(rest, "event: progress\ndata: {\"perc");
    }

    #[test]
    fn malformed_frame_is_skipped_not_fatal() {
        let mut dec = FrameDecoder::new();
        let input = format!(
            "data: {{\"percent\":5}}\n\nevent: progress\n\nevent: bogus\ndata: {{}}\n\nevent: progress\ndata: not json\n\n{}",
            encode(&progress(60, "Rendering map..."))
        );
        let events = dec.push(input.as_bytes());
        assert_eq!(events, vec![progress(60, "Rendering map...")]);
        assert_eq!(dec.skipped(), 4);
    }

    #[test]
    fn crlf_and_comments_are_tolerated() {
        let mut dec = FrameDecoder::new();
        let mut events = dec.push(b": keep-alive\r\n\r\nevent: result\r");
        events.extend(dec.push(b"\ndata: {\"files\":[\"a.png\"]}\r\n\r\n"));
        assert_eq!(
            events,
            vec![JobEvent::Result(ResultEvent {
                files: vec!["a.png".into()]
            })]
        );
        assert_eq!(dec.skipped(), 0);
    }
}
