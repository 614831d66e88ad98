use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::sync::mpsc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputStream {
    Stdout,
    Stderr,
}

impl OutputStream {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputStream::Stdout => "stdout",
            OutputStream::Stderr => "stderr",
        }
    }
}

/// One line of worker output, without its terminator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineTap {
    pub stream: OutputStream,
    pub line: String,
}

/// Forwards each line as it arrives and returns the whole stream.
///
/// Keeps reading after the receiver is gone so the pipe never fills up and
/// the captured text stays complete.
pub(crate) async fn pump_lines<R>(
    reader: R,
    stream: OutputStream,
    tx: mpsc::UnboundedSender<LineTap>,
) -> String
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(reader);
    let mut captured = String::new();
    let mut buf = Vec::new();

    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => break,
            Ok(_) => {
                let text = String::from_utf8_lossy(&buf);
                let line = text.trim_end_matches(['\n', '\r']);
                captured.push_str(line);
                captured.push('\n');
                let _ = tx.send(LineTap {
                    stream,
                    line: line.to_string(),
                });
            }
            Err(e) => {
                tracing::warn!(
                    target: "maptoposter.supervisor",
                    stream = stream.as_str(),
                    error = %e,
                    "worker output read failed"
                );
                break;
            }
        }
    }
    captured
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn forwards_lines_and_captures_invalid_utf8_lossily() {
        let input: &[u8] = b"Fetching map data...\r\nbad \xff byte\nno newline";
        let (tx, mut rx) = mpsc::unbounded_channel();
        let captured = pump_lines(input, OutputStream::Stdout, tx).await;

        let mut lines = Vec::new();
        while let Some(tap) = rx.recv().await {
            lines.push(tap.line);
        }
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "Fetching map data...");
        assert!(lines[1].starts_with("bad "));
        assert_eq!(lines[2], "no newline");
        assert!(captured.ends_with("no newline\n"));
    }

    #[tokio::test]
    async fn keeps_capturing_after_receiver_dropped() {
        let input: &[u8] = b"a\nb\nc\n";
        let (tx, rx) = mpsc::unbounded_channel();
        drop(rx);
        assert_eq!(pump_lines(input, OutputStream::Stderr, tx).await, "a\nb\nc\n");
    }
}
