use tokio::process::Child;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::error::SupervisorError;

use super::exit::{normalize_exit, ExitOutcome};
use super::spawn::{spawn_child, CommandSpec};
use super::tee::{pump_lines, LineTap, OutputStream};

/// A running worker with both output pipes being drained.
///
/// Dropping the handle kills the child.
pub struct SupervisedProcess {
    child: Child,
    pid: Option<u32>,
    lines: mpsc::UnboundedReceiver<LineTap>,
    stdout_task: JoinHandle<String>,
    stderr_task: JoinHandle<String>,
}

impl SupervisedProcess {
    pub fn start(spec: &CommandSpec) -> Result<Self, SupervisorError> {
        let mut child = spawn_child(spec)?;
        let pid = child.id();

        let stdout = child
            .stdout
            .take()
            .ok_or(SupervisorError::MissingPipe { stream: "stdout" })?;
        let stderr = child
            .stderr
            .take()
            .ok_or(SupervisorError::MissingPipe { stream: "stderr" })?;

        let (tx, lines) = mpsc::unbounded_channel();
        let stdout_task = tokio::spawn(pump_lines(stdout, OutputStream::Stdout, tx.clone()));
        let stderr_task = tokio::spawn(pump_lines(stderr, OutputStream::Stderr, tx));

        tracing::debug!(
            target: "maptoposter.supervisor",
            pid = ?pid,
            command = %spec.display(),
            "worker started"
        );

        Ok(Self {
            child,
            pid,
            lines,
            stdout_task,
            stderr_task,
        })
    }

    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    /// Next line from either stream; `None` once both pipes are closed.
    pub async fn next_line(&mut self) -> Option<LineTap> {
        self.lines.recv().await
    }

    /// Sends the kill without waiting for the process to go away.
    pub fn cancel(&mut self) {
        match self.child.start_kill() {
            Ok(()) => tracing::debug!(
                target: "maptoposter.supervisor",
                pid = ?self.pid,
                "kill sent to worker"
            ),
            // Already reaped.
            Err(e) if e.kind() == std::io::ErrorKind::InvalidInput => {}
            Err(e) => tracing::warn!(
                target: "maptoposter.supervisor",
                pid = ?self.pid,
                error = %e,
                "failed to kill worker"
            ),
        }
    }

    /// Waits for exit and for both pipes to drain.
    pub async fn wait(mut self) -> Result<ExitOutcome, SupervisorError> {
        let status = self.child.wait().await.map_err(SupervisorError::Wait)?;
        let code = normalize_exit(status);

        // Lines not yet consumed are still in the captured text.
        self.lines.close();
        let stdout = self.stdout_task.await.unwrap_or_default();
        let stderr = self.stderr_task.await.unwrap_or_default();

        tracing::debug!(
            target: "maptoposter.supervisor",
            pid = ?self.pid,
            exit_code = code,
            "worker exited"
        );

        Ok(ExitOutcome {
            code,
            stdout,
            stderr,
        })
    }
}
