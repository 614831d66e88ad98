use crate::error::{ExtractError, JobError};
use crate::events::ProgressEvent;
use crate::extract::ResultExtractor;
use crate::progress::ProgressClassifier;
use crate::remote::{ErrorRewriter, TaskState, TaskStatus};
use crate::runner::{ExitOutcome, OutputStream};
use crate::strategy::{InlineResponse, RawSignal};

/// What one raw signal means for the job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    Nothing,
    Progress(ProgressEvent),
    Succeeded(Vec<String>),
    Failed(JobError),
}

/// Stateless translation from raw signals to steps. The watermark lives in
/// the bridge.
#[derive(Debug, Clone, Default)]
pub struct Normalizer {
    classifier: ProgressClassifier,
    extractor: ResultExtractor,
    rewriter: ErrorRewriter,
}

impl Normalizer {
    pub fn new(
        classifier: ProgressClassifier,
        extractor: ResultExtractor,
        rewriter: ErrorRewriter,
    ) -> Self {
        Self {
            classifier,
            extractor,
            rewriter,
        }
    }

    pub fn step(&self, signal: RawSignal) -> Step {
        match signal {
            RawSignal::Checkpoint(p) => Step::Progress(p),
            RawSignal::Line(tap) => match tap.stream {
                // The result line may carry trigger words in its file names.
                OutputStream::Stdout if tap.line.contains(self.extractor.marker()) => {
                    Step::Nothing
                }
                OutputStream::Stdout => self
                    .classifier
                    .classify(&tap.line)
                    .map(Step::Progress)
                    .unwrap_or(Step::Nothing),
                OutputStream::Stderr => Step::Nothing,
            },
            RawSignal::Exited(outcome) => self.exited(outcome),
            RawSignal::Status(doc) => self.status(doc),
            RawSignal::Inline(resp) => self.inline(resp),
        }
    }

    fn exited(&self, outcome: ExitOutcome) -> Step {
        if !outcome.success() {
            let friendly = self.rewriter.lookup(&outcome.stderr).map(str::to_string);
            let message = friendly.unwrap_or_else(|| match outcome.last_stderr_line() {
                Some(line) => format!("Worker exited with code {}: {}", outcome.code, line),
                None => format!("Worker exited with code {}", outcome.code),
            });
            return Step::Failed(JobError::worker(
                message,
                Some(outcome.stderr.trim().to_string()),
            ));
        }

        match self.extractor.extract(&outcome.stdout) {
            Ok(files) => Step::Succeeded(files),
            Err(ExtractError::MarkerNotFound) => Step::Failed(JobError::NoArtifacts),
            Err(ExtractError::MalformedResult { reason, payload }) => {
                Step::Failed(JobError::MalformedResult {
                    reason,
                    detail: Some(payload).filter(|p| !p.is_empty()),
                })
            }
        }
    }

    fn status(&self, doc: TaskStatus) -> Step {
        match doc.status {
            TaskState::Pending | TaskState::Unknown => Step::Nothing,
            TaskState::Progress => doc
                .progress
                .map(|p| Step::Progress(p.to_event()))
                .unwrap_or(Step::Nothing),
            TaskState::Success => {
                let result = doc.result.unwrap_or_default();
                if result.success == Some(false) {
                    let raw = result
                        .error
                        .or(doc.error)
                        .unwrap_or_else(|| "The renderer reported a failure".to_string());
                    return Step::Failed(self.remote_failure(raw));
                }
                let files = result.artifacts();
                if files.is_empty() {
                    return Step::Failed(JobError::MalformedResult {
                        reason: "SUCCESS without an artifact reference".to_string(),
                        detail: result.file_url.map(|u| format!("file_url = {u:?}")),
                    });
                }
                Step::Succeeded(files)
            }
            TaskState::Failure => {
                let raw = doc
                    .error
                    .or_else(|| doc.result.and_then(|r| r.error))
                    .filter(|e| !e.trim().is_empty())
                    .unwrap_or_else(|| "The renderer reported a failure".to_string());
                Step::Failed(self.remote_failure(raw))
            }
        }
    }

    fn inline(&self, resp: InlineResponse) -> Step {
        if resp.success {
            return Step::Succeeded(resp.file_name().into_iter().collect());
        }
        let raw = resp
            .error
            .filter(|e| !e.trim().is_empty())
            .unwrap_or_else(|| "The renderer returned an error without details".to_string());
        Step::Failed(self.remote_failure(raw))
    }

    /// Friendly message when one is known, with the raw text kept as detail.
    fn remote_failure(&self, raw: String) -> JobError {
        match self.rewriter.lookup(&raw) {
            Some(friendly) => JobError::worker(friendly, Some(raw)),
            None => JobError::worker(raw, None),
        }
    }
}
