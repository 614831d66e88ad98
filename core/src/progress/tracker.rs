use crate::events::ProgressEvent;

/// Per-job watermark: percent never goes backwards and an update identical
/// to the last delivered one is dropped.
#[derive(Debug, Default)]
pub struct ProgressTracker {
    last: Option<ProgressEvent>,
}

impl ProgressTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the event to deliver, if any.
    pub fn admit(&mut self, event: ProgressEvent) -> Option<ProgressEvent> {
        let watermark = self.watermark();
        let event = ProgressEvent::new(event.percent.max(watermark), event.label);
        if self.last.as_ref() == Some(&event) {
            return None;
        }
        self.last = Some(event.clone());
        Some(event)
    }

    pub fn watermark(&self) -> u8 {
        self.last.as_ref().map(|p| p.percent).unwrap_or(0)
    }

    pub fn last(&self) -> Option<&ProgressEvent> {
        self.last.as_ref()
    }
}
