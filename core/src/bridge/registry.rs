use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use tokio_util::sync::CancellationToken;

/// Cancellation handles of the jobs currently running, by id.
///
/// Only tokens live here; each job's state stays with the task running it.
#[derive(Clone, Default)]
pub struct JobRegistry {
    inner: Arc<Mutex<HashMap<String, CancellationToken>>>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, CancellationToken>> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// `None` when a job with this id is already running.
    pub fn register(&self, id: impl Into<String>) -> Option<JobRegistration> {
        let id = id.into();
        let token = CancellationToken::new();
        let mut jobs = self.lock();
        if jobs.contains_key(&id) {
            return None;
        }
        jobs.insert(id.clone(), token.clone());
        Some(JobRegistration {
            id,
            token,
            registry: self.clone(),
        })
    }

    /// `true` when a running job was found and signalled.
    pub fn cancel(&self, id: &str) -> bool {
        match self.lock().get(id) {
            Some(token) => {
                token.cancel();
                tracing::info!(target: "maptoposter.bridge", job_id = %id, "job cancel requested");
                true
            }
            None => false,
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.lock().contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Signals every running job, e.g. on shutdown.
    pub fn cancel_all(&self) -> usize {
        let jobs = self.lock();
        for token in jobs.values() {
            token.cancel();
        }
        jobs.len()
    }
}

/// Keeps a job listed while alive; dropping it removes the entry.
pub struct JobRegistration {
    id: String,
    token: CancellationToken,
    registry: JobRegistry,
}

impl JobRegistration {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }
}

impl Drop for JobRegistration {
    fn drop(&mut self) {
        self.registry.lock().remove(&self.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registration_lifecycle() {
        let reg = JobRegistry::new();
        let job = reg.register("a").unwrap();
        assert!(reg.register("a").is_none());
        assert_eq!(reg.len(), 1);

        assert!(reg.cancel("a"));
        assert!(job.token().is_cancelled());
        assert!(!reg.cancel("b"));

        drop(job);
        assert!(reg.is_empty());
        assert!(!reg.cancel("a"));
    }

    #[test]
    fn cancel_all_signals_everyone() {
        let reg = JobRegistry::new();
        let a = reg.register("a").unwrap();
        let b = reg.register("b").unwrap();
        assert_eq!(reg.cancel_all(), 2);
        assert!(a.token().is_cancelled() && b.token().is_cancelled());
    }
}
