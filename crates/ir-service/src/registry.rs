//! Job registry: a guarded status map fed by worker events.
//!
//! Running jobs never touch the map directly. They send [`JobEvent`]s
//! over a channel; a single updater thread owned by the registry
//! applies them, so readers only ever see whole records. Lifecycle
//! transitions that must be exclusive ([`JobRegistry::claim`]) happen
//! under the same lock the updater uses.

use crate::job::{JobState, JobStatus};
use ir_common::{Error, JobId, Result};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::mpsc::{self, Sender};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::JoinHandle;
use tracing::{debug, warn};

/// Status update from a running job.
#[derive(Debug)]
pub enum JobEvent {
    Progress {
        job_id: JobId,
        progress: u8,
        message: String,
    },
    Completed {
        job_id: JobId,
        result_files: Vec<PathBuf>,
    },
    Failed {
        job_id: JobId,
        error: String,
    },
}

/// Handle a worker uses to report its own status.
#[derive(Debug, Clone)]
pub struct JobReporter {
    job_id: JobId,
    tx: Sender<JobEvent>,
}

impl JobReporter {
    pub fn progress(&self, progress: u8, message: impl Into<String>) {
        self.send(JobEvent::Progress {
            job_id: self.job_id.clone(),
            progress: progress.min(100),
            message: message.into(),
        });
    }

    pub fn completed(&self, result_files: Vec<PathBuf>) {
        self.send(JobEvent::Completed {
            job_id: self.job_id.clone(),
            result_files,
        });
    }

    pub fn failed(&self, error: impl Into<String>) {
        self.send(JobEvent::Failed {
            job_id: self.job_id.clone(),
            error: error.into(),
        });
    }

    fn send(&self, event: JobEvent) {
        if self.tx.send(event).is_err() {
            warn!(job_id = %self.job_id, "registry gone, dropping status event");
        }
    }
}

/// In-memory job status registry.
pub struct JobRegistry {
    jobs: Arc<Mutex<HashMap<JobId, JobStatus>>>,
    tx: Option<Sender<JobEvent>>,
    updater: Option<JoinHandle<()>>,
}

impl JobRegistry {
    pub fn new() -> Self {
        let jobs: Arc<Mutex<HashMap<JobId, JobStatus>>> = Arc::new(Mutex::new(HashMap::new()));
        let (tx, rx) = mpsc::channel::<JobEvent>();

        let map = Arc::clone(&jobs);
        let updater = std::thread::spawn(move || {
            for event in rx {
                apply_event(&map, event);
            }
        });

        JobRegistry {
            jobs,
            tx: Some(tx),
            updater: Some(updater),
        }
    }

    pub fn insert(&self, status: JobStatus) {
        self.lock_jobs().insert(status.job_id.clone(), status);
    }

    /// Snapshot of one job.
    pub fn status(&self, job_id: &JobId) -> Option<JobStatus> {
        self.lock_jobs().get(job_id).cloned()
    }

    /// Snapshot of all jobs, newest first.
    pub fn list(&self) -> Vec<JobStatus> {
        let mut jobs: Vec<JobStatus> = self.lock_jobs().values().cloned().collect();
        jobs.sort_by(|a, b| b.submitted_at.cmp(&a.submitted_at));
        jobs
    }

    pub fn remove(&self, job_id: &JobId) -> Option<JobStatus> {
        self.lock_jobs().remove(job_id)
    }

    /// Atomically claim a job for execution: `Uploaded` → `Processing`.
    ///
    /// The check and the transition happen under one lock, so of two
    /// concurrent claims exactly one succeeds. Returns the status as
    /// it was claimed.
    pub fn claim(&self, job_id: &JobId) -> Result<JobStatus> {
        let mut jobs = self.lock_jobs();
        let status = jobs.get_mut(job_id).ok_or_else(|| Error::JobNotFound {
            job_id: job_id.to_string(),
        })?;
        if status.state != JobState::Uploaded {
            return Err(Error::JobNotRunnable {
                job_id: job_id.to_string(),
                state: status.state.to_string(),
            });
        }
        status.state = JobState::Processing;
        status.message = "starting".to_string();
        Ok(status.clone())
    }

    /// Reporter handle for a worker thread.
    pub fn reporter(&self, job_id: &JobId) -> JobReporter {
        // tx is only None mid-drop, which no caller can observe.
        let tx = self
            .tx
            .clone()
            .unwrap_or_else(|| mpsc::channel().0);
        JobReporter {
            job_id: job_id.clone(),
            tx,
        }
    }

    fn lock_jobs(&self) -> MutexGuard<'_, HashMap<JobId, JobStatus>> {
        self.jobs
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for JobRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for JobRegistry {
    fn drop(&mut self) {
        // Closing the channel ends the updater loop.
        drop(self.tx.take());
        if let Some(updater) = self.updater.take() {
            if updater.join().is_err() {
                warn!("registry updater thread panicked");
            }
        }
    }
}

fn apply_event(map: &Mutex<HashMap<JobId, JobStatus>>, event: JobEvent) {
    let mut jobs = map.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    match event {
        JobEvent::Progress {
            job_id,
            progress,
            message,
        } => {
            let Some(status) = jobs.get_mut(&job_id) else {
                warn!(%job_id, "progress event for unknown job");
                return;
            };
            if status.state.is_terminal() {
                debug!(%job_id, "ignoring progress after terminal state");
                return;
            }
            status.state = JobState::Processing;
            status.progress = progress;
            status.message = message;
        }
        JobEvent::Completed {
            job_id,
            result_files,
        } => {
            let Some(status) = jobs.get_mut(&job_id) else {
                warn!(%job_id, "completion event for unknown job");
                return;
            };
            status.state = JobState::Completed;
            status.progress = 100;
            status.message = "completed".to_string();
            status.result_files = result_files;
        }
        JobEvent::Failed { job_id, error } => {
            let Some(status) = jobs.get_mut(&job_id) else {
                warn!(%job_id, "failure event for unknown job");
                return;
            };
            status.state = JobState::Failed;
            status.message = "failed".to_string();
            status.error = Some(error);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};

    fn wait_for<F: Fn() -> bool>(predicate: F) {
        let deadline = Instant::now() + Duration::from_secs(2);
        while !predicate() {
            assert!(Instant::now() < deadline, "timed out waiting for registry update");
            std::thread::sleep(Duration::from_millis(5));
        }
    }

    #[test]
    fn test_events_drive_state() {
        let registry = JobRegistry::new();
        let job_id = JobId::new();
        registry.insert(JobStatus::new(job_id.clone(), "scan.json"));

        let reporter = registry.reporter(&job_id);
        reporter.progress(50, "mapping spans");
        wait_for(|| {
            registry
                .status(&job_id)
                .map(|s| s.progress == 50)
                .unwrap_or(false)
        });
        assert_eq!(registry.status(&job_id).unwrap().state, JobState::Processing);

        reporter.completed(vec![PathBuf::from("/out/scan_redacted.json")]);
        wait_for(|| {
            registry
                .status(&job_id)
                .map(|s| s.state == JobState::Completed)
                .unwrap_or(false)
        });
        let status = registry.status(&job_id).unwrap();
        assert_eq!(status.progress, 100);
        assert_eq!(status.result_files.len(), 1);
    }

    #[test]
    fn test_progress_after_terminal_is_ignored() {
        let registry = JobRegistry::new();
        let job_id = JobId::new();
        registry.insert(JobStatus::new(job_id.clone(), "scan.json"));

        let reporter = registry.reporter(&job_id);
        reporter.failed("extractor exploded");
        wait_for(|| {
            registry
                .status(&job_id)
                .map(|s| s.state == JobState::Failed)
                .unwrap_or(false)
        });

        reporter.progress(10, "late event");
        // Give the updater a chance to (wrongly) apply it.
        std::thread::sleep(Duration::from_millis(50));
        let status = registry.status(&job_id).unwrap();
        assert_eq!(status.state, JobState::Failed);
        assert_eq!(status.error.as_deref(), Some("extractor exploded"));
    }

    #[test]
    fn test_concurrent_reporters() {
        let registry = JobRegistry::new();
        let ids: Vec<JobId> = (0..8).map(|_| JobId::new()).collect();
        for id in &ids {
            registry.insert(JobStatus::new(id.clone(), "doc.json"));
        }

        let handles: Vec<_> = ids
            .iter()
            .map(|id| {
                let reporter = registry.reporter(id);
                std::thread::spawn(move || {
                    for p in [10_u8, 40, 80] {
                        reporter.progress(p, "working");
                    }
                    reporter.completed(Vec::new());
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        wait_for(|| {
            registry
                .list()
                .iter()
                .all(|s| s.state == JobState::Completed)
        });
        assert_eq!(registry.list().len(), 8);
    }

    #[test]
    fn test_claim_is_exclusive() {
        let registry = JobRegistry::new();
        let job_id = JobId::new();
        registry.insert(JobStatus::new(job_id.clone(), "doc.json"));

        let mut outcomes = Vec::new();
        std::thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|_| scope.spawn(|| registry.claim(&job_id).is_ok()))
                .collect();
            for handle in handles {
                outcomes.push(handle.join().unwrap());
            }
        });

        // Exactly one concurrent claim wins.
        assert_eq!(outcomes.iter().filter(|ok| **ok).count(), 1);
        assert_eq!(registry.status(&job_id).unwrap().state, JobState::Processing);

        // A terminal job cannot be claimed either.
        let other = JobId::new();
        let mut finished = JobStatus::new(other.clone(), "done.json");
        finished.state = JobState::Completed;
        registry.insert(finished);
        assert!(matches!(
            registry.claim(&other),
            Err(Error::JobNotRunnable { .. })
        ));
        assert!(matches!(
            registry.claim(&JobId::new()),
            Err(Error::JobNotFound { .. })
        ));
    }

    #[test]
    fn test_remove_and_unknown_status() {
        let registry = JobRegistry::new();
        let job_id = JobId::new();
        registry.insert(JobStatus::new(job_id.clone(), "doc.json"));

        assert!(registry.remove(&job_id).is_some());
        assert!(registry.status(&job_id).is_none());
        assert!(registry.remove(&job_id).is_none());
    }
}
