//! Background job runner around the redaction pipeline.

use crate::job::JobStatus;
use crate::registry::{JobRegistry, JobReporter};
use ir_common::{Error, JobId, Result};
use ir_core::{Collaborators, PipelineConfig, RedactionPipeline};
use ir_policy::RedactionPolicy;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Job-oriented front end: uploads live under a working directory,
/// each started job runs the pipeline on its own thread, and status is
/// tracked through the registry.
pub struct RedactionService {
    registry: JobRegistry,
    uploads_dir: PathBuf,
    processed_dir: PathBuf,
    logs_dir: PathBuf,
}

impl RedactionService {
    pub fn new(work_dir: &Path) -> Result<Self> {
        let uploads_dir = work_dir.join("uploads");
        let processed_dir = work_dir.join("processed");
        let logs_dir = work_dir.join("logs");
        for dir in [&uploads_dir, &processed_dir, &logs_dir] {
            std::fs::create_dir_all(dir)?;
        }
        Ok(RedactionService {
            registry: JobRegistry::new(),
            uploads_dir,
            processed_dir,
            logs_dir,
        })
    }

    /// Register a document for processing, copying it into the
    /// uploads area.
    pub fn submit(&self, input: &Path) -> Result<JobId> {
        let filename = input
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .ok_or_else(|| Error::InvalidDocument(format!("{}: not a file", input.display())))?;

        let job_id = JobId::new();
        let staged = self.uploads_dir.join(format!("{}_{}", job_id, filename));
        std::fs::copy(input, &staged)?;

        self.registry.insert(JobStatus::new(job_id.clone(), &filename));
        info!(%job_id, %filename, "job submitted");
        Ok(job_id)
    }

    /// Start a submitted job on a background thread.
    pub fn start(
        &self,
        job_id: &JobId,
        policy: RedactionPolicy,
        collaborators: Collaborators,
        config: PipelineConfig,
    ) -> Result<()> {
        // Exclusive Uploaded → Processing transition; a concurrent
        // start for the same job loses here.
        let status = self.registry.claim(job_id)?;

        let reporter = self.registry.reporter(job_id);
        let input = self.uploads_dir.join(format!("{}_{}", job_id, status.filename));
        let paths = JobPaths::for_job(job_id, &status.filename, &self.processed_dir, &self.logs_dir);
        let job_id = job_id.clone();

        std::thread::spawn(move || {
            reporter.progress(10, "starting redaction");
            match run_job(&input, &paths, policy, collaborators, config, &reporter) {
                Ok(result_files) => {
                    info!(%job_id, "job completed");
                    reporter.completed(result_files);
                }
                Err(err) => {
                    warn!(%job_id, %err, "job failed");
                    reporter.failed(err.to_string());
                }
            }
        });
        Ok(())
    }

    pub fn status(&self, job_id: &JobId) -> Option<JobStatus> {
        self.registry.status(job_id)
    }

    pub fn list(&self) -> Vec<JobStatus> {
        self.registry.list()
    }

    /// Poll a job until it reaches a terminal state.
    pub fn wait(&self, job_id: &JobId, timeout: Duration) -> Result<JobStatus> {
        let deadline = Instant::now() + timeout;
        loop {
            let status = self.status(job_id).ok_or_else(|| Error::JobNotFound {
                job_id: job_id.to_string(),
            })?;
            if status.state.is_terminal() {
                return Ok(status);
            }
            if Instant::now() >= deadline {
                return Err(Error::JobNotRunnable {
                    job_id: job_id.to_string(),
                    state: format!("still {} after {:?}", status.state, timeout),
                });
            }
            std::thread::sleep(Duration::from_millis(20));
        }
    }

    /// Drop a job and every artifact bearing its id.
    pub fn delete(&self, job_id: &JobId) -> Result<()> {
        self.registry.remove(job_id).ok_or_else(|| Error::JobNotFound {
            job_id: job_id.to_string(),
        })?;

        let prefix = format!("{}_", job_id);
        for dir in [&self.uploads_dir, &self.processed_dir, &self.logs_dir] {
            for entry in std::fs::read_dir(dir)? {
                let entry = entry?;
                if entry.file_name().to_string_lossy().starts_with(&prefix) {
                    if let Err(err) = std::fs::remove_file(entry.path()) {
                        warn!(path = %entry.path().display(), %err, "could not remove job artifact");
                    }
                }
            }
        }
        info!(%job_id, "job deleted");
        Ok(())
    }
}

struct JobPaths {
    output: PathBuf,
    log: PathBuf,
    overlay: PathBuf,
}

impl JobPaths {
    fn for_job(job_id: &JobId, filename: &str, processed: &Path, logs: &Path) -> Self {
        let stem = Path::new(filename)
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| filename.to_string());
        let ext = Path::new(filename)
            .extension()
            .map(|e| e.to_string_lossy().into_owned())
            .unwrap_or_else(|| "json".to_string());
        JobPaths {
            output: processed.join(format!("{}_{}_redacted.{}", job_id, stem, ext)),
            overlay: processed.join(format!("{}_{}_redacted_overlay.{}", job_id, stem, ext)),
            log: logs.join(format!("{}_log.json", job_id)),
        }
    }
}

fn run_job(
    input: &Path,
    paths: &JobPaths,
    policy: RedactionPolicy,
    collaborators: Collaborators,
    config: PipelineConfig,
    reporter: &JobReporter,
) -> Result<Vec<PathBuf>> {
    reporter.progress(25, "processing document");
    let mut pipeline = RedactionPipeline::with_config(input, policy, collaborators, config);
    let log = pipeline.process(&paths.output)?;

    reporter.progress(95, "writing artifacts");
    let mut result_files = vec![paths.output.clone()];
    if paths.overlay.exists() {
        result_files.push(paths.overlay.clone());
    }
    if pipeline.save_log(&paths.log)? {
        result_files.push(paths.log.clone());
    }
    info!(
        redactions = log.metrics.total_redactions,
        visual = log.metrics.total_visual_elements,
        "pipeline finished"
    );
    Ok(result_files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::JobState;
    use ir_core::document::{BLACK, DEFAULT_FONT_SIZE};
    use ir_core::{PageDocument, TextRun};

    fn write_input(dir: &Path, text: &str) -> PathBuf {
        let mut doc = PageDocument::with_pages(&[(612.0, 792.0)]);
        doc.pages[0].runs.push(TextRun {
            text: text.to_string(),
            rect: ir_common::Rect::new(72.0, 700.0, 72.0 + text.len() as f64 * 6.0, 712.0),
            font_size: DEFAULT_FONT_SIZE,
            color: BLACK,
        });
        let path = dir.join("record.json");
        doc.save(&path).unwrap();
        path
    }

    #[test]
    fn test_job_runs_to_completion() {
        let dir = tempfile::tempdir().unwrap();
        // The built-in pattern pass carries this job; no detector.
        let input = write_input(dir.path(), "Chart MRN: 7788990 attached");
        let service = RedactionService::new(&dir.path().join("work")).unwrap();

        let job_id = service.submit(&input).unwrap();
        assert_eq!(service.status(&job_id).unwrap().state, JobState::Uploaded);

        service
            .start(
                &job_id,
                RedactionPolicy::default(),
                Collaborators::default(),
                PipelineConfig::default(),
            )
            .unwrap();
        let status = service.wait(&job_id, Duration::from_secs(5)).unwrap();

        assert_eq!(status.state, JobState::Completed);
        assert_eq!(status.progress, 100);
        // Redacted output, overlay, and audit log.
        assert_eq!(status.result_files.len(), 3);
        for file in &status.result_files {
            assert!(file.exists(), "missing artifact {}", file.display());
        }

        let redacted = PageDocument::load(&status.result_files[0]).unwrap();
        let text: String = redacted.pages[0]
            .runs
            .iter()
            .map(|r| r.text.as_str())
            .collect();
        assert!(!text.contains("7788990"));
    }

    #[test]
    fn test_start_requires_uploaded_state() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_input(dir.path(), "MRN: 123456");
        let service = RedactionService::new(&dir.path().join("work")).unwrap();

        let job_id = service.submit(&input).unwrap();
        service
            .start(
                &job_id,
                RedactionPolicy::default(),
                Collaborators::default(),
                PipelineConfig::default(),
            )
            .unwrap();
        service.wait(&job_id, Duration::from_secs(5)).unwrap();

        // A finished job cannot be started again.
        let err = service
            .start(
                &job_id,
                RedactionPolicy::default(),
                Collaborators::default(),
                PipelineConfig::default(),
            )
            .unwrap_err();
        assert!(matches!(err, Error::JobNotRunnable { .. }));
    }

    #[test]
    fn test_concurrent_starts_run_the_job_once() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_input(dir.path(), "Chart MRN: 9900112 on file");
        let service = RedactionService::new(&dir.path().join("work")).unwrap();
        let job_id = service.submit(&input).unwrap();

        let mut outcomes = Vec::new();
        std::thread::scope(|scope| {
            let handles: Vec<_> = (0..4)
                .map(|_| {
                    scope.spawn(|| {
                        service
                            .start(
                                &job_id,
                                RedactionPolicy::default(),
                                Collaborators::default(),
                                PipelineConfig::default(),
                            )
                            .is_ok()
                    })
                })
                .collect();
            for handle in handles {
                outcomes.push(handle.join().unwrap());
            }
        });

        assert_eq!(outcomes.iter().filter(|ok| **ok).count(), 1);
        let status = service.wait(&job_id, Duration::from_secs(5)).unwrap();
        assert_eq!(status.state, JobState::Completed);
    }

    #[test]
    fn test_delete_removes_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_input(dir.path(), "MRN: 654321 noted");
        let work = dir.path().join("work");
        let service = RedactionService::new(&work).unwrap();

        let job_id = service.submit(&input).unwrap();
        service
            .start(
                &job_id,
                RedactionPolicy::default(),
                Collaborators::default(),
                PipelineConfig::default(),
            )
            .unwrap();
        let status = service.wait(&job_id, Duration::from_secs(5)).unwrap();
        assert!(!status.result_files.is_empty());

        service.delete(&job_id).unwrap();
        assert!(service.status(&job_id).is_none());
        for file in &status.result_files {
            assert!(!file.exists());
        }
        // The staged upload is gone too.
        let uploads: Vec<_> = std::fs::read_dir(work.join("uploads"))
            .unwrap()
            .collect();
        assert!(uploads.is_empty());

        // Deleting again reports the missing job.
        assert!(matches!(
            service.delete(&job_id),
            Err(Error::JobNotFound { .. })
        ));
    }

    #[test]
    fn test_unknown_job_errors() {
        let dir = tempfile::tempdir().unwrap();
        let service = RedactionService::new(&dir.path().join("work")).unwrap();
        let ghost = JobId::new();

        assert!(service.status(&ghost).is_none());
        assert!(matches!(
            service.start(
                &ghost,
                RedactionPolicy::default(),
                Collaborators::default(),
                PipelineConfig::default()
            ),
            Err(Error::JobNotFound { .. })
        ));
    }
}
