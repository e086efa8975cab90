//! Error types for the inforedact pipeline.

use thiserror::Error;

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Unified error type across the pipeline crates.
#[derive(Error, Debug)]
pub enum Error {
    /// Policy file could not be loaded or parsed.
    #[error("policy error: {0}")]
    Policy(String),

    /// The structural extractor failed to produce document content.
    #[error("extraction failed: {0}")]
    Extraction(String),

    /// The entity detector reported an outage and the run is configured
    /// to fail closed.
    #[error("entity detector unavailable: {0}")]
    DetectorUnavailable(String),

    /// The image classifier failed on the rendered region document.
    #[error("classification failed: {0}")]
    Classification(String),

    /// A document container could not be read or is structurally
    /// malformed.
    #[error("invalid document: {0}")]
    InvalidDocument(String),

    /// A page index referenced content outside the document.
    #[error("page {page} out of range ({pages} pages)")]
    PageOutOfRange { page: usize, pages: usize },

    /// A job id was not present in the registry.
    #[error("job not found: {job_id}")]
    JobNotFound { job_id: String },

    /// A job was driven through an invalid state transition.
    #[error("job {job_id} is not in a runnable state: {state}")]
    JobNotRunnable { job_id: String, state: String },

    /// A service-level operation failed (batch summary, job plumbing).
    #[error("{0}")]
    Service(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::PageOutOfRange { page: 7, pages: 3 };
        assert_eq!(err.to_string(), "page 7 out of range (3 pages)");

        let err = Error::JobNotFound {
            job_id: "rj-x".into(),
        };
        assert_eq!(err.to_string(), "job not found: rj-x");
    }
}
