//! Job service around the redaction pipeline.
//!
//! Wraps [`ir_core::RedactionPipeline`] in a submit/start/poll job
//! model: uploads are staged under a working directory, each started
//! job runs on its own background thread, and status flows through a
//! channel-fed registry. The `inforedact` binary exposes this over a
//! small CLI.

pub mod cli;
pub mod job;
pub mod registry;
pub mod runner;

pub use job::{JobState, JobStatus};
pub use registry::{JobEvent, JobRegistry, JobReporter};
pub use runner::RedactionService;
