//! Redaction pipeline core.
//!
//! Locates detected PII/PHI in paginated documents, decides on
//! replacements per policy, destructively removes the original content,
//! substitutes visual regions, and produces a review overlay plus a
//! structured audit log.
//!
//! The pipeline consumes four external collaborators through the traits
//! in [`collab`]: structural extraction, entity detection, image
//! classification, and synthetic replacement generation. None of those
//! are implemented here beyond minimal built-ins; the core guarantees
//! that *detected* entities are correctly located, decided upon, and
//! removed, and that every decision is auditable.
//!
//! # Example
//!
//! ```no_run
//! use ir_core::{Collaborators, RedactionPipeline};
//! use ir_policy::RedactionPolicy;
//! use std::path::Path;
//!
//! let policy = RedactionPolicy::default();
//! let mut pipeline =
//!     RedactionPipeline::new("scan.json", policy, Collaborators::default());
//! let log = pipeline.process(Path::new("scan_redacted.json")).unwrap();
//! println!("{} redactions", log.metrics.total_redactions);
//! ```

pub mod aggregate;
pub mod apply;
pub mod audit;
pub mod collab;
pub mod document;
pub mod overlay;
pub mod pipeline;
pub mod replace;
pub mod span;
pub mod temp;
pub mod visual;

pub use aggregate::{aggregate_entities, DetectedEntity};
pub use audit::{AuditLogEntry, ProcessingLog, RunMetrics};
pub use collab::{
    Collaborators, DetectionOutcome, DetectionResult, EntityDetector, ExtractedContent,
    GeneratorOutcome, ImageClassifier, ImageRegion, PageGeometry, RankedLabel,
    StructuralExtractor, SyntheticGenerator, TextBlock,
};
pub use document::{Page, PageDocument, TextRun};
pub use pipeline::{DetectorOutagePolicy, PipelineConfig, RedactionPipeline};
pub use replace::{ReplacementDecision, ReplacementEngine};
pub use span::{build_text_rendition, map_spans, RedactionSpan};
pub use visual::VisualElementRecord;
