//! Redaction policy store.
//!
//! Maps PII/PHI categories to redaction actions for text and visual
//! content, plus global run switches. Policies are loaded once per run
//! (built-in defaults, optionally overridden from a YAML file) and are
//! read-only afterwards.

pub mod action;
pub mod policy;

pub use action::{TextAction, VisualAction, VisualMode};
pub use policy::{GlobalSettings, RedactionPolicy};
