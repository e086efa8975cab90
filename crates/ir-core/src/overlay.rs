//! Review overlay: a copy of the input with every redacted region
//! highlighted and labeled, for human verification.

use crate::document::{Color, PageDocument};
use crate::span::RedactionSpan;
use ir_policy::{RedactionPolicy, TextAction};
use ir_common::Result;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

const GREEN: Color = [0.0, 1.0, 0.0];
const BLUE: Color = [0.0, 0.0, 1.0];
const RED: Color = [1.0, 0.0, 0.0];

/// Build the overlay document next to `output`.
///
/// The overlay is a fresh copy of the *original* input with a colored
/// highlight per span: green for dummy replacement, blue for rewrite,
/// red for anonymization and everything else. Returns `Ok(None)`
/// without writing anything when there are no spans to show.
pub fn build_overlay(
    input: &Path,
    spans: &[RedactionSpan],
    policy: &RedactionPolicy,
    output: &Path,
) -> Result<Option<PathBuf>> {
    if spans.is_empty() {
        info!("no redactions to visualize, skipping overlay");
        return Ok(None);
    }

    let mut doc = PageDocument::load(input)?;
    for span in spans {
        let action = policy.text_action(&span.category);
        let color = match action {
            TextAction::DummyReplacement => GREEN,
            TextAction::Rewrite => BLUE,
            TextAction::Anonymize => RED,
        };
        let label = format!("{} - {}", span.category, action);
        if let Err(err) = doc.add_highlight(span.page_index, span.rect, color, &label) {
            warn!(span_id = %span.span_id, %err, "could not highlight span");
        }
    }

    doc.save(output)?;
    Ok(Some(output.to_path_buf()))
}
