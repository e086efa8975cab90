//! Redaction application: turning decided spans into committed edits.

use crate::audit::{AuditLogEntry, ProcessingLog};
use crate::document::PageDocument;
use crate::replace::{ReplacementDecision, ReplacementEngine};
use crate::span::RedactionSpan;
use tracing::{debug, warn};

/// Apply every span to the document in two phases.
///
/// Phase one walks the spans in order, asks the engine for each
/// decision, records the audit entry, and stages the edit. Phase two
/// commits all staged edits at once, so a span whose rect overlaps an
/// already-edited area still measures against the original geometry.
/// Spans referencing a page the document does not have are skipped with
/// a warning.
pub fn redact_document(
    doc: &mut PageDocument,
    spans: &[RedactionSpan],
    engine: &mut ReplacementEngine,
    log: &mut ProcessingLog,
) -> Vec<ReplacementDecision> {
    let mut decisions = Vec::with_capacity(spans.len());

    for span in spans {
        let decision = engine.decide_for(span);
        if let Err(err) = doc.stage_redaction(span.page_index, span.rect, &decision.replacement) {
            warn!(span_id = %span.span_id, %err, "skipping unplaceable span");
            continue;
        }
        debug!(span_id = %span.span_id, action = %decision.action, "staged redaction");
        log.push(AuditLogEntry {
            page: span.page_index + 1,
            category: span.category.clone(),
            original: span.source_text.clone(),
            replacement: decision.replacement.clone(),
            action: decision.action,
        });
        decisions.push(decision);
    }

    doc.commit_redactions();
    decisions
}
