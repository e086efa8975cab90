//! Visual element substitution: replacing image regions with
//! placeholders.

use crate::collab::{ImageRegion, RankedLabel};
use crate::document::{PageDocument, BLACK, GRAY, WHITE};
use crate::span::RedactionSpan;
use ir_policy::{RedactionPolicy, VisualMode};
use tracing::warn;

/// One substituted region, for the audit trail and overlay.
#[derive(Debug, Clone)]
pub struct VisualElementRecord {
    pub page_index: usize,
    pub rect: ir_common::Rect,
    pub label: String,
    pub confidence: f64,
}

/// Substitute every classified image region in place.
///
/// Regions and classifications are positionally aligned; a region
/// without a classification (or with an empty candidate list) is left
/// untouched. Each substituted region also contributes a span so the
/// overlay can mark it for review.
pub fn process_visual_elements(
    doc: &mut PageDocument,
    regions: &[ImageRegion],
    classifications: &[Vec<RankedLabel>],
    policy: &RedactionPolicy,
    spans: &mut Vec<RedactionSpan>,
) -> Vec<VisualElementRecord> {
    let mut mode = policy.visual_mode();
    if mode == VisualMode::Prompt {
        warn!("prompt-based visual replacement is not wired in, degrading to text boxes");
        mode = VisualMode::TextBox;
    }

    let mut records = Vec::new();
    for (index, region) in regions.iter().enumerate() {
        let Some(top) = classifications.get(index).and_then(|ranked| ranked.first()) else {
            warn!(region = index, "image region has no classification, leaving as is");
            continue;
        };

        let Some(height) = doc.pages.get(region.page_index).map(|p| p.height) else {
            warn!(region = index, page = region.page_index, "image region references missing page");
            continue;
        };
        let Some(rect) = region.bbox.to_page_rect(height) else {
            warn!(region = index, "image region has invalid bbox");
            continue;
        };

        let display = display_label(&top.label);
        let drawn = match mode {
            VisualMode::Image => doc.draw_rect(region.page_index, rect, None, Some(GRAY)),
            _ => doc
                .draw_rect(region.page_index, rect, None, Some(BLACK))
                .and_then(|_| {
                    doc.insert_centered_text(region.page_index, rect, &display, WHITE)
                        .map(|_| ())
                }),
        };
        if let Err(err) = drawn {
            warn!(region = index, %err, "could not substitute image region");
            continue;
        }

        spans.push(RedactionSpan {
            page_index: region.page_index,
            source_text: format!("Visual: {}", display),
            category: "Visual Element".to_string(),
            rect,
            span_id: format!("visual_{}_{}", region.page_index, index),
            occurrence: (index + 1) as u32,
        });
        records.push(VisualElementRecord {
            page_index: region.page_index,
            rect,
            label: top.label.clone(),
            confidence: top.confidence,
        });
    }

    records
}

/// `signature_block` becomes `Signature Block`.
fn display_label(label: &str) -> String {
    label
        .replace('_', " ")
        .split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
