//! Span mapping: locating detected entities in page space.

use crate::aggregate::DetectedEntity;
use crate::collab::ExtractedContent;
use crate::document::{PageDocument, TextRun, BLACK, DEFAULT_FONT_SIZE};
use ir_common::Rect;
use std::collections::HashMap;
use tracing::warn;

/// One located occurrence of an entity, ready for redaction.
#[derive(Debug, Clone)]
pub struct RedactionSpan {
    pub page_index: usize,
    pub source_text: String,
    pub category: String,
    pub rect: Rect,
    /// `page_{page}_{category}_{occurrence}_{match}` identifier.
    pub span_id: String,
    /// 1-based, per category, across the whole document.
    pub occurrence: u32,
}

/// Render extracted layout content into a searchable page document.
///
/// Every text block is flipped from layout space into page space on its
/// page. Blocks with degenerate or non-finite boxes are dropped with a
/// warning rather than poisoning downstream search.
pub fn build_text_rendition(content: &ExtractedContent) -> PageDocument {
    let sizes: Vec<(f64, f64)> = content
        .pages
        .iter()
        .map(|page| (page.width, page.height))
        .collect();
    let mut doc = PageDocument::with_pages(&sizes);

    for (index, block) in content.text_blocks.iter().enumerate() {
        let Some(page) = doc.pages.get_mut(block.page_index) else {
            warn!(block = index, page = block.page_index, "text block references missing page");
            continue;
        };
        match block.bbox.to_page_rect(page.height) {
            Some(rect) => page.runs.push(TextRun {
                text: block.text.clone(),
                rect,
                font_size: DEFAULT_FONT_SIZE,
                color: BLACK,
            }),
            None => {
                warn!(block = index, page = block.page_index, "dropping block with invalid bbox");
            }
        }
    }

    doc
}

/// Locate every entity occurrence in the document.
///
/// Entities are processed in detection order. Each entity is assigned
/// the next occurrence number for its category before its matches are
/// searched, so the Nth detected entity of a category carries
/// occurrence N document-wide regardless of which pages it lands on.
/// An entity with no match anywhere yields no spans but still consumes
/// its occurrence number.
pub fn map_spans(doc: &PageDocument, entities: &[DetectedEntity]) -> Vec<RedactionSpan> {
    let mut spans = Vec::new();
    let mut counters: HashMap<String, u32> = HashMap::new();

    for entity in entities {
        if entity.text.trim().is_empty() {
            continue;
        }

        let counter = counters.entry(entity.category.clone()).or_insert(0);
        *counter += 1;
        let occurrence = *counter;

        let mut matched = false;
        for (page_index, page) in doc.pages.iter().enumerate() {
            for (match_index, rect) in page.search(&entity.text).into_iter().enumerate() {
                matched = true;
                spans.push(RedactionSpan {
                    page_index,
                    source_text: entity.text.clone(),
                    category: entity.category.clone(),
                    rect,
                    span_id: format!(
                        "page_{}_{}_{}_{}",
                        page_index, entity.category, occurrence, match_index
                    ),
                    occurrence,
                });
            }
        }
        if !matched {
            warn!(
                category = %entity.category,
                "detected entity not found in rendered text"
            );
        }
    }

    spans
}
