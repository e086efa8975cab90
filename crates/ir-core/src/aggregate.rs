//! Entity aggregation: external detector output plus a built-in
//! pattern pass for structured health identifiers.

use crate::collab::{DetectionResult, TextBlock};
use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};

/// One concrete string to locate and redact, with its category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectedEntity {
    pub text: String,
    pub category: String,
}

struct PhiPattern {
    category: &'static str,
    regex: Lazy<Regex>,
}

macro_rules! phi_pattern {
    ($category:expr, $pattern:expr) => {
        PhiPattern {
            category: $category,
            regex: Lazy::new(|| {
                RegexBuilder::new($pattern)
                    .case_insensitive(true)
                    .build()
                    .unwrap()
            }),
        }
    };
}

/// Structured PHI identifiers the external detector routinely misses.
/// Capture group 1 holds the entity text where present.
static PHI_PATTERNS: [PhiPattern; 6] = [
    phi_pattern!("Medical Record Number", r"MRN[:\s]*(\d{6,})"),
    phi_pattern!("Health Plan Beneficiary Number", r"Member ID[:\s]*(\w{8,})"),
    phi_pattern!(
        "Medical Condition",
        r"(?:diagnosed with|suffers from|condition:)\s*([A-Za-z\s]{5,30})"
    ),
    phi_pattern!("Medication", r"(?:prescribed|taking|medication:)\s*([A-Za-z]{4,20})"),
    phi_pattern!("Doctor Name", r"Dr\.?\s+([A-Z][a-z]+\s+[A-Z][a-z]+)"),
    phi_pattern!(
        "Hospital Name",
        r"([A-Z][a-z\s]+(?:Hospital|Medical Center|Clinic))"
    ),
];

/// Merge the external detector's findings with the built-in pattern
/// pass over the extracted text.
///
/// External (entity, category) pairs come first, in detector order,
/// then pattern hits in table order. Duplicates are kept; downstream
/// search is tolerant of an entity matching in several places, and
/// occurrence numbering is handled at span-mapping time.
pub fn aggregate_entities(external: &DetectionResult, blocks: &[TextBlock]) -> Vec<DetectedEntity> {
    let mut entities: Vec<DetectedEntity> = external
        .entities
        .iter()
        .zip(external.categories.iter())
        .map(|(text, category)| DetectedEntity {
            text: text.clone(),
            category: category.clone(),
        })
        .collect();

    let text = blocks
        .iter()
        .map(|block| block.text.as_str())
        .collect::<Vec<_>>()
        .join("\n");

    for pattern in &PHI_PATTERNS {
        for captures in pattern.regex.captures_iter(&text) {
            let matched = captures
                .get(1)
                .or_else(|| captures.get(0))
                .map(|m| m.as_str().trim().to_string());
            if let Some(matched) = matched {
                if !matched.is_empty() {
                    entities.push(DetectedEntity {
                        text: matched,
                        category: pattern.category.to_string(),
                    });
                }
            }
        }
    }

    entities
}
