//! Replacement decisioning: what each located span becomes.

use crate::collab::{GeneratorOutcome, SyntheticGenerator};
use crate::span::RedactionSpan;
use ir_policy::{RedactionPolicy, TextAction};
use std::collections::HashMap;
use tracing::{debug, warn};

/// Final verdict for one span.
#[derive(Debug, Clone)]
pub struct ReplacementDecision {
    pub span_id: String,
    pub action: TextAction,
    pub replacement: String,
}

/// Stateful decision engine. Holds the policy, the generator handle,
/// and a cache of generated mappings keyed by the requested category
/// set so repeated requests within a run cost one generator call.
pub struct ReplacementEngine {
    policy: RedactionPolicy,
    generator: Box<dyn SyntheticGenerator>,
    cache: HashMap<String, HashMap<String, String>>,
}

impl ReplacementEngine {
    pub fn new(policy: RedactionPolicy, generator: Box<dyn SyntheticGenerator>) -> Self {
        ReplacementEngine {
            policy,
            generator,
            cache: HashMap::new(),
        }
    }

    pub fn policy(&self) -> &RedactionPolicy {
        &self.policy
    }

    /// Warm the cache with one batched generator call for the full
    /// category set of a run.
    pub fn seed(&mut self, categories: &[String]) {
        self.generate(categories);
    }

    /// Decide action and replacement text for a located span.
    pub fn decide_for(&mut self, span: &RedactionSpan) -> ReplacementDecision {
        let (action, replacement) = self.decide(&span.category, span.occurrence);
        ReplacementDecision {
            span_id: span.span_id.clone(),
            action,
            replacement,
        }
    }

    /// Decide action and replacement text for one category occurrence.
    pub fn decide(&mut self, category: &str, occurrence: u32) -> (TextAction, String) {
        let action = self.policy.text_action(category);
        let replacement = match action {
            TextAction::Anonymize => format!("[{}_{}]", category, occurrence),
            TextAction::DummyReplacement => {
                let mapping = self.generate(&[category.to_string()]);
                mapping
                    .get(category)
                    .cloned()
                    .unwrap_or_else(|| format!("[Dummy {}]", category))
            }
            TextAction::Rewrite => format!("[REDACTED_{}]", category),
        };
        (action, replacement)
    }

    /// Resolve a category set to a replacement mapping, via the cache.
    ///
    /// The cache key is the sorted, deduplicated category list, so the
    /// same set in any order or multiplicity hits the same entry.
    /// Fallback mappings produced during an outage are not cached; a
    /// later request retries the generator.
    fn generate(&mut self, categories: &[String]) -> HashMap<String, String> {
        if categories.is_empty() {
            return HashMap::new();
        }

        let mut key_parts: Vec<&str> = categories.iter().map(String::as_str).collect();
        key_parts.sort_unstable();
        key_parts.dedup();
        let key = key_parts.join(",");

        if let Some(cached) = self.cache.get(&key) {
            debug!(%key, "replacement cache hit");
            return cached.clone();
        }

        match self.generator.generate(categories) {
            GeneratorOutcome::Generated(mapping) => {
                self.cache.insert(key, mapping.clone());
                mapping
            }
            GeneratorOutcome::Unavailable(reason) => {
                warn!(%key, %reason, "generator unavailable, using fallback replacements");
                key_parts
                    .iter()
                    .map(|category| (category.to_string(), fallback_replacement(category)))
                    .collect()
            }
        }
    }
}

/// Static synthetic values for generator outages.
fn fallback_replacement(category: &str) -> String {
    match category {
        "Name" => "John Smith",
        "Address" => "123 Main Street, Anytown, State 12345",
        "Birthday" => "01/15/1985",
        "Email" => "john.smith@example.com",
        "Phone" => "(555) 123-4567",
        "SSN" => "123-45-6789",
        "Passport" => "A12345678",
        "Credit card" => "1234-5678-9012-3456",
        "Age" => "35",
        "Gender" => "Non-binary",
        "Race" => "Mixed",
        "Location" => "Sample City",
        "Medical Condition" => "General wellness check",
        "Medication" => "Over-the-counter supplement",
        "Doctor Name" => "Dr. Smith",
        "Hospital Name" => "General Medical Center",
        "Medical Record Number" => "MRN123456",
        "Health Plan Beneficiary Number" => "HPN987654",
        "Account Number" => "ACC123456789",
        "Web URL" => "https://example.com",
        "IP Address" => "192.168.1.1",
        other => return format!("[Dummy {}]", other),
    }
    .to_string()
}
