//! Policy configuration: category-to-action tables and global switches.

use crate::{TextAction, VisualAction, VisualMode};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tracing::warn;

/// Global run switches.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GlobalSettings {
    /// Whether to produce the review overlay document.
    #[serde(default = "default_true")]
    pub create_overlay: bool,

    /// Rendering strategy for visual element substitution.
    #[serde(default)]
    pub visual_replacement_mode: VisualMode,

    /// Whether to persist the audit log artifact.
    #[serde(default = "default_true")]
    pub audit_logging: bool,
}

fn default_true() -> bool {
    true
}

impl Default for GlobalSettings {
    fn default() -> Self {
        GlobalSettings {
            create_overlay: true,
            visual_replacement_mode: VisualMode::TextBox,
            audit_logging: true,
        }
    }
}

/// Redaction policy: read-only category lookups after load.
///
/// Built-in defaults cover the canonical PII/PHI category set. An
/// optional YAML override file is merged shallowly over the defaults
/// (a present section replaces the default section wholesale; unknown
/// categories fall back to the default action at lookup time).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedactionPolicy {
    #[serde(default)]
    text_policies: HashMap<String, TextAction>,

    #[serde(default)]
    visual_policies: HashMap<String, VisualAction>,

    #[serde(default)]
    global_settings: GlobalSettings,
}

/// Partial policy file shape for overrides. Every section is optional.
#[derive(Debug, Deserialize)]
struct PolicyOverride {
    text_policies: Option<HashMap<String, TextAction>>,
    visual_policies: Option<HashMap<String, VisualAction>>,
    global_settings: Option<GlobalSettings>,
}

impl RedactionPolicy {
    /// Built-in default policy.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load defaults, then apply a YAML override file if one is given.
    ///
    /// A missing or malformed override is reported as a warning and the
    /// run continues on defaults; it never aborts.
    pub fn load<P: AsRef<Path>>(override_path: Option<P>) -> Self {
        let mut policy = Self::default();
        if let Some(path) = override_path {
            policy.apply_overrides(path.as_ref());
        }
        policy
    }

    fn apply_overrides(&mut self, path: &Path) {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(err) => {
                warn!(path = %path.display(), %err, "could not read policy override, using defaults");
                return;
            }
        };

        match serde_yaml::from_str::<PolicyOverride>(&content) {
            Ok(overrides) => {
                if let Some(text) = overrides.text_policies {
                    self.text_policies = text;
                }
                if let Some(visual) = overrides.visual_policies {
                    self.visual_policies = visual;
                }
                if let Some(global) = overrides.global_settings {
                    self.global_settings = global;
                }
            }
            Err(err) => {
                warn!(path = %path.display(), %err, "malformed policy override, using defaults");
            }
        }
    }

    /// Text action for a category. Unknown categories anonymize.
    pub fn text_action(&self, category: &str) -> TextAction {
        self.text_policies.get(category).copied().unwrap_or_default()
    }

    /// Visual action for a category. Unknown categories get a text box.
    pub fn visual_action(&self, category: &str) -> VisualAction {
        self.visual_policies
            .get(category)
            .copied()
            .unwrap_or_default()
    }

    pub fn overlay_enabled(&self) -> bool {
        self.global_settings.create_overlay
    }

    pub fn audit_logging_enabled(&self) -> bool {
        self.global_settings.audit_logging
    }

    pub fn visual_mode(&self) -> VisualMode {
        self.global_settings.visual_replacement_mode
    }
}

impl Default for RedactionPolicy {
    fn default() -> Self {
        let mut text_policies = HashMap::new();

        // PII categories
        text_policies.insert("Name".to_string(), TextAction::Anonymize);
        text_policies.insert("Address".to_string(), TextAction::DummyReplacement);
        text_policies.insert("Birthday".to_string(), TextAction::Anonymize);
        text_policies.insert("Email".to_string(), TextAction::DummyReplacement);
        text_policies.insert("Phone".to_string(), TextAction::DummyReplacement);
        text_policies.insert("SSN".to_string(), TextAction::Anonymize);
        text_policies.insert("Passport".to_string(), TextAction::Anonymize);
        text_policies.insert("Credit card".to_string(), TextAction::Anonymize);
        text_policies.insert("Biometrics".to_string(), TextAction::Anonymize);
        text_policies.insert("Age".to_string(), TextAction::Anonymize);
        text_policies.insert("Gender".to_string(), TextAction::DummyReplacement);
        text_policies.insert("Race".to_string(), TextAction::DummyReplacement);
        text_policies.insert("Location".to_string(), TextAction::DummyReplacement);

        // PHI categories
        text_policies.insert("Medical Record Number".to_string(), TextAction::Anonymize);
        text_policies.insert(
            "Health Plan Beneficiary Number".to_string(),
            TextAction::Anonymize,
        );
        text_policies.insert("Account Number".to_string(), TextAction::Anonymize);
        text_policies.insert(
            "Certificate License Number".to_string(),
            TextAction::Anonymize,
        );
        text_policies.insert("Vehicle Identifier".to_string(), TextAction::Anonymize);
        text_policies.insert("Device Identifier".to_string(), TextAction::Anonymize);
        text_policies.insert("Web URL".to_string(), TextAction::DummyReplacement);
        text_policies.insert("IP Address".to_string(), TextAction::DummyReplacement);
        text_policies.insert("Biometric Identifier".to_string(), TextAction::Anonymize);
        text_policies.insert("Full Face Photo".to_string(), TextAction::Anonymize);
        text_policies.insert("Medical Condition".to_string(), TextAction::DummyReplacement);
        text_policies.insert("Medication".to_string(), TextAction::DummyReplacement);
        text_policies.insert("Doctor Name".to_string(), TextAction::DummyReplacement);
        text_policies.insert("Hospital Name".to_string(), TextAction::DummyReplacement);
        text_policies.insert("Insurance Info".to_string(), TextAction::Anonymize);

        let mut visual_policies = HashMap::new();
        visual_policies.insert("Name".to_string(), VisualAction::TextBoxReplacement);
        visual_policies.insert("Address".to_string(), VisualAction::ImageReplacement);
        visual_policies.insert("Email".to_string(), VisualAction::TextBoxReplacement);
        visual_policies.insert("Phone".to_string(), VisualAction::TextBoxReplacement);
        visual_policies.insert("Face".to_string(), VisualAction::ImageReplacement);
        visual_policies.insert("Fingerprint".to_string(), VisualAction::ImageReplacement);
        visual_policies.insert("Signature".to_string(), VisualAction::ImageReplacement);
        visual_policies.insert("Medical Image".to_string(), VisualAction::ImageReplacement);
        visual_policies.insert("ID Card".to_string(), VisualAction::ImageReplacement);
        visual_policies.insert(
            "Document Photo".to_string(),
            VisualAction::TextBoxReplacement,
        );
        visual_policies.insert("Barcode".to_string(), VisualAction::ImageReplacement);
        visual_policies.insert("QR Code".to_string(), VisualAction::ImageReplacement);

        RedactionPolicy {
            text_policies,
            visual_policies,
            global_settings: GlobalSettings::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_lookups() {
        let policy = RedactionPolicy::default();

        assert_eq!(policy.text_action("SSN"), TextAction::Anonymize);
        assert_eq!(policy.text_action("Address"), TextAction::DummyReplacement);
        assert_eq!(
            policy.visual_action("Signature"),
            VisualAction::ImageReplacement
        );
        assert!(policy.overlay_enabled());
        assert_eq!(policy.visual_mode(), VisualMode::TextBox);
    }

    #[test]
    fn test_unknown_category_falls_back() {
        let policy = RedactionPolicy::default();

        assert_eq!(policy.text_action("Shoe Size"), TextAction::Anonymize);
        assert_eq!(
            policy.visual_action("Watermark"),
            VisualAction::TextBoxReplacement
        );
    }

    #[test]
    fn test_override_replaces_sections() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            "text_policies:\n  SSN: dummy_replacement\nglobal_settings:\n  create_overlay: false\n"
        )
        .unwrap();

        let policy = RedactionPolicy::load(Some(file.path()));

        assert_eq!(policy.text_action("SSN"), TextAction::DummyReplacement);
        // Shallow merge: the text section was replaced wholesale, so
        // Name now falls back to the default action.
        assert_eq!(policy.text_action("Name"), TextAction::Anonymize);
        assert!(!policy.overlay_enabled());
        // Untouched sections keep their defaults.
        assert_eq!(policy.visual_action("Face"), VisualAction::ImageReplacement);
    }

    #[test]
    fn test_malformed_override_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "text_policies: [not, a, mapping]\n").unwrap();

        let policy = RedactionPolicy::load(Some(file.path()));

        assert_eq!(policy.text_action("SSN"), TextAction::Anonymize);
        assert!(policy.overlay_enabled());
    }

    #[test]
    fn test_missing_override_keeps_defaults() {
        let policy = RedactionPolicy::load(Some("/nonexistent/policy.yaml"));
        assert_eq!(policy.text_action("Phone"), TextAction::DummyReplacement);
    }
}
