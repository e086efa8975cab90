//! Redaction actions.

use serde::{Deserialize, Serialize};

/// Action to apply to a text occurrence of a category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextAction {
    /// Replace with a deterministic placeholder encoding category and
    /// occurrence, e.g. `[SSN_1]`.
    Anonymize,
    /// Replace with synthetic data from the generator.
    DummyReplacement,
    /// Replace with rewritten text (treated as the generic marker when
    /// no rewriter is wired in).
    Rewrite,
}

impl TextAction {
    /// Parse an action from a string.
    pub fn parse_str(s: &str) -> Option<Self> {
        match s {
            "anonymize" => Some(TextAction::Anonymize),
            "dummy_replacement" => Some(TextAction::DummyReplacement),
            "rewrite" => Some(TextAction::Rewrite),
            _ => None,
        }
    }
}

impl std::fmt::Display for TextAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            TextAction::Anonymize => "anonymize",
            TextAction::DummyReplacement => "dummy_replacement",
            TextAction::Rewrite => "rewrite",
        };
        write!(f, "{}", s)
    }
}

impl Default for TextAction {
    fn default() -> Self {
        TextAction::Anonymize // fallback for unknown categories
    }
}

/// Action to apply to a visual region of a category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VisualAction {
    /// Opaque box with a centered classification label.
    TextBoxReplacement,
    /// Neutral placeholder rectangle.
    ImageReplacement,
}

impl std::fmt::Display for VisualAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            VisualAction::TextBoxReplacement => "text_box_replacement",
            VisualAction::ImageReplacement => "image_replacement",
        };
        write!(f, "{}", s)
    }
}

impl Default for VisualAction {
    fn default() -> Self {
        VisualAction::TextBoxReplacement
    }
}

/// Global rendering strategy for visual element substitution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VisualMode {
    /// Ask the operator at run time; degrades to `TextBox` in
    /// non-interactive runs.
    Prompt,
    /// Opaque labeled box.
    TextBox,
    /// Placeholder image substitution (always degrades to a neutral
    /// rectangle; full image substitution is not implemented).
    Image,
}

impl std::fmt::Display for VisualMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            VisualMode::Prompt => "prompt",
            VisualMode::TextBox => "text_box",
            VisualMode::Image => "image",
        };
        write!(f, "{}", s)
    }
}

impl Default for VisualMode {
    fn default() -> Self {
        VisualMode::TextBox
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_action_parse() {
        assert_eq!(TextAction::parse_str("anonymize"), Some(TextAction::Anonymize));
        assert_eq!(
            TextAction::parse_str("dummy_replacement"),
            Some(TextAction::DummyReplacement)
        );
        assert_eq!(TextAction::parse_str("rewrite"), Some(TextAction::Rewrite));
        assert_eq!(TextAction::parse_str("shred"), None);
    }

    #[test]
    fn test_serde_snake_case() {
        let json = serde_json::to_string(&TextAction::DummyReplacement).unwrap();
        assert_eq!(json, "\"dummy_replacement\"");

        let mode: VisualMode = serde_yaml::from_str("text_box").unwrap();
        assert_eq!(mode, VisualMode::TextBox);
    }

    #[test]
    fn test_display_round_trip() {
        for action in [
            TextAction::Anonymize,
            TextAction::DummyReplacement,
            TextAction::Rewrite,
        ] {
            assert_eq!(TextAction::parse_str(&action.to_string()), Some(action));
        }
    }
}
