//! Analysis results as returned by the classification service.
//!
//! The wire format uses Portuguese category labels (`"Produtivo"`,
//! `"Improdutivo"`, `"Erro"`) and camelCase for `originalText`. Unknown
//! category labels are preserved verbatim so that a persisted history
//! re-serializes exactly as it was read.

pub mod card;

use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Category
// ---------------------------------------------------------------------------

/// Classification outcome. Drives every conditional branch in rendering and
/// aggregation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Category {
    /// Requires a reply, task, or approval.
    Productive,
    /// Informational, no action needed.
    Unproductive,
    /// The service failed or refused to classify.
    Error,
    /// Any other label, kept as received (empty when missing).
    Unknown(String),
}

impl Category {
    /// The label used on the wire and in the persisted history.
    pub fn wire_label(&self) -> &str {
        match self {
            Self::Productive => "Produtivo",
            Self::Unproductive => "Improdutivo",
            Self::Error => "Erro",
            Self::Unknown(raw) => raw,
        }
    }

    pub fn is_productive(&self) -> bool {
        matches!(self, Self::Productive)
    }
}

impl Default for Category {
    fn default() -> Self {
        Self::Unknown(String::new())
    }
}

impl From<String> for Category {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "Produtivo" => Self::Productive,
            "Improdutivo" => Self::Unproductive,
            "Erro" => Self::Error,
            _ => Self::Unknown(raw),
        }
    }
}

impl From<Category> for String {
    fn from(category: Category) -> Self {
        match category {
            Category::Unknown(raw) => raw,
            other => other.wire_label().to_string(),
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Productive => write!(f, "Productive"),
            Self::Unproductive => write!(f, "Unproductive"),
            Self::Error => write!(f, "Error"),
            Self::Unknown(raw) if raw.is_empty() => write!(f, "Unknown"),
            Self::Unknown(raw) => write!(f, "{raw}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Analysis result
// ---------------------------------------------------------------------------

/// One classification outcome plus display metadata. One history entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResult {
    #[serde(default)]
    pub category: Category,
    /// Justification for the classification.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Suggested reply. Only meaningful for productive emails.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
    /// The text the service actually classified.
    #[serde(
        rename = "originalText",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub original_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    /// ISO-8601 timestamp set by the service, usually without an offset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    /// Diagnostic message attached to `Erro` results.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AnalysisResult {
    /// Suggestion text, if this result should display one.
    pub fn visible_suggestion(&self) -> Option<&str> {
        if !self.category.is_productive() {
            return None;
        }
        self.suggestion.as_deref().filter(|s| !s.is_empty())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_parses_known_labels() {
        assert_eq!(Category::from("Produtivo".to_string()), Category::Productive);
        assert_eq!(
            Category::from("Improdutivo".to_string()),
            Category::Unproductive
        );
        assert_eq!(Category::from("Erro".to_string()), Category::Error);
        assert_eq!(
            Category::from("Spam".to_string()),
            Category::Unknown("Spam".to_string())
        );
    }

    #[test]
    fn deserializes_service_payload() {
        let json = r#"{
            "category": "Produtivo",
            "reason": "Pede confirmação",
            "suggestion": "Confirmo o recebimento.",
            "originalText": "Preciso que confirme a reunião",
            "created_at": "2025-03-10T14:22:05.123456"
        }"#;
        let result: AnalysisResult = serde_json::from_str(json).unwrap();
        assert_eq!(result.category, Category::Productive);
        assert_eq!(result.reason.as_deref(), Some("Pede confirmação"));
        assert_eq!(
            result.original_text.as_deref(),
            Some("Preciso que confirme a reunião")
        );
        assert!(result.sender.is_none());
    }

    #[test]
    fn missing_category_defaults_to_unknown() {
        let result: AnalysisResult = serde_json::from_str("{}").unwrap();
        assert_eq!(result.category, Category::Unknown(String::new()));
    }

    #[test]
    fn unknown_category_round_trips_verbatim() {
        let json = r#"{"category":"Neutro","reason":"?"}"#;
        let result: AnalysisResult = serde_json::from_str(json).unwrap();
        assert_eq!(serde_json::to_string(&result).unwrap(), json);
    }

    #[test]
    fn suggestion_hidden_unless_productive() {
        let mut result = AnalysisResult {
            category: Category::Unproductive,
            suggestion: Some("Obrigado".to_string()),
            ..Default::default()
        };
        assert_eq!(result.visible_suggestion(), None);

        result.category = Category::Productive;
        assert_eq!(result.visible_suggestion(), Some("Obrigado"));

        result.suggestion = Some(String::new());
        assert_eq!(result.visible_suggestion(), None);
    }
}
