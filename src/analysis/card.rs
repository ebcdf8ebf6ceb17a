//! Display view of a single analysis result.
//!
//! Everything here is derived from an [`AnalysisResult`] plus display
//! settings: placeholder text, original-text truncation, and the shifted
//! timestamp. Both the terminal output and the dashboard render from
//! [`CardView`].

use chrono::{DateTime, Local, NaiveDateTime, TimeDelta};
use serde::Serialize;

use super::{AnalysisResult, Category};

/// Shown when the service gave no justification.
pub const NO_REASON_PLACEHOLDER: &str = "No justification provided";

/// Shown when a result carries no usable timestamp.
pub const NO_TIMESTAMP_PLACEHOLDER: &str = "-";

/// Default number of characters of original text shown before truncation.
pub const DEFAULT_PREVIEW_CHARS: usize = 200;

/// Default manual shift applied to timestamps before display (UTC to GMT-3).
pub const DEFAULT_TIMESTAMP_SHIFT_HOURS: i64 = -3;

/// Display knobs that affect card rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CardOptions {
    pub preview_chars: usize,
    pub timestamp_shift_hours: i64,
}

impl Default for CardOptions {
    fn default() -> Self {
        Self {
            preview_chars: DEFAULT_PREVIEW_CHARS,
            timestamp_shift_hours: DEFAULT_TIMESTAMP_SHIFT_HOURS,
        }
    }
}

/// Style bucket for a category. The dashboard maps these to CSS classes and
/// the terminal to colors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    Success,
    Warning,
    Danger,
    Neutral,
}

impl Tone {
    pub fn for_category(category: &Category) -> Self {
        match category {
            Category::Productive => Self::Success,
            Category::Unproductive => Self::Warning,
            Category::Error => Self::Danger,
            Category::Unknown(_) => Self::Neutral,
        }
    }
}

/// Original text as displayed, with the expand toggle state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TextPreview {
    pub shown: String,
    /// Whether the full text exceeds the preview length (toggle is offered).
    pub expandable: bool,
    pub expanded: bool,
}

/// Fully resolved card for one history entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CardView {
    pub category: String,
    pub tone: Tone,
    pub reason: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_text: Option<TextPreview>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sender: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    pub timestamp: String,
}

impl CardView {
    pub fn build(result: &AnalysisResult, options: &CardOptions, expanded: bool) -> Self {
        let reason = result
            .reason
            .as_deref()
            .filter(|r| !r.is_empty())
            .unwrap_or(NO_REASON_PLACEHOLDER)
            .to_string();

        let original_text = result
            .original_text
            .as_deref()
            .filter(|t| !t.is_empty())
            .map(|text| preview_text(text, options.preview_chars, expanded));

        let sender = result.sender.clone().filter(|s| !s.is_empty());
        // Company is only meaningful next to a sender.
        let company = sender
            .as_ref()
            .and(result.company.clone())
            .filter(|c| !c.is_empty());

        Self {
            category: result.category.to_string(),
            tone: Tone::for_category(&result.category),
            reason,
            original_text,
            suggestion: result.visible_suggestion().map(str::to_string),
            sender,
            company,
            timestamp: format_timestamp(
                result.created_at.as_deref(),
                options.timestamp_shift_hours,
            ),
        }
    }
}

// ---------------------------------------------------------------------------
// Text helpers
// ---------------------------------------------------------------------------

/// Build the original-text preview. Counts characters, not bytes.
pub fn preview_text(text: &str, max_chars: usize, expanded: bool) -> TextPreview {
    let expandable = text.chars().count() > max_chars;
    let shown = if expandable && !expanded {
        let cut: String = text.chars().take(max_chars).collect();
        format!("{cut}...")
    } else {
        text.to_string()
    };

    TextPreview {
        shown,
        expandable,
        expanded: expandable && expanded,
    }
}

// ---------------------------------------------------------------------------
// Timestamps
// ---------------------------------------------------------------------------

/// Parse a service timestamp into local wall-clock time.
///
/// Timestamps with an offset are converted to the local zone. Naive ones
/// (the service's default `datetime.isoformat()` output) are taken as local
/// wall time already.
pub fn parse_local_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Local).naive_local());
    }

    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
}

/// Render a timestamp as `dd/mm/yyyy HH:MM` after the manual hour shift.
///
/// Falls back to the placeholder when the shift leaves chrono's range.
pub fn format_timestamp(raw: Option<&str>, shift_hours: i64) -> String {
    raw.and_then(parse_local_timestamp)
        .and_then(|ts| ts.checked_add_signed(TimeDelta::try_hours(shift_hours)?))
        .map(|ts| ts.format("%d/%m/%Y %H:%M").to_string())
        .unwrap_or_else(|| NO_TIMESTAMP_PLACEHOLDER.to_string())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn result(category: Category) -> AnalysisResult {
        AnalysisResult {
            category,
            ..Default::default()
        }
    }

    #[test]
    fn missing_reason_uses_placeholder() {
        let card = CardView::build(&result(Category::Error), &CardOptions::default(), false);
        assert_eq!(card.reason, NO_REASON_PLACEHOLDER);
        assert_eq!(card.tone, Tone::Danger);
        assert_eq!(card.timestamp, NO_TIMESTAMP_PLACEHOLDER);
    }

    #[test]
    fn long_text_is_truncated_until_expanded() {
        let text = "a".repeat(250);

        let collapsed = preview_text(&text, 200, false);
        assert!(collapsed.expandable);
        assert!(!collapsed.expanded);
        assert_eq!(collapsed.shown.len(), 203);
        assert!(collapsed.shown.ends_with("..."));

        let expanded = preview_text(&text, 200, true);
        assert!(expanded.expanded);
        assert_eq!(expanded.shown, text);
    }

    #[test]
    fn text_at_threshold_is_not_expandable() {
        let text = "é".repeat(200);
        let preview = preview_text(&text, 200, false);
        assert!(!preview.expandable);
        assert_eq!(preview.shown, text);
    }

    #[test]
    fn suggestion_only_on_productive_cards() {
        let mut r = result(Category::Unproductive);
        r.suggestion = Some("Obrigado pelo contato".to_string());
        let card = CardView::build(&r, &CardOptions::default(), false);
        assert!(card.suggestion.is_none());

        r.category = Category::Productive;
        let card = CardView::build(&r, &CardOptions::default(), false);
        assert_eq!(card.suggestion.as_deref(), Some("Obrigado pelo contato"));
        assert_eq!(card.tone, Tone::Success);
    }

    #[test]
    fn company_requires_sender() {
        let mut r = result(Category::Productive);
        r.company = Some("ACME".to_string());
        let card = CardView::build(&r, &CardOptions::default(), false);
        assert!(card.company.is_none());

        r.sender = Some("Ana".to_string());
        let card = CardView::build(&r, &CardOptions::default(), false);
        assert_eq!(card.sender.as_deref(), Some("Ana"));
        assert_eq!(card.company.as_deref(), Some("ACME"));
    }

    #[test]
    fn naive_timestamp_is_shifted_three_hours_back() {
        assert_eq!(
            format_timestamp(Some("2025-03-10T14:22:05.123456"), -3),
            "10/03/2025 11:22"
        );
        // Shift crosses midnight.
        assert_eq!(
            format_timestamp(Some("2025-03-10T01:30:00"), -3),
            "09/03/2025 22:30"
        );
    }

    #[test]
    fn unparseable_timestamp_falls_back_to_placeholder() {
        assert_eq!(format_timestamp(Some("yesterday"), -3), "-");
        assert_eq!(format_timestamp(None, -3), "-");
    }

    #[test]
    fn out_of_range_shift_falls_back_to_placeholder() {
        // Earliest year chrono parses; shifting back overflows.
        let mut r = result(Category::Productive);
        r.created_at = Some("-262143-01-01T01:00:00".to_string());
        let card = CardView::build(&r, &CardOptions::default(), false);
        assert_eq!(card.timestamp, NO_TIMESTAMP_PLACEHOLDER);

        assert_eq!(
            format_timestamp(Some("2025-03-10T14:22:05"), i64::MAX / 1000),
            NO_TIMESTAMP_PLACEHOLDER
        );
    }

    #[test]
    fn unknown_category_renders_raw_label() {
        let card = CardView::build(
            &result(Category::Unknown("Neutro".to_string())),
            &CardOptions::default(),
            false,
        );
        assert_eq!(card.category, "Neutro");
        assert_eq!(card.tone, Tone::Neutral);
    }
}
