//! Aggregate statistics over the history.
//!
//! Pure functions of the current history contents:
//! - **Summary**: total, productive vs. everything else, rounded percentages
//! - **Weekday histogram**: seven buckets (Sun..Sat) split by productivity
//! - **Insight**: a qualitative message picked from the productive share
//!
//! Anything that is not `Produtivo` (including `Erro` and unknown labels)
//! counts as unproductive here.

use chrono::Datelike;
use serde::Serialize;

use crate::analysis::AnalysisResult;
use crate::analysis::card::parse_local_timestamp;

// ---------------------------------------------------------------------------
// Summary
// ---------------------------------------------------------------------------

/// Counts and rounded percentages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub total: usize,
    pub productive: usize,
    pub unproductive: usize,
    pub productive_pct: u32,
    pub unproductive_pct: u32,
}

/// Compute the summary. Percentages are 0 when the history is empty.
pub fn summarize(entries: &[AnalysisResult]) -> Summary {
    let total = entries.len();
    let productive = entries
        .iter()
        .filter(|e| e.category.is_productive())
        .count();
    let unproductive = total - productive;

    Summary {
        total,
        productive,
        unproductive,
        productive_pct: rounded_pct(productive, total),
        unproductive_pct: rounded_pct(unproductive, total),
    }
}

/// `count / total` as a percentage rounded half away from zero.
fn rounded_pct(count: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    ((count as f64 / total as f64) * 100.0).round() as u32
}

// ---------------------------------------------------------------------------
// Weekday histogram
// ---------------------------------------------------------------------------

/// Short weekday labels, Sunday first.
pub const WEEKDAY_LABELS: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];

/// One weekday bar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WeekdayBucket {
    pub day: &'static str,
    pub productive: usize,
    pub unproductive: usize,
}

/// Count entries per local weekday of `created_at`.
///
/// Always returns seven buckets. Entries without a parseable timestamp are
/// left out.
pub fn weekday_histogram(entries: &[AnalysisResult]) -> Vec<WeekdayBucket> {
    let mut buckets: Vec<WeekdayBucket> = WEEKDAY_LABELS
        .iter()
        .map(|&day| WeekdayBucket {
            day,
            productive: 0,
            unproductive: 0,
        })
        .collect();

    for entry in entries {
        let Some(ts) = entry.created_at.as_deref().and_then(parse_local_timestamp) else {
            continue;
        };
        let bucket = &mut buckets[ts.weekday().num_days_from_sunday() as usize];
        if entry.category.is_productive() {
            bucket.productive += 1;
        } else {
            bucket.unproductive += 1;
        }
    }

    buckets
}

// ---------------------------------------------------------------------------
// Insight
// ---------------------------------------------------------------------------

/// Qualitative reading of the productive share.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Insight {
    /// More than 70% productive.
    Excellent,
    /// More than 50%, up to 70%.
    Good,
    /// 50% or less.
    Caution,
}

impl Insight {
    pub fn from_productive_pct(pct: u32) -> Self {
        if pct > 70 {
            Self::Excellent
        } else if pct > 50 {
            Self::Good
        } else {
            Self::Caution
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            Self::Excellent => {
                "Excellent! Most of your emails are productive. Keep up the efficiency!"
            }
            Self::Good => {
                "Good share of productive emails. Consider filtering what reaches your inbox more closely."
            }
            Self::Caution => {
                "Lots of unproductive emails. Consider stricter filters or reviewing your subscriptions."
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

/// Everything the stats views render.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Report {
    pub summary: Summary,
    pub weekdays: Vec<WeekdayBucket>,
    pub insight: Insight,
    pub insight_message: &'static str,
}

pub fn build_report(entries: &[AnalysisResult]) -> Report {
    let summary = summarize(entries);
    let insight = Insight::from_productive_pct(summary.productive_pct);
    Report {
        summary,
        weekdays: weekday_histogram(entries),
        insight,
        insight_message: insight.message(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
