/// Configuration schema and defaults for mailsort.
///
/// Defines the TOML-serializable configuration structure with the sections
/// `[endpoint]`, `[storage]`, `[display]`, `[logging]`, and `[web]`.
///
/// Every field has a built-in default. Users only set what they want to
/// override.
use serde::{Deserialize, Serialize};

use crate::analysis::card::{CardOptions, DEFAULT_PREVIEW_CHARS, DEFAULT_TIMESTAMP_SHIFT_HOURS};

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Top-level mailsort configuration.
///
/// Maps to `~/.mailsort/config.toml` and `.mailsort.toml`. All sections and
/// fields are optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MailsortConfig {
    pub endpoint: EndpointConfig,
    pub storage: StorageConfig,
    pub display: DisplayConfig,
    pub logging: LoggingConfig,
    pub web: WebConfig,
}

// ---------------------------------------------------------------------------
// [endpoint]
// ---------------------------------------------------------------------------

/// Classification service endpoint and request policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EndpointConfig {
    /// Full URL of the analyze endpoint.
    pub url: String,
    /// Per-attempt request timeout (milliseconds).
    pub timeout_ms: u64,
    /// Extra attempts after a transport error or 5xx. `0` means one attempt.
    pub retries: u32,
    /// Delay before the first retry (milliseconds). Doubles per retry.
    pub backoff_ms: u64,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            url: "http://127.0.0.1:8000/analyze".to_string(),
            timeout_ms: 30_000,
            retries: 0,
            backoff_ms: 500,
        }
    }
}

// ---------------------------------------------------------------------------
// [storage]
// ---------------------------------------------------------------------------

/// Durable local storage settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory holding one JSON file per storage key. `~` is expanded.
    pub dir: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            dir: "~/.mailsort/storage".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// [display]
// ---------------------------------------------------------------------------

/// Result card rendering settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Hours added to `created_at` before display.
    pub timestamp_shift_hours: i64,
    /// Characters of original text shown before the expand toggle.
    pub preview_chars: usize,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            timestamp_shift_hours: DEFAULT_TIMESTAMP_SHIFT_HOURS,
            preview_chars: DEFAULT_PREVIEW_CHARS,
        }
    }
}

impl DisplayConfig {
    pub fn card_options(&self) -> CardOptions {
        CardOptions {
            preview_chars: self.preview_chars,
            timestamp_shift_hours: self.timestamp_shift_hours,
        }
    }
}

// ---------------------------------------------------------------------------
// [logging]
// ---------------------------------------------------------------------------

/// Event logging settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Whether submission events are logged.
    pub enabled: bool,
    /// Path to the JSONL event log. `~` is expanded.
    pub path: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: "~/.mailsort/events.jsonl".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// [web]
// ---------------------------------------------------------------------------

/// Local dashboard settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WebConfig {
    /// Listen address for `mailsort web`.
    pub addr: String,
    /// Open the dashboard in the default browser on start.
    pub open_browser: bool,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            addr: "127.0.0.1:5173".to_string(),
            open_browser: true,
        }
    }
}

// ---------------------------------------------------------------------------
// Annotated default TOML
// ---------------------------------------------------------------------------

impl MailsortConfig {
    /// The annotated default config written by `mailsort config init`.
    pub fn default_toml() -> &'static str {
        DEFAULT_CONFIG_TOML
    }
}

const DEFAULT_CONFIG_TOML: &str = r#"# mailsort configuration
#
# Precedence (highest last): built-in defaults, ~/.mailsort/config.toml,
# .mailsort.toml in the working directory, MAILSORT_* environment variables.

[endpoint]
# Classification service endpoint (multipart POST).
url = "http://127.0.0.1:8000/analyze"
# Per-attempt timeout in milliseconds.
timeout_ms = 30000
# Extra attempts on connection errors or 5xx responses. 0 = single attempt.
retries = 0
# Delay before the first retry, doubled for each further retry.
backoff_ms = 500

[storage]
# Directory for the persisted history.
dir = "~/.mailsort/storage"

[display]
# Hours added to result timestamps before display.
timestamp_shift_hours = -3
# Characters of original text shown before truncation.
preview_chars = 200

[logging]
enabled = true
path = "~/.mailsort/events.jsonl"

[web]
addr = "127.0.0.1:5173"
open_browser = true
"#;

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
