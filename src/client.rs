/// HTTP client for the classification service.
///
/// The service exposes one endpoint, `POST /analyze`, taking a multipart body
/// with optional parts:
///
/// - `file`: the uploaded email (`.pdf`, `.txt`, `.eml`)
/// - `email_text`: pasted email text
/// - `extra_context`: free-text context for the classifier
///
/// and answering with an [`AnalysisResult`] JSON object. The boundary and
/// `Content-Type` are left to reqwest.
///
/// Requests are synchronous (`reqwest::blocking`). Each attempt has the
/// configured timeout; transport errors and 5xx responses are retried up to
/// `retries` times with doubling backoff. 4xx and undecodable bodies are
/// final.
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::blocking::multipart::{Form, Part};
use thiserror::Error;

use crate::analysis::AnalysisResult;
use crate::config::schema::EndpointConfig;

// ---------------------------------------------------------------------------
// Request payload
// ---------------------------------------------------------------------------

/// An uploaded file: name plus raw bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl Attachment {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes,
        }
    }

    /// Read a file from disk.
    pub fn from_path(path: &Path) -> Result<Self> {
        let bytes =
            std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());
        Ok(Self { file_name, bytes })
    }

    /// MIME type guessed from the extension.
    pub fn mime_type(&self) -> &'static str {
        let ext = Path::new(&self.file_name)
            .extension()
            .map(|e| e.to_string_lossy().to_ascii_lowercase());
        match ext.as_deref() {
            Some("pdf") => "application/pdf",
            Some("txt") => "text/plain",
            Some("eml") => "message/rfc822",
            _ => "application/octet-stream",
        }
    }
}

/// Parts of one analyze request. Absent fields are not sent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnalyzeRequest {
    pub file: Option<Attachment>,
    pub email_text: Option<String>,
    pub extra_context: Option<String>,
}

impl AnalyzeRequest {
    /// Names of the multipart parts this request will carry, in send order.
    pub fn part_names(&self) -> Vec<&'static str> {
        let mut names = Vec::new();
        if self.file.is_some() {
            names.push("file");
        }
        if self.email_text.is_some() {
            names.push("email_text");
        }
        if self.extra_context.is_some() {
            names.push("extra_context");
        }
        names
    }

    fn to_form(&self) -> Result<Form, TransportError> {
        let mut form = Form::new();
        if let Some(file) = &self.file {
            let part = Part::bytes(file.bytes.clone())
                .file_name(file.file_name.clone())
                .mime_str(file.mime_type())
                .map_err(|e| TransportError::Request(e.to_string()))?;
            form = form.part("file", part);
        }
        if let Some(text) = &self.email_text {
            form = form.text("email_text", text.clone());
        }
        if let Some(context) = &self.extra_context {
            form = form.text("extra_context", context.clone());
        }
        Ok(form)
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Why an analyze request failed. Callers show one generic message; the
/// variant is for logs.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Connection refused, DNS, timeout, or other send failure.
    #[error("request failed: {0}")]
    Request(String),
    /// The service answered with a non-2xx status.
    #[error("service returned HTTP {0}")]
    Status(u16),
    /// The response body was not a valid result.
    #[error("invalid response body: {0}")]
    Decode(String),
    /// Every attempt failed; `last` is the final failure.
    #[error("gave up after {attempts} attempts: {last}")]
    Exhausted {
        attempts: u32,
        last: Box<TransportError>,
    },
}

impl TransportError {
    /// Whether another attempt may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Request(_) => true,
            Self::Status(code) => *code >= 500,
            Self::Decode(_) | Self::Exhausted { .. } => false,
        }
    }

    /// Number of attempts behind this error.
    pub fn attempts(&self) -> u32 {
        match self {
            Self::Exhausted { attempts, .. } => *attempts,
            _ => 1,
        }
    }
}

// ---------------------------------------------------------------------------
// Transport seam
// ---------------------------------------------------------------------------

/// Sends analyze requests. [`HttpClient`] is the real implementation;
/// tests substitute fakes.
pub trait Transport {
    fn analyze(&self, request: &AnalyzeRequest) -> Result<AnalysisResult, TransportError>;

    /// Whether the service is reachable. Fakes report healthy.
    fn is_healthy(&self) -> bool {
        true
    }
}

impl<T: Transport + ?Sized> Transport for &T {
    fn analyze(&self, request: &AnalyzeRequest) -> Result<AnalysisResult, TransportError> {
        (**self).analyze(request)
    }

    fn is_healthy(&self) -> bool {
        (**self).is_healthy()
    }
}

// ---------------------------------------------------------------------------
// Retry policy
// ---------------------------------------------------------------------------

/// Extra attempts and the base delay between them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub retries: u32,
    pub backoff: Duration,
}

impl RetryPolicy {
    pub fn none() -> Self {
        Self {
            retries: 0,
            backoff: Duration::ZERO,
        }
    }

    /// Delay before retry number `retry` (1-based): `backoff * 2^(retry-1)`.
    pub fn delay_for(&self, retry: u32) -> Duration {
        let factor = 1u32.checked_shl(retry.saturating_sub(1)).unwrap_or(u32::MAX);
        self.backoff.saturating_mul(factor)
    }
}

/// Run `attempt` under `policy`, sleeping between retryable failures.
pub fn with_retries<T>(
    policy: &RetryPolicy,
    mut attempt: impl FnMut() -> Result<T, TransportError>,
) -> Result<T, TransportError> {
    let mut tries = 0;
    loop {
        tries += 1;
        match attempt() {
            Ok(value) => return Ok(value),
            Err(e) if e.is_retryable() && tries <= policy.retries => {
                std::thread::sleep(policy.delay_for(tries));
            }
            Err(e) if tries > 1 => {
                return Err(TransportError::Exhausted {
                    attempts: tries,
                    last: Box::new(e),
                });
            }
            Err(e) => return Err(e),
        }
    }
}

// ---------------------------------------------------------------------------
// HTTP client
// ---------------------------------------------------------------------------

/// Synchronous multipart client for the analyze endpoint.
#[derive(Debug, Clone)]
pub struct HttpClient {
    url: String,
    timeout: Duration,
    retry: RetryPolicy,
    http: reqwest::blocking::Client,
}

impl HttpClient {
    /// Build a client from the resolved `[endpoint]` config.
    pub fn from_config(config: &EndpointConfig) -> Result<Self> {
        let timeout = Duration::from_millis(config.timeout_ms);
        let http = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self {
            url: config.url.trim().to_string(),
            timeout,
            retry: RetryPolicy {
                retries: config.retries,
                backoff: Duration::from_millis(config.backoff_ms),
            },
            http,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    fn send_once(&self, request: &AnalyzeRequest) -> Result<AnalysisResult, TransportError> {
        let form = request.to_form()?;
        let resp = self
            .http
            .post(&self.url)
            .multipart(form)
            .send()
            .map_err(|e| TransportError::Request(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(TransportError::Status(status.as_u16()));
        }

        resp.json::<AnalysisResult>()
            .map_err(|e| TransportError::Decode(e.to_string()))
    }
}

impl Transport for HttpClient {
    fn analyze(&self, request: &AnalyzeRequest) -> Result<AnalysisResult, TransportError> {
        with_retries(&self.retry, || self.send_once(request))
    }

    /// Check whether the service answers on its root path.
    ///
    /// Uses a short timeout (5 s) so `mailsort health` never stalls.
    fn is_healthy(&self) -> bool {
        let Some(root) = origin_url(&self.url) else {
            return false;
        };

        self.http
            .get(root)
            .timeout(Duration::from_secs(5))
            .send()
            .map(|resp| resp.status().is_success())
            .unwrap_or(false)
    }
}

/// Scheme + host + port of `url` with a `/` path.
fn origin_url(url: &str) -> Option<String> {
    let mut parsed = reqwest::Url::parse(url).ok()?;
    parsed.set_path("/");
    parsed.set_query(None);
    parsed.set_fragment(None);
    Some(parsed.to_string())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;

    #[test]
    fn client_from_default_config() {
        let client = HttpClient::from_config(&EndpointConfig::default()).unwrap();
        assert_eq!(client.url(), "http://127.0.0.1:8000/analyze");
        assert_eq!(client.timeout(), Duration::from_secs(30));
        assert_eq!(client.retry_policy().retries, 0);
    }

    #[test]
    fn origin_url_strips_path_and_query() {
        assert_eq!(
            origin_url("http://127.0.0.1:8000/analyze?x=1").as_deref(),
            Some("http://127.0.0.1:8000/")
        );
        assert_eq!(origin_url("not a url"), None);
    }

    #[test]
    fn mime_type_from_extension() {
        assert_eq!(Attachment::new("a.PDF", vec![]).mime_type(), "application/pdf");
        assert_eq!(Attachment::new("a.txt", vec![]).mime_type(), "text/plain");
        assert_eq!(Attachment::new("a.eml", vec![]).mime_type(), "message/rfc822");
        assert_eq!(
            Attachment::new("a.docx", vec![]).mime_type(),
            "application/octet-stream"
        );
    }

    #[test]
    fn part_names_follow_present_fields() {
        let request = AnalyzeRequest {
            file: None,
            email_text: Some("oi".to_string()),
            extra_context: Some("cliente".to_string()),
        };
        assert_eq!(request.part_names(), vec!["email_text", "extra_context"]);
        assert!(AnalyzeRequest::default().part_names().is_empty());
    }

    #[test]
    fn retryable_classification() {
        assert!(TransportError::Request("refused".into()).is_retryable());
        assert!(TransportError::Status(503).is_retryable());
        assert!(!TransportError::Status(404).is_retryable());
        assert!(!TransportError::Decode("eof".into()).is_retryable());
    }

    #[test]
    fn backoff_doubles() {
        let policy = RetryPolicy {
            retries: 3,
            backoff: Duration::from_millis(100),
        };
        assert_eq!(policy.delay_for(1), Duration::from_millis(100));
        assert_eq!(policy.delay_for(2), Duration::from_millis(200));
        assert_eq!(policy.delay_for(3), Duration::from_millis(400));
    }

    #[test]
    fn no_retries_means_single_attempt() {
        let calls = Cell::new(0);
        let result: Result<(), _> = with_retries(&RetryPolicy::none(), || {
            calls.set(calls.get() + 1);
            Err(TransportError::Status(502))
        });
        assert_eq!(calls.get(), 1);
        assert!(matches!(result, Err(TransportError::Status(502))));
    }

    #[test]
    fn retries_until_success() {
        let calls = Cell::new(0);
        let policy = RetryPolicy {
            retries: 3,
            backoff: Duration::ZERO,
        };
        let result = with_retries(&policy, || {
            calls.set(calls.get() + 1);
            if calls.get() < 3 {
                Err(TransportError::Request("refused".into()))
            } else {
                Ok(calls.get())
            }
        });
        assert_eq!(result.unwrap(), 3);
    }

    #[test]
    fn exhausted_reports_attempts() {
        let policy = RetryPolicy {
            retries: 2,
            backoff: Duration::ZERO,
        };
        let err = with_retries::<()>(&policy, || Err(TransportError::Status(500))).unwrap_err();
        assert_eq!(err.attempts(), 3);
        assert!(matches!(err, TransportError::Exhausted { .. }));
    }

    #[test]
    fn client_errors_are_not_retried() {
        let calls = Cell::new(0);
        let policy = RetryPolicy {
            retries: 5,
            backoff: Duration::ZERO,
        };
        let err = with_retries::<()>(&policy, || {
            calls.set(calls.get() + 1);
            Err(TransportError::Status(422))
        })
        .unwrap_err();
        assert_eq!(calls.get(), 1);
        assert_eq!(err.attempts(), 1);
    }
}
