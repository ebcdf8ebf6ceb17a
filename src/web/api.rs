//! JSON API handlers for the web dashboard.
//!
//! Each handler corresponds to an API endpoint and returns a response with
//! JSON content.

use anyhow::{Context, Result};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};
use tiny_http::{Response, StatusCode};

use crate::analysis::AnalysisResult;
use crate::analysis::card::CardView;
use crate::client::{Attachment, Transport};
use crate::events::{Event, Outcome};
use crate::stats;
use crate::storage::Storage;
use crate::submit::SubmitError;

use super::{Dashboard, HttpResponse, content_type_json, error_response};

// ---------------------------------------------------------------------------
// JSON request / response types
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct HistoryResponse<'a> {
    entries: &'a [AnalysisResult],
    cards: Vec<CardView>,
}

/// Body of `POST /api/analyze`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct AnalyzeBody {
    email_text: String,
    extra_context: String,
    file: Option<UploadedFile>,
}

/// File picked in the dashboard, base64 encoded by the browser.
#[derive(Debug, Deserialize)]
struct UploadedFile {
    name: String,
    content_base64: String,
}

impl UploadedFile {
    fn into_attachment(self) -> Option<Attachment> {
        let bytes = STANDARD.decode(self.content_base64.trim()).ok()?;
        Some(Attachment::new(self.name, bytes))
    }
}

#[derive(Serialize)]
struct AnalyzeResponse {
    result: AnalysisResult,
    card: CardView,
}

#[derive(Serialize)]
struct HealthResponse {
    endpoint: String,
    service_available: bool,
    history_entries: usize,
    log_path: Option<String>,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Build a JSON response with the given status.
fn json_response<T: Serialize>(status: u16, data: &T) -> Result<HttpResponse> {
    let body = serde_json::to_string(data).context("failed to serialize JSON response")?;
    Ok(Response::from_data(body.into_bytes())
        .with_header(content_type_json())
        .with_status_code(StatusCode(status)))
}

/// Whether `?expand=1` (or `true`) is present.
fn parse_expand_param(url: &str) -> bool {
    url.split('?')
        .nth(1)
        .map(|query| {
            query.split('&').any(|pair| {
                matches!(pair.split_once('='), Some(("expand", "1" | "true")))
            })
        })
        .unwrap_or(false)
}

// ---------------------------------------------------------------------------
// API Handlers
// ---------------------------------------------------------------------------

/// `GET /api/history?expand=1`: entries plus rendered cards.
pub fn get_history<S: Storage, T: Transport>(
    dash: &Dashboard<S, T>,
    url: &str,
) -> Result<HttpResponse> {
    let expanded = parse_expand_param(url);
    let entries = dash.history.current();
    let resp = HistoryResponse {
        entries,
        cards: entries
            .iter()
            .map(|e| CardView::build(e, &dash.card_options, expanded))
            .collect(),
    };
    json_response(200, &resp)
}

/// `DELETE /api/history`: clear history and remove the stored key.
pub fn delete_history<S: Storage, T: Transport>(dash: &mut Dashboard<S, T>) -> Result<HttpResponse> {
    dash.history.clear()?;
    dash.log.record(&Event::new(Outcome::HistoryCleared));
    json_response(200, &serde_json::json!({ "success": true }))
}

/// `GET /api/stats`: summary, weekday histogram, insight.
pub fn get_stats<S: Storage, T: Transport>(dash: &Dashboard<S, T>) -> Result<HttpResponse> {
    json_response(200, &stats::build_report(dash.history.current()))
}

/// `POST /api/analyze`: run one submission through the dashboard's form.
///
/// Expects JSON body:
/// `{ "email_text": "...", "extra_context": "...", "file": { "name": "...", "content_base64": "..." } }`
/// where every field is optional. The form keeps its values after a failure
/// and is reset after a success.
pub fn post_analyze<S: Storage, T: Transport>(
    dash: &mut Dashboard<S, T>,
    body: &str,
) -> Result<HttpResponse> {
    let Ok(body) = serde_json::from_str::<AnalyzeBody>(body) else {
        return Ok(error_response(400, "invalid JSON in analyze request"));
    };
    let file = match body.file.map(UploadedFile::into_attachment) {
        Some(None) => return Ok(error_response(400, "uploaded file is not valid base64")),
        Some(attachment) => attachment,
        None => None,
    };

    dash.submission.set_file(file);
    dash.submission.set_text(body.email_text);
    dash.submission.set_context(body.extra_context);

    match dash
        .submission
        .submit(&dash.transport, &mut dash.history, &dash.log)
    {
        Ok(result) => {
            let card = CardView::build(&result, &dash.card_options, false);
            json_response(200, &AnalyzeResponse { result, card })
        }
        Err(e @ SubmitError::MissingInput) => Ok(error_response(400, &e.to_string())),
        Err(e @ SubmitError::Busy) => Ok(error_response(409, &e.to_string())),
        Err(e @ SubmitError::RequestFailed) => Ok(error_response(502, &e.to_string())),
        Err(SubmitError::Persist { result }) => json_response(
            500,
            &serde_json::json!({
                "error": crate::submit::PERSIST_FAILED_MESSAGE,
                "result": result,
            }),
        ),
    }
}

/// `GET /api/health`: endpoint reachability and local state.
pub fn get_health<S: Storage, T: Transport>(dash: &Dashboard<S, T>) -> Result<HttpResponse> {
    let resp = HealthResponse {
        endpoint: dash.endpoint_url.clone(),
        service_available: dash.transport.is_healthy(),
        history_entries: dash.history.len(),
        log_path: dash.log.path().map(|p| p.display().to_string()),
    };
    json_response(200, &resp)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
