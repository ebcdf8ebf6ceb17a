//! Embedded web dashboard for mailsort.
//!
//! Provides a lightweight HTTP server (sync, via `tiny_http`) that serves:
//! - A single-page UI: submission form, result cards, statistics
//! - JSON API endpoints for history, stats, analysis, and health
//!
//! Launched via `mailsort web` (default: `http://127.0.0.1:5173`).
//!
//! Requests are handled one at a time on the calling thread, and the
//! [`Dashboard`] owns the history store and the submission form, so no
//! locking is involved. The history is reloaded before every request since
//! the CLI may write the same storage directory while the server runs.

mod api;
mod frontend;

use std::io::{Cursor, Read};

use anyhow::{Context, Result};
use tiny_http::{Header, Method, Response, Server, StatusCode};

use crate::analysis::card::CardOptions;
use crate::client::{HttpClient, Transport};
use crate::config::MailsortConfig;
use crate::events::EventLog;
use crate::history::HistoryStore;
use crate::storage::{FileStorage, Storage};
use crate::submit::Submission;

pub(crate) type HttpResponse = Response<Cursor<Vec<u8>>>;

// ---------------------------------------------------------------------------
// Dashboard state
// ---------------------------------------------------------------------------

/// State owned by the server loop.
pub struct Dashboard<S: Storage, T: Transport> {
    pub history: HistoryStore<S>,
    /// Form state and in-flight gate shared by every analyze request.
    pub submission: Submission,
    pub transport: T,
    pub log: EventLog,
    pub card_options: CardOptions,
    /// Reported by `/api/health`.
    pub endpoint_url: String,
}

impl<S: Storage, T: Transport> Dashboard<S, T> {
    /// Dispatch a request to the appropriate handler.
    pub fn dispatch(&mut self, method: &Method, url: &str, body: Option<&str>) -> Result<HttpResponse> {
        self.history.reload();

        // Strip query string for path matching
        let path = url.split('?').next().unwrap_or(url);

        match (method, path) {
            // Frontend
            (&Method::Get, "/") | (&Method::Get, "/index.html") => Ok(serve_frontend()),

            // API
            (&Method::Get, "/api/history") => api::get_history(self, url),
            (&Method::Delete, "/api/history") => api::delete_history(self),
            (&Method::Get, "/api/stats") => api::get_stats(self),
            (&Method::Post, "/api/analyze") => api::post_analyze(self, body.unwrap_or("{}")),
            (&Method::Get, "/api/health") => api::get_health(self),

            // 404
            _ => Ok(not_found()),
        }
    }
}

// ---------------------------------------------------------------------------
// Server entry point
// ---------------------------------------------------------------------------

/// Start the dashboard on `addr` using the resolved config.
///
/// Blocks the current thread. Errors are handled per request without
/// stopping the server.
pub fn serve(config: &MailsortConfig, addr: &str) -> Result<()> {
    let storage_dir = crate::config::expand_home(&config.storage.dir)
        .context("could not resolve storage directory")?;
    let mut dashboard = Dashboard {
        history: HistoryStore::hydrate(FileStorage::new(storage_dir)),
        submission: Submission::default(),
        transport: HttpClient::from_config(&config.endpoint)?,
        log: EventLog::from_config(&config.logging),
        card_options: config.display.card_options(),
        endpoint_url: config.endpoint.url.clone(),
    };

    let server = Server::http(addr)
        .map_err(|e| anyhow::anyhow!("failed to start HTTP server on {addr}: {e}"))?;

    println!("mailsort dashboard running at http://{addr}");
    println!("Press Ctrl+C to stop.\n");

    if config.web.open_browser {
        let _ = open_browser(&format!("http://{addr}"));
    }

    for mut request in server.incoming_requests() {
        let method = request.method().clone();
        let url = request.url().to_string();

        let body = if matches!(method, Method::Put | Method::Post | Method::Patch) {
            let mut buf = String::new();
            let _ = request.as_reader().read_to_string(&mut buf);
            Some(buf)
        } else {
            None
        };

        let response = dashboard
            .dispatch(&method, &url, body.as_deref())
            .unwrap_or_else(|e| error_response(500, &format!("{e:#}")));
        let status = response.status_code().0;
        let _ = request.respond(response);

        // Brief access log
        println!(
            "{} {} {} {}",
            method,
            url,
            status,
            chrono::Local::now().format("%H:%M:%S")
        );
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Response helpers
// ---------------------------------------------------------------------------

/// Serve the embedded single-page frontend.
fn serve_frontend() -> HttpResponse {
    let html = frontend::INDEX_HTML;
    Response::from_data(html.as_bytes().to_vec())
        .with_header(content_type_html())
        .with_status_code(StatusCode(200))
}

/// 404 response.
fn not_found() -> HttpResponse {
    error_response(404, "not found")
}

/// JSON `{"error": ...}` response with the given status.
pub(crate) fn error_response(status: u16, message: &str) -> HttpResponse {
    let body = serde_json::json!({ "error": message }).to_string();
    Response::from_data(body.into_bytes())
        .with_header(content_type_json())
        .with_status_code(StatusCode(status))
}

/// JSON content type header.
pub(crate) fn content_type_json() -> Header {
    Header::from_bytes("Content-Type", "application/json; charset=utf-8")
        .expect("static header is valid")
}

/// HTML content type header.
fn content_type_html() -> Header {
    Header::from_bytes("Content-Type", "text/html; charset=utf-8")
        .expect("static header is valid")
}

/// Attempt to open a URL in the system default browser.
fn open_browser(url: &str) -> Result<()> {
    #[cfg(target_os = "windows")]
    {
        std::process::Command::new("cmd")
            .args(["/C", "start", url])
            .spawn()
            .context("failed to open browser")?;
    }

    #[cfg(target_os = "macos")]
    {
        std::process::Command::new("open")
            .arg(url)
            .spawn()
            .context("failed to open browser")?;
    }

    #[cfg(target_os = "linux")]
    {
        std::process::Command::new("xdg-open")
            .arg(url)
            .spawn()
            .context("failed to open browser")?;
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
