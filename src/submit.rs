//! Submission workflow: form input → one analyze request → history.
//!
//! [`Submission`] owns the form state (file, text, context), the in-flight
//! gate, and the last user-facing error. A submit:
//!
//! 1. rejects when a request is already outstanding ([`SubmitError::Busy`]),
//! 2. validates that a file or non-blank text is present
//!    ([`SubmitError::MissingInput`], no network call),
//! 3. sends exactly one request through the [`Transport`],
//! 4. on success prepends the result to the [`HistoryStore`] and clears the
//!    form; on failure keeps the form and sets one generic message.
//!
//! Every outcome is recorded to the [`EventLog`].

use std::time::Instant;

use thiserror::Error;

use crate::analysis::AnalysisResult;
use crate::client::{AnalyzeRequest, Attachment, Transport};
use crate::events::{Event, EventLog, Outcome};
use crate::history::HistoryStore;
use crate::storage::Storage;

/// Shown when neither a file nor text was provided.
pub const MISSING_INPUT_MESSAGE: &str = "Please provide a file or paste the email text.";

/// Shown for every network or service failure.
pub const REQUEST_FAILED_MESSAGE: &str = "Failed to analyze the email. Please try again.";

/// Shown when the result arrived but could not be saved to history.
pub const PERSIST_FAILED_MESSAGE: &str =
    "The email was analyzed but the result could not be saved to history.";

/// Shown when a submit is attempted while one is outstanding.
pub const BUSY_MESSAGE: &str = "An analysis is already in progress.";

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Workflow-boundary failures. `Display` is the user-facing message.
#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("{}", MISSING_INPUT_MESSAGE)]
    MissingInput,
    #[error("{}", REQUEST_FAILED_MESSAGE)]
    RequestFailed,
    /// The result is returned so callers can still display it.
    #[error("{}", PERSIST_FAILED_MESSAGE)]
    Persist { result: Box<AnalysisResult> },
    #[error("{}", BUSY_MESSAGE)]
    Busy,
}

// ---------------------------------------------------------------------------
// Form state
// ---------------------------------------------------------------------------

/// The user's current input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubmissionForm {
    pub file: Option<Attachment>,
    pub text: String,
    pub context: String,
}

impl SubmissionForm {
    pub fn with_text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    /// A file is attached or the text is non-blank.
    pub fn has_input(&self) -> bool {
        self.file.is_some() || !self.text.trim().is_empty()
    }

    /// Build the request: trimmed text and context, blank parts omitted.
    pub fn to_request(&self) -> AnalyzeRequest {
        AnalyzeRequest {
            file: self.file.clone(),
            email_text: non_blank(&self.text),
            extra_context: non_blank(&self.context),
        }
    }

    /// Label of the inputs used, for the event log.
    fn source_label(&self) -> &'static str {
        match (self.file.is_some(), !self.text.trim().is_empty()) {
            (true, true) => "file+text",
            (true, false) => "file",
            _ => "text",
        }
    }

    fn reset(&mut self) {
        *self = Self::default();
    }
}

fn non_blank(s: &str) -> Option<String> {
    let trimmed = s.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

// ---------------------------------------------------------------------------
// Workflow
// ---------------------------------------------------------------------------

/// Submission component: form, in-flight gate, and last error.
#[derive(Debug, Default)]
pub struct Submission {
    pub form: SubmissionForm,
    in_flight: bool,
    error: Option<String>,
}

impl Submission {
    pub fn new(form: SubmissionForm) -> Self {
        Self {
            form,
            in_flight: false,
            error: None,
        }
    }

    /// Whether the submit control is enabled.
    pub fn can_submit(&self) -> bool {
        !self.in_flight && self.form.has_input()
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight
    }

    /// The message currently shown to the user, if any.
    pub fn error_message(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Replace the file selection. Clears any shown error.
    pub fn set_file(&mut self, file: Option<Attachment>) {
        self.form.file = file;
        self.error = None;
    }

    /// Replace the pasted text. Clears any shown error.
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.form.text = text.into();
        self.error = None;
    }

    pub fn set_context(&mut self, context: impl Into<String>) {
        self.form.context = context.into();
    }

    /// Run one submission. See the module docs for the sequence.
    pub fn submit<T, S>(
        &mut self,
        transport: &T,
        history: &mut HistoryStore<S>,
        log: &EventLog,
    ) -> Result<AnalysisResult, SubmitError>
    where
        T: Transport + ?Sized,
        S: Storage,
    {
        if self.in_flight {
            return Err(SubmitError::Busy);
        }

        if !self.form.has_input() {
            self.error = Some(MISSING_INPUT_MESSAGE.to_string());
            log.record(&Event::new(Outcome::MissingInput));
            return Err(SubmitError::MissingInput);
        }

        self.error = None;
        self.in_flight = true;
        let request = self.form.to_request();
        let source = self.form.source_label().to_string();
        let start = Instant::now();
        let response = transport.analyze(&request);
        let latency_ms = start.elapsed().as_millis() as u64;
        self.in_flight = false;

        let result = match response {
            Ok(result) => result,
            Err(e) => {
                self.error = Some(REQUEST_FAILED_MESSAGE.to_string());
                let mut event = Event::new(Outcome::RequestFailed);
                event.source = Some(source);
                event.detail = Some(e.to_string());
                event.latency_ms = Some(latency_ms);
                event.attempts = Some(e.attempts());
                log.record(&event);
                return Err(SubmitError::RequestFailed);
            }
        };

        let mut event = Event::new(Outcome::Success);
        event.source = Some(source);
        event.category = Some(result.category.wire_label().to_string());
        event.latency_ms = Some(latency_ms);

        if let Err(e) = history.prepend(result.clone()) {
            self.error = Some(PERSIST_FAILED_MESSAGE.to_string());
            event.outcome = Outcome::PersistFailed;
            event.detail = Some(format!("{e:#}"));
            log.record(&event);
            return Err(SubmitError::Persist {
                result: Box::new(result),
            });
        }

        log.record(&event);
        self.form.reset();
        Ok(result)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};

    use super::*;
    use crate::analysis::Category;
    use crate::client::TransportError;
    use crate::storage::MemoryStorage;

    /// Counts calls and replays a fixed response.
    struct FakeTransport {
        calls: Cell<usize>,
        last: RefCell<Option<AnalyzeRequest>>,
        fail_with: Option<u16>,
    }

    impl FakeTransport {
        fn ok() -> Self {
            Self {
                calls: Cell::new(0),
                last: RefCell::new(None),
                fail_with: None,
            }
        }

        fn failing(status: u16) -> Self {
            Self {
                fail_with: Some(status),
                ..Self::ok()
            }
        }
    }

    impl Transport for FakeTransport {
        fn analyze(&self, request: &AnalyzeRequest) -> Result<AnalysisResult, TransportError> {
            self.calls.set(self.calls.get() + 1);
            *self.last.borrow_mut() = Some(request.clone());
            match self.fail_with {
                Some(code) => Err(TransportError::Status(code)),
                None => Ok(AnalysisResult {
                    category: Category::Productive,
                    reason: Some("Pede retorno".to_string()),
                    suggestion: Some("Retorno em breve.".to_string()),
                    ..Default::default()
                }),
            }
        }
    }

    struct FullStorage;

    impl Storage for FullStorage {
        fn get(&self, _key: &str) -> anyhow::Result<Option<String>> {
            Ok(None)
        }
        fn set(&self, _key: &str, _value: &str) -> anyhow::Result<()> {
            anyhow::bail!("quota exceeded")
        }
        fn remove(&self, _key: &str) -> anyhow::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn blank_input_fails_without_network_call() {
        let transport = FakeTransport::ok();
        let storage = MemoryStorage::new();
        let mut history = HistoryStore::hydrate(&storage);
        let mut submission = Submission::new(SubmissionForm::with_text("   \n\t "));

        assert!(!submission.can_submit());
        let err = submission
            .submit(&transport, &mut history, &EventLog::disabled())
            .unwrap_err();

        assert!(matches!(err, SubmitError::MissingInput));
        assert_eq!(transport.calls.get(), 0);
        assert_eq!(submission.error_message(), Some(MISSING_INPUT_MESSAGE));
        assert!(history.is_empty());
    }

    #[test]
    fn failure_keeps_form_and_sets_generic_error() {
        let transport = FakeTransport::failing(500);
        let storage = MemoryStorage::new();
        let mut history = HistoryStore::hydrate(&storage);
        let mut submission = Submission::new(SubmissionForm {
            file: None,
            text: "Preciso do relatório".to_string(),
            context: "cliente VIP".to_string(),
        });

        let err = submission
            .submit(&transport, &mut history, &EventLog::disabled())
            .unwrap_err();

        assert!(matches!(err, SubmitError::RequestFailed));
        assert_eq!(err.to_string(), REQUEST_FAILED_MESSAGE);
        assert_eq!(transport.calls.get(), 1);
        assert_eq!(submission.form.text, "Preciso do relatório");
        assert_eq!(submission.form.context, "cliente VIP");
        assert_eq!(submission.error_message(), Some(REQUEST_FAILED_MESSAGE));
        assert!(!submission.is_in_flight());
        assert!(history.is_empty());
    }

    #[test]
    fn success_prepends_and_resets_form() {
        let transport = FakeTransport::ok();
        let storage = MemoryStorage::new();
        let mut history = HistoryStore::hydrate(&storage);
        let mut submission = Submission::new(SubmissionForm {
            file: Some(Attachment::new("pedido.txt", b"conteudo".to_vec())),
            text: "  Preciso do relatório  ".to_string(),
            context: "   ".to_string(),
        });

        let result = submission
            .submit(&transport, &mut history, &EventLog::disabled())
            .unwrap();

        assert_eq!(result.category, Category::Productive);
        assert_eq!(history.current(), &[result]);
        assert_eq!(submission.form, SubmissionForm::default());
        assert!(submission.error_message().is_none());

        let sent = transport.last.borrow().clone().unwrap();
        assert_eq!(sent.email_text.as_deref(), Some("Preciso do relatório"));
        assert_eq!(sent.extra_context, None);
        assert_eq!(sent.part_names(), vec!["file", "email_text"]);
    }

    #[test]
    fn file_alone_is_valid_input() {
        let mut form = SubmissionForm::default();
        assert!(!form.has_input());
        form.file = Some(Attachment::new("a.pdf", vec![1, 2, 3]));
        assert!(form.has_input());
        assert_eq!(form.to_request().email_text, None);
    }

    #[test]
    fn busy_submission_is_rejected() {
        let transport = FakeTransport::ok();
        let storage = MemoryStorage::new();
        let mut history = HistoryStore::hydrate(&storage);
        let mut submission = Submission::new(SubmissionForm::with_text("oi"));
        submission.in_flight = true;

        assert!(!submission.can_submit());
        let err = submission
            .submit(&transport, &mut history, &EventLog::disabled())
            .unwrap_err();
        assert!(matches!(err, SubmitError::Busy));
        assert_eq!(transport.calls.get(), 0);
    }

    #[test]
    fn gate_reopens_after_every_outcome() {
        let storage = MemoryStorage::new();
        let mut history = HistoryStore::hydrate(&storage);
        let log = EventLog::disabled();
        let mut submission = Submission::new(SubmissionForm::with_text("oi"));

        let failing = FakeTransport::failing(500);
        submission.submit(&failing, &mut history, &log).unwrap_err();
        assert!(!submission.is_in_flight());
        assert!(submission.can_submit());

        let ok = FakeTransport::ok();
        submission.submit(&ok, &mut history, &log).unwrap();
        assert!(!submission.is_in_flight());
        assert!(!submission.can_submit());

        submission.set_text("de novo");
        assert!(submission.can_submit());
        submission.submit(&ok, &mut history, &log).unwrap();
        assert_eq!(ok.calls.get(), 2);

        let mut full = HistoryStore::hydrate(FullStorage);
        submission.set_text("sem espaço");
        submission.submit(&ok, &mut full, &log).unwrap_err();
        assert!(!submission.is_in_flight());
        assert!(submission.can_submit());
    }

    #[test]
    fn persist_failure_is_surfaced_and_form_kept() {
        let transport = FakeTransport::ok();
        let mut history = HistoryStore::hydrate(FullStorage);
        let mut submission = Submission::new(SubmissionForm::with_text("Reunião amanhã?"));

        let err = submission
            .submit(&transport, &mut history, &EventLog::disabled())
            .unwrap_err();

        match err {
            SubmitError::Persist { result } => {
                assert_eq!(result.category, Category::Productive)
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(history.is_empty());
        assert_eq!(submission.form.text, "Reunião amanhã?");
        assert_eq!(submission.error_message(), Some(PERSIST_FAILED_MESSAGE));
    }

    #[test]
    fn editing_input_clears_error() {
        let mut submission = Submission::default();
        submission.error = Some(MISSING_INPUT_MESSAGE.to_string());
        submission.set_text("novo texto");
        assert!(submission.error_message().is_none());
        assert!(submission.can_submit());
    }

    #[test]
    fn outcomes_are_logged() {
        let dir = tempfile::tempdir().unwrap();
        let log = EventLog::at(dir.path().join("events.jsonl"));
        let storage = MemoryStorage::new();
        let mut history = HistoryStore::hydrate(&storage);

        let mut blank = Submission::default();
        let _ = blank.submit(&FakeTransport::ok(), &mut history, &log);

        let mut failing = Submission::new(SubmissionForm::with_text("x"));
        let _ = failing.submit(&FakeTransport::failing(404), &mut history, &log);

        let mut ok = Submission::new(SubmissionForm::with_text("x"));
        let _ = ok.submit(&FakeTransport::ok(), &mut history, &log);

        let outcomes: Vec<_> = log.read_all().into_iter().map(|e| e.outcome).collect();
        assert_eq!(
            outcomes,
            vec![Outcome::MissingInput, Outcome::RequestFailed, Outcome::Success]
        );
        let failed = &log.read_all()[1];
        assert_eq!(failed.detail.as_deref(), Some("service returned HTTP 404"));
        assert_eq!(failed.attempts, Some(1));
    }
}
