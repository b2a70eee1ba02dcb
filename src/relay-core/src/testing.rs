//! Test doubles for the transport and executor seams.

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use relay_executor::{Execution, Executor};

use crate::transport::{ChatTransport, TextFormat, TransportError, TransportResult};

/// Which sends a [`RecordingTransport`] refuses.
#[derive(Debug, Clone, Copy)]
pub(crate) enum SendMode {
    AcceptAll,
    RejectAll,
    RejectMarkup,
    RejectLongerThan(usize),
    RejectContaining(&'static str),
}

/// Transport that records what would have been posted.
pub(crate) struct RecordingTransport {
    max_len: usize,
    mode: SendMode,
    message_refs: bool,
    reject_deletes: bool,
    attempts: AtomicUsize,
    sent: Mutex<Vec<(String, String, TextFormat)>>,
    deleted: Mutex<Vec<(String, String)>>,
}

impl RecordingTransport {
    pub(crate) fn new(max_len: usize) -> Self {
        Self {
            max_len,
            mode: SendMode::AcceptAll,
            message_refs: true,
            reject_deletes: false,
            attempts: AtomicUsize::new(0),
            sent: Mutex::new(Vec::new()),
            deleted: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn with_mode(mut self, mode: SendMode) -> Self {
        self.mode = mode;
        self
    }

    pub(crate) fn without_message_refs(mut self) -> Self {
        self.message_refs = false;
        self
    }

    pub(crate) fn rejecting_deletes(mut self) -> Self {
        self.reject_deletes = true;
        self
    }

    /// Successful sends as (conversation, text, format).
    pub(crate) fn sent(&self) -> Vec<(String, String, TextFormat)> {
        self.sent.lock().unwrap().clone()
    }

    /// Texts of successful sends.
    pub(crate) fn sent_texts(&self) -> Vec<String> {
        self.sent().into_iter().map(|(_, text, _)| text).collect()
    }

    /// Successful deletes as (conversation, message ref).
    pub(crate) fn deleted(&self) -> Vec<(String, String)> {
        self.deleted.lock().unwrap().clone()
    }

    /// Every send call, successful or not.
    pub(crate) fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    fn rejects(&self, text: &str, format: TextFormat) -> bool {
        match self.mode {
            SendMode::AcceptAll => false,
            SendMode::RejectAll => true,
            SendMode::RejectMarkup => format == TextFormat::Markup,
            SendMode::RejectLongerThan(limit) => text.len() > limit,
            SendMode::RejectContaining(needle) => text.contains(needle),
        }
    }
}

#[async_trait]
impl ChatTransport for RecordingTransport {
    async fn send(
        &self,
        conversation: &str,
        text: &str,
        format: TextFormat,
    ) -> TransportResult<Option<String>> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if self.rejects(text, format) {
            return Err(TransportError::Rejected("rejected".to_string()));
        }

        let mut sent = self.sent.lock().unwrap();
        sent.push((conversation.to_string(), text.to_string(), format));
        Ok(self.message_refs.then(|| format!("msg-{}", sent.len())))
    }

    async fn delete(&self, conversation: &str, message_ref: &str) -> TransportResult<()> {
        if self.reject_deletes {
            return Err(TransportError::Network("connection reset".to_string()));
        }
        self.deleted
            .lock()
            .unwrap()
            .push((conversation.to_string(), message_ref.to_string()));
        Ok(())
    }

    fn max_message_len(&self) -> usize {
        self.max_len
    }

    fn name(&self) -> &str {
        "Test"
    }
}

/// Executor that answers from a script and records its calls.
pub(crate) struct StubExecutor {
    response: String,
    session_id: Option<String>,
    calls: Mutex<Vec<(String, Option<String>)>>,
}

impl StubExecutor {
    pub(crate) fn new(response: &str, session_id: Option<&str>) -> Self {
        Self {
            response: response.to_string(),
            session_id: session_id.map(str::to_string),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Calls as (prompt, session id).
    pub(crate) fn calls(&self) -> Vec<(String, Option<String>)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Executor for StubExecutor {
    async fn execute(&self, prompt: &str, session_id: Option<&str>) -> Execution {
        self.calls
            .lock()
            .unwrap()
            .push((prompt.to_string(), session_id.map(str::to_string)));
        Execution::new(self.response.clone(), self.session_id.clone())
    }

    fn name(&self) -> &str {
        "Stub"
    }
}
