//! Per-message decision logic shared by every chat adapter.

use std::sync::Arc;

use relay_executor::Executor;
use tracing::{debug, info, warn};

use crate::chunker::deliver;
use crate::commands::{Command, CommandStyle};
use crate::session::Session;
use crate::transport::{ChatTransport, InboundMessage, TextFormat};

/// Acknowledgement for `/reset`.
pub const RESET_MESSAGE: &str = "🔄 Session reset. Starting fresh conversation.";

/// `/status` reply when no conversation is active.
pub const NO_SESSION_MESSAGE: &str = "ℹ️ No active session. Next message will start a new one.";

/// Indicator shown while the daily briefing runs.
pub const START_DAY_MESSAGE: &str =
    "🌅 Starting your day... Reading context and reviewing tasks...";

/// Indicator shown while a prompt runs.
pub const PROCESSING_MESSAGE: &str = "🧠 Processing...";

/// What [`Router::handle`] did with a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Sender is not the allowed user; nothing was sent.
    Unauthorized,
    /// Empty text; nothing was sent.
    Ignored,
    /// `/reset` handled.
    Reset,
    /// `/status` handled.
    Status,
    /// `/start` briefing ran.
    Started,
    /// Text was forwarded to the executor.
    Prompted,
}

/// Routes inbound messages for one chat platform.
pub struct Router<T> {
    transport: T,
    executor: Arc<dyn Executor>,
    allowed_sender: String,
    style: CommandStyle,
}

impl<T: ChatTransport> Router<T> {
    /// Create a router answering only `allowed_sender`.
    pub fn new(
        transport: T,
        executor: Arc<dyn Executor>,
        allowed_sender: impl Into<String>,
        style: CommandStyle,
    ) -> Self {
        Self {
            transport,
            executor,
            allowed_sender: allowed_sender.into(),
            style,
        }
    }

    /// Get the transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Get the executor.
    pub fn executor(&self) -> &Arc<dyn Executor> {
        &self.executor
    }

    /// Handle one message to completion.
    ///
    /// Executor calls are awaited here, so an adapter that awaits this
    /// method handles its messages strictly one at a time.
    pub async fn handle(&self, session: &mut Session, msg: InboundMessage) -> Disposition {
        let platform = self.transport.name();

        if msg.sender != self.allowed_sender {
            warn!("[{}] Unauthorized access attempt from user ID: {}", platform, msg.sender);
            return Disposition::Unauthorized;
        }

        if msg.text.is_empty() {
            return Disposition::Ignored;
        }

        info!("[{}] Received message from authorized user", platform);
        debug!("[{}] Message text: {}", platform, msg.text);

        match Command::parse(&msg.text, self.style) {
            Some(Command::Reset) => {
                session.reset();
                info!("[{}] Session reset", platform);
                self.notify(&msg.conversation, RESET_MESSAGE).await;
                Disposition::Reset
            }
            Some(Command::Status) => {
                let status = match session.id() {
                    Some(id) => format!("✅ Active session: {}", id),
                    None => NO_SESSION_MESSAGE.to_string(),
                };
                self.notify(&msg.conversation, &status).await;
                Disposition::Status
            }
            Some(Command::Start) => {
                session.reset();
                info!("[{}] Starting day with {}", platform, self.executor.name());
                let prompt = self.executor.start_prompt().to_string();
                self.run_prompt(session, &msg.conversation, &prompt, START_DAY_MESSAGE)
                    .await;
                Disposition::Started
            }
            None => {
                self.run_prompt(session, &msg.conversation, &msg.text, PROCESSING_MESSAGE)
                    .await;
                Disposition::Prompted
            }
        }
    }

    async fn run_prompt(
        &self,
        session: &mut Session,
        conversation: &str,
        prompt: &str,
        indicator: &str,
    ) {
        let platform = self.transport.name();
        let indicator_ref = self.notify(conversation, indicator).await;

        let execution = self.executor.execute(prompt, session.id()).await;

        if let Some(id) = execution.session_id.as_deref() {
            info!("[{}] Session ID: {}", platform, id);
        }
        session.advance(execution.session_id);

        if let Some(message_ref) = indicator_ref {
            if let Err(e) = self.transport.delete(conversation, &message_ref).await {
                warn!("[{}] Failed to delete message: {}", platform, e);
            }
        }

        deliver(&self.transport, conversation, &execution.response).await;
    }

    /// Send a short plain message, logging failures.
    async fn notify(&self, conversation: &str, text: &str) -> Option<String> {
        match self.transport.send(conversation, text, TextFormat::Plain).await {
            Ok(message_ref) => message_ref,
            Err(e) => {
                warn!("[{}] Failed to send message: {}", self.transport.name(), e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{RecordingTransport, SendMode, StubExecutor};
    use pretty_assertions::assert_eq;
    use relay_executor::START_PROMPT;

    const OWNER: &str = "42";

    fn router(
        transport: RecordingTransport,
        executor: &Arc<StubExecutor>,
        style: CommandStyle,
    ) -> Router<RecordingTransport> {
        let executor: Arc<dyn Executor> = executor.clone();
        Router::new(transport, executor, OWNER, style)
    }

    fn from_owner(text: &str) -> InboundMessage {
        InboundMessage::new(OWNER, "chat-1", text)
    }

    fn active_session(id: &str) -> Session {
        let mut session = Session::new();
        session.advance(Some(id.to_string()));
        session
    }

    #[tokio::test]
    async fn test_unauthorized_sender_is_dropped() {
        let executor = Arc::new(StubExecutor::new("R", Some("S")));
        let router = router(RecordingTransport::new(4096), &executor, CommandStyle::SlashOnly);
        let mut session = active_session("keep");

        for text in ["hello", "/reset", "/status", "/start"] {
            let msg = InboundMessage::new("7", "chat-1", text);
            assert_eq!(router.handle(&mut session, msg).await, Disposition::Unauthorized);
        }

        assert_eq!(router.transport().attempts(), 0);
        assert!(executor.calls().is_empty());
        assert_eq!(session.id(), Some("keep"));
    }

    #[tokio::test]
    async fn test_empty_text_is_ignored() {
        let executor = Arc::new(StubExecutor::new("R", Some("S")));
        let router = router(RecordingTransport::new(4096), &executor, CommandStyle::SlashOnly);
        let mut session = Session::new();

        assert_eq!(router.handle(&mut session, from_owner("")).await, Disposition::Ignored);
        assert_eq!(router.transport().attempts(), 0);
        assert!(executor.calls().is_empty());
    }

    #[tokio::test]
    async fn test_reset_clears_and_acknowledges() {
        let executor = Arc::new(StubExecutor::new("R", Some("S")));
        let router = router(RecordingTransport::new(4096), &executor, CommandStyle::SlashOnly);

        for mut session in [Session::new(), active_session("old")] {
            let disposition = router.handle(&mut session, from_owner("/reset")).await;
            assert_eq!(disposition, Disposition::Reset);
            assert_eq!(session.id(), None);
        }

        assert_eq!(router.transport().sent_texts(), vec![RESET_MESSAGE, RESET_MESSAGE]);
        assert!(executor.calls().is_empty());
    }

    #[tokio::test]
    async fn test_status_reports_without_mutating() {
        let executor = Arc::new(StubExecutor::new("R", Some("S")));
        let router = router(RecordingTransport::new(4096), &executor, CommandStyle::SlashOnly);

        let mut empty = Session::new();
        router.handle(&mut empty, from_owner("/status")).await;
        let mut active = active_session("abc-123");
        router.handle(&mut active, from_owner("/status")).await;

        assert_eq!(empty, Session::new());
        assert_eq!(active.id(), Some("abc-123"));
        assert_eq!(
            router.transport().sent_texts(),
            vec![NO_SESSION_MESSAGE, "✅ Active session: abc-123"]
        );
        assert!(executor.calls().is_empty());
    }

    #[tokio::test]
    async fn test_prompt_runs_with_session_and_delivers() {
        let executor = Arc::new(StubExecutor::new("the answer", Some("new-id")));
        let router = router(RecordingTransport::new(4096), &executor, CommandStyle::SlashOnly);
        let mut session = active_session("old-id");

        let disposition = router.handle(&mut session, from_owner("what's up?")).await;

        assert_eq!(disposition, Disposition::Prompted);
        assert_eq!(
            executor.calls(),
            vec![("what's up?".to_string(), Some("old-id".to_string()))]
        );
        assert_eq!(session.id(), Some("new-id"));
        assert_eq!(
            router.transport().sent(),
            vec![
                (
                    "chat-1".to_string(),
                    PROCESSING_MESSAGE.to_string(),
                    TextFormat::Plain
                ),
                (
                    "chat-1".to_string(),
                    "the answer".to_string(),
                    TextFormat::Markup
                ),
            ]
        );
        assert_eq!(
            router.transport().deleted(),
            vec![("chat-1".to_string(), "msg-1".to_string())]
        );
    }

    #[tokio::test]
    async fn test_prompt_without_new_session_keeps_old() {
        let executor = Arc::new(StubExecutor::new("❌ Error:\nboom", None));
        let router = router(RecordingTransport::new(4096), &executor, CommandStyle::SlashOnly);
        let mut session = active_session("old-id");

        router.handle(&mut session, from_owner("hi")).await;
        assert_eq!(session.id(), Some("old-id"));
    }

    #[tokio::test]
    async fn test_start_clears_session_and_runs_briefing() {
        let executor = Arc::new(StubExecutor::new("briefing", Some("day-1")));
        let router = router(RecordingTransport::new(4096), &executor, CommandStyle::SlashOnly);
        let mut session = active_session("old-id");

        let disposition = router.handle(&mut session, from_owner("/start")).await;

        assert_eq!(disposition, Disposition::Started);
        assert_eq!(executor.calls(), vec![(START_PROMPT.to_string(), None)]);
        assert_eq!(session.id(), Some("day-1"));
        assert_eq!(
            router.transport().sent_texts(),
            vec![START_DAY_MESSAGE, "briefing"]
        );
        assert_eq!(router.transport().deleted().len(), 1);
    }

    #[tokio::test]
    async fn test_bare_commands_depend_on_style() {
        let executor = Arc::new(StubExecutor::new("R", Some("S")));

        let slack = router(RecordingTransport::new(3000), &executor, CommandStyle::SlashOrBare);
        let mut session = active_session("old");
        assert_eq!(slack.handle(&mut session, from_owner("reset")).await, Disposition::Reset);
        assert_eq!(session.id(), None);

        let telegram = router(RecordingTransport::new(4096), &executor, CommandStyle::SlashOnly);
        let mut session = Session::new();
        assert_eq!(
            telegram.handle(&mut session, from_owner("reset")).await,
            Disposition::Prompted
        );
        assert_eq!(executor.calls(), vec![("reset".to_string(), None)]);
    }

    #[tokio::test]
    async fn test_indicator_failures_are_not_fatal() {
        let executor = Arc::new(StubExecutor::new("answer", Some("S")));
        let transport = RecordingTransport::new(4096).with_mode(SendMode::RejectContaining("🧠"));
        let router = router(transport, &executor, CommandStyle::SlashOnly);
        let mut session = Session::new();

        router.handle(&mut session, from_owner("hi")).await;

        assert_eq!(router.transport().sent_texts(), vec!["answer"]);
        assert!(router.transport().deleted().is_empty());
        assert_eq!(session.id(), Some("S"));
    }

    #[tokio::test]
    async fn test_delete_skipped_without_message_ref() {
        let executor = Arc::new(StubExecutor::new("answer", None));
        let transport = RecordingTransport::new(4096).without_message_refs();
        let router = router(transport, &executor, CommandStyle::SlashOnly);

        router.handle(&mut Session::new(), from_owner("hi")).await;

        assert!(router.transport().deleted().is_empty());
        assert_eq!(router.transport().sent_texts(), vec![PROCESSING_MESSAGE, "answer"]);
    }

    #[tokio::test]
    async fn test_delete_failure_still_delivers() {
        let executor = Arc::new(StubExecutor::new("answer", None));
        let transport = RecordingTransport::new(4096).rejecting_deletes();
        let router = router(transport, &executor, CommandStyle::SlashOnly);

        router.handle(&mut Session::new(), from_owner("hi")).await;

        assert_eq!(router.transport().sent_texts(), vec![PROCESSING_MESSAGE, "answer"]);
    }

    #[tokio::test]
    async fn test_reply_failure_does_not_touch_session() {
        let executor = Arc::new(StubExecutor::new("R", Some("S")));
        let transport = RecordingTransport::new(4096).with_mode(SendMode::RejectAll);
        let router = router(transport, &executor, CommandStyle::SlashOnly);
        let mut session = active_session("old");

        assert_eq!(router.handle(&mut session, from_owner("/reset")).await, Disposition::Reset);
        assert_eq!(session.id(), None);
    }

    #[tokio::test]
    async fn test_long_response_is_chunked() {
        let response = format!("{}\n{}", "a".repeat(3000), "b".repeat(2000));
        let executor = Arc::new(StubExecutor::new(&response, None));
        let router = router(RecordingTransport::new(3000), &executor, CommandStyle::SlashOrBare);

        router.handle(&mut Session::new(), from_owner("long please")).await;

        let texts = router.transport().sent_texts();
        assert_eq!(texts.len(), 3);
        assert_eq!(texts[1], "a".repeat(3000));
        assert_eq!(texts[2], format!("\n{}", "b".repeat(2000)));
    }
}
