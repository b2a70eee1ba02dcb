//! The executor contract and backend selection.

use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;

use crate::claude::ClaudeExecutor;
use crate::config::ExecutorConfig;
use crate::gemini::GeminiExecutor;

/// Response used when a backend finished without printing anything useful.
pub const DONE_MARKER: &str = "✅ Done (no output)";

/// Prompt sent by the `/start` command.
pub const START_PROMPT: &str = "Read the AGENT.md file to understand your role and the project context.

Then, help me start my day by:
1. Reviewing any tasks or to-do items in the vault
2. Checking for recent notes or updates
3. Suggesting what I should focus on today

Provide a concise daily briefing.";

/// Format a failure for display in chat.
pub fn error_response(detail: &str) -> String {
    format!("❌ Error:\n{}", detail)
}

/// Outcome of one CLI invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Execution {
    /// Text to send back to the user.
    pub response: String,
    /// Session id reported by the backend. `None` means "keep the current one".
    pub session_id: Option<String>,
}

impl Execution {
    /// Create an execution result. An empty session id is treated as absent.
    pub fn new(response: impl Into<String>, session_id: Option<String>) -> Self {
        Self {
            response: response.into(),
            session_id: session_id.filter(|id| !id.is_empty()),
        }
    }

    /// A failed invocation: error-formatted response, no session id.
    pub fn failed(detail: &str) -> Self {
        Self {
            response: error_response(detail),
            session_id: None,
        }
    }
}

/// An AI command-line backend.
///
/// Implementations must be cheap to share between chat adapters; they hold
/// only immutable configuration.
#[async_trait]
pub trait Executor: Send + Sync {
    /// Run the backend with `prompt`, resuming `session_id` when given.
    ///
    /// Never fails: problems are reported through [`Execution::response`].
    async fn execute(&self, prompt: &str, session_id: Option<&str>) -> Execution;

    /// Prompt used by the `/start` command.
    fn start_prompt(&self) -> &str {
        START_PROMPT
    }

    /// Display name, used in logs.
    fn name(&self) -> &str;
}

/// Available executor backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExecutorKind {
    /// Claude CLI.
    #[default]
    Claude,
    /// Gemini CLI.
    Gemini,
}

impl ExecutorKind {
    /// Lowercase identifier, as accepted by [`FromStr`].
    pub fn as_str(&self) -> &'static str {
        match self {
            ExecutorKind::Claude => "claude",
            ExecutorKind::Gemini => "gemini",
        }
    }
}

impl std::fmt::Display for ExecutorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExecutorKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "claude" => Ok(ExecutorKind::Claude),
            "gemini" => Ok(ExecutorKind::Gemini),
            other => Err(format!("unknown executor: {}", other)),
        }
    }
}

/// Construct the executor for `kind`.
pub fn build_executor(kind: ExecutorKind, config: ExecutorConfig) -> Arc<dyn Executor> {
    match kind {
        ExecutorKind::Claude => Arc::new(ClaudeExecutor::new(config)),
        ExecutorKind::Gemini => Arc::new(GeminiExecutor::new(config)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_execution_normalizes_empty_session() {
        let execution = Execution::new("hi", Some(String::new()));
        assert_eq!(execution.session_id, None);

        let execution = Execution::new("hi", Some("abc".to_string()));
        assert_eq!(execution.session_id.as_deref(), Some("abc"));
    }

    #[test]
    fn test_execution_failed() {
        let execution = Execution::failed("boom");
        assert_eq!(execution.response, "❌ Error:\nboom");
        assert!(execution.session_id.is_none());
    }

    #[test]
    fn test_executor_kind_from_str() {
        assert_eq!("claude".parse::<ExecutorKind>(), Ok(ExecutorKind::Claude));
        assert_eq!("Gemini".parse::<ExecutorKind>(), Ok(ExecutorKind::Gemini));
        assert_eq!(" GEMINI ".parse::<ExecutorKind>(), Ok(ExecutorKind::Gemini));
        assert!("codex".parse::<ExecutorKind>().is_err());
        assert_eq!(ExecutorKind::default(), ExecutorKind::Claude);
    }

    #[test]
    fn test_build_executor_names() {
        let config = ExecutorConfig::new("key", "/vault", "model");
        assert_eq!(
            build_executor(ExecutorKind::Claude, config.clone()).name(),
            "Claude"
        );
        assert_eq!(build_executor(ExecutorKind::Gemini, config).name(), "Gemini");
    }

    #[test]
    fn test_start_prompt_mentions_agent_file() {
        let executor = build_executor(
            ExecutorKind::Claude,
            ExecutorConfig::new("key", "/vault", "model"),
        );
        assert!(executor.start_prompt().contains("AGENT.md"));
    }
}
