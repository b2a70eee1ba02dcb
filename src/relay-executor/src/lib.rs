//! AI CLI executors for Vault Relay.
//!
//! An [`Executor`] turns a chat prompt plus an optional session id into a
//! single invocation of an external AI command-line tool and parses what the
//! tool printed. Two backends are provided:
//! - [`ClaudeExecutor`] - Claude CLI, one JSON object on stdout
//! - [`GeminiExecutor`] - Gemini CLI, newline-delimited JSON events
//!
//! Executors never return errors to their callers. Launch failures, non-zero
//! exits and unparseable output are all turned into a user-facing response so
//! the chat adapter can forward them as-is.
//!
//! # Example
//!
//! ```rust,ignore
//! use relay_executor::{ExecutorConfig, ExecutorKind, build_executor};
//!
//! let config = ExecutorConfig::new(api_key, "/config/Obsidian Vault", "claude-haiku-4-5");
//! let executor = build_executor(ExecutorKind::Claude, config);
//! let execution = executor.execute("What is on my list today?", None).await;
//! println!("{}", execution.response);
//! ```

mod claude;
mod config;
mod error;
mod executor;
mod gemini;
mod process;

pub use claude::ClaudeExecutor;
pub use config::ExecutorConfig;
pub use error::{ExecutorError, ExecutorResult};
pub use executor::{
    DONE_MARKER, Execution, Executor, ExecutorKind, START_PROMPT, build_executor, error_response,
};
pub use gemini::GeminiExecutor;
