//! Error types for CLI invocations.

use thiserror::Error;

/// Errors raised while running an AI CLI subprocess.
#[derive(Error, Debug)]
pub enum ExecutorError {
    /// The program could not be started (not found, not executable, bad cwd).
    #[error("failed to launch {program}: {source}")]
    Launch {
        /// Program that was being started.
        program: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The program ran but exited unsuccessfully.
    #[error("{program} exited with {}", exit_description(.code))]
    Exited {
        /// Program that exited.
        program: String,
        /// Exit code, `None` when killed by a signal.
        code: Option<i32>,
        /// Combined, trimmed stdout and stderr.
        output: String,
    },
}

fn exit_description(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit status {}", code),
        None => "no exit status (terminated by signal)".to_string(),
    }
}

impl ExecutorError {
    /// Text shown to the chat user for this failure.
    ///
    /// Captured output wins over the error description, since that is where
    /// the CLI explains what went wrong.
    pub fn user_detail(&self) -> String {
        match self {
            ExecutorError::Exited { output, .. } if !output.is_empty() => output.clone(),
            other => other.to_string(),
        }
    }
}

/// Result type for executor operations.
pub type ExecutorResult<T> = std::result::Result<T, ExecutorError>;
