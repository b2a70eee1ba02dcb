//! Claude CLI backend.
//!
//! Runs `claude -p ... --output-format json` and reads a single JSON object
//! carrying `session_id` and `result`.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::config::ExecutorConfig;
use crate::executor::{DONE_MARKER, Execution, Executor};
use crate::process::{CliInvocation, run_cli};

/// Binary run when no program override is configured.
const DEFAULT_PROGRAM: &str = "claude";

/// Environment variable carrying the credential.
const API_KEY_ENV: &str = "ANTHROPIC_API_KEY";

/// JSON document printed by `claude --output-format json`.
#[derive(Debug, Deserialize)]
struct ClaudeOutput {
    #[serde(default)]
    session_id: String,
    #[serde(default)]
    result: String,
}

/// Executor backed by the Claude CLI.
#[derive(Debug, Clone)]
pub struct ClaudeExecutor {
    config: ExecutorConfig,
}

impl ClaudeExecutor {
    /// Create a new Claude executor.
    pub fn new(config: ExecutorConfig) -> Self {
        Self { config }
    }

    fn build_args(&self, prompt: &str, session_id: Option<&str>) -> Vec<String> {
        let mut args = vec![
            "-p".to_string(),
            prompt.to_string(),
            "--dangerously-skip-permissions".to_string(),
            "--add-dir".to_string(),
            self.config.vault_path().to_string_lossy().into_owned(),
            "--output-format".to_string(),
            "json".to_string(),
            "--model".to_string(),
            self.config.model().to_string(),
        ];

        if let Some(id) = session_id.filter(|id| !id.is_empty()) {
            args.push("--resume".to_string());
            args.push(id.to_string());
        }

        args
    }
}

/// Parse the CLI's JSON output.
///
/// Anything that is not a JSON object is returned verbatim: the CLI prints
/// plain-text diagnostics on some failures.
fn parse_output(raw: &str) -> Execution {
    match serde_json::from_str::<ClaudeOutput>(raw) {
        Ok(output) => {
            let response = if output.result.is_empty() {
                DONE_MARKER.to_string()
            } else {
                output.result
            };
            Execution::new(response, Some(output.session_id))
        }
        Err(e) => {
            warn!("Failed to parse Claude JSON response: {}", e);
            if raw.is_empty() {
                Execution::new(DONE_MARKER, None)
            } else {
                Execution::new(raw, None)
            }
        }
    }
}

#[async_trait]
impl Executor for ClaudeExecutor {
    async fn execute(&self, prompt: &str, session_id: Option<&str>) -> Execution {
        let invocation = CliInvocation {
            program: self.config.program_or(DEFAULT_PROGRAM),
            args: self.build_args(prompt, session_id),
            cwd: self.config.vault_path(),
            env: Some((API_KEY_ENV, self.config.api_key())),
        };

        match run_cli(invocation).await {
            Ok(raw) => {
                let execution = parse_output(&raw);
                debug!(
                    "Claude returned {} bytes, session {:?}",
                    execution.response.len(),
                    execution.session_id
                );
                execution
            }
            Err(e) => {
                warn!("Claude invocation failed: {}", e);
                Execution::failed(&e.user_detail())
            }
        }
    }

    fn name(&self) -> &str {
        "Claude"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn executor() -> ClaudeExecutor {
        ClaudeExecutor::new(ExecutorConfig::new(
            "sk-test",
            "/config/Obsidian Vault",
            "claude-haiku-4-5",
        ))
    }

    #[test]
    fn test_build_args_new_session() {
        let args = executor().build_args("hello", None);
        assert_eq!(
            args,
            vec![
                "-p",
                "hello",
                "--dangerously-skip-permissions",
                "--add-dir",
                "/config/Obsidian Vault",
                "--output-format",
                "json",
                "--model",
                "claude-haiku-4-5",
            ]
        );
    }

    #[test]
    fn test_build_args_resume() {
        let args = executor().build_args("hello", Some("sess-1"));
        assert_eq!(&args[args.len() - 2..], ["--resume", "sess-1"]);

        let args = executor().build_args("hello", Some(""));
        assert!(!args.contains(&"--resume".to_string()));
    }

    #[test]
    fn test_parse_output_result_and_session() {
        let execution = parse_output(r#"{"session_id":"S","result":"R"}"#);
        assert_eq!(execution, Execution::new("R", Some("S".to_string())));
    }

    #[test]
    fn test_parse_output_empty_result() {
        let execution = parse_output(r#"{"session_id":"","result":""}"#);
        assert_eq!(execution.response, DONE_MARKER);
        assert_eq!(execution.session_id, None);
    }

    #[test]
    fn test_parse_output_ignores_extra_fields() {
        let execution = parse_output(
            r#"{"type":"result","is_error":false,"session_id":"abc","result":"Done","total_cost_usd":0.01}"#,
        );
        assert_eq!(execution.response, "Done");
        assert_eq!(execution.session_id.as_deref(), Some("abc"));
    }

    #[test]
    fn test_parse_output_plain_text() {
        let execution = parse_output("Credit balance is too low");
        assert_eq!(execution.response, "Credit balance is too low");
        assert_eq!(execution.session_id, None);
    }

    #[test]
    fn test_parse_output_empty() {
        assert_eq!(parse_output("").response, DONE_MARKER);
    }

    #[cfg(unix)]
    mod unix {
        use super::*;
        use crate::process::test_support::write_script;
        use serial_test::serial;

        fn script_executor(dir: &std::path::Path, body: &str) -> ClaudeExecutor {
            let script = write_script(dir, "claude.sh", body);
            ClaudeExecutor::new(
                ExecutorConfig::new("sk-from-config", dir, "claude-haiku-4-5")
                    .with_program(script.to_string_lossy()),
            )
        }

        #[tokio::test]
        #[serial]
        async fn test_execute_success() {
            let dir = tempfile::tempdir().unwrap();
            let executor = script_executor(
                dir.path(),
                r#"printf '{"session_id":"new-session","result":"%s"}' "$ANTHROPIC_API_KEY""#,
            );

            let execution = executor.execute("hi", None).await;
            assert_eq!(execution.response, "sk-from-config");
            assert_eq!(execution.session_id.as_deref(), Some("new-session"));
        }

        #[tokio::test]
        #[serial]
        async fn test_execute_passes_resume() {
            let dir = tempfile::tempdir().unwrap();
            let executor = script_executor(
                dir.path(),
                r#"while [ "$#" -gt 0 ]; do
  if [ "$1" = "--resume" ]; then printf '{"session_id":"%s","result":"resumed"}' "$2"; exit 0; fi
  shift
done
printf '{"session_id":"fresh","result":"new"}'"#,
            );

            let execution = executor.execute("hi", Some("old-session")).await;
            assert_eq!(execution.response, "resumed");
            assert_eq!(execution.session_id.as_deref(), Some("old-session"));

            let execution = executor.execute("hi", None).await;
            assert_eq!(execution.response, "new");
        }

        #[tokio::test]
        #[serial]
        async fn test_execute_nonzero_exit() {
            let dir = tempfile::tempdir().unwrap();
            let executor = script_executor(dir.path(), "echo boom; exit 1");

            let execution = executor.execute("hi", Some("keep-me")).await;
            assert_eq!(execution.response, "❌ Error:\nboom");
            assert_eq!(execution.session_id, None);
        }
    }
}
