//! Gemini CLI backend.
//!
//! Runs `gemini -p ... --output-format stream-json` and folds the emitted
//! event stream into one chat response. Assistant messages seen before the
//! final result are kept and shown as a "thinking" section above it.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::config::ExecutorConfig;
use crate::executor::{DONE_MARKER, Execution, Executor};
use crate::process::{CliInvocation, run_cli};

const DEFAULT_PROGRAM: &str = "gemini";
const API_KEY_ENV: &str = "GEMINI_API_KEY";

/// Model value that means "let the CLI choose".
const AUTO_MODEL: &str = "auto";

const THINKING_HEADING: &str = "🧠 *Thinking:*\n";
const RESPONSE_HEADING: &str = "📋 *Response:*\n";
const SECTION_DIVIDER: &str = "\n---\n\n";

/// One line of `--output-format stream-json`.
#[derive(Debug, Deserialize)]
struct StreamEvent {
    #[serde(rename = "type", default)]
    event_type: String,
    #[serde(default)]
    session_id: Option<String>,
    #[serde(default)]
    role: Option<String>,
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    response: Option<String>,
    /// Either a plain string or an object with a `message` field.
    #[serde(default)]
    error: Option<serde_json::Value>,
    #[serde(default)]
    message: Option<String>,
}

impl StreamEvent {
    fn error_message(&self) -> Option<String> {
        let from_error = match &self.error {
            Some(serde_json::Value::String(s)) => Some(s.clone()),
            Some(serde_json::Value::Object(map)) => map
                .get("message")
                .and_then(|m| m.as_str())
                .map(|s| s.to_string()),
            _ => None,
        };

        from_error
            .filter(|s| !s.is_empty())
            .or_else(|| self.message.clone().filter(|s| !s.is_empty()))
    }
}

/// Executor backed by the Gemini CLI.
#[derive(Debug, Clone)]
pub struct GeminiExecutor {
    config: ExecutorConfig,
}

impl GeminiExecutor {
    /// Create a new Gemini executor.
    pub fn new(config: ExecutorConfig) -> Self {
        Self { config }
    }

    fn build_args(&self, prompt: &str, session_id: Option<&str>) -> Vec<String> {
        let mut args = vec![
            "-p".to_string(),
            prompt.to_string(),
            "--yolo".to_string(),
            "--include-directories".to_string(),
            self.config.vault_path().to_string_lossy().into_owned(),
            "--output-format".to_string(),
            "stream-json".to_string(),
        ];

        let model = self.config.model();
        if !model.is_empty() && model != AUTO_MODEL {
            args.push("-m".to_string());
            args.push(model.to_string());
        }

        if let Some(id) = session_id.filter(|id| !id.is_empty()) {
            args.push("--resume".to_string());
            args.push(id.to_string());
        }

        args
    }
}

/// Fold newline-delimited JSON events into a response.
fn parse_stream_output(output: &str) -> Execution {
    let mut session_id: Option<String> = None;
    let mut thinking: Vec<String> = Vec::new();
    let mut final_result: Option<String> = None;

    for line in output.lines().map(str::trim) {
        // The CLI mixes status lines ("YOLO mode is enabled...") into stdout.
        if !line.starts_with('{') {
            continue;
        }

        let event: StreamEvent = match serde_json::from_str(line) {
            Ok(event) => event,
            Err(e) => {
                warn!("Failed to parse Gemini JSON event: {}", e);
                continue;
            }
        };

        match event.event_type.as_str() {
            "init" => {
                session_id = event.session_id;
            }
            "message" => {
                if event.role.as_deref() == Some("assistant") {
                    if let Some(content) = event.content.filter(|c| !c.is_empty()) {
                        thinking.push(content);
                    }
                }
            }
            "result" => {
                if let Some(response) = event.response.filter(|r| !r.is_empty()) {
                    final_result = Some(response);
                }
            }
            "error" => {
                if let Some(message) = event.error_message() {
                    return Execution::new(format!("❌ Error: {}", message), session_id);
                }
            }
            other => {
                debug!("Skipping Gemini event type: {}", other);
            }
        }
    }

    Execution::new(compose_response(&thinking, final_result), session_id)
}

fn compose_response(thinking: &[String], final_result: Option<String>) -> String {
    let mut result = String::new();

    if !thinking.is_empty() {
        result.push_str(THINKING_HEADING);
        for step in thinking {
            result.push_str("• ");
            result.push_str(step);
            result.push('\n');
        }
        result.push_str(SECTION_DIVIDER);
    }

    match final_result.as_deref().or(thinking.last().map(String::as_str)) {
        Some(response) => {
            result.push_str(RESPONSE_HEADING);
            result.push_str(response);
        }
        None => result.push_str(DONE_MARKER),
    }

    result
}

#[async_trait]
impl Executor for GeminiExecutor {
    async fn execute(&self, prompt: &str, session_id: Option<&str>) -> Execution {
        // Without a key the CLI falls back to its own OAuth login.
        let env = if self.config.has_api_key() {
            Some((API_KEY_ENV, self.config.api_key()))
        } else {
            None
        };

        let invocation = CliInvocation {
            program: self.config.program_or(DEFAULT_PROGRAM),
            args: self.build_args(prompt, session_id),
            cwd: self.config.vault_path(),
            env,
        };

        match run_cli(invocation).await {
            Ok(raw) => parse_stream_output(&raw),
            Err(e) => {
                warn!("Gemini invocation failed: {}", e);
                Execution::failed(&e.user_detail())
            }
        }
    }

    fn name(&self) -> &str {
        "Gemini"
    }
}
