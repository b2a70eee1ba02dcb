//! Startup configuration read from the environment.

use std::path::PathBuf;

use relay_executor::{ExecutorConfig, ExecutorKind};
use relay_slack::SlackConfig;
use relay_telegram::TelegramConfig;
use thiserror::Error;
use tracing::warn;

/// Vault location inside the container image.
pub const DEFAULT_VAULT_PATH: &str = "/config/Obsidian Vault";

/// Model used when `CLAUDE_MODEL` is unset.
pub const DEFAULT_CLAUDE_MODEL: &str = "claude-haiku-4-5";

/// Model used when `GEMINI_MODEL` is unset; lets the CLI choose.
pub const DEFAULT_GEMINI_MODEL: &str = "auto";

/// Configuration errors. All of them stop the process at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("ANTHROPIC_API_KEY environment variable is required for Claude executor")]
    MissingApiKey,

    #[error("Invalid ALLOWED_TELEGRAM_USER_ID '{0}': expected a numeric user id")]
    InvalidTelegramUserId(String),

    #[error(
        "At least one platform must be configured. Set TELEGRAM_TOKEN + ALLOWED_TELEGRAM_USER_ID \
         for Telegram, or SLACK_APP_TOKEN + SLACK_BOT_TOKEN + ALLOWED_SLACK_USER_ID for Slack."
    )]
    NoPlatform,
}

/// Everything the binary needs to start.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Selected AI backend.
    pub executor: ExecutorKind,
    /// Backend settings.
    pub executor_config: ExecutorConfig,
    /// Telegram settings, when the platform is enabled.
    pub telegram: Option<TelegramConfig>,
    /// Slack settings, when the platform is enabled.
    pub slack: Option<SlackConfig>,
}

impl AppConfig {
    /// Load from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load using `lookup` to read variables. Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|v| !v.is_empty());

        let executor = match get("AI_EXECUTOR") {
            None => ExecutorKind::default(),
            Some(value) => value.parse().unwrap_or_else(|e| {
                warn!("{}, falling back to {}", e, ExecutorKind::default());
                ExecutorKind::default()
            }),
        };

        let vault_path = get("VAULT_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_VAULT_PATH));

        let executor_config = match executor {
            ExecutorKind::Claude => {
                let api_key = get("ANTHROPIC_API_KEY").ok_or(ConfigError::MissingApiKey)?;
                let model = get("CLAUDE_MODEL").unwrap_or_else(|| DEFAULT_CLAUDE_MODEL.to_string());
                with_program(
                    ExecutorConfig::new(api_key, vault_path, model),
                    get("CLAUDE_BIN"),
                )
            }
            ExecutorKind::Gemini => {
                // Optional: the CLI can fall back to its own OAuth login
                let api_key = get("GEMINI_API_KEY").unwrap_or_default();
                let model = get("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string());
                with_program(
                    ExecutorConfig::new(api_key, vault_path, model),
                    get("GEMINI_BIN"),
                )
            }
        };

        let telegram = match (get("TELEGRAM_TOKEN"), get("ALLOWED_TELEGRAM_USER_ID")) {
            (Some(token), Some(user_id)) => {
                let user_id: i64 = user_id
                    .trim()
                    .parse()
                    .map_err(|_| ConfigError::InvalidTelegramUserId(user_id.clone()))?;
                let mut config = TelegramConfig::new(token, user_id);
                if let Some(api_base) = get("TELEGRAM_API_BASE") {
                    config = config.with_api_base(api_base);
                }
                Some(config)
            }
            (None, None) => None,
            _ => {
                warn!(
                    "Telegram is partially configured; set both TELEGRAM_TOKEN and ALLOWED_TELEGRAM_USER_ID to enable it"
                );
                None
            }
        };

        let slack = match (
            get("SLACK_APP_TOKEN"),
            get("SLACK_BOT_TOKEN"),
            get("ALLOWED_SLACK_USER_ID"),
        ) {
            (Some(app_token), Some(bot_token), Some(user_id)) => {
                Some(SlackConfig::new(bot_token, app_token, user_id))
            }
            (None, None, None) => None,
            _ => {
                warn!(
                    "Slack is partially configured; set SLACK_APP_TOKEN, SLACK_BOT_TOKEN and ALLOWED_SLACK_USER_ID to enable it"
                );
                None
            }
        };

        if telegram.is_none() && slack.is_none() {
            return Err(ConfigError::NoPlatform);
        }

        Ok(Self {
            executor,
            executor_config,
            telegram,
            slack,
        })
    }
}

fn with_program(config: ExecutorConfig, program: Option<String>) -> ExecutorConfig {
    match program {
        Some(program) => config.with_program(program),
        None => config,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;
    use std::path::Path;

    fn load(vars: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let env: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| env.get(key).cloned())
    }

    const TELEGRAM: [(&str, &str); 2] = [
        ("TELEGRAM_TOKEN", "123:abc"),
        ("ALLOWED_TELEGRAM_USER_ID", "42"),
    ];

    #[test]
    fn test_claude_defaults() {
        let config = load(&[TELEGRAM[0], TELEGRAM[1], ("ANTHROPIC_API_KEY", "sk-ant")]).unwrap();

        assert_eq!(config.executor, ExecutorKind::Claude);
        assert_eq!(config.executor_config.api_key(), "sk-ant");
        assert_eq!(config.executor_config.model(), DEFAULT_CLAUDE_MODEL);
        assert_eq!(
            config.executor_config.vault_path(),
            Path::new(DEFAULT_VAULT_PATH)
        );
        assert_eq!(config.executor_config.program(), None);

        let telegram = config.telegram.unwrap();
        assert_eq!(telegram.allowed_user_id(), 42);
        assert_eq!(telegram.token(), "123:abc");
        assert!(config.slack.is_none());
    }

    #[test]
    fn test_claude_requires_api_key() {
        let err = load(&TELEGRAM).unwrap_err();
        assert!(matches!(err, ConfigError::MissingApiKey));

        let err = load(&[TELEGRAM[0], TELEGRAM[1], ("ANTHROPIC_API_KEY", "")]).unwrap_err();
        assert!(matches!(err, ConfigError::MissingApiKey));
    }

    #[test]
    fn test_gemini_without_api_key() {
        let config = load(&[
            TELEGRAM[0],
            TELEGRAM[1],
            ("AI_EXECUTOR", "Gemini"),
            ("VAULT_PATH", "/vault"),
            ("GEMINI_BIN", "/usr/local/bin/gemini"),
        ])
        .unwrap();

        assert_eq!(config.executor, ExecutorKind::Gemini);
        assert!(!config.executor_config.has_api_key());
        assert_eq!(config.executor_config.model(), DEFAULT_GEMINI_MODEL);
        assert_eq!(config.executor_config.vault_path(), Path::new("/vault"));
        assert_eq!(
            config.executor_config.program(),
            Some("/usr/local/bin/gemini")
        );
    }

    #[test]
    fn test_unknown_executor_falls_back_to_claude() {
        let config = load(&[
            TELEGRAM[0],
            TELEGRAM[1],
            ("AI_EXECUTOR", "gpt"),
            ("ANTHROPIC_API_KEY", "sk-ant"),
            ("CLAUDE_MODEL", "claude-sonnet-4-5"),
        ])
        .unwrap();

        assert_eq!(config.executor, ExecutorKind::Claude);
        assert_eq!(config.executor_config.model(), "claude-sonnet-4-5");
    }

    #[test]
    fn test_no_platform() {
        let err = load(&[("ANTHROPIC_API_KEY", "sk-ant")]).unwrap_err();
        assert!(matches!(err, ConfigError::NoPlatform));
    }

    #[test]
    fn test_partial_platform_is_skipped() {
        let err = load(&[
            ("ANTHROPIC_API_KEY", "sk-ant"),
            ("TELEGRAM_TOKEN", "123:abc"),
            ("SLACK_APP_TOKEN", "xapp-1"),
            ("SLACK_BOT_TOKEN", "xoxb-1"),
        ])
        .unwrap_err();
        assert!(matches!(err, ConfigError::NoPlatform));
    }

    #[test]
    fn test_slack_only() {
        let config = load(&[
            ("ANTHROPIC_API_KEY", "sk-ant"),
            ("SLACK_APP_TOKEN", "xapp-1"),
            ("SLACK_BOT_TOKEN", "xoxb-1"),
            ("ALLOWED_SLACK_USER_ID", "U123"),
        ])
        .unwrap();

        assert!(config.telegram.is_none());
        let slack = config.slack.unwrap();
        assert_eq!(slack.app_token(), "xapp-1");
        assert_eq!(slack.bot_token(), "xoxb-1");
        assert_eq!(slack.allowed_user_id(), "U123");
    }

    #[test]
    fn test_invalid_telegram_user_id() {
        let err = load(&[
            ("ANTHROPIC_API_KEY", "sk-ant"),
            ("TELEGRAM_TOKEN", "123:abc"),
            ("ALLOWED_TELEGRAM_USER_ID", "not-a-number"),
        ])
        .unwrap_err();

        assert!(matches!(err, ConfigError::InvalidTelegramUserId(ref id) if id == "not-a-number"));
    }

    #[test]
    fn test_telegram_api_base_override() {
        let config = load(&[
            TELEGRAM[0],
            TELEGRAM[1],
            ("ANTHROPIC_API_KEY", "sk-ant"),
            ("TELEGRAM_API_BASE", "http://localhost:8081/"),
        ])
        .unwrap();

        assert_eq!(
            config.telegram.unwrap().api_base(),
            "http://localhost:8081"
        );
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let config = load(&[TELEGRAM[0], TELEGRAM[1], ("ANTHROPIC_API_KEY", "sk-ant-secret")])
            .unwrap();
        let debug = format!("{:?}", config);
        assert!(!debug.contains("sk-ant-secret"));
        assert!(!debug.contains("123:abc"));
    }
}
