//! Executor configuration.

use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};

/// Settings shared by every executor backend.
///
/// Built once at startup and never mutated afterwards.
#[derive(Clone)]
pub struct ExecutorConfig {
    /// Backend credential. Empty for OAuth-based logins.
    api_key: SecretString,
    /// Directory the backend may read and write; also the working directory.
    vault_path: PathBuf,
    /// Model identifier passed to the CLI.
    model: String,
    /// Program to run instead of the backend's default binary name.
    program: Option<String>,
}

impl std::fmt::Debug for ExecutorConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutorConfig")
            .field(
                "api_key",
                &if self.has_api_key() {
                    "[REDACTED]"
                } else {
                    "[EMPTY]"
                },
            )
            .field("vault_path", &self.vault_path)
            .field("model", &self.model)
            .field("program", &self.program)
            .finish()
    }
}

impl ExecutorConfig {
    /// Create a new configuration.
    pub fn new(
        api_key: impl Into<String>,
        vault_path: impl Into<PathBuf>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            api_key: SecretString::new(api_key.into().into()),
            vault_path: vault_path.into(),
            model: model.into(),
            program: None,
        }
    }

    /// Override the program that gets executed.
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = Some(program.into());
        self
    }

    /// Get the credential.
    pub fn api_key(&self) -> &str {
        self.api_key.expose_secret()
    }

    /// Check whether a credential was provided.
    pub fn has_api_key(&self) -> bool {
        !self.api_key.expose_secret().is_empty()
    }

    /// Get the vault directory.
    pub fn vault_path(&self) -> &Path {
        &self.vault_path
    }

    /// Get the model identifier.
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Get the program override, if any.
    pub fn program(&self) -> Option<&str> {
        self.program.as_deref()
    }

    pub(crate) fn program_or<'a>(&'a self, default: &'a str) -> &'a str {
        self.program.as_deref().unwrap_or(default)
    }
}
