//! Subprocess invocation.

use std::path::Path;
use std::process::Stdio;

use tokio::process::Command;
use tracing::debug;

use crate::error::{ExecutorError, ExecutorResult};

/// One CLI call: program, arguments, working directory, and at most one
/// injected environment variable.
pub(crate) struct CliInvocation<'a> {
    pub program: &'a str,
    pub args: Vec<String>,
    pub cwd: &'a Path,
    pub env: Option<(&'static str, &'a str)>,
}

/// Run the invocation to completion and return its combined output.
///
/// Stdin is closed. Stdout comes first, stderr after it; the result is
/// trimmed. No timeout is applied.
pub(crate) async fn run_cli(invocation: CliInvocation<'_>) -> ExecutorResult<String> {
    let mut cmd = Command::new(invocation.program);
    cmd.args(&invocation.args)
        .current_dir(invocation.cwd)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    if let Some((key, value)) = invocation.env {
        cmd.env(key, value);
    }

    debug!(
        "Running {} in {} ({} args)",
        invocation.program,
        invocation.cwd.display(),
        invocation.args.len()
    );

    let output = cmd.output().await.map_err(|source| ExecutorError::Launch {
        program: invocation.program.to_string(),
        source,
    })?;

    let combined = combine_output(&output.stdout, &output.stderr);

    if !output.status.success() {
        return Err(ExecutorError::Exited {
            program: invocation.program.to_string(),
            code: output.status.code(),
            output: combined,
        });
    }

    debug!("{} finished ({} bytes of output)", invocation.program, combined.len());
    Ok(combined)
}

fn combine_output(stdout: &[u8], stderr: &[u8]) -> String {
    let mut combined = String::from_utf8_lossy(stdout).into_owned();
    combined.push_str(&String::from_utf8_lossy(stderr));
    combined.trim().to_string()
}

#[cfg(all(test, unix))]
pub(crate) mod test_support {
    use std::os::unix::fs::PermissionsExt;
    use std::path::{Path, PathBuf};

    /// Write an executable `sh` script into `dir` and return its path.
    ///
    /// Callers run under `#[serial]` so no other test forks while the file
    /// is open for writing (which would make exec fail with ETXTBSY).
    pub(crate) fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }
}
