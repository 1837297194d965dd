//! External-process client: `claude -p --output-format json`.
//!
//! The system instruction goes on the command line, the user instruction on
//! stdin, and the final `result` object is read from stdout.

use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

use super::{LlmClient, LlmError, strip_markdown_fences};

/// Client that shells out to the Claude Code CLI.
#[derive(Debug, Clone)]
pub struct ClaudeCliClient {
    /// Path to the `claude` binary. Defaults to `"claude"` (found via `$PATH`).
    binary: String,
    /// Passed as `--model` when set.
    model: Option<String>,
}

impl ClaudeCliClient {
    /// Create a client that will look for `claude` on `$PATH`.
    pub fn new() -> Self {
        Self {
            binary: "claude".to_string(),
            model: None,
        }
    }

    /// Create a client with a custom binary path.
    pub fn with_binary(path: impl Into<String>) -> Self {
        Self {
            binary: path.into(),
            model: None,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    fn command(&self, system: &str) -> Command {
        let mut cmd = Command::new(&self.binary);
        cmd.arg("-p")
            .arg("--output-format")
            .arg("json")
            .arg("--system-prompt")
            .arg(system);
        if let Some(model) = &self.model {
            cmd.arg("--model").arg(model);
        }
        cmd.stdin(Stdio::piped());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());
        cmd.kill_on_drop(true);
        cmd
    }
}

impl Default for ClaudeCliClient {
    fn default() -> Self {
        Self::new()
    }
}

/// Pull the reply text out of the CLI's single `result` JSON object.
///
/// Output that is not the expected envelope is taken as the reply itself.
fn parse_cli_output(stdout: &str) -> Result<String, LlmError> {
    let Ok(v) = serde_json::from_str::<serde_json::Value>(stdout.trim()) else {
        return Ok(strip_markdown_fences(stdout).to_string());
    };
    if v.get("type").and_then(|t| t.as_str()) != Some("result") {
        return Ok(strip_markdown_fences(stdout).to_string());
    }

    if v.get("is_error").and_then(|e| e.as_bool()).unwrap_or(false) {
        let message = v
            .get("result")
            .and_then(|r| r.as_str())
            .or_else(|| v.get("subtype").and_then(|s| s.as_str()))
            .unwrap_or("unknown error");
        return Err(LlmError::Transport(format!("claude reported an error: {message}")));
    }

    if let Some(usage) = v.get("usage") {
        let input_tokens = usage.get("input_tokens").and_then(|v| v.as_u64()).unwrap_or(0);
        let output_tokens = usage.get("output_tokens").and_then(|v| v.as_u64()).unwrap_or(0);
        debug!(input_tokens, output_tokens, "claude cli call finished");
    }

    let text = v.get("result").and_then(|r| r.as_str()).unwrap_or("");
    Ok(strip_markdown_fences(text).to_string())
}

#[async_trait]
impl LlmClient for ClaudeCliClient {
    fn name(&self) -> &str {
        "claude-cli"
    }

    async fn complete(&self, system: &str, user: &str) -> Result<String, LlmError> {
        let mut child = self.command(system).spawn().map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                LlmError::RuntimeUnavailable(format!(
                    "claude binary '{}' not found -- is it installed and on PATH?",
                    self.binary
                ))
            } else {
                LlmError::Transport(format!("failed to spawn '{}': {e}", self.binary))
            }
        })?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(user.as_bytes())
                .await
                .map_err(|e| LlmError::Transport(format!("failed to write prompt: {e}")))?;
            // Dropping stdin closes it so the CLI sees EOF.
        }

        let output = child
            .wait_with_output()
            .await
            .map_err(|e| LlmError::Transport(format!("failed to read claude output: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(LlmError::Transport(format!(
                "claude exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let text = parse_cli_output(&stdout)?;
        if text.is_empty() {
            return Err(LlmError::EmptyResponse);
        }
        Ok(text)
    }
}
