//! LLM collaborator interface and its two realizations.
//!
//! ```text
//! Planner
//!     |
//!     v
//! Arc<dyn LlmClient> --complete(system, user)--> raw text | LlmError
//!     |
//!     +-- AnthropicClient   (in-process HTTPS call)
//!     +-- ClaudeCliClient   (external `claude -p` process)
//! ```
//!
//! Both realizations strip a surrounding markdown code fence before handing
//! text back, so the normalizer only ever sees the JSON candidate.

pub mod anthropic;
pub mod claude_cli;
pub mod trait_def;

use thiserror::Error;

pub use anthropic::AnthropicClient;
pub use claude_cli::ClaudeCliClient;
pub use trait_def::LlmClient;

/// Failures raised by an [`LlmClient`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LlmError {
    #[error("{0} is missing")]
    MissingCredentials(String),

    #[error("LLM transport failed: {0}")]
    Transport(String),

    #[error("LLM runtime unavailable: {0}")]
    RuntimeUnavailable(String),

    #[error("Model returned empty response")]
    EmptyResponse,
}

/// Remove a ```` ```json ... ``` ```` (or bare ```` ``` ````) wrapper.
pub fn strip_markdown_fences(text: &str) -> &str {
    let stripped = text.trim();
    let Some(rest) = stripped.strip_prefix("```") else {
        return stripped;
    };
    // Drop the opening fence line, language tag included.
    let Some(newline) = rest.find('\n') else {
        return stripped;
    };
    let body = &rest[newline + 1..];
    let body = match body.rfind("```") {
        Some(end) if body[end..].trim() == "```" => &body[..end],
        _ => body,
    };
    body.trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_json_fence() {
        let text = "```json\n{\"a\": 1}\n```";
        assert_eq!(strip_markdown_fences(text), "{\"a\": 1}");
    }

    #[test]
    fn strips_bare_fence_with_padding() {
        let text = "  \n```\n{\"a\": 1}\n```\n ";
        assert_eq!(strip_markdown_fences(text), "{\"a\": 1}");
    }

    #[test]
    fn leaves_plain_json_alone() {
        assert_eq!(strip_markdown_fences(" {\"a\": 1} "), "{\"a\": 1}");
    }

    #[test]
    fn unterminated_fence_keeps_body() {
        assert_eq!(strip_markdown_fences("```json\n{\"a\": 1}"), "{\"a\": 1}");
    }

    #[test]
    fn missing_credentials_names_the_variable() {
        let err = LlmError::MissingCredentials("ANTHROPIC_API_KEY".to_string());
        assert_eq!(err.to_string(), "ANTHROPIC_API_KEY is missing");
    }
}
