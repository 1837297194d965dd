//! Structured failure values returned by the planner.

use std::fmt;

use thiserror::Error;

use crate::llm::LlmError;
use crate::plan::DraftError;

/// Why one attempt failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureCategory {
    MissingCredentials,
    Transport,
    RuntimeUnavailable,
    EmptyResponse,
    /// The reply was not exactly one JSON object.
    Parse,
    /// The object lacked usable sections or had mistyped fields.
    Structural,
    /// A plan was built but broke an invariant.
    Invariant,
}

impl FailureCategory {
    /// Stable code for callers that map failures to responses.
    pub fn code(self) -> &'static str {
        match self {
            Self::MissingCredentials => "LLM_MISSING_API_KEY",
            Self::Transport => "LLM_CONNECTION_ERROR",
            Self::RuntimeUnavailable => "LLM_RUNTIME_UNAVAILABLE",
            Self::EmptyResponse => "LLM_EMPTY_RESPONSE",
            Self::Parse => "LLM_INVALID_OUTPUT",
            Self::Structural => "LLM_INVALID_STRUCTURE",
            Self::Invariant => "LLM_INVARIANT_VIOLATION",
        }
    }

    /// The failure came from the LLM collaborator rather than its output.
    pub fn is_collaborator(self) -> bool {
        matches!(
            self,
            Self::MissingCredentials | Self::Transport | Self::RuntimeUnavailable | Self::EmptyResponse
        )
    }
}

impl fmt::Display for FailureCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// One failed attempt: its category, message, and the raw reply if any.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct AttemptError {
    pub category: FailureCategory,
    pub message: String,
    /// Raw model text, absent when the call itself failed.
    pub raw: Option<String>,
}

impl AttemptError {
    pub fn from_llm(err: &LlmError) -> Self {
        let category = match err {
            LlmError::MissingCredentials(_) => FailureCategory::MissingCredentials,
            LlmError::Transport(_) => FailureCategory::Transport,
            LlmError::RuntimeUnavailable(_) => FailureCategory::RuntimeUnavailable,
            LlmError::EmptyResponse => FailureCategory::EmptyResponse,
        };
        Self {
            category,
            message: err.to_string(),
            raw: None,
        }
    }

    pub fn from_draft(err: &DraftError, raw: String) -> Self {
        let category = match err {
            DraftError::Json(_) | DraftError::NotAnObject(_) => FailureCategory::Parse,
            DraftError::Structural(_) => FailureCategory::Structural,
            DraftError::Invariant(_) => FailureCategory::Invariant,
        };
        Self {
            category,
            message: err.to_string(),
            raw: Some(raw),
        }
    }
}

/// Both attempts failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error(
    "Plan generation failed after initial call and one repair attempt. Initial error: {initial}. Repair error: {repair}"
)]
pub struct GenerationFailure {
    pub initial: AttemptError,
    pub repair: AttemptError,
}

impl GenerationFailure {
    /// Category of the terminal (repair) failure.
    pub fn category(&self) -> FailureCategory {
        self.repair.category
    }
}

/// Errors returned by [`super::Planner::generate`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlannerError {
    /// The input could never produce a valid plan; no LLM call was made.
    #[error("invalid planner input: {0}")]
    InvalidInput(String),

    #[error(transparent)]
    Exhausted(#[from] GenerationFailure),
}
