//! Loosely-typed plan draft as produced by the generator.
//!
//! Every aggregate the generator may claim (`estimated_distance_m`,
//! `section_distance_m`) is accepted here and then discarded by the
//! normalizer. Enum-valued fields stay strings until normalization so an
//! unknown value can be reported with its step scope.

use serde::Deserialize;
use thiserror::Error;

use super::validate::Violation;

/// Errors from turning generator text into a typed plan.
#[derive(Debug, Error)]
pub enum DraftError {
    #[error("output is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("output must be a single JSON object, got {0}")]
    NotAnObject(&'static str),

    #[error("unusable plan structure: {0}")]
    Structural(String),

    #[error(transparent)]
    Invariant(#[from] Violation),
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PlanDraft {
    #[serde(default)]
    pub plan_id: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub duration_minutes: Option<i64>,
    #[serde(default)]
    pub estimated_distance_m: Option<serde_json::Value>,
    #[serde(default)]
    pub sections: Option<SectionsDraft>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SectionsDraft {
    #[serde(default)]
    pub warm_up: Option<SectionDraft>,
    #[serde(default)]
    pub main_set: Option<SectionDraft>,
    #[serde(default)]
    pub cool_down: Option<SectionDraft>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SectionDraft {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub section_distance_m: Option<serde_json::Value>,
    #[serde(default)]
    pub steps: Vec<StepDraft>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StepDraft {
    #[serde(default)]
    pub step_id: Option<String>,
    pub kind: String,
    pub reps: i64,
    pub distance_per_rep_m: i64,
    pub stroke: String,
    #[serde(default)]
    pub rest_seconds: Option<i64>,
    pub effort: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub pyramid_sequence_m: Option<Vec<i64>>,
    #[serde(default)]
    pub hypoxic: Option<bool>,
    #[serde(default)]
    pub split_instruction: Option<String>,
}

/// Parse generator text as exactly one JSON object in draft shape.
pub fn parse_draft(text: &str) -> Result<PlanDraft, DraftError> {
    let value: serde_json::Value = serde_json::from_str(text.trim())?;
    let kind = match &value {
        serde_json::Value::Object(_) => None,
        serde_json::Value::Null => Some("null"),
        serde_json::Value::Bool(_) => Some("a boolean"),
        serde_json::Value::Number(_) => Some("a number"),
        serde_json::Value::String(_) => Some("a string"),
        serde_json::Value::Array(_) => Some("an array"),
    };
    if let Some(kind) = kind {
        return Err(DraftError::NotAnObject(kind));
    }
    serde_json::from_value(value).map_err(|e| DraftError::Structural(e.to_string()))
}
