//! Offline CLI handlers that never call an LLM.
//!
//! Implements:
//! - `swimplan prompt`  -- print the compiled generation instruction
//! - `swimplan check`   -- normalize and validate a plan JSON document
//! - `swimplan render`  -- print the canonical text form of a plan

use anyhow::{Result, bail};

use swimplan_core::pipeline::AttemptError;
use swimplan_core::plan::{
    NormalizeContext, Plan, ValidationContext, normalize, normalize_text, parse_draft,
    plan_to_text, validate,
};
use swimplan_core::prompt::{PromptInputs, SYSTEM_INSTRUCTION, compile_generation};
use swimplan_core::{Effort, PlannerInput, SessionRequested};

// -----------------------------------------------------------------------
// swimplan prompt
// -----------------------------------------------------------------------

/// Render the generation instruction, optionally preceded by the system line.
pub fn prompt_text(input: &PlannerInput, with_system: bool) -> String {
    let user = compile_generation(&PromptInputs::from_input(input));
    if with_system {
        format!("SYSTEM:\n{SYSTEM_INSTRUCTION}\n\nUSER:\n{user}")
    } else {
        user
    }
}

// -----------------------------------------------------------------------
// swimplan check
// -----------------------------------------------------------------------

/// Normalize and validate `plan_text` against `input`; return a summary line.
pub fn check_plan_text(plan_text: &str, input: &PlannerInput, seed: Option<u64>) -> Result<String> {
    if let Err(message) = input.check() {
        bail!("invalid planner input: {message}");
    }
    let plan = match normalize_text(plan_text, NormalizeContext { input, seed }) {
        Ok(plan) => plan,
        Err(e) => {
            let attempt = AttemptError::from_draft(&e, plan_text.to_string());
            bail!("[{}] {}", attempt.category.code(), attempt.message);
        }
    };
    let validated = match validate(plan, &ValidationContext::for_input(input)) {
        Ok(plan) => plan,
        Err(v) => bail!("[LLM_INVARIANT_VIOLATION] {v}"),
    };
    Ok(format!(
        "ok: {} min, {}m ({} main_set steps)",
        validated.duration_minutes,
        validated.estimated_distance_m,
        validated.sections.main_set.steps.len()
    ))
}

// -----------------------------------------------------------------------
// swimplan render
// -----------------------------------------------------------------------

/// Stand-in request for rendering a plan on its own.
fn request_for_draft(duration_minutes: Option<i64>) -> PlannerInput {
    PlannerInput {
        session_requested: SessionRequested {
            duration_minutes: duration_minutes
                .and_then(|d| u32::try_from(d).ok())
                .unwrap_or(0),
            effort: Effort::Medium,
            requested_tags: Vec::new(),
        },
        historic_sessions: Vec::new(),
        requested_tags: Vec::new(),
    }
}

/// Normalize `plan_text` and render it as text. Invariants are not checked.
pub fn render_plan_text(plan_text: &str, input: Option<&PlannerInput>) -> Result<String> {
    let draft = parse_draft(plan_text)?;
    let fallback;
    let input = match input {
        Some(input) => input,
        None => {
            fallback = request_for_draft(draft.duration_minutes);
            &fallback
        }
    };
    let plan: Plan = normalize(draft, NormalizeContext { input, seed: Some(0) })?;
    Ok(plan_to_text(&plan))
}
