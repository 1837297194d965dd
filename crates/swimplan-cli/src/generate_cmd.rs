//! `swimplan generate`: run the pipeline and print one plan.

use anyhow::{Context, Result, bail};
use serde_json::{Value, json};

use swimplan_core::pipeline::AttemptError;
use swimplan_core::{PlannerError, PlannerInput};

use crate::config::SwimplanConfig;

/// Structured failure written to stderr so callers can branch on `code`.
pub fn failure_report(err: &PlannerError) -> Value {
    fn attempt(a: &AttemptError) -> Value {
        json!({"code": a.category.code(), "message": a.message})
    }
    match err {
        PlannerError::InvalidInput(message) => json!({
            "error": {"code": "INVALID_INPUT", "message": message}
        }),
        PlannerError::Exhausted(failure) => json!({
            "error": {
                "code": failure.category().code(),
                "message": failure.to_string(),
                "initial": attempt(&failure.initial),
                "repair": attempt(&failure.repair),
            }
        }),
    }
}

pub async fn run_generate(
    config: &SwimplanConfig,
    input: &PlannerInput,
    seed: Option<u64>,
    pretty: bool,
) -> Result<()> {
    let planner = config.planner();
    tracing::debug!(provider = config.provider.as_str(), model = ?config.model, "planner ready");

    match planner.generate(input, seed).await {
        Ok(plan) => {
            let out = if pretty {
                serde_json::to_string_pretty(&plan)
            } else {
                serde_json::to_string(&plan)
            }
            .context("failed to serialize plan")?;
            println!("{out}");
            Ok(())
        }
        Err(err) => {
            eprintln!("{}", failure_report(&err));
            match err {
                PlannerError::InvalidInput(message) => bail!("invalid planner input: {message}"),
                PlannerError::Exhausted(failure) => {
                    bail!("plan generation failed ({})", failure.category().code())
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use swimplan_core::pipeline::{FailureCategory, GenerationFailure};

    #[test]
    fn report_carries_both_attempt_codes() {
        let err = PlannerError::Exhausted(GenerationFailure {
            initial: AttemptError {
                category: FailureCategory::Parse,
                message: "output is not valid JSON: eof".to_string(),
                raw: Some("{".to_string()),
            },
            repair: AttemptError {
                category: FailureCategory::Invariant,
                message: "main_set: must contain at least one step".to_string(),
                raw: Some("{}".to_string()),
            },
        });
        let report = failure_report(&err);
        assert_eq!(report["error"]["code"], "LLM_INVARIANT_VIOLATION");
        assert_eq!(report["error"]["initial"]["code"], "LLM_INVALID_OUTPUT");
        assert_eq!(report["error"]["repair"]["message"], "main_set: must contain at least one step");
        assert!(report["error"]["initial"].get("raw").is_none());
    }

    #[test]
    fn invalid_input_report() {
        let report = failure_report(&PlannerError::InvalidInput("duration_minutes must be > 0".to_string()));
        assert_eq!(report["error"]["code"], "INVALID_INPUT");
    }
}
