//! The planner: request in, validated plan or terminal failure out.
//!
//! ```text
//! ATTEMPT 1: generation prompt -> LLM -> normalize -> validate --ok--> plan
//!                |                                        |
//!                +----------- any failure ----------------+
//!                                   v
//! ATTEMPT 2: repair prompt (raw output + failure) -> LLM -> normalize
//!            -> validate --ok--> plan | err --> GenerationFailure
//! ```
//!
//! There is never a third call. The second call is only issued after the
//! first has resolved, and no state survives between `generate` calls.

pub mod error;

use std::sync::Arc;
use std::time::Duration;

use crate::llm::{LlmClient, LlmError};
use crate::model::PlannerInput;
use crate::plan::{NormalizeContext, ValidatedPlan, ValidationContext, normalize_text, validate};
use crate::prompt::{PromptInputs, SYSTEM_INSTRUCTION, compile_generation, compile_repair};

pub use error::{AttemptError, FailureCategory, GenerationFailure, PlannerError};

/// Default bound on a single LLM call.
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(60);

/// Pipeline entry point holding an injected LLM client.
#[derive(Clone)]
pub struct Planner {
    client: Arc<dyn LlmClient>,
    call_timeout: Duration,
}

impl std::fmt::Debug for Planner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Planner")
            .field("client", &self.client.name())
            .field("call_timeout", &self.call_timeout)
            .finish()
    }
}

impl Planner {
    pub fn new(client: Arc<dyn LlmClient>) -> Self {
        Self {
            client,
            call_timeout: DEFAULT_CALL_TIMEOUT,
        }
    }

    /// Bound each LLM call; an elapsed call counts as a transport failure.
    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = timeout;
        self
    }

    pub fn client_name(&self) -> &str {
        self.client.name()
    }

    /// Generate one validated plan, repairing at most once.
    ///
    /// `seed` makes generated plan ids and timestamps reproducible.
    pub async fn generate(
        &self,
        input: &PlannerInput,
        seed: Option<u64>,
    ) -> Result<ValidatedPlan, PlannerError> {
        input.check().map_err(PlannerError::InvalidInput)?;

        let inputs = PromptInputs::from_input(input);
        let validation = ValidationContext {
            requested_duration_minutes: input.session_requested.duration_minutes,
            style: inputs.style,
            risk_feedback: inputs.history.risk_flag,
        };
        let normalize = NormalizeContext { input, seed };

        tracing::info!(
            client = self.client.name(),
            duration_minutes = input.session_requested.duration_minutes,
            effort = %input.session_requested.effort,
            style = %inputs.style,
            risk_feedback = validation.risk_feedback,
            "generating plan"
        );

        let generation = compile_generation(&inputs);
        let initial = match self.attempt(1, &generation, normalize, &validation).await {
            Ok(plan) => return Ok(plan),
            Err(e) => e,
        };
        tracing::warn!(
            attempt = 1,
            category = %initial.category,
            error = %initial.message,
            "plan attempt failed, requesting repair"
        );

        let repair_prompt = compile_repair(initial.raw.as_deref().unwrap_or(""), &initial.message);
        let repair = match self.attempt(2, &repair_prompt, normalize, &validation).await {
            Ok(plan) => return Ok(plan),
            Err(e) => e,
        };

        let failure = GenerationFailure { initial, repair };
        tracing::error!(
            category = %failure.category(),
            error = %failure,
            "plan generation failed after repair"
        );
        Err(failure.into())
    }

    /// One call plus normalization and validation.
    async fn attempt(
        &self,
        attempt: u8,
        user: &str,
        normalize: NormalizeContext<'_>,
        validation: &ValidationContext,
    ) -> Result<ValidatedPlan, AttemptError> {
        tracing::debug!(attempt, prompt_chars = user.len(), "calling LLM");

        let raw = self.call(user).await.map_err(|e| AttemptError::from_llm(&e))?;
        tracing::debug!(attempt, reply_chars = raw.len(), "LLM replied");

        let plan = match normalize_text(&raw, normalize) {
            Ok(plan) => plan,
            Err(e) => return Err(AttemptError::from_draft(&e, raw)),
        };
        let plan_id = plan.plan_id;
        let validated = validate(plan, validation).map_err(|v| AttemptError {
            category: FailureCategory::Invariant,
            message: v.to_string(),
            raw: Some(raw.clone()),
        })?;

        tracing::info!(
            attempt,
            plan_id = %plan_id,
            estimated_distance_m = validated.estimated_distance_m,
            "plan accepted"
        );
        Ok(validated)
    }

    async fn call(&self, user: &str) -> Result<String, LlmError> {
        match tokio::time::timeout(self.call_timeout, self.client.complete(SYSTEM_INSTRUCTION, user))
            .await
        {
            Ok(result) => result,
            Err(_) => Err(LlmError::Transport(format!(
                "no response within {}s",
                self.call_timeout.as_secs_f64()
            ))),
        }
    }
}
