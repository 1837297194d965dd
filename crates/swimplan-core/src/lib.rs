//! Swim session planning core.
//!
//! Turns a structured workout request plus a rated session history into a
//! validated [`plan::ValidatedPlan`], using an LLM as an untrusted content
//! source. The pipeline is:
//!
//! ```text
//! PlannerInput
//!     |
//!     +--> history::summarize_history --+
//!     +--> style::infer_style ----------+
//!                                       v
//!                         prompt::compile_generation
//!                                       |
//!                                       v
//!                         llm::LlmClient::complete
//!                                       |
//!                                       v
//!                plan::parse_draft -> plan::normalize -> plan::validate
//!                                       |
//!                    ok: ValidatedPlan  |  err: prompt::compile_repair
//!                                       v       (exactly one more attempt)
//! ```
//!
//! Everything except the LLM call is synchronous and pure.

pub mod history;
pub mod llm;
pub mod model;
pub mod pipeline;
pub mod plan;
pub mod prompt;
pub mod style;

pub use llm::{LlmClient, LlmError};
pub use model::{Effort, HistoricSession, PlannerInput, SessionRequested, Stroke};
pub use pipeline::{FailureCategory, GenerationFailure, Planner, PlannerError};
pub use plan::{Plan, ValidatedPlan};
pub use style::Style;
