//! Domain types shared by every stage of the planner.

pub mod enums;
pub mod request;

pub use enums::{Effort, EnumParseError, LadderKind, RepeatKind, StepKind, Stroke};
pub use request::{HistoricPlan, HistoricSession, PlannerInput, SessionRequested, Thumb, normalize_tags};
