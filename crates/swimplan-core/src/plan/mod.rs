//! Plan model, draft normalization, invariant validation, and rendering.

pub mod draft;
pub mod format;
pub mod normalize;
pub mod types;
pub mod validate;

pub use draft::{DraftError, PlanDraft, parse_draft};
pub use format::plan_to_text;
pub use normalize::{NormalizeContext, normalize, normalize_text};
pub use types::{Plan, Section, SectionName, Sections, Step, StepShape, StepSignature, ValidatedPlan};
pub use validate::{ValidationContext, Violation, check_plan, validate};
