//! Invariant validation: the gate every returned plan passes through.
//!
//! Checks run in a fixed order (steps, then sections, then the plan, then
//! style, then safety) and stop at the first failure, so the same plan
//! always yields the same [`Violation`]. The violation's message is what the
//! repair instruction quotes back to the generator.

use std::collections::HashSet;

use thiserror::Error;

use super::types::{Plan, Section, SectionName, Step, ValidatedPlan, steps_distance_m};
use crate::history::has_risk_feedback;
use crate::model::{Effort, PlannerInput, StepKind, Stroke};
use crate::style::{Style, infer_style};

/// Step distances and every aggregate must divide evenly by this.
pub const DISTANCE_UNIT_M: u64 = 50;

/// Main-set continuous hard swims longer than this are refused when the
/// swimmer has disliked long or tiring sessions.
pub const SAFETY_CAP_M: u64 = 500;

/// Minimum rest on a hypoxic step.
pub const HYPOXIC_MIN_REST_S: u32 = 20;

fn kind_list() -> String {
    StepKind::ALL.map(StepKind::as_str).join(", ")
}

fn stroke_list() -> String {
    Stroke::ALL.map(Stroke::as_str).join(", ")
}

fn effort_list() -> String {
    Effort::ALL.map(Effort::as_str).join(", ")
}

/// One failed invariant, scoped to the offending section or step.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Violation {
    // -- step membership --
    #[error("{section}.{step_id}: kind {value:?} is not one of {allowed}", allowed = kind_list())]
    InvalidKind {
        section: SectionName,
        step_id: String,
        value: String,
    },

    #[error("{section}.{step_id}: stroke {value:?} is not one of {allowed}", allowed = stroke_list())]
    InvalidStroke {
        section: SectionName,
        step_id: String,
        value: String,
    },

    #[error("{section}.{step_id}: effort {value:?} is not one of {allowed}", allowed = effort_list())]
    InvalidEffort {
        section: SectionName,
        step_id: String,
        value: String,
    },

    // -- step numbers --
    #[error("{section}.{step_id}: reps must be > 0")]
    NonPositiveReps { section: SectionName, step_id: String },

    #[error("{section}.{step_id}: distance_per_rep_m must be > 0")]
    NonPositiveRepDistance { section: SectionName, step_id: String },

    #[error("{section}.{step_id}: distance_per_rep_m must be a multiple of 50 (got {value})")]
    RepDistanceNotMultiple {
        section: SectionName,
        step_id: String,
        value: u32,
    },

    #[error("{section}.{step_id}: rest_seconds must be null or >= 0")]
    NegativeRest { section: SectionName, step_id: String },

    #[error("{section}.{step_id}: {field} is out of range")]
    OutOfRange {
        section: SectionName,
        step_id: String,
        field: &'static str,
    },

    // -- ladder kinds --
    #[error("{section}.{step_id}: kind {kind} requires pyramid_sequence_m")]
    MissingSequence {
        section: SectionName,
        step_id: String,
        kind: StepKind,
    },

    #[error("{section}.{step_id}: pyramid_sequence_m entries must be positive multiples of 50 (got {value})")]
    InvalidSequenceEntry {
        section: SectionName,
        step_id: String,
        value: i64,
    },

    #[error("{section}.{step_id}: reps ({reps}) must equal pyramid_sequence_m length ({len})")]
    SequenceLengthMismatch {
        section: SectionName,
        step_id: String,
        reps: u32,
        len: usize,
    },

    #[error("{section}.{step_id}: pyramid_sequence_m does not form a {kind} ladder")]
    SequenceShape {
        section: SectionName,
        step_id: String,
        kind: StepKind,
    },

    // -- step distance and text --
    #[error("{section}.{step_id}: computed distance must be > 0")]
    NonPositiveStepDistance { section: SectionName, step_id: String },

    #[error("{section}.{step_id}: computed distance must be a multiple of 50 (got {distance})")]
    StepDistanceNotMultiple {
        section: SectionName,
        step_id: String,
        distance: u64,
    },

    #[error("{section}[{index}]: step_id must not be blank")]
    BlankStepId { section: SectionName, index: usize },

    #[error("{section}.{step_id}: description must not be blank")]
    BlankDescription { section: SectionName, step_id: String },

    #[error("{section}.{step_id}: warm_up and cool_down steps must be easy (got {effort})")]
    NonEasyEffort {
        section: SectionName,
        step_id: String,
        effort: Effort,
    },

    #[error("{section}.{step_id}: hypoxic is only allowed in main_set")]
    HypoxicOutsideMainSet { section: SectionName, step_id: String },

    #[error("{section}.{step_id}: hypoxic steps require rest_seconds >= 20")]
    HypoxicRestTooShort { section: SectionName, step_id: String },

    // -- sections --
    #[error("{section}: title must not be blank")]
    BlankTitle { section: SectionName },

    #[error("{section}: must contain at least one step")]
    EmptySection { section: SectionName },

    #[error("{section}: section_distance_m must be > 0")]
    NonPositiveSectionDistance { section: SectionName },

    #[error("{section}: section_distance_m must be a multiple of 50 (got {distance})")]
    SectionDistanceNotMultiple { section: SectionName, distance: u64 },

    #[error("{section}: section_distance_m ({declared}) does not equal the sum of its steps ({computed})")]
    SectionSumMismatch {
        section: SectionName,
        declared: u64,
        computed: u64,
    },

    #[error("{section}: section_distance_m exceeds the supported range")]
    SectionDistanceOverflow { section: SectionName },

    // -- plan --
    #[error("plan: estimated_distance_m exceeds the supported range")]
    TotalDistanceOverflow,

    #[error("plan: estimated_distance_m ({declared}) does not equal the sum of its sections ({computed})")]
    TotalMismatch { declared: u64, computed: u64 },

    #[error("plan: estimated_distance_m must be > 0")]
    NonPositiveTotal,

    #[error("plan: estimated_distance_m must be a multiple of 50 (got {distance})")]
    TotalNotMultiple { distance: u64 },

    #[error("plan: duration_minutes must be > 0")]
    NonPositiveDuration,

    #[error("plan: duration_minutes ({actual}) must equal the requested {requested}")]
    DurationMismatch { actual: u32, requested: u32 },

    // -- style --
    #[error("straightforward mode requires one main_set pattern signature (found {signatures})")]
    NotUniform { signatures: usize },

    #[error("varied mode should usually include at least 2 main_set steps (found {steps})")]
    TooFewMainSteps { steps: usize },

    // -- safety --
    #[error("main_set.{step_id}: main_set contains long hard continuous block despite sensitive thumbs-down history ({distance}m > 500m)")]
    UnsafeContinuousBlock { step_id: String, distance: u64 },
}

/// Request-derived facts the validator checks a plan against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidationContext {
    pub requested_duration_minutes: u32,
    pub style: Style,
    pub risk_feedback: bool,
}

impl ValidationContext {
    /// Derive the context from a pipeline input.
    pub fn for_input(input: &PlannerInput) -> Self {
        Self {
            requested_duration_minutes: input.session_requested.duration_minutes,
            style: infer_style(&input.merged_tags(), &input.historic_sessions),
            risk_feedback: has_risk_feedback(&input.historic_sessions),
        }
    }
}

/// Validate a plan, consuming it into a [`ValidatedPlan`] on success.
pub fn validate(plan: Plan, ctx: &ValidationContext) -> Result<ValidatedPlan, Violation> {
    check_plan(&plan, ctx)?;
    Ok(ValidatedPlan::new(plan))
}

/// Run every check without taking ownership.
pub fn check_plan(plan: &Plan, ctx: &ValidationContext) -> Result<(), Violation> {
    for (name, section) in plan.sections.iter() {
        for (index, step) in section.steps.iter().enumerate() {
            check_step(name, index, step)?;
        }
        check_section(name, section)?;
    }
    check_totals(plan, ctx)?;
    check_style(plan, ctx.style)?;
    if ctx.risk_feedback {
        check_safety_cap(plan)?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Steps
// ---------------------------------------------------------------------------

fn check_step(section: SectionName, index: usize, step: &Step) -> Result<(), Violation> {
    let scope = || (section, step.step_id.clone());

    if step.reps() == 0 {
        let (section, step_id) = scope();
        return Err(Violation::NonPositiveReps { section, step_id });
    }
    let per_rep = step.distance_per_rep_m();
    if per_rep == 0 {
        let (section, step_id) = scope();
        return Err(Violation::NonPositiveRepDistance { section, step_id });
    }
    if u64::from(per_rep) % DISTANCE_UNIT_M != 0 {
        let (section, step_id) = scope();
        return Err(Violation::RepDistanceNotMultiple {
            section,
            step_id,
            value: per_rep,
        });
    }

    if let Some(sequence) = step.sequence_m() {
        check_ladder(section, step, sequence)?;
    }

    let distance = step.distance_m();
    if distance == 0 {
        let (section, step_id) = scope();
        return Err(Violation::NonPositiveStepDistance { section, step_id });
    }
    if distance % DISTANCE_UNIT_M != 0 {
        let (section, step_id) = scope();
        return Err(Violation::StepDistanceNotMultiple {
            section,
            step_id,
            distance,
        });
    }

    if step.step_id.trim().is_empty() {
        return Err(Violation::BlankStepId { section, index });
    }
    if step.description.trim().is_empty() {
        let (section, step_id) = scope();
        return Err(Violation::BlankDescription { section, step_id });
    }

    if section != SectionName::MainSet && step.effort != Effort::Easy {
        let (section, step_id) = scope();
        return Err(Violation::NonEasyEffort {
            section,
            step_id,
            effort: step.effort,
        });
    }

    if step.hypoxic {
        if section != SectionName::MainSet {
            let (section, step_id) = scope();
            return Err(Violation::HypoxicOutsideMainSet { section, step_id });
        }
        if step.rest_seconds.is_none_or(|r| r < HYPOXIC_MIN_REST_S) {
            let (section, step_id) = scope();
            return Err(Violation::HypoxicRestTooShort { section, step_id });
        }
    }

    Ok(())
}

fn check_ladder(section: SectionName, step: &Step, sequence: &[u32]) -> Result<(), Violation> {
    let kind = step.kind();
    let scope = || (section, step.step_id.clone());

    if let Some(bad) = sequence
        .iter()
        .find(|d| **d == 0 || u64::from(**d) % DISTANCE_UNIT_M != 0)
    {
        let (section, step_id) = scope();
        return Err(Violation::InvalidSequenceEntry {
            section,
            step_id,
            value: i64::from(*bad),
        });
    }
    if usize::try_from(step.reps()).ok() != Some(sequence.len()) {
        let (section, step_id) = scope();
        return Err(Violation::SequenceLengthMismatch {
            section,
            step_id,
            reps: step.reps(),
            len: sequence.len(),
        });
    }

    let shaped = match kind {
        StepKind::Descending => sequence.windows(2).all(|w| w[0] >= w[1]),
        StepKind::Ascending => sequence.windows(2).all(|w| w[0] <= w[1]),
        _ => is_pyramid(sequence),
    };
    if !shaped {
        let (section, step_id) = scope();
        return Err(Violation::SequenceShape {
            section,
            step_id,
            kind,
        });
    }
    Ok(())
}

/// Rises to a peak, then falls, with both ends strictly below the peak.
fn is_pyramid(sequence: &[u32]) -> bool {
    if sequence.len() < 3 {
        return false;
    }
    let peak_value = sequence.iter().copied().max().unwrap_or(0);
    let Some(peak) = sequence.iter().position(|d| *d == peak_value) else {
        return false;
    };
    let rises = sequence[..=peak].windows(2).all(|w| w[0] <= w[1]);
    let falls = sequence[peak..].windows(2).all(|w| w[0] >= w[1]);
    let first = sequence[0];
    let last = sequence[sequence.len() - 1];
    rises && falls && first < peak_value && last < peak_value
}

// ---------------------------------------------------------------------------
// Sections and plan totals
// ---------------------------------------------------------------------------

fn check_section(section: SectionName, body: &Section) -> Result<(), Violation> {
    if body.title.trim().is_empty() {
        return Err(Violation::BlankTitle { section });
    }
    if body.steps.is_empty() {
        return Err(Violation::EmptySection { section });
    }
    let declared = body.section_distance_m;
    if declared == 0 {
        return Err(Violation::NonPositiveSectionDistance { section });
    }
    if declared % DISTANCE_UNIT_M != 0 {
        return Err(Violation::SectionDistanceNotMultiple {
            section,
            distance: declared,
        });
    }
    let computed = steps_distance_m(&body.steps).ok_or(Violation::SectionDistanceOverflow { section })?;
    if declared != computed {
        return Err(Violation::SectionSumMismatch {
            section,
            declared,
            computed,
        });
    }
    Ok(())
}

fn check_totals(plan: &Plan, ctx: &ValidationContext) -> Result<(), Violation> {
    let declared = plan.estimated_distance_m;
    let computed = plan
        .sections
        .checked_total_m()
        .ok_or(Violation::TotalDistanceOverflow)?;
    if declared != computed {
        return Err(Violation::TotalMismatch { declared, computed });
    }
    if declared == 0 {
        return Err(Violation::NonPositiveTotal);
    }
    if declared % DISTANCE_UNIT_M != 0 {
        return Err(Violation::TotalNotMultiple { distance: declared });
    }
    if plan.duration_minutes == 0 {
        return Err(Violation::NonPositiveDuration);
    }
    if plan.duration_minutes != ctx.requested_duration_minutes {
        return Err(Violation::DurationMismatch {
            actual: plan.duration_minutes,
            requested: ctx.requested_duration_minutes,
        });
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Style and safety
// ---------------------------------------------------------------------------

fn check_style(plan: &Plan, style: Style) -> Result<(), Violation> {
    let steps = &plan.sections.main_set.steps;
    match style {
        Style::Straightforward => {
            let signatures: HashSet<_> = steps.iter().map(Step::signature).collect();
            if signatures.len() != 1 {
                return Err(Violation::NotUniform {
                    signatures: signatures.len(),
                });
            }
        }
        Style::Varied => {
            if steps.len() < 2 {
                return Err(Violation::TooFewMainSteps { steps: steps.len() });
            }
        }
    }
    Ok(())
}

fn check_safety_cap(plan: &Plan) -> Result<(), Violation> {
    let unsafe_step = plan.sections.main_set.steps.iter().find(|s| {
        s.kind() == StepKind::Continuous && s.effort == Effort::Hard && s.distance_m() > SAFETY_CAP_M
    });
    match unsafe_step {
        Some(step) => Err(Violation::UnsafeContinuousBlock {
            step_id: step.step_id.clone(),
            distance: step.distance_m(),
        }),
        None => Ok(()),
    }
}
