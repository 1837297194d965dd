//! Draft normalization: coerce a loose draft into the canonical [`Plan`].
//!
//! Minor omissions (blank ids, descriptions, titles, missing plan id or
//! timestamp) are filled with deterministic defaults. Declared aggregates are
//! never read: every section distance and the plan total are recomputed from
//! the steps. The duration always comes from the request.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::draft::{DraftError, PlanDraft, SectionDraft, StepDraft};
use super::types::{Plan, Section, SectionName, Sections, Step, StepShape};
use super::validate::Violation;
use crate::model::{Effort, LadderKind, PlannerInput, RepeatKind, StepKind, Stroke};

/// 2024-01-01T00:00:00Z, the base timestamp for seeded runs.
const SEED_EPOCH_S: i64 = 1_704_067_200;

/// What the normalizer needs from the request.
#[derive(Debug, Clone, Copy)]
pub struct NormalizeContext<'a> {
    pub input: &'a PlannerInput,
    /// Makes generated ids and timestamps reproducible.
    pub seed: Option<u64>,
}

/// Parse generator text and normalize it in one step.
pub fn normalize_text(text: &str, ctx: NormalizeContext<'_>) -> Result<Plan, DraftError> {
    let draft = super::draft::parse_draft(text)?;
    normalize(draft, ctx)
}

/// Convert a parsed draft into a canonical plan.
pub fn normalize(draft: PlanDraft, ctx: NormalizeContext<'_>) -> Result<Plan, DraftError> {
    let Some(sections) = draft.sections else {
        return Err(DraftError::Structural("missing \"sections\"".to_string()));
    };

    let sections = Sections {
        warm_up: normalize_section(SectionName::WarmUp, sections.warm_up)?,
        main_set: normalize_section(SectionName::MainSet, sections.main_set)?,
        cool_down: normalize_section(SectionName::CoolDown, sections.cool_down)?,
    };

    let estimated_distance_m = sections
        .checked_total_m()
        .ok_or(Violation::TotalDistanceOverflow)?;

    let plan_id = draft
        .plan_id
        .as_deref()
        .and_then(|s| Uuid::parse_str(s.trim()).ok())
        .unwrap_or_else(|| generated_plan_id(ctx));
    let created_at = draft
        .created_at
        .as_deref()
        .and_then(|s| DateTime::parse_from_rfc3339(s.trim()).ok())
        .map(|t| t.with_timezone(&Utc))
        .unwrap_or_else(|| generated_created_at(ctx.seed));

    Ok(Plan {
        plan_id,
        created_at,
        duration_minutes: ctx.input.session_requested.duration_minutes,
        estimated_distance_m,
        sections,
    })
}

fn normalize_section(name: SectionName, draft: Option<SectionDraft>) -> Result<Section, DraftError> {
    let Some(draft) = draft else {
        return Err(DraftError::Structural(format!("missing section {name}")));
    };
    if draft.steps.is_empty() {
        return Err(DraftError::Structural(format!("section {name} has no steps")));
    }

    let title = non_blank(draft.title).unwrap_or_else(|| name.default_title().to_string());
    let steps = draft
        .steps
        .into_iter()
        .enumerate()
        .map(|(i, step)| normalize_step(name, i, step))
        .collect::<Result<Vec<_>, _>>()?;

    Section::try_from_steps(title, steps)
        .ok_or(DraftError::Invariant(Violation::SectionDistanceOverflow { section: name }))
}

fn normalize_step(section: SectionName, index: usize, draft: StepDraft) -> Result<Step, Violation> {
    let step_id =
        non_blank(draft.step_id).unwrap_or_else(|| format!("{}-{}", section.id_prefix(), index + 1));
    let scope = || (section, step_id.clone());

    let kind: StepKind = draft.kind.trim().parse().map_err(|_| {
        let (section, step_id) = scope();
        Violation::InvalidKind {
            section,
            step_id,
            value: draft.kind.clone(),
        }
    })?;
    let stroke: Stroke = draft.stroke.trim().parse().map_err(|_| {
        let (section, step_id) = scope();
        Violation::InvalidStroke {
            section,
            step_id,
            value: draft.stroke.clone(),
        }
    })?;
    let effort: Effort = draft.effort.trim().parse().map_err(|_| {
        let (section, step_id) = scope();
        Violation::InvalidEffort {
            section,
            step_id,
            value: draft.effort.clone(),
        }
    })?;

    let reps = non_negative(draft.reps, "reps").map_err(|sign| match sign {
        Sign::Negative => {
            let (section, step_id) = scope();
            Violation::NonPositiveReps { section, step_id }
        }
        Sign::TooLarge(field) => out_of_range(scope(), field),
    })?;
    let distance_per_rep_m =
        non_negative(draft.distance_per_rep_m, "distance_per_rep_m").map_err(|sign| match sign {
            Sign::Negative => {
                let (section, step_id) = scope();
                Violation::NonPositiveRepDistance { section, step_id }
            }
            Sign::TooLarge(field) => out_of_range(scope(), field),
        })?;
    let rest_seconds = draft
        .rest_seconds
        .map(|r| non_negative(r, "rest_seconds"))
        .transpose()
        .map_err(|sign| match sign {
            Sign::Negative => {
                let (section, step_id) = scope();
                Violation::NegativeRest { section, step_id }
            }
            Sign::TooLarge(field) => out_of_range(scope(), field),
        })?;

    let shape = match ladder_kind(kind) {
        Some(ladder) => {
            let Some(raw) = draft.pyramid_sequence_m else {
                let (section, step_id) = scope();
                return Err(Violation::MissingSequence {
                    section,
                    step_id,
                    kind,
                });
            };
            let mut sequence_m = Vec::with_capacity(raw.len());
            for value in raw {
                match u32::try_from(value) {
                    Ok(d) => sequence_m.push(d),
                    Err(_) => {
                        let (section, step_id) = scope();
                        return Err(Violation::InvalidSequenceEntry {
                            section,
                            step_id,
                            value,
                        });
                    }
                }
            }
            StepShape::Ladder {
                kind: ladder,
                reps,
                distance_per_rep_m,
                sequence_m,
            }
        }
        None => StepShape::Repeat {
            kind: repeat_kind(kind),
            reps,
            distance_per_rep_m,
        },
    };

    let description =
        non_blank(draft.description).unwrap_or_else(|| section.fallback_description().to_string());

    Ok(Step {
        step_id,
        shape,
        stroke,
        rest_seconds,
        effort,
        description,
        hypoxic: draft.hypoxic.unwrap_or(false),
        split_instruction: non_blank(draft.split_instruction),
    })
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

enum Sign {
    Negative,
    TooLarge(&'static str),
}

fn non_negative(value: i64, field: &'static str) -> Result<u32, Sign> {
    if value < 0 {
        return Err(Sign::Negative);
    }
    u32::try_from(value).map_err(|_| Sign::TooLarge(field))
}

fn out_of_range((section, step_id): (SectionName, String), field: &'static str) -> Violation {
    Violation::OutOfRange {
        section,
        step_id,
        field,
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn ladder_kind(kind: StepKind) -> Option<LadderKind> {
    match kind {
        StepKind::Pyramid => Some(LadderKind::Pyramid),
        StepKind::Descending => Some(LadderKind::Descending),
        StepKind::Ascending => Some(LadderKind::Ascending),
        _ => None,
    }
}

fn repeat_kind(kind: StepKind) -> RepeatKind {
    match kind {
        StepKind::Intervals => RepeatKind::Intervals,
        StepKind::Build => RepeatKind::Build,
        StepKind::NegativeSplit => RepeatKind::NegativeSplit,
        _ => RepeatKind::Continuous,
    }
}

fn generated_plan_id(ctx: NormalizeContext<'_>) -> Uuid {
    match ctx.seed {
        Some(seed) => {
            let request = serde_json::to_string(ctx.input).unwrap_or_default();
            let name = format!("{request}|{seed}");
            Uuid::new_v5(&Uuid::NAMESPACE_DNS, name.as_bytes())
        }
        None => Uuid::new_v4(),
    }
}

fn generated_created_at(seed: Option<u64>) -> DateTime<Utc> {
    match seed {
        Some(seed) => i64::try_from(seed)
            .ok()
            .and_then(|s| SEED_EPOCH_S.checked_add(s))
            .and_then(|t| DateTime::from_timestamp(t, 0))
            .unwrap_or_default(),
        None => Utc::now(),
    }
}
