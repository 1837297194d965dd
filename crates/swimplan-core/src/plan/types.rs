//! Canonical typed plan.
//!
//! A step's kind decides which fields it has: ladder kinds carry a rep
//! distance sequence, every other kind is `reps x distance_per_rep_m`.
//! On the wire a step is still one flat record (see [`StepRecord`]).

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use uuid::Uuid;

use crate::model::{Effort, LadderKind, RepeatKind, StepKind, Stroke};

// ---------------------------------------------------------------------------
// Section names
// ---------------------------------------------------------------------------

/// The three fixed sections of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SectionName {
    WarmUp,
    MainSet,
    CoolDown,
}

impl SectionName {
    pub const ALL: [SectionName; 3] = [Self::WarmUp, Self::MainSet, Self::CoolDown];

    /// JSON key of the section.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::WarmUp => "warm_up",
            Self::MainSet => "main_set",
            Self::CoolDown => "cool_down",
        }
    }

    /// Prefix for generated step ids.
    pub fn id_prefix(self) -> &'static str {
        match self {
            Self::WarmUp => "wu",
            Self::MainSet => "main",
            Self::CoolDown => "cd",
        }
    }

    pub fn default_title(self) -> &'static str {
        match self {
            Self::WarmUp => "Warm-Up",
            Self::MainSet => "Main Set",
            Self::CoolDown => "Cool-Down",
        }
    }

    pub fn fallback_description(self) -> &'static str {
        match self {
            Self::WarmUp => "Auto-generated warm-up step",
            Self::MainSet => "Auto-generated main step",
            Self::CoolDown => "Auto-generated cool-down step",
        }
    }
}

impl std::fmt::Display for SectionName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Steps
// ---------------------------------------------------------------------------

/// Kind-dependent distance structure of a step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepShape {
    /// `reps` repeats of `distance_per_rep_m`.
    Repeat {
        kind: RepeatKind,
        reps: u32,
        distance_per_rep_m: u32,
    },
    /// One rep per entry of `sequence_m`; `reps` is kept as declared so a
    /// disagreement with the sequence length can be reported.
    Ladder {
        kind: LadderKind,
        reps: u32,
        distance_per_rep_m: u32,
        sequence_m: Vec<u32>,
    },
}

/// One line of a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    pub step_id: String,
    pub shape: StepShape,
    pub stroke: Stroke,
    pub rest_seconds: Option<u32>,
    pub effort: Effort,
    pub description: String,
    pub hypoxic: bool,
    pub split_instruction: Option<String>,
}

/// Fields compared when testing main-set uniformity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StepSignature {
    pub kind: StepKind,
    pub reps: u32,
    pub distance_per_rep_m: u32,
    pub stroke: Stroke,
    pub rest_seconds: Option<u32>,
    pub effort: Effort,
}

impl Step {
    pub fn kind(&self) -> StepKind {
        match &self.shape {
            StepShape::Repeat { kind, .. } => (*kind).into(),
            StepShape::Ladder { kind, .. } => (*kind).into(),
        }
    }

    pub fn reps(&self) -> u32 {
        match &self.shape {
            StepShape::Repeat { reps, .. } | StepShape::Ladder { reps, .. } => *reps,
        }
    }

    pub fn distance_per_rep_m(&self) -> u32 {
        match &self.shape {
            StepShape::Repeat {
                distance_per_rep_m, ..
            }
            | StepShape::Ladder {
                distance_per_rep_m, ..
            } => *distance_per_rep_m,
        }
    }

    pub fn sequence_m(&self) -> Option<&[u32]> {
        match &self.shape {
            StepShape::Repeat { .. } => None,
            StepShape::Ladder { sequence_m, .. } => Some(sequence_m),
        }
    }

    /// Distance swum by this step, computed from leaf data only.
    ///
    /// Saturates at `u64::MAX`; use [`Step::checked_distance_m`] where an
    /// overflow must be reported.
    pub fn distance_m(&self) -> u64 {
        self.checked_distance_m().unwrap_or(u64::MAX)
    }

    /// Distance swum by this step, or `None` if it does not fit in a `u64`.
    pub fn checked_distance_m(&self) -> Option<u64> {
        match &self.shape {
            StepShape::Repeat {
                reps,
                distance_per_rep_m,
                ..
            } => u64::from(*reps).checked_mul(u64::from(*distance_per_rep_m)),
            StepShape::Ladder { sequence_m, .. } => checked_sum(sequence_m.iter().map(|d| u64::from(*d))),
        }
    }

    pub fn signature(&self) -> StepSignature {
        StepSignature {
            kind: self.kind(),
            reps: self.reps(),
            distance_per_rep_m: self.distance_per_rep_m(),
            stroke: self.stroke,
            rest_seconds: self.rest_seconds,
            effort: self.effort,
        }
    }

    fn record(&self) -> StepRecord<'_> {
        StepRecord {
            step_id: &self.step_id,
            kind: self.kind(),
            reps: self.reps(),
            distance_per_rep_m: self.distance_per_rep_m(),
            stroke: self.stroke,
            rest_seconds: self.rest_seconds,
            effort: self.effort,
            description: &self.description,
            pyramid_sequence_m: self.sequence_m(),
            hypoxic: self.hypoxic.then_some(true),
            split_instruction: self.split_instruction.as_deref(),
        }
    }
}

/// Flat wire form of a [`Step`].
#[derive(Serialize)]
struct StepRecord<'a> {
    step_id: &'a str,
    kind: StepKind,
    reps: u32,
    distance_per_rep_m: u32,
    stroke: Stroke,
    rest_seconds: Option<u32>,
    effort: Effort,
    description: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pyramid_sequence_m: Option<&'a [u32]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    hypoxic: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    split_instruction: Option<&'a str>,
}

impl Serialize for Step {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.record().serialize(serializer)
    }
}

// ---------------------------------------------------------------------------
// Sections and plan
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Section {
    pub title: String,
    /// Always the recomputed sum of `steps`, never a declared value.
    pub section_distance_m: u64,
    pub steps: Vec<Step>,
}

impl Section {
    /// Build a section, deriving its distance from the steps.
    ///
    /// An overflowing sum saturates at `u64::MAX`, which the validator
    /// rejects. [`Section::try_from_steps`] reports the overflow instead.
    pub fn from_steps(title: impl Into<String>, steps: Vec<Step>) -> Self {
        let section_distance_m = steps_distance_m(&steps).unwrap_or(u64::MAX);
        Self {
            title: title.into(),
            section_distance_m,
            steps,
        }
    }

    /// Build a section, or `None` if its distance overflows a `u64`.
    pub fn try_from_steps(title: impl Into<String>, steps: Vec<Step>) -> Option<Self> {
        let section_distance_m = steps_distance_m(&steps)?;
        Some(Self {
            title: title.into(),
            section_distance_m,
            steps,
        })
    }
}

/// Sum of step distances, `None` on overflow.
pub fn steps_distance_m(steps: &[Step]) -> Option<u64> {
    steps
        .iter()
        .try_fold(0u64, |acc, step| acc.checked_add(step.checked_distance_m()?))
}

fn checked_sum(mut values: impl Iterator<Item = u64>) -> Option<u64> {
    values.try_fold(0u64, u64::checked_add)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Sections {
    pub warm_up: Section,
    pub main_set: Section,
    pub cool_down: Section,
}

impl Sections {
    pub fn get(&self, name: SectionName) -> &Section {
        match name {
            SectionName::WarmUp => &self.warm_up,
            SectionName::MainSet => &self.main_set,
            SectionName::CoolDown => &self.cool_down,
        }
    }

    /// Sections in session order.
    pub fn iter(&self) -> impl Iterator<Item = (SectionName, &Section)> {
        SectionName::ALL.into_iter().map(move |n| (n, self.get(n)))
    }

    /// Sum of section distances, saturating at `u64::MAX`.
    pub fn total_m(&self) -> u64 {
        self.checked_total_m().unwrap_or(u64::MAX)
    }

    pub fn checked_total_m(&self) -> Option<u64> {
        checked_sum(self.iter().map(|(_, s)| s.section_distance_m))
    }
}

/// A normalized, not yet validated, session plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Plan {
    pub plan_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub duration_minutes: u32,
    /// Always the recomputed sum of the three sections.
    pub estimated_distance_m: u64,
    pub sections: Sections,
}

/// A plan that passed every invariant check.
///
/// Only [`super::validate`] constructs this type, so holding one is proof the
/// plan was checked against the request it was generated for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidatedPlan(Plan);

impl ValidatedPlan {
    pub(crate) fn new(plan: Plan) -> Self {
        Self(plan)
    }

    pub fn into_inner(self) -> Plan {
        self.0
    }
}

impl std::ops::Deref for ValidatedPlan {
    type Target = Plan;

    fn deref(&self) -> &Plan {
        &self.0
    }
}
