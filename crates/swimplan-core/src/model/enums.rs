use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Parse error
// ---------------------------------------------------------------------------

/// Error returned when a string names no variant of a closed vocabulary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumParseError {
    /// Which vocabulary was being parsed (e.g. "stroke").
    pub vocabulary: &'static str,
    /// The rejected input.
    pub value: String,
}

impl fmt::Display for EnumParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid {}: {:?}", self.vocabulary, self.value)
    }
}

impl std::error::Error for EnumParseError {}

// ---------------------------------------------------------------------------
// Effort
// ---------------------------------------------------------------------------

/// Intensity label attached to a request, a history entry, or a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Effort {
    Easy,
    Medium,
    Hard,
}

impl Effort {
    pub const ALL: [Effort; 3] = [Self::Easy, Self::Medium, Self::Hard];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Easy => "easy",
            Self::Medium => "medium",
            Self::Hard => "hard",
        }
    }
}

impl fmt::Display for Effort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Effort {
    type Err = EnumParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "easy" => Ok(Self::Easy),
            "medium" => Ok(Self::Medium),
            "hard" => Ok(Self::Hard),
            other => Err(EnumParseError {
                vocabulary: "effort",
                value: other.to_owned(),
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// Stroke
// ---------------------------------------------------------------------------

/// Swim stroke for a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stroke {
    Freestyle,
    Backstroke,
    Breaststroke,
    Butterfly,
    Mixed,
    Choice,
}

impl Stroke {
    pub const ALL: [Stroke; 6] = [
        Self::Freestyle,
        Self::Backstroke,
        Self::Breaststroke,
        Self::Butterfly,
        Self::Mixed,
        Self::Choice,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Freestyle => "freestyle",
            Self::Backstroke => "backstroke",
            Self::Breaststroke => "breaststroke",
            Self::Butterfly => "butterfly",
            Self::Mixed => "mixed",
            Self::Choice => "choice",
        }
    }

    /// `mixed` and `choice` say nothing about which stroke a swimmer likes.
    pub fn is_specific(self) -> bool {
        !matches!(self, Self::Mixed | Self::Choice)
    }
}

impl fmt::Display for Stroke {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Stroke {
    type Err = EnumParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "freestyle" => Ok(Self::Freestyle),
            "backstroke" => Ok(Self::Backstroke),
            "breaststroke" => Ok(Self::Breaststroke),
            "butterfly" => Ok(Self::Butterfly),
            "mixed" => Ok(Self::Mixed),
            "choice" => Ok(Self::Choice),
            other => Err(EnumParseError {
                vocabulary: "stroke",
                value: other.to_owned(),
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// Step kinds
// ---------------------------------------------------------------------------

/// Every step kind the planner accepts.
///
/// This is the single list both the prompt and the validator read from, so
/// the kinds the generator is told about and the kinds that pass validation
/// cannot diverge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepKind {
    Continuous,
    Intervals,
    Pyramid,
    Descending,
    Ascending,
    Build,
    NegativeSplit,
}

impl StepKind {
    pub const ALL: [StepKind; 7] = [
        Self::Continuous,
        Self::Intervals,
        Self::Pyramid,
        Self::Descending,
        Self::Ascending,
        Self::Build,
        Self::NegativeSplit,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Continuous => "continuous",
            Self::Intervals => "intervals",
            Self::Pyramid => "pyramid",
            Self::Descending => "descending",
            Self::Ascending => "ascending",
            Self::Build => "build",
            Self::NegativeSplit => "negative_split",
        }
    }

    /// Ladder kinds take their distance from `pyramid_sequence_m`.
    pub fn is_ladder(self) -> bool {
        matches!(self, Self::Pyramid | Self::Descending | Self::Ascending)
    }
}

impl fmt::Display for StepKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StepKind {
    type Err = EnumParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| EnumParseError {
                vocabulary: "kind",
                value: s.to_owned(),
            })
    }
}

/// Kinds whose distance is `reps * distance_per_rep_m`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RepeatKind {
    Continuous,
    Intervals,
    Build,
    NegativeSplit,
}

/// Kinds whose distance is the sum of an explicit rep-distance sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LadderKind {
    Pyramid,
    Descending,
    Ascending,
}

impl From<RepeatKind> for StepKind {
    fn from(k: RepeatKind) -> Self {
        match k {
            RepeatKind::Continuous => Self::Continuous,
            RepeatKind::Intervals => Self::Intervals,
            RepeatKind::Build => Self::Build,
            RepeatKind::NegativeSplit => Self::NegativeSplit,
        }
    }
}

impl From<LadderKind> for StepKind {
    fn from(k: LadderKind) -> Self {
        match k {
            LadderKind::Pyramid => Self::Pyramid,
            LadderKind::Descending => Self::Descending,
            LadderKind::Ascending => Self::Ascending,
        }
    }
}
