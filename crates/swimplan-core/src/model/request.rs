//! Pipeline input: the workout request and the rated session history.
//!
//! Mirrors the JSON interchange object:
//!
//! ```json
//! {
//!   "session_requested": {"duration_minutes": 30, "effort": "medium", "requested_tags": []},
//!   "historic_sessions": [
//!     {"session_plan": {"duration_minutes": 20, "estimated_distance_m": 700}, "thumb": 1, "tags": ["fun"]}
//!   ],
//!   "requested_tags": []
//! }
//! ```

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::enums::Effort;

/// Binary post-session rating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Thumb {
    Down,
    Up,
}

impl TryFrom<u8> for Thumb {
    type Error = String;

    fn try_from(v: u8) -> Result<Self, Self::Error> {
        match v {
            0 => Ok(Self::Down),
            1 => Ok(Self::Up),
            other => Err(format!("thumb must be 0 or 1, got {other}")),
        }
    }
}

impl From<Thumb> for u8 {
    fn from(t: Thumb) -> u8 {
        match t {
            Thumb::Down => 0,
            Thumb::Up => 1,
        }
    }
}

/// What the swimmer asked for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRequested {
    pub duration_minutes: u32,
    pub effort: Effort,
    #[serde(default)]
    pub requested_tags: Vec<String>,
}

/// The parts of a past plan the summarizer reads.
///
/// `sections` is kept as raw JSON in the same loose shape the LLM produces;
/// history is advisory, so a malformed past plan must not reject the request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HistoricPlan {
    #[serde(default)]
    pub duration_minutes: Option<i64>,
    #[serde(default)]
    pub estimated_distance_m: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sections: Option<serde_json::Value>,
}

impl HistoricPlan {
    /// The plan's distance, if it is a usable positive value.
    pub fn distance_m(&self) -> Option<u32> {
        self.estimated_distance_m
            .filter(|d| *d > 0)
            .and_then(|d| u32::try_from(d).ok())
    }
}

/// One rated session from the swimmer's history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoricSession {
    #[serde(default)]
    pub session_plan: HistoricPlan,
    pub thumb: Thumb,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl HistoricSession {
    /// The session's feedback tags, normalized.
    pub fn normalized_tags(&self) -> Vec<String> {
        normalize_tags(&self.tags)
    }
}

/// Full pipeline input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlannerInput {
    pub session_requested: SessionRequested,
    #[serde(default)]
    pub historic_sessions: Vec<HistoricSession>,
    #[serde(default)]
    pub requested_tags: Vec<String>,
}

impl PlannerInput {
    /// Request-level tags followed by global tags, normalized.
    pub fn merged_tags(&self) -> Vec<String> {
        normalize_tags(
            self.session_requested
                .requested_tags
                .iter()
                .chain(self.requested_tags.iter()),
        )
    }

    /// Reject inputs no plan could ever satisfy.
    pub fn check(&self) -> Result<(), String> {
        if self.session_requested.duration_minutes == 0 {
            return Err("duration_minutes must be > 0".to_string());
        }
        Ok(())
    }
}

/// Trim, lower-case, drop blanks and de-duplicate, keeping first occurrence.
pub fn normalize_tags<I, S>(tags: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for tag in tags {
        let cleaned = tag.as_ref().trim().to_lowercase();
        if cleaned.is_empty() || !seen.insert(cleaned.clone()) {
            continue;
        }
        out.push(cleaned);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_tags_trims_lowercases_and_dedupes() {
        let tags = normalize_tags(["  Fun ", "fun", "", "  ", "Speed", "FUN"]);
        assert_eq!(tags, vec!["fun", "speed"]);
    }

    #[test]
    fn merged_tags_puts_request_tags_first() {
        let input: PlannerInput = serde_json::from_str(
            r#"{
                "session_requested": {"duration_minutes": 30, "effort": "easy", "requested_tags": ["Steady"]},
                "requested_tags": ["technique", "steady"]
            }"#,
        )
        .unwrap();
        assert_eq!(input.merged_tags(), vec!["steady", "technique"]);
        assert!(input.historic_sessions.is_empty());
    }

    #[test]
    fn thumb_rejects_values_other_than_zero_and_one() {
        let err = serde_json::from_str::<HistoricSession>(r#"{"thumb": 2}"#).unwrap_err();
        assert!(err.to_string().contains("thumb must be 0 or 1"));
    }

    #[test]
    fn historic_distance_ignores_non_positive_values() {
        let plan = HistoricPlan {
            estimated_distance_m: Some(0),
            ..Default::default()
        };
        assert_eq!(plan.distance_m(), None);

        let plan = HistoricPlan {
            estimated_distance_m: Some(900),
            ..Default::default()
        };
        assert_eq!(plan.distance_m(), Some(900));
    }

    #[test]
    fn check_rejects_zero_duration() {
        let input = PlannerInput {
            session_requested: SessionRequested {
                duration_minutes: 0,
                effort: Effort::Easy,
                requested_tags: vec![],
            },
            historic_sessions: vec![],
            requested_tags: vec![],
        };
        assert!(input.check().is_err());
    }
}
