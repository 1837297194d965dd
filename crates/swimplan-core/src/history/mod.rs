//! History summarization: reduce rated sessions to fixed guidance signals.
//!
//! The output is a typed [`HistorySummary`], not free text; the prompt
//! compiler decides how to phrase it. Summarization is order-independent:
//! every aggregate is a min/max, a set union, or a count.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::model::{HistoricSession, StepKind, Stroke, Thumb};

/// Feedback tags on a thumbs-down session that trigger the safety cap.
pub const RISK_TAGS: [&str; 3] = ["pace-too-fast", "long", "tiring"];

/// Inclusive distance range seen in one rating bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DistanceRange {
    pub min_m: u32,
    pub max_m: u32,
}

impl DistanceRange {
    fn include(range: Option<Self>, d: u32) -> Option<Self> {
        Some(match range {
            None => Self { min_m: d, max_m: d },
            Some(r) => Self {
                min_m: r.min_m.min(d),
                max_m: r.max_m.max(d),
            },
        })
    }
}

impl fmt::Display for DistanceRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}m", self.min_m, self.max_m)
    }
}

/// Main-set shape of a liked session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MainSetStructure {
    /// Any main-set step was something other than a continuous swim.
    Intervals,
    /// Every main-set step was a continuous swim.
    Continuous,
}

impl MainSetStructure {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Intervals => "interval-based",
            Self::Continuous => "continuous",
        }
    }
}

/// Guidance signals derived from a swimmer's rated history.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HistorySummary {
    /// Distance range of thumbs-up sessions.
    pub liked_range: Option<DistanceRange>,
    /// Distance range of thumbs-down sessions.
    pub disliked_range: Option<DistanceRange>,
    /// Union of tags on thumbs-up sessions.
    pub liked_tags: BTreeSet<String>,
    /// Union of tags on thumbs-down sessions.
    pub disliked_tags: BTreeSet<String>,
    /// A thumbs-down session carried one of [`RISK_TAGS`].
    pub risk_flag: bool,
    /// Majority main-set shape among liked sessions; `None` on a tie or no data.
    pub preferred_structure: Option<MainSetStructure>,
    /// Up to two most frequent specific strokes among liked sessions.
    pub preferred_strokes: Vec<Stroke>,
}

impl HistorySummary {
    /// Render the summary as prompt guidance sentences.
    pub fn guidance_lines(&self) -> Vec<String> {
        let mut lines = Vec::new();

        match self.liked_range {
            Some(r) => lines.push(format!("Prefer volume near {r}.")),
            None => lines.push("No positive volume signal available.".to_string()),
        }
        if let Some(r) = self.disliked_range {
            lines.push(format!("Avoid volume near {r} unless strongly required."));
        }
        if !self.liked_tags.is_empty() {
            lines.push(format!("Positive themes: {}.", join_set(&self.liked_tags)));
        }
        if !self.disliked_tags.is_empty() {
            lines.push(format!("Negative themes: {}.", join_set(&self.disliked_tags)));
        }
        if self.risk_flag {
            lines.push(
                "Avoid long hard continuous main sets; prefer intervals instead.".to_string(),
            );
        }
        if let Some(s) = self.preferred_structure {
            lines.push(format!(
                "Liked sessions mostly used a {} main set.",
                s.as_str()
            ));
        }
        if !self.preferred_strokes.is_empty() {
            let strokes: Vec<&str> = self.preferred_strokes.iter().map(|s| s.as_str()).collect();
            lines.push(format!("Liked strokes: {}.", strokes.join(", ")));
        }

        lines
    }
}

fn join_set(tags: &BTreeSet<String>) -> String {
    tags.iter().map(String::as_str).collect::<Vec<_>>().join(", ")
}

/// True when any thumbs-down session carries a risk tag.
pub fn has_risk_feedback(history: &[HistoricSession]) -> bool {
    history
        .iter()
        .filter(|s| s.thumb == Thumb::Down)
        .any(|s| s.normalized_tags().iter().any(|t| RISK_TAGS.contains(&t.as_str())))
}

/// Reduce a session history to guidance signals.
pub fn summarize_history(history: &[HistoricSession]) -> HistorySummary {
    let mut summary = HistorySummary::default();
    let mut interval_votes = 0usize;
    let mut continuous_votes = 0usize;
    let mut stroke_counts: BTreeMap<Stroke, usize> = BTreeMap::new();

    for session in history {
        let tags = session.normalized_tags();
        let distance = session.session_plan.distance_m();

        match session.thumb {
            Thumb::Up => {
                if let Some(d) = distance {
                    summary.liked_range = DistanceRange::include(summary.liked_range, d);
                }
                summary.liked_tags.extend(tags);

                let Some(sections) = session.session_plan.sections.as_ref() else {
                    continue;
                };
                match main_set_structure(sections) {
                    Some(MainSetStructure::Intervals) => interval_votes += 1,
                    Some(MainSetStructure::Continuous) => continuous_votes += 1,
                    None => {}
                }
                for stroke in step_strokes(sections) {
                    if stroke.is_specific() {
                        *stroke_counts.entry(stroke).or_default() += 1;
                    }
                }
            }
            Thumb::Down => {
                if let Some(d) = distance {
                    summary.disliked_range = DistanceRange::include(summary.disliked_range, d);
                }
                if tags.iter().any(|t| RISK_TAGS.contains(&t.as_str())) {
                    summary.risk_flag = true;
                }
                summary.disliked_tags.extend(tags);
            }
        }
    }

    summary.preferred_structure = match interval_votes.cmp(&continuous_votes) {
        std::cmp::Ordering::Greater => Some(MainSetStructure::Intervals),
        std::cmp::Ordering::Less => Some(MainSetStructure::Continuous),
        std::cmp::Ordering::Equal => None,
    };

    // Highest count first; ties fall back to the stroke's declaration order.
    let mut ranked: Vec<(Stroke, usize)> = stroke_counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
    summary.preferred_strokes = ranked.into_iter().take(2).map(|(s, _)| s).collect();

    summary
}

/// Classify a past plan's main set from its raw JSON sections.
fn main_set_structure(sections: &serde_json::Value) -> Option<MainSetStructure> {
    let steps = sections.get("main_set")?.get("steps")?.as_array()?;
    let kinds: Vec<StepKind> = steps
        .iter()
        .filter_map(|s| s.get("kind")?.as_str()?.parse().ok())
        .collect();
    if kinds.is_empty() {
        return None;
    }
    if kinds.iter().all(|k| *k == StepKind::Continuous) {
        Some(MainSetStructure::Continuous)
    } else {
        Some(MainSetStructure::Intervals)
    }
}

/// Every parseable stroke across all three sections of a past plan.
fn step_strokes(sections: &serde_json::Value) -> Vec<Stroke> {
    ["warm_up", "main_set", "cool_down"]
        .iter()
        .filter_map(|name| sections.get(name)?.get("steps")?.as_array())
        .flatten()
        .filter_map(|s| s.get("stroke")?.as_str()?.parse().ok())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::HistoricPlan;
    use serde_json::json;

    fn session(thumb: Thumb, distance: Option<i64>, tags: &[&str]) -> HistoricSession {
        HistoricSession {
            session_plan: HistoricPlan {
                duration_minutes: Some(30),
                estimated_distance_m: distance,
                sections: None,
            },
            thumb,
            tags: tags.iter().map(|t| t.to_string()).collect(),
        }
    }

    fn with_main_set(mut s: HistoricSession, steps: serde_json::Value) -> HistoricSession {
        s.session_plan.sections = Some(json!({
            "warm_up": {"steps": [{"kind": "continuous", "stroke": "freestyle"}]},
            "main_set": {"steps": steps},
            "cool_down": {"steps": [{"kind": "continuous", "stroke": "choice"}]}
        }));
        s
    }

    // -- ranges and tags --

    #[test]
    fn empty_history_has_no_signals() {
        let summary = summarize_history(&[]);
        assert_eq!(summary, HistorySummary::default());
        assert_eq!(
            summary.guidance_lines(),
            vec!["No positive volume signal available."]
        );
    }

    #[test]
    fn partitions_ranges_by_thumb() {
        let history = vec![
            session(Thumb::Up, Some(700), &["fun"]),
            session(Thumb::Up, Some(750), &["Solid "]),
            session(Thumb::Down, Some(900), &["boring"]),
            session(Thumb::Up, None, &[]),
        ];
        let summary = summarize_history(&history);
        assert_eq!(
            summary.liked_range,
            Some(DistanceRange { min_m: 700, max_m: 750 })
        );
        assert_eq!(
            summary.disliked_range,
            Some(DistanceRange { min_m: 900, max_m: 900 })
        );
        assert!(summary.liked_tags.contains("solid"));
        assert!(summary.disliked_tags.contains("boring"));
        assert!(!summary.risk_flag);
    }

    #[test]
    fn risk_flag_only_from_thumbs_down() {
        let liked_long = vec![session(Thumb::Up, Some(900), &["long"])];
        assert!(!summarize_history(&liked_long).risk_flag);
        assert!(!has_risk_feedback(&liked_long));

        let disliked_long = vec![session(Thumb::Down, Some(900), &[" Tiring"])];
        assert!(summarize_history(&disliked_long).risk_flag);
        assert!(has_risk_feedback(&disliked_long));
    }

    // -- structure and strokes --

    #[test]
    fn majority_structure_among_liked_sessions() {
        let history = vec![
            with_main_set(
                session(Thumb::Up, Some(800), &[]),
                json!([{"kind": "intervals", "stroke": "freestyle"}]),
            ),
            with_main_set(
                session(Thumb::Up, Some(800), &[]),
                json!([{"kind": "continuous", "stroke": "backstroke"}, {"kind": "pyramid", "stroke": "backstroke"}]),
            ),
            with_main_set(
                session(Thumb::Up, Some(800), &[]),
                json!([{"kind": "continuous", "stroke": "freestyle"}]),
            ),
            // Disliked sessions never vote.
            with_main_set(
                session(Thumb::Down, Some(800), &[]),
                json!([{"kind": "continuous", "stroke": "butterfly"}]),
            ),
        ];
        let summary = summarize_history(&history);
        assert_eq!(summary.preferred_structure, Some(MainSetStructure::Intervals));
        // freestyle 5 (three warm-ups, two main steps), backstroke 2
        assert_eq!(
            summary.preferred_strokes,
            vec![Stroke::Freestyle, Stroke::Backstroke]
        );
    }

    #[test]
    fn structure_tie_yields_none() {
        let history = vec![
            with_main_set(
                session(Thumb::Up, None, &[]),
                json!([{"kind": "intervals", "stroke": "freestyle"}]),
            ),
            with_main_set(
                session(Thumb::Up, None, &[]),
                json!([{"kind": "continuous", "stroke": "freestyle"}]),
            ),
        ];
        assert_eq!(summarize_history(&history).preferred_structure, None);
    }

    #[test]
    fn mixed_and_choice_strokes_are_not_counted() {
        let history = vec![with_main_set(
            session(Thumb::Up, None, &[]),
            json!([
                {"kind": "intervals", "stroke": "mixed"},
                {"kind": "intervals", "stroke": "mixed"},
                {"kind": "intervals", "stroke": "breaststroke"}
            ]),
        )];
        let summary = summarize_history(&history);
        assert_eq!(
            summary.preferred_strokes,
            vec![Stroke::Freestyle, Stroke::Breaststroke]
        );
    }

    #[test]
    fn malformed_history_sections_are_ignored() {
        let mut s = session(Thumb::Up, Some(600), &[]);
        s.session_plan.sections = Some(json!({"main_set": "not an object"}));
        let summary = summarize_history(&[s]);
        assert_eq!(summary.preferred_structure, None);
        assert!(summary.preferred_strokes.is_empty());
        assert!(summary.liked_range.is_some());
    }

    #[test]
    fn summary_is_order_independent() {
        let mut history = vec![
            session(Thumb::Up, Some(700), &["fun"]),
            session(Thumb::Down, Some(1200), &["long"]),
            with_main_set(
                session(Thumb::Up, Some(650), &["steady"]),
                json!([{"kind": "intervals", "stroke": "backstroke"}]),
            ),
        ];
        let forward = summarize_history(&history);
        history.reverse();
        assert_eq!(summarize_history(&history), forward);
    }

    #[test]
    fn guidance_lines_mention_risk() {
        let history = vec![session(Thumb::Down, Some(900), &["pace-too-fast"])];
        let lines = summarize_history(&history).guidance_lines();
        assert!(lines.iter().any(|l| l.contains("Avoid volume near 900-900m")));
        assert!(lines.iter().any(|l| l.contains("Avoid long hard continuous")));
        assert!(lines.iter().any(|l| l == "Negative themes: pace-too-fast."));
    }
}
