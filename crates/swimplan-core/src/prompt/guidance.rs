//! Fixed coaching knowledge the prompt compiler draws on: per-tag hints,
//! effort and style hints, pace bands, section proportions, and the drill
//! override.

use crate::model::Effort;
use crate::style::Style;

// ---------------------------------------------------------------------------
// Tag guidance
// ---------------------------------------------------------------------------

/// Coaching hint per recognised request tag, in lookup order.
pub const TAG_GUIDANCE: [(&str, &str); 17] = [
    (
        "technique",
        "Include drill-oriented or form-focused language, especially in warm_up or early main_set.",
    ),
    (
        "drills",
        "Make the main_set a drill set with one named drill per step.",
    ),
    (
        "speed",
        "Bias the main_set toward shorter interval repeats with firmer effort and controlled rest.",
    ),
    (
        "endurance",
        "Bias toward longer repeats or more continuous aerobic structure, within historically tolerated volume.",
    ),
    (
        "recovery",
        "Use easy pacing, generous rest, and simple structure.",
    ),
    (
        "fun",
        "Use engaging but still clear set descriptions; mild variation is acceptable if compatible with inferred style guidance.",
    ),
    (
        "steady",
        "Prefer repeatable, even-paced aerobic efforts over abrupt pace changes.",
    ),
    (
        "short",
        "Keep the plan efficient and avoid unnecessary extra steps.",
    ),
    (
        "hard",
        "Express intensity through interval density or reduced rest, not excessive volume.",
    ),
    ("easy", "Keep effort controlled and low stress."),
    (
        "freestyle",
        "Prefer freestyle in the main_set where possible.",
    ),
    (
        "backstroke",
        "Feature backstroke in the main_set; keep rests long enough to hold form.",
    ),
    (
        "breaststroke",
        "Feature breaststroke in the main_set with attention to glide and timing.",
    ),
    (
        "butterfly",
        "Use butterfly in short repeats only (50m or less per rep) with full recovery.",
    ),
    ("mixed", "Allow mixed stroke usage where appropriate."),
    (
        "kick",
        "Include at least one kick-focused main_set step; describe it as kick in the description and keep the stroke field to an allowed value.",
    ),
    (
        "hypoxic",
        "Include one main_set step with restricted breathing (set \"hypoxic\": true, rest_seconds >= 20) and say the breathing pattern in the description.",
    ),
];

/// Hints for the requested tags, in request order, or a fallback line.
pub fn tag_hints(tags: &[String]) -> String {
    if tags.is_empty() {
        return "No requested tags supplied.".to_string();
    }
    let hints: Vec<&str> = tags
        .iter()
        .filter_map(|tag| {
            TAG_GUIDANCE
                .iter()
                .find(|(name, _)| *name == tag.as_str())
                .map(|(_, hint)| *hint)
        })
        .collect();
    if hints.is_empty() {
        return "Reflect requested tags in step descriptions and structure where compatible with constraints."
            .to_string();
    }
    hints.join(" ")
}

// ---------------------------------------------------------------------------
// Effort and style
// ---------------------------------------------------------------------------

pub fn effort_hint(effort: Effort) -> &'static str {
    match effort {
        Effort::Easy => "Prioritize relaxed pacing, longer recoveries, and low complexity.",
        Effort::Medium => "Use steady aerobic work with moderate rest and controlled intensity.",
        Effort::Hard => "Increase interval density or reduce rest; avoid excessive volume spikes.",
    }
}

pub fn style_hint(style: Style) -> &'static str {
    match style {
        Style::Varied => {
            "Inferred preferred style is varied. Build a main set with 2-3 distinct steps while preserving schema consistency."
        }
        Style::Straightforward => {
            "Inferred preferred style is straightforward. Keep the main set to one clear pattern."
        }
    }
}

// ---------------------------------------------------------------------------
// Distance
// ---------------------------------------------------------------------------

/// Metres per minute a swimmer covers at an effort, as `(low, high)`.
pub fn pace_band(effort: Effort) -> (u32, u32) {
    match effort {
        Effort::Easy => (25, 35),
        Effort::Medium => (30, 40),
        Effort::Hard => (35, 45),
    }
}

/// Target distance range for a request.
pub fn target_range(duration_minutes: u32, effort: Effort) -> (u64, u64) {
    let (lo, hi) = pace_band(effort);
    let minutes = u64::from(duration_minutes);
    (minutes * u64::from(lo), minutes * u64::from(hi))
}

/// Warm-up and cool-down share of the session, in percent.
fn section_fractions(effort: Effort) -> (u64, u64) {
    match effort {
        Effort::Easy => (25, 15),
        Effort::Medium => (20, 10),
        Effort::Hard => (25, 10),
    }
}

/// Round `numerator / denominator` to the nearest 50, halves up.
fn round_to_50(numerator: u64, denominator: u64) -> u64 {
    let step = 50 * denominator;
    (numerator + step / 2) / step * 50
}

/// Suggested distance per section for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectionSplit {
    pub total_m: u64,
    pub warm_up_m: u64,
    pub main_set_m: u64,
    pub cool_down_m: u64,
}

/// Split the band-midpoint target into section suggestions.
///
/// Every figure is a multiple of 50 and at least 50; the main set takes
/// whatever the warm-up and cool-down leave.
pub fn section_split(duration_minutes: u32, effort: Effort) -> SectionSplit {
    let (lo, hi) = pace_band(effort);
    let midpoint = u64::from(lo + hi) / 2;
    let total_m = round_to_50(u64::from(duration_minutes) * midpoint, 1).max(150);

    let (warm_pct, cool_pct) = section_fractions(effort);
    let warm_up_m = round_to_50(total_m * warm_pct, 100).max(50);
    let cool_down_m = round_to_50(total_m * cool_pct, 100).max(50);
    let main_set_m = total_m.saturating_sub(warm_up_m + cool_down_m).max(50);

    SectionSplit {
        total_m: warm_up_m + main_set_m + cool_down_m,
        warm_up_m,
        main_set_m,
        cool_down_m,
    }
}

// ---------------------------------------------------------------------------
// Structural override
// ---------------------------------------------------------------------------

/// Tags that replace the default main-set shape with a drill set.
pub const DRILL_TAGS: [&str; 2] = ["technique", "drills"];

/// Named drills the override draws from.
pub const DRILL_REPERTOIRE: [&str; 8] = [
    "catch-up",
    "fingertip drag",
    "single-arm",
    "six-kick switch",
    "fist",
    "sculling",
    "zipper",
    "side kick",
];

/// The override block, when a dominant tag asks for one.
pub fn structural_override(tags: &[String], style: Style) -> Option<String> {
    let trigger = tags.iter().find(|t| DRILL_TAGS.contains(&t.as_str()))?;

    let mut block = String::new();
    block.push_str(&format!(
        "The requested tag \"{trigger}\" replaces the default main_set shape.\n"
    ));
    block.push_str("- Do NOT use the default \"N x distance\" interval pattern for the main_set.\n");
    block.push_str(&format!(
        "- Build the main_set from distinct named drills chosen from: {}.\n",
        DRILL_REPERTOIRE.join(", ")
    ));
    block.push_str("- One drill per main_set step; never repeat a drill.\n");
    block.push_str(
        "- Start each main_set description with the drill name followed by a colon.\n",
    );
    match style {
        Style::Straightforward => block.push_str(
            "- Give every drill step the same kind, reps, distance_per_rep_m, stroke, rest_seconds, and effort; only the description changes.\n",
        ),
        Style::Varied => block.push_str("- Use at least 2 drills.\n"),
    }
    Some(block)
}
