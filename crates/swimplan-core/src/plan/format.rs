//! Canonical plain-text rendering of a plan.

use std::fmt::Write;

use super::types::{Plan, SectionName, Step, StepShape};
use crate::model::StepKind;

fn heading(name: SectionName) -> &'static str {
    match name {
        SectionName::WarmUp => "WARM-UP",
        SectionName::MainSet => "MAIN SET",
        SectionName::CoolDown => "COOL-DOWN",
    }
}

/// Render a plan as one block per section, one line per step.
///
/// ```text
/// 30 min, 1300m
///
/// WARM-UP (300m)
///   300m freestyle easy
/// ```
pub fn plan_to_text(plan: &Plan) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} min, {}m", plan.duration_minutes, plan.estimated_distance_m);

    for (name, section) in plan.sections.iter() {
        out.push('\n');
        let _ = writeln!(out, "{} ({}m)", heading(name), section.section_distance_m);
        for step in &section.steps {
            out.push_str("  ");
            out.push_str(&step_line(step));
            if name == SectionName::MainSet {
                if let Some(title) = description_title(&step.description) {
                    out.push_str(" - ");
                    out.push_str(title);
                }
            }
            out.push('\n');
        }
    }

    out
}

/// One rendered step, without its description.
pub fn step_line(step: &Step) -> String {
    let mut line = match &step.shape {
        StepShape::Repeat { .. } if step.kind() == StepKind::Continuous => {
            format!("{}m {} {}", step.distance_m(), step.stroke, step.effort)
        }
        StepShape::Repeat {
            reps,
            distance_per_rep_m,
            ..
        } => format!("{reps} x {distance_per_rep_m}m {} {}", step.stroke, step.effort),
        StepShape::Ladder { sequence_m, .. } => {
            let rungs: Vec<String> = sequence_m.iter().map(u32::to_string).collect();
            format!("{} {}m {} {}", step.kind(), rungs.join("/"), step.stroke, step.effort)
        }
    };

    if step.kind() != StepKind::Continuous {
        if let Some(rest) = step.rest_seconds {
            let _ = write!(line, " @ {rest}s rest");
        }
    }
    if step.hypoxic {
        line.push_str(" (hypoxic)");
    }
    line
}

/// Text before the first `:` or `.` of a description, if any remains.
fn description_title(description: &str) -> Option<&str> {
    let end = description.find([':', '.']).unwrap_or(description.len());
    let title = description[..end].trim();
    (!title.is_empty()).then_some(title)
}
