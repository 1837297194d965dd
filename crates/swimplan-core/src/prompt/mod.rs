//! Prompt compilation.
//!
//! Renders the generation instruction and the repair instruction from the
//! request and the derived signals. Both are pure string builders with no
//! clock, randomness, or map iteration order in them, so identical inputs
//! give byte-identical text.
//!
//! Most of the decision priority is advisory prose. Only duration equality,
//! main-set style consistency, and the safety cap are enforced afterwards by
//! [`crate::plan::validate`]; the structural override in particular is not
//! checked.

pub mod guidance;

use crate::history::{HistorySummary, summarize_history};
use crate::model::{Effort, PlannerInput, SessionRequested, StepKind, Stroke};
use crate::style::{Style, infer_style};

use guidance::{effort_hint, section_split, structural_override, style_hint, tag_hints, target_range};

/// System instruction sent with every call.
pub const SYSTEM_INSTRUCTION: &str = "You are a swim session planner. You must return valid JSON matching the provided schema. Do not include markdown, comments, explanations, or extra keys.";

/// Output shape the generator is shown, in both instructions.
pub const SHAPE_EXAMPLE: &str = r#"{
  "plan_id": "uuid",
  "created_at": "ISO-8601 datetime",
  "duration_minutes": 20,
  "estimated_distance_m": 700,
  "sections": {
    "warm_up": {
      "title": "Warm-up",
      "section_distance_m": 200,
      "steps": [
        {
          "step_id": "wu-1",
          "kind": "continuous",
          "reps": 1,
          "distance_per_rep_m": 200,
          "stroke": "freestyle",
          "rest_seconds": null,
          "effort": "easy",
          "description": "Easy relaxed warm-up swim."
        }
      ]
    },
    "main_set": {
      "title": "Main Set",
      "section_distance_m": 400,
      "steps": [
        {
          "step_id": "main-1",
          "kind": "intervals",
          "reps": 8,
          "distance_per_rep_m": 50,
          "stroke": "freestyle",
          "rest_seconds": 20,
          "effort": "hard",
          "description": "Hold a strong, controlled pace across all repeats."
        }
      ]
    },
    "cool_down": {
      "title": "Cool-down",
      "section_distance_m": 100,
      "steps": [
        {
          "step_id": "cd-1",
          "kind": "continuous",
          "reps": 1,
          "distance_per_rep_m": 100,
          "stroke": "choice",
          "rest_seconds": null,
          "effort": "easy",
          "description": "Easy cooldown."
        }
      ]
    }
  }
}"#;

/// Fallback previous output when the first attempt produced no text.
pub const EMPTY_OUTPUT: &str = "<empty>";

/// Fallback failure description when the first attempt produced no message.
pub const UNKNOWN_FAILURE: &str = "unknown validation failure";

/// Everything the generation instruction is compiled from.
#[derive(Debug, Clone)]
pub struct PromptInputs {
    pub request: SessionRequested,
    /// Request-level then global tags, normalized.
    pub tags: Vec<String>,
    pub style: Style,
    pub history: HistorySummary,
}

impl PromptInputs {
    /// Derive the style and history signals from a pipeline input.
    pub fn from_input(input: &PlannerInput) -> Self {
        let tags = input.merged_tags();
        Self {
            request: input.session_requested.clone(),
            style: infer_style(&tags, &input.historic_sessions),
            history: summarize_history(&input.historic_sessions),
            tags,
        }
    }
}

fn list<T: Copy>(values: &[T], as_str: fn(T) -> &'static str) -> String {
    values.iter().map(|v| as_str(*v)).collect::<Vec<_>>().join(", ")
}

/// Compile the first-attempt instruction.
pub fn compile_generation(inputs: &PromptInputs) -> String {
    let request = &inputs.request;
    let duration = request.duration_minutes;
    let effort = request.effort;
    let override_block = structural_override(&inputs.tags, inputs.style);

    let mut prompt = String::with_capacity(8192);
    prompt.push_str("Generate a personalised swim session plan.\n\n");

    // Priority list.
    let mut priorities = vec![
        "Return valid JSON matching the schema exactly.",
        "Match requested duration_minutes.",
    ];
    if override_block.is_some() {
        priorities.push("Follow the STRUCTURAL OVERRIDE.");
    }
    priorities.extend([
        "Match requested effort.",
        "Match inferred session style from requested tags + history.",
        "Use history to prefer previously successful structure and volume.",
        "Apply remaining requested tags where compatible.",
    ]);
    prompt.push_str("DECISION PRIORITY (follow in this order):\n");
    for (i, line) in priorities.iter().enumerate() {
        prompt.push_str(&format!("{}. {line}\n", i + 1));
    }
    prompt.push('\n');

    // Request and derived signals.
    let literal = serde_json::json!({
        "duration_minutes": duration,
        "effort": effort.as_str(),
        "requested_tags": request.requested_tags,
    });
    prompt.push_str(&format!("REQUEST:\n{literal}\n\n"));
    prompt.push_str(&format!("INFERRED STYLE:\n{}\n\n", inputs.style));
    prompt.push_str(&format!(
        "REQUESTED TAGS:\n{}\n{}\n\n",
        serde_json::Value::from(inputs.tags.clone()),
        tag_hints(&inputs.tags)
    ));
    prompt.push_str(&format!(
        "HISTORIC GUIDANCE:\n{}\n\n",
        inputs.history.guidance_lines().join(" ")
    ));
    prompt.push_str(&format!("EFFORT GUIDANCE:\n{}\n\n", effort_hint(effort)));
    prompt.push_str(&format!("STYLE GUIDANCE:\n{}\n\n", style_hint(inputs.style)));
    if let Some(block) = &override_block {
        prompt.push_str("STRUCTURAL OVERRIDE:\n");
        prompt.push_str(block);
        prompt.push('\n');
    }

    // Distance.
    let (lo, hi) = target_range(duration, effort);
    prompt.push_str(&format!(
        "DISTANCE GUIDANCE:\nTarget estimated_distance_m for this request: {lo}-{hi}m (derived from duration={duration} and effort={effort}).\n\n"
    ));
    let split = section_split(duration, effort);
    prompt.push_str(&format!(
        "SECTION PROPORTIONS:\nFor about {}m: warm_up {}m, main_set {}m, cool_down {}m. Adjust if needed, but keep every sum exact.\n\n",
        split.total_m, split.warm_up_m, split.main_set_m, split.cool_down_m
    ));

    push_hard_constraints(&mut prompt, duration);
    push_session_rules(&mut prompt, inputs);

    prompt.push_str("OUTPUT SHAPE EXAMPLE:\n");
    prompt.push_str(SHAPE_EXAMPLE);
    prompt.push_str("\n\nReturn the final JSON object only.");

    tracing::debug!(chars = prompt.len(), style = %inputs.style, "compiled generation prompt");
    prompt
}

fn push_hard_constraints(prompt: &mut String, duration: u32) {
    let ladders: Vec<&str> = StepKind::ALL
        .into_iter()
        .filter(|k| k.is_ladder())
        .map(StepKind::as_str)
        .collect();

    prompt.push_str("HARD CONSTRAINTS:\n");
    for line in [
        "- Return exactly ONE JSON object.",
        "- Do not include markdown.",
        "- Do not include comments.",
        "- Do not include explanations.",
        "- Do not include extra keys.",
        "- Include sections.warm_up, sections.main_set, sections.cool_down.",
        "- Every section must include title, section_distance_m, and steps (at least one step).",
        "- Every step must include step_id, kind, reps, distance_per_rep_m, stroke, rest_seconds, effort, and description.",
    ] {
        prompt.push_str(line);
        prompt.push('\n');
    }
    prompt.push_str(&format!("- duration_minutes must be exactly {duration}.\n"));
    prompt.push_str(&format!(
        "- Step distance is reps x distance_per_rep_m, except for {}: those need \"pyramid_sequence_m\" (one distance per rep, reps equal to its length) and their distance is its sum.\n",
        ladders.join(", ")
    ));
    prompt.push_str("- descending sequences never increase, ascending sequences never decrease, pyramid sequences rise then fall.\n");
    for line in [
        "- Sum of all step distances must equal section_distance_m.",
        "- Sum of all sections must equal estimated_distance_m.",
        "- All distances must be divisible by 50.",
        "- reps must be > 0.",
        "- distance_per_rep_m must be > 0.",
        "- rest_seconds must be null or >= 0.",
        "- Every warm_up and cool_down step must have effort easy.",
        "- \"hypoxic\": true is only allowed on main_set steps, and those need rest_seconds >= 20.",
        "- \"split_instruction\" is optional free text.",
    ] {
        prompt.push_str(line);
        prompt.push('\n');
    }
    prompt.push_str(&format!(
        "- Allowed kind values: {}.\n",
        list(&StepKind::ALL, StepKind::as_str)
    ));
    prompt.push_str(&format!(
        "- Allowed stroke values: {}.\n",
        list(&Stroke::ALL, Stroke::as_str)
    ));
    prompt.push_str(&format!(
        "- Allowed effort values: {}.\n\n",
        list(&Effort::ALL, Effort::as_str)
    ));
}

fn push_session_rules(prompt: &mut String, inputs: &PromptInputs) {
    prompt.push_str("SESSION-SPECIFIC RULES:\n");
    match inputs.style {
        Style::Straightforward => prompt.push_str(
            "- Inferred style is straightforward: every main_set step must share the same kind, reps, distance_per_rep_m, stroke, rest_seconds, and effort.\n",
        ),
        Style::Varied => prompt.push_str(
            "- Inferred style is varied: main_set must contain at least 2 steps, usually 2-3 distinct steps with clear variation.\n",
        ),
    }
    if inputs.history.risk_flag {
        prompt.push_str("- Disliked history mentions pace-too-fast, long, or tiring: no main_set step may be continuous, hard, and longer than 500m.\n");
    }
    prompt.push_str("- For hard effort, increase intensity using interval density or shorter rest, not excessive distance.\n");
    prompt.push_str("- Prefer expressing requested tag intent in the main_set first.\n\n");
}

/// Compile the single repair instruction.
///
/// Carries only the previous output, the failure, and the required shape;
/// the request context is not restated.
pub fn compile_repair(previous_output: &str, failure: &str) -> String {
    let previous = if previous_output.trim().is_empty() {
        EMPTY_OUTPUT
    } else {
        previous_output
    };
    let failure = if failure.trim().is_empty() {
        UNKNOWN_FAILURE
    } else {
        failure
    };

    let mut prompt = String::with_capacity(previous.len() + SHAPE_EXAMPLE.len() + 512);
    prompt.push_str("Your previous response was invalid.\n\n");
    prompt.push_str("TASK:\n");
    prompt.push_str("Return a corrected version of the JSON only.\n");
    prompt.push_str("Do not explain the error.\n");
    prompt.push_str("Do not include markdown.\n");
    prompt.push_str("Do not include any text before or after the JSON.\n\n");
    prompt.push_str(&format!("VALIDATION ERROR:\n{failure}\n\n"));
    prompt.push_str(&format!("PREVIOUS OUTPUT:\n{previous}\n\n"));
    prompt.push_str(&format!("REQUIRED SHAPE:\n{SHAPE_EXAMPLE}\n\n"));
    prompt.push_str("Return one corrected JSON object only.");
    prompt
}
