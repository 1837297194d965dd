//! Properties every accepted plan must satisfy, checked end to end.

use std::sync::Arc;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::{Value, json};

use swimplan_core::model::{StepKind, Thumb};
use swimplan_core::plan::{NormalizeContext, Violation, normalize_text};
use swimplan_core::style::{infer_style, style_score};
use swimplan_core::{
    Effort, FailureCategory, HistoricSession, LlmClient, LlmError, Planner, PlannerError,
    PlannerInput, Style, ValidatedPlan,
};

// ===========================================================================
// Helpers
// ===========================================================================

/// Always answers with the same text.
struct FixedClient {
    reply: String,
    calls: Mutex<usize>,
}

impl FixedClient {
    fn new(reply: String) -> Arc<Self> {
        Arc::new(Self {
            reply,
            calls: Mutex::new(0),
        })
    }
}

#[async_trait]
impl LlmClient for FixedClient {
    fn name(&self) -> &str {
        "fixed"
    }

    async fn complete(&self, _system: &str, _user: &str) -> Result<String, LlmError> {
        *self.calls.lock().unwrap() += 1;
        Ok(self.reply.clone())
    }
}

fn input(value: Value) -> PlannerInput {
    serde_json::from_value(value).unwrap()
}

fn default_request() -> PlannerInput {
    input(json!({"session_requested": {"duration_minutes": 30, "effort": "medium", "requested_tags": []}}))
}

fn fun_request() -> PlannerInput {
    input(json!({"session_requested": {"duration_minutes": 30, "effort": "medium", "requested_tags": ["fun"]}}))
}

fn long_thumbs_down_request() -> PlannerInput {
    input(json!({
        "session_requested": {"duration_minutes": 30, "effort": "hard", "requested_tags": []},
        "historic_sessions": [
            {"session_plan": {"duration_minutes": 40, "estimated_distance_m": 1800}, "thumb": 0, "tags": ["long"]}
        ]
    }))
}

fn step(id: &str, kind: &str, reps: u32, dist: u32, effort: &str) -> Value {
    json!({
        "step_id": id, "kind": kind, "reps": reps, "distance_per_rep_m": dist,
        "stroke": "freestyle", "rest_seconds": null, "effort": effort, "description": "Swim"
    })
}

fn draft(main: Vec<Value>) -> String {
    json!({
        "duration_minutes": 30,
        "sections": {
            "warm_up": {"title": "Warm-Up", "steps": [step("wu-1", "continuous", 1, 300, "easy")]},
            "main_set": {"title": "Main Set", "steps": main},
            "cool_down": {"title": "Cool-Down", "steps": [step("cd-1", "continuous", 1, 150, "easy")]}
        }
    })
    .to_string()
}

async fn run(request: &PlannerInput, reply: String) -> (Result<ValidatedPlan, PlannerError>, usize) {
    let client = FixedClient::new(reply);
    let result = Planner::new(client.clone()).generate(request, Some(7)).await;
    let calls = *client.calls.lock().unwrap();
    (result, calls)
}

fn assert_distance_invariants(plan: &ValidatedPlan) {
    let mut total = 0;
    for (name, section) in plan.sections.iter() {
        let mut sum = 0;
        for step in &section.steps {
            let d = step.distance_m();
            assert!(d > 0 && d % 50 == 0, "{name}.{}: bad step distance {d}", step.step_id);
            sum += d;
        }
        assert_eq!(section.section_distance_m, sum, "{name}: section sum");
        assert!(sum > 0 && sum % 50 == 0, "{name}: bad section distance {sum}");
        total += sum;
    }
    assert_eq!(plan.estimated_distance_m, total);
    assert!(total > 0 && total % 50 == 0);
}

fn invariant_message(err: PlannerError) -> String {
    match err {
        PlannerError::Exhausted(failure) => {
            assert_eq!(failure.category(), FailureCategory::Invariant);
            failure.repair.message
        }
        other => panic!("expected Exhausted, got: {other}"),
    }
}

// ===========================================================================
// Distance invariants
// ===========================================================================

#[tokio::test]
async fn accepted_plans_have_consistent_distances() {
    let ladder = json!({
        "step_id": "main-2", "kind": "pyramid", "reps": 5, "distance_per_rep_m": 50,
        "pyramid_sequence_m": [50, 100, 150, 100, 50],
        "stroke": "mixed", "rest_seconds": 15, "effort": "medium", "description": "Pyramid"
    });
    let reply = draft(vec![step("main-1", "intervals", 6, 100, "hard"), ladder]);
    let (result, calls) = run(&fun_request(), reply).await;
    let plan = result.unwrap();

    assert_eq!(calls, 1);
    assert_distance_invariants(&plan);
    assert_eq!(plan.sections.main_set.section_distance_m, 600 + 450);
    assert_eq!(plan.estimated_distance_m, 300 + 1050 + 150);
}

#[test]
fn normalizer_recomputes_declared_aggregates() {
    let request = default_request();
    let mut value: Value = serde_json::from_str(&draft(vec![step("main-1", "intervals", 4, 100, "medium")])).unwrap();
    value["estimated_distance_m"] = json!(5000);
    value["sections"]["warm_up"]["section_distance_m"] = json!(1000);
    value["sections"]["main_set"]["section_distance_m"] = json!(75);

    let plan = normalize_text(&value.to_string(), NormalizeContext { input: &request, seed: None }).unwrap();
    assert_eq!(plan.sections.warm_up.section_distance_m, 300);
    assert_eq!(plan.sections.main_set.section_distance_m, 400);
    assert_eq!(plan.estimated_distance_m, 850);
}

// ===========================================================================
// Style inference
// ===========================================================================

#[test]
fn style_is_independent_of_history_order() {
    let session = |thumb: u8, tags: &[&str]| -> HistoricSession {
        serde_json::from_value(json!({"session_plan": {}, "thumb": thumb, "tags": tags})).unwrap()
    };
    let history = vec![
        session(1, &["fun"]),
        session(0, &["mixed", "long"]),
        session(1, &["technique"]),
        session(0, &["steady"]),
    ];
    let tags = ["steady"];
    let expected = infer_style(&tags, &history);

    // Every rotation and its reverse.
    for shift in 0..history.len() {
        let mut rotated = history.clone();
        rotated.rotate_left(shift);
        assert_eq!(infer_style(&tags, &rotated), expected);
        rotated.reverse();
        assert_eq!(infer_style(&tags, &rotated), expected);
    }
    assert_eq!(history[1].thumb, Thumb::Down);
}

#[test]
fn reference_scores() {
    let none: [&str; 0] = [];
    assert_eq!(style_score(&none, &[]), 0);
    assert_eq!(infer_style(&none, &[]), Style::Straightforward);
    assert_eq!(style_score(&["fun"], &[]), 2);
    assert_eq!(infer_style(&["fun"], &[]), Style::Varied);
}

#[tokio::test]
async fn straightforward_request_accepts_only_one_signature() {
    let request = default_request();

    let uniform = draft(vec![
        step("main-1", "intervals", 4, 100, "medium"),
        step("main-2", "intervals", 4, 100, "medium"),
    ]);
    let plan = run(&request, uniform).await.0.unwrap();
    let signatures: std::collections::HashSet<_> =
        plan.sections.main_set.steps.iter().map(|s| s.signature()).collect();
    assert_eq!(signatures.len(), 1);

    let mixed = draft(vec![
        step("main-1", "intervals", 4, 100, "medium"),
        step("main-2", "intervals", 4, 100, "hard"),
    ]);
    let (result, calls) = run(&request, mixed).await;
    assert_eq!(calls, 2);
    let message = invariant_message(result.unwrap_err());
    assert!(message.contains("straightforward"), "got: {message}");
}

#[tokio::test]
async fn varied_request_needs_two_main_steps() {
    let request = fun_request();

    let single = draft(vec![step("main-1", "intervals", 8, 100, "medium")]);
    let (result, calls) = run(&request, single).await;
    assert_eq!(calls, 2);
    let message = invariant_message(result.unwrap_err());
    assert!(message.contains("at least 2 main_set steps"), "got: {message}");

    let two = draft(vec![
        step("main-1", "intervals", 4, 100, "medium"),
        step("main-2", "build", 4, 100, "medium"),
    ]);
    let plan = run(&request, two).await.0.unwrap();
    assert!(plan.sections.main_set.steps.len() >= 2);
}

// ===========================================================================
// Safety cap
// ===========================================================================

#[tokio::test]
async fn risk_history_rejects_long_hard_continuous_block() {
    let request = long_thumbs_down_request();

    let unsafe_plan = draft(vec![step("main-1", "continuous", 1, 600, "hard")]);
    let (result, calls) = run(&request, unsafe_plan).await;
    assert_eq!(calls, 2);
    let PlannerError::Exhausted(failure) = result.unwrap_err() else {
        panic!("expected Exhausted");
    };
    assert!(matches!(
        serde_json::from_str::<Value>(failure.repair.raw.as_deref().unwrap()),
        Ok(Value::Object(_))
    ));
    assert!(failure.repair.message.contains("500m"), "got: {}", failure.repair.message);

    let at_cap = draft(vec![step("main-1", "continuous", 1, 500, "hard")]);
    let plan = run(&request, at_cap).await.0.unwrap();
    let main = &plan.sections.main_set.steps[0];
    assert_eq!(main.kind(), StepKind::Continuous);
    assert_eq!(main.effort, Effort::Hard);
    assert_eq!(main.distance_m(), 500);
}

#[tokio::test]
async fn without_risk_history_long_hard_block_is_allowed() {
    let request = input(json!({"session_requested": {"duration_minutes": 30, "effort": "hard", "requested_tags": []}}));
    let plan = run(&request, draft(vec![step("main-1", "continuous", 1, 800, "hard")]))
        .await
        .0
        .unwrap();
    assert_eq!(plan.sections.main_set.section_distance_m, 800);
}

#[test]
fn unsafe_block_violation_is_scoped_to_the_step() {
    let v = Violation::UnsafeContinuousBlock {
        step_id: "main-3".to_string(),
        distance: 600,
    };
    assert!(v.to_string().starts_with("main_set.main-3:"));
}
