use pq_protocol::*;
use serde_json::json;

// ─── Fully populated reply ───────────────────────────────────────────────────

#[test]
fn test_full_reply_renders_each_field_unchanged() {
    let body = json!({
        "final_answer": "The Bill passed its second reading.",
        "run_id": "5b0f3c1e-8a4d-4e44-9d6b-0f1c2d3e4f50",
        "timing_summary": {
            "planner_llm_ms": 800,
            "synthesis_llm_ms": 2600,
            "tools_ms": { "hansard_search": 650, "votes_lookup": 150 },
            "total_ms": 4200
        },
        "steps_for_observability": "plan -> hansard_search -> votes_lookup -> synthesis"
    })
    .to_string();

    let answer = match interpret(&body) {
        Interpretation::Answer(answer) => answer,
        other => panic!("expected an answer, got {other:?}"),
    };

    assert_eq!(answer.final_answer, "The Bill passed its second reading.");
    assert_eq!(
        answer.run_id.as_deref(),
        Some("5b0f3c1e-8a4d-4e44-9d6b-0f1c2d3e4f50")
    );
    assert_eq!(
        answer.steps_for_observability.as_deref(),
        Some("plan -> hansard_search -> votes_lookup -> synthesis")
    );

    let timing = answer.timing_summary.expect("timing present");
    assert_eq!(
        timing.panel_lines(),
        vec![
            "Planner LLM: 0.8 s",
            "Synthesis LLM: 2.6 s",
            "Tools:",
            "  • hansard_search: 0.65 s",
            "  • votes_lookup: 0.15 s",
            "Total: 4.2 s",
        ]
    );

    // Interpreting the same body twice yields the same rendering.
    assert_eq!(interpret(&body), interpret(&body));
}

// ─── Error replies ───────────────────────────────────────────────────────────

#[test]
fn test_error_reply_never_populates_answer_fields() {
    for body in [
        json!({ "error": "boom" }),
        json!({ "error": null, "final_answer": "x" }),
        json!({ "error": "boom", "timing_summary": { "total_ms": 1 } }),
        json!({ "error": 3, "steps_for_observability": "s" }),
    ] {
        match interpret(&body.to_string()) {
            Interpretation::Failure { .. } => {}
            Interpretation::Answer(a) => panic!("error body produced an answer: {a:?}"),
        }
    }
}

// ─── Partial timing ──────────────────────────────────────────────────────────

#[test]
fn test_partial_timing_defaults_to_zero() {
    let body = json!({ "final_answer": "ok", "timing_summary": {} }).to_string();
    let Interpretation::Answer(answer) = interpret(&body) else {
        panic!("expected answer");
    };
    let timing = answer.timing_summary.expect("timing key present");
    assert_eq!(timing.total_line(), "Total: 0.0 s");
    assert_eq!(timing.panel_lines().len(), 3);
}

#[test]
fn test_capital_of_singapore_example() {
    let outcome = InvokeOutcome::Completed {
        status: 200,
        content_type: "application/json".to_string(),
        text: r#"{"final_answer": "Singapore.", "run_id": "abc-123", "timing_summary": {"total_ms": 1000}}"#
            .to_string(),
    };
    let TurnResult::Answer(answer) = outcome.interpret() else {
        panic!("expected answer");
    };
    assert_eq!(answer.final_answer, "Singapore.");
    assert_eq!(answer.run_id.as_deref(), Some("abc-123"));
    assert_eq!(
        answer.timing_summary.expect("timing").total_line(),
        "Total: 1.0 s"
    );
}
