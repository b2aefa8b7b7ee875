//! Question view and one-shot mode against the mock agent.

use std::sync::Arc;
use std::time::Duration;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use serde_json::json;

use pq_client::{Dispatcher, MockTransport};
use pq_console::oneshot::run_oneshot;
use pq_console::{ConsoleContext, ConsoleView, ProgressPresenter, QuestionView};
use pq_session::{DisplayPrefs, Profile};

fn context(mock: &Arc<MockTransport>) -> ConsoleContext {
    ConsoleContext::new(Dispatcher::new(mock.clone()))
}

fn ask(view: &mut QuestionView, text: &str) {
    for c in text.chars() {
        view.handle_key(KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE));
    }
    view.handle_key(KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE));
}

async fn settle(view: &mut QuestionView) {
    for _ in 0..300 {
        view.on_tick();
        if !view.is_pending() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("request did not finish");
}

fn result(view: &QuestionView) -> String {
    view.result_text(100).join("\n")
}

// ─── Question view ───────────────────────────────────────────────────────────

#[tokio::test]
async fn test_result_shows_answer_and_timing() {
    let mock = Arc::new(MockTransport::new());
    mock.push_json(json!({
        "final_answer": "Singapore.",
        "run_id": "r-9",
        "timing_summary": { "planner_llm_ms": 1200, "total_ms": 4200 }
    }));
    let mut view = QuestionView::new(context(&mock), DisplayPrefs::default());

    ask(&mut view, "What is the capital of Singapore?");
    settle(&mut view).await;

    let text = result(&view);
    assert!(text.contains("Q: What is the capital of Singapore?"));
    assert!(text.contains("Singapore."));
    assert!(text.contains("run_id: r-9"));
    assert!(text.contains("Planner LLM: 1.2 s"));
    assert!(text.contains("Synthesis LLM: 0.0 s"));
    assert!(text.contains("Total: 4.2 s"));
    assert!(!text.contains("Tools:"));
    assert!(!text.contains("Raw JSON"));
}

#[tokio::test]
async fn test_function_keys_toggle_panels() {
    let mock = Arc::new(MockTransport::new());
    mock.push_json(json!({ "final_answer": "ok", "run_id": "r-1", "timing_summary": {} }));
    let mut view = QuestionView::new(context(&mock), DisplayPrefs::default());
    ask(&mut view, "q");
    settle(&mut view).await;

    view.handle_key(KeyEvent::new(KeyCode::F(5), KeyModifiers::NONE));
    assert!(result(&view).contains("Raw JSON"));
    assert!(result(&view).contains("\"final_answer\": \"ok\""));

    view.handle_key(KeyEvent::new(KeyCode::F(2), KeyModifiers::NONE));
    view.handle_key(KeyEvent::new(KeyCode::F(4), KeyModifiers::NONE));
    let text = result(&view);
    assert!(!text.contains("Total:"));
    assert!(!text.contains("run_id: r-1"));
}

#[tokio::test]
async fn test_transport_failure_reads_invoke_failed() {
    let mock = Arc::new(MockTransport::new());
    mock.push_connect_failure("connection refused");
    let mut view = QuestionView::new(context(&mock), DisplayPrefs::default());

    ask(&mut view, "q");
    settle(&mut view).await;

    assert!(result(&view).contains("Invoke failed: ConnectError: connection refused"));
}

#[tokio::test]
async fn test_agent_error_suppresses_answer() {
    let mock = Arc::new(MockTransport::new());
    mock.push_json(json!({ "error": "quota exceeded", "final_answer": "hidden" }));
    let mut view = QuestionView::new(context(&mock), DisplayPrefs::default());

    ask(&mut view, "q");
    settle(&mut view).await;

    let text = result(&view);
    assert!(text.contains("Error: quota exceeded"));
    assert!(!text.contains("hidden"));
    assert!(!text.contains("Invoke failed"));
}

#[tokio::test]
async fn test_non_json_body_is_shown_verbatim() {
    let mock = Arc::new(MockTransport::new());
    mock.push_body(502, "Bad gateway");
    let mut view = QuestionView::new(context(&mock), DisplayPrefs::default());

    ask(&mut view, "q");
    settle(&mut view).await;

    assert!(result(&view).contains("Bad gateway"));
}

#[tokio::test]
async fn test_only_latest_exchange_is_kept() {
    let mock = Arc::new(MockTransport::new());
    mock.push_json(json!({ "final_answer": "First answer." }));
    mock.push_json(json!({ "final_answer": "Second answer." }));
    let mut view = QuestionView::new(context(&mock), DisplayPrefs::default());
    let id = view.session().session_id();

    ask(&mut view, "first question");
    settle(&mut view).await;
    ask(&mut view, "second question");
    settle(&mut view).await;
    ask(&mut view, "   ");

    assert_eq!(view.session().messages().len(), 2);
    assert_eq!(view.session().session_id(), id);
    let text = result(&view);
    assert!(text.contains("Q: second question"));
    assert!(text.contains("Second answer."));
    assert!(!text.contains("First answer."));
}

#[tokio::test]
async fn test_wide_glyph_answer_fits_result_width() {
    use unicode_width::UnicodeWidthStr;

    let mock = Arc::new(MockTransport::new());
    mock.push_json(json!({
        "final_answer": "新加坡是一个位于东南亚的城市国家，国会大厦位于市中心。",
        "timing_summary": { "total_ms": 1000 }
    }));
    let mut view = QuestionView::new(context(&mock), DisplayPrefs::default());

    ask(&mut view, "新加坡在哪里？");
    settle(&mut view).await;

    let lines = view.result_text(20);
    assert!(lines.len() > 4);
    assert!(lines.iter().all(|l| l.width() <= 20), "{lines:?}");
}

#[tokio::test]
async fn test_blank_question_warns() {
    let mock = Arc::new(MockTransport::new());
    let mut view = QuestionView::new(context(&mock), DisplayPrefs::default());

    ask(&mut view, "  ");

    assert_eq!(view.warning(), Some("Please enter a question."));
    assert!(!view.is_pending());
    assert!(mock.requests().is_empty());
}

#[tokio::test]
async fn test_progress_label_while_waiting() {
    let mock = Arc::new(MockTransport::new().with_delay(Duration::from_millis(300)));
    let ctx = context(&mock).with_progress(ProgressPresenter::new(
        vec!["Thinking".into()],
        Duration::from_secs(1),
    ));
    let mut view = QuestionView::new(ctx, DisplayPrefs::default());

    ask(&mut view, "q");
    assert!(result(&view).contains("Thinking"));

    ask(&mut view, "again");
    assert_eq!(view.warning(), Some("A request is already in progress."));

    settle(&mut view).await;
    assert_eq!(mock.requests().len(), 1);
}

// ─── One-shot mode ───────────────────────────────────────────────────────────

#[tokio::test]
async fn test_oneshot_prints_answer_and_panels() {
    let mock = Arc::new(MockTransport::new());
    mock.push_json(json!({
        "final_answer": "Singapore.",
        "run_id": "r-2",
        "timing_summary": { "total_ms": 1000 },
        "steps_for_observability": "1. done"
    }));
    let mut out = Vec::new();

    let answered = run_oneshot(
        &context(&mock),
        "capital?",
        DisplayPrefs::default(),
        Some(Profile::new("mp-7", "")),
        &mut out,
    )
    .await
    .unwrap();

    assert!(answered);
    let text = String::from_utf8(out).unwrap();
    assert!(text.starts_with("Singapore.\n"));
    assert!(text.contains("run_id: r-2"));
    assert!(text.contains("Timing details:\n"));
    assert!(text.contains("  Total: 1.0 s"));
    assert!(text.contains("Steps / Observability:\n  1. done"));
    assert_eq!(mock.requests()[0].user_profile_id.as_deref(), Some("mp-7"));
}

#[tokio::test]
async fn test_oneshot_reports_failure() {
    let mock = Arc::new(MockTransport::new());
    mock.push_connect_failure("connection refused");
    let mut out = Vec::new();

    let answered = run_oneshot(&context(&mock), "q", DisplayPrefs::default(), None, &mut out)
        .await
        .unwrap();

    assert!(!answered);
    assert_eq!(
        String::from_utf8(out).unwrap(),
        "Error: ConnectError: connection refused\n"
    );
}
