//! Tests for the `/query` round trip against a wiremock server.
//!
//! Each test drives the same path the TUI uses: submit through `App`, wait for
//! the finished-query event, hand it to the event handler, then inspect the
//! transcript.

use quickrag_chat::app::App;
use quickrag_chat::ask::AskOutcome;
use quickrag_chat::handler::handle_event;
use quickrag_chat::source::render_source;
use quickrag_chat::transcript::{ChatMessage, ChatRole, Entry};
use quickrag_chat::tui::AppEvent;
use quickrag_chat::{QueryClient, QueryError, Transcript};
use serde_json::json;
use tokio::sync::mpsc;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn app_for(server: &MockServer) -> (App, mpsc::UnboundedReceiver<AppEvent>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let app = App::new(QueryClient::new(&server.uri()), Transcript::new(), tx);
    (app, rx)
}

/// Submit `question` and settle it, returning the terminal bot message.
async fn ask(app: &mut App, rx: &mut mpsc::UnboundedReceiver<AppEvent>, question: &str) -> ChatMessage {
    app.input = question.to_string();
    app.cursor = question.chars().count();
    app.submit_query().expect("question should be submitted");

    let event = rx.recv().await.expect("query task reports back");
    handle_event(app, event);

    app.transcript.messages().last().cloned().expect("bot message")
}

#[tokio::test]
async fn test_answer_with_sources() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/query"))
        .and(header("content-type", "application/json"))
        .and(body_json(json!({"question": "What is the capital of France?"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "answer": "Paris",
            "sources": [
                {"document_name": "geo.txt", "chunk_id": 1, "snippet": "Paris is the capital..."},
                "{\"document_name\":\"a.txt\"}",
                "x".repeat(90)
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let (mut app, mut rx) = app_for(&server);
    let bot = ask(&mut app, &mut rx, "  What is the capital of France?  ").await;

    assert_eq!(bot.role, ChatRole::Bot);
    assert_eq!(bot.text, "Paris");

    let rendered: Vec<_> = bot.sources.iter().map(render_source).collect();
    assert_eq!(rendered.len(), 3);
    assert_eq!(rendered[0].meta, "File: geo.txt (Chunk ID: 1)");
    assert_eq!(rendered[0].preview.as_deref(), Some("Paris is the capital..."));
    assert_eq!(rendered[1].meta, "File: a.txt (Chunk ID: N/A)");
    assert_eq!(rendered[2].meta, format!("{}...", "x".repeat(77)));

    let entries = app.transcript.entries();
    assert_eq!(entries.len(), 2);
    assert!(matches!(&entries[0], Entry::Message(m) if m.role == ChatRole::User && m.text == "What is the capital of France?"));
    assert!(app.input.is_empty());
}

#[tokio::test]
async fn test_http_error_uses_detail() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/query"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"detail": "index not found"})))
        .mount(&server)
        .await;

    let (mut app, mut rx) = app_for(&server);
    let bot = ask(&mut app, &mut rx, "anything").await;

    assert_eq!(bot.text, "Error: HTTP error! status: 404, message: index not found");
    assert_eq!(app.transcript.pending_count(), 0);
}

#[tokio::test]
async fn test_http_error_without_json_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/query"))
        .respond_with(ResponseTemplate::new(500).set_body_string("Internal Server Error"))
        .mount(&server)
        .await;

    let (mut app, mut rx) = app_for(&server);
    let bot = ask(&mut app, &mut rx, "anything").await;

    assert_eq!(bot.text, "Error: HTTP error! status: 500, message: Unknown error occurred");
}

#[tokio::test]
async fn test_malformed_success_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/query"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let client = QueryClient::new(&server.uri());
    let err = client.query("q").await.unwrap_err();
    assert!(matches!(err, QueryError::Decode(_)));

    let (mut app, mut rx) = app_for(&server);
    let bot = ask(&mut app, &mut rx, "q").await;
    assert!(bot.text.starts_with("Error: Invalid response from server: "));
    assert!(bot.sources.is_empty());
}

#[tokio::test]
async fn test_missing_fields_use_defaults() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/query"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&server)
        .await;

    let (mut app, mut rx) = app_for(&server);
    let bot = ask(&mut app, &mut rx, "q").await;

    assert_eq!(bot.text, "No answer from server.");
    assert!(bot.sources.is_empty());
}

#[tokio::test]
async fn test_doc_ids_sent_when_configured() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/query"))
        .and(body_json(json!({"question": "scoped?", "doc_ids": [2, 4]})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"answer": "yes", "sources": []})))
        .expect(1)
        .mount(&server)
        .await;

    let client = QueryClient::new(&server.uri()).with_doc_ids(vec![2, 4]);
    let response = client.query("scoped?").await.unwrap();
    assert_eq!(response.answer_text(), "yes");
}

#[tokio::test]
async fn test_blank_input_sends_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let (mut app, mut rx) = app_for(&server);
    app.input = " \t ".to_string();
    assert!(app.submit_query().is_none());
    assert!(app.transcript.is_empty());
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn test_overlapping_submissions_each_settle_once() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/query"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"answer": "ok"})))
        .expect(3)
        .mount(&server)
        .await;

    let (mut app, mut rx) = app_for(&server);
    for question in ["one", "two", "three"] {
        app.input = question.to_string();
        app.submit_query().unwrap();
    }
    assert_eq!(app.transcript.pending_count(), 3);

    for _ in 0..3 {
        let event = rx.recv().await.unwrap();
        handle_event(&mut app, event);
    }

    assert_eq!(app.transcript.pending_count(), 0);
    let roles: Vec<_> = app.transcript.messages().map(|m| m.role).collect();
    assert_eq!(roles.iter().filter(|r| **r == ChatRole::User).count(), 3);
    assert_eq!(roles.iter().filter(|r| **r == ChatRole::Bot).count(), 3);
    assert_eq!(&roles[..3], &[ChatRole::User, ChatRole::User, ChatRole::User]);
}

#[tokio::test]
async fn test_one_shot_ask_prints_answer_and_sources() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/query"))
        .and(body_json(json!({"question": "capital?"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "answer": "Paris",
            "sources": [{"document_name": "geo.txt", "chunk_id": 1, "snippet": "Paris is the capital..."}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let outcome = quickrag_chat::ask::ask(&QueryClient::new(&server.uri()), " capital? ").await;

    assert_eq!(
        outcome,
        AskOutcome {
            output: "Paris\n\nSources:\n  • File: geo.txt (Chunk ID: 1)\n    Paris is the capital...".to_string(),
            failed: false,
        }
    );
}

#[tokio::test]
async fn test_one_shot_ask_reports_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/query"))
        .respond_with(ResponseTemplate::new(503).set_body_json(json!({"detail": "index rebuilding"})))
        .mount(&server)
        .await;

    let outcome = quickrag_chat::ask::ask(&QueryClient::new(&server.uri()), "anything").await;

    assert!(outcome.failed);
    assert_eq!(outcome.output, "Error: HTTP error! status: 503, message: index rebuilding");
}
