//! HTTP transport and session tests against a local mock chat service

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use parley_core::*;
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Clone, Default)]
struct Captured {
    bodies: Arc<Mutex<Vec<Value>>>,
}

async fn serve(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}/api", addr)
}

fn transport_for(base_url: &str, timeout: Duration) -> HttpTransport {
    let config = ClientConfig::default()
        .with_base_url(base_url)
        .unwrap()
        .with_timeout(timeout)
        .unwrap();
    HttpTransport::new(config).unwrap()
}

fn request(message: &str) -> ChatRequest {
    ChatRequest {
        message: message.to_string(),
        history: Vec::new(),
        conversation_id: Some("conv-test".to_string()),
    }
}

async fn echo_chat(State(captured): State<Captured>, Json(body): Json<Value>) -> Json<Value> {
    captured.bodies.lock().unwrap().push(body.clone());
    Json(json!({
        "message": "It's a one-year program.",
        "thinking": "searched program pages",
        "tool_calls": [{"name": "ai_program_search", "parameters": {"query": body["message"]}, "result": "ok"}]
    }))
}

#[tokio::test]
async fn post_sends_expected_body_and_normalizes_reply() {
    let captured = Captured::default();
    let router = Router::new()
        .route("/api/chat", post(echo_chat))
        .with_state(captured.clone());
    let base = serve(router).await;
    let transport = transport_for(&base, Duration::from_secs(5));

    let reply = transport.post(&request("What is the AI MEng program?")).await.unwrap();

    assert_eq!(reply.content.as_deref(), Some("It's a one-year program."));
    assert_eq!(reply.thinking.as_deref(), Some("searched program pages"));
    assert_eq!(reply.tool_calls[0].name, "ai_program_search");
    assert_eq!(
        reply.tool_calls[0].parameters["query"],
        "What is the AI MEng program?"
    );

    let bodies = captured.bodies.lock().unwrap();
    assert_eq!(
        bodies[0],
        json!({
            "message": "What is the AI MEng program?",
            "history": [],
            "conversationId": "conv-test"
        })
    );
}

#[tokio::test]
async fn post_accepts_response_explanation_convention() {
    let router = Router::new().route(
        "/api/chat",
        post(|| async {
            Json(json!({
                "response": "Here are this week's events.",
                "thinking_explanation": "queried the events calendar",
                "tool_results": {"DukeEventsTool": {"status": "success"}},
                "evaluation": {"accuracy": 8, "relevance": 9, "completeness": 7, "clarity": 8, "feedback": "good"},
                "processing_time": 812
            }))
        }),
    );
    let base = serve(router).await;
    let transport = transport_for(&base, Duration::from_secs(5));

    let reply = transport.post(&request("events?")).await.unwrap();

    assert_eq!(reply.content.as_deref(), Some("Here are this week's events."));
    assert_eq!(reply.thinking.as_deref(), Some("queried the events calendar"));
    assert_eq!(reply.tool_calls[0].name, "DukeEventsTool");
    let evaluation = reply.evaluation.unwrap();
    assert_eq!(evaluation.len(), 4);
    assert_eq!(evaluation.get("relevance"), Some(9.0));
}

#[tokio::test]
async fn non_success_status_is_server_error_with_detail() {
    let router = Router::new().route(
        "/api/chat",
        post(|| async {
            (
                StatusCode::BAD_REQUEST,
                Json(json!({"error": "No message provided"})),
            )
        }),
    );
    let base = serve(router).await;
    let transport = transport_for(&base, Duration::from_secs(5));

    let err = transport.post(&request("x")).await.unwrap_err();

    match err {
        ParleyError::Server { status, detail } => {
            assert_eq!(status, 400);
            assert_eq!(detail, "No message provided");
        }
        other => panic!("expected server error, got {other:?}"),
    }
}

#[tokio::test]
async fn server_error_without_json_uses_status_reason() {
    let router = Router::new().route(
        "/api/chat",
        post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom").into_response() }),
    );
    let base = serve(router).await;
    let transport = transport_for(&base, Duration::from_secs(5));

    let err = transport.post(&request("x")).await.unwrap_err();

    assert!(matches!(
        err,
        ParleyError::Server { status: 500, ref detail } if detail == "Internal Server Error"
    ));
}

#[tokio::test]
async fn unparseable_body_is_decode_error() {
    let router = Router::new().route("/api/chat", post(|| async { "<html>oops</html>" }));
    let base = serve(router).await;
    let transport = transport_for(&base, Duration::from_secs(5));

    let err = transport.post(&request("x")).await.unwrap_err();

    assert!(matches!(err, ParleyError::Decode(_)));
    assert!(err.is_transport_failure());
}

#[tokio::test]
async fn slow_service_times_out_as_network_error() {
    let router = Router::new().route(
        "/api/chat",
        post(|| async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Json(json!({"message": "too late"}))
        }),
    );
    let base = serve(router).await;
    let transport = transport_for(&base, Duration::from_millis(200));

    let err = transport.post(&request("x")).await.unwrap_err();

    assert!(matches!(err, ParleyError::Network(_)));
    assert!(err.to_string().contains("timed out"));
}

#[tokio::test]
async fn connection_refused_is_network_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    let transport = transport_for(&format!("http://{}/api", addr), Duration::from_secs(2));

    let err = transport.post(&request("x")).await.unwrap_err();

    assert!(matches!(err, ParleyError::Network(_)));
}

#[tokio::test]
async fn health_reports_status() {
    let router = Router::new().route(
        "/api/health",
        get(|| async { Json(json!({"status": "healthy"})) }),
    );
    let base = serve(router).await;
    let transport = transport_for(&base, Duration::from_secs(5));
    assert!(transport.health().await.unwrap());

    let router = Router::new().route(
        "/api/health",
        get(|| async { StatusCode::SERVICE_UNAVAILABLE }),
    );
    let base = serve(router).await;
    let transport = transport_for(&base, Duration::from_secs(5));
    assert!(!transport.health().await.unwrap());
}

#[tokio::test]
async fn session_round_trip_over_http() {
    let captured = Captured::default();
    let router = Router::new()
        .route("/api/chat", post(echo_chat))
        .with_state(captured.clone());
    let base = serve(router).await;
    let transport = transport_for(&base, Duration::from_secs(5));
    let mut session = ChatSession::new(Arc::new(transport));

    let outcome = session.send("What is the AI MEng program?").await;

    assert_eq!(outcome, SendOutcome::Answered);
    assert!(!session.is_pending());
    let messages = session.messages();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].role, Role::User);
    assert_eq!(messages[0].content, "What is the AI MEng program?");
    assert_eq!(messages[1].role, Role::Assistant);
    assert_eq!(messages[1].content, "It's a one-year program.");
    assert_eq!(
        messages[1].thinking.as_deref(),
        Some("searched program pages")
    );

    let bodies = captured.bodies.lock().unwrap();
    assert_eq!(bodies[0]["conversationId"], session.conversation_id());
}

#[tokio::test]
async fn session_failure_over_http_appends_system_message() {
    let router = Router::new().route(
        "/api/chat",
        post(|| async {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"error": "Failed to process message"})),
            )
        }),
    );
    let base = serve(router).await;
    let transport = transport_for(&base, Duration::from_secs(5));
    let mut session = ChatSession::new(Arc::new(transport));

    let outcome = session.send("hello").await;

    assert_eq!(outcome, SendOutcome::Failed);
    assert!(!session.is_pending());
    assert_eq!(session.messages().len(), 2);
    assert_eq!(session.messages()[1].role, Role::System);
    assert_eq!(session.messages()[1].content, REQUEST_FAILED_TEXT);
    assert!(session
        .last_error()
        .unwrap()
        .contains("Failed to process message"));
}
