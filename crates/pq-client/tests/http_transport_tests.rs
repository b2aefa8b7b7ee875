//! HTTP transport tests against an in-process axum backend.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::routing::post;
use axum::Router;

use pq_client::{
    AgentTransport, HttpTransport, HttpTransportConfig, SharedSecret, TransportError,
};
use pq_protocol::AgentRequest;

#[derive(Debug, Clone, Default)]
struct Captured {
    content_type: Option<String>,
    secret: Option<String>,
    body: Option<serde_json::Value>,
}

#[derive(Clone)]
struct Backend {
    captured: Arc<Mutex<Captured>>,
    status: StatusCode,
    reply: String,
    delay: Duration,
}

async fn invoke(
    State(backend): State<Backend>,
    headers: HeaderMap,
    body: String,
) -> (StatusCode, [(header::HeaderName, &'static str); 1], String) {
    {
        let mut captured = backend.captured.lock().unwrap();
        captured.content_type = headers
            .get(header::CONTENT_TYPE)
            .map(|v| v.to_str().unwrap().to_string());
        captured.secret = headers
            .get("x-shared-secret")
            .map(|v| v.to_str().unwrap().to_string());
        captured.body = serde_json::from_str(&body).ok();
    }
    if !backend.delay.is_zero() {
        tokio::time::sleep(backend.delay).await;
    }
    (
        backend.status,
        [(header::CONTENT_TYPE, "application/json")],
        backend.reply.clone(),
    )
}

async fn spawn_backend(
    status: StatusCode,
    reply: &str,
    delay: Duration,
) -> (String, Arc<Mutex<Captured>>) {
    let captured = Arc::new(Mutex::new(Captured::default()));
    let backend = Backend {
        captured: captured.clone(),
        status,
        reply: reply.to_string(),
        delay,
    };
    let app = Router::new().route("/invoke", post(invoke)).with_state(backend);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{addr}/invoke"), captured)
}

// ─── Wire contract ───────────────────────────────────────────────────────────

#[tokio::test]
async fn test_posts_json_with_shared_secret() {
    let (url, captured) =
        spawn_backend(StatusCode::OK, r#"{"final_answer":"ok"}"#, Duration::ZERO).await;

    let mut config = HttpTransportConfig::new(url);
    config.shared_secret = SharedSecret::new("s3cret");
    let transport = HttpTransport::new(config).unwrap();

    let request = AgentRequest::new("Who chairs the committee?")
        .with_run_id("0b5a52a0-3f8e-4d7e-9a55-3b1c1f0e2d11")
        .with_profile(Some("mp-7"));
    let response = transport.invoke(&request).await.unwrap();

    assert_eq!(response.status, 200);
    assert_eq!(response.content_type, "application/json");
    assert_eq!(response.body, r#"{"final_answer":"ok"}"#);

    let captured = captured.lock().unwrap().clone();
    assert_eq!(captured.content_type.as_deref(), Some("application/json"));
    assert_eq!(captured.secret.as_deref(), Some("s3cret"));
    assert_eq!(
        captured.body,
        Some(serde_json::json!({
            "query": "Who chairs the committee?",
            "run_id": "0b5a52a0-3f8e-4d7e-9a55-3b1c1f0e2d11",
            "user_profile_id": "mp-7"
        }))
    );
}

#[tokio::test]
async fn test_no_secret_header_when_unset() {
    let (url, captured) = spawn_backend(StatusCode::OK, "{}", Duration::ZERO).await;
    let transport = HttpTransport::new(HttpTransportConfig::new(url)).unwrap();

    transport.invoke(&AgentRequest::new("q")).await.unwrap();

    let captured = captured.lock().unwrap().clone();
    assert_eq!(captured.secret, None);
    assert_eq!(captured.body, Some(serde_json::json!({ "query": "q" })));
}

#[tokio::test]
async fn test_error_status_body_is_returned_unchanged() {
    let (url, _) = spawn_backend(
        StatusCode::INTERNAL_SERVER_ERROR,
        "upstream exploded",
        Duration::ZERO,
    )
    .await;
    let transport = HttpTransport::new(HttpTransportConfig::new(url)).unwrap();

    let response = transport.invoke(&AgentRequest::new("q")).await.unwrap();
    assert_eq!(response.status, 500);
    assert_eq!(response.body, "upstream exploded");
}

// ─── Failures ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_refused_connection_is_connect_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let transport =
        HttpTransport::new(HttpTransportConfig::new(format!("http://{addr}/invoke"))).unwrap();
    let err = transport.invoke(&AgentRequest::new("q")).await.unwrap_err();

    assert!(matches!(err, TransportError::Connect(_)), "got {err:?}");
    assert_eq!(err.kind(), "ConnectError");
}

#[tokio::test]
async fn test_slow_backend_hits_request_timeout() {
    let (url, _) = spawn_backend(StatusCode::OK, "{}", Duration::from_secs(3)).await;

    let mut config = HttpTransportConfig::new(url);
    config.request_timeout = Duration::from_millis(200);
    let transport = HttpTransport::new(config).unwrap();

    let err = transport.invoke(&AgentRequest::new("q")).await.unwrap_err();
    assert!(matches!(err, TransportError::Timeout(_)), "got {err:?}");
}
