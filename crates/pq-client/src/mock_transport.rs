//! Mock transport for testing
//!
//! Serves scripted replies in order. Once the script is exhausted it answers
//! every query with a canned reply echoing the question, which is what
//! `pq-console --mock` uses to demo the interface without a backend.

use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::Mutex;
use std::time::Duration;

use serde_json::json;

use pq_protocol::{AgentRequest, JSON_CONTENT_TYPE};

use crate::transport::{AgentTransport, RawResponse, TransportError};

/// One scripted reply.
#[derive(Debug, Clone)]
pub enum MockReply {
    Body { status: u16, body: String },
    ConnectFailure(String),
    Timeout,
}

/// Scripted transport that also records every request it receives.
#[derive(Debug, Default)]
pub struct MockTransport {
    replies: Mutex<VecDeque<MockReply>>,
    received: Mutex<Vec<AgentRequest>>,
    delay: Duration,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay every reply, so progress indicators have something to show.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn push(&self, reply: MockReply) -> &Self {
        lock(&self.replies).push_back(reply);
        self
    }

    pub fn push_json(&self, value: serde_json::Value) -> &Self {
        self.push(MockReply::Body {
            status: 200,
            body: value.to_string(),
        })
    }

    pub fn push_body(&self, status: u16, body: impl Into<String>) -> &Self {
        self.push(MockReply::Body {
            status,
            body: body.into(),
        })
    }

    pub fn push_connect_failure(&self, message: impl Into<String>) -> &Self {
        self.push(MockReply::ConnectFailure(message.into()))
    }

    /// Fail the next request as if the whole-request timeout elapsed.
    pub fn push_timeout(&self) -> &Self {
        self.push(MockReply::Timeout)
    }

    /// Requests received so far, oldest first.
    pub fn requests(&self) -> Vec<AgentRequest> {
        lock(&self.received).clone()
    }

    fn canned_reply(request: &AgentRequest) -> MockReply {
        let body = json!({
            "final_answer": format!("(mock agent) You asked: {}", request.query),
            "run_id": request.run_id.clone().unwrap_or_default(),
            "timing_summary": {
                "planner_llm_ms": 400,
                "synthesis_llm_ms": 900,
                "tools_ms": { "mock_search": 150 },
                "total_ms": 1450
            },
            "steps_for_observability": "1. plan\n2. mock_search\n3. synthesise"
        });
        MockReply::Body {
            status: 200,
            body: body.to_string(),
        }
    }
}

impl AgentTransport for MockTransport {
    fn invoke<'a>(
        &'a self,
        request: &'a AgentRequest,
    ) -> Pin<Box<dyn Future<Output = Result<RawResponse, TransportError>> + Send + 'a>> {
        Box::pin(async move {
            lock(&self.received).push(request.clone());
            let reply = lock(&self.replies)
                .pop_front()
                .unwrap_or_else(|| Self::canned_reply(request));

            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }

            match reply {
                MockReply::Body { status, body } => Ok(RawResponse {
                    status,
                    content_type: JSON_CONTENT_TYPE.to_string(),
                    body,
                }),
                MockReply::ConnectFailure(message) => Err(TransportError::Connect(message)),
                MockReply::Timeout => Err(TransportError::Timeout(
                    "operation timed out".to_string(),
                )),
            }
        })
    }

    fn describe(&self) -> String {
        "mock agent (offline)".to_string()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
