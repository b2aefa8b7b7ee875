//! Response interpretation: raw body text in, structured turn fields out.
//!
//! The agent's status code is never inspected. Whatever body comes back is
//! decoded as JSON when possible and wrapped as `{"raw": <text>}` otherwise,
//! so a malformed reply still renders instead of failing the turn.

use serde_json::{Map, Value};

use crate::constants::{NO_RESPONSE_PLACEHOLDER, RAW_FIELD};
use crate::timing::TimingSummary;

/// The successful fields of one agent reply.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentAnswer {
    pub final_answer: String,
    pub run_id: Option<String>,
    pub timing_summary: Option<TimingSummary>,
    pub steps_for_observability: Option<String>,
    /// The decoded (or raw-wrapped) object, kept for the raw JSON panel.
    pub payload: Value,
}

/// Result of interpreting a response body.
#[derive(Debug, Clone, PartialEq)]
pub enum Interpretation {
    Answer(AgentAnswer),
    /// The body carried an `error` key; nothing else is rendered.
    Failure { error: String },
}

/// What the background dispatch hands back to the view, written exactly once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvokeOutcome {
    Completed {
        status: u16,
        content_type: String,
        text: String,
    },
    Failed {
        /// `"<Kind>: <message>"`
        error: String,
    },
}

/// A finished turn, ready for the session store and the views.
#[derive(Debug, Clone, PartialEq)]
pub enum TurnResult {
    Answer(AgentAnswer),
    /// Application-level `error` reported by the agent.
    AgentError(String),
    /// Connection, timeout or TLS failure before any body was read.
    TransportError(String),
}

impl InvokeOutcome {
    pub fn failed(kind: &str, message: impl std::fmt::Display) -> Self {
        Self::Failed {
            error: format!("{kind}: {message}"),
        }
    }

    pub fn interpret(&self) -> TurnResult {
        match self {
            Self::Failed { error } => TurnResult::TransportError(error.clone()),
            Self::Completed { text, .. } => match interpret(text) {
                Interpretation::Answer(answer) => TurnResult::Answer(answer),
                Interpretation::Failure { error } => TurnResult::AgentError(error),
            },
        }
    }
}

/// Decode a body strictly as a JSON object, wrapping anything else.
pub fn decode_payload(body: &str) -> Value {
    match serde_json::from_str::<Value>(body) {
        Ok(Value::Object(map)) => Value::Object(map),
        _ => {
            let mut map = Map::new();
            map.insert(RAW_FIELD.to_string(), Value::String(body.to_string()));
            Value::Object(map)
        }
    }
}

/// Interpret a response body. Pure; never fails.
pub fn interpret(body: &str) -> Interpretation {
    let payload = decode_payload(body);

    if let Some(error) = payload.get("error") {
        return Interpretation::Failure {
            error: value_text(error),
        };
    }

    let final_answer = match payload.get("final_answer").and_then(Value::as_str) {
        Some(answer) => answer.to_string(),
        None if !body.trim().is_empty() => body.to_string(),
        None => NO_RESPONSE_PLACEHOLDER.to_string(),
    };

    let run_id = payload
        .get("run_id")
        .filter(|v| !v.is_null())
        .map(value_text);

    let timing_summary = payload
        .get("timing_summary")
        .filter(|v| !v.is_null())
        .map(TimingSummary::from_value);

    let steps_for_observability = payload
        .get("steps_for_observability")
        .filter(|v| !v.is_null())
        .map(value_text);

    Interpretation::Answer(AgentAnswer {
        final_answer,
        run_id,
        timing_summary,
        steps_for_observability,
        payload,
    })
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
