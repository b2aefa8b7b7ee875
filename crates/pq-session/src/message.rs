use chrono::{DateTime, Utc};
use serde_json::Value;

use pq_protocol::{TimingSummary, TurnResult, ERROR_PREFIX};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// Annotations carried by a successful assistant turn.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MessageMetadata {
    pub run_id: Option<String>,
    pub timing_summary: Option<TimingSummary>,
    pub steps_for_observability: Option<String>,
    /// Decoded reply object, for the raw JSON panel.
    pub payload: Option<Value>,
}

/// Why an assistant turn carries an error instead of an answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnError {
    /// The agent replied with an `error` field.
    Agent(String),
    /// The request never produced a body (`"<Kind>: <message>"`).
    Transport(String),
}

impl TurnError {
    pub fn detail(&self) -> &str {
        match self {
            TurnError::Agent(detail) | TurnError::Transport(detail) => detail,
        }
    }
}

/// One transcript entry.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub role: Role,
    pub content: String,
    pub metadata: Option<MessageMetadata>,
    pub error: Option<TurnError>,
    pub created_at: DateTime<Utc>,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            metadata: None,
            error: None,
            created_at: Utc::now(),
        }
    }

    pub fn assistant(content: impl Into<String>, metadata: MessageMetadata) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            metadata: Some(metadata),
            error: None,
            created_at: Utc::now(),
        }
    }

    /// Assistant-side error turn. Content is `"Error: <detail>"`; there is no
    /// metadata.
    pub fn error(error: TurnError) -> Self {
        Self {
            role: Role::Assistant,
            content: format!("{} {}", ERROR_PREFIX, error.detail()),
            metadata: None,
            error: Some(error),
            created_at: Utc::now(),
        }
    }

    /// Build the assistant turn for a finished request.
    pub fn from_turn(turn: TurnResult) -> Self {
        match turn {
            TurnResult::Answer(answer) => Self::assistant(
                answer.final_answer,
                MessageMetadata {
                    run_id: answer.run_id,
                    timing_summary: answer.timing_summary,
                    steps_for_observability: answer.steps_for_observability,
                    payload: Some(answer.payload),
                },
            ),
            TurnResult::AgentError(detail) => Self::error(TurnError::Agent(detail)),
            TurnResult::TransportError(detail) => Self::error(TurnError::Transport(detail)),
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pq_protocol::InvokeOutcome;

    #[test]
    fn error_turns_have_no_metadata() {
        let msg = Message::from_turn(TurnResult::AgentError("quota exceeded".into()));
        assert_eq!(msg.role, Role::Assistant);
        assert_eq!(msg.content, "Error: quota exceeded");
        assert!(msg.metadata.is_none());
        assert!(msg.is_error());
    }

    #[test]
    fn transport_failure_content_starts_with_error() {
        let turn = InvokeOutcome::failed("ConnectError", "connection refused").interpret();
        let msg = Message::from_turn(turn);
        assert!(msg.content.starts_with("Error:"));
        assert_eq!(
            msg.error,
            Some(TurnError::Transport("ConnectError: connection refused".into()))
        );
    }

    #[test]
    fn answers_keep_metadata() {
        let outcome = InvokeOutcome::Completed {
            status: 200,
            content_type: "application/json".into(),
            text: r#"{"final_answer":"Singapore.","run_id":"abc-123"}"#.into(),
        };
        let msg = Message::from_turn(outcome.interpret());
        assert_eq!(msg.content, "Singapore.");
        let meta = msg.metadata.expect("metadata");
        assert_eq!(meta.run_id.as_deref(), Some("abc-123"));
        assert!(meta.timing_summary.is_none());
        assert!(meta.payload.is_some());
    }
}
