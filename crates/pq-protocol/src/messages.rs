use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::ProtocolError;

/// Body of the single POST sent to the agent endpoint.
///
/// Optional fields are left out of the JSON entirely when unset; the agent
/// treats a missing `run_id` as "generate one server-side".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentRequest {
    pub query: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_profile_id: Option<String>,
}

impl AgentRequest {
    /// Build a request for a query that has already been validated.
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            run_id: None,
            user_profile_id: None,
        }
    }

    /// Attach a run id. Candidates that are not UUIDs are dropped so the
    /// field never reaches the wire malformed.
    pub fn with_run_id(mut self, candidate: &str) -> Self {
        self.run_id = parse_run_id(candidate).ok();
        self
    }

    /// Attach a freshly generated v4 run id.
    pub fn with_fresh_run_id(self) -> Self {
        let run_id = Uuid::new_v4().to_string();
        self.with_run_id(&run_id)
    }

    /// Attach the selected display profile, if any.
    pub fn with_profile(mut self, profile_id: Option<&str>) -> Self {
        self.user_profile_id = profile_id
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(str::to_string);
        self
    }

    /// Encode the request as the JSON body bytes.
    pub fn to_body(&self) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(self).map_err(|e| ProtocolError::Serialization(e.to_string()))
    }
}

/// Validate a run id candidate as a UUID and return its canonical
/// hyphenated lowercase form.
pub fn parse_run_id(candidate: &str) -> Result<String, ProtocolError> {
    let trimmed = candidate.trim();
    Uuid::parse_str(trimmed)
        .map(|id| id.hyphenated().to_string())
        .map_err(|e| ProtocolError::InvalidRunId(format!("'{trimmed}': {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_omits_unset_optionals() {
        let body = AgentRequest::new("hello").to_body().unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json, serde_json::json!({ "query": "hello" }));
    }

    #[test]
    fn malformed_run_id_is_dropped() {
        let req = AgentRequest::new("q").with_run_id("abc-123");
        assert_eq!(req.run_id, None);

        // Long enough to pass a length check, still not a UUID.
        let req = AgentRequest::new("q").with_run_id(&"x".repeat(36));
        assert_eq!(req.run_id, None);
    }

    #[test]
    fn valid_run_id_is_canonicalized() {
        let req = AgentRequest::new("q").with_run_id(" 67E55044-10B1-426F-9247-BB680E5FE0C8 ");
        assert_eq!(
            req.run_id.as_deref(),
            Some("67e55044-10b1-426f-9247-bb680e5fe0c8")
        );
    }

    #[test]
    fn fresh_run_ids_differ() {
        let a = AgentRequest::new("q").with_fresh_run_id();
        let b = AgentRequest::new("q").with_fresh_run_id();
        assert!(a.run_id.is_some());
        assert_ne!(a.run_id, b.run_id);
    }

    #[test]
    fn blank_profile_is_not_sent() {
        let req = AgentRequest::new("q").with_profile(Some("   "));
        assert_eq!(req.user_profile_id, None);

        let req = AgentRequest::new("q").with_profile(Some("mp-1"));
        let json: serde_json::Value = serde_json::from_slice(&req.to_body().unwrap()).unwrap();
        assert_eq!(json["user_profile_id"], "mp-1");
    }
}
