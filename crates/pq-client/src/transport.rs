//! Transport to the agent endpoint.
//!
//! One POST per invocation, JSON body, optional shared-secret header. The
//! transport returns whatever came back (status, content type, body text)
//! and leaves decoding to the interpreter. Failures are returned as-is; there
//! are no retries.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use reqwest::header::{HeaderValue, CONTENT_TYPE};
use reqwest::Url;
use thiserror::Error;

use pq_protocol::{AgentRequest, ProtocolError, JSON_CONTENT_TYPE, SHARED_SECRET_HEADER};

use crate::secret::SharedSecret;

pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(460);

/// Everything the agent sent back, undecoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub content_type: String,
    pub body: String,
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("invalid endpoint '{url}': {reason}")]
    InvalidEndpoint { url: String, reason: String },

    #[error("{0}")]
    Connect(String),

    #[error("{0}")]
    Timeout(String),

    #[error("{0}")]
    Request(String),

    #[error("{0}")]
    Body(String),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

impl TransportError {
    /// Stable name of the failure class, shown before the message in
    /// user-visible errors (`"ConnectError: ..."`).
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidEndpoint { .. } => "InvalidEndpoint",
            Self::Connect(_) => "ConnectError",
            Self::Timeout(_) => "Timeout",
            Self::Request(_) => "RequestError",
            Self::Body(_) => "BodyError",
            Self::Protocol(_) => "ProtocolError",
        }
    }
}

/// Sends one request to the agent and returns its raw reply.
///
/// Implementations back the dispatcher; the HTTP one talks to the real
/// endpoint and [`crate::MockTransport`] serves scripted replies.
pub trait AgentTransport: Send + Sync {
    fn invoke<'a>(
        &'a self,
        request: &'a AgentRequest,
    ) -> Pin<Box<dyn Future<Output = Result<RawResponse, TransportError>> + Send + 'a>>;

    /// Short description for logs and the status panel.
    fn describe(&self) -> String;
}

/// Configuration for [`HttpTransport`].
#[derive(Debug, Clone)]
pub struct HttpTransportConfig {
    pub endpoint: String,
    pub shared_secret: Option<SharedSecret>,
    /// When false, invalid TLS certificates are accepted.
    pub verify_tls: bool,
    pub connect_timeout: Duration,
    /// Whole-request timeout. Agent synthesis is slow; keep this generous.
    pub request_timeout: Duration,
}

impl HttpTransportConfig {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            shared_secret: None,
            verify_tls: true,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

/// reqwest-backed transport.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    endpoint: Url,
    shared_secret: Option<SharedSecret>,
    http: reqwest::Client,
}

impl HttpTransport {
    pub fn new(config: HttpTransportConfig) -> Result<Self, TransportError> {
        let endpoint = parse_endpoint(&config.endpoint)?;

        if !config.verify_tls {
            tracing::warn!(
                endpoint = %endpoint,
                "TLS certificate verification is disabled for the agent endpoint"
            );
        }

        let http = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout)
            .danger_accept_invalid_certs(!config.verify_tls)
            .build()
            .map_err(|e| TransportError::Request(error_chain(&e)))?;

        Ok(Self {
            endpoint,
            shared_secret: config.shared_secret,
            http,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    async fn send(&self, request: &AgentRequest) -> Result<RawResponse, TransportError> {
        let body = request.to_body()?;

        let mut builder = self
            .http
            .post(self.endpoint.clone())
            .header(CONTENT_TYPE, JSON_CONTENT_TYPE)
            .body(body);

        if let Some(secret) = &self.shared_secret {
            let mut value = HeaderValue::from_str(secret.expose()).map_err(|e| {
                TransportError::Request(format!("shared secret is not a valid header value: {e}"))
            })?;
            value.set_sensitive(true);
            builder = builder.header(SHARED_SECRET_HEADER, value);
        }

        tracing::debug!(
            endpoint = %self.endpoint,
            run_id = ?request.run_id,
            profile = ?request.user_profile_id,
            secret = ?self.shared_secret.as_ref().map(SharedSecret::fingerprint),
            "Posting query to agent"
        );

        let response = builder.send().await.map_err(classify)?;
        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        let body = response.text().await.map_err(classify)?;

        Ok(RawResponse {
            status,
            content_type,
            body,
        })
    }
}

impl AgentTransport for HttpTransport {
    fn invoke<'a>(
        &'a self,
        request: &'a AgentRequest,
    ) -> Pin<Box<dyn Future<Output = Result<RawResponse, TransportError>> + Send + 'a>> {
        Box::pin(self.send(request))
    }

    fn describe(&self) -> String {
        format!("POST {}", self.endpoint)
    }
}

fn parse_endpoint(raw: &str) -> Result<Url, TransportError> {
    let trimmed = raw.trim();
    let invalid = |reason: String| TransportError::InvalidEndpoint {
        url: trimmed.to_string(),
        reason,
    };
    if trimmed.is_empty() {
        return Err(invalid("endpoint URL is empty".to_string()));
    }
    let url = Url::parse(trimmed).map_err(|e| invalid(e.to_string()))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(invalid(format!("unsupported scheme '{other}'"))),
    }
}

fn classify(error: reqwest::Error) -> TransportError {
    let message = error_chain(&error);
    if error.is_timeout() {
        TransportError::Timeout(message)
    } else if error.is_connect() {
        TransportError::Connect(message)
    } else if error.is_body() || error.is_decode() {
        TransportError::Body(message)
    } else {
        TransportError::Request(message)
    }
}

/// reqwest's top-level message hides the cause; append the source chain.
fn error_chain(error: &(dyn std::error::Error + 'static)) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_must_be_http() {
        assert!(matches!(
            HttpTransport::new(HttpTransportConfig::new("   ")),
            Err(TransportError::InvalidEndpoint { .. })
        ));
        assert!(matches!(
            HttpTransport::new(HttpTransportConfig::new("ftp://agent.example.com")),
            Err(TransportError::InvalidEndpoint { .. })
        ));
        assert!(matches!(
            HttpTransport::new(HttpTransportConfig::new("not a url")),
            Err(TransportError::InvalidEndpoint { .. })
        ));
    }

    #[test]
    fn endpoint_is_kept_verbatim() {
        let transport = HttpTransport::new(HttpTransportConfig::new(
            " https://agent.example.com/prod/invoke ",
        ))
        .expect("transport");
        assert_eq!(
            transport.endpoint().as_str(),
            "https://agent.example.com/prod/invoke"
        );
        assert_eq!(transport.describe(), "POST https://agent.example.com/prod/invoke");
    }

    #[test]
    fn error_kinds_are_stable() {
        assert_eq!(TransportError::Connect("x".into()).kind(), "ConnectError");
        assert_eq!(TransportError::Timeout("x".into()).kind(), "Timeout");
        assert_eq!(
            TransportError::Protocol(ProtocolError::Serialization("x".into())).kind(),
            "ProtocolError"
        );
    }
}
