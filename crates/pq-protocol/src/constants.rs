/// Header carrying the shared secret when one is configured.
pub const SHARED_SECRET_HEADER: &str = "x-shared-secret";

/// Content type of every request body sent to the agent.
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// Key used to wrap a response body that is not a JSON object.
pub const RAW_FIELD: &str = "raw";

/// Shown when the agent returned neither an answer nor any body text.
pub const NO_RESPONSE_PLACEHOLDER: &str = "No response";

/// Prefix of every error turn shown to the user.
pub const ERROR_PREFIX: &str = "Error:";
