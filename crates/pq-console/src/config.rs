//! Console configuration.
//!
//! Values are layered low to high: built-in defaults, the TOML file, the
//! `PQ_*` environment variables, then command-line flags.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use pq_client::{HttpTransportConfig, SharedSecret};
use pq_session::{DisplayPrefs, Profile};

use crate::progress::{DEFAULT_INTERVAL, DEFAULT_PHASES};

pub const ENV_CONFIG_PATH: &str = "PQ_CONSOLE_CONFIG";
pub const ENV_AGENT_URL: &str = "PQ_AGENT_URL";
pub const ENV_SHARED_SECRET: &str = "PQ_SHARED_SECRET";
pub const ENV_INTERFACE_TYPE: &str = "PQ_INTERFACE_TYPE";
pub const ENV_SSL_VERIFY: &str = "PQ_SSL_VERIFY";

const CONFIG_DIR_NAME: &str = "pq-console";
const CONFIG_FILE_NAME: &str = "config.toml";
const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 460;
const DEFAULT_VERIFY_TLS: bool = true;
const DEFAULT_INTERFACE_MODE: &str = "chat";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0}")]
    Message(String),

    #[error("unknown interface type: {0}")]
    UnknownInterface(String),

    #[error("failed to read config file '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file '{}': {source}", path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

impl ConfigError {
    fn configuration(message: impl Into<String>) -> Self {
        Self::Message(message.into())
    }
}

/// Which layout the console starts in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterfaceMode {
    Question,
    Chat,
}

impl FromStr for InterfaceMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "question" => Ok(Self::Question),
            "chat" => Ok(Self::Chat),
            _ => Err(ConfigError::UnknownInterface(s.trim().to_string())),
        }
    }
}

impl fmt::Display for InterfaceMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Question => f.write_str("question"),
            Self::Chat => f.write_str("chat"),
        }
    }
}

// ── TOML file ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ConfigFile {
    pub endpoint: EndpointToml,
    pub interface: InterfaceToml,
    pub display: DisplayPrefs,
    pub progress: ProgressToml,
    pub profiles: Vec<Profile>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EndpointToml {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub shared_secret: Option<String>,
    #[serde(default = "default_verify_tls")]
    pub verify_tls: bool,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for EndpointToml {
    fn default() -> Self {
        Self {
            url: None,
            shared_secret: None,
            verify_tls: default_verify_tls(),
            connect_timeout_secs: default_connect_timeout_secs(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct InterfaceToml {
    #[serde(default = "default_interface_mode")]
    pub mode: String,
}

impl Default for InterfaceToml {
    fn default() -> Self {
        Self {
            mode: default_interface_mode(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProgressToml {
    #[serde(default = "default_progress_interval_ms")]
    pub interval_ms: u64,
    #[serde(default = "default_progress_phases")]
    pub phases: Vec<String>,
}

impl Default for ProgressToml {
    fn default() -> Self {
        Self {
            interval_ms: default_progress_interval_ms(),
            phases: default_progress_phases(),
        }
    }
}

fn default_verify_tls() -> bool {
    DEFAULT_VERIFY_TLS
}

fn default_connect_timeout_secs() -> u64 {
    DEFAULT_CONNECT_TIMEOUT_SECS
}

fn default_request_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

fn default_interface_mode() -> String {
    DEFAULT_INTERFACE_MODE.to_string()
}

fn default_progress_interval_ms() -> u64 {
    DEFAULT_INTERVAL.as_millis() as u64
}

fn default_progress_phases() -> Vec<String> {
    DEFAULT_PHASES.iter().map(|p| p.to_string()).collect()
}

impl ConfigFile {
    pub fn parse(raw: &str, path: &Path) -> Result<Self, ConfigError> {
        toml::from_str(raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Read the file at `path`.
    pub fn read(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&raw, path)
    }

    /// Load the config file from the first location that applies:
    /// `--config`, then `$PQ_CONSOLE_CONFIG`, then the per-user config
    /// directory. Only the per-user file may be missing.
    pub fn load(cli_path: Option<&Path>, env_path: Option<&str>) -> Result<Self, ConfigError> {
        if let Some(path) = cli_path {
            return Self::read(path);
        }
        if let Some(path) = env_path.map(str::trim).filter(|p| !p.is_empty()) {
            return Self::read(Path::new(path));
        }
        match default_config_path() {
            Some(path) if path.is_file() => Self::read(&path),
            _ => {
                tracing::debug!("No config file found; using defaults");
                Ok(Self::default())
            }
        }
    }
}

pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
}

// ── Environment and CLI overrides ──────────────────────────────────────────

/// Values that can replace what the file says. Used for both the
/// environment layer and the command-line layer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Overrides {
    pub url: Option<String>,
    pub shared_secret: Option<String>,
    pub interface: Option<String>,
    pub verify_tls: Option<bool>,
}

impl Overrides {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the environment layer from any key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let verify_tls = match non_empty(ENV_SSL_VERIFY) {
            Some(raw) => Some(parse_bool(&raw).ok_or_else(|| {
                ConfigError::configuration(format!(
                    "{ENV_SSL_VERIFY} must be true or false, got '{raw}'"
                ))
            })?),
            None => None,
        };
        Ok(Self {
            url: non_empty(ENV_AGENT_URL),
            shared_secret: lookup(ENV_SHARED_SECRET),
            interface: non_empty(ENV_INTERFACE_TYPE),
            verify_tls,
        })
    }

    fn apply(&self, file: &mut ConfigFile) {
        if let Some(url) = &self.url {
            file.endpoint.url = Some(url.clone());
        }
        if let Some(secret) = &self.shared_secret {
            file.endpoint.shared_secret = Some(secret.clone());
        }
        if let Some(mode) = &self.interface {
            file.interface.mode = mode.clone();
        }
        if let Some(verify) = self.verify_tls {
            file.endpoint.verify_tls = verify;
        }
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

// ── Resolved configuration ─────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressConfig {
    pub interval: Duration,
    pub phases: Vec<String>,
}

/// Fully layered and validated settings.
#[derive(Debug, Clone)]
pub struct ConsoleConfig {
    /// Empty only when running against the mock agent.
    pub endpoint: String,
    pub shared_secret: Option<SharedSecret>,
    pub verify_tls: bool,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub mode: InterfaceMode,
    pub display: DisplayPrefs,
    pub progress: ProgressConfig,
    pub profiles: Vec<Profile>,
}

impl ConsoleConfig {
    /// Layer `env` then `cli` over `file` and validate the result. The
    /// endpoint may only be left unset when `require_endpoint` is false.
    pub fn resolve(
        mut file: ConfigFile,
        env: &Overrides,
        cli: &Overrides,
        require_endpoint: bool,
    ) -> Result<Self, ConfigError> {
        env.apply(&mut file);
        cli.apply(&mut file);

        let mode = file.interface.mode.parse::<InterfaceMode>()?;

        let endpoint = file
            .endpoint
            .url
            .as_deref()
            .map(str::trim)
            .unwrap_or_default()
            .to_string();
        if endpoint.is_empty() {
            if require_endpoint {
                return Err(ConfigError::configuration(format!(
                    "agent endpoint URL is not set (use --url, {ENV_AGENT_URL} or [endpoint].url)"
                )));
            }
        } else if !is_http_url(&endpoint) {
            return Err(ConfigError::configuration(format!(
                "agent endpoint must be an http(s) URL, got '{endpoint}'"
            )));
        }

        if file.endpoint.connect_timeout_secs == 0 {
            return Err(ConfigError::configuration(
                "endpoint.connect_timeout_secs must be greater than zero",
            ));
        }
        if file.endpoint.request_timeout_secs == 0 {
            return Err(ConfigError::configuration(
                "endpoint.request_timeout_secs must be greater than zero",
            ));
        }
        if file.progress.interval_ms == 0 {
            return Err(ConfigError::configuration(
                "progress.interval_ms must be greater than zero",
            ));
        }

        let phases: Vec<String> = file
            .progress
            .phases
            .iter()
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty())
            .collect();
        if phases.is_empty() {
            return Err(ConfigError::configuration(
                "progress.phases must contain at least one label",
            ));
        }

        Ok(Self {
            endpoint,
            shared_secret: file.endpoint.shared_secret.and_then(SharedSecret::new),
            verify_tls: file.endpoint.verify_tls,
            connect_timeout: Duration::from_secs(file.endpoint.connect_timeout_secs),
            request_timeout: Duration::from_secs(file.endpoint.request_timeout_secs),
            mode,
            display: file.display,
            progress: ProgressConfig {
                interval: Duration::from_millis(file.progress.interval_ms),
                phases,
            },
            profiles: file.profiles,
        })
    }

    pub fn transport_config(&self) -> HttpTransportConfig {
        HttpTransportConfig {
            endpoint: self.endpoint.clone(),
            shared_secret: self.shared_secret.clone(),
            verify_tls: self.verify_tls,
            connect_timeout: self.connect_timeout,
            request_timeout: self.request_timeout,
        }
    }

    /// Fingerprint of the shared secret, safe to log and display.
    pub fn secret_fingerprint(&self) -> Option<String> {
        self.shared_secret.as_ref().map(SharedSecret::fingerprint)
    }
}

fn is_http_url(url: &str) -> bool {
    let lower = url.to_ascii_lowercase();
    ["http://", "https://"]
        .iter()
        .any(|scheme| lower.starts_with(scheme) && lower.len() > scheme.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn interface_mode_is_case_insensitive() {
        assert_eq!("QUESTION".parse::<InterfaceMode>().unwrap(), InterfaceMode::Question);
        assert_eq!(" Chat ".parse::<InterfaceMode>().unwrap(), InterfaceMode::Chat);
        let err = "KIOSK".parse::<InterfaceMode>().unwrap_err();
        assert_eq!(err.to_string(), "unknown interface type: KIOSK");
    }

    #[test]
    fn env_lookup_reads_all_variables() {
        let env = Overrides::from_lookup(lookup(&[
            (ENV_AGENT_URL, "https://agent.test/invoke"),
            (ENV_SHARED_SECRET, "s3cret"),
            (ENV_INTERFACE_TYPE, "QUESTION"),
            (ENV_SSL_VERIFY, "False"),
        ]))
        .unwrap();
        assert_eq!(env.url.as_deref(), Some("https://agent.test/invoke"));
        assert_eq!(env.shared_secret.as_deref(), Some("s3cret"));
        assert_eq!(env.interface.as_deref(), Some("QUESTION"));
        assert_eq!(env.verify_tls, Some(false));
    }

    #[test]
    fn bad_ssl_verify_value_is_rejected() {
        let err = Overrides::from_lookup(lookup(&[(ENV_SSL_VERIFY, "maybe")])).unwrap_err();
        assert!(err.to_string().contains(ENV_SSL_VERIFY));
    }

    #[test]
    fn defaults_apply_without_a_file() {
        let cli = Overrides {
            url: Some("http://localhost:9000/invoke".into()),
            ..Overrides::default()
        };
        let config =
            ConsoleConfig::resolve(ConfigFile::default(), &Overrides::default(), &cli, true)
                .unwrap();
        assert_eq!(config.mode, InterfaceMode::Chat);
        assert!(config.verify_tls);
        assert_eq!(config.connect_timeout, Duration::from_secs(10));
        assert_eq!(config.request_timeout, Duration::from_secs(460));
        assert_eq!(config.progress.phases.len(), 5);
        assert!(config.shared_secret.is_none());
        assert_eq!(config.display, DisplayPrefs::default());
    }

    #[test]
    fn missing_endpoint_is_only_allowed_for_mock_runs() {
        let none = Overrides::default();
        let err = ConsoleConfig::resolve(ConfigFile::default(), &none, &none, true).unwrap_err();
        assert!(err.to_string().contains("not set"));

        let config = ConsoleConfig::resolve(ConfigFile::default(), &none, &none, false).unwrap();
        assert!(config.endpoint.is_empty());
    }

    #[test]
    fn non_http_endpoint_is_rejected() {
        let cli = Overrides {
            url: Some("ftp://agent.test".into()),
            ..Overrides::default()
        };
        let err = ConsoleConfig::resolve(ConfigFile::default(), &Overrides::default(), &cli, true)
            .unwrap_err();
        assert!(err.to_string().contains("http(s)"));
    }

    #[test]
    fn blank_secret_is_treated_as_unset() {
        let env = Overrides {
            url: Some("https://agent.test".into()),
            shared_secret: Some("   ".into()),
            ..Overrides::default()
        };
        let config =
            ConsoleConfig::resolve(ConfigFile::default(), &env, &Overrides::default(), true)
                .unwrap();
        assert!(config.secret_fingerprint().is_none());
    }
}
