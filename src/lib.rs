pub mod api;
pub mod auth;
pub mod dispatch;
pub mod endpoint;
pub mod error;
pub mod logging;
pub mod payload;
pub mod webhook;

use error::RelayError;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use dispatch::HookDispatcher;

pub const DEFAULT_BIND_ADDRESS: &str = "127.0.0.1:8888";
pub const DEFAULT_HEAD_LENGTH: usize = 8;
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Which deployhook fields the relay emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HookProfile {
    /// `app`, `user`, `url`, `head`, `head_long`, `git_log`
    Basic,
    /// Basic fields plus `app_uuid`, `prev_head` and `release`
    #[default]
    Extended,
}

impl FromStr for HookProfile {
    type Err = RelayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "basic" => Ok(HookProfile::Basic),
            "extended" => Ok(HookProfile::Extended),
            other => Err(RelayError::ConfigError(format!(
                "HOOK_PROFILE must be 'basic' or 'extended', got '{}'",
                other
            ))),
        }
    }
}

/// Body encoding of the outbound hook call. Never mixed within a deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BodyEncoding {
    #[default]
    Form,
    Json,
}

impl FromStr for BodyEncoding {
    type Err = RelayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "form" => Ok(BodyEncoding::Form),
            "json" => Ok(BodyEncoding::Json),
            other => Err(RelayError::ConfigError(format!(
                "HOOK_ENCODING must be 'form' or 'json', got '{}'",
                other
            ))),
        }
    }
}

/// Process-wide configuration, read once at startup and never mutated.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub bind_address: String,
    /// Shared secret compared against the `Authorization` header
    pub authorization: Option<String>,
    /// HMAC key for the `Heroku-Webhook-Hmac-SHA256` header
    pub webhook_secret: Option<String>,
    /// Destination URL template; `None` disables forwarding
    pub http_endpoint: Option<String>,
    pub profile: HookProfile,
    pub head_length: usize,
    pub encoding: BodyEncoding,
    pub timeout: Duration,
    pub log_dir: Option<PathBuf>,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            bind_address: DEFAULT_BIND_ADDRESS.to_string(),
            authorization: None,
            webhook_secret: None,
            http_endpoint: None,
            profile: HookProfile::default(),
            head_length: DEFAULT_HEAD_LENGTH,
            encoding: BodyEncoding::default(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            log_dir: None,
        }
    }
}

impl RelayConfig {
    /// Load the configuration from the process environment.
    pub fn from_env() -> error::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load the configuration through an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> error::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let head_length = match lookup("HOOK_HEAD_LENGTH") {
            Some(raw) => parse_positive("HOOK_HEAD_LENGTH", &raw)? as usize,
            None => defaults.head_length,
        };
        let timeout = match lookup("HOOK_TIMEOUT_SECS") {
            Some(raw) => Duration::from_secs(parse_positive("HOOK_TIMEOUT_SECS", &raw)?),
            None => defaults.timeout,
        };

        let http_endpoint = lookup("HTTP_ENDPOINT");
        if let Some(template) = &http_endpoint {
            endpoint::validate_template(template)?;
        }

        Ok(Self {
            bind_address: lookup("BIND_ADDRESS").unwrap_or(defaults.bind_address),
            authorization: lookup("AUTHORIZATION"),
            webhook_secret: lookup("WEBHOOK_SECRET"),
            http_endpoint,
            profile: lookup("HOOK_PROFILE")
                .map(|raw| raw.parse::<HookProfile>())
                .transpose()?
                .unwrap_or(defaults.profile),
            head_length,
            encoding: lookup("HOOK_ENCODING")
                .map(|raw| raw.parse::<BodyEncoding>())
                .transpose()?
                .unwrap_or(defaults.encoding),
            timeout,
            log_dir: lookup("LOG_DIR")
                .filter(|dir| !dir.is_empty())
                .map(PathBuf::from),
        })
    }
}

fn parse_positive(key: &str, raw: &str) -> error::Result<u64> {
    match raw.trim().parse::<u64>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(RelayError::ConfigError(format!(
            "{} must be a positive integer, got '{}'",
            key, raw
        ))),
    }
}

pub struct AppState {
    pub config: RelayConfig,
    pub dispatcher: HookDispatcher,
}

impl AppState {
    pub fn new(config: RelayConfig) -> error::Result<Self> {
        let dispatcher = HookDispatcher::new(config.encoding, config.timeout)?;
        Ok(Self { config, dispatcher })
    }
}

pub type SharedState = Arc<AppState>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> error::Result<RelayConfig> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        RelayConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn empty_environment_uses_defaults() {
        let config = load(&[]).unwrap();
        assert_eq!(config.bind_address, DEFAULT_BIND_ADDRESS);
        assert!(config.authorization.is_none());
        assert!(config.webhook_secret.is_none());
        assert!(config.http_endpoint.is_none());
        assert_eq!(config.profile, HookProfile::Extended);
        assert_eq!(config.head_length, 8);
        assert_eq!(config.encoding, BodyEncoding::Form);
        assert_eq!(config.timeout, Duration::from_secs(10));
        assert!(config.log_dir.is_none());
    }

    #[test]
    fn reads_every_key() {
        let config = load(&[
            ("BIND_ADDRESS", "0.0.0.0:5000"),
            ("AUTHORIZATION", "Bearer s3cret"),
            ("WEBHOOK_SECRET", "hmac-key"),
            ("HTTP_ENDPOINT", "https://hooks.example.com/{{app}}?rev={{head}}"),
            ("HOOK_PROFILE", "basic"),
            ("HOOK_HEAD_LENGTH", "6"),
            ("HOOK_ENCODING", "JSON"),
            ("HOOK_TIMEOUT_SECS", "3"),
            ("LOG_DIR", "/var/log/relay"),
        ])
        .unwrap();
        assert_eq!(config.bind_address, "0.0.0.0:5000");
        assert_eq!(config.authorization.as_deref(), Some("Bearer s3cret"));
        assert_eq!(config.webhook_secret.as_deref(), Some("hmac-key"));
        assert_eq!(
            config.http_endpoint.as_deref(),
            Some("https://hooks.example.com/{{app}}?rev={{head}}")
        );
        assert_eq!(config.profile, HookProfile::Basic);
        assert_eq!(config.head_length, 6);
        assert_eq!(config.encoding, BodyEncoding::Json);
        assert_eq!(config.timeout, Duration::from_secs(3));
        assert_eq!(config.log_dir, Some(PathBuf::from("/var/log/relay")));
    }

    #[test]
    fn empty_secret_still_enables_check() {
        let config = load(&[("AUTHORIZATION", "")]).unwrap();
        assert_eq!(config.authorization.as_deref(), Some(""));
    }

    #[test]
    fn rejects_invalid_values() {
        assert!(load(&[("HOOK_HEAD_LENGTH", "0")]).is_err());
        assert!(load(&[("HOOK_HEAD_LENGTH", "six")]).is_err());
        assert!(load(&[("HOOK_TIMEOUT_SECS", "-1")]).is_err());
        assert!(load(&[("HOOK_PROFILE", "rich")]).is_err());
        assert!(load(&[("HOOK_ENCODING", "xml")]).is_err());
        assert!(load(&[("HTTP_ENDPOINT", "not a url")]).is_err());
        assert!(load(&[("HTTP_ENDPOINT", "ftp://example.com/{{app}}")]).is_err());
    }
}
