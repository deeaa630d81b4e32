//! Service configuration, resolved once per process.

use std::time::Duration;
use thiserror::Error;

/// Environment variable holding the API credential.
pub const API_KEY_VAR: &str = "TRANSLATOR_API_KEY";
/// Environment variable overriding the API base URL.
pub const ENDPOINT_VAR: &str = "TRANSLATOR_ENDPOINT";
/// Environment variable overriding the model name.
pub const MODEL_VAR: &str = "TRANSLATOR_MODEL";
/// Environment variable overriding the per-request timeout, in seconds.
pub const TIMEOUT_VAR: &str = "TRANSLATOR_TIMEOUT_SECS";

const DEFAULT_ENDPOINT: &str = "https://api.openai.com/v1";
const DEFAULT_MODEL: &str = "gpt-4o-mini";
const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Errors resolving the service configuration. All are fatal at startup.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// The credential is absent or blank.
    #[error("Missing credential: set {0}")]
    MissingCredential(&'static str),

    /// A setting has a value we cannot use.
    #[error("Invalid value for {name}: {value:?}")]
    Invalid {
        /// Variable name.
        name: &'static str,
        /// Offending value.
        value: String,
    },
}

/// Connection settings for the translation service.
#[derive(Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    /// Bearer token.
    pub api_key: String,
    /// Base URL, without the `/chat/completions` suffix.
    pub endpoint: String,
    /// Model name sent with each request.
    pub model: String,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl ServiceConfig {
    /// Resolve from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolve from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_blank = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let api_key = non_blank(API_KEY_VAR).ok_or(ConfigError::MissingCredential(API_KEY_VAR))?;

        let endpoint = non_blank(ENDPOINT_VAR).unwrap_or_else(|| DEFAULT_ENDPOINT.to_string());
        if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") {
            return Err(ConfigError::Invalid {
                name: ENDPOINT_VAR,
                value: endpoint,
            });
        }

        let model = non_blank(MODEL_VAR).unwrap_or_else(|| DEFAULT_MODEL.to_string());

        let timeout = match non_blank(TIMEOUT_VAR) {
            Some(raw) => match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                _ => {
                    return Err(ConfigError::Invalid {
                        name: TIMEOUT_VAR,
                        value: raw,
                    })
                }
            },
            None => Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        };

        Ok(Self {
            api_key: api_key.trim().to_string(),
            endpoint: endpoint.trim_end_matches('/').to_string(),
            model,
            timeout,
        })
    }

    /// Full URL of the chat completion endpoint.
    pub fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.endpoint)
    }
}

impl std::fmt::Debug for ServiceConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceConfig")
            .field("api_key", &"<redacted>")
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .field("timeout", &self.timeout)
            .finish()
    }
}
