//! Client configuration.
//!
//! Values come from code (`Configuration::new` plus `with_*` setters) or from
//! the environment (`Configuration::from_env`). `from_lookup` takes any
//! key-to-value function so tests never touch the process environment.

use std::fmt;
use std::time::Duration;

use url::Url;

use crate::error::ApiError;

pub const DEFAULT_BASE_URL: &str = "https://app.launchdarkly.com";
pub const DEFAULT_API_VERSION: &str = "20220603";
pub const DEFAULT_USER_AGENT: &str = concat!("flagapi-rust/", env!("CARGO_PKG_VERSION"));
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

pub const ENV_ACCESS_TOKEN: &str = "FLAGAPI_ACCESS_TOKEN";
pub const ENV_BASE_URL: &str = "FLAGAPI_BASE_URL";
pub const ENV_API_VERSION: &str = "FLAGAPI_API_VERSION";
pub const ENV_TIMEOUT_SECS: &str = "FLAGAPI_TIMEOUT_SECS";

/// Shared settings for every request a client builds.
#[derive(Clone)]
pub struct Configuration {
    base_url: String,
    pub access_token: Option<String>,
    pub api_version: String,
    pub user_agent: String,
    /// Extra headers appended to every request, after the standard ones.
    pub default_headers: Vec<(String, String)>,
    /// Per-call deadline enforced by the transport. `None` disables it.
    pub timeout: Option<Duration>,
}

impl Configuration {
    /// Configuration for `base_url` with defaults everywhere else.
    ///
    /// The URL must be absolute http(s); a trailing `/` is dropped.
    pub fn new(base_url: &str) -> Result<Self, ApiError> {
        Ok(Self {
            base_url: normalize_base_url(base_url)?,
            access_token: None,
            api_version: DEFAULT_API_VERSION.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            default_headers: Vec::new(),
            timeout: Some(DEFAULT_TIMEOUT),
        })
    }

    pub fn from_env() -> Result<Self, ApiError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ApiError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let base_url = lookup(ENV_BASE_URL).unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let mut config = Self::new(&base_url)?;
        config.access_token = lookup(ENV_ACCESS_TOKEN).filter(|t| !t.trim().is_empty());
        if let Some(version) = lookup(ENV_API_VERSION) {
            config.api_version = version;
        }
        if let Some(raw) = lookup(ENV_TIMEOUT_SECS) {
            let secs: u64 = raw.trim().parse().map_err(|_| {
                ApiError::InvalidConfig(format!("{ENV_TIMEOUT_SECS} must be whole seconds, got {raw:?}"))
            })?;
            config.timeout = (secs > 0).then(|| Duration::from_secs(secs));
        }
        Ok(config)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    pub fn with_api_version(mut self, version: impl Into<String>) -> Self {
        self.api_version = version.into();
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn with_default_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.default_headers.push((name.into(), value.into()));
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            access_token: None,
            api_version: DEFAULT_API_VERSION.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            default_headers: Vec::new(),
            timeout: Some(DEFAULT_TIMEOUT),
        }
    }
}

// Hand-written so the token never reaches logs.
impl fmt::Debug for Configuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Configuration")
            .field("base_url", &self.base_url)
            .field("access_token", &self.access_token.as_ref().map(|_| "<redacted>"))
            .field("api_version", &self.api_version)
            .field("user_agent", &self.user_agent)
            .field("default_headers", &self.default_headers)
            .field("timeout", &self.timeout)
            .finish()
    }
}

fn normalize_base_url(raw: &str) -> Result<String, ApiError> {
    let trimmed = raw.trim().trim_end_matches('/');
    let parsed = Url::parse(trimmed)
        .map_err(|e| ApiError::InvalidConfig(format!("base URL {raw:?}: {e}")))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(ApiError::InvalidConfig(format!(
            "base URL {raw:?}: scheme must be http or https"
        )));
    }
    if parsed.query().is_some() || parsed.fragment().is_some() {
        return Err(ApiError::InvalidConfig(format!(
            "base URL {raw:?}: must not carry a query or fragment"
        )));
    }
    Ok(trimmed.to_string())
}
