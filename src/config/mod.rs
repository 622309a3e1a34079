//! Console configuration
//!
//! Values are layered lowest to highest: built-in defaults, the global
//! `config.toml`, the project `.opsdesk/config.toml`, an explicit file, and
//! finally `OPSDESK_*` environment variables. Each file only overrides the
//! keys it actually sets.

use crate::error::{ConsoleError, ErrorCode, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use url::Url;

pub mod loader;

pub use loader::{load_config, ConfigLoader};

pub const ENV_API_URL: &str = "OPSDESK_API_URL";
pub const ENV_USER_ID: &str = "OPSDESK_USER_ID";
pub const ENV_ENVIRONMENT: &str = "OPSDESK_ENVIRONMENT";
pub const ENV_AUTH_TOKEN: &str = "OPSDESK_AUTH_TOKEN";
pub const ENV_CASCADE_DELAY_MS: &str = "OPSDESK_CASCADE_DELAY_MS";

/// Directory holding the global `config.toml`
pub fn get_global_config_dir() -> Result<PathBuf> {
    ProjectDirs::from("com", "opsdesk", "opsdesk")
        .map(|dirs| dirs.config_dir().to_path_buf())
        .ok_or_else(|| {
            ConsoleError::config_with_code(
                ErrorCode::CONFIG_PATH_ERROR,
                "Could not determine home directory",
            )
        })
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsoleConfig {
    pub user_id: String,
    pub environment: String,
    /// Debounce before a cascaded step is submitted
    pub cascade_delay_ms: u64,
    pub api: ApiConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    pub classify_path: String,
    pub tasks_path: String,
    pub execute_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth_token: Option<String>,
    /// Transport-level timeout; the orchestrator itself never times out a step
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_timeout_secs: Option<u64>,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            user_id: "ops-engineer".to_string(),
            environment: "prod".to_string(),
            cascade_delay_ms: 400,
            api: ApiConfig::default(),
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8093".to_string(),
            classify_path: "/classify".to_string(),
            tasks_path: "/tasks".to_string(),
            execute_path: "/execute-step".to_string(),
            auth_token: None,
            request_timeout_secs: None,
        }
    }
}

/// A config file as written on disk; absent keys leave lower layers alone
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PartialConfig {
    pub user_id: Option<String>,
    pub environment: Option<String>,
    pub cascade_delay_ms: Option<u64>,
    pub api: Option<PartialApiConfig>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PartialApiConfig {
    pub base_url: Option<String>,
    pub classify_path: Option<String>,
    pub tasks_path: Option<String>,
    pub execute_path: Option<String>,
    pub auth_token: Option<String>,
    pub request_timeout_secs: Option<u64>,
}

impl ConsoleConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overlay the keys set in `layer`
    pub fn merge(&mut self, layer: PartialConfig) {
        if let Some(v) = layer.user_id {
            self.user_id = v;
        }
        if let Some(v) = layer.environment {
            self.environment = v;
        }
        if let Some(v) = layer.cascade_delay_ms {
            self.cascade_delay_ms = v;
        }
        if let Some(api) = layer.api {
            self.api.merge(api);
        }
    }

    pub fn merge_env_vars(&mut self) -> Result<()> {
        self.merge_env_from(|key| std::env::var(key).ok())
    }

    /// Apply `OPSDESK_*` overrides read through `lookup`
    pub fn merge_env_from(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(url) = lookup(ENV_API_URL) {
            self.api.base_url = url;
        }
        if let Some(user) = lookup(ENV_USER_ID) {
            self.user_id = user;
        }
        if let Some(env) = lookup(ENV_ENVIRONMENT) {
            self.environment = env;
        }
        if let Some(token) = lookup(ENV_AUTH_TOKEN) {
            self.api.auth_token = Some(token).filter(|t| !t.is_empty());
        }
        if let Some(delay) = lookup(ENV_CASCADE_DELAY_MS) {
            self.cascade_delay_ms = delay.trim().parse().map_err(|e| {
                ConsoleError::config_with_code(
                    ErrorCode::CONFIG_INVALID_VALUE,
                    format!("{} must be a number of milliseconds, got '{}'", ENV_CASCADE_DELAY_MS, delay),
                )
                .with_source(e)
            })?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.user_id.trim().is_empty() {
            return Err(ConsoleError::config_with_code(
                ErrorCode::CONFIG_INVALID_VALUE,
                "user_id must not be empty",
            ));
        }
        self.api.validate()
    }
}

impl ApiConfig {
    fn merge(&mut self, layer: PartialApiConfig) {
        if let Some(v) = layer.base_url {
            self.base_url = v;
        }
        if let Some(v) = layer.classify_path {
            self.classify_path = v;
        }
        if let Some(v) = layer.tasks_path {
            self.tasks_path = v;
        }
        if let Some(v) = layer.execute_path {
            self.execute_path = v;
        }
        if let Some(v) = layer.auth_token {
            self.auth_token = Some(v);
        }
        if let Some(v) = layer.request_timeout_secs {
            self.request_timeout_secs = Some(v);
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.base()?;
        for (name, path) in [
            ("classify_path", &self.classify_path),
            ("tasks_path", &self.tasks_path),
            ("execute_path", &self.execute_path),
        ] {
            if !path.starts_with('/') {
                return Err(ConsoleError::config_with_code(
                    ErrorCode::CONFIG_INVALID_VALUE,
                    format!("api.{} must start with '/', got '{}'", name, path),
                ));
            }
        }
        Ok(())
    }

    fn base(&self) -> Result<Url> {
        let url = Url::parse(&self.base_url).map_err(|e| {
            ConsoleError::config_with_code(
                ErrorCode::CONFIG_INVALID_URL,
                format!("api.base_url '{}' is not a valid URL", self.base_url),
            )
            .with_source(e)
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConsoleError::config_with_code(
                ErrorCode::CONFIG_INVALID_URL,
                format!("api.base_url must use http or https, got '{}'", url.scheme()),
            ));
        }
        Ok(url)
    }

    /// Absolute URL of `path` below `base_url`, keeping any base path prefix
    pub fn endpoint(&self, path: &str) -> Result<Url> {
        let mut url = self.base()?;
        let joined = format!("{}{}", url.path().trim_end_matches('/'), path);
        url.set_path(&joined);
        Ok(url)
    }

    pub fn classify_url(&self) -> Result<Url> {
        self.endpoint(&self.classify_path)
    }

    pub fn tasks_url(&self) -> Result<Url> {
        self.endpoint(&self.tasks_path)
    }

    pub fn execute_url(&self) -> Result<Url> {
        self.endpoint(&self.execute_path)
    }
}
