// Configuration module

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{HarnessError, Result};

pub mod elasticsearch;
pub mod jwt;

pub use elasticsearch::ElasticsearchConfig;
pub use jwt::{JwtEnvNames, JwtHarnessConfig};

/// Authorization header value sent by the invalid-token coverage case
pub const DEFAULT_INVALID_AUTHORIZATION: &str = "JwtToken Invalid-Token";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HarnessConfig {
    #[serde(default)]
    pub jwt: JwtHarnessConfig,
    #[serde(default)]
    pub coverage: CoverageConfig,
    #[serde(default)]
    pub network: NetworkConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub app: Option<AppConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub elasticsearch: Option<ElasticsearchConfig>,
}

fn default_invalid_authorization() -> String {
    DEFAULT_INVALID_AUTHORIZATION.to_string()
}

/// Authentication coverage settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoverageConfig {
    /// Header value expected to be rejected with 403
    #[serde(default = "default_invalid_authorization")]
    pub invalid_authorization: String,
    /// Accept controllers without routes (logs a warning instead of failing)
    #[serde(default)]
    pub allow_empty: bool,
}

impl Default for CoverageConfig {
    fn default() -> Self {
        Self {
            invalid_authorization: default_invalid_authorization(),
            allow_empty: false,
        }
    }
}

fn default_true() -> bool {
    true
}

/// Outbound network policy applied during suite setup
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    #[serde(default = "default_true")]
    pub allow_localhost: bool,
    /// Extra hosts reachable besides localhost
    #[serde(default)]
    pub allowed_hosts: Vec<String>,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            allow_localhost: true,
            allowed_hosts: Vec::new(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive, overridden by `RUST_LOG`
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

fn default_app_timeout_secs() -> u64 {
    30
}

/// Running service the HTTP dispatcher talks to
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub base_url: String,
    #[serde(default = "default_app_timeout_secs")]
    pub timeout_secs: u64,
}

impl HarnessConfig {
    pub fn from_yaml_with_env(yaml: &str) -> Result<Self> {
        // Replace ${VAR_NAME} with environment variable values
        let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}")
            .map_err(|e| HarnessError::Config(e.to_string()))?;

        let mut missing = Vec::new();
        let substituted = re.replace_all(yaml, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| {
                missing.push(var_name.to_string());
                String::new()
            })
        });

        if let Some(var_name) = missing.first() {
            return Err(HarnessError::Config(format!(
                "Environment variable '{}' is referenced but not set",
                var_name
            )));
        }

        let config: HarnessConfig = serde_yaml::from_str(&substituted)?;
        Ok(config)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let yaml = std::fs::read_to_string(path)
            .map_err(|e| HarnessError::Config(format!("Failed to read config file: {}", e)))?;
        Self::from_yaml_with_env(&yaml)
    }

    pub fn validate(&self) -> Result<()> {
        self.jwt.validate()?;

        if self.coverage.invalid_authorization.trim().is_empty() {
            return Err(HarnessError::Config(
                "coverage.invalid_authorization must not be empty".to_string(),
            ));
        }

        if let Some(app) = &self.app {
            if !(app.base_url.starts_with("http://") || app.base_url.starts_with("https://")) {
                return Err(HarnessError::Config(format!(
                    "app.base_url '{}' must start with http:// or https://",
                    app.base_url
                )));
            }
        }

        if let Some(es) = &self.elasticsearch {
            if es.url_env.trim().is_empty() {
                return Err(HarnessError::Config(
                    "elasticsearch.url_env must not be empty".to_string(),
                ));
            }
        }

        Ok(())
    }
}
