// Outbound network policy
//
// Every HTTP call the harness makes (service dispatcher, Elasticsearch client)
// asks the policy first, so a test cannot reach a real external host by
// accident.

use reqwest::Url;

use crate::config::NetworkConfig;
use crate::error::{HarnessError, Result};

const LOCAL_HOSTS: &[&str] = &["localhost", "127.0.0.1", "::1", "[::1]", "0.0.0.0"];

#[derive(Debug, Clone)]
pub struct NetworkPolicy {
    external_allowed: bool,
    allow_localhost: bool,
    allowed_hosts: Vec<String>,
}

impl Default for NetworkPolicy {
    fn default() -> Self {
        Self::allow_all()
    }
}

impl NetworkPolicy {
    pub fn allow_all() -> Self {
        Self {
            external_allowed: true,
            allow_localhost: true,
            allowed_hosts: Vec::new(),
        }
    }

    /// Refuse every host except, optionally, the loopback ones
    pub fn disable_external(allow_localhost: bool) -> Self {
        tracing::debug!(allow_localhost, "External network access disabled");
        Self {
            external_allowed: false,
            allow_localhost,
            allowed_hosts: Vec::new(),
        }
    }

    pub fn from_config(config: &NetworkConfig) -> Self {
        config
            .allowed_hosts
            .iter()
            .fold(Self::disable_external(config.allow_localhost), |policy, host| {
                policy.allow_host(host)
            })
    }

    pub fn allow_host(mut self, host: impl Into<String>) -> Self {
        self.allowed_hosts.push(host.into().to_ascii_lowercase());
        self
    }

    pub fn is_allowed(&self, host: &str) -> bool {
        if self.external_allowed {
            return true;
        }

        let host = host.to_ascii_lowercase();
        if self.allow_localhost && LOCAL_HOSTS.contains(&host.as_str()) {
            return true;
        }

        self.allowed_hosts.iter().any(|allowed| *allowed == host)
    }

    pub fn check(&self, url: &str) -> Result<()> {
        let parsed = Url::parse(url)
            .map_err(|e| HarnessError::InvalidArgument(format!("Invalid URL '{}': {}", url, e)))?;
        let host = parsed.host_str().unwrap_or_default();

        if self.is_allowed(host) {
            Ok(())
        } else {
            tracing::warn!(url = %url, "Blocked outbound request");
            Err(HarnessError::NetConnectNotAllowed(url.to_string()))
        }
    }
}
