//! Elasticsearch test configuration.

use serde::{Deserialize, Serialize};

/// Port used by `elasticsearch-test-cluster` when nothing else is configured
pub const DEFAULT_TEST_CLUSTER_PORT: &str = "9250";

fn default_url_env() -> String {
    "ELASTICSEARCH_URL".to_string()
}

fn default_timeout_secs() -> u64 {
    5
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElasticsearchConfig {
    /// Test cluster port. Falls back to `TEST_CLUSTER_PORT`, then 9250.
    #[serde(default)]
    pub test_cluster_port: Option<String>,
    /// Variable through which the service under test finds Elasticsearch
    #[serde(default = "default_url_env")]
    pub url_env: String,
    /// HTTP timeout for cluster calls (in seconds)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ElasticsearchConfig {
    fn default() -> Self {
        Self {
            test_cluster_port: None,
            url_env: default_url_env(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl ElasticsearchConfig {
    pub fn test_cluster_port(&self) -> String {
        self.test_cluster_port
            .clone()
            .or_else(|| std::env::var("TEST_CLUSTER_PORT").ok())
            .filter(|port| !port.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_TEST_CLUSTER_PORT.to_string())
    }

    /// `http://localhost:<port>`
    pub fn test_cluster_url(&self) -> String {
        format!("http://localhost:{}", self.test_cluster_port())
    }
}
