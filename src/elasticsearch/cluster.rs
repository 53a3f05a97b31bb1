//! Client for an externally started Elasticsearch test cluster.
//!
//! Starting a cluster per test is far too slow, so the cluster is expected to
//! be running already. [`ElasticsearchTestCluster::ensure_running`] fails fast
//! with a remediation message when it is not.

use reqwest::{Method, StatusCode};
use serde_json::Value;
use std::future::Future;
use std::time::Duration;

use crate::config::ElasticsearchConfig;
use crate::env::{EnvOverrides, EnvScope};
use crate::error::{HarnessError, Result};
use crate::network::NetworkPolicy;

const NOT_RUNNING_MESSAGE: &str =
    "Please start Elasticsearch test cluster with `elasticsearch-test-cluster start`";

#[derive(Debug, Clone, Default)]
pub struct ClusterOptions {
    /// Index created before and deleted after the wrapped block
    pub index: Option<String>,
}

impl ClusterOptions {
    pub fn index(index: impl Into<String>) -> Self {
        Self {
            index: Some(index.into()),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct IndexDocument {
    pub index: String,
    /// Generated by Elasticsearch when absent
    pub id: Option<String>,
    pub body: Value,
    /// Defaults to `true` so the document is searchable immediately
    pub refresh: Option<bool>,
    /// Mapping type for pre-7 clusters; `_doc` otherwise
    pub doc_type: Option<String>,
}

impl IndexDocument {
    pub fn new(index: impl Into<String>, body: Value) -> Self {
        Self {
            index: index.into(),
            body,
            ..Default::default()
        }
    }

    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn refresh(mut self, refresh: bool) -> Self {
        self.refresh = Some(refresh);
        self
    }

    pub fn doc_type(mut self, doc_type: impl Into<String>) -> Self {
        self.doc_type = Some(doc_type.into());
        self
    }

    fn path(&self) -> String {
        let doc_type = self.doc_type.as_deref().unwrap_or("_doc");
        match &self.id {
            Some(id) => format!(
                "/{}/{}/{}",
                urlencoding::encode(&self.index),
                urlencoding::encode(doc_type),
                urlencoding::encode(id)
            ),
            None => format!(
                "/{}/{}",
                urlencoding::encode(&self.index),
                urlencoding::encode(doc_type)
            ),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ElasticsearchTestCluster {
    url: String,
    url_env: String,
    client: reqwest::Client,
    policy: NetworkPolicy,
}

impl ElasticsearchTestCluster {
    pub fn new(config: &ElasticsearchConfig, policy: NetworkPolicy) -> Result<Self> {
        let url = config.test_cluster_url();
        policy.check(&url)?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            url,
            url_env: config.url_env.clone(),
            client,
            policy,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Points the service under test at the cluster
    pub fn env_overrides(&self) -> EnvOverrides {
        EnvOverrides::new().set(&self.url_env, &self.url)
    }

    /// Health check; any transport failure counts as "not running"
    pub async fn is_running(&self) -> bool {
        match self.send(Method::GET, "/_cluster/health", None).await {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                tracing::debug!(url = %self.url, error = %e, "Elasticsearch test cluster unreachable");
                false
            }
        }
    }

    pub async fn ensure_running(&self) -> Result<()> {
        if self.is_running().await {
            Ok(())
        } else {
            Err(HarnessError::Config(format!(
                "{} (expected at {})",
                NOT_RUNNING_MESSAGE, self.url
            )))
        }
    }

    pub async fn index_exists(&self, index: &str) -> Result<bool> {
        let path = index_path(index)?;
        let response = self.send(Method::HEAD, &path, None).await?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(false),
            status if status.is_success() => Ok(true),
            status => Err(HarnessError::Elasticsearch(format!(
                "HEAD {} returned {}",
                path, status
            ))),
        }
    }

    /// Delete `index` if present, then create it empty
    pub async fn safe_create_index(&self, index: &str) -> Result<()> {
        if self.index_exists(index).await? {
            self.delete_index(index).await?;
        }

        let path = index_path(index)?;
        let response = self.send(Method::PUT, &path, None).await?;
        expect_success(Method::PUT, &path, response).await?;

        tracing::debug!(index = %index, "Created Elasticsearch index");
        Ok(())
    }

    /// No-op when the index does not exist
    pub async fn safe_delete_index(&self, index: &str) -> Result<()> {
        if !self.index_exists(index).await? {
            return Ok(());
        }
        self.delete_index(index).await
    }

    /// Returns the response body, which carries the assigned `_id`
    pub async fn index_document(&self, document: IndexDocument) -> Result<Value> {
        if document.index.trim().is_empty() {
            return Err(HarnessError::InvalidArgument(
                "You must provide Elasticsearch index name".to_string(),
            ));
        }

        let refresh = document.refresh.unwrap_or(true);
        let path = format!("{}?refresh={}", document.path(), refresh);
        let method = if document.id.is_some() {
            Method::PUT
        } else {
            Method::POST
        };

        let response = self
            .send(method.clone(), &path, Some(&document.body))
            .await?;
        let response = expect_success(method, &path, response).await?;

        tracing::debug!(index = %document.index, refresh, "Indexed document");
        Ok(response.json().await?)
    }

    /// Run `f` against the live cluster with `ELASTICSEARCH_URL` pointing at
    /// it. When `options.index` is set, the index is recreated before `f`
    /// and deleted afterwards.
    pub async fn with_test_cluster<F, Fut, T>(&self, options: ClusterOptions, f: F) -> Result<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        self.ensure_running().await?;

        let index = options.index.filter(|index| !index.trim().is_empty());
        if let Some(index) = &index {
            self.safe_create_index(index).await?;
        }

        let output = {
            let _scope = EnvScope::apply(self.env_overrides());
            f().await
        };

        if let Some(index) = &index {
            self.safe_delete_index(index).await?;
        }

        Ok(output)
    }

    async fn delete_index(&self, index: &str) -> Result<()> {
        let path = index_path(index)?;
        let response = self.send(Method::DELETE, &path, None).await?;
        expect_success(Method::DELETE, &path, response).await?;

        tracing::debug!(index = %index, "Deleted Elasticsearch index");
        Ok(())
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<reqwest::Response> {
        let url = format!("{}{}", self.url, path);
        self.policy.check(&url)?;

        let mut request = self
            .client
            .request(method, &url)
            .header("Accept", "application/json");
        if let Some(body) = body {
            request = request.json(body);
        }

        Ok(request.send().await?)
    }
}

fn index_path(index: &str) -> Result<String> {
    if index.trim().is_empty() {
        return Err(HarnessError::InvalidArgument(
            "You must provide Elasticsearch index name".to_string(),
        ));
    }
    Ok(format!("/{}", urlencoding::encode(index)))
}

async fn expect_success(
    method: Method,
    path: &str,
    response: reqwest::Response,
) -> Result<reqwest::Response> {
    if response.status().is_success() {
        return Ok(response);
    }

    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    Err(HarnessError::Elasticsearch(format!(
        "{} {} returned {}: {}",
        method, path, status, body
    )))
}
