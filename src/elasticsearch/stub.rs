//! Stubbed Elasticsearch search endpoint.
//!
//! Faster than a live cluster when the search results are not what the test
//! is about: every GET answers with the configured hits.

use serde_json::Value;
use std::future::Future;
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

use super::search_payload;
use crate::config::ElasticsearchConfig;
use crate::env::{EnvOverrides, EnvScope};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StubOptions {
    pub hits: Vec<Value>,
    /// Reported total; defaults to the number of hits
    pub total: Option<u64>,
}

impl StubOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn hit(mut self, doc: Value) -> Self {
        self.hits.push(doc);
        self
    }

    pub fn hits<I: IntoIterator<Item = Value>>(mut self, docs: I) -> Self {
        self.hits.extend(docs);
        self
    }

    pub fn total(mut self, total: u64) -> Self {
        self.total = Some(total);
        self
    }

    pub fn payload(&self) -> Value {
        search_payload(&self.hits, self.total)
    }
}

/// Local mock server; shut down when dropped
pub struct StubbedElasticsearch {
    server: MockServer,
    url_env: String,
}

impl StubbedElasticsearch {
    pub async fn start(options: StubOptions) -> Self {
        Self::start_with_config(options, &ElasticsearchConfig::default()).await
    }

    pub async fn start_with_config(options: StubOptions, config: &ElasticsearchConfig) -> Self {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("Content-Type", "application/json")
                    .set_body_json(options.payload()),
            )
            .mount(&server)
            .await;

        tracing::debug!(
            uri = %server.uri(),
            hits = options.hits.len(),
            "Started stubbed Elasticsearch"
        );

        Self {
            server,
            url_env: config.url_env.clone(),
        }
    }

    pub fn uri(&self) -> String {
        self.server.uri()
    }

    pub fn env_overrides(&self) -> EnvOverrides {
        EnvOverrides::new().set(&self.url_env, self.uri())
    }

    /// Requests the stub has seen so far
    pub async fn received_requests(&self) -> Vec<Request> {
        self.server.received_requests().await.unwrap_or_default()
    }
}

/// Run `f` with `ELASTICSEARCH_URL` pointing at a stub serving `options`.
/// The stub is torn down once `f` completes.
pub async fn with_stubbed_elasticsearch<F, Fut, T>(options: StubOptions, f: F) -> T
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = T>,
{
    with_stubbed_elasticsearch_config(options, &ElasticsearchConfig::default(), f).await
}

/// [`with_stubbed_elasticsearch`] for the variable named by `config.url_env`
pub async fn with_stubbed_elasticsearch_config<F, Fut, T>(
    options: StubOptions,
    config: &ElasticsearchConfig,
    f: F,
) -> T
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = T>,
{
    let stub = StubbedElasticsearch::start_with_config(options, config).await;
    let _scope = EnvScope::apply(stub.env_overrides());
    f().await
}
