// Integration test context
//
// Suite setup (network policy, JWT harness, dispatcher) plus the per-test
// "around" hook that scopes the default environment.

use std::future::Future;
use std::sync::Arc;
use tracing::info;

use crate::auth::JwtAuthHarness;
use crate::config::HarnessConfig;
use crate::coverage::{AuthCoverage, CoverageReport};
use crate::elasticsearch::{
    with_stubbed_elasticsearch_config, ElasticsearchTestCluster, StubOptions,
};
use crate::env::{with_modified_env_async, EnvOverrides, EnvScope};
use crate::error::{HarnessError, Result};
use crate::network::NetworkPolicy;
use crate::request::{HttpDispatcher, HttpVerb, RequestArgs, RequestDispatcher, SimulatedResponse};
use crate::router::RouteTable;

pub struct IntegrationTest {
    config: HarnessConfig,
    harness: JwtAuthHarness,
    network: NetworkPolicy,
    dispatcher: Arc<dyn RequestDispatcher>,
}

impl IntegrationTest {
    pub fn new(config: HarnessConfig, dispatcher: Arc<dyn RequestDispatcher>) -> Result<Self> {
        config.validate()?;

        let network = NetworkPolicy::from_config(&config.network);
        let harness = JwtAuthHarness::new(config.jwt.clone())?;

        info!(
            algorithm = %config.jwt.algorithm,
            allow_localhost = config.network.allow_localhost,
            allowed_hosts = config.network.allowed_hosts.len(),
            elasticsearch = config.elasticsearch.is_some(),
            "Integration test context ready"
        );

        Ok(Self {
            config,
            harness,
            network,
            dispatcher,
        })
    }

    /// Talk to a running service at `app.base_url`
    pub fn for_http(config: HarnessConfig) -> Result<Self> {
        let app = config.app.as_ref().ok_or_else(|| {
            HarnessError::Config("app.base_url is required for HTTP integration tests".to_string())
        })?;
        let dispatcher =
            HttpDispatcher::from_config(app, NetworkPolicy::from_config(&config.network))?;

        Self::new(config, Arc::new(dispatcher))
    }

    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    pub fn harness(&self) -> &JwtAuthHarness {
        &self.harness
    }

    pub fn network(&self) -> &NetworkPolicy {
        &self.network
    }

    pub fn dispatcher(&self) -> &dyn RequestDispatcher {
        self.dispatcher.as_ref()
    }

    /// Default JWT variables, plus `ELASTICSEARCH_URL` when Elasticsearch is
    /// configured
    pub fn around_env(&self) -> Result<EnvOverrides> {
        let overrides = self.harness.default_env()?;

        Ok(match &self.config.elasticsearch {
            Some(es) => overrides.set(&es.url_env, es.test_cluster_url()),
            None => overrides,
        })
    }

    /// Run one test body inside the around hook
    pub async fn run<F, Fut, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        let _scope = EnvScope::apply(self.around_env()?);
        Ok(f().await)
    }

    pub fn run_sync<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce() -> T,
    {
        let _scope = EnvScope::apply(self.around_env()?);
        Ok(f())
    }

    /// Nested override inside [`IntegrationTest::run`], e.g. to disable validation
    pub async fn with_modified_env<F, Fut, T>(&self, overrides: EnvOverrides, f: F) -> T
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        with_modified_env_async(overrides, f).await
    }

    /// Authenticated by default; see [`JwtAuthHarness::authorize`]
    pub async fn request(
        &self,
        verb: HttpVerb,
        path: &str,
        args: RequestArgs,
    ) -> Result<SimulatedResponse> {
        self.harness
            .request(self.dispatcher.as_ref(), verb, path, args)
            .await
    }

    pub fn coverage(&self, routes: &RouteTable, test_type_name: &str) -> Result<AuthCoverage> {
        AuthCoverage::declare(routes, test_type_name, &self.config.coverage)
    }

    pub async fn run_coverage(
        &self,
        routes: &RouteTable,
        test_type_name: &str,
    ) -> Result<CoverageReport> {
        let coverage = self.coverage(routes, test_type_name)?;
        let env = self.around_env()?;
        Ok(coverage
            .run_with_env(&self.harness, self.dispatcher.as_ref(), env)
            .await)
    }

    /// Stubbed search for the body of `f`, exported under the configured
    /// `elasticsearch.url_env`
    pub async fn with_stubbed_elasticsearch<F, Fut, T>(&self, options: StubOptions, f: F) -> T
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        let config = self.config.elasticsearch.clone().unwrap_or_default();
        with_stubbed_elasticsearch_config(options, &config, f).await
    }

    /// Live cluster client; defaults apply when `elasticsearch` is not configured
    pub fn elasticsearch_cluster(&self) -> Result<ElasticsearchTestCluster> {
        let config = self.config.elasticsearch.clone().unwrap_or_default();
        ElasticsearchTestCluster::new(&config, self.network.clone())
    }
}

impl std::fmt::Debug for IntegrationTest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IntegrationTest")
            .field("config", &self.config)
            .field("network", &self.network)
            .finish_non_exhaustive()
    }
}
