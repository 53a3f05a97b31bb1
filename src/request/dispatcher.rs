//! Request dispatchers: the seam between the harness and the service under test.

use async_trait::async_trait;
use http::header::{HeaderName, HeaderValue};
use http::StatusCode;
use std::sync::Arc;
use std::time::Duration;

use super::{HttpVerb, RequestBody, SimulatedRequest, SimulatedResponse};
use crate::config::AppConfig;
use crate::error::{HarnessError, Result};
use crate::network::NetworkPolicy;

/// Performs a simulated request against the service under test
#[async_trait]
pub trait RequestDispatcher: Send + Sync {
    async fn dispatch(&self, request: SimulatedRequest) -> Result<SimulatedResponse>;
}

#[async_trait]
impl<T: RequestDispatcher + ?Sized> RequestDispatcher for Arc<T> {
    async fn dispatch(&self, request: SimulatedRequest) -> Result<SimulatedResponse> {
        (**self).dispatch(request).await
    }
}

/// Adapts a synchronous closure, handy for in-process fakes
pub struct FnDispatcher<F>(pub F);

#[async_trait]
impl<F> RequestDispatcher for FnDispatcher<F>
where
    F: Fn(SimulatedRequest) -> SimulatedResponse + Send + Sync,
{
    async fn dispatch(&self, request: SimulatedRequest) -> Result<SimulatedResponse> {
        Ok((self.0)(request))
    }
}

/// Sends requests to a running service over HTTP
pub struct HttpDispatcher {
    base_url: String,
    client: reqwest::Client,
    policy: NetworkPolicy,
}

impl HttpDispatcher {
    pub fn new(base_url: &str, timeout: Duration, policy: NetworkPolicy) -> Result<Self> {
        policy.check(base_url)?;

        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
            policy,
        })
    }

    pub fn from_config(config: &AppConfig, policy: NetworkPolicy) -> Result<Self> {
        Self::new(
            &config.base_url,
            Duration::from_secs(config.timeout_secs),
            policy,
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }
}

fn reqwest_method(verb: HttpVerb) -> reqwest::Method {
    match verb {
        HttpVerb::Delete => reqwest::Method::DELETE,
        HttpVerb::Get => reqwest::Method::GET,
        HttpVerb::Head => reqwest::Method::HEAD,
        HttpVerb::Patch => reqwest::Method::PATCH,
        HttpVerb::Post => reqwest::Method::POST,
        HttpVerb::Put => reqwest::Method::PUT,
    }
}

#[async_trait]
impl RequestDispatcher for HttpDispatcher {
    async fn dispatch(&self, request: SimulatedRequest) -> Result<SimulatedResponse> {
        let url = self.url(&request.path);
        self.policy.check(&url)?;

        let mut builder = self.client.request(reqwest_method(request.verb), &url);

        if let Some(headers) = &request.args.headers {
            for (name, value) in headers.iter() {
                builder = builder.header(name, value);
            }
        }
        if !request.args.params.is_empty() {
            builder = builder.query(&request.args.params);
        }
        match request.args.body {
            Some(RequestBody::Json(value)) => builder = builder.json(&value),
            Some(RequestBody::Text(text)) => builder = builder.body(text),
            None => {}
        }

        let response = builder.send().await?;

        let status = StatusCode::from_u16(response.status().as_u16())
            .map_err(|e| HarnessError::InvalidArgument(e.to_string()))?;
        let mut simulated = SimulatedResponse::new(status);
        for (name, value) in response.headers() {
            let name = HeaderName::from_bytes(name.as_str().as_bytes())
                .map_err(|e| HarnessError::InvalidHeader(e.to_string()))?;
            let value = HeaderValue::from_bytes(value.as_bytes())
                .map_err(|e| HarnessError::InvalidHeader(e.to_string()))?;
            simulated.headers.append(name, value);
        }
        simulated.body = response.bytes().await?;

        tracing::debug!(
            verb = %request.verb,
            url = %url,
            status = simulated.status.as_u16(),
            "Dispatched request"
        );

        Ok(simulated)
    }
}
