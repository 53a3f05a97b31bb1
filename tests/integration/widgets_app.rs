// In-process stand-in for a JWT-protected container service
//
// Reads its validation settings from the environment on every request, the
// way a real service reads PUBLIC_KEY / VALIDATION_ALGORITHM /
// VALIDATION_ENABLED at request time.

use async_trait::async_trait;
use containerservice_testing::auth::ValidationSettings;
use containerservice_testing::config::JwtEnvNames;
use containerservice_testing::error::Result;
use containerservice_testing::request::{
    HttpVerb, RequestDispatcher, SimulatedRequest, SimulatedResponse, AUTHORIZATION,
};
use containerservice_testing::router::RouteTable;
use http::StatusCode;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde_json::{json, Value};
use std::str::FromStr;

pub fn widgets_routes() -> RouteTable {
    RouteTable::new()
        .route(HttpVerb::Get, "/widgets(.:format)", "widgets#index")
        .route(HttpVerb::Post, "/widgets(.:format)", "widgets#create")
        .route(HttpVerb::Get, "/search(.:format)", "search#index")
        .route(HttpVerb::Get, "/health", "health#show")
}

#[derive(Debug, Default)]
pub struct WidgetsApp {
    names: JwtEnvNames,
}

impl WidgetsApp {
    pub fn with_env_names(names: JwtEnvNames) -> Self {
        Self { names }
    }

    /// None when the request may proceed
    fn reject(&self, request: &SimulatedRequest) -> Option<StatusCode> {
        let settings = ValidationSettings::from_env(&self.names);
        if !settings.enabled {
            return None;
        }

        let header = match request.header(AUTHORIZATION) {
            Some(header) if !header.is_empty() => header,
            _ => return Some(StatusCode::UNAUTHORIZED),
        };
        let token = match header.strip_prefix("Bearer ") {
            Some(token) => token,
            None => return Some(StatusCode::FORBIDDEN),
        };

        let (Some(public_key), Some(algorithm)) = (settings.public_key, settings.algorithm) else {
            return Some(StatusCode::INTERNAL_SERVER_ERROR);
        };
        let verified = DecodingKey::from_rsa_pem(public_key.as_bytes())
            .ok()
            .zip(Algorithm::from_str(&algorithm).ok())
            .map(|(key, algorithm)| decode::<Value>(token, &key, &Validation::new(algorithm)).is_ok())
            .unwrap_or(false);

        if verified {
            None
        } else {
            Some(StatusCode::FORBIDDEN)
        }
    }

    async fn search(&self, request: &SimulatedRequest) -> Result<SimulatedResponse> {
        let base = match std::env::var("ELASTICSEARCH_URL") {
            Ok(url) => url,
            Err(_) => return Ok(SimulatedResponse::new(StatusCode::SERVICE_UNAVAILABLE)),
        };
        let query = request
            .args
            .params
            .iter()
            .find(|(name, _)| name == "q")
            .map(|(_, value)| value.clone())
            .unwrap_or_default();

        let body: Value = reqwest::Client::new()
            .get(format!("{}/widgets/_search", base))
            .query(&[("q", query)])
            .send()
            .await?
            .json()
            .await?;

        let names: Vec<Value> = body["hits"]["hits"]
            .as_array()
            .map(|hits| hits.iter().map(|hit| hit["_source"]["name"].clone()).collect())
            .unwrap_or_default();
        let payload = json!({ "total": body["hits"]["total"], "names": names });

        Ok(SimulatedResponse::new(StatusCode::OK).with_body(payload.to_string()))
    }
}

#[async_trait]
impl RequestDispatcher for WidgetsApp {
    async fn dispatch(&self, request: SimulatedRequest) -> Result<SimulatedResponse> {
        if request.path == "/health" {
            return Ok(SimulatedResponse::new(StatusCode::OK));
        }
        if let Some(status) = self.reject(&request) {
            return Ok(SimulatedResponse::new(status));
        }

        match (request.verb, request.path.as_str()) {
            (HttpVerb::Get, "/widgets") => Ok(SimulatedResponse::new(StatusCode::OK)
                .with_body(json!([{"id": 1, "name": "Sprocket"}]).to_string())),
            (HttpVerb::Post, "/widgets") => SimulatedResponse::new(StatusCode::CREATED)
                .with_header("X-Custom-Event", "simple widget-created"),
            (HttpVerb::Get, "/search") => self.search(&request).await,
            _ => Ok(SimulatedResponse::new(StatusCode::NOT_FOUND)),
        }
    }
}
