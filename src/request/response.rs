//! Response returned by a [`RequestDispatcher`](super::RequestDispatcher).

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use bytes::Bytes;
use http::header::{HeaderMap, HeaderName, HeaderValue};
use http::StatusCode;
use serde::de::DeserializeOwned;

use crate::error::{HarnessError, Result};

pub const CUSTOM_EVENT_HEADER: &str = "X-Custom-Event";

const SIMPLE_PREFIX: &str = "simple ";
const MULTI_ENCODED_PREFIX: &str = "multi-encoded ";

#[derive(Debug, Clone)]
pub struct SimulatedResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl SimulatedResponse {
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: Bytes::new(),
        }
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Result<Self> {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| HarnessError::InvalidHeader(format!("{}: {}", name, e)))?;
        let value = HeaderValue::from_str(value)
            .map_err(|e| HarnessError::InvalidHeader(format!("{}: {}", name, e)))?;
        self.headers.append(name, value);
        Ok(self)
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|value| value.to_str().ok())
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_slice(&self.body)?)
    }

    /// Events announced through `X-Custom-Event`; empty when the header is absent
    pub fn custom_events(&self) -> Result<Vec<String>> {
        match self.header(CUSTOM_EVENT_HEADER) {
            Some(value) => decode_custom_events(value),
            None => Ok(Vec::new()),
        }
    }
}

/// Decode an `X-Custom-Event` value.
///
/// `simple <event>` carries one plain value. `multi-encoded <b64>, <b64>`
/// carries several base64 values separated by `", "`.
pub fn decode_custom_events(value: &str) -> Result<Vec<String>> {
    if let Some(event) = value.strip_prefix(SIMPLE_PREFIX) {
        return Ok(vec![event.to_string()]);
    }

    if let Some(encoded) = value.strip_prefix(MULTI_ENCODED_PREFIX) {
        return encoded
            .split(", ")
            .map(|segment| {
                let raw = STANDARD.decode(segment.trim()).map_err(|e| {
                    HarnessError::InvalidHeader(format!(
                        "{} segment '{}' is not base64: {}",
                        CUSTOM_EVENT_HEADER, segment, e
                    ))
                })?;
                String::from_utf8(raw).map_err(|e| {
                    HarnessError::InvalidHeader(format!(
                        "{} segment '{}' is not UTF-8: {}",
                        CUSTOM_EVENT_HEADER, segment, e
                    ))
                })
            })
            .collect();
    }

    Err(HarnessError::InvalidHeader(format!(
        "{} value '{}' has no known prefix",
        CUSTOM_EVENT_HEADER, value
    )))
}
