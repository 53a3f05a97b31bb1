//! HTTP verbs the harness can simulate.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::HarnessError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum HttpVerb {
    Delete,
    Get,
    Head,
    Patch,
    Post,
    Put,
}

impl HttpVerb {
    pub const ALL: [HttpVerb; 6] = [
        HttpVerb::Delete,
        HttpVerb::Get,
        HttpVerb::Head,
        HttpVerb::Patch,
        HttpVerb::Post,
        HttpVerb::Put,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            HttpVerb::Delete => "DELETE",
            HttpVerb::Get => "GET",
            HttpVerb::Head => "HEAD",
            HttpVerb::Patch => "PATCH",
            HttpVerb::Post => "POST",
            HttpVerb::Put => "PUT",
        }
    }

    pub fn as_method(&self) -> http::Method {
        match self {
            HttpVerb::Delete => http::Method::DELETE,
            HttpVerb::Get => http::Method::GET,
            HttpVerb::Head => http::Method::HEAD,
            HttpVerb::Patch => http::Method::PATCH,
            HttpVerb::Post => http::Method::POST,
            HttpVerb::Put => http::Method::PUT,
        }
    }
}

impl fmt::Display for HttpVerb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HttpVerb {
    type Err = HarnessError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        HttpVerb::ALL
            .iter()
            .copied()
            .find(|verb| verb.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| HarnessError::InvalidArgument(format!("Unsupported HTTP verb '{}'", s)))
    }
}

impl TryFrom<String> for HttpVerb {
    type Error = HarnessError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<HttpVerb> for String {
    fn from(verb: HttpVerb) -> Self {
        verb.as_str().to_string()
    }
}
