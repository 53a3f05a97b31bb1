//! Bearer token issuance.

use chrono::{Duration, Utc};
use jsonwebtoken::{encode, Algorithm, Header};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::keys::SigningKeyPair;
use crate::error::Result;

/// Upper bound on token lifetime (100 years), keeps timestamp math in range
const MAX_TTL_SECS: i64 = 100 * 365 * 24 * 60 * 60;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Expiry, UTC epoch seconds
    pub exp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,
    #[serde(flatten)]
    pub custom: serde_json::Map<String, serde_json::Value>,
}

impl TokenClaims {
    /// Claims expiring `ttl_secs` from now
    pub fn expiring_in(ttl_secs: i64) -> Self {
        let now = Utc::now();
        let ttl = Duration::seconds(ttl_secs.clamp(-MAX_TTL_SECS, MAX_TTL_SECS));
        Self {
            exp: (now + ttl).timestamp(),
            iat: Some(now.timestamp()),
            custom: serde_json::Map::new(),
        }
    }

    pub fn with_claim(mut self, name: impl Into<String>, value: serde_json::Value) -> Self {
        self.custom.insert(name.into(), value);
        self
    }
}

#[derive(Clone, PartialEq, Eq)]
pub struct BearerToken(String);

impl BearerToken {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `Bearer <token>`
    pub fn authorization_value(&self) -> String {
        format!("Bearer {}", self.0)
    }
}

impl fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("BearerToken").field(&"<redacted>").finish()
    }
}

impl fmt::Display for BearerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

pub fn issue_token(
    keypair: &SigningKeyPair,
    algorithm: Algorithm,
    claims: &TokenClaims,
) -> Result<BearerToken> {
    let token = encode(&Header::new(algorithm), claims, keypair.encoding_key())?;
    Ok(BearerToken(token))
}

/// Token that a service trusting `keypair` accepts for `ttl_secs`
pub fn issue_valid_token(
    keypair: &SigningKeyPair,
    algorithm: Algorithm,
    ttl_secs: u64,
) -> Result<BearerToken> {
    let ttl_secs = i64::try_from(ttl_secs).unwrap_or(MAX_TTL_SECS);
    issue_token(keypair, algorithm, &TokenClaims::expiring_in(ttl_secs))
}
