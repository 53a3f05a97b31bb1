//! JWT harness configuration.
//!
//! Controls how the harness forges credentials for the service under test:
//! - RSA key size and signing algorithm (RS256, RS384, RS512)
//! - Lifetime of issued tokens
//! - Names of the environment variables the service reads its validation
//!   settings from
//!
//! # Key size floor
//!
//! Keys are test-only and may be far below production strength, but an
//! RSASSA-PKCS1-v1_5 signature still needs room for the DigestInfo prefix, the
//! digest and 11 bytes of padding. [`JwtHarnessConfig::min_key_bits`] returns
//! the smallest size accepted for each algorithm.

use jsonwebtoken::Algorithm;
use serde::{Deserialize, Serialize};

use crate::error::{HarnessError, Result};

fn default_algorithm() -> String {
    "RS256".to_string()
}

fn default_key_bits() -> usize {
    1024
}

fn default_token_ttl_secs() -> u64 {
    3600
}

fn default_public_key_var() -> String {
    "PUBLIC_KEY".to_string()
}

fn default_algorithm_var() -> String {
    "VALIDATION_ALGORITHM".to_string()
}

fn default_enabled_var() -> String {
    "VALIDATION_ENABLED".to_string()
}

/// Names of the environment variables carrying validation settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwtEnvNames {
    /// Receives the PEM-encoded public key
    #[serde(default = "default_public_key_var")]
    pub public_key: String,
    /// Receives the algorithm identifier, e.g. `RS256`
    #[serde(default = "default_algorithm_var")]
    pub algorithm: String,
    /// Receives `"true"` so the service actually validates tokens
    #[serde(default = "default_enabled_var")]
    pub enabled: String,
}

impl Default for JwtEnvNames {
    fn default() -> Self {
        Self {
            public_key: default_public_key_var(),
            algorithm: default_algorithm_var(),
            enabled: default_enabled_var(),
        }
    }
}

impl JwtEnvNames {
    /// Same names with a common prefix, e.g. `JWT_` gives `JWT_PUBLIC_KEY`
    pub fn with_prefix(prefix: &str) -> Self {
        let base = Self::default();
        Self {
            public_key: format!("{}{}", prefix, base.public_key),
            algorithm: format!("{}{}", prefix, base.algorithm),
            enabled: format!("{}{}", prefix, base.enabled),
        }
    }
}

/// JWT harness configuration.
///
/// See the [module-level documentation](self) for the key size floor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtHarnessConfig {
    /// Signing algorithm. Only RSA algorithms are supported.
    #[serde(default = "default_algorithm")]
    pub algorithm: String,
    /// RSA modulus size in bits (default: 1024)
    #[serde(default = "default_key_bits")]
    pub key_bits: usize,
    /// Seconds until an issued token expires (default: 3600 = 1 hour)
    #[serde(default = "default_token_ttl_secs")]
    pub token_ttl_secs: u64,
    #[serde(default)]
    pub env: JwtEnvNames,
}

impl Default for JwtHarnessConfig {
    fn default() -> Self {
        Self {
            algorithm: default_algorithm(),
            key_bits: default_key_bits(),
            token_ttl_secs: default_token_ttl_secs(),
            env: JwtEnvNames::default(),
        }
    }
}

impl JwtHarnessConfig {
    /// Parsed signing algorithm
    pub fn jwt_algorithm(&self) -> Result<Algorithm> {
        match self.algorithm.as_str() {
            "RS256" => Ok(Algorithm::RS256),
            "RS384" => Ok(Algorithm::RS384),
            "RS512" => Ok(Algorithm::RS512),
            other => Err(HarnessError::Config(format!(
                "Unsupported JWT algorithm '{}': expected RS256, RS384 or RS512",
                other
            ))),
        }
    }

    /// Smallest RSA key that can carry a PKCS#1 v1.5 signature for `algorithm`
    pub fn min_key_bits(algorithm: Algorithm) -> usize {
        match algorithm {
            Algorithm::RS384 => 768,
            Algorithm::RS512 => 1024,
            _ => 512,
        }
    }

    pub fn validate(&self) -> Result<()> {
        let algorithm = self.jwt_algorithm()?;

        let floor = Self::min_key_bits(algorithm);
        if self.key_bits < floor {
            return Err(HarnessError::Config(format!(
                "jwt.key_bits {} is below the {} floor of {} bits",
                self.key_bits, self.algorithm, floor
            )));
        }

        if self.token_ttl_secs == 0 {
            return Err(HarnessError::Config(
                "jwt.token_ttl_secs must be greater than 0".to_string(),
            ));
        }

        let names = [&self.env.public_key, &self.env.algorithm, &self.env.enabled];
        if names.iter().any(|name| name.trim().is_empty()) {
            return Err(HarnessError::Config(
                "jwt.env variable names must not be empty".to_string(),
            ));
        }
        if names[0] == names[1] || names[0] == names[2] || names[1] == names[2] {
            return Err(HarnessError::Config(
                "jwt.env variable names must be distinct".to_string(),
            ));
        }

        Ok(())
    }
}
