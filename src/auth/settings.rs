//! Validation settings as the service under test sees them.
//!
//! Services that read their JWT settings from the environment get them via
//! the default env scope. Services configured by injection can take a
//! [`ValidationSettings`] straight from the harness instead.

use serde::{Deserialize, Serialize};

use crate::config::JwtEnvNames;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationSettings {
    pub enabled: bool,
    pub public_key: Option<String>,
    pub algorithm: Option<String>,
}

impl ValidationSettings {
    /// Read the settings contract from the process environment
    pub fn from_env(names: &JwtEnvNames) -> Self {
        let read = |name: &str| std::env::var(name).ok().filter(|v| !v.is_empty());

        Self {
            enabled: read(&names.enabled)
                .map(|v| v.eq_ignore_ascii_case("true"))
                .unwrap_or(false),
            public_key: read(&names.public_key),
            algorithm: read(&names.algorithm),
        }
    }
}
