// Error types module

use thiserror::Error;

/// Centralized error type for the test harness
///
/// Setup problems (config, key generation, unreachable cluster) are fatal to
/// the enclosing test. Assertion failures are not represented here; they are
/// reported per coverage case.
#[derive(Error, Debug)]
pub enum HarnessError {
    /// Configuration errors (invalid YAML, missing env vars, cluster not running, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// RSA keypair could not be generated or encoded
    #[error("Key generation error: {0}")]
    KeyGeneration(String),

    /// Claims could not be signed into a token
    #[error("Token signing error: {0}")]
    TokenSigning(#[from] jsonwebtoken::errors::Error),

    /// A route template needs a parameter that was not supplied
    #[error("Route '{path}' cannot be formatted without required parameter ':{param}'")]
    MissingRouteParameter { path: String, param: String },

    /// Coverage was declared for a controller with no routes
    #[error("No routes found for controller '{0}'; authentication coverage would be empty")]
    NoRoutesForController(String),

    /// A test-type name could not be resolved to a controller identifier
    #[error("Cannot resolve controller from '{0}'")]
    InvalidControllerName(String),

    /// Outbound request refused by the network policy
    #[error("Real HTTP connections are disabled. Unregistered request to {0}")]
    NetConnectNotAllowed(String),

    /// Transport-level HTTP failure
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Elasticsearch answered with an unexpected status
    #[error("Elasticsearch error: {0}")]
    Elasticsearch(String),

    /// Caller passed an unusable argument
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A response header did not follow its encoding contract
    #[error("Invalid header: {0}")]
    InvalidHeader(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, HarnessError>;
