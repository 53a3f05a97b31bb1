// Container service test harness
//
// JWT token forging and auth coverage, scoped environment overrides, a
// local-only network policy and Elasticsearch test helpers.

pub mod auth;
pub mod config;
pub mod coverage;
pub mod elasticsearch;
pub mod env;
pub mod error;
pub mod integration;
pub mod logging;
pub mod network;
pub mod request;
pub mod router;

// Runtime for tests generated by `require_jwt_authentication!`
#[doc(hidden)]
pub use tokio;
