// Authentication module
//
// Forges credentials for the service under test. Nothing here validates
// tokens; that is the service's job.

mod harness;
mod keys;
mod settings;
mod token;

pub use harness::JwtAuthHarness;
pub use keys::SigningKeyPair;
pub use settings::ValidationSettings;
pub use token::{issue_token, issue_valid_token, BearerToken, TokenClaims};
