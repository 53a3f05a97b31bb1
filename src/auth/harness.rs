//! JWT authentication harness.
//!
//! Makes integration tests authenticated by default:
//!
//! ```no_run
//! use containerservice_testing::auth::JwtAuthHarness;
//! use containerservice_testing::request::{
//!     FnDispatcher, HttpVerb, RequestArgs, SimulatedRequest, SimulatedResponse,
//! };
//! # async fn example() -> containerservice_testing::error::Result<()> {
//! let harness = JwtAuthHarness::default();
//! let app = FnDispatcher(|_req: SimulatedRequest| SimulatedResponse::new(http::StatusCode::OK));
//!
//! let _env = harness.default_env_scope()?;
//! // carries `Authorization: Bearer <valid token>`
//! harness.request(&app, HttpVerb::Get, "/widgets", RequestArgs::new()).await?;
//! // carries no Authorization header at all
//! harness
//!     .request(&app, HttpVerb::Get, "/widgets", RequestArgs::new().without_header("Authorization"))
//!     .await?;
//! # Ok(())
//! # }
//! ```

use jsonwebtoken::Algorithm;
use once_cell::sync::OnceCell;

use super::keys::SigningKeyPair;
use super::settings::ValidationSettings;
use super::token::{issue_token, issue_valid_token, BearerToken, TokenClaims};
use crate::config::JwtHarnessConfig;
use crate::env::{EnvOverrides, EnvScope};
use crate::error::Result;
use crate::request::{
    HttpVerb, RequestArgs, RequestDispatcher, RequestHeaders, SimulatedRequest,
    SimulatedResponse, AUTHORIZATION,
};

/// Owns one keypair and one cached token for its whole lifetime
pub struct JwtAuthHarness {
    config: JwtHarnessConfig,
    algorithm: Algorithm,
    keypair: OnceCell<SigningKeyPair>,
    token: OnceCell<BearerToken>,
}

impl Default for JwtAuthHarness {
    fn default() -> Self {
        Self {
            config: JwtHarnessConfig::default(),
            algorithm: Algorithm::RS256,
            keypair: OnceCell::new(),
            token: OnceCell::new(),
        }
    }
}

impl JwtAuthHarness {
    pub fn new(config: JwtHarnessConfig) -> Result<Self> {
        config.validate()?;
        let algorithm = config.jwt_algorithm()?;

        Ok(Self {
            config,
            algorithm,
            keypair: OnceCell::new(),
            token: OnceCell::new(),
        })
    }

    pub fn config(&self) -> &JwtHarnessConfig {
        &self.config
    }

    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    /// Generated on first use
    pub fn keypair(&self) -> Result<&SigningKeyPair> {
        self.keypair
            .get_or_try_init(|| SigningKeyPair::generate(self.config.key_bits))
    }

    /// Issued on first use, then reused by this instance
    pub fn valid_token(&self) -> Result<&BearerToken> {
        self.token.get_or_try_init(|| {
            let keypair = self.keypair()?;
            issue_valid_token(keypair, self.algorithm, self.config.token_ttl_secs)
        })
    }

    /// Sign arbitrary claims with this instance's key, e.g. an expired token
    pub fn issue_token(&self, claims: &TokenClaims) -> Result<BearerToken> {
        issue_token(self.keypair()?, self.algorithm, claims)
    }

    /// Public key, algorithm and `"true"` under the configured variable names
    pub fn default_env(&self) -> Result<EnvOverrides> {
        let keypair = self.keypair()?;
        let names = &self.config.env;

        Ok(EnvOverrides::new()
            .set(&names.public_key, keypair.public_key_pem())
            .set(&names.algorithm, &self.config.algorithm)
            .set(&names.enabled, "true"))
    }

    /// Apply [`JwtAuthHarness::default_env`] until the guard drops
    pub fn default_env_scope(&self) -> Result<EnvScope> {
        Ok(EnvScope::apply(self.default_env()?))
    }

    pub fn validation_settings(&self) -> Result<ValidationSettings> {
        Ok(ValidationSettings {
            enabled: true,
            public_key: Some(self.keypair()?.public_key_pem().to_string()),
            algorithm: Some(self.config.algorithm.clone()),
        })
    }

    /// Add `Authorization: Bearer <token>` unless the caller mentioned the
    /// header, including as an explicit null. Nothing else is touched.
    pub fn authorize(&self, mut args: RequestArgs) -> Result<RequestArgs> {
        let headers = args.headers.get_or_insert_with(RequestHeaders::new);
        if !headers.contains(AUTHORIZATION) {
            headers.set(AUTHORIZATION, self.valid_token()?.authorization_value());
        }
        Ok(args)
    }

    pub async fn request<D>(
        &self,
        dispatcher: &D,
        verb: HttpVerb,
        path: &str,
        args: RequestArgs,
    ) -> Result<SimulatedResponse>
    where
        D: RequestDispatcher + ?Sized,
    {
        let args = self.authorize(args)?;
        dispatcher
            .dispatch(SimulatedRequest::new(verb, path, args))
            .await
    }
}
