// Authentication coverage module
//
// Expands a controller's routes into a missing-token (401) case and an
// invalid-token (403) case per route. Rust has no runtime test registration,
// so the cases are data: `AuthCoverage::run` executes all of them and reports
// each outcome separately, and `require_jwt_authentication!` wraps the whole
// thing in a single `#[test]`.

use http::StatusCode;
use std::collections::HashSet;
use std::fmt;
use tracing::{debug, info, warn};

use crate::auth::JwtAuthHarness;
use crate::config::CoverageConfig;
use crate::env::{EnvOverrides, EnvScope};
use crate::error::{HarnessError, Result};
use crate::request::{HttpVerb, RequestArgs, RequestDispatcher, AUTHORIZATION};
use crate::router::{controller_identifier, RouteTable};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CoverageKind {
    MissingToken,
    InvalidToken,
}

impl CoverageKind {
    pub fn expected_status(&self) -> StatusCode {
        match self {
            CoverageKind::MissingToken => StatusCode::UNAUTHORIZED,
            CoverageKind::InvalidToken => StatusCode::FORBIDDEN,
        }
    }

    fn name_suffix(&self) -> &'static str {
        match self {
            CoverageKind::MissingToken => "empty_unauthorized_response_is_returned_if_jwt_is_missing",
            CoverageKind::InvalidToken => {
                "empty_forbidden_response_is_returned_if_invalid_jwt_is_passed"
            }
        }
    }
}

/// One generated check against a single route
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoverageCase {
    pub name: String,
    pub verb: HttpVerb,
    pub path: String,
    pub kind: CoverageKind,
    /// Authorization value sent; `None` sends the header as an explicit null
    pub authorization: Option<String>,
}

impl CoverageCase {
    pub fn expected_status(&self) -> StatusCode {
        self.kind.expected_status()
    }

    pub fn request_args(&self) -> RequestArgs {
        match &self.authorization {
            Some(value) => RequestArgs::new().header(AUTHORIZATION, value.as_str()),
            None => RequestArgs::new().without_header(AUTHORIZATION),
        }
    }

    /// Issue the request through the harness and compare the status
    pub async fn run<D>(&self, harness: &JwtAuthHarness, dispatcher: &D) -> CaseOutcome
    where
        D: RequestDispatcher + ?Sized,
    {
        let expected = self.expected_status();
        match harness
            .request(dispatcher, self.verb, &self.path, self.request_args())
            .await
        {
            Ok(response) if response.status == expected => CaseOutcome::Passed,
            Ok(response) => CaseOutcome::UnexpectedStatus {
                expected,
                actual: response.status,
            },
            Err(e) => CaseOutcome::Errored(e.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaseOutcome {
    Passed,
    UnexpectedStatus {
        expected: StatusCode,
        actual: StatusCode,
    },
    Errored(String),
}

impl CaseOutcome {
    pub fn is_passed(&self) -> bool {
        matches!(self, CaseOutcome::Passed)
    }
}

impl fmt::Display for CaseOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CaseOutcome::Passed => write!(f, "passed"),
            CaseOutcome::UnexpectedStatus { expected, actual } => {
                write!(f, "expected response to be {}, but was {}", expected, actual)
            }
            CaseOutcome::Errored(message) => write!(f, "request failed: {}", message),
        }
    }
}

/// Cases generated for one controller
#[derive(Debug, Clone)]
pub struct AuthCoverage {
    controller: String,
    cases: Vec<CoverageCase>,
}

impl AuthCoverage {
    /// `test_type_name` is the test type (`WidgetsControllerTest`), the
    /// controller type (`WidgetsController`) or a canonical identifier
    /// (`widgets`)
    pub fn declare(
        routes: &RouteTable,
        test_type_name: &str,
        config: &CoverageConfig,
    ) -> Result<Self> {
        let controller = controller_identifier(test_type_name)?;
        let matched = routes.for_controller(&controller);

        if matched.is_empty() {
            if !config.allow_empty {
                return Err(HarnessError::NoRoutesForController(controller));
            }
            warn!(
                controller = %controller,
                "No routes matched controller, no authentication cases generated"
            );
        }

        let mut used_names = HashSet::new();
        let mut cases = Vec::with_capacity(matched.len() * 2);
        for route in matched {
            let path = route.format_default()?;
            let slug = path_slug(&path);

            for kind in [CoverageKind::MissingToken, CoverageKind::InvalidToken] {
                let base = format!(
                    "test_{}_{}_{}",
                    route.verb.as_str().to_ascii_lowercase(),
                    slug,
                    kind.name_suffix()
                );
                let name = unique_name(base, &mut used_names);
                let authorization = match kind {
                    CoverageKind::MissingToken => None,
                    CoverageKind::InvalidToken => Some(config.invalid_authorization.clone()),
                };
                cases.push(CoverageCase {
                    name,
                    verb: route.verb,
                    path: path.clone(),
                    kind,
                    authorization,
                });
            }
        }

        debug!(
            controller = %controller,
            cases = cases.len(),
            "Declared authentication coverage"
        );

        Ok(Self { controller, cases })
    }

    pub fn controller(&self) -> &str {
        &self.controller
    }

    pub fn cases(&self) -> &[CoverageCase] {
        &self.cases
    }

    pub fn len(&self) -> usize {
        self.cases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cases.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.cases.iter().map(|case| case.name.as_str())
    }

    /// Run every case inside the harness default environment. A failing case
    /// never stops the ones after it.
    pub async fn run<D>(&self, harness: &JwtAuthHarness, dispatcher: &D) -> CoverageReport
    where
        D: RequestDispatcher + ?Sized,
    {
        self.run_in(harness, dispatcher, harness.default_env()).await
    }

    /// Like [`AuthCoverage::run`], with `env` applied around each case instead
    /// of the harness default environment
    pub async fn run_with_env<D>(
        &self,
        harness: &JwtAuthHarness,
        dispatcher: &D,
        env: EnvOverrides,
    ) -> CoverageReport
    where
        D: RequestDispatcher + ?Sized,
    {
        self.run_in(harness, dispatcher, Ok(env)).await
    }

    async fn run_in<D>(
        &self,
        harness: &JwtAuthHarness,
        dispatcher: &D,
        env: Result<EnvOverrides>,
    ) -> CoverageReport
    where
        D: RequestDispatcher + ?Sized,
    {
        let mut outcomes = Vec::with_capacity(self.cases.len());

        for case in &self.cases {
            let outcome = match &env {
                Ok(env) => {
                    let _scope = EnvScope::apply(env.clone());
                    case.run(harness, dispatcher).await
                }
                Err(e) => CaseOutcome::Errored(e.to_string()),
            };

            if outcome.is_passed() {
                debug!(case = %case.name, "Authentication case passed");
            } else {
                warn!(case = %case.name, outcome = %outcome, "Authentication case failed");
            }
            outcomes.push((case.clone(), outcome));
        }

        let report = CoverageReport {
            controller: self.controller.clone(),
            outcomes,
        };
        info!(
            controller = %report.controller,
            passed = report.passed(),
            failed = report.failures().count(),
            "Authentication coverage finished"
        );
        report
    }
}

#[derive(Debug, Clone)]
pub struct CoverageReport {
    controller: String,
    outcomes: Vec<(CoverageCase, CaseOutcome)>,
}

impl CoverageReport {
    pub fn controller(&self) -> &str {
        &self.controller
    }

    pub fn outcomes(&self) -> &[(CoverageCase, CaseOutcome)] {
        &self.outcomes
    }

    /// Number of passing cases
    pub fn passed(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|(_, outcome)| outcome.is_passed())
            .count()
    }

    pub fn failures(&self) -> impl Iterator<Item = &(CoverageCase, CaseOutcome)> {
        self.outcomes
            .iter()
            .filter(|(_, outcome)| !outcome.is_passed())
    }

    pub fn is_success(&self) -> bool {
        self.failures().next().is_none()
    }

    /// Panics with one line per failing case
    pub fn assert_passed(&self) {
        if self.is_success() {
            return;
        }

        let lines: Vec<String> = self
            .failures()
            .map(|(case, outcome)| {
                format!("  {} ({} {}): {}", case.name, case.verb, case.path, outcome)
            })
            .collect();
        panic!(
            "{} of {} authentication cases failed for controller '{}':\n{}",
            lines.len(),
            self.outcomes.len(),
            self.controller,
            lines.join("\n")
        );
    }
}

/// `/admin/widgets.json` -> `admin_widgets_json`, `/` -> `root`
fn path_slug(path: &str) -> String {
    let mut slug = String::with_capacity(path.len());
    for c in path.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('_') {
            slug.push('_');
        }
    }
    while slug.ends_with('_') {
        slug.pop();
    }

    if slug.is_empty() {
        "root".to_string()
    } else {
        slug
    }
}

fn unique_name(base: String, used: &mut HashSet<String>) -> String {
    if used.insert(base.clone()) {
        return base;
    }
    let mut n = 2;
    loop {
        let candidate = format!("{}_{}", base, n);
        if used.insert(candidate.clone()) {
            return candidate;
        }
        n += 1;
    }
}

/// Declare, run and assert authentication coverage for a controller as one
/// `#[test]` driven by a current-thread runtime. The runtime comes from this
/// crate's `tokio`, so callers need no `tokio` dependency of their own.
///
/// ```ignore
/// require_jwt_authentication!(
///     widgets_controller_requires_jwt,
///     "WidgetsControllerTest",
///     routes = app_routes(),
///     dispatcher = widgets_app(),
/// );
/// ```
///
/// An optional `config = <HarnessConfig>` argument supplies the JWT and
/// coverage settings.
#[macro_export]
macro_rules! require_jwt_authentication {
    (
        $test_name:ident,
        $type_name:expr,
        routes = $routes:expr,
        dispatcher = $dispatcher:expr,
        config = $config:expr $(,)?
    ) => {
        #[test]
        fn $test_name() {
            let config: $crate::config::HarnessConfig = $config;
            let harness = $crate::auth::JwtAuthHarness::new(config.jwt.clone())
                .expect("invalid JWT harness configuration");
            let routes: $crate::router::RouteTable = $routes;
            let coverage =
                $crate::coverage::AuthCoverage::declare(&routes, $type_name, &config.coverage)
                    .expect("failed to declare authentication coverage");
            let dispatcher = $dispatcher;
            $crate::tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .expect("failed to build test runtime")
                .block_on(coverage.run(&harness, &dispatcher))
                .assert_passed();
        }
    };
    (
        $test_name:ident,
        $type_name:expr,
        routes = $routes:expr,
        dispatcher = $dispatcher:expr $(,)?
    ) => {
        $crate::require_jwt_authentication!(
            $test_name,
            $type_name,
            routes = $routes,
            dispatcher = $dispatcher,
            config = $crate::config::HarnessConfig::default(),
        );
    };
}
