// Request simulation module
//
// One generic request path parameterized by `HttpVerb`; there are no
// per-verb entry points.

mod dispatcher;
mod headers;
mod response;
mod verb;

pub use dispatcher::{FnDispatcher, HttpDispatcher, RequestDispatcher};
pub use headers::{RequestHeaders, AUTHORIZATION};
pub use response::{decode_custom_events, SimulatedResponse, CUSTOM_EVENT_HEADER};
pub use verb::HttpVerb;

#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    Json(serde_json::Value),
    Text(String),
}

/// Per-request options, mirroring what an integration test passes alongside
/// the verb and path
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestArgs {
    /// `None` until the caller (or the harness) supplies headers
    pub headers: Option<RequestHeaders>,
    pub params: Vec<(String, String)>,
    pub body: Option<RequestBody>,
}

impl RequestArgs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn headers(mut self, headers: RequestHeaders) -> Self {
        self.headers = Some(headers);
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers
            .get_or_insert_with(RequestHeaders::new)
            .set(name, value);
        self
    }

    /// Explicitly null header, e.g. to send no `Authorization` at all
    pub fn without_header(mut self, name: impl Into<String>) -> Self {
        self.headers
            .get_or_insert_with(RequestHeaders::new)
            .unset(name);
        self
    }

    pub fn param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((name.into(), value.into()));
        self
    }

    pub fn json(mut self, body: serde_json::Value) -> Self {
        self.body = Some(RequestBody::Json(body));
        self
    }

    pub fn text(mut self, body: impl Into<String>) -> Self {
        self.body = Some(RequestBody::Text(body.into()));
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SimulatedRequest {
    pub verb: HttpVerb,
    pub path: String,
    pub args: RequestArgs,
}

impl SimulatedRequest {
    pub fn new(verb: HttpVerb, path: impl Into<String>, args: RequestArgs) -> Self {
        Self {
            verb,
            path: path.into(),
            args,
        }
    }

    /// Value of a header the request will carry; explicit nulls read as absent
    pub fn header(&self, name: &str) -> Option<&str> {
        self.args
            .headers
            .as_ref()
            .and_then(|headers| headers.get(name))
            .flatten()
    }
}
