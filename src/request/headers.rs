//! Caller-supplied request headers.
//!
//! A header can be present with a value, or present with an explicit null.
//! The null form is never sent on the wire, but it still counts as "the
//! caller set this header", which is how a test asks for a request without
//! an `Authorization` header and keeps the harness from injecting one.

pub const AUTHORIZATION: &str = "Authorization";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestHeaders {
    entries: Vec<(String, Option<String>)>,
}

impl RequestHeaders {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`RequestHeaders::set`]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(name, value);
        self
    }

    /// Builder form of [`RequestHeaders::unset`]
    pub fn without(mut self, name: impl Into<String>) -> Self {
        self.unset(name);
        self
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.put(name.into(), Some(value.into()));
    }

    /// Mark the header as explicitly null
    pub fn unset(&mut self, name: impl Into<String>) {
        self.put(name.into(), None);
    }

    /// True when the caller mentioned `name`, with a value or as null
    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    /// `Some(None)` for an explicit null, `None` when never mentioned
    pub fn get(&self, name: &str) -> Option<Option<&str>> {
        self.position(name)
            .map(|index| self.entries[index].1.as_deref())
    }

    /// Headers that will actually be sent
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .filter_map(|(name, value)| value.as_deref().map(|value| (name.as_str(), value)))
    }

    /// Number of mentioned headers, null ones included
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.entries
            .iter()
            .position(|(key, _)| key.eq_ignore_ascii_case(name))
    }

    fn put(&mut self, name: String, value: Option<String>) {
        match self.position(&name) {
            Some(index) => self.entries[index].1 = value,
            None => self.entries.push((name, value)),
        }
    }
}
