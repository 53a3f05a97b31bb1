//! Resolve a test-type name such as `Admin::WidgetsControllerTest` to the
//! controller identifier used by the route table (`admin/widgets`).

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{HarnessError, Result};

static ACRONYM_BOUNDARY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([A-Z\d]+)([A-Z][a-z])").expect("static regex"));
static WORD_BOUNDARY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([a-z\d])([A-Z])").expect("static regex"));
static CANONICAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z\d_]+(/[a-z\d_]+)*$").expect("static regex"));

/// `HTTPClients` -> `http_clients`
pub fn underscore(word: &str) -> String {
    let step = ACRONYM_BOUNDARY.replace_all(word, "${1}_${2}");
    WORD_BOUNDARY
        .replace_all(&step, "${1}_${2}")
        .to_ascii_lowercase()
}

/// `WidgetsControllerTest` -> `widgets`; an already canonical identifier
/// (`admin/widgets`) is returned unchanged
pub fn controller_identifier(name: &str) -> Result<String> {
    let name = name.trim();

    if CANONICAL.is_match(name) {
        return Ok(name.to_string());
    }

    let without_test = name.strip_suffix("Test").unwrap_or(name);
    let segments: Vec<&str> = without_test.split("::").collect();
    let (last, namespaces) = match segments.split_last() {
        Some(split) => split,
        None => return Err(HarnessError::InvalidControllerName(name.to_string())),
    };

    let controller = last
        .strip_suffix("Controller")
        .filter(|base| !base.is_empty())
        .ok_or_else(|| HarnessError::InvalidControllerName(name.to_string()))?;

    let mut parts: Vec<String> = Vec::with_capacity(segments.len());
    for segment in namespaces.iter().copied().chain(std::iter::once(controller)) {
        if segment.is_empty() || !segment.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(HarnessError::InvalidControllerName(name.to_string()));
        }
        parts.push(underscore(segment));
    }

    Ok(parts.join("/"))
}
