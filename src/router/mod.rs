// Router module
//
// Read-only view of the service's routing table. Routes are declared in code
// or loaded from YAML:
//
//   routes:
//     - verb: GET
//       path: /widgets(.:format)
//       to: widgets#index

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

use crate::error::{HarnessError, Result};
use crate::request::HttpVerb;

mod controller;
mod path;

pub use controller::{controller_identifier, underscore};
pub use path::PathTemplate;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteDescriptor {
    pub verb: HttpVerb,
    pub path: PathTemplate,
    pub controller: String,
    pub action: Option<String>,
}

impl RouteDescriptor {
    /// `to` is `controller#action` or just `controller`
    pub fn new(verb: HttpVerb, path: &str, to: &str) -> Result<Self> {
        let (controller, action) = match to.split_once('#') {
            Some((controller, action)) => (controller, Some(action.to_string())),
            None => (to, None),
        };
        if controller.trim().is_empty() {
            return Err(HarnessError::InvalidArgument(format!(
                "Route '{} {}' has no controller",
                verb, path
            )));
        }

        Ok(Self {
            verb,
            path: PathTemplate::parse(path)?,
            controller: controller.trim().to_string(),
            action: action.filter(|a| !a.is_empty()),
        })
    }

    pub fn format(&self, params: &HashMap<String, String>) -> Result<String> {
        self.path.format(params)
    }

    /// Path with no parameters supplied
    pub fn format_default(&self) -> Result<String> {
        self.format(&HashMap::new())
    }
}

#[derive(Debug, Deserialize, Serialize)]
struct RouteEntry {
    verb: HttpVerb,
    path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    to: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    controller: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    action: Option<String>,
}

impl TryFrom<RouteEntry> for RouteDescriptor {
    type Error = HarnessError;

    fn try_from(entry: RouteEntry) -> Result<Self> {
        let to = match (entry.to, entry.controller) {
            (Some(to), _) => to,
            (None, Some(controller)) => match entry.action {
                Some(action) => format!("{}#{}", controller, action),
                None => controller,
            },
            (None, None) => {
                return Err(HarnessError::Config(format!(
                    "Route '{} {}' needs either 'to' or 'controller'",
                    entry.verb, entry.path
                )))
            }
        };
        RouteDescriptor::new(entry.verb, &entry.path, &to)
    }
}

#[derive(Debug, Deserialize)]
struct RouteFile {
    #[serde(default)]
    routes: Vec<RouteEntry>,
}

#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    routes: Vec<RouteDescriptor>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form; panics on an invalid template, meant for literal tables in tests
    pub fn route(mut self, verb: HttpVerb, path: &str, to: &str) -> Self {
        match RouteDescriptor::new(verb, path, to) {
            Ok(route) => self.routes.push(route),
            Err(e) => panic!("invalid route {} {}: {}", verb, path, e),
        }
        self
    }

    pub fn push(&mut self, route: RouteDescriptor) {
        self.routes.push(route);
    }

    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let file: RouteFile = serde_yaml::from_str(yaml)?;
        let routes = file
            .routes
            .into_iter()
            .map(RouteDescriptor::try_from)
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { routes })
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let yaml = std::fs::read_to_string(path)
            .map_err(|e| HarnessError::Config(format!("Failed to read routes file: {}", e)))?;
        Self::from_yaml(&yaml)
    }

    /// Routes whose controller identifier equals `controller`, in table order
    pub fn for_controller(&self, controller: &str) -> Vec<&RouteDescriptor> {
        self.routes
            .iter()
            .filter(|route| route.controller == controller)
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RouteDescriptor> {
        self.routes.iter()
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

impl FromIterator<RouteDescriptor> for RouteTable {
    fn from_iter<I: IntoIterator<Item = RouteDescriptor>>(iter: I) -> Self {
        Self {
            routes: iter.into_iter().collect(),
        }
    }
}
