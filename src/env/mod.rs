//! Scoped environment-variable overrides.
//!
//! An [`EnvScope`] sets (or unsets) a group of variables and restores every
//! one of them to its previous state when dropped. Because restoration lives
//! in `Drop`, it also runs when the wrapped test returns early with an error
//! or panics.
//!
//! The process environment is shared by every test thread, so each scope
//! holds a process-wide re-entrant lock for its whole lifetime. Scopes on the
//! same thread nest freely; scopes on other threads wait.
//!
//! Scopes on one thread do not have to end in the order they began (guards
//! dropped out of order, or two async scopes joined on a current-thread
//! runtime). Every touched variable keeps a stack of layers, one per live
//! scope. Dropping a scope removes its own layer and the variable takes the
//! value of the newest remaining layer, or its original value once no scope
//! touches it.
//!
//! ```
//! use containerservice_testing::env::{with_modified_env, EnvOverrides};
//!
//! with_modified_env(EnvOverrides::new().set("VALIDATION_ENABLED", "false"), || {
//!     assert_eq!(std::env::var("VALIDATION_ENABLED").unwrap(), "false");
//! });
//! ```

use parking_lot::{ReentrantMutex, ReentrantMutexGuard};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::ffi::OsString;
use std::future::Future;

static ENV_LOCK: ReentrantMutex<RefCell<EnvLayers>> =
    parking_lot::const_reentrant_mutex(RefCell::new(EnvLayers::new()));

/// Live overrides per variable, shared by every scope
struct EnvLayers {
    next_id: u64,
    vars: BTreeMap<String, VarLayers>,
}

struct VarLayers {
    /// Value before the first live scope touched the variable
    original: Option<OsString>,
    /// `(scope id, value)`, oldest first
    layers: Vec<(u64, Option<OsString>)>,
}

impl EnvLayers {
    const fn new() -> Self {
        Self {
            next_id: 0,
            vars: BTreeMap::new(),
        }
    }

    fn push(&mut self, overrides: EnvOverrides) -> (u64, Vec<String>) {
        let id = self.next_id;
        self.next_id += 1;

        let mut names = Vec::with_capacity(overrides.len());
        for (name, value) in overrides.vars {
            let value = value.map(OsString::from);
            write_var(&name, value.as_ref());
            self.vars
                .entry(name.clone())
                .or_insert_with(|| VarLayers {
                    original: std::env::var_os(&name),
                    layers: Vec::new(),
                })
                .layers
                .push((id, value));
            names.push(name);
        }
        (id, names)
    }

    fn pop(&mut self, id: u64, names: &[String]) {
        for name in names {
            let Some(var) = self.vars.get_mut(name) else {
                continue;
            };
            var.layers.retain(|(layer, _)| *layer != id);

            let released = match var.layers.last() {
                Some((_, value)) => {
                    write_var(name, value.as_ref());
                    false
                }
                None => {
                    write_var(name, var.original.as_ref());
                    true
                }
            };
            if released {
                self.vars.remove(name);
            }
        }
    }
}

fn write_var(name: &str, value: Option<&OsString>) {
    match value {
        Some(value) => std::env::set_var(name, value),
        None => std::env::remove_var(name),
    }
}

/// Ordered set of variable changes; `None` removes the variable
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvOverrides {
    vars: Vec<(String, Option<String>)>,
}

impl EnvOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(name.into(), Some(value.into()));
        self
    }

    pub fn unset(mut self, name: impl Into<String>) -> Self {
        self.insert(name.into(), None);
        self
    }

    /// Layer `other` on top of `self`; later values win
    pub fn merge(mut self, other: EnvOverrides) -> Self {
        for (name, value) in other.vars {
            self.insert(name, value);
        }
        self
    }

    pub fn get(&self, name: &str) -> Option<Option<&str>> {
        self.vars
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_deref())
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.vars
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_deref()))
    }

    fn insert(&mut self, name: String, value: Option<String>) {
        match self.vars.iter_mut().find(|(key, _)| *key == name) {
            Some(entry) => entry.1 = value,
            None => self.vars.push((name, value)),
        }
    }
}

impl<K, V> FromIterator<(K, V)> for EnvOverrides
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        iter.into_iter()
            .fold(EnvOverrides::new(), |overrides, (k, v)| overrides.set(k, v))
    }
}

/// Guard restoring the environment on drop
pub struct EnvScope {
    id: u64,
    names: Vec<String>,
    lock: ReentrantMutexGuard<'static, RefCell<EnvLayers>>,
}

impl EnvScope {
    pub fn apply(overrides: EnvOverrides) -> Self {
        let lock = ENV_LOCK.lock();
        // No borrow escapes `push`, so nested scopes on this thread never
        // observe a live borrow.
        let (id, names) = lock.borrow_mut().push(overrides);

        tracing::trace!(scope = id, vars = names.len(), "Applied environment overrides");

        Self { id, names, lock }
    }

    /// Names touched by this scope, in application order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }
}

impl Drop for EnvScope {
    fn drop(&mut self) {
        self.lock.borrow_mut().pop(self.id, &self.names);
        tracing::trace!(scope = self.id, "Restored environment");
    }
}

/// Run `f` with `overrides` applied, restoring afterwards
pub fn with_modified_env<F, T>(overrides: EnvOverrides, f: F) -> T
where
    F: FnOnce() -> T,
{
    let _scope = EnvScope::apply(overrides);
    f()
}

/// Async form of [`with_modified_env`]. The returned future is `!Send`
/// because it holds the environment lock; drive it with a current-thread
/// runtime such as `#[tokio::test]`.
pub async fn with_modified_env_async<F, Fut, T>(overrides: EnvOverrides, f: F) -> T
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = T>,
{
    let _scope = EnvScope::apply(overrides);
    f().await
}
