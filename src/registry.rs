//! The action registry: a lookup from an action's definition key to its
//! executable handler. Handlers are registered once at construction; there is
//! no runtime code definition. A catalog entry whose key has no handler
//! surfaces as a warning at run time.

use std::fmt;

use indexmap::IndexMap;
use serde::Serialize;

use crate::host::HostSession;

// ── Error type ──────────────────────────────────────────────────────

/// Error raised by a handler invocation. A handler error is row-fatal: it
/// aborts the remainder of the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionError {
    /// The host rejected or failed the operation.
    Host(String),
    /// The handler was called with arguments it cannot use.
    InvalidArgument(String),
}

impl fmt::Display for ActionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionError::Host(msg) => write!(f, "{msg}"),
            ActionError::InvalidArgument(msg) => write!(f, "invalid argument: {msg}"),
        }
    }
}

impl std::error::Error for ActionError {}

impl Serialize for ActionError {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

// ── Registry ────────────────────────────────────────────────────────

/// A handler performs one action against the host. It receives the gathered
/// string arguments in slot order and may return a status line for the run
/// log.
pub type Handler =
    Box<dyn Fn(&mut dyn HostSession, &[String]) -> Result<Option<String>, ActionError> + Send + Sync>;

/// Insertion-ordered mapping from definition key to handler.
#[derive(Default)]
pub struct Registry {
    handlers: IndexMap<String, Handler>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler under a definition key. A later registration for
    /// the same key replaces the earlier one in place.
    pub fn register<F>(&mut self, key: &str, handler: F)
    where
        F: Fn(&mut dyn HostSession, &[String]) -> Result<Option<String>, ActionError>
            + Send
            + Sync
            + 'static,
    {
        self.handlers.insert(key.to_string(), Box::new(handler));
    }

    pub fn get(&self, key: &str) -> Option<&Handler> {
        self.handlers.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.handlers.contains_key(key)
    }

    /// Registered keys in registration order.
    pub fn keys(&self) -> Vec<String> {
        self.handlers.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("keys", &self.keys())
            .finish()
    }
}
