use std::any::Any;

use serde::Serialize;
use serde_json::Value;

use crate::{Event, EventId};

/// Event synthesized from a plain string name and positional arguments.
///
/// Used by the `dispatch_named` convenience path; listeners can downcast
/// the received `&dyn Event` to read the positional payload.
#[derive(Debug, Clone)]
pub struct NamedEvent {
    name: String,
    args: Vec<Value>,
}

impl NamedEvent {
    pub fn new(name: impl Into<String>, args: Vec<Value>) -> Self {
        Self {
            name: name.into(),
            args,
        }
    }

    /// Positional arguments supplied at dispatch time.
    pub fn args(&self) -> &[Value] {
        &self.args
    }
}

impl Event for NamedEvent {
    fn name(&self) -> &str {
        &self.name
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Introspection record for one registration, as returned by `get_listeners`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListenerInfo {
    /// Registration identifier returned by `listen`/`listen_once`
    pub id: EventId,
    /// Exact event name or wildcard pattern text the listener is keyed under
    pub key: String,
    /// Higher runs first
    pub priority: i32,
    /// Whether the listener self-removes after its first invocation
    pub once: bool,
    /// Whether `key` is a wildcard pattern
    pub wildcard: bool,
}
