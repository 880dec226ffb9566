use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[cfg(feature = "toml-config")]
use crate::error::EventSystemError;

/// Ordering applied when an event name matches both exact and wildcard
/// registrations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DispatchOrdering {
    /// Two passes: the exact bucket first, then matching wildcard buckets in
    /// pattern registration order. Each pass respects its own priorities.
    #[default]
    ExactThenWildcard,
    /// All matching listeners merged into one priority-sorted list, with
    /// registration order as the stable tiebreak.
    GlobalPriority,
}

/// Dispatcher behavior toggles plus a free-form key/value store.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DispatcherConfig {
    #[serde(default)]
    pub ordering: DispatchOrdering,
    #[serde(flatten)]
    values: HashMap<String, Value>,
}

impl DispatcherConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ordering(ordering: DispatchOrdering) -> Self {
        Self {
            ordering,
            values: HashMap::new(),
        }
    }

    pub fn set(&mut self, key: impl Into<String>, value: Value) {
        self.values.insert(key.into(), value);
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// Parse a configuration from TOML text.
    #[cfg(feature = "toml-config")]
    pub fn from_toml_str(input: &str) -> Result<Self, EventSystemError> {
        toml::from_str(input).map_err(|e| EventSystemError::ConfigFormat {
            details: e.to_string(),
        })
    }
}
