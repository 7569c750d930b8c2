//! Live whole-world state view delivered by the host on every tick.

use std::collections::HashMap;

use serde::Deserialize;
use serde_json::Value;
use timeline_core::TimelineError;

/// State and attributes of a single entity.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct EntityState {
    pub state: String,
    #[serde(default)]
    pub attributes: serde_json::Map<String, Value>,
}

/// The host delivers the full entity map wholesale; cards diff it against
/// their own previous-state cache to find edges.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct StateMap {
    entities: HashMap<String, EntityState>,
}

impl StateMap {
    pub fn from_value(value: &Value) -> Result<Self, TimelineError> {
        serde_json::from_value(value.clone()).map_err(|err| TimelineError::Parse(err.to_string()))
    }

    /// Current state value for an entity. An empty id stands for an
    /// unconfigured sensor and reads as absent.
    pub fn state_of(&self, entity_id: &str) -> Option<&str> {
        if entity_id.is_empty() {
            return None;
        }
        self.entities.get(entity_id).map(|entry| entry.state.as_str())
    }

    pub fn contains(&self, entity_id: &str) -> bool {
        self.entities.contains_key(entity_id)
    }

    pub fn insert(&mut self, entity_id: impl Into<String>, state: impl Into<String>) {
        self.entities.insert(
            entity_id.into(),
            EntityState {
                state: state.into(),
                attributes: serde_json::Map::new(),
            },
        );
    }
}
