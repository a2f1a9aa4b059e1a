//! World configuration.

use serde::{Deserialize, Serialize};

use crate::EcsError;

/// Tunables for a [`World`](crate::world::World).
///
/// Every field has a default, so a partial JSON document such as
/// `{"query_cache": false}` is a valid configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WorldConfig {
    /// Memoize query results between structural changes.
    pub query_cache: bool,
    /// Initial capacity of each newly declared component store.
    pub store_capacity: usize,
}

impl Default for WorldConfig {
    /// Query cache on, stores start empty.
    fn default() -> Self {
        Self {
            query_cache: true,
            store_capacity: 0,
        }
    }
}

impl WorldConfig {
    /// Parse a configuration from JSON.
    pub fn from_json(json: &str) -> Result<Self, EcsError> {
        serde_json::from_str(json).map_err(|e| EcsError::InvalidConfig {
            details: e.to_string(),
        })
    }
}
