//! Memoized query results.
//!
//! The cache is keyed by the exact sequence of component type ids a query
//! named, in the order it named them. `(A, B)` and `(B, A)` are separate
//! entries. Any structural change to a type purges every entry whose key
//! mentions it; destroying an entity purges everything.

use std::any::Any;
use std::collections::HashMap;
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::component::ComponentTypeId;

/// Shared, immutable list of query rows. Cache hits hand out the same
/// allocation, not a copy.
pub type QueryResult<R> = Rc<Vec<R>>;

// ---------------------------------------------------------------------------
// CacheStats
// ---------------------------------------------------------------------------

/// Counters describing cache behaviour since the last reset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    /// Queries answered from a stored entry.
    pub hits: u64,
    /// Queries that had to be computed.
    pub misses: u64,
    /// Entries purged by invalidation or clearing.
    pub invalidations: u64,
}

// ---------------------------------------------------------------------------
// QueryCache
// ---------------------------------------------------------------------------

/// Query result cache owned by a [`World`](crate::world::World).
#[derive(Debug)]
pub struct QueryCache {
    enabled: bool,
    entries: HashMap<Vec<ComponentTypeId>, Rc<dyn Any>>,
    stats: CacheStats,
}

impl QueryCache {
    /// Create an empty cache. A disabled cache never stores anything, so
    /// every lookup misses.
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            entries: HashMap::new(),
            stats: CacheStats::default(),
        }
    }

    /// Look up the rows stored under `key`.
    pub fn get<R: 'static>(&mut self, key: &[ComponentTypeId]) -> Option<QueryResult<R>> {
        let hit = self
            .entries
            .get(key)
            .and_then(|entry| Rc::clone(entry).downcast::<Vec<R>>().ok());
        match hit {
            Some(rows) => {
                self.stats.hits += 1;
                trace!(key = ?key, rows = rows.len(), "query cache hit");
                Some(rows)
            }
            None => {
                self.stats.misses += 1;
                trace!(key = ?key, "query cache miss");
                None
            }
        }
    }

    /// Store `rows` under `key`, replacing any previous entry.
    pub fn insert<R: 'static>(&mut self, key: Vec<ComponentTypeId>, rows: QueryResult<R>) {
        if !self.enabled {
            return;
        }
        let entry: Rc<dyn Any> = rows;
        self.entries.insert(key, entry);
    }

    /// Purge every entry whose key contains any of `type_ids`.
    ///
    /// Returns the number of purged entries.
    pub fn invalidate(&mut self, type_ids: &[ComponentTypeId]) -> usize {
        if type_ids.is_empty() || self.entries.is_empty() {
            return 0;
        }
        let before = self.entries.len();
        self.entries
            .retain(|key, _| !key.iter().any(|id| type_ids.contains(id)));
        let purged = before - self.entries.len();
        if purged > 0 {
            self.stats.invalidations += purged as u64;
            debug!(type_ids = ?type_ids, purged, "query cache invalidated");
        }
        purged
    }

    /// Purge every entry. Returns the number of purged entries.
    pub fn clear(&mut self) -> usize {
        let purged = self.entries.len();
        self.entries.clear();
        if purged > 0 {
            self.stats.invalidations += purged as u64;
            debug!(purged, "query cache cleared");
        }
        purged
    }

    /// Whether an entry is stored under exactly `key`.
    pub fn contains(&self, key: &[ComponentTypeId]) -> bool {
        self.entries.contains_key(key)
    }

    /// Number of stored entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether results are being stored.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Current counters.
    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    /// Zero the counters. Stored entries are kept.
    pub fn reset_stats(&mut self) {
        self.stats = CacheStats::default();
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
