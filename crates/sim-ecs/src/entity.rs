//! Entity identifiers and allocation.
//!
//! An [`Entity`] is a plain 64-bit handle. Ids come from a strictly increasing
//! counter starting at 0 and are never handed out twice, so a destroyed
//! entity's id stays dead for the lifetime of its [`World`](crate::world::World).

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

// ---------------------------------------------------------------------------
// Entity
// ---------------------------------------------------------------------------

/// An entity handle. Ordered by allocation order.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Entity(u64);

impl Entity {
    /// Construct an `Entity` from its raw id.
    #[inline]
    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Raw `u64` id.
    #[inline]
    pub fn to_raw(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Entity({})", self.0)
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "e{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// EntityAllocator
// ---------------------------------------------------------------------------

/// Hands out monotonically increasing [`Entity`] ids and tracks which of them
/// are still alive.
#[derive(Debug, Default)]
pub struct EntityAllocator {
    /// The id the next call to `allocate` returns.
    next: u64,
    /// Ids that were allocated and not yet deallocated.
    alive: HashSet<Entity>,
}

impl EntityAllocator {
    /// Create a new, empty allocator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a fresh [`Entity`]. Never returns an id seen before.
    pub fn allocate(&mut self) -> Entity {
        let entity = Entity(self.next);
        self.next += 1;
        self.alive.insert(entity);
        entity
    }

    /// Mark `entity` dead.
    ///
    /// Returns `true` if it was alive, `false` if it was already dead or was
    /// never allocated.
    pub fn deallocate(&mut self, entity: Entity) -> bool {
        self.alive.remove(&entity)
    }

    /// Whether `entity` was allocated and has not been deallocated.
    pub fn is_alive(&self, entity: Entity) -> bool {
        self.alive.contains(&entity)
    }

    /// Whether `entity` was ever handed out by this allocator.
    pub fn was_issued(&self, entity: Entity) -> bool {
        entity.0 < self.next
    }

    /// Number of currently alive entities.
    pub fn alive_count(&self) -> usize {
        self.alive.len()
    }

    /// Number of ids handed out so far, dead or alive.
    pub fn issued_count(&self) -> u64 {
        self.next
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
