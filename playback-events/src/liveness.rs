//! Owner liveness tracking
//!
//! Subscriptions refer to their owner by [`OwnerId`] only. Whether that owner
//! still exists is answered by the [`LivenessTable`], so nothing on the
//! delivery path ever keeps an owner alive.

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;

/// Identifier of a subscription owner (typically one host surface)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OwnerId(u64);

impl OwnerId {
    /// Get the raw ID value
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for OwnerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "owner-{}", self.0)
    }
}

/// Shared table of owners that are currently alive
///
/// Cloning is cheap; all clones observe the same table.
#[derive(Debug, Clone, Default)]
pub struct LivenessTable {
    alive: Arc<RwLock<HashSet<OwnerId>>>,
    next_id: Arc<AtomicU64>,
}

impl LivenessTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a fresh owner id and mark it alive
    pub fn register(&self) -> OwnerId {
        let id = OwnerId(self.next_id.fetch_add(1, Ordering::Relaxed) + 1);
        self.alive.write().insert(id);
        tracing::trace!("Registered {}", id);
        id
    }

    /// Mark an owner as gone
    ///
    /// Returns `false` if the owner was already released. Ids are never reused.
    pub fn release(&self, id: OwnerId) -> bool {
        let removed = self.alive.write().remove(&id);
        if removed {
            tracing::trace!("Released {}", id);
        }
        removed
    }

    pub fn is_alive(&self, id: OwnerId) -> bool {
        self.alive.read().contains(&id)
    }

    /// Number of owners currently alive
    pub fn len(&self) -> usize {
        self.alive.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.alive.read().is_empty()
    }
}
