//! The actor registry seen from inside the pipeline.
//!
//! The registry is owned by whoever spawns and destroys vehicles.  Stages only
//! ever read it, and they must tolerate it changing between two reads: an
//! actor present when the planner built a frame may be gone by the time the
//! control stage translates that frame.

use std::sync::Arc;

use parking_lot::RwLock;

use crate::{ActorId, IdSet};

/// Read-only view of the currently registered actors.
pub trait Registry: Send + Sync + 'static {
    fn is_registered(&self, actor: ActorId) -> bool;

    /// Number of registered actors.  Used to size per-tick buffers.
    fn count(&self) -> usize;
}

impl<R: Registry + ?Sized> Registry for Arc<R> {
    fn is_registered(&self, actor: ActorId) -> bool {
        (**self).is_registered(actor)
    }

    fn count(&self) -> usize {
        (**self).count()
    }
}

/// A thread-safe registry backed by a `RwLock`-guarded set.
///
/// Cloning is cheap and every clone sees the same set, so the owner can keep
/// one handle for mutation and give read handles to the pipeline.
#[derive(Clone, Default)]
pub struct SharedRegistry {
    inner: Arc<RwLock<IdSet>>,
}

impl SharedRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_actors<I: IntoIterator<Item = ActorId>>(actors: I) -> Self {
        let registry = Self::new();
        registry.inner.write().extend(actors);
        registry
    }

    /// Returns `false` if the actor was already registered.
    pub fn register(&self, actor: ActorId) -> bool {
        self.inner.write().insert(actor)
    }

    /// Returns `false` if the actor was not registered.
    pub fn deregister(&self, actor: ActorId) -> bool {
        self.inner.write().remove(&actor)
    }

    pub fn clear(&self) {
        self.inner.write().clear();
    }

    /// Snapshot of the registered ids in ascending order.
    pub fn actors(&self) -> Vec<ActorId> {
        let mut v: Vec<ActorId> = self.inner.read().iter().copied().collect();
        v.sort_unstable();
        v
    }
}

impl Registry for SharedRegistry {
    fn is_registered(&self, actor: ActorId) -> bool {
        self.inner.read().contains(&actor)
    }

    fn count(&self) -> usize {
        self.inner.read().len()
    }
}
