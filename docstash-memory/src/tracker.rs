//! In-memory dirty tracking.
//!
//! This module provides a [`DirtyTracker`] that simply remembers which
//! containers changed, for a flusher to drain later.

use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};

use async_trait::async_trait;
use mea::rwlock::RwLock;

use docstash_core::{
    cancel::CancellationSignal,
    durability::DirtyTracker,
    error::{ContainerError, ContainerResult},
};

#[derive(Default, Debug)]
struct TrackerState {
    /// Containers with changes not yet taken by a flusher.
    dirty: HashSet<String>,
    /// Total marks received per container since the last reset.
    marks: HashMap<String, usize>,
}

/// Thread-safe in-memory dirty tracker.
///
/// `InMemoryDirtyTracker` is cloneable; clones share the same state, so one
/// handle can be given to every container while a background flusher keeps
/// another.
///
/// # Example
///
/// ```ignore
/// use std::sync::Arc;
/// use docstash::{prelude::*, memory::InMemoryDirtyTracker};
///
/// let tracker = Arc::new(InMemoryDirtyTracker::new());
/// let users = DocumentContainer::new("users", tracker.clone());
///
/// users.add_item("u1", "{}", &CancellationSignal::new()).await?;
///
/// for name in tracker.take_dirty().await {
///     // persist the container called `name`
/// }
/// ```
#[derive(Default, Clone, Debug)]
pub struct InMemoryDirtyTracker {
    state: Arc<RwLock<TrackerState>>,
}

impl InMemoryDirtyTracker {
    /// Creates a tracker with no dirty containers.
    pub fn new() -> Self {
        Self {
            state: Arc::new(RwLock::new(TrackerState::default())),
        }
    }

    /// Creates a builder for an `InMemoryDirtyTracker`.
    pub fn builder() -> InMemoryDirtyTrackerBuilder {
        InMemoryDirtyTrackerBuilder::default()
    }

    /// Number of marks received for `container` since the last reset.
    pub async fn mark_count(&self, container: &str) -> usize {
        self.state
            .read()
            .await
            .marks
            .get(container)
            .copied()
            .unwrap_or(0)
    }

    /// Returns `true` if `container` changed since it was last taken.
    pub async fn is_dirty(&self, container: &str) -> bool {
        self.state.read().await.dirty.contains(container)
    }

    /// Names of all containers currently marked dirty, sorted.
    pub async fn dirty_containers(&self) -> Vec<String> {
        let mut names = self.state
            .read()
            .await
            .dirty
            .iter()
            .cloned()
            .collect::<Vec<_>>();

        names.sort();
        names
    }

    /// Drains the dirty set, returning the names that were in it, sorted.
    ///
    /// Mark counters are left untouched.
    pub async fn take_dirty(&self) -> Vec<String> {
        let mut names = self.state
            .write()
            .await
            .dirty
            .drain()
            .collect::<Vec<_>>();

        names.sort();
        names
    }

    /// Forgets every dirty mark and counter.
    pub async fn reset(&self) {
        let mut state = self.state.write().await;
        state.dirty.clear();
        state.marks.clear();
    }
}

#[async_trait]
impl DirtyTracker for InMemoryDirtyTracker {
    async fn mark_dirty(&self, container: &str, cancel: &CancellationSignal) -> ContainerResult<()> {
        if cancel.is_cancelled() {
            return Err(ContainerError::Cancelled);
        }

        let mut state = self.state.write().await;
        state.dirty.insert(container.to_string());
        *state.marks.entry(container.to_string()).or_default() += 1;

        tracing::trace!(target: "docstash::memory", container, "Container marked dirty");
        Ok(())
    }
}

/// Builder for [`InMemoryDirtyTracker`] instances.
///
/// The tracker has no settings yet; the builder mirrors the construction
/// style of the other docstash components.
#[derive(Default)]
pub struct InMemoryDirtyTrackerBuilder;

impl InMemoryDirtyTrackerBuilder {
    pub fn build(self) -> InMemoryDirtyTracker {
        InMemoryDirtyTracker::new()
    }
}
