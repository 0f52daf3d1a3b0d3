//! Durability collaborator abstraction.
//!
//! A [`DocumentContainer`](crate::container::DocumentContainer) never persists
//! anything itself. After every successful mutation it tells a [`DirtyTracker`]
//! that its state changed, and the tracker decides when and how to flush.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use docstash::prelude::*;
//!
//! #[derive(Debug)]
//! struct LogOnly;
//!
//! #[async_trait]
//! impl DirtyTracker for LogOnly {
//!     async fn mark_dirty(&self, container: &str, _cancel: &CancellationSignal) -> ContainerResult<()> {
//!         println!("{container} changed");
//!         Ok(())
//!     }
//! }
//!
//! let container = DocumentContainer::new("users", Arc::new(LogOnly));
//! ```

use async_trait::async_trait;
use std::{fmt::Debug, sync::Arc};

use crate::{cancel::CancellationSignal, error::ContainerResult};

/// Receives "container changed" notifications from document containers.
///
/// # Thread Safety
///
/// A single tracker is usually shared by every container of a database and is
/// called concurrently from all of them. Implementations must be `Send + Sync`.
///
/// # Errors
///
/// An error returned from [`mark_dirty`](DirtyTracker::mark_dirty) is propagated
/// unchanged to the caller of the mutating container operation. The mutation
/// itself has already been applied at that point.
#[async_trait]
pub trait DirtyTracker: Send + Sync + Debug {
    /// Records that the container named `container` has unflushed changes.
    ///
    /// Implementations may batch or defer the actual flush. Long-running
    /// implementations should observe `cancel`.
    async fn mark_dirty(&self, container: &str, cancel: &CancellationSignal) -> ContainerResult<()>;
}

#[async_trait]
impl<T> DirtyTracker for &T
where
    T: DirtyTracker + ?Sized,
{
    async fn mark_dirty(&self, container: &str, cancel: &CancellationSignal) -> ContainerResult<()> {
        (**self).mark_dirty(container, cancel).await
    }
}

#[async_trait]
impl<T> DirtyTracker for Arc<T>
where
    T: DirtyTracker + ?Sized,
{
    async fn mark_dirty(&self, container: &str, cancel: &CancellationSignal) -> ContainerResult<()> {
        (**self).mark_dirty(container, cancel).await
    }
}

/// A tracker that accepts every notification and does nothing.
///
/// Useful for containers whose contents never need to be persisted.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopDirtyTracker;

#[async_trait]
impl DirtyTracker for NoopDirtyTracker {
    async fn mark_dirty(&self, _container: &str, _cancel: &CancellationSignal) -> ContainerResult<()> {
        Ok(())
    }
}
