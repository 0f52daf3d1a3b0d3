//! Main docstash crate: a concurrent in-memory JSON document container.
//!
//! This crate is the primary entry point for users of docstash. It re-exports
//! the core types from `docstash-core` and, with the default `memory`
//! feature, the in-memory dirty tracker from `docstash-memory`.
//!
//! # Features
//!
//! - **Concurrent document map** - Lock-free reads and CAS-based updates keyed by case-insensitive ids
//! - **Dirty tracking** - Every mutation notifies a pluggable durability collaborator
//! - **Typed queries** - Decode stored JSON into your own types and compose filters over them
//! - **Safe shutdown** - Idempotent disposal that blocks any later use
//!
//! # Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use docstash::{prelude::*, memory::InMemoryDirtyTracker};
//! use serde::{Serialize, Deserialize};
//!
//! #[derive(Debug, Clone, Serialize, Deserialize)]
//! pub struct User {
//!     pub id: String,
//!     pub name: String,
//! }
//!
//! impl Document for User {
//!     fn id(&self) -> &str { &self.id }
//! }
//!
//! #[tokio::main]
//! async fn main() -> ContainerResult<()> {
//!     let tracker = Arc::new(InMemoryDirtyTracker::new());
//!     let users = DocumentContainer::new("users", tracker.clone());
//!     let cancel = CancellationSignal::new();
//!
//!     users.add_document(&User { id: "u1".into(), name: "Ann".into() }, &cancel).await?;
//!
//!     let names = users
//!         .build_queryable::<User>()?
//!         .select(|user| user.name)
//!         .into_vec();
//!
//!     println!("users: {names:?}, dirty: {:?}", tracker.dirty_containers().await);
//!
//!     users.dispose();
//!     Ok(())
//! }
//! ```

#[allow(unused_extern_crates)]
extern crate self as docstash;

pub mod prelude;

pub use async_trait::async_trait;

pub use docstash_core::{
    cancel, container, document, durability, error, id, options, page, query, queryable,
};

#[cfg(feature = "memory")]
pub mod memory {
    //! In-memory durability collaborator.
    pub use docstash_memory::{InMemoryDirtyTracker, InMemoryDirtyTrackerBuilder};
}
