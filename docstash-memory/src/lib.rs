//! In-memory durability collaborator for docstash.
//!
//! This crate provides a thread-safe, in-memory implementation of the
//! `DirtyTracker` trait. It records which containers changed and lets a
//! flusher drain that set, which makes it a good fit for development, tests
//! and as the bookkeeping half of a real persistence engine.
//!
//! # Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use docstash::{prelude::*, memory::InMemoryDirtyTracker};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let tracker = Arc::new(InMemoryDirtyTracker::builder().build());
//!     let users = DocumentContainer::new("users", tracker.clone());
//!
//!     users.add_item("u1", r#"{"name":"Ann"}"#, &CancellationSignal::new()).await?;
//!     assert!(tracker.is_dirty("users").await);
//!
//!     Ok(())
//! }
//! ```

#[allow(unused_extern_crates)]
extern crate self as docstash_memory;

pub mod tracker;

pub use tracker::{InMemoryDirtyTracker, InMemoryDirtyTrackerBuilder};
