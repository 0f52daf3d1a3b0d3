//! A concurrent in-memory JSON document container with dirty tracking.
//!
//! This crate is the core of the docstash project and provides:
//!
//! - **Document container** ([`container`]) - The concurrent, case-insensitive document map
//! - **Durability abstraction** ([`durability`]) - The "mark dirty" collaborator containers notify
//! - **Cancellation** ([`cancel`]) - Signals that abort waits on the durability collaborator
//! - **Documents and codec** ([`document`]) - Typed documents and their JSON bodies
//! - **Queryable views** ([`queryable`]) - Composable queries over decoded documents
//! - **Filter expressions** ([`query`]) - JSON-level filters, sorting and paging
//! - **Pagination** ([`page`]) - Page types for query results
//! - **Options** ([`options`]) - Container tuning
//! - **Error handling** ([`error`]) - Error and result types
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use docstash_core::{
//!     cancel::CancellationSignal,
//!     container::DocumentContainer,
//!     durability::NoopDirtyTracker,
//! };
//!
//! let container = DocumentContainer::new("users", Arc::new(NoopDirtyTracker));
//! container.add_item("u1", r#"{"name":"Ann"}"#, &CancellationSignal::new()).await?;
//! ```

#[allow(unused_extern_crates)]
extern crate self as docstash_core;

pub mod cancel;
pub mod container;
pub mod document;
pub mod durability;
pub mod error;
pub mod id;
pub mod options;
pub mod page;
pub mod query;
pub mod queryable;

mod evaluator;
