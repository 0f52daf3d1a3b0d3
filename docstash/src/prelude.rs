//! Convenient re-exports of commonly used types from docstash.
//!
//! ```ignore
//! use docstash::prelude::*;
//! ```

pub use docstash_core::{
    cancel::CancellationSignal,
    container::{DocumentContainer, DocumentContainerBuilder},
    document::{Document, DocumentExt, decode_body, encode_body},
    durability::{DirtyTracker, NoopDirtyTracker},
    error::{ContainerError, ContainerResult},
    id::DocumentId,
    options::ContainerOptions,
    page::{Page, PaginationParams},
    query::{Expr, FieldOp, Filter, Query, QueryBuilder, QueryVisitor, Sort, SortDirection},
    queryable::Queryable,
};

pub use async_trait::async_trait;
