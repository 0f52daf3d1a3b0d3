//! Document traits and the JSON body codec.
//!
//! Containers store every document as a serialized JSON string. This module
//! provides the conversion between typed values and those stored bodies.

use serde::{Serialize, de::DeserializeOwned};
use serde_json::{Value, from_str, from_value, to_string, to_value};

use crate::error::ContainerResult;

/// Core trait for typed documents stored through the container's typed helpers.
///
/// A document only has to know its own identifier; the container takes care of
/// case-insensitive key handling.
///
/// # Example
///
/// ```ignore
/// use docstash::prelude::*;
/// use serde::{Serialize, Deserialize};
///
/// #[derive(Debug, Clone, Serialize, Deserialize)]
/// pub struct User {
///     pub id: String,
///     pub name: String,
/// }
///
/// impl Document for User {
///     fn id(&self) -> &str {
///         &self.id
///     }
/// }
/// ```
pub trait Document: Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Returns this document's identifier.
    fn id(&self) -> &str;
}

/// Serializes a value into a stored document body.
///
/// # Errors
///
/// Returns [`ContainerError::Serialization`](crate::error::ContainerError::Serialization)
/// if the value cannot be represented as JSON.
pub fn encode_body<T: Serialize + ?Sized>(value: &T) -> ContainerResult<String> {
    Ok(to_string(value)?)
}

/// Deserializes a stored document body.
///
/// # Errors
///
/// Returns [`ContainerError::Serialization`](crate::error::ContainerError::Serialization)
/// if the body is not valid JSON or does not match `T`.
pub fn decode_body<T: DeserializeOwned>(body: &str) -> ContainerResult<T> {
    Ok(from_str(body)?)
}

/// Extension trait providing codec helpers for documents.
///
/// Automatically implemented for every [`Document`].
pub trait DocumentExt: Document {
    /// Converts this document into its stored body.
    fn to_body(&self) -> ContainerResult<String>;

    /// Creates a document from a stored body.
    fn from_body(body: &str) -> ContainerResult<Self>;

    /// Converts this document to a JSON value.
    fn to_json(&self) -> ContainerResult<Value>;

    /// Creates a document from a JSON value.
    fn from_json(value: Value) -> ContainerResult<Self>;
}

impl<D: Document> DocumentExt for D {
    fn to_body(&self) -> ContainerResult<String> {
        encode_body(self)
    }

    fn from_body(body: &str) -> ContainerResult<Self> {
        decode_body(body)
    }

    fn to_json(&self) -> ContainerResult<Value> {
        Ok(to_value(self)?)
    }

    fn from_json(value: Value) -> ContainerResult<Self> {
        Ok(from_value(value)?)
    }
}
