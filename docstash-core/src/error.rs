//! Error types and result types for document container operations.
//!
//! Use [`ContainerResult<T>`] as the return type for fallible operations.

use serde_json::Error as SerdeJsonError;
use std::convert::Infallible;
use thiserror::Error;

/// Represents all possible errors that can occur when interacting with a document container.
#[derive(Error, Debug)]
pub enum ContainerError {
    /// A document with the given ID already exists in the container.
    /// The first argument is the document ID, the second is the container name.
    #[error("Document {0} already exists in container {1}")]
    AlreadyExists(String, String),
    /// The requested document was not found in the container.
    /// The first argument is the document ID, the second is the container name.
    #[error("Document not found {0} in container {1}")]
    NotFound(String, String),
    /// The container has been disposed and can no longer be used.
    #[error("Container {0} has been disposed")]
    Disposed(String),
    /// Serialization/deserialization error when converting between a document and its stored body.
    #[error("Serialization error: {0}")]
    Serialization(String),
    /// The durability collaborator failed to record a dirty mark.
    ///
    /// The mutation that triggered the notification has already been applied.
    #[error("Durability error: {0}")]
    Durability(String),
    /// The caller stopped waiting for the dirty notification to complete.
    ///
    /// The mutation that triggered the notification has already been applied.
    #[error("Operation cancelled")]
    Cancelled,
    /// The container options are invalid.
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl ContainerError {
    /// Returns `true` if the in-memory mutation was applied before this error was raised.
    ///
    /// Callers should retry durability, not the mutation, when this holds.
    pub fn is_post_mutation(&self) -> bool {
        matches!(self, ContainerError::Durability(_) | ContainerError::Cancelled)
    }
}

/// A specialized `Result` type for document container operations.
pub type ContainerResult<T> = Result<T, ContainerError>;

impl From<SerdeJsonError> for ContainerError {
    fn from(err: SerdeJsonError) -> Self {
        ContainerError::Serialization(err.to_string())
    }
}

impl From<Infallible> for ContainerError {
    fn from(never: Infallible) -> Self {
        match never {}
    }
}
