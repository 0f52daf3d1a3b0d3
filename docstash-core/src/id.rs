//! Case-insensitive document identifiers.

use std::{
    fmt,
    hash::{Hash, Hasher},
};

use unicase::UniCase;

/// Identifier of a document within a container.
///
/// Two identifiers that differ only by case denote the same document.
/// Equality and hashing use full Unicode case folding, so `"ΟΣ"`, `"οσ"` and
/// `"ος"` are one id. The original spelling is kept for display and export.
#[derive(Clone, Debug)]
pub struct DocumentId {
    key: UniCase<String>,
}

impl DocumentId {
    /// Creates an identifier from any string-like value.
    pub fn new(id: impl Into<String>) -> Self {
        Self { key: UniCase::new(id.into()) }
    }

    /// Returns the identifier as it was first spelled.
    pub fn as_str(&self) -> &str {
        self.key.as_ref()
    }

    /// Consumes the identifier, returning its original spelling.
    pub fn into_string(self) -> String {
        self.key.into_inner()
    }
}

impl PartialEq for DocumentId {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for DocumentId {}

impl Hash for DocumentId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key.hash(state);
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for DocumentId {
    fn from(value: &str) -> Self {
        DocumentId::new(value)
    }
}

impl From<String> for DocumentId {
    fn from(value: String) -> Self {
        DocumentId::new(value)
    }
}

impl From<&String> for DocumentId {
    fn from(value: &String) -> Self {
        DocumentId::new(value.as_str())
    }
}
