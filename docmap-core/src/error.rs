//! Error types and result types for mapper operations.
//!
//! Every fallible operation in this crate returns [`DocMapResult<T>`]. Store
//! failures reported by a repository adapter are carried in
//! [`DocMapError::Backend`] untranslated; nothing is retried internally.

use bson::{Document, error::Error as BsonError};
use thiserror::Error;

/// Represents all possible errors raised while loading, mutating or persisting entities.
#[derive(Error, Debug)]
pub enum DocMapError {
    /// No stored document matched the selector used for a load.
    #[error("Document not found in collection {collection} for selector {selector}")]
    NotFound {
        /// The collection that was searched.
        collection: String,
        /// The selector that matched nothing.
        selector: Document,
    },
    /// A load was given both a document and a selector.
    #[error("Conflicting arguments: {0}")]
    ConflictingArguments(String),
    /// A read named an attribute that is neither declared nor held as extra state.
    #[error("Entity has no attribute {0:?}")]
    UndeclaredAttribute(String),
    /// A container accessor was used on a field holding a different kind of value.
    #[error("Field {field:?} does not hold a {expected}")]
    FieldTypeMismatch {
        /// The offending field.
        field: String,
        /// The kind of value the accessor expected.
        expected: &'static str,
    },
    /// A loaded document carried an identity different from the entity's own.
    #[error("Identity mismatch: entity is {expected}, document is {found}")]
    IdentityMismatch {
        /// The identifier already assigned to the entity.
        expected: String,
        /// The identifier found in the document.
        found: String,
    },
    /// The document has an invalid structure (for example a missing `_id`).
    #[error("Invalid document: {0}")]
    InvalidDocument(String),
    /// Serialization/deserialization error when converting values through BSON.
    #[error("Serialization error: {0}")]
    Serialization(String),
    /// Error during adapter initialization or connection setup.
    #[error("Initialization error: {0}")]
    Initialization(String),
    /// An error reported by the underlying repository adapter.
    #[error("Backend error: {0}")]
    Backend(String),
    /// A transaction could not be started, committed or aborted.
    #[error("Transaction error: {0}")]
    Transaction(String),
}

/// A specialized `Result` type for mapper operations.
pub type DocMapResult<T> = Result<T, DocMapError>;

impl From<BsonError> for DocMapError {
    fn from(err: BsonError) -> Self {
        DocMapError::Serialization(err.to_string())
    }
}

impl DocMapError {
    /// Returns `true` if this error reports a missing document.
    pub fn is_not_found(&self) -> bool {
        matches!(self, DocMapError::NotFound { .. })
    }
}
