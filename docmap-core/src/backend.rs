//! Repository adapter abstraction.
//!
//! This module defines the capability contract the mapper needs from a
//! document store. An adapter locates documents by selector, writes targeted
//! or full-document updates with optional upsert, and removes documents by
//! identity. Everything about wire protocols, connection pools and timeouts
//! lives behind this trait.
//!
//! # Traits
//!
//! - [`RepositoryAdapter`]: The core trait for storage adapters
//! - [`AdapterBuilder`]: Factory trait for creating adapter instances
//!
//! # Examples
//!
//! ```ignore
//! use docmap::backend::{RepositoryAdapter, Update};
//! use bson::doc;
//!
//! let adapter = MyAdapterImpl::new();
//!
//! adapter
//!     .update(&doc! { "_id": "x" }, Update::Set(doc! { "name": "Alice" }), true, "users")
//!     .await?;
//! let found = adapter.find_one(&doc! { "_id": "x" }, "users").await?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use async_trait::async_trait;
use bson::{Bson, Document};
use std::fmt::Debug;

use crate::error::DocMapResult;

/// The body of a write issued against one document.
#[derive(Debug, Clone, PartialEq)]
pub enum Update {
    /// Set only the given keys, leaving every other stored key untouched.
    Set(Document),
    /// Replace the whole document.
    Replace(Document),
}

impl Update {
    /// Returns the document carried by this update.
    pub fn document(&self) -> &Document {
        match self {
            Update::Set(document) | Update::Replace(document) => document,
        }
    }

    /// Returns `true` for a targeted `$set` update.
    pub fn is_set(&self) -> bool {
        matches!(self, Update::Set(_))
    }
}

/// Outcome of an [`RepositoryAdapter::update`] call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateOutcome {
    /// Number of documents the selector matched.
    pub matched: u64,
    /// Number of documents actually modified.
    pub modified: u64,
    /// Identity of the document created by an upsert, if one was created.
    pub upserted_id: Option<Bson>,
}

/// Outcome of a [`RepositoryAdapter::remove`] call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RemoveOutcome {
    /// Number of documents deleted.
    pub deleted: u64,
}

/// Abstract interface for document store adapters.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync`. The mapper awaits each call inline
/// and never issues concurrent calls on behalf of a single entity.
///
/// # Error Handling
///
/// Failures are reported as [`DocMapError::Backend`](crate::error::DocMapError::Backend)
/// and propagate to the caller unchanged. Retries, if any, are the adapter's concern.
#[async_trait]
pub trait RepositoryAdapter: Send + Sync + Debug {
    /// Returns the first document in `collection` matching `selector`, or `None`.
    async fn find_one(
        &self,
        selector: &Document,
        collection: &str,
    ) -> DocMapResult<Option<Document>>;

    /// Applies `update` to the first document in `collection` matching `selector`.
    ///
    /// When `upsert` is `true` and nothing matches, a document is created.
    /// For [`Update::Set`] the created document contains the selector's plain
    /// equality keys plus the set keys; for [`Update::Replace`] it is the
    /// replacement document itself.
    async fn update(
        &self,
        selector: &Document,
        update: Update,
        upsert: bool,
        collection: &str,
    ) -> DocMapResult<UpdateOutcome>;

    /// Deletes the document whose identity key equals `id`.
    ///
    /// Removing a missing document is not an error; the outcome reports zero deletions.
    async fn remove(&self, id: &Bson, collection: &str) -> DocMapResult<RemoveOutcome>;

    /// Cleanly shuts down the adapter, releasing all resources.
    ///
    /// The default implementation is a no-op.
    async fn shutdown(self) -> DocMapResult<()>
    where
        Self: Sized,
    {
        Ok(())
    }
}

#[async_trait]
impl<A> RepositoryAdapter for &A
where
    A: RepositoryAdapter,
{
    async fn find_one(
        &self,
        selector: &Document,
        collection: &str,
    ) -> DocMapResult<Option<Document>> {
        (*self)
            .find_one(selector, collection)
            .await
    }

    async fn update(
        &self,
        selector: &Document,
        update: Update,
        upsert: bool,
        collection: &str,
    ) -> DocMapResult<UpdateOutcome> {
        (*self)
            .update(selector, update, upsert, collection)
            .await
    }

    async fn remove(&self, id: &Bson, collection: &str) -> DocMapResult<RemoveOutcome> {
        (*self).remove(id, collection).await
    }
}

/// Factory trait for adapters that need asynchronous setup (connections, options parsing).
#[async_trait]
pub trait AdapterBuilder {
    type Adapter: RepositoryAdapter;

    async fn build(self) -> DocMapResult<Self::Adapter>;
}
