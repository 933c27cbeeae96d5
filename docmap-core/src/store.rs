//! Main document store interface.
//!
//! [`DocumentStore`] owns a repository adapter and hands out collections
//! bound to it: untyped [`Collection`]s addressed by name, and
//! [`EntityCollection`]s addressed by entity type.
//!
//! # Example
//!
//! ```ignore
//! use docmap::store::DocumentStore;
//!
//! let store = DocumentStore::new(adapter);
//! let users = store.entities::<User>();
//! ```

use crate::{
    backend::{AdapterBuilder, RepositoryAdapter},
    collection::{Collection, EntityCollection},
    error::DocMapResult,
    schema::Schema,
};

/// A document store bound to a specific adapter implementation.
///
/// # Type Parameters
///
/// * `A` - The adapter implementation type
///
/// # Example
///
/// ```ignore
/// let store = DocumentStore::new(my_adapter);
/// let users = store.entities::<User>();
/// let raw = store.collection("audit_log");
/// ```
#[derive(Debug)]
pub struct DocumentStore<A: RepositoryAdapter> {
    adapter: A,
}

impl<A: RepositoryAdapter> DocumentStore<A> {
    /// Creates a new document store with the given adapter.
    pub fn new(adapter: A) -> Self {
        Self { adapter }
    }

    /// Builds the adapter with `builder` and wraps it in a store.
    ///
    /// # Errors
    ///
    /// Returns whatever error the builder reports.
    pub async fn connect<B>(builder: B) -> DocMapResult<Self>
    where
        B: AdapterBuilder<Adapter = A>,
    {
        Ok(Self::new(builder.build().await?))
    }

    /// Gets the collection entities of type `S` live in.
    ///
    /// The collection name is determined by [`Schema::collection_name`].
    pub fn entities<'a, S: Schema>(&'a self) -> EntityCollection<'a, A, S> {
        EntityCollection::new(&self.adapter)
    }

    /// Gets an untyped collection with the given name.
    ///
    /// # Arguments
    ///
    /// * `name` - The name of the collection
    pub fn collection<'a>(&'a self, name: &str) -> Collection<'a, A> {
        Collection::new(name.to_string(), &self.adapter)
    }

    /// Returns the adapter this store is bound to.
    pub fn adapter(&self) -> &A {
        &self.adapter
    }

    /// Shuts down the store and releases adapter resources.
    ///
    /// # Errors
    ///
    /// Returns an error if the shutdown operation fails.
    pub async fn shutdown(self) -> DocMapResult<()> {
        self.adapter.shutdown().await
    }
}
