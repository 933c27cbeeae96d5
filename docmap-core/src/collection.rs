//! Collection types binding a repository adapter to a collection name.
//!
//! - [`Collection`] - Untyped collection working with raw BSON documents
//! - [`EntityCollection`] - Collection bound to an entity [`Schema`], with entity constructors
//!
//! # Example
//!
//! ```ignore
//! use docmap::prelude::*;
//!
//! # async fn example(store: &DocumentStore<impl RepositoryAdapter>) -> DocMapResult<()> {
//! let users = store.entities::<User>();
//!
//! let mut user = users.create();
//! user.set("name", "alice");
//! user.commit(&users).await?;
//!
//! let again = users.get(user.id()).await?.expect("just committed");
//! # Ok(()) }
//! ```

use async_trait::async_trait;
use bson::{Bson, Document};
use std::marker::PhantomData;

use crate::{
    backend::{RemoveOutcome, RepositoryAdapter, Update, UpdateOutcome},
    entity::{Entity, Lookup},
    error::{DocMapError, DocMapResult},
    schema::Schema,
    transaction::CollectionHandle,
};

/// An untyped collection with a reference to a repository adapter.
#[derive(Debug)]
pub struct Collection<'a, A: RepositoryAdapter> {
    name: String,
    adapter: &'a A,
}

impl<'a, A: RepositoryAdapter> Collection<'a, A> {
    pub(crate) fn new(name: String, adapter: &'a A) -> Self {
        Self { name, adapter }
    }

    /// Returns the name of this collection.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the first document matching `selector`, or `None`.
    ///
    /// # Errors
    ///
    /// Returns a [`DocMapError`](crate::error::DocMapError) if the adapter fails.
    pub async fn find_one(&self, selector: &Document) -> DocMapResult<Option<Document>> {
        self.adapter
            .find_one(selector, &self.name)
            .await
    }

    /// Applies an update to the first document matching `selector`.
    ///
    /// # Errors
    ///
    /// Returns a [`DocMapError`](crate::error::DocMapError) if the adapter fails.
    pub async fn update(
        &self,
        selector: &Document,
        update: Update,
        upsert: bool,
    ) -> DocMapResult<UpdateOutcome> {
        self.adapter
            .update(selector, update, upsert, &self.name)
            .await
    }

    /// Deletes the document whose identity key equals `id`.
    ///
    /// # Errors
    ///
    /// Returns a [`DocMapError`](crate::error::DocMapError) if the adapter fails.
    pub async fn remove(&self, id: &Bson) -> DocMapResult<RemoveOutcome> {
        self.adapter
            .remove(id, &self.name)
            .await
    }
}

#[async_trait]
impl<A: RepositoryAdapter> CollectionHandle for Collection<'_, A> {
    fn name(&self) -> &str {
        &self.name
    }

    async fn update(
        &self,
        selector: &Document,
        update: Update,
        upsert: bool,
    ) -> DocMapResult<UpdateOutcome> {
        Collection::update(self, selector, update, upsert).await
    }
}

/// A collection bound to the entity type described by `S`.
///
/// The collection name comes from [`Schema::collection_name`]. Entities of
/// type `S` load from, commit to and are removed through this collection.
#[derive(Debug)]
pub struct EntityCollection<'a, A: RepositoryAdapter, S: Schema> {
    inner: Collection<'a, A>,
    _marker: PhantomData<fn() -> S>,
}

impl<'a, A: RepositoryAdapter, S: Schema> EntityCollection<'a, A, S> {
    pub(crate) fn new(adapter: &'a A) -> Self {
        Self {
            inner: Collection::new(S::collection_name().to_string(), adapter),
            _marker: PhantomData,
        }
    }

    /// Returns the name of this collection.
    pub fn name(&self) -> &str {
        self.inner.name()
    }

    /// Returns the untyped view of this collection.
    pub fn raw(&self) -> &Collection<'a, A> {
        &self.inner
    }

    /// Returns a fresh, not-yet-persisted entity.
    pub fn create(&self) -> Entity<S> {
        Entity::new()
    }

    /// Loads the entity with the given id, or returns `None` if no document has it.
    ///
    /// # Errors
    ///
    /// Returns a [`DocMapError`](crate::error::DocMapError) if the adapter fails.
    pub async fn get(&self, id: &str) -> DocMapResult<Option<Entity<S>>> {
        Entity::open(self, Lookup::id(id)).await
    }

    /// Loads the first entity matching `selector`, or returns `None`.
    ///
    /// # Errors
    ///
    /// Returns a [`DocMapError`](crate::error::DocMapError) if the adapter fails.
    pub async fn find_one(&self, selector: Document) -> DocMapResult<Option<Entity<S>>> {
        Entity::open(self, Lookup::selector(selector)).await
    }

    /// Builds an entity from an already fetched document without touching the store.
    ///
    /// # Errors
    ///
    /// Returns [`DocMapError::InvalidDocument`] if the document is empty or
    /// has no usable identity key.
    pub async fn from_document(&self, document: Document) -> DocMapResult<Entity<S>> {
        if document.is_empty() {
            return Err(DocMapError::InvalidDocument(
                "cannot build an entity from an empty document".to_string(),
            ));
        }

        let mut entity = Entity::blank(String::new(), true);
        entity.load(self, Some(document), None).await?;

        Ok(entity)
    }

    pub(crate) async fn find_document(&self, selector: &Document) -> DocMapResult<Option<Document>> {
        self.inner.find_one(selector).await
    }

    pub(crate) async fn remove_document(&self, id: &Bson) -> DocMapResult<RemoveOutcome> {
        self.inner.remove(id).await
    }
}

#[async_trait]
impl<A: RepositoryAdapter, S: Schema> CollectionHandle for EntityCollection<'_, A, S> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn update(
        &self,
        selector: &Document,
        update: Update,
        upsert: bool,
    ) -> DocMapResult<UpdateOutcome> {
        self.inner
            .update(selector, update, upsert)
            .await
    }
}
