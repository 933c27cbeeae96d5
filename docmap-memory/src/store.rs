//! In-memory repository adapter.
//!
//! This module provides a simple backend that keeps documents as BSON in
//! per-collection vectors behind an async-safe read-write lock, and can
//! optionally journal every adapter call for inspection.

use std::{collections::HashMap, sync::Arc};
use async_trait::async_trait;
use mea::{mutex::Mutex, rwlock::RwLock};
use bson::{Bson, Document, oid::ObjectId};
use tracing::{Level, event};

use docmap_core::{
    backend::{AdapterBuilder, RemoveOutcome, RepositoryAdapter, Update, UpdateOutcome},
    error::{DocMapError, DocMapResult},
    schema::IDENTITY_FIELD,
    transaction::StagedWrite,
};

use crate::{
    evaluator::{SelectorEvaluator, seed_from_selector, set_path},
    session::InMemorySession,
};

type CollectionDocs = Vec<Document>;
type StoreMap = HashMap<String, CollectionDocs>;

/// One adapter call, as recorded by the operation journal.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreOperation {
    FindOne {
        collection: String,
        selector: Document,
    },
    Update {
        collection: String,
        selector: Document,
        update: Update,
        upsert: bool,
    },
    Remove {
        collection: String,
        id: Bson,
    },
}

impl StoreOperation {
    /// Returns the collection the call addressed.
    pub fn collection(&self) -> &str {
        match self {
            StoreOperation::FindOne { collection, .. }
            | StoreOperation::Update { collection, .. }
            | StoreOperation::Remove { collection, .. } => collection,
        }
    }

    /// Returns `true` for calls that write to the store.
    pub fn is_write(&self) -> bool {
        !matches!(self, StoreOperation::FindOne { .. })
    }
}

/// Thread-safe in-memory repository adapter.
///
/// # Thread Safety
///
/// `InMemoryStore` is cloneable and uses an `Arc`-wrapped internal state, allowing
/// it to be safely shared across async tasks. Multiple clones of the same instance
/// share the same underlying data and journal.
///
/// # Performance
///
/// Lookups scan the collection in insertion order (no indexing), which is fine
/// for development and tests.
///
/// # Example
///
/// ```ignore
/// use docmap_memory::InMemoryStore;
/// use docmap::backend::{RepositoryAdapter, Update};
/// use bson::doc;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let store = InMemoryStore::new();
///
///     store
///         .update(&doc! { "_id": "x" }, Update::Set(doc! { "name": "Alice" }), true, "users")
///         .await?;
///
///     let found = store.find_one(&doc! { "name": "Alice" }, "users").await?;
///     assert!(found.is_some());
///
///     Ok(())
/// }
/// ```
#[derive(Clone, Debug)]
pub struct InMemoryStore {
    /// The main storage map: collection_name -> documents in insertion order
    store: Arc<RwLock<StoreMap>>,
    /// Journal of adapter calls, present only when recording is enabled
    journal: Option<Arc<Mutex<Vec<StoreOperation>>>>,
}

impl InMemoryStore {
    /// Creates a new empty in-memory store without an operation journal.
    pub fn new() -> Self {
        Self {
            store: Arc::new(RwLock::new(StoreMap::new())),
            journal: None,
        }
    }

    /// Creates a builder for constructing an `InMemoryStore` with custom options.
    ///
    /// # Example
    ///
    /// ```ignore
    /// use docmap_memory::InMemoryStore;
    ///
    /// let store = InMemoryStore::builder()
    ///     .record_operations(true)
    ///     .build()
    ///     .await?;
    /// ```
    pub fn builder() -> InMemoryStoreBuilder {
        InMemoryStoreBuilder::default()
    }

    /// Inserts documents as they are, bypassing selectors and the journal.
    ///
    /// # Errors
    ///
    /// Returns [`DocMapError::InvalidDocument`] if a document has no `_id`; nothing is inserted then.
    pub async fn seed(
        &self,
        collection: &str,
        documents: impl IntoIterator<Item = Document>,
    ) -> DocMapResult<()> {
        let documents = documents.into_iter().collect::<Vec<_>>();
        if documents.iter().any(|doc| !doc.contains_key(IDENTITY_FIELD)) {
            return Err(DocMapError::InvalidDocument(format!(
                "seeded documents need an {IDENTITY_FIELD} key"
            )));
        }

        self.store
            .write()
            .await
            .entry(collection.to_string())
            .or_default()
            .extend(documents);

        Ok(())
    }

    /// Returns a snapshot of every document in `collection`, in insertion order.
    pub async fn documents(&self, collection: &str) -> Vec<Document> {
        self.store
            .read()
            .await
            .get(collection)
            .cloned()
            .unwrap_or_default()
    }

    /// Returns the journal recorded so far, oldest call first.
    ///
    /// Always empty unless the store was built with `record_operations(true)`.
    pub async fn operations(&self) -> Vec<StoreOperation> {
        match &self.journal {
            Some(journal) => journal.lock().await.clone(),
            None => Vec::new(),
        }
    }

    /// Empties the journal.
    pub async fn clear_operations(&self) {
        if let Some(journal) = &self.journal {
            journal.lock().await.clear();
        }
    }

    /// Starts a session whose writes are applied together on commit.
    pub fn start_session(&self) -> InMemorySession {
        InMemorySession::new(self.clone())
    }

    async fn record(&self, operation: StoreOperation) {
        if let Some(journal) = &self.journal {
            journal.lock().await.push(operation);
        }
    }

    /// Applies staged writes under a single write lock.
    ///
    /// The writes run against a copy of the state, which replaces the live
    /// state only if all of them succeed. Only applied batches are journaled.
    pub(crate) async fn apply_staged(&self, writes: Vec<StagedWrite>) -> DocMapResult<usize> {
        let mut store = self.store.write().await;
        let mut staged = store.clone();
        let mut applied = Vec::with_capacity(writes.len());

        for write in writes {
            applied.push(StoreOperation::Update {
                collection: write.collection.clone(),
                selector: write.selector.clone(),
                update: write.update.clone(),
                upsert: write.upsert,
            });
            apply_update(&mut staged, &write.collection, &write.selector, write.update, write.upsert)?;
        }

        *store = staged;

        let count = applied.len();
        if let Some(journal) = &self.journal {
            journal.lock().await.extend(applied);
        }

        Ok(count)
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn position(documents: &[Document], selector: &Document) -> DocMapResult<Option<usize>> {
    for (index, document) in documents.iter().enumerate() {
        if SelectorEvaluator::new(document).matches(selector)? {
            return Ok(Some(index));
        }
    }

    Ok(None)
}

fn apply_update(
    store: &mut StoreMap,
    collection: &str,
    selector: &Document,
    update: Update,
    upsert: bool,
) -> DocMapResult<UpdateOutcome> {
    let documents = store.entry(collection.to_string()).or_default();

    if let Some(index) = position(documents, selector)? {
        let current = &mut documents[index];
        let updated = match update {
            Update::Set(fields) => {
                let mut updated = current.clone();
                for (path, value) in fields {
                    set_path(&mut updated, &path, value);
                }
                updated
            }
            Update::Replace(mut replacement) => {
                let id = current
                    .get(IDENTITY_FIELD)
                    .cloned()
                    .unwrap_or(Bson::Null);
                match replacement.get(IDENTITY_FIELD) {
                    Some(new_id) if new_id != &id => {
                        return Err(DocMapError::Backend(format!(
                            "replacement would change {IDENTITY_FIELD} from {id} to {new_id}"
                        )));
                    }
                    Some(_) => {}
                    None => {
                        replacement.insert(IDENTITY_FIELD, id);
                    }
                }
                replacement
            }
        };

        let modified = u64::from(*current != updated);
        *current = updated;

        return Ok(UpdateOutcome { matched: 1, modified, upserted_id: None });
    }

    if !upsert {
        return Ok(UpdateOutcome::default());
    }

    let mut created = match update {
        Update::Set(fields) => {
            let mut created = seed_from_selector(selector);
            for (path, value) in fields {
                set_path(&mut created, &path, value);
            }
            created
        }
        Update::Replace(replacement) => {
            let mut created = replacement;
            if !created.contains_key(IDENTITY_FIELD) {
                if let Some(id) = seed_from_selector(selector).get(IDENTITY_FIELD) {
                    created.insert(IDENTITY_FIELD, id.clone());
                }
            }
            created
        }
    };

    if !created.contains_key(IDENTITY_FIELD) {
        created.insert(IDENTITY_FIELD, ObjectId::new());
    }
    let upserted_id = created.get(IDENTITY_FIELD).cloned();
    documents.push(created);

    Ok(UpdateOutcome { matched: 0, modified: 0, upserted_id })
}

#[async_trait]
impl RepositoryAdapter for InMemoryStore {
    async fn find_one(
        &self,
        selector: &Document,
        collection: &str,
    ) -> DocMapResult<Option<Document>> {
        self.record(StoreOperation::FindOne {
            collection: collection.to_string(),
            selector: selector.clone(),
        })
        .await;

        let store = self.store.read().await;
        let documents = match store.get(collection) {
            Some(documents) => documents,
            None => return Ok(None),
        };

        event!(Level::TRACE, collection, %selector, "scanning collection");
        Ok(position(documents, selector)?.map(|index| documents[index].clone()))
    }

    async fn update(
        &self,
        selector: &Document,
        update: Update,
        upsert: bool,
        collection: &str,
    ) -> DocMapResult<UpdateOutcome> {
        self.record(StoreOperation::Update {
            collection: collection.to_string(),
            selector: selector.clone(),
            update: update.clone(),
            upsert,
        })
        .await;

        let targeted = update.is_set();
        let outcome = apply_update(&mut *self.store.write().await, collection, selector, update, upsert)?;

        event!(
            Level::DEBUG,
            collection,
            targeted,
            matched = outcome.matched,
            upserted = outcome.upserted_id.is_some(),
            "document updated"
        );

        Ok(outcome)
    }

    async fn remove(&self, id: &Bson, collection: &str) -> DocMapResult<RemoveOutcome> {
        self.record(StoreOperation::Remove {
            collection: collection.to_string(),
            id: id.clone(),
        })
        .await;

        let mut store = self.store.write().await;
        let Some(documents) = store.get_mut(collection) else {
            return Ok(RemoveOutcome::default());
        };

        let before = documents.len();
        if let Some(index) = documents
            .iter()
            .position(|doc| doc.get(IDENTITY_FIELD) == Some(id))
        {
            documents.remove(index);
        }
        let deleted = (before - documents.len()) as u64;

        event!(Level::DEBUG, collection, deleted, "document removed");
        Ok(RemoveOutcome { deleted })
    }
}

/// Builder for constructing [`InMemoryStore`] instances.
///
/// # Example
///
/// ```ignore
/// use docmap_memory::InMemoryStore;
/// use docmap::backend::AdapterBuilder;
///
/// #[tokio::main]
/// async fn main() {
///     let store = InMemoryStore::builder()
///         .record_operations(true)
///         .build()
///         .await
///         .unwrap();
/// }
/// ```
#[derive(Debug, Default, Clone)]
pub struct InMemoryStoreBuilder {
    record_operations: bool,
}

impl InMemoryStoreBuilder {
    /// Enables or disables the operation journal.
    pub fn record_operations(mut self, enabled: bool) -> Self {
        self.record_operations = enabled;
        self
    }
}

#[async_trait]
impl AdapterBuilder for InMemoryStoreBuilder {
    type Adapter = InMemoryStore;

    /// Builds and returns a new [`InMemoryStore`] instance.
    ///
    /// This always succeeds and returns a freshly initialized store.
    async fn build(self) -> DocMapResult<Self::Adapter> {
        let mut store = InMemoryStore::new();
        if self.record_operations {
            store.journal = Some(Arc::new(Mutex::new(Vec::new())));
        }

        Ok(store)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;

    async fn journaled() -> InMemoryStore {
        InMemoryStore::builder()
            .record_operations(true)
            .build()
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn set_upsert_seeds_from_the_selector() {
        let store = InMemoryStore::new();

        let outcome = store
            .update(&doc! { "_id": "x" }, Update::Set(doc! { "name": "alice" }), true, "users")
            .await
            .unwrap();

        assert_eq!(outcome.upserted_id, Some(Bson::from("x")));
        assert_eq!(store.documents("users").await, vec![doc! { "_id": "x", "name": "alice" }]);
    }

    #[tokio::test]
    async fn set_only_touches_named_keys() {
        let store = InMemoryStore::new();
        store
            .seed("users", [doc! { "_id": "x", "name": "alice", "tags": ["a"] }])
            .await
            .unwrap();

        let outcome = store
            .update(&doc! { "_id": "x" }, Update::Set(doc! { "tags": ["a", "b"] }), true, "users")
            .await
            .unwrap();

        assert_eq!(outcome.matched, 1);
        assert_eq!(outcome.modified, 1);
        assert_eq!(
            store.documents("users").await,
            vec![doc! { "_id": "x", "name": "alice", "tags": ["a", "b"] }]
        );
    }

    #[tokio::test]
    async fn replace_keeps_the_identity() {
        let store = InMemoryStore::new();
        store
            .seed("users", [doc! { "_id": "x", "name": "alice", "role": "admin" }])
            .await
            .unwrap();

        store
            .update(&doc! { "_id": "x" }, Update::Replace(doc! { "name": "bob" }), false, "users")
            .await
            .unwrap();

        assert_eq!(store.documents("users").await, vec![doc! { "_id": "x", "name": "bob" }]);

        let changed = store
            .update(&doc! { "_id": "x" }, Update::Replace(doc! { "_id": "y" }), false, "users")
            .await;
        assert!(matches!(changed, Err(DocMapError::Backend(_))));
    }

    #[tokio::test]
    async fn update_without_upsert_ignores_missing_documents() {
        let store = InMemoryStore::new();

        let outcome = store
            .update(&doc! { "_id": "x" }, Update::Set(doc! { "n": 1 }), false, "users")
            .await
            .unwrap();

        assert_eq!(outcome, UpdateOutcome::default());
        assert!(store.documents("users").await.is_empty());
    }

    #[tokio::test]
    async fn remove_reports_deletions() {
        let store = InMemoryStore::new();
        store
            .seed("users", [doc! { "_id": "x" }, doc! { "_id": "y" }])
            .await
            .unwrap();

        assert_eq!(store.remove(&Bson::from("x"), "users").await.unwrap().deleted, 1);
        assert_eq!(store.remove(&Bson::from("x"), "users").await.unwrap().deleted, 0);
        assert_eq!(store.remove(&Bson::from("x"), "missing").await.unwrap().deleted, 0);
        assert_eq!(store.documents("users").await, vec![doc! { "_id": "y" }]);
    }

    #[tokio::test]
    async fn journal_records_calls_in_order() {
        let store = journaled().await;

        store.find_one(&doc! { "_id": "x" }, "users").await.unwrap();
        store.remove(&Bson::from("x"), "users").await.unwrap();

        let operations = store.operations().await;
        assert_eq!(operations.len(), 2);
        assert!(!operations[0].is_write());
        assert!(operations[1].is_write());
        assert_eq!(operations[1].collection(), "users");

        store.clear_operations().await;
        assert!(store.operations().await.is_empty());
        assert!(InMemoryStore::new().operations().await.is_empty());
    }

    #[tokio::test]
    async fn seeding_requires_identities() {
        let store = InMemoryStore::new();

        assert!(store.seed("users", [doc! { "name": "x" }]).await.is_err());
        assert!(store.documents("users").await.is_empty());
    }
}
