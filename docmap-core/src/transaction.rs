//! Transactional write scoping.
//!
//! A [`Transaction`] hands out collection handles that honour the same update
//! contract as a plain collection but route writes into the transaction.
//! Backends in this workspace implement transactions as staged sessions: a
//! [`WriteStage`] queues every write issued through a [`StagedCollection`],
//! and the backend's session applies the queue atomically on commit.

use async_trait::async_trait;
use bson::Document;
use mea::mutex::Mutex;
use tracing::{Level, event};

use crate::{
    backend::{Update, UpdateOutcome},
    error::DocMapResult,
};

/// A named collection that accepts targeted or full-document writes.
///
/// Implemented by [`Collection`](crate::collection::Collection),
/// [`EntityCollection`](crate::collection::EntityCollection) and by the
/// handles a [`Transaction`] returns.
#[async_trait]
pub trait CollectionHandle: Send + Sync {
    /// Returns the name of the collection this handle addresses.
    fn name(&self) -> &str;

    /// Applies `update` to the first document matching `selector`.
    async fn update(
        &self,
        selector: &Document,
        update: Update,
        upsert: bool,
    ) -> DocMapResult<UpdateOutcome>;
}

/// A transaction or session scope.
pub trait Transaction: Send + Sync {
    /// Returns a handle to the collection named `name`, scoped to this transaction.
    fn collection<'a>(&'a self, name: &str) -> Box<dyn CollectionHandle + 'a>;
}

/// A single write queued inside a transaction.
#[derive(Debug, Clone, PartialEq)]
pub struct StagedWrite {
    /// Target collection.
    pub collection: String,
    /// Selector identifying the document.
    pub selector: Document,
    /// Body of the write.
    pub update: Update,
    /// Whether the write creates the document when nothing matches.
    pub upsert: bool,
}

/// Ordered queue of writes waiting for a transaction to commit.
#[derive(Debug)]
pub struct WriteStage {
    writes: Mutex<Vec<StagedWrite>>,
}

impl WriteStage {
    pub fn new() -> Self {
        Self { writes: Mutex::new(Vec::new()) }
    }

    /// Appends a write to the queue.
    pub async fn push(&self, write: StagedWrite) {
        self.writes.lock().await.push(write);
    }

    /// Drains the queue, returning the writes in the order they were staged.
    pub async fn take(&self) -> Vec<StagedWrite> {
        std::mem::take(&mut *self.writes.lock().await)
    }

    /// Returns the number of writes currently queued.
    pub async fn len(&self) -> usize {
        self.writes.lock().await.len()
    }

    /// Returns `true` if nothing is queued.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Returns a handle that queues writes for `name` into this stage.
    pub fn collection<'a>(&'a self, name: &str) -> StagedCollection<'a> {
        StagedCollection { name: name.to_string(), stage: self }
    }
}

impl Default for WriteStage {
    fn default() -> Self {
        Self::new()
    }
}

/// Collection handle that queues writes instead of applying them.
///
/// The reported outcome is always empty: nothing has happened yet.
#[derive(Debug)]
pub struct StagedCollection<'a> {
    name: String,
    stage: &'a WriteStage,
}

#[async_trait]
impl CollectionHandle for StagedCollection<'_> {
    fn name(&self) -> &str {
        &self.name
    }

    async fn update(
        &self,
        selector: &Document,
        update: Update,
        upsert: bool,
    ) -> DocMapResult<UpdateOutcome> {
        event!(Level::DEBUG, collection = %self.name, "write staged");
        self.stage
            .push(StagedWrite {
                collection: self.name.clone(),
                selector: selector.clone(),
                update,
                upsert,
            })
            .await;

        Ok(UpdateOutcome::default())
    }
}
