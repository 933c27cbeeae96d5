//! Sessions that group writes and apply them together.

use tracing::{Level, event};

use docmap_core::{
    error::DocMapResult,
    transaction::{CollectionHandle, Transaction, WriteStage},
};

use crate::store::InMemoryStore;

/// A transaction against an [`InMemoryStore`].
///
/// Writes routed through [`Transaction::collection`] are queued and become
/// visible only when [`InMemorySession::commit`] succeeds. If any queued
/// write fails, none of them is applied.
#[derive(Debug)]
pub struct InMemorySession {
    store: InMemoryStore,
    stage: WriteStage,
}

impl InMemorySession {
    pub(crate) fn new(store: InMemoryStore) -> Self {
        Self { store, stage: WriteStage::new() }
    }

    /// Returns the number of writes waiting for commit.
    pub async fn pending(&self) -> usize {
        self.stage.len().await
    }

    /// Applies every queued write atomically and returns how many were applied.
    ///
    /// # Errors
    ///
    /// Returns the first write's error; the store is left unchanged.
    pub async fn commit(self) -> DocMapResult<usize> {
        let writes = self.stage.take().await;

        match self.store.apply_staged(writes).await {
            Ok(count) => {
                event!(Level::DEBUG, writes = count, "session committed");
                Ok(count)
            }
            Err(err) => {
                event!(Level::WARN, error = %err, "session commit aborted");
                Err(err)
            }
        }
    }

    /// Discards every queued write and returns how many were dropped.
    pub async fn abort(self) -> usize {
        let dropped = self.stage.take().await.len();
        event!(Level::DEBUG, writes = dropped, "session aborted");

        dropped
    }
}

impl Transaction for InMemorySession {
    fn collection<'a>(&'a self, name: &str) -> Box<dyn CollectionHandle + 'a> {
        Box::new(self.stage.collection(name))
    }
}
