use tracing::{Level, event};

use docmap_core::{
    error::{DocMapError, DocMapResult},
    transaction::{CollectionHandle, StagedWrite, Transaction, WriteStage},
};

use crate::store::MongoDbStore;

/// A transaction against a [`MongoDbStore`].
///
/// Writes routed through [`Transaction::collection`] are queued locally; on
/// [`MongoDbSession::commit`] a client session is started and every write
/// runs inside one driver transaction, which is aborted if any of them fails.
#[derive(Debug)]
pub struct MongoDbSession {
    store: MongoDbStore,
    stage: WriteStage,
}

impl MongoDbSession {
    pub(crate) fn new(store: MongoDbStore) -> Self {
        Self { store, stage: WriteStage::new() }
    }

    /// Returns the number of writes waiting for commit.
    pub async fn pending(&self) -> usize {
        self.stage.len().await
    }

    /// Runs every queued write in one transaction and returns how many were applied.
    ///
    /// # Errors
    ///
    /// Returns [`DocMapError::Transaction`] if the session or transaction cannot
    /// be started or committed, and the first failing write's error otherwise.
    pub async fn commit(self) -> DocMapResult<usize> {
        let writes = self.stage.take().await;
        if writes.is_empty() {
            return Ok(0);
        }

        let mut session = self
            .store
            .client()
            .start_session()
            .await
            .map_err(|e| DocMapError::Transaction(e.to_string()))?;
        session
            .start_transaction()
            .await
            .map_err(|e| DocMapError::Transaction(e.to_string()))?;

        let count = writes.len();
        for StagedWrite { collection, selector, update, upsert } in writes {
            let applied = self
                .store
                .apply_update(&selector, update, upsert, &collection, Some(&mut session))
                .await;

            if let Err(err) = applied {
                event!(Level::WARN, error = %err, "session commit aborted");
                if let Err(abort) = session.abort_transaction().await {
                    event!(Level::WARN, error = %abort, "transaction abort failed");
                }
                return Err(err);
            }
        }

        session
            .commit_transaction()
            .await
            .map_err(|e| DocMapError::Transaction(e.to_string()))?;

        event!(Level::DEBUG, writes = count, "session committed");
        Ok(count)
    }

    /// Discards every queued write and returns how many were dropped.
    pub async fn abort(self) -> usize {
        let dropped = self.stage.take().await.len();
        event!(Level::DEBUG, writes = dropped, "session aborted");

        dropped
    }
}

impl Transaction for MongoDbSession {
    fn collection<'a>(&'a self, name: &str) -> Box<dyn CollectionHandle + 'a> {
        Box::new(self.stage.collection(name))
    }
}
