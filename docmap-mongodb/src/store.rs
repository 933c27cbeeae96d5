use async_trait::async_trait;
use bson::{Bson, Document, doc};
use mongodb::{
    Client, ClientSession, Collection as MongoCollection,
    options::ClientOptions,
};
use tracing::{Level, event};

use docmap_core::{
    backend::{AdapterBuilder, RemoveOutcome, RepositoryAdapter, Update, UpdateOutcome},
    error::{DocMapError, DocMapResult},
    schema::IDENTITY_FIELD,
};

use crate::session::MongoDbSession;

#[derive(Debug, Clone)]
pub struct MongoDbStore {
    client: Client,
    database: String,
}

impl MongoDbStore {
    pub fn new(client: Client, database: String) -> Self {
        Self { client, database }
    }

    pub fn builder(dsn: &str, database: &str) -> MongoDbStoreBuilder {
        MongoDbStoreBuilder::new(dsn, database)
    }

    /// Returns the database name this store addresses.
    pub fn database(&self) -> &str {
        &self.database
    }

    /// Starts a session whose writes are applied inside one driver transaction on commit.
    ///
    /// Transactions require a replica set or sharded cluster.
    pub fn start_session(&self) -> MongoDbSession {
        MongoDbSession::new(self.clone())
    }

    fn get_collection(&self, collection_name: &str) -> MongoCollection<Document> {
        self.client
            .database(&self.database)
            .collection(collection_name)
    }

    pub(crate) fn client(&self) -> &Client {
        &self.client
    }

    /// Issues one update, optionally bound to a client session.
    pub(crate) async fn apply_update(
        &self,
        selector: &Document,
        update: Update,
        upsert: bool,
        collection: &str,
        session: Option<&mut ClientSession>,
    ) -> DocMapResult<UpdateOutcome> {
        let target = self.get_collection(collection);

        let result = match update {
            Update::Set(fields) => {
                let action = target
                    .update_one(selector.clone(), doc! { "$set": fields })
                    .upsert(upsert);
                match session {
                    Some(session) => action.session(session).await,
                    None => action.await,
                }
            }
            Update::Replace(mut replacement) => {
                if !replacement.contains_key(IDENTITY_FIELD) {
                    if let Some(id) = selector.get(IDENTITY_FIELD) {
                        replacement.insert(IDENTITY_FIELD, id.clone());
                    }
                }
                let action = target
                    .replace_one(selector.clone(), replacement)
                    .upsert(upsert);
                match session {
                    Some(session) => action.session(session).await,
                    None => action.await,
                }
            }
        }
        .map_err(|e| DocMapError::Backend(e.to_string()))?;

        Ok(UpdateOutcome {
            matched: result.matched_count,
            modified: result.modified_count,
            upserted_id: result.upserted_id,
        })
    }

    async fn shutdown(self) -> DocMapResult<()> {
        self.client.shutdown().await;

        Ok(())
    }
}

#[async_trait]
impl RepositoryAdapter for MongoDbStore {
    async fn find_one(
        &self,
        selector: &Document,
        collection: &str,
    ) -> DocMapResult<Option<Document>> {
        event!(Level::TRACE, collection, %selector, "find_one");

        self.get_collection(collection)
            .find_one(selector.clone())
            .await
            .map_err(|e| DocMapError::Backend(e.to_string()))
    }

    async fn update(
        &self,
        selector: &Document,
        update: Update,
        upsert: bool,
        collection: &str,
    ) -> DocMapResult<UpdateOutcome> {
        let targeted = update.is_set();
        let outcome = self
            .apply_update(selector, update, upsert, collection, None)
            .await?;

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
        let result = self
            .get_collection(collection)
            .delete_one(doc! { IDENTITY_FIELD: id.clone() })
            .await
            .map_err(|e| DocMapError::Backend(e.to_string()))?;

        event!(Level::DEBUG, collection, deleted = result.deleted_count, "document removed");
        Ok(RemoveOutcome { deleted: result.deleted_count })
    }

    async fn shutdown(self) -> DocMapResult<()> {
        self.shutdown().await
    }
}

pub struct MongoDbStoreBuilder {
    dsn: String,
    database: String,
    app_name: Option<String>,
}

impl MongoDbStoreBuilder {
    pub fn new(dsn: &str, database: &str) -> Self {
        Self {
            dsn: dsn.to_string(),
            database: database.to_string(),
            app_name: None,
        }
    }

    /// Sets the application name reported to the server.
    pub fn app_name(mut self, name: impl Into<String>) -> Self {
        self.app_name = Some(name.into());
        self
    }
}

#[async_trait]
impl AdapterBuilder for MongoDbStoreBuilder {
    type Adapter = MongoDbStore;

    async fn build(self) -> DocMapResult<Self::Adapter> {
        let mut options = ClientOptions::parse(&self.dsn)
            .await
            .map_err(|e| DocMapError::Initialization(e.to_string()))?;
        if let Some(app_name) = self.app_name {
            options.app_name = Some(app_name);
        }

        Ok(MongoDbStore::new(
            Client::with_options(options)
                .map_err(|e| DocMapError::Initialization(e.to_string()))?,
            self.database,
        ))
    }
}
