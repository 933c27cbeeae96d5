//! Main docmap crate: a change-tracking document-object mapper.
//!
//! This crate is the primary entry point for users of docmap. It re-exports the
//! core types from the sub-crates, the `Schema` derive, and the available
//! repository adapters.
//!
//! Entities are bound to one stored document each. Assigning a scalar field
//! records the field as changed; list and map fields are [`tracked`]
//! containers that flag their own mutation. Committing an entity turns both
//! into a single write: a targeted `$set` of what changed, a full-document
//! upsert for an entity the store has never seen, or nothing at all.
//!
//! # Features
//!
//! - **Declarative schemas** - `#[derive(Schema)]` with per-field defaults
//! - **Change tracking** - Scalar assignments and in-place container mutations
//! - **Minimal writes** - Only changed keys are sent for existing documents
//! - **Transactions** - Route commits through a session and apply them together
//! - **Multiple backends** - In-memory and MongoDB adapters behind one trait
//!
//! # Quick Start
//!
//! ```ignore
//! use docmap::{prelude::*, memory::InMemoryStore};
//!
//! #[derive(Schema)]
//! #[schema(collection = "users")]
//! pub struct User {
//!     name: String,
//!     #[schema(default = "member")]
//!     role: String,
//!     #[schema(default = Vec::<String>::new())]
//!     tags: Vec<String>,
//! }
//!
//! #[tokio::main]
//! async fn main() -> DocMapResult<()> {
//!     let store = DocumentStore::new(InMemoryStore::builder().build().await?);
//!     let users = store.entities::<User>();
//!
//!     // A fresh entity is written as a full document.
//!     let mut user = users.create();
//!     user.set("name", "Alice");
//!     user.commit(&users).await?;
//!
//!     // Later commits only send what changed: { $set: { tags: ["admin"] } }
//!     user.list_mut("tags")?.push("admin".into());
//!     user.commit(&users).await?;
//!
//!     // Load it back by id.
//!     let loaded = users.get(user.id()).await?;
//!     assert!(loaded.is_some());
//!
//!     store.shutdown().await
//! }
//! ```
//!
//! # Transactions
//!
//! ```ignore
//! let session = store.adapter().start_session();
//!
//! alice.commit_with(&users, CommitOptions::new().transaction(&session)).await?;
//! bob.commit_with(&users, CommitOptions::new().transaction(&session)).await?;
//!
//! session.commit().await?;
//! ```
//!
//! # Backends
//!
//! - [`memory`] - In-memory storage for development and testing
//! - [`mongodb`] - Persistent MongoDB backend (requires `mongodb` feature)

#[allow(unused_extern_crates)]
extern crate self as docmap;

pub mod prelude;

pub use docmap_core::{
    backend, collection, entity, error, identity, schema, store, tracked, transaction,
};
pub use docmap_core::{
    entity::Entity,
    store::DocumentStore,
};

/// Derive macro generating a [`schema::Schema`] implementation.
pub use docmap_macros::Schema;

// Re-export BSON types for convenience
pub use bson;

/// In-memory storage backend implementations.
pub mod memory {
    pub use docmap_memory::{InMemorySession, InMemoryStore, InMemoryStoreBuilder, StoreOperation};
}

/// MongoDB storage backend implementations.
///
/// This module is only available when the `mongodb` feature is enabled.
#[cfg(feature = "mongodb")]
pub mod mongodb {
    pub use docmap_mongodb::{MongoDbSession, MongoDbStore, MongoDbStoreBuilder};
}
