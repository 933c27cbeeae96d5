//! In-memory repository adapter for docmap.
//!
//! This crate provides a thread-safe, in-memory implementation of the `RepositoryAdapter` trait.
//! It uses async-aware locks for concurrent access and is meant for development and testing.
//!
//! # Features
//!
//! - **Thread-safe access** - Concurrent reads and writes using an async-aware RwLock
//! - **Selector matching** - Equality on top-level and dotted paths, plus the common comparison operators
//! - **Upsert semantics** - `$set` upserts seed the new document from the selector
//! - **Operation journal** - Optional record of every adapter call, for asserting on store traffic
//! - **Sessions** - Staged writes applied atomically on commit
//!
//! # Quick Start
//!
//! ```ignore
//! use docmap::{DocumentStore, Schema, memory::InMemoryStore, backend::AdapterBuilder};
//!
//! #[derive(Schema)]
//! #[schema(collection = "users")]
//! pub struct User {
//!     name: String,
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let adapter = InMemoryStore::builder().record_operations(true).build().await?;
//!     let store = DocumentStore::new(adapter);
//!     let users = store.entities::<User>();
//!
//!     let mut user = users.create();
//!     user.set("name", "Alice");
//!     user.commit(&users).await?;
//!
//!     assert_eq!(store.adapter().operations().await.len(), 1);
//!
//!     Ok(())
//! }
//! ```

#[allow(unused_extern_crates)]
extern crate self as docmap_memory;

pub mod store;
pub mod session;
pub(crate) mod evaluator;

pub use store::{InMemoryStore, InMemoryStoreBuilder, StoreOperation};
pub use session::InMemorySession;
