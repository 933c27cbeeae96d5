//! MongoDB repository adapter for docmap.
//!
//! This crate provides a MongoDB-based implementation of the `RepositoryAdapter` trait,
//! mapping entity commits onto `update_one` with `$set`, `replace_one` and `delete_one`.
//!
//! To use this backend, include the `mongodb` feature in your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! docmap = { version = "x.y.z", features = ["mongodb"] }
//! ```
//!
//! # Features
//!
//! - **Persistent storage** - Data is persisted to MongoDB Atlas or self-hosted MongoDB
//! - **Targeted updates** - Changed fields are written with `$set`, leaving other keys untouched
//! - **Async/await** - Fully asynchronous API built on MongoDB's async driver
//! - **Transactions** - Sessions group entity commits into one driver transaction
//!
//! # Connection
//!
//! To use this backend, you need a MongoDB connection string. This can be provided
//! through the builder pattern.
//!
//! # Example
//!
//! ```ignore
//! use docmap::{backend::AdapterBuilder, mongodb::MongoDbStore};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = MongoDbStore::builder("mongodb://localhost:27017", "my_database")
//!         .app_name("accounts-service")
//!         .build()
//!         .await?;
//!
//!     Ok(())
//! }
//! ```

#[allow(unused_extern_crates)]
extern crate self as docmap_mongodb;

pub mod store;
pub mod session;

pub use store::{MongoDbStore, MongoDbStoreBuilder};
pub use session::MongoDbSession;
