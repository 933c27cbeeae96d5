//! A document-object mapper with change tracking.
//!
//! This crate is the core of the docmap project and provides:
//!
//! - **Schemas** ([`schema`]) - Type-level field tables with per-field defaults
//! - **Tracked containers** ([`tracked`]) - Lists and maps that record their own mutation
//! - **Entities** ([`entity`]) - Objects bound to one stored document, with commit reconciliation
//! - **Repository adapters** ([`backend`]) - The capability contract a document store must offer
//! - **Transactions** ([`transaction`]) - Scoped collection handles and staged writes
//! - **Collections** ([`collection`]) - Typed and untyped collection views
//! - **Document store** ([`store`]) - Entry point owning an adapter
//! - **Identity** ([`identity`]) - Conversions between ids and the stored identity key
//! - **Error handling** ([`error`]) - Error and result types
//!
//! # Example
//!
//! ```ignore
//! use docmap::prelude::*;
//!
//! #[derive(Schema)]
//! #[schema(collection = "users")]
//! pub struct User {
//!     name: String,
//!     #[schema(default = Vec::<String>::new())]
//!     tags: Vec<String>,
//! }
//!
//! let users = store.entities::<User>();
//! let mut user = users.create();
//! user.set("name", "alice");
//! user.commit(&users).await?;
//! ```

#[allow(unused_extern_crates)]
extern crate self as docmap_core;

pub mod backend;
pub mod collection;
pub mod entity;
pub mod error;
pub mod identity;
pub mod schema;
pub mod store;
pub mod tracked;
pub mod transaction;
