//! Type-level description of an entity type.
//!
//! A [`Schema`] names the collection an entity type lives in, the set of
//! field names it declares, and an immutable table of per-field default
//! values. Schemas are normally derived:
//!
//! ```ignore
//! use docmap::Schema;
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
//! ```
//!
//! The struct fields document the shape of the stored document; only their
//! names and `#[schema(...)]` attributes feed the generated table.

use bson::{Bson, Document};

/// The identity key of every stored document.
pub const IDENTITY_FIELD: &str = "_id";

/// Type-level field table for an entity type.
///
/// Implementations must return the same values on every call; the tables are
/// shared by every entity of the type and are never mutated.
pub trait Schema: Send + Sync + 'static {
    /// Returns the name of the collection this entity type is stored in.
    fn collection_name() -> &'static str;

    /// Returns the declared field names.
    fn fields() -> &'static [&'static str];

    /// Returns the default value table, keyed by field name.
    fn defaults() -> &'static Document;

    /// Returns `true` if `name` is a declared field.
    fn is_declared(name: &str) -> bool {
        Self::fields().contains(&name)
    }

    /// Returns the registered default for `name`, if any.
    fn default_value(name: &str) -> Option<&'static Bson> {
        Self::defaults().get(name)
    }
}
