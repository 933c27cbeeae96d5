//! Convenient re-exports of commonly used types from docmap.
//!
//! Import this prelude module to quickly access the most frequently used types
//! and traits without needing to import from multiple sub-modules:
//!
//! ```ignore
//! use docmap::prelude::*;
//! ```

pub use docmap_core::{
    backend::{AdapterBuilder, RemoveOutcome, RepositoryAdapter, Update, UpdateOutcome},
    collection::{Collection, EntityCollection},
    entity::{CommitOptions, CommitPlan, Entity, FieldValue, Fields, Lookup},
    error::{DocMapError, DocMapResult},
    schema::Schema,
    store::DocumentStore,
    tracked::{Tracked, TrackedList, TrackedMap},
    transaction::{CollectionHandle, Transaction},
};

pub use docmap_macros::Schema;
