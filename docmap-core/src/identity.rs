//! Conversions between entity identifiers and the store's identity key.
//!
//! Entities carry their id as a string. Ids that parse as a 24-character hex
//! [`ObjectId`] are stored as native object ids; anything else is stored as a
//! plain string. Entities loaded from the store keep the stored value as is,
//! so documents with other identity kinds are still addressed exactly.

use bson::{Bson, Document, oid::ObjectId};

use crate::schema::IDENTITY_FIELD;

/// Generates a fresh identifier in its string form.
pub fn generate() -> String {
    ObjectId::new().to_hex()
}

/// Canonicalises a caller-supplied id so that it round-trips through the store.
pub fn normalize(id: &str) -> String {
    match ObjectId::parse_str(id) {
        Ok(oid) => oid.to_hex(),
        Err(_) => id.to_string(),
    }
}

/// Converts an id into the value stored under the identity key.
pub fn to_bson(id: &str) -> Bson {
    match ObjectId::parse_str(id) {
        Ok(oid) => Bson::ObjectId(oid),
        Err(_) => Bson::String(id.to_string()),
    }
}

/// Renders a stored identity value as an id string.
///
/// The rendering is not reversible for every kind; address loaded documents
/// with the stored value, not with [`to_bson`] of this string.
pub fn from_bson(value: &Bson) -> String {
    match value {
        Bson::ObjectId(oid) => oid.to_hex(),
        Bson::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Builds the selector addressing the document with the given id.
pub fn selector(id: &str) -> Document {
    key_selector(to_bson(id))
}

/// Builds the selector addressing the document whose identity key holds `key`.
pub fn key_selector(key: Bson) -> Document {
    let mut selector = Document::new();
    selector.insert(IDENTITY_FIELD, key);
    selector
}
