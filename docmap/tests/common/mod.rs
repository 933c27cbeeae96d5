#![allow(dead_code)]

use docmap::{Schema, memory::InMemoryStore, store::DocumentStore};

#[derive(Schema)]
#[schema(collection = "users")]
pub struct User {
    name: String,
    #[schema(default = "member")]
    role: String,
    #[schema(default = Vec::<String>::new())]
    tags: Vec<String>,
    settings: docmap::bson::Document,
    #[schema(rename = "loginCount", default = 0)]
    login_count: i32,
}

#[derive(Schema)]
pub struct AuditEntry {
    message: String,
}

pub async fn journaled_store() -> DocumentStore<InMemoryStore> {
    DocumentStore::connect(InMemoryStore::builder().record_operations(true))
        .await
        .unwrap()
}
