mod common;

use async_trait::async_trait;
use docmap::{
    bson::{Bson, Document, doc},
    memory::StoreOperation,
    prelude::*,
};
use serde::{Deserialize, Serialize};

use common::{AuditEntry, User, journaled_store};

#[derive(Debug, PartialEq, Serialize, Deserialize)]
struct Settings {
    theme: String,
    compact: bool,
}

#[test]
fn derived_schema_describes_the_struct() {
    assert_eq!(User::collection_name(), "users");
    assert_eq!(User::fields(), &["name", "role", "tags", "settings", "loginCount"]);
    assert_eq!(
        User::defaults(),
        &doc! { "role": "member", "tags": [], "loginCount": 0 }
    );
    assert_eq!(AuditEntry::collection_name(), "audit_entry");
}

#[tokio::test]
async fn fresh_entity_commit_upserts_the_full_document() {
    let store = journaled_store().await;
    let users = store.entities::<User>();

    let mut user = users.create();
    user.set("name", "alice");
    user.commit(&users).await.unwrap();

    let operations = store.adapter().operations().await;
    assert_eq!(
        operations,
        vec![StoreOperation::Update {
            collection: "users".to_string(),
            selector: doc! { "_id": user.identity() },
            update: Update::Replace(user.export()),
            upsert: true,
        }]
    );

    let stored = store.adapter().documents("users").await;
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].get_str("name").ok(), Some("alice"));
    assert_eq!(stored[0].get_str("role").ok(), Some("member"));
    assert_eq!(stored[0].get_i32("loginCount").ok(), Some(0));
    assert!(matches!(stored[0].get("_id"), Some(Bson::ObjectId(_))));

    assert!(user.exists());
    assert_eq!(user.changed_fields().count(), 0);
}

#[tokio::test]
async fn container_mutation_commits_a_targeted_set() {
    let store = journaled_store().await;
    store
        .adapter()
        .seed("users", [doc! { "_id": "x", "name": "bob", "tags": ["a"] }])
        .await
        .unwrap();
    let users = store.entities::<User>();

    let mut user = users.get("x").await.unwrap().unwrap();
    store.adapter().clear_operations().await;

    user.list_mut("tags").unwrap().push("b".into());
    user.commit(&users).await.unwrap();

    assert_eq!(
        store.adapter().operations().await,
        vec![StoreOperation::Update {
            collection: "users".to_string(),
            selector: doc! { "_id": "x" },
            update: Update::Set(doc! { "tags": ["a", "b"] }),
            upsert: true,
        }]
    );
    assert!(!user.list("tags").unwrap().unwrap().is_dirty());
    assert_eq!(
        store.adapter().documents("users").await,
        vec![doc! { "_id": "x", "name": "bob", "tags": ["a", "b"] }]
    );
}

#[tokio::test]
async fn untouched_loaded_entity_commits_nothing() {
    let store = journaled_store().await;
    store
        .adapter()
        .seed("users", [doc! { "_id": "x", "name": "bob", "settings": { "theme": "dark" } }])
        .await
        .unwrap();
    let users = store.entities::<User>();

    let mut user = users.get("x").await.unwrap().unwrap();
    assert!(user.exists());
    assert!(!user.has_pending_changes());

    store.adapter().clear_operations().await;
    user.commit(&users).await.unwrap();
    user.commit(&users).await.unwrap();

    assert!(store.adapter().operations().await.is_empty());
}

#[tokio::test]
async fn scalar_changes_only_touch_their_keys() {
    let store = journaled_store().await;
    store
        .adapter()
        .seed("users", [doc! { "_id": "x", "name": "bob", "role": "admin", "extra": true }])
        .await
        .unwrap();
    let users = store.entities::<User>();

    let mut user = users.get("x").await.unwrap().unwrap();
    user.set("name", "robert");
    user.commit(&users).await.unwrap();

    assert_eq!(
        store.adapter().documents("users").await,
        vec![doc! { "_id": "x", "name": "robert", "role": "admin", "extra": true }]
    );
    assert_eq!(user.get("extra").unwrap(), Bson::Boolean(true));
}

#[tokio::test]
async fn explicit_fields_are_written_even_when_unchanged() {
    let store = journaled_store().await;
    store
        .adapter()
        .seed("users", [doc! { "_id": "x", "name": "bob" }])
        .await
        .unwrap();
    let users = store.entities::<User>();

    let mut user = users.get("x").await.unwrap().unwrap();
    user.set("name", "robert");
    store.adapter().clear_operations().await;

    user.commit_fields(&users, ["role", "loginCount"]).await.unwrap();

    assert_eq!(
        store.adapter().operations().await,
        vec![StoreOperation::Update {
            collection: "users".to_string(),
            selector: doc! { "_id": "x" },
            update: Update::Set(doc! { "loginCount": 0, "role": "member" }),
            upsert: true,
        }]
    );
    assert_eq!(user.changed_fields().count(), 0);
}

#[tokio::test]
async fn conflicting_lookup_never_reaches_the_store() {
    let store = journaled_store().await;
    let users = store.entities::<User>();

    let result = Entity::<User>::open(
        &users,
        Lookup::document(doc! { "_id": "x" }).with_selector(doc! { "name": "bob" }),
    )
    .await;

    assert!(matches!(result, Err(DocMapError::ConflictingArguments(_))));
    assert!(store.adapter().operations().await.is_empty());
}

#[tokio::test]
async fn missing_documents_yield_no_entity() {
    let store = journaled_store().await;
    let users = store.entities::<User>();

    assert!(users.find_one(doc! { "name": "nobody" }).await.unwrap().is_none());
    assert!(users.get("x").await.unwrap().is_none());

    let mut user = users.create();
    let err = user
        .load(&users, None, Some(doc! { "name": "nobody" }))
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn empty_lookup_opens_a_fresh_entity() {
    let store = journaled_store().await;
    let users = store.entities::<User>();

    let user = Entity::<User>::open(&users, Lookup::id("")).await.unwrap().unwrap();

    assert!(!user.exists());
    assert!(store.adapter().operations().await.is_empty());
}

#[tokio::test]
async fn loading_another_entitys_document_is_rejected() {
    let store = journaled_store().await;
    store
        .adapter()
        .seed("users", [doc! { "_id": "y", "name": "eve" }])
        .await
        .unwrap();
    let users = store.entities::<User>();

    let mut user = users.create();
    let err = user
        .load(&users, None, Some(doc! { "name": "eve" }))
        .await
        .unwrap_err();

    assert!(matches!(err, DocMapError::IdentityMismatch { found, .. } if found == "y"));
}

#[tokio::test]
async fn from_document_requires_an_identity() {
    let store = journaled_store().await;
    let users = store.entities::<User>();

    let err = users.from_document(doc! { "name": "bob" }).await.unwrap_err();
    assert!(matches!(err, DocMapError::InvalidDocument(_)));

    let user = users
        .from_document(doc! { "_id": "x", "name": "bob", "tags": ["a"] })
        .await
        .unwrap();
    assert_eq!(user.id(), "x");
    assert!(user.exists());
    assert!(!user.list("tags").unwrap().unwrap().is_dirty());
    assert!(store.adapter().operations().await.is_empty());
}

#[tokio::test]
async fn empty_documents_and_identities_are_rejected_locally() {
    let store = journaled_store().await;
    let users = store.entities::<User>();

    let empty = users.from_document(doc! {}).await.unwrap_err();
    assert!(matches!(empty, DocMapError::InvalidDocument(_)));

    let blank_id = users.from_document(doc! { "_id": "", "name": "bob" }).await.unwrap_err();
    assert!(matches!(blank_id, DocMapError::InvalidDocument(_)));

    assert!(store.adapter().operations().await.is_empty());
}

#[tokio::test]
async fn commits_address_the_loaded_identity_verbatim() {
    let store = journaled_store().await;
    store
        .adapter()
        .seed(
            "users",
            [
                doc! { "_id": 7, "name": "bob" },
                doc! { "_id": "507f1f77bcf86cd799439011", "name": "carol" },
            ],
        )
        .await
        .unwrap();
    let users = store.entities::<User>();

    let mut bob = users.find_one(doc! { "name": "bob" }).await.unwrap().unwrap();
    assert_eq!(bob.id(), "7");
    assert_eq!(bob.identity(), Bson::Int32(7));
    bob.set("name", "rob");
    bob.commit(&users).await.unwrap();

    let mut carol = users.find_one(doc! { "name": "carol" }).await.unwrap().unwrap();
    assert_eq!(carol.identity(), Bson::from("507f1f77bcf86cd799439011"));
    carol.set("name", "carrie");
    carol.commit(&users).await.unwrap();

    assert_eq!(
        store.adapter().documents("users").await,
        vec![
            doc! { "_id": 7, "name": "rob" },
            doc! { "_id": "507f1f77bcf86cd799439011", "name": "carrie" },
        ]
    );

    assert_eq!(bob.remove(&users).await.unwrap().deleted, 1);
    assert_eq!(carol.remove(&users).await.unwrap().deleted, 1);
    assert!(store.adapter().documents("users").await.is_empty());
}

#[tokio::test]
async fn full_document_commit_cleans_every_container() {
    let store = journaled_store().await;
    let users = store.entities::<User>();

    let mut user = users.create();
    user.set("name", "alice");
    user.set("tags", vec!["a", "b"]);
    user.set("settings", doc! { "theme": "dark" });
    user.commit(&users).await.unwrap();

    assert!(matches!(
        store.adapter().operations().await.as_slice(),
        [StoreOperation::Update { update: Update::Replace(_), .. }]
    ));
    assert!(!user.list("tags").unwrap().unwrap().is_dirty());
    assert!(!user.map("settings").unwrap().unwrap().is_dirty());
    assert!(!user.has_pending_changes());

    store.adapter().clear_operations().await;
    user.commit(&users).await.unwrap();
    assert!(store.adapter().operations().await.is_empty());
}

#[tokio::test]
async fn serde_values_round_trip_through_fields() {
    let store = journaled_store().await;
    let users = store.entities::<User>();

    let mut user = users.create();
    user.set_as("settings", &Settings { theme: "dark".into(), compact: true })
        .unwrap();
    assert!(user.map("settings").unwrap().unwrap().is_dirty());
    user.commit(&users).await.unwrap();

    let loaded = users.get(user.id()).await.unwrap().unwrap();
    assert_eq!(
        loaded.get_as::<Settings>("settings").unwrap(),
        Settings { theme: "dark".into(), compact: true }
    );
    assert_eq!(loaded.get_as::<Vec<String>>("tags").unwrap(), Vec::<String>::new());
}

#[tokio::test]
async fn undeclared_attributes_are_never_persisted() {
    let store = journaled_store().await;
    let users = store.entities::<User>();

    let mut user = users.create();
    user.set("name", "alice");
    user.set("session_token", "secret");
    user.commit(&users).await.unwrap();

    let stored = store.adapter().documents("users").await;
    assert!(!stored[0].contains_key("session_token"));
    assert_eq!(user.get("session_token").unwrap(), Bson::from("secret"));
}

#[tokio::test]
async fn independent_entities_converge_per_field() {
    let store = journaled_store().await;
    store
        .adapter()
        .seed("users", [doc! { "_id": "x", "name": "bob", "role": "member" }])
        .await
        .unwrap();
    let users = store.entities::<User>();

    let mut first = users.get("x").await.unwrap().unwrap();
    let mut second = users.get("x").await.unwrap().unwrap();
    first.set("name", "robert");
    second.set("role", "admin");
    first.commit(&users).await.unwrap();
    second.commit(&users).await.unwrap();

    assert_eq!(
        store.adapter().documents("users").await,
        vec![doc! { "_id": "x", "name": "robert", "role": "admin" }]
    );
}

#[tokio::test]
async fn remove_deletes_by_identity_and_keeps_state() {
    let store = journaled_store().await;
    let users = store.entities::<User>();

    let mut user = users.create();
    user.set("name", "alice");
    user.commit(&users).await.unwrap();

    assert_eq!(user.remove(&users).await.unwrap().deleted, 1);
    assert_eq!(user.remove(&users).await.unwrap().deleted, 0);
    assert!(user.exists());
    assert_eq!(user.get("name").unwrap(), Bson::from("alice"));
    assert!(store.adapter().documents("users").await.is_empty());
}

#[derive(Debug)]
struct UnavailableStore;

#[async_trait]
impl RepositoryAdapter for UnavailableStore {
    async fn find_one(&self, _selector: &Document, _collection: &str) -> DocMapResult<Option<Document>> {
        Err(DocMapError::Backend("store unavailable".into()))
    }

    async fn update(
        &self,
        _selector: &Document,
        _update: Update,
        _upsert: bool,
        _collection: &str,
    ) -> DocMapResult<UpdateOutcome> {
        Err(DocMapError::Backend("store unavailable".into()))
    }

    async fn remove(&self, _id: &Bson, _collection: &str) -> DocMapResult<RemoveOutcome> {
        Err(DocMapError::Backend("store unavailable".into()))
    }
}

#[tokio::test]
async fn failed_commits_keep_pending_changes() {
    let store = DocumentStore::new(UnavailableStore);
    let users = store.entities::<User>();

    let mut user = users.create();
    user.set("name", "alice");
    user.set("tags", vec!["a"]);

    let err = user.commit(&users).await.unwrap_err();
    assert!(matches!(err, DocMapError::Backend(_)));
    assert!(!user.exists());
    assert!(user.is_changed("name"));
    assert!(user.list("tags").unwrap().unwrap().is_dirty());

    assert!(matches!(users.get("x").await, Err(DocMapError::Backend(_))));
    assert!(matches!(user.remove(&users).await, Err(DocMapError::Backend(_))));
}
