mod common;

use docmap::{
    bson::doc,
    memory::StoreOperation,
    prelude::*,
};

use common::{User, journaled_store};

#[tokio::test]
async fn session_commits_become_visible_together() {
    let store = journaled_store().await;
    let users = store.entities::<User>();
    let session = store.adapter().start_session();

    let mut alice = users.create();
    alice.set("name", "alice");
    let mut bob = users.create();
    bob.set("name", "bob");

    alice
        .commit_with(&users, CommitOptions::new().transaction(&session))
        .await
        .unwrap();
    bob.commit_with(&users, CommitOptions::new().transaction(&session))
        .await
        .unwrap();

    assert_eq!(session.pending().await, 2);
    assert!(store.adapter().documents("users").await.is_empty());
    assert!(store.adapter().operations().await.is_empty());
    assert!(alice.exists());

    assert_eq!(session.commit().await.unwrap(), 2);

    let stored = store.adapter().documents("users").await;
    assert_eq!(stored.len(), 2);
    assert_eq!(stored[0].get_str("name").ok(), Some("alice"));
    assert_eq!(stored[1].get_str("name").ok(), Some("bob"));
    assert!(store.adapter().operations().await.iter().all(StoreOperation::is_write));
}

#[tokio::test]
async fn targeted_updates_route_through_the_session() {
    let store = journaled_store().await;
    store
        .adapter()
        .seed("users", [doc! { "_id": "x", "name": "bob", "settings": { "theme": "dark" } }])
        .await
        .unwrap();
    let users = store.entities::<User>();

    let mut user = users.get("x").await.unwrap().unwrap();
    store.adapter().clear_operations().await;
    user.map_mut("settings").unwrap().insert("theme", "light");

    let session = store.adapter().start_session();
    user.commit_with(
        &users,
        CommitOptions::new()
            .transaction(&session)
            .fields("settings"),
    )
    .await
    .unwrap();
    session.commit().await.unwrap();

    assert_eq!(
        store.adapter().operations().await,
        vec![StoreOperation::Update {
            collection: "users".to_string(),
            selector: doc! { "_id": "x" },
            update: Update::Set(doc! { "settings": { "theme": "light" } }),
            upsert: true,
        }]
    );
    assert!(!user.map("settings").unwrap().unwrap().is_dirty());
}

#[tokio::test]
async fn aborted_sessions_write_nothing() {
    let store = journaled_store().await;
    let users = store.entities::<User>();
    let session = store.adapter().start_session();

    let mut user = users.create();
    user.set("name", "alice");
    user.commit_with(&users, CommitOptions::new().transaction(&session))
        .await
        .unwrap();

    assert_eq!(session.abort().await, 1);
    assert!(store.adapter().documents("users").await.is_empty());
    assert!(users.get(user.id()).await.unwrap().is_none());
}

#[tokio::test]
async fn noop_commits_stage_nothing() {
    let store = journaled_store().await;
    store
        .adapter()
        .seed("users", [doc! { "_id": "x", "name": "bob" }])
        .await
        .unwrap();
    let users = store.entities::<User>();
    let session = store.adapter().start_session();

    let mut user = users.get("x").await.unwrap().unwrap();
    user.commit_with(&users, CommitOptions::new().transaction(&session))
        .await
        .unwrap();

    assert_eq!(session.pending().await, 0);
    assert_eq!(session.commit().await.unwrap(), 0);
}
