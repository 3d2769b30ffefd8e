use serde_json::json;

use crate::helpers::{calls, counter, fields, spawn_store};

#[tokio::test]
async fn callback_fires_on_registration_and_every_change() {
    let app = spawn_store();
    let (count, on_change) = counter();

    let subscription = app.helper.subscribe("items", on_change).await;
    assert_eq!(calls(&count), 1);

    app.helper
        .write_document("items", fields(json!({ "name": "x" })))
        .await;
    let id = app.helper.read_collection("items").await[0]["id"]
        .as_str()
        .expect("id is a string")
        .to_string();
    app.helper.delete_document("items", &id).await;

    assert_eq!(calls(&count), 3);
    subscription.unsubscribe();
}

#[tokio::test]
async fn unsubscribe_stops_further_callbacks() {
    let app = spawn_store();
    let (count, on_change) = counter();
    let subscription = app.helper.subscribe("items", on_change).await;

    app.helper
        .write_document("items", fields(json!({ "name": "x" })))
        .await;
    subscription.unsubscribe();
    app.helper
        .write_document("items", fields(json!({ "name": "y" })))
        .await;

    assert_eq!(calls(&count), 2);
    assert_eq!(app.store.listener_count("items"), 0);
}

#[tokio::test]
async fn changes_to_other_collections_are_ignored() {
    let app = spawn_store();
    let (count, on_change) = counter();
    let subscription = app.helper.subscribe("items", on_change).await;

    app.helper
        .write_document("other", fields(json!({ "name": "x" })))
        .await;

    assert_eq!(calls(&count), 1);
    subscription.unsubscribe();
}

#[tokio::test]
async fn failed_registration_returns_inert_handle() {
    let app = spawn_store();
    app.store.set_offline(true);
    let (count, on_change) = counter();

    let subscription = app.helper.subscribe("items", on_change).await;
    app.store.set_offline(false);
    app.helper
        .write_document("items", fields(json!({ "name": "x" })))
        .await;

    assert_eq!(calls(&count), 0);
    assert_eq!(app.store.listener_count("items"), 0);
    subscription.unsubscribe();
}
