use serde_json::{json, Value};

use crate::helpers::{fields, spawn_store};

#[tokio::test]
async fn written_document_is_read_back_with_generated_id() {
    let app = spawn_store();

    app.helper
        .write_document("items", fields(json!({ "name": "x" })))
        .await;

    let records = app.helper.read_collection("items").await;
    assert_eq!(records.len(), 1);
    let record = &records[0];
    assert_eq!(record.get("name"), Some(&json!("x")));
    let id = match record.get("id") {
        Some(Value::String(id)) => id,
        other => panic!("expected a string id but got {other:?}"),
    };
    assert!(!id.is_empty());
    assert_eq!(record.len(), 2);
}

#[tokio::test]
async fn empty_collection_and_failing_backend_look_the_same() {
    let app = spawn_store();
    let empty = app.helper.read_collection("items").await;

    app.helper
        .write_document("items", fields(json!({ "name": "x" })))
        .await;
    app.store.set_offline(true);
    let failed = app.helper.read_collection("items").await;

    assert!(empty.is_empty());
    assert_eq!(empty, failed);
}

#[tokio::test]
async fn failed_write_is_silent() {
    let app = spawn_store();
    app.store.set_offline(true);

    app.helper
        .write_document("items", fields(json!({ "name": "lost" })))
        .await;

    app.store.set_offline(false);
    assert!(app.helper.read_collection("items").await.is_empty());
}

#[tokio::test]
async fn invalid_collection_name_yields_empty_list() {
    let app = spawn_store();
    app.helper
        .write_document("", fields(json!({ "name": "x" })))
        .await;

    assert!(app.helper.read_collection("").await.is_empty());
    assert!(app.helper.read_collection("items/doc").await.is_empty());
}

#[tokio::test]
async fn concurrent_writes_all_land() {
    let app = spawn_store();

    futures::future::join_all((0..10).map(|n| {
        app.helper
            .write_document("items", fields(json!({ "n": n })))
    }))
    .await;

    let mut seen: Vec<i64> = app
        .helper
        .read_collection("items")
        .await
        .iter()
        .filter_map(|record| record.get("n").and_then(Value::as_i64))
        .collect();
    seen.sort();
    assert_eq!(seen, (0..10).collect::<Vec<_>>());
}

#[tokio::test]
async fn underlying_store_still_reports_failures() {
    let app = spawn_store();
    app.store.set_offline(true);

    let result = app.helper.store().read_all("items").await;

    assert!(matches!(
        result,
        Err(docstore::error::StoreError::Unavailable(_))
    ));
}
