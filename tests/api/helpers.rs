use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use docstore::{
    configuration::FirestoreSettings,
    document::Fields,
    helper::CollectionHelper,
    store::{FirestoreStore, InMemoryStore},
    telemetry::{get_subscriber, init_subscriber},
};
use once_cell::sync::Lazy;
use secrecy::Secret;
use serde_json::Value;
use wiremock::MockServer;

pub const TEST_PROJECT: &str = "test-project";

static TRACING: Lazy<()> = Lazy::new(|| {
    let default_filter_level = "docstore=debug";
    if std::env::var("TEST_LOG").is_ok() {
        let subscriber = get_subscriber(default_filter_level, std::io::stdout);
        init_subscriber(subscriber).expect("subscriber installed");
    } else {
        let subscriber = get_subscriber(default_filter_level, std::io::sink);
        init_subscriber(subscriber).expect("subscriber installed");
    };
});

pub struct TestStore {
    pub helper: CollectionHelper,
    pub store: InMemoryStore,
}

pub fn spawn_store() -> TestStore {
    // Only initialize tracer once instead of every test
    Lazy::force(&TRACING);

    let store = InMemoryStore::new();
    TestStore {
        helper: CollectionHelper::new(Arc::new(store.clone())),
        store,
    }
}

pub struct TestFirestore {
    pub helper: CollectionHelper,
    pub server: MockServer,
}

pub async fn spawn_firestore() -> TestFirestore {
    Lazy::force(&TRACING);

    let server = MockServer::start().await;
    let settings = FirestoreSettings {
        base_url: server.uri(),
        project_id: TEST_PROJECT.to_string(),
        database: "(default)".to_string(),
        api_key: Secret::new("test-key".to_string()),
        timeout_secs: 5,
        poll_interval_ms: 20,
        page_size: 300,
    };
    let store = FirestoreStore::new(&settings).expect("firestore store built");

    TestFirestore {
        helper: CollectionHelper::new(Arc::new(store)),
        server,
    }
}

pub fn collection_path(collection: &str) -> String {
    format!(
        "/v1/projects/{}/databases/(default)/documents/{}",
        TEST_PROJECT, collection
    )
}

pub fn document_name(collection: &str, id: &str) -> String {
    format!(
        "projects/{}/databases/(default)/documents/{}/{}",
        TEST_PROJECT, collection, id
    )
}

pub fn fields(value: Value) -> Fields {
    match value {
        Value::Object(fields) => fields,
        other => panic!("expected a JSON object but got {other:?}"),
    }
}

/// Callback that counts its invocations.
pub fn counter() -> (Arc<AtomicUsize>, impl Fn() + Send + Sync + 'static) {
    let calls = Arc::new(AtomicUsize::new(0));
    let handle = calls.clone();
    (calls, move || {
        handle.fetch_add(1, Ordering::SeqCst);
    })
}

pub fn calls(counter: &AtomicUsize) -> usize {
    counter.load(Ordering::SeqCst)
}
