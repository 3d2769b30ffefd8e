pub mod firestore;
pub mod memory;

use std::{fmt, sync::Arc};

use async_trait::async_trait;
use rand::{distributions::Alphanumeric, Rng};

use crate::{
    configuration::{Backend, Settings},
    document::{Document, Fields},
    error::StoreError,
};

pub use firestore::FirestoreStore;
pub use memory::InMemoryStore;

/// Length of identifiers generated for new documents.
pub const DOCUMENT_ID_LENGTH: usize = 20;

/// Invoked with no payload whenever a watched collection changes.
pub type ChangeCallback = Arc<dyn Fn() + Send + Sync>;

/// Capability interface over a remote document store.
///
/// Every method is a single round trip to the backend. Errors are returned
/// as-is; swallowing them is left to [`crate::helper::CollectionHelper`].
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// All documents of `collection`, ordered by identifier.
    async fn read_all(&self, collection: &str) -> Result<Vec<Document>, StoreError>;

    /// Creates a document and returns the identifier the store assigned.
    async fn write_one(&self, collection: &str, fields: Fields) -> Result<String, StoreError>;

    /// Registers `on_change` for every change to `collection`, starting with
    /// the initial snapshot. The listener lives until the returned handle is
    /// unsubscribed.
    async fn subscribe(
        &self,
        collection: &str,
        on_change: ChangeCallback,
    ) -> Result<Subscription, StoreError>;

    /// `Ok(None)` when no document with `id` exists.
    async fn read_one(&self, collection: &str, id: &str) -> Result<Option<Fields>, StoreError>;

    async fn delete_one(&self, collection: &str, id: &str) -> Result<(), StoreError>;
}

/// Opens the backend selected in `application.backend`.
pub fn open(settings: &Settings) -> Result<Arc<dyn DocumentStore>, StoreError> {
    let store: Arc<dyn DocumentStore> = match settings.application.backend {
        Backend::Memory => Arc::new(InMemoryStore::new()),
        Backend::Firestore => Arc::new(FirestoreStore::new(&settings.firestore)?),
    };
    tracing::info!(backend = ?settings.application.backend, "opened document store");
    Ok(store)
}

/// Handle to a live listener registration.
///
/// Dropping the handle does not release the listener.
#[must_use = "the listener keeps running until `unsubscribe` is called"]
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    pub fn new(cancel: impl FnOnce() + Send + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// A handle with nothing behind it, handed out when registration failed.
    pub fn noop() -> Self {
        Self { cancel: None }
    }

    pub fn unsubscribe(mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.cancel.is_some())
            .finish()
    }
}

pub fn generate_document_id() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(DOCUMENT_ID_LENGTH)
        .map(char::from)
        .collect()
}

/// Collection paths alternate collection and document segments, so they
/// must have an odd number of non-empty segments (`items`, `users/u1/notes`).
pub fn validate_collection(collection: &str) -> Result<Vec<&str>, StoreError> {
    let segments: Vec<&str> = collection.split('/').collect();
    if segments.iter().any(|segment| segment.is_empty()) {
        return Err(StoreError::InvalidPath(format!(
            "collection path `{}` has an empty segment",
            collection
        )));
    }
    if segments.len() % 2 == 0 {
        return Err(StoreError::InvalidPath(format!(
            "`{}` names a document, not a collection",
            collection
        )));
    }
    Ok(segments)
}

pub fn validate_document_id(id: &str) -> Result<(), StoreError> {
    if id.is_empty() || id.contains('/') {
        return Err(StoreError::InvalidPath(format!(
            "`{}` is not a valid document id",
            id
        )));
    }
    Ok(())
}
