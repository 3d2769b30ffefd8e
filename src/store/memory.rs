use std::{
    collections::{BTreeMap, HashMap},
    sync::{Arc, Mutex, MutexGuard},
};

use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    document::{Document, Fields},
    error::StoreError,
};

use super::{
    generate_document_id, validate_collection, validate_document_id, ChangeCallback,
    DocumentStore, Subscription,
};

/// In-process document store.
///
/// Listeners run synchronously inside the mutating call, after the lock has
/// been released, so an unsubscribed listener never sees a later change.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    state: Arc<Mutex<State>>,
}

#[derive(Default)]
struct State {
    collections: HashMap<String, BTreeMap<String, Fields>>,
    listeners: HashMap<String, HashMap<Uuid, ChangeCallback>>,
    offline: bool,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// While offline every operation fails as if the service were unreachable.
    pub fn set_offline(&self, offline: bool) {
        if let Ok(mut state) = self.state.lock() {
            state.offline = offline;
        }
    }

    pub fn listener_count(&self, collection: &str) -> usize {
        self.state
            .lock()
            .map(|state| state.listeners.get(collection).map_or(0, HashMap::len))
            .unwrap_or(0)
    }

    fn lock(&self) -> Result<MutexGuard<'_, State>, StoreError> {
        let state = self
            .state
            .lock()
            .map_err(|_| StoreError::Unavailable("store lock poisoned".to_string()))?;
        if state.offline {
            return Err(StoreError::Unavailable("store is offline".to_string()));
        }
        Ok(state)
    }

    fn notify(&self, collection: &str) {
        let callbacks: Vec<ChangeCallback> = match self.state.lock() {
            Ok(state) => state
                .listeners
                .get(collection)
                .map(|listeners| listeners.values().cloned().collect())
                .unwrap_or_default(),
            Err(_) => return,
        };
        tracing::debug!(collection, listeners = callbacks.len(), "notifying listeners");
        for callback in callbacks {
            callback();
        }
    }
}

#[async_trait]
impl DocumentStore for InMemoryStore {
    async fn read_all(&self, collection: &str) -> Result<Vec<Document>, StoreError> {
        validate_collection(collection)?;
        let state = self.lock()?;
        let documents = state
            .collections
            .get(collection)
            .map(|documents| {
                documents
                    .iter()
                    .map(|(id, fields)| Document::new(id.clone(), fields.clone()))
                    .collect()
            })
            .unwrap_or_default();
        Ok(documents)
    }

    async fn write_one(&self, collection: &str, fields: Fields) -> Result<String, StoreError> {
        validate_collection(collection)?;
        let id = {
            let mut state = self.lock()?;
            let documents = state.collections.entry(collection.to_string()).or_default();
            let mut id = generate_document_id();
            while documents.contains_key(&id) {
                id = generate_document_id();
            }
            documents.insert(id.clone(), fields);
            id
        };
        self.notify(collection);
        Ok(id)
    }

    async fn subscribe(
        &self,
        collection: &str,
        on_change: ChangeCallback,
    ) -> Result<Subscription, StoreError> {
        validate_collection(collection)?;
        let listener_id = Uuid::new_v4();
        {
            let mut state = self.lock()?;
            state
                .listeners
                .entry(collection.to_string())
                .or_default()
                .insert(listener_id, on_change.clone());
        }
        tracing::debug!(collection, %listener_id, "listener registered");

        // Initial snapshot.
        on_change();

        let state = Arc::downgrade(&self.state);
        let collection = collection.to_string();
        Ok(Subscription::new(move || {
            let Some(state) = state.upgrade() else {
                return;
            };
            if let Ok(mut state) = state.lock() {
                if let Some(listeners) = state.listeners.get_mut(&collection) {
                    listeners.remove(&listener_id);
                    if listeners.is_empty() {
                        state.listeners.remove(&collection);
                    }
                }
            };
            tracing::debug!(collection = %collection, %listener_id, "listener removed");
        }))
    }

    async fn read_one(&self, collection: &str, id: &str) -> Result<Option<Fields>, StoreError> {
        validate_collection(collection)?;
        validate_document_id(id)?;
        let state = self.lock()?;
        Ok(state
            .collections
            .get(collection)
            .and_then(|documents| documents.get(id))
            .cloned())
    }

    async fn delete_one(&self, collection: &str, id: &str) -> Result<(), StoreError> {
        validate_collection(collection)?;
        validate_document_id(id)?;
        let removed = {
            let mut state = self.lock()?;
            state
                .collections
                .get_mut(collection)
                .and_then(|documents| documents.remove(id))
                .is_some()
        };
        if removed {
            self.notify(collection);
        }
        Ok(())
    }
}
