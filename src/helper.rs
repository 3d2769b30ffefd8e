//! Convenience operations over named collections.
//!
//! Every operation is one round trip to the underlying [`DocumentStore`].
//! Failures never reach the caller: they are logged and replaced with a
//! benign default (an empty list, `None`, or nothing). Callers that need to
//! tell "empty" from "failed" should use the store directly.

use std::sync::Arc;

use crate::{
    configuration::Settings,
    document::Fields,
    error::StoreError,
    store::{self, DocumentStore, Subscription},
};

#[derive(Clone)]
pub struct CollectionHelper {
    store: Arc<dyn DocumentStore>,
}

impl CollectionHelper {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    pub fn open(settings: &Settings) -> Result<Self, StoreError> {
        Ok(Self::new(store::open(settings)?))
    }

    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    /// Every document of `collection` as its fields plus an `id` key.
    #[tracing::instrument(name = "read collection", skip(self))]
    pub async fn read_collection(&self, collection: &str) -> Vec<Fields> {
        match self.store.read_all(collection).await {
            Ok(documents) => documents
                .into_iter()
                .map(|document| document.into_record())
                .collect(),
            Err(error) => {
                tracing::error!(?error, "error reading data from document store");
                Vec::new()
            }
        }
    }

    #[tracing::instrument(name = "write document", skip(self, fields))]
    pub async fn write_document(&self, collection: &str, fields: Fields) {
        if let Err(error) = self.store.write_one(collection, fields).await {
            tracing::error!(?error, "error writing data to document store");
        }
    }

    /// Calls `on_change` on every change to `collection` until the returned
    /// handle is unsubscribed. When registration fails the handle is inert.
    #[tracing::instrument(name = "subscribe", skip(self, on_change))]
    pub async fn subscribe<F>(&self, collection: &str, on_change: F) -> Subscription
    where
        F: Fn() + Send + Sync + 'static,
    {
        match self.store.subscribe(collection, Arc::new(on_change)).await {
            Ok(subscription) => subscription,
            Err(error) => {
                tracing::error!(?error, "error subscribing to document store");
                Subscription::noop()
            }
        }
    }

    #[tracing::instrument(name = "fetch document", skip(self))]
    pub async fn fetch_document(&self, collection: &str, id: &str) -> Option<Fields> {
        self.store
            .read_one(collection, id)
            .await
            .unwrap_or_else(|error| {
                tracing::error!(?error, "error fetching document from document store");
                None
            })
    }

    #[tracing::instrument(name = "delete document", skip(self))]
    pub async fn delete_document(&self, collection: &str, id: &str) {
        if let Err(error) = self.store.delete_one(collection, id).await {
            tracing::error!(?error, "error removing document from document store");
        }
    }
}
