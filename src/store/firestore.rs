mod value;

use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Duration,
};

use async_trait::async_trait;
use reqwest::{Method, Response, StatusCode};
use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tokio::{sync::Notify, time::MissedTickBehavior};
use tracing::Instrument;
use url::Url;

use crate::{
    configuration::FirestoreSettings,
    document::{Document, Fields},
    error::StoreError,
};

use super::{
    validate_collection, validate_document_id, ChangeCallback, DocumentStore, Subscription,
};

use value::{decode_fields, encode_fields};

/// Client for the Firestore REST API.
///
/// The REST surface offers no streaming listener, so subscriptions poll the
/// collection and fire whenever its fingerprint changes.
#[derive(Clone)]
pub struct FirestoreStore {
    client: reqwest::Client,
    base_url: Url,
    project_id: String,
    database: String,
    api_key: Secret<String>,
    poll_interval: Duration,
    page_size: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawDocument {
    name: String,
    #[serde(default)]
    fields: Map<String, Value>,
    update_time: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListResponse {
    #[serde(default)]
    documents: Vec<RawDocument>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

/// Identity of a collection snapshot: every document name with the time it
/// was last written.
type Fingerprint = Vec<(String, Option<String>)>;

impl FirestoreStore {
    pub fn new(settings: &FirestoreSettings) -> Result<Self, StoreError> {
        if settings.project_id.is_empty() {
            return Err(StoreError::Configuration(
                "firestore project_id is not configured".to_string(),
            ));
        }
        let base_url = Url::parse(&settings.base_url)
            .map_err(|e| StoreError::Configuration(format!("invalid base_url: {}", e)))?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url,
            project_id: settings.project_id.clone(),
            database: settings.database.clone(),
            api_key: settings.api_key.clone(),
            poll_interval: Duration::from_millis(settings.poll_interval_ms.max(1)),
            page_size: settings.page_size,
        })
    }

    fn documents_url(&self, path: &[&str]) -> Result<Url, StoreError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| StoreError::Configuration(format!("{} cannot be a base", self.base_url)))?
            .pop_if_empty()
            .extend([
                "v1",
                "projects",
                self.project_id.as_str(),
                "databases",
                self.database.as_str(),
                "documents",
            ])
            .extend(path);
        if !self.api_key.expose_secret().is_empty() {
            url.query_pairs_mut()
                .append_pair("key", self.api_key.expose_secret());
        }
        Ok(url)
    }

    async fn send(
        &self,
        method: Method,
        url: Url,
        body: Option<Value>,
    ) -> Result<Response, StoreError> {
        tracing::debug!(%method, path = url.path(), "sending request");
        let mut request = self.client.request(method, url);
        if let Some(body) = body {
            request = request.json(&body);
        }
        Ok(request.send().await?)
    }

    async fn list_page(
        &self,
        collection: &[&str],
        page_token: Option<&str>,
    ) -> Result<ListResponse, StoreError> {
        let mut url = self.documents_url(collection)?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("pageSize", &self.page_size.to_string());
            if let Some(token) = page_token {
                query.append_pair("pageToken", token);
            }
        }
        let response = check(self.send(Method::GET, url, None).await?).await?;
        response
            .json::<ListResponse>()
            .await
            .map_err(|e| StoreError::Decode(e.to_string()))
    }

    async fn list_raw(&self, collection: &str) -> Result<Vec<RawDocument>, StoreError> {
        let segments = validate_collection(collection)?;
        let mut documents = Vec::new();
        let mut page_token: Option<String> = None;
        loop {
            let page = self.list_page(&segments, page_token.as_deref()).await?;
            documents.extend(page.documents);
            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }
        Ok(documents)
    }

    async fn fingerprint(&self, collection: &str) -> Result<Fingerprint, StoreError> {
        let mut fingerprint: Fingerprint = self
            .list_raw(collection)
            .await?
            .into_iter()
            .map(|document| (document.name, document.update_time))
            .collect();
        fingerprint.sort();
        Ok(fingerprint)
    }
}

#[async_trait]
impl DocumentStore for FirestoreStore {
    async fn read_all(&self, collection: &str) -> Result<Vec<Document>, StoreError> {
        let mut documents = self
            .list_raw(collection)
            .await?
            .into_iter()
            .map(into_document)
            .collect::<Result<Vec<_>, _>>()?;
        documents.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(documents)
    }

    async fn write_one(&self, collection: &str, fields: Fields) -> Result<String, StoreError> {
        let segments = validate_collection(collection)?;
        let url = self.documents_url(&segments)?;
        let body = json!({ "fields": encode_fields(&fields) });
        let response = check(self.send(Method::POST, url, Some(body)).await?).await?;
        let created = response
            .json::<RawDocument>()
            .await
            .map_err(|e| StoreError::Decode(e.to_string()))?;
        let id = document_id(&created.name)?;
        tracing::debug!(collection, %id, "document created");
        Ok(id)
    }

    async fn subscribe(
        &self,
        collection: &str,
        on_change: ChangeCallback,
    ) -> Result<Subscription, StoreError> {
        // The initial fetch doubles as the permission check.
        let mut last = self.fingerprint(collection).await?;
        on_change();

        let stop = Arc::new(Notify::new());
        let stopped = Arc::new(AtomicBool::new(false));
        let store = self.clone();
        let collection = collection.to_string();
        let span = tracing::info_span!("collection listener", collection = %collection);

        let task_stop = stop.clone();
        let task_stopped = stopped.clone();
        tokio::spawn(
            async move {
                tracing::info!("starting listener");
                let mut ticker = tokio::time::interval(store.poll_interval);
                ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
                // First tick completes immediately; the initial snapshot is already delivered.
                ticker.tick().await;
                loop {
                    tokio::select! {
                        _ = task_stop.notified() => break,
                        _ = ticker.tick() => {
                            match store.fingerprint(&collection).await {
                                Ok(next) if next != last => {
                                    last = next;
                                    if !task_stopped.load(Ordering::SeqCst) {
                                        on_change();
                                    }
                                }
                                Ok(_) => {}
                                Err(error) => tracing::warn!(?error, "polling collection failed"),
                            }
                        }
                    }
                }
                tracing::info!("stopping listener");
            }
            .instrument(span),
        );

        Ok(Subscription::new(move || {
            stopped.store(true, Ordering::SeqCst);
            stop.notify_one();
        }))
    }

    async fn read_one(&self, collection: &str, id: &str) -> Result<Option<Fields>, StoreError> {
        let mut segments = validate_collection(collection)?;
        validate_document_id(id)?;
        segments.push(id);
        let url = self.documents_url(&segments)?;
        let response = self.send(Method::GET, url, None).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let document = check(response)
            .await?
            .json::<RawDocument>()
            .await
            .map_err(|e| StoreError::Decode(e.to_string()))?;
        Ok(Some(decode_fields(&document.fields)?))
    }

    async fn delete_one(&self, collection: &str, id: &str) -> Result<(), StoreError> {
        let mut segments = validate_collection(collection)?;
        validate_document_id(id)?;
        segments.push(id);
        let url = self.documents_url(&segments)?;
        check(self.send(Method::DELETE, url, None).await?).await?;
        tracing::debug!(collection, id, "document deleted");
        Ok(())
    }
}

async fn check(response: Response) -> Result<Response, StoreError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = match response.json::<ErrorEnvelope>().await {
        Ok(envelope) => envelope.error.message,
        Err(_) => status.canonical_reason().unwrap_or("unknown error").to_string(),
    };
    Err(StoreError::Service {
        status: status.as_u16(),
        message,
    })
}

fn into_document(raw: RawDocument) -> Result<Document, StoreError> {
    Ok(Document::new(document_id(&raw.name)?, decode_fields(&raw.fields)?))
}

/// Document names are full resource paths; the id is the last segment.
fn document_id(name: &str) -> Result<String, StoreError> {
    name.rsplit('/')
        .next()
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .ok_or_else(|| StoreError::Decode(format!("document name `{}` has no id", name)))
}
