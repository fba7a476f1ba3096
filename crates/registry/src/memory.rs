//! In-memory registry for tests.
//!
//! Feed pages are scripted per `since` cursor, documents are stored as raw
//! JSON and decoded on every request (so malformed documents can be
//! simulated), and version manifests are read out of the stored document's
//! `versions` map. Anything not scripted answers with HTTP 404.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::client::RegistryApi;
use crate::error::{RegistryError, Result};
use crate::types::{ChangeEntry, ChangesResponse, Cursor, PackageDocument, VersionManifest};

#[derive(Debug, Clone)]
enum FeedPage {
    Ok { ids: Vec<String>, last_seq: Option<String> },
    Fail(u16),
}

/// Scriptable [`RegistryApi`] backed by hash maps
#[derive(Debug, Default)]
pub struct MemoryRegistry {
    pages: HashMap<Option<String>, FeedPage>,
    documents: HashMap<String, Value>,
    archives: HashMap<String, Vec<u8>>,
    max_latency_ms: u64,
    feed_calls: AtomicUsize,
    document_calls: AtomicUsize,
    archive_calls: AtomicUsize,
}

impl MemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script the feed page returned for `since` (`None` is the first page).
    pub fn with_page(mut self, since: Option<&str>, ids: &[&str], last_seq: Option<&str>) -> Self {
        self.pages.insert(
            since.map(str::to_string),
            FeedPage::Ok {
                ids: ids.iter().map(|id| id.to_string()).collect(),
                last_seq: last_seq.map(str::to_string),
            },
        );
        self
    }

    /// Make the feed request for `since` fail with the given status.
    pub fn with_feed_failure(mut self, since: Option<&str>, status: u16) -> Self {
        self.pages.insert(since.map(str::to_string), FeedPage::Fail(status));
        self
    }

    pub fn with_document(mut self, name: &str, document: Value) -> Self {
        self.documents.insert(name.to_string(), document);
        self
    }

    pub fn with_archive(mut self, url: &str, bytes: Vec<u8>) -> Self {
        self.archives.insert(url.to_string(), bytes);
        self
    }

    /// Delay each document request by up to `max_ms`, derived from the name,
    /// so concurrent workers finish out of order.
    pub fn with_jitter(mut self, max_ms: u64) -> Self {
        self.max_latency_ms = max_ms;
        self
    }

    pub fn feed_calls(&self) -> usize {
        self.feed_calls.load(Ordering::SeqCst)
    }

    pub fn document_calls(&self) -> usize {
        self.document_calls.load(Ordering::SeqCst)
    }

    pub fn archive_calls(&self) -> usize {
        self.archive_calls.load(Ordering::SeqCst)
    }

    async fn jitter(&self, key: &str) {
        if self.max_latency_ms == 0 {
            return;
        }
        let spread = key.bytes().map(u64::from).sum::<u64>() % (self.max_latency_ms + 1);
        tokio::time::sleep(Duration::from_millis(spread)).await;
    }

    fn not_found(url: String) -> RegistryError {
        RegistryError::Status { url, status: 404 }
    }

    fn decode<T: serde::de::DeserializeOwned>(url: String, value: &Value) -> Result<T> {
        serde_json::from_value(value.clone()).map_err(|source| RegistryError::Decode { url, source })
    }
}

#[async_trait]
impl RegistryApi for MemoryRegistry {
    async fn changes(&self, _limit: usize, since: Option<&Cursor>) -> Result<ChangesResponse> {
        self.feed_calls.fetch_add(1, Ordering::SeqCst);
        let key = since.map(|c| c.as_str().to_string());
        let url = format!("memory://_changes?since={}", key.as_deref().unwrap_or(""));

        match self.pages.get(&key) {
            Some(FeedPage::Ok { ids, last_seq }) => Ok(ChangesResponse {
                results: ids.iter().map(|id| ChangeEntry { id: id.clone() }).collect(),
                last_seq: last_seq.as_deref().map(Cursor::new),
            }),
            Some(FeedPage::Fail(status)) => Err(RegistryError::Status { url, status: *status }),
            None => Ok(ChangesResponse::default()),
        }
    }

    async fn document(&self, name: &str) -> Result<PackageDocument> {
        self.document_calls.fetch_add(1, Ordering::SeqCst);
        self.jitter(name).await;
        let url = format!("memory://{name}");
        match self.documents.get(name) {
            Some(raw) => Self::decode(url, raw),
            None => Err(Self::not_found(url)),
        }
    }

    async fn version_manifest(&self, name: &str, version: &str) -> Result<VersionManifest> {
        let url = format!("memory://{name}/{version}");
        match self.documents.get(name).and_then(|doc| doc["versions"].get(version)) {
            Some(raw) => Self::decode(url, raw),
            None => Err(Self::not_found(url)),
        }
    }

    async fn fetch_archive(&self, url: &str) -> Result<Vec<u8>> {
        self.archive_calls.fetch_add(1, Ordering::SeqCst);
        self.archives
            .get(url)
            .cloned()
            .ok_or_else(|| Self::not_found(url.to_string()))
    }
}
