//! HTTP access to the package registry.
//!
//! [`RegistryApi`] is the only seam through which discovery touches the
//! network. [`HttpRegistry`] is the production implementation; tests swap
//! in in-memory fakes.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::{RegistryError, Result};
use crate::types::{ChangesResponse, Cursor, PackageDocument, VersionManifest};

pub const DEFAULT_REGISTRY_URL: &str = "https://registry.npmjs.org";
pub const DEFAULT_FEED_URL: &str = "https://replicate.npmjs.com/registry/_changes";
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Operations discovery needs from the registry.
///
/// `Send + Sync` so one client can be shared across every worker of a run.
#[async_trait]
pub trait RegistryApi: Send + Sync {
    /// Fetch up to `limit` change entries, newest first, resuming at `since`.
    async fn changes(&self, limit: usize, since: Option<&Cursor>) -> Result<ChangesResponse>;

    /// Fetch the full document for a package.
    async fn document(&self, name: &str) -> Result<PackageDocument>;

    /// Fetch the manifest of one published version.
    async fn version_manifest(&self, name: &str, version: &str) -> Result<VersionManifest>;

    /// Download a distribution archive.
    async fn fetch_archive(&self, url: &str) -> Result<Vec<u8>>;
}

/// Endpoints and client settings for [`HttpRegistry`]
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    pub registry_url: String,
    pub feed_url: String,
    pub user_agent: String,
    pub request_timeout: Duration,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            registry_url: DEFAULT_REGISTRY_URL.to_string(),
            feed_url: DEFAULT_FEED_URL.to_string(),
            user_agent: concat!("pkg-radar/", env!("CARGO_PKG_VERSION")).to_string(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

/// `reqwest`-backed registry client
#[derive(Clone)]
pub struct HttpRegistry {
    client: Client,
    registry_url: String,
    feed_url: String,
}

impl HttpRegistry {
    /// Build a client from the given configuration.
    pub fn new(config: RegistryConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(config.user_agent)
            .timeout(config.request_timeout)
            .build()
            .map_err(|source| RegistryError::Transport {
                url: config.registry_url.clone(),
                source,
            })?;

        Ok(Self {
            client,
            registry_url: config.registry_url.trim_end_matches('/').to_string(),
            feed_url: config.feed_url,
        })
    }

    fn document_url(&self, name: &str) -> String {
        format!("{}/{}", self.registry_url, encode_package_name(name))
    }

    async fn get(&self, url: &str, query: &[(&str, String)]) -> Result<reqwest::Response> {
        debug!("GET {} {:?}", url, query);
        let response = self
            .client
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(|source| RegistryError::Transport {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(RegistryError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(response)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str, query: &[(&str, String)]) -> Result<T> {
        let body = self
            .get(url, query)
            .await?
            .bytes()
            .await
            .map_err(|source| RegistryError::Transport {
                url: url.to_string(),
                source,
            })?;

        serde_json::from_slice(&body).map_err(|source| RegistryError::Decode {
            url: url.to_string(),
            source,
        })
    }
}

#[async_trait]
impl RegistryApi for HttpRegistry {
    async fn changes(&self, limit: usize, since: Option<&Cursor>) -> Result<ChangesResponse> {
        let mut query = vec![
            ("descending", "true".to_string()),
            ("limit", limit.to_string()),
        ];
        if let Some(cursor) = since {
            query.push(("since", cursor.to_string()));
        }
        self.get_json(&self.feed_url, &query).await
    }

    async fn document(&self, name: &str) -> Result<PackageDocument> {
        self.get_json(&self.document_url(name), &[]).await
    }

    async fn version_manifest(&self, name: &str, version: &str) -> Result<VersionManifest> {
        let url = format!("{}/{}", self.document_url(name), version);
        self.get_json(&url, &[]).await
    }

    async fn fetch_archive(&self, url: &str) -> Result<Vec<u8>> {
        let bytes = self
            .get(url, &[])
            .await?
            .bytes()
            .await
            .map_err(|source| RegistryError::Transport {
                url: url.to_string(),
                source,
            })?;
        Ok(bytes.to_vec())
    }
}

/// Scoped names (`@scope/pkg`) travel as a single path segment.
pub fn encode_package_name(name: &str) -> String {
    name.replace('/', "%2F")
}
