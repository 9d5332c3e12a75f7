//! Blob store abstraction over the object storage holding snapshots.
//!
//! The repository only needs two calls: list object names under a prefix and
//! fetch one object's bytes. `GcsBlobStore` implements them against the
//! public Google Cloud Storage JSON API; `MemoryBlobStore` serves fixed
//! objects for offline runs and tests.

use std::collections::{BTreeMap, HashSet};
use std::sync::RwLock;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use stockchat_common::StorageConfig;

use super::SnapshotError;

/// Read-only access to a bucket of snapshot objects.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store name for logging.
    fn name(&self) -> &str;

    /// Names of all objects whose name starts with `prefix`.
    async fn list_objects(&self, prefix: &str) -> Result<Vec<String>, SnapshotError>;

    /// Raw bytes of one object.
    async fn fetch_object(&self, name: &str) -> Result<Vec<u8>, SnapshotError>;
}

// ============================================================================
// Google Cloud Storage
// ============================================================================

/// Anonymous reader for a public GCS bucket.
pub struct GcsBlobStore {
    client: reqwest::Client,
    api_base: String,
    bucket: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListObjectsResponse {
    #[serde(default)]
    items: Vec<ObjectItem>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ObjectItem {
    name: String,
}

impl GcsBlobStore {
    pub fn new(config: &StorageConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.fetch_timeout_secs))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            bucket: config.bucket.clone(),
        }
    }

    fn list_url(&self) -> String {
        format!("{}/storage/v1/b/{}/o", self.api_base, self.bucket)
    }

    fn object_url(&self, name: &str) -> String {
        format!("{}/{}/{}", self.api_base, self.bucket, name)
    }

    async fn list_page(
        &self,
        prefix: &str,
        page_token: Option<&str>,
    ) -> Result<ListObjectsResponse, SnapshotError> {
        let mut request = self.client.get(self.list_url()).query(&[("prefix", prefix)]);
        if let Some(token) = page_token {
            request = request.query(&[("pageToken", token)]);
        }

        let response = request
            .send()
            .await
            .map_err(|e| SnapshotError::Listing(format!("request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(SnapshotError::Listing(format!(
                "HTTP {}",
                response.status()
            )));
        }

        response
            .json()
            .await
            .map_err(|e| SnapshotError::Listing(format!("invalid listing body: {}", e)))
    }
}

#[async_trait]
impl BlobStore for GcsBlobStore {
    fn name(&self) -> &str {
        "gcs"
    }

    async fn list_objects(&self, prefix: &str) -> Result<Vec<String>, SnapshotError> {
        let mut names = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let page = self.list_page(prefix, page_token.as_deref()).await?;
            names.extend(page.items.into_iter().map(|item| item.name));

            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }

        debug!(bucket = %self.bucket, count = names.len(), "Listed snapshot objects");
        Ok(names)
    }

    async fn fetch_object(&self, name: &str) -> Result<Vec<u8>, SnapshotError> {
        let response = self
            .client
            .get(self.object_url(name))
            .send()
            .await
            .map_err(|e| SnapshotError::Fetch {
                key: name.to_string(),
                status: None,
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(SnapshotError::Fetch {
                key: name.to_string(),
                status: Some(status.as_u16()),
                message: format!("HTTP {}", status),
            });
        }

        let bytes = response.bytes().await.map_err(|e| SnapshotError::Fetch {
            key: name.to_string(),
            status: Some(status.as_u16()),
            message: format!("failed to read body: {}", e),
        })?;

        Ok(bytes.to_vec())
    }
}

// ============================================================================
// In-memory store
// ============================================================================

/// Fixed set of objects held in memory.
#[derive(Default)]
pub struct MemoryBlobStore {
    objects: RwLock<BTreeMap<String, Vec<u8>>>,
    unavailable: RwLock<HashSet<String>>,
    listing_down: RwLock<bool>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace an object.
    pub fn put(&self, name: impl Into<String>, body: impl Into<Vec<u8>>) {
        if let Ok(mut objects) = self.objects.write() {
            objects.insert(name.into(), body.into());
        }
    }

    /// Keep `name` listed but make fetching it fail.
    pub fn make_unavailable(&self, name: impl Into<String>) {
        if let Ok(mut unavailable) = self.unavailable.write() {
            unavailable.insert(name.into());
        }
    }

    /// Make every listing call fail.
    pub fn fail_listing(&self) {
        if let Ok(mut down) = self.listing_down.write() {
            *down = true;
        }
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn list_objects(&self, prefix: &str) -> Result<Vec<String>, SnapshotError> {
        if self.listing_down.read().map(|d| *d).unwrap_or(false) {
            return Err(SnapshotError::Listing("listing unavailable".into()));
        }

        let objects = self
            .objects
            .read()
            .map_err(|_| SnapshotError::Listing("store lock poisoned".into()))?;

        Ok(objects
            .keys()
            .filter(|name| name.starts_with(prefix))
            .cloned()
            .collect())
    }

    async fn fetch_object(&self, name: &str) -> Result<Vec<u8>, SnapshotError> {
        let unavailable = self
            .unavailable
            .read()
            .map(|u| u.contains(name))
            .unwrap_or(false);

        if unavailable {
            return Err(SnapshotError::Fetch {
                key: name.to_string(),
                status: Some(503),
                message: "HTTP 503 Service Unavailable".into(),
            });
        }

        self.objects
            .read()
            .ok()
            .and_then(|objects| objects.get(name).cloned())
            .ok_or_else(|| SnapshotError::Fetch {
                key: name.to_string(),
                status: Some(404),
                message: "HTTP 404 Not Found".into(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_store_lists_by_prefix() {
        let store = MemoryBlobStore::new();
        store.put("snap_a.json", "[]");
        store.put("snap_b.json", "[]");
        store.put("other.json", "[]");

        let names = store.list_objects("snap_").await.unwrap();
        assert_eq!(names, vec!["snap_a.json", "snap_b.json"]);
    }

    #[tokio::test]
    async fn test_memory_store_unavailable_object() {
        let store = MemoryBlobStore::new();
        store.put("snap_a.json", "[]");
        store.make_unavailable("snap_a.json");

        assert_eq!(store.list_objects("snap_").await.unwrap().len(), 1);
        assert!(matches!(
            store.fetch_object("snap_a.json").await,
            Err(SnapshotError::Fetch { status: Some(503), .. })
        ));
    }

    #[tokio::test]
    async fn test_memory_store_missing_object() {
        let store = MemoryBlobStore::new();
        assert!(store.fetch_object("nope.json").await.is_err());
    }

    #[tokio::test]
    async fn test_memory_store_listing_failure() {
        let store = MemoryBlobStore::new();
        store.fail_listing();
        assert!(store.list_objects("").await.is_err());
    }

    #[test]
    fn test_gcs_urls() {
        let config = StorageConfig {
            api_base: "https://storage.example.com/".into(),
            ..StorageConfig::default()
        };
        let store = GcsBlobStore::new(&config);
        assert_eq!(
            store.list_url(),
            "https://storage.example.com/storage/v1/b/aistocks_data/o"
        );
        assert_eq!(
            store.object_url("a.json"),
            "https://storage.example.com/aistocks_data/a.json"
        );
    }
}
