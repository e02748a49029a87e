//! Blob storage boundary: uploaded recordings, essays, passages and audio
//! live in named buckets behind this seam.

use std::collections::HashMap;

use serde::Serialize;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::info;

use crate::error::PortalError;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("upload rejected: {0}")]
    Rejected(String),
    #[error(transparent)]
    Transport(#[from] reqwest::Error),
}

impl From<StorageError> for PortalError {
    fn from(err: StorageError) -> Self {
        PortalError::UploadFailure(err.to_string())
    }
}

/// Where an uploaded object ended up.
#[derive(Debug, Clone, Serialize)]
pub struct StoredObject {
    pub bucket: String,
    pub key: String,
    /// Address clients can fetch the object from.
    pub url: String,
}

/// Object upload boundary.
#[async_trait::async_trait]
pub trait BlobStore: Send + Sync {
    async fn upload(
        &self,
        bucket: &str,
        key: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<StoredObject, StorageError>;
}

/// Blob store backed by a hosted storage HTTP API.
///
/// Objects are POSTed to `{base}/object/{bucket}/{key}` with a bearer key
/// and served publicly from `{base}/object/public/{bucket}/{key}`.
pub struct HostedBucket {
    client: reqwest::Client,
    base_url: String,
    service_key: String,
}

impl HostedBucket {
    pub fn new(base_url: impl Into<String>, service_key: impl Into<String>) -> Result<Self, StorageError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            service_key: service_key.into(),
        })
    }
}

#[async_trait::async_trait]
impl BlobStore for HostedBucket {
    async fn upload(
        &self,
        bucket: &str,
        key: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<StoredObject, StorageError> {
        let url = format!("{}/object/{}/{}", self.base_url, bucket, key);
        let size = bytes.len();

        let res = self
            .client
            .post(&url)
            .header(reqwest::header::AUTHORIZATION, format!("Bearer {}", self.service_key))
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(bytes)
            .send()
            .await?;

        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            let snippet: String = body.chars().take(200).collect();
            return Err(StorageError::Rejected(format!("HTTP {}: {}", status, snippet)));
        }

        info!("Uploaded {} bytes to {}/{}", size, bucket, key);

        Ok(StoredObject {
            bucket: bucket.to_string(),
            key: key.to_string(),
            url: format!("{}/object/public/{}/{}", self.base_url, bucket, key),
        })
    }
}

/// In-memory blob store for local runs and tests.
#[derive(Default)]
pub struct MemoryBucket {
    objects: RwLock<HashMap<(String, String), Vec<u8>>>,
}

impl MemoryBucket {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn object(&self, bucket: &str, key: &str) -> Option<Vec<u8>> {
        self.objects
            .read()
            .await
            .get(&(bucket.to_string(), key.to_string()))
            .cloned()
    }

    pub async fn object_count(&self) -> usize {
        self.objects.read().await.len()
    }

    pub async fn keys(&self, bucket: &str) -> Vec<String> {
        self.objects
            .read()
            .await
            .keys()
            .filter(|(b, _)| b == bucket)
            .map(|(_, k)| k.clone())
            .collect()
    }
}

#[async_trait::async_trait]
impl BlobStore for MemoryBucket {
    async fn upload(
        &self,
        bucket: &str,
        key: &str,
        bytes: Vec<u8>,
        _content_type: &str,
    ) -> Result<StoredObject, StorageError> {
        self.objects
            .write()
            .await
            .insert((bucket.to_string(), key.to_string()), bytes);

        Ok(StoredObject {
            bucket: bucket.to_string(),
            key: key.to_string(),
            url: format!("memory://{}/{}", bucket, key),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_bucket_round_trip() {
        let store = MemoryBucket::new();

        let stored = store
            .upload("essays", "essay-1.txt", b"some text".to_vec(), "text/plain")
            .await
            .unwrap();

        assert_eq!(stored.url, "memory://essays/essay-1.txt");
        assert_eq!(store.object_count().await, 1);
        assert_eq!(
            store.object("essays", "essay-1.txt").await,
            Some(b"some text".to_vec())
        );
        assert_eq!(store.object("essays", "missing").await, None);
    }

    #[tokio::test]
    async fn test_keys_filter_by_bucket() {
        let store = MemoryBucket::new();
        store
            .upload("audio", "a.wav", vec![1], "audio/wav")
            .await
            .unwrap();
        store
            .upload("audio", "b.wav", vec![2], "audio/wav")
            .await
            .unwrap();
        store
            .upload("essays", "c.txt", vec![3], "text/plain")
            .await
            .unwrap();

        let mut keys = store.keys("audio").await;
        keys.sort();
        assert_eq!(keys, vec!["a.wav", "b.wav"]);
        assert!(store.keys("reading").await.is_empty());
    }
}
