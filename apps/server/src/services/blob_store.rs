// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Disk-backed blob store using cacache.
//!
//! Uploaded images and job artifacts are kept under separate key
//! namespaces. Each blob's content type is stored next to it.

use crate::error::ApiError;
use sha2::{Digest, Sha256};
use std::path::PathBuf;

const IMAGE_PREFIX: &str = "images/";
const RESULT_PREFIX: &str = "results/";
const CONTENT_TYPE_SUFFIX: &str = "#content-type";
const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// A stored blob with its content type.
#[derive(Debug, Clone)]
pub struct Blob {
    pub data: Vec<u8>,
    pub content_type: String,
}

impl Blob {
    /// SHA256 of the contents, hex encoded.
    pub fn digest(&self) -> String {
        digest(&self.data)
    }
}

/// Content-addressed blob store.
#[derive(Debug, Clone)]
pub struct BlobStore {
    dir: PathBuf,
}

impl BlobStore {
    /// Create a new store in the specified directory.
    pub async fn new(dir: &str) -> Self {
        let path = PathBuf::from(dir);

        if let Err(e) = tokio::fs::create_dir_all(&path).await {
            tracing::warn!(
                error = %e,
                path = %path.display(),
                "Failed to create blob directory"
            );
        }

        Self { dir: path }
    }

    pub fn dir(&self) -> &std::path::Path {
        &self.dir
    }

    pub fn image_key(image_name: &str) -> String {
        format!("{}{}", IMAGE_PREFIX, image_name)
    }

    pub fn result_key(blob_name: &str) -> String {
        format!("{}{}", RESULT_PREFIX, blob_name)
    }

    /// Store `data` under `key`, replacing any previous blob.
    pub async fn put(&self, key: &str, data: &[u8], content_type: &str) -> Result<(), ApiError> {
        cacache::write(&self.dir, key, data).await?;
        cacache::write(&self.dir, content_type_key(key), content_type.as_bytes()).await?;
        tracing::debug!(key = %key, size = data.len(), content_type = %content_type, "Stored blob");
        Ok(())
    }

    /// Blob stored under `key`, if any.
    pub async fn get(&self, key: &str) -> Result<Option<Blob>, ApiError> {
        let Some(data) = self.read(key).await? else {
            return Ok(None);
        };
        let content_type = self
            .read(&content_type_key(key))
            .await?
            .and_then(|raw| String::from_utf8(raw).ok())
            .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string());

        Ok(Some(Blob { data, content_type }))
    }

    /// Check if a key exists in the store.
    pub async fn has(&self, key: &str) -> bool {
        cacache::metadata(&self.dir, key)
            .await
            .map(|entry| entry.is_some())
            .unwrap_or(false)
    }

    async fn read(&self, key: &str) -> Result<Option<Vec<u8>>, ApiError> {
        match cacache::read(&self.dir, key).await {
            Ok(data) => Ok(Some(data)),
            Err(cacache::Error::EntryNotFound(_, _)) => Ok(None),
            Err(e) => Err(ApiError::Blob(e.to_string())),
        }
    }
}

fn content_type_key(key: &str) -> String {
    format!("{}{}", key, CONTENT_TYPE_SUFFIX)
}

/// SHA256 of `data`, hex encoded.
pub fn digest(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_dir() -> String {
        std::env::temp_dir()
            .join(format!("floorplan-blobs-{}", uuid::Uuid::new_v4()))
            .to_string_lossy()
            .into_owned()
    }

    #[tokio::test]
    async fn test_put_then_get() {
        let store = BlobStore::new(&temp_dir()).await;
        let key = BlobStore::result_key("job.svg");
        store.put(&key, b"<svg/>", "image/svg+xml").await.unwrap();

        let blob = store.get(&key).await.unwrap().unwrap();
        assert_eq!(blob.data, b"<svg/>");
        assert_eq!(blob.content_type, "image/svg+xml");
        assert!(store.has(&key).await);
    }

    #[tokio::test]
    async fn test_missing_blob() {
        let store = BlobStore::new(&temp_dir()).await;
        assert!(store.get(&BlobStore::image_key("absent")).await.unwrap().is_none());
        assert!(!store.has(&BlobStore::image_key("absent")).await);
    }

    #[tokio::test]
    async fn test_namespaces_are_separate() {
        let store = BlobStore::new(&temp_dir()).await;
        store.put(&BlobStore::image_key("plan"), b"image", "image/png").await.unwrap();
        assert!(store.get(&BlobStore::result_key("plan")).await.unwrap().is_none());
    }

    #[test]
    fn test_digest_is_stable() {
        assert_eq!(
            digest(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }
}
