//! Content-addressed cache of previously uploaded images.
//!
//! One JSON document on disk maps a namespaced content-hash key to the
//! media record WordPress assigned on upload. The key is
//! `"sha256-" + hex(sha256(bytes))` — callers build it with [`cache_key`]
//! so the on-disk format stays forward-compatible if the hash algorithm
//! ever changes.
//!
//! The cache is advisory: a corrupt or missing file silently resets to
//! empty and must never block a publish. Saves rewrite the whole file.

use crate::error::Error;
use chrono::{SecondsFormat, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// File name inside the cache directory.
const CACHE_FILE: &str = "cache.json";

/// A previously uploaded image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CachedImage {
    pub media_id: u64,
    pub url: String,
    pub uploaded_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verified: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct CacheFile {
    images: IndexMap<String, CachedImage>,
}

/// On-disk image cache with load/save/get/set semantics.
///
/// Exactly one writer exists per run (the reconciliation loop), so all
/// mutation happens in memory and flushes via [`ImageCache::save`].
#[derive(Debug)]
pub struct ImageCache {
    path: PathBuf,
    cache: CacheFile,
}

impl ImageCache {
    /// Create a store rooted at `cache_dir` (nothing is read yet).
    pub fn new(cache_dir: &Path) -> Self {
        Self {
            path: cache_dir.join(CACHE_FILE),
            cache: CacheFile::default(),
        }
    }

    /// Load the persisted cache if present. A missing or corrupt file
    /// resets to an empty cache — this never returns an error.
    pub async fn load(&mut self) {
        self.cache = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => match serde_json::from_str(&raw) {
                Ok(cache) => cache,
                Err(e) => {
                    warn!(path = %self.path.display(), error = %e, "cache file corrupt, starting fresh");
                    CacheFile::default()
                }
            },
            Err(_) => CacheFile::default(),
        };
        debug!(entries = self.cache.images.len(), "image cache loaded");
    }

    /// Persist the in-memory state, creating the cache directory if needed.
    /// Fully overwrites the previous file.
    pub async fn save(&self) -> Result<(), Error> {
        let write_err = |source: std::io::Error| Error::CacheWriteFailed {
            path: self.path.clone(),
            source,
        };
        if let Some(dir) = self.path.parent() {
            tokio::fs::create_dir_all(dir).await.map_err(write_err)?;
        }
        // Pretty-printed so the file diffs cleanly under version control.
        let data = serde_json::to_string_pretty(&self.cache)
            .map_err(|e| write_err(std::io::Error::other(e)))?;
        tokio::fs::write(&self.path, data).await.map_err(write_err)?;
        debug!(path = %self.path.display(), entries = self.cache.images.len(), "image cache saved");
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<&CachedImage> {
        self.cache.images.get(key)
    }

    pub fn set(&mut self, key: String, image: CachedImage) {
        self.cache.images.insert(key, image);
    }

    pub fn has(&self, key: &str) -> bool {
        self.cache.images.contains_key(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<CachedImage> {
        self.cache.images.shift_remove(key)
    }

    pub fn clear(&mut self) {
        self.cache.images.clear();
    }

    pub fn len(&self) -> usize {
        self.cache.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.images.is_empty()
    }

    /// Stamp a cached entry as verified-present on the remote just now.
    pub fn update_verified(&mut self, key: &str) {
        if let Some(image) = self.cache.images.get_mut(key) {
            image.verified = Some(now_iso8601());
        }
    }
}

/// Current time as an ISO-8601 UTC string (the cache file's timestamp form).
pub fn now_iso8601() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// SHA-256 over the raw bytes of a file, as a lowercase hex digest.
pub async fn hash_file(path: &Path) -> std::io::Result<String> {
    let bytes = tokio::fs::read(path).await?;
    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    Ok(hex::encode(hasher.finalize()))
}

/// Build the namespaced cache key for a hex digest.
pub fn cache_key(hash: &str) -> String {
    format!("sha256-{hash}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: u64) -> CachedImage {
        CachedImage {
            media_id: id,
            url: format!("https://example.com/wp-content/uploads/{id}.png"),
            uploaded_at: "2024-01-15T10:30:00Z".into(),
            verified: None,
        }
    }

    #[tokio::test]
    async fn roundtrips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let mut cache = ImageCache::new(dir.path());
        cache.set(cache_key("abc123"), record(7));
        cache.save().await.unwrap();

        let mut reloaded = ImageCache::new(dir.path());
        reloaded.load().await;
        assert_eq!(reloaded.get("sha256-abc123"), Some(&record(7)));
        assert!(reloaded.has("sha256-abc123"));
        assert_eq!(reloaded.len(), 1);
    }

    #[tokio::test]
    async fn corrupt_file_resets_to_empty() {
        let dir = tempfile::tempdir().unwrap();
        tokio::fs::write(dir.path().join(CACHE_FILE), "{not json")
            .await
            .unwrap();
        let mut cache = ImageCache::new(dir.path());
        cache.load().await;
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn missing_file_is_empty_cache() {
        let dir = tempfile::tempdir().unwrap();
        let mut cache = ImageCache::new(&dir.path().join("never/created"));
        cache.load().await;
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn save_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a/b");
        let cache = ImageCache::new(&nested);
        cache.save().await.unwrap();
        assert!(nested.join(CACHE_FILE).exists());
    }

    #[tokio::test]
    async fn saved_json_uses_documented_field_names() {
        let dir = tempfile::tempdir().unwrap();
        let mut cache = ImageCache::new(dir.path());
        let mut img = record(9);
        img.verified = Some("2024-02-01T00:00:00Z".into());
        cache.set(cache_key("ff00"), img);
        cache.save().await.unwrap();

        let raw = tokio::fs::read_to_string(dir.path().join(CACHE_FILE))
            .await
            .unwrap();
        assert!(raw.contains("\"images\""));
        assert!(raw.contains("\"sha256-ff00\""));
        assert!(raw.contains("\"mediaId\": 9"));
        assert!(raw.contains("\"uploadedAt\""));
        assert!(raw.contains("\"verified\""));
    }

    #[test]
    fn remove_and_clear() {
        let mut cache = ImageCache::new(Path::new("/tmp/unused"));
        cache.set(cache_key("a"), record(1));
        cache.set(cache_key("b"), record(2));
        assert!(cache.remove("sha256-a").is_some());
        assert!(!cache.has("sha256-a"));
        cache.clear();
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn hash_file_matches_known_digest() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.bin");
        tokio::fs::write(&path, b"hello").await.unwrap();
        let hash = hash_file(&path).await.unwrap();
        // sha256("hello")
        assert_eq!(
            hash,
            "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
        );
        assert_eq!(cache_key(&hash), format!("sha256-{hash}"));
    }
}
