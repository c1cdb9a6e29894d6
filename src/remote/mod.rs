//! Remote publishing platform abstraction.
//!
//! The pipeline only ever talks to a [`Platform`] — a fixed capability set
//! (media upload/verify, post create/update/get/delete) behind a trait
//! object, so a second backend can be slotted in without touching the
//! transform or reconciliation logic. The one real implementation is
//! [`wordpress::WordPressClient`]; tests substitute an in-memory mock.

pub mod wordpress;

use crate::error::Error;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A media item as known to the remote platform.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MediaItem {
    pub id: u64,
    /// Public URL the platform serves the file from.
    pub source_url: String,
}

/// Fields sent when creating or updating a post.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PostInput {
    pub title: String,
    pub content: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub excerpt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
}

/// A post as returned by the remote platform.
#[derive(Debug, Clone, Deserialize)]
pub struct PostRecord {
    pub id: u64,
    /// Canonical public URL.
    pub link: String,
    /// Last-modified timestamp assigned by the platform.
    pub modified: String,
    pub status: String,
    #[serde(default)]
    pub slug: String,
}

/// The fixed operation set a publishing backend must provide.
///
/// Every operation maps to one remote call; retries and timeouts are the
/// implementation's concern. Any non-success response surfaces as an
/// [`Error`] carrying the remote's own status description.
#[async_trait]
pub trait Platform: Send + Sync {
    /// Upload a local file as a media item, with optional alt text.
    async fn upload_media(&self, path: &Path, alt: Option<&str>) -> Result<MediaItem, Error>;

    /// Whether a previously uploaded media item still exists remotely.
    async fn verify_media(&self, id: u64) -> Result<bool, Error>;

    async fn create_post(&self, post: &PostInput) -> Result<PostRecord, Error>;

    async fn update_post(&self, id: u64, post: &PostInput) -> Result<PostRecord, Error>;

    async fn get_post(&self, id: u64) -> Result<PostRecord, Error>;

    async fn delete_post(&self, id: u64) -> Result<(), Error>;
}
