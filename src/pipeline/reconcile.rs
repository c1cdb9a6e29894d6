//! Reconcile extracted image references against the cache and the remote.
//!
//! Two phases, deliberately separated:
//!
//! 1. [`scan_images`] — local only. Resolve, validate, hash, and consult
//!    the cache for every reference, in extraction order, collecting
//!    per-image issues without aborting. Zero network calls.
//! 2. [`reconcile`] — publish time. Fail fast if the scan found any fatal
//!    issue (uploads never start while a required file is missing), then
//!    walk the batch sequentially: verify cache hits against the remote,
//!    upload misses and demoted hits, and persist the cache after every
//!    successful upload so a mid-batch failure leaves resumable state.
//!
//! Images are processed strictly one at a time in extraction order. That
//! keeps upload order deterministic and log output interleavable with
//! per-image progress; there is no concurrent fan-out by design.

use crate::cache::{self, CachedImage, ImageCache};
use crate::error::{Error, ImageIssue};
use crate::markdown::gutenberg::{ImageMap, MediaRef};
use crate::markdown::images::{resolve_image_path, ImageRef};
use crate::pipeline::validate::{validate_image, Validation};
use crate::remote::Platform;
use std::collections::HashSet;
use std::path::Path;
use tracing::{debug, info, warn};

/// One image reference after the local scan.
#[derive(Debug, Clone)]
pub struct ScannedImage {
    /// The reference as written in the source document.
    pub reference: ImageRef,
    pub validation: Validation,
    /// Namespaced content-hash key, when the file could be hashed.
    pub hash_key: Option<String>,
    /// Cache record found during the scan, if any.
    pub cached: Option<CachedImage>,
}

impl ScannedImage {
    pub fn has_errors(&self) -> bool {
        !self.validation.errors.is_empty()
    }

    pub fn is_cache_hit(&self) -> bool {
        self.cached.is_some()
    }
}

/// The full scan result for a document's image batch.
#[derive(Debug, Default)]
pub struct ImageReport {
    pub images: Vec<ScannedImage>,
}

impl ImageReport {
    /// All fatal per-image issues, in scan order.
    pub fn issues(&self) -> impl Iterator<Item = &ImageIssue> {
        self.images.iter().flat_map(|img| img.validation.errors.iter())
    }

    pub fn error_count(&self) -> usize {
        self.issues().count()
    }

    pub fn cache_hits(&self) -> usize {
        self.images.iter().filter(|img| img.is_cache_hit()).count()
    }

    /// Entries that would actually be uploaded: valid, not cached, and not
    /// a duplicate of content already counted. Reconciliation uploads each
    /// distinct hash once, so the estimate must count it once too.
    fn pending(&self) -> impl Iterator<Item = &ScannedImage> {
        let mut seen: HashSet<&str> = HashSet::new();
        self.images.iter().filter(move |img| {
            !img.has_errors()
                && !img.is_cache_hit()
                && match img.hash_key.as_deref() {
                    Some(key) => seen.insert(key),
                    None => true,
                }
        })
    }

    /// Distinct images that would need an upload (valid, but not cached).
    pub fn pending_uploads(&self) -> usize {
        self.pending().count()
    }

    /// Total bytes the pending uploads would transfer.
    pub fn pending_upload_bytes(&self) -> u64 {
        self.pending().filter_map(|img| img.validation.size).sum()
    }

    fn summary(&self) -> String {
        self.issues()
            .map(|issue| format!("  - {issue}"))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Convert collected issues into the batch-level error a publish needs.
    pub fn require_clean(&self) -> Result<(), Error> {
        let count = self.error_count();
        if count == 0 {
            return Ok(());
        }
        Err(Error::ImageValidation {
            count,
            summary: self.summary(),
        })
    }
}

/// Locally scan every extracted reference, in order.
///
/// Never fails and never touches the network: broken images are recorded
/// as issues on their entry and the scan moves on.
pub async fn scan_images(
    refs: &[ImageRef],
    document_path: &Path,
    base_path: Option<&Path>,
    cache: &ImageCache,
) -> ImageReport {
    let mut images = Vec::with_capacity(refs.len());
    for reference in refs {
        let absolute = resolve_image_path(&reference.path, document_path, base_path);
        let mut validation = validate_image(&absolute).await;

        let mut hash_key = None;
        let mut cached = None;
        if validation.exists {
            match cache::hash_file(&absolute).await {
                Ok(hash) => {
                    let key = cache::cache_key(&hash);
                    cached = cache.get(&key).cloned();
                    hash_key = Some(key);
                }
                Err(e) => validation.errors.push(ImageIssue::HashFailed {
                    path: absolute.clone(),
                    detail: e.to_string(),
                }),
            }
        }

        debug!(
            path = %reference.path,
            exists = validation.exists,
            cache_hit = cached.is_some(),
            "scanned image"
        );
        images.push(ScannedImage {
            reference: reference.clone(),
            validation,
            hash_key,
            cached,
        });
    }
    ImageReport { images }
}

/// Result of a completed reconciliation.
#[derive(Debug, Default)]
pub struct ReconcileOutcome {
    /// Source path → remote media, for substitution into the block tree.
    pub map: ImageMap,
    pub uploaded: usize,
    pub reused: usize,
}

/// Publish-time reconciliation: verify hits, upload the rest.
///
/// Precondition enforced here: the scan must be clean, otherwise this
/// returns [`Error::ImageValidation`] before any network call. An upload
/// failure aborts the remainder of the batch; records written for earlier
/// uploads are already on disk, so a rerun resumes via cache hits.
pub async fn reconcile(
    report: &ImageReport,
    platform: &dyn Platform,
    cache: &mut ImageCache,
) -> Result<ReconcileOutcome, Error> {
    report.require_clean()?;

    let mut outcome = ReconcileOutcome::default();
    // Keys already verified or freshly uploaded in this run; duplicates of
    // the same content skip straight to reuse.
    let mut settled: HashSet<String> = HashSet::new();

    for img in &report.images {
        let Some(key) = img.hash_key.as_deref() else {
            // Unreachable after require_clean, but never panic over it.
            continue;
        };
        let alt = img.reference.alt.as_deref();

        if let Some(record) = cache.get(key).cloned() {
            if settled.contains(key) || platform.verify_media(record.media_id).await? {
                cache.update_verified(key);
                settled.insert(key.to_string());
                outcome.map.insert(
                    img.reference.path.clone(),
                    MediaRef {
                        id: record.media_id,
                        url: record.url.clone(),
                    },
                );
                outcome.reused += 1;
                info!(path = %img.reference.path, media_id = record.media_id, "cache hit, reusing media");
                continue;
            }
            // Documented behaviour: a hit whose media vanished remotely is
            // quietly demoted to a re-upload, whatever the reason was.
            warn!(
                path = %img.reference.path,
                media_id = record.media_id,
                "cached media no longer exists remotely, re-uploading"
            );
            cache.remove(key);
        }

        let media = platform
            .upload_media(&img.validation.absolute_path, alt)
            .await?;
        cache.set(
            key.to_string(),
            CachedImage {
                media_id: media.id,
                url: media.source_url.clone(),
                uploaded_at: cache::now_iso8601(),
                verified: None,
            },
        );
        // Persist immediately: if a later upload fails, this one's record
        // survives for the rerun.
        cache.save().await?;
        settled.insert(key.to_string());
        outcome.map.insert(
            img.reference.path.clone(),
            MediaRef {
                id: media.id,
                url: media.source_url,
            },
        );
        outcome.uploaded += 1;
        info!(path = %img.reference.path, media_id = media.id, "uploaded media");
    }

    cache.save().await?;
    Ok(outcome)
}
