//! Top-level publish and validate flows.
//!
//! [`publish`] is the primary entry point: parse → extract → reconcile →
//! transform → create post → write back remote identifiers. Everything
//! runs sequentially; the only network traffic is inside reconciliation
//! and the final post-creation call, and none of it starts until every
//! referenced local image is confirmed present.
//!
//! [`validate`] is the same front half with the network removed: it
//! reports what a publish *would* do (uploads, cache reuse, generated
//! blocks) without touching the remote.

use crate::cache::ImageCache;
use crate::config::Config;
use crate::document::{self, Document, Status};
use crate::error::Error;
use crate::markdown::gutenberg::{to_gutenberg, ImageMap, MediaRef};
use crate::markdown::images::extract_images;
use crate::markdown::tree::parse_tree;
use crate::pipeline::{reconcile, scan_images, ImageReport};
use crate::remote::{Platform, PostInput};
use indexmap::IndexMap;
use std::path::Path;
use tracing::{info, warn};

/// Caller-controlled knobs for a publish run.
#[derive(Debug, Clone, Default)]
pub struct PublishOptions {
    /// Publish as draft regardless of frontmatter or config defaults.
    pub force_draft: bool,
}

/// What a successful publish produced.
#[derive(Debug, Clone)]
pub struct PublishOutcome {
    pub post_id: u64,
    pub link: String,
    pub modified: String,
    pub status: String,
    pub uploaded: usize,
    pub reused: usize,
    /// False when the remote post exists but the local frontmatter
    /// write-back failed (reported, non-fatal).
    pub frontmatter_updated: bool,
}

/// Publish one markdown file to the remote platform.
pub async fn publish(
    path: &Path,
    platform: &dyn Platform,
    config: &Config,
    options: &PublishOptions,
) -> Result<PublishOutcome, Error> {
    let doc = document::parse_document_file(path).await?;
    info!(title = %doc.frontmatter.title, path = %path.display(), "publishing");

    let tree = parse_tree(&doc.body);
    let refs = extract_images(&tree);
    info!(images = refs.len(), "extracted image references");

    let mut cache = ImageCache::new(&config.cache.dir);
    cache.load().await;
    let report = scan_images(
        &refs,
        path,
        config.images.base_path.as_deref(),
        &cache,
    )
    .await;
    let outcome = reconcile(&report, platform, &mut cache).await?;

    let content = to_gutenberg(&tree, &outcome.map);
    let status = resolve_status(&doc, config, options);
    let post = PostInput {
        title: doc.frontmatter.title.clone(),
        content,
        status: status.as_str().to_string(),
        slug: doc.frontmatter.slug.clone(),
        excerpt: doc.frontmatter.excerpt.clone(),
        date: doc.frontmatter.date.clone(),
    };

    let record = platform.create_post(&post).await?;
    info!(post_id = record.id, link = %record.link, "post created");

    let mut updates: IndexMap<String, serde_yaml::Value> = IndexMap::new();
    updates.insert("wp_post_id".into(), serde_yaml::Value::Number(record.id.into()));
    updates.insert("wp_url".into(), serde_yaml::Value::String(record.link.clone()));
    updates.insert(
        "wp_modified".into(),
        serde_yaml::Value::String(record.modified.clone()),
    );
    let frontmatter_updated = match document::update_frontmatter(path, &updates).await {
        Ok(()) => true,
        // The remote post exists; stale local bookkeeping must not turn a
        // successful publish into a failure.
        Err(e) => {
            warn!(error = %e, "publish succeeded but frontmatter write-back failed");
            false
        }
    };

    Ok(PublishOutcome {
        post_id: record.id,
        link: record.link,
        modified: record.modified,
        status: record.status,
        uploaded: outcome.uploaded,
        reused: outcome.reused,
        frontmatter_updated,
    })
}

/// Draft flag beats frontmatter beats configured default.
fn resolve_status(doc: &Document, config: &Config, options: &PublishOptions) -> Status {
    if options.force_draft {
        Status::Draft
    } else {
        doc.frontmatter
            .status
            .unwrap_or(config.posts.default_status)
    }
}

/// Everything the offline validate pass learned about a document.
#[derive(Debug)]
pub struct ValidationOutcome {
    pub document: Document,
    pub report: ImageReport,
    /// Gutenberg preview; cache hits use their real remote media,
    /// would-be uploads get placeholder references.
    pub preview: String,
    pub block_count: usize,
}

impl ValidationOutcome {
    /// A validate run "passes" when nothing would block a real publish.
    pub fn passed(&self) -> bool {
        self.report.error_count() == 0
    }
}

/// Validate a markdown file without any network traffic.
///
/// Parse and frontmatter errors are still fatal; per-image problems are
/// collected into the report for the caller to present.
pub async fn validate(path: &Path, config: &Config) -> Result<ValidationOutcome, Error> {
    let doc = document::parse_document_file(path).await?;
    let tree = parse_tree(&doc.body);
    let refs = extract_images(&tree);

    let mut cache = ImageCache::new(&config.cache.dir);
    cache.load().await;
    let report = scan_images(
        &refs,
        path,
        config.images.base_path.as_deref(),
        &cache,
    )
    .await;

    let preview_map = preview_image_map(&report);
    let preview = to_gutenberg(&tree, &preview_map);
    let block_count = preview.matches("<!-- wp:").count();

    Ok(ValidationOutcome {
        document: doc,
        report,
        preview,
        block_count,
    })
}

/// Build the substitution map a dry run renders with: real media for cache
/// hits, recognisable placeholders for images that would be uploaded.
fn preview_image_map(report: &ImageReport) -> ImageMap {
    let mut map = ImageMap::new();
    let mut placeholder = 0u64;
    for img in &report.images {
        if img.has_errors() {
            continue;
        }
        let media = match &img.cached {
            Some(record) => MediaRef {
                id: record.media_id,
                url: record.url.clone(),
            },
            None => {
                placeholder += 1;
                MediaRef {
                    id: 999 + placeholder,
                    url: format!(
                        "https://example.com/wp-content/uploads/image-{placeholder}.jpg"
                    ),
                }
            }
        };
        map.insert(img.reference.path.clone(), media);
    }
    map
}
