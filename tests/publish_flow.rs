//! End-to-end publish flow tests against an in-memory platform.
//!
//! No network, no real WordPress: a mock [`Platform`] records every call
//! so the tests can assert exactly which remote operations a publish
//! performs — and, just as importantly, which ones it does not.

use async_trait::async_trait;
use markpress::{
    publish, validate, Config, Error, MediaItem, Platform, PostInput, PostRecord,
    PublishOptions,
};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Mutex;

// ── Mock platform ────────────────────────────────────────────────────────────

#[derive(Default)]
struct MockPlatform {
    uploads: AtomicUsize,
    verifies: AtomicUsize,
    posts_created: AtomicUsize,
    next_media_id: AtomicU64,
    created: Mutex<Vec<PostInput>>,
    /// Uploads of files whose name contains this substring fail.
    fail_upload_containing: Option<String>,
}

impl MockPlatform {
    fn new() -> Self {
        Self {
            next_media_id: AtomicU64::new(500),
            ..Default::default()
        }
    }
}

#[async_trait]
impl Platform for MockPlatform {
    async fn upload_media(&self, path: &Path, _alt: Option<&str>) -> Result<MediaItem, Error> {
        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        if let Some(marker) = &self.fail_upload_containing {
            if name.contains(marker.as_str()) {
                return Err(Error::UploadFailed {
                    path: path.to_path_buf(),
                    detail: "HTTP 500: simulated".into(),
                });
            }
        }
        self.uploads.fetch_add(1, Ordering::SeqCst);
        let id = self.next_media_id.fetch_add(1, Ordering::SeqCst);
        Ok(MediaItem {
            id,
            source_url: format!("https://example.com/wp-content/uploads/{name}"),
        })
    }

    async fn verify_media(&self, _id: u64) -> Result<bool, Error> {
        self.verifies.fetch_add(1, Ordering::SeqCst);
        Ok(true)
    }

    async fn create_post(&self, post: &PostInput) -> Result<PostRecord, Error> {
        self.posts_created.fetch_add(1, Ordering::SeqCst);
        self.created.lock().unwrap().push(post.clone());
        Ok(PostRecord {
            id: 42,
            link: "https://example.com/?p=42".into(),
            modified: "2024-03-01T12:00:00".into(),
            status: post.status.clone(),
            slug: post.slug.clone().unwrap_or_default(),
        })
    }

    async fn update_post(&self, _id: u64, post: &PostInput) -> Result<PostRecord, Error> {
        self.create_post(post).await
    }

    async fn get_post(&self, _id: u64) -> Result<PostRecord, Error> {
        unimplemented!("not exercised by these tests")
    }

    async fn delete_post(&self, _id: u64) -> Result<(), Error> {
        unimplemented!("not exercised by these tests")
    }
}

// ── Fixtures ─────────────────────────────────────────────────────────────────

const POST: &str = "---\ntitle: Integration Post\nstatus: publish\nslug: integration-post\n---\n\n# Hello\n\nIntro with ![one](img/one.png) inline.\n\n![two](img/two.png)\n";

struct Site {
    dir: tempfile::TempDir,
    post_path: PathBuf,
    config: Config,
}

fn site(markdown: &str, images: &[&str]) -> Site {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(dir.path().join("img")).unwrap();
    for name in images {
        std::fs::write(dir.path().join("img").join(name), name.as_bytes()).unwrap();
    }
    let post_path = dir.path().join("post.md");
    std::fs::write(&post_path, markdown).unwrap();

    let mut config = Config::default();
    config.cache.dir = dir.path().join(".markpress");
    Site {
        post_path,
        config,
        dir,
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn full_publish_uploads_creates_and_writes_back() {
    let site = site(POST, &["one.png", "two.png"]);
    let platform = MockPlatform::new();

    let outcome = publish(
        &site.post_path,
        &platform,
        &site.config,
        &PublishOptions::default(),
    )
    .await
    .unwrap();

    assert_eq!(platform.uploads.load(Ordering::SeqCst), 2);
    assert_eq!(platform.posts_created.load(Ordering::SeqCst), 1);
    assert_eq!(outcome.post_id, 42);
    assert_eq!(outcome.uploaded, 2);
    assert!(outcome.frontmatter_updated);

    // Remote ids substituted into the generated content.
    let created = platform.created.lock().unwrap();
    assert!(created[0].content.contains("wp-image-500"));
    assert!(created[0]
        .content
        .contains("https://example.com/wp-content/uploads/two.png"));
    assert_eq!(created[0].status, "publish");
    assert_eq!(created[0].title, "Integration Post");

    // Frontmatter write-back, body untouched.
    let rewritten = std::fs::read_to_string(&site.post_path).unwrap();
    assert!(rewritten.contains("wp_post_id: 42"));
    assert!(rewritten.contains("wp_url: https://example.com/?p=42"));
    assert!(rewritten.ends_with("\n# Hello\n\nIntro with ![one](img/one.png) inline.\n\n![two](img/two.png)\n"));
}

#[tokio::test]
async fn republish_hits_cache_and_uploads_nothing() {
    let site = site(POST, &["one.png", "two.png"]);

    let first = MockPlatform::new();
    publish(&site.post_path, &first, &site.config, &PublishOptions::default())
        .await
        .unwrap();

    let second = MockPlatform::new();
    let outcome = publish(
        &site.post_path,
        &second,
        &site.config,
        &PublishOptions::default(),
    )
    .await
    .unwrap();

    assert_eq!(second.uploads.load(Ordering::SeqCst), 0);
    assert_eq!(second.verifies.load(Ordering::SeqCst), 2);
    assert_eq!(outcome.reused, 2);
    assert_eq!(outcome.uploaded, 0);
}

#[tokio::test]
async fn missing_image_blocks_publish_before_any_remote_call() {
    let site = site(POST, &["one.png"]); // two.png missing
    let platform = MockPlatform::new();

    let err = publish(
        &site.post_path,
        &platform,
        &site.config,
        &PublishOptions::default(),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, Error::ImageValidation { count: 1, .. }));
    assert_eq!(platform.uploads.load(Ordering::SeqCst), 0);
    assert_eq!(platform.verifies.load(Ordering::SeqCst), 0);
    assert_eq!(platform.posts_created.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn upload_failure_aborts_batch_but_keeps_earlier_cache_records() {
    let site = site(POST, &["one.png", "two.png"]);
    let platform = MockPlatform {
        fail_upload_containing: Some("two".into()),
        ..MockPlatform::new()
    };

    let err = publish(
        &site.post_path,
        &platform,
        &site.config,
        &PublishOptions::default(),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, Error::UploadFailed { .. }));
    assert_eq!(platform.posts_created.load(Ordering::SeqCst), 0);

    // one.png made it into the cache before the failure, so the retry
    // only needs to upload two.png.
    let retry = MockPlatform::new();
    let outcome = publish(
        &site.post_path,
        &retry,
        &site.config,
        &PublishOptions::default(),
    )
    .await
    .unwrap();
    assert_eq!(retry.uploads.load(Ordering::SeqCst), 1);
    assert_eq!(outcome.reused, 1);
    assert_eq!(outcome.uploaded, 1);
}

#[tokio::test]
async fn draft_flag_overrides_frontmatter_status() {
    let site = site(POST, &["one.png", "two.png"]);
    let platform = MockPlatform::new();

    publish(
        &site.post_path,
        &platform,
        &site.config,
        &PublishOptions { force_draft: true },
    )
    .await
    .unwrap();

    let created = platform.created.lock().unwrap();
    assert_eq!(created[0].status, "draft");
}

#[tokio::test]
async fn remote_images_pass_through_without_upload() {
    let markdown = "---\ntitle: Remote\n---\n\n![cdn](https://cdn.example.com/x.png)\n";
    let site = site(markdown, &[]);
    let platform = MockPlatform::new();

    publish(
        &site.post_path,
        &platform,
        &site.config,
        &PublishOptions::default(),
    )
    .await
    .unwrap();

    assert_eq!(platform.uploads.load(Ordering::SeqCst), 0);
    let created = platform.created.lock().unwrap();
    assert!(created[0]
        .content
        .contains("src=\"https://cdn.example.com/x.png\""));
}

#[tokio::test]
async fn validate_reports_without_touching_the_remote() {
    let site = site(POST, &["one.png"]); // two.png missing
    let outcome = validate(&site.post_path, &site.config).await.unwrap();

    assert!(!outcome.passed());
    assert_eq!(outcome.report.error_count(), 1);
    assert_eq!(outcome.report.images.len(), 2);
    assert!(outcome.block_count >= 3);
    assert!(outcome.preview.contains("<!-- wp:heading"));

    // The original file is untouched by a validate run.
    let raw = std::fs::read_to_string(&site.post_path).unwrap();
    assert_eq!(raw, POST);
    // And no cache file has been created either.
    assert!(!site.dir.path().join(".markpress").exists());
}

#[tokio::test]
async fn missing_title_fails_before_anything_else() {
    let site = site("---\nslug: no-title\n---\n\nbody\n", &[]);
    let platform = MockPlatform::new();
    let err = publish(
        &site.post_path,
        &platform,
        &site.config,
        &PublishOptions::default(),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, Error::MissingRequiredField { field: "title" }));
    assert_eq!(platform.posts_created.load(Ordering::SeqCst), 0);
}
