//! # markpress
//!
//! Publish Markdown posts to WordPress as native Gutenberg blocks.
//!
//! ## Why this crate?
//!
//! Piping rendered HTML into the WordPress editor produces one opaque
//! "Classic" blob. WordPress models content as a sequence of typed blocks,
//! and posts created as real blocks stay editable in Gutenberg afterwards.
//! This crate parses a markdown file (with YAML frontmatter), transforms
//! its structure into Gutenberg block markup, uploads every locally
//! referenced image exactly once — a content-addressed cache remembers
//! prior uploads across runs — and creates the post through the REST API.
//!
//! ## Pipeline Overview
//!
//! ```text
//! post.md
//!  │
//!  ├─ 1. Parse      split frontmatter, fold markdown into a typed tree
//!  ├─ 2. Extract    collect local image references, depth-first
//!  ├─ 3. Reconcile  hash → cache lookup → verify/upload via the platform
//!  ├─ 4. Transform  tree + image map → Gutenberg block HTML
//!  ├─ 5. Create     POST /wp-json/wp/v2/posts
//!  └─ 6. Write back wp_post_id / wp_url / wp_modified into frontmatter
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use markpress::{publish, Config, Credentials, PublishOptions, WordPressClient};
//! use std::path::Path;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load(Path::new("markpress.toml")).await?;
//!     let credentials = Credentials {
//!         username: config.site.username.clone(),
//!         password: std::env::var("MARKPRESS_PASSWORD")?,
//!     };
//!     let client = WordPressClient::new(&config.site.url, &credentials);
//!     let outcome = publish(
//!         Path::new("posts/hello.md"),
//!         &client,
//!         &config,
//!         &PublishOptions::default(),
//!     )
//!     .await?;
//!     println!("published: {} ({})", outcome.link, outcome.post_id);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `markpress` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! markpress = { version = "0.3", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod cache;
pub mod config;
pub mod document;
pub mod error;
pub mod markdown;
pub mod pipeline;
pub mod publish;
pub mod remote;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use cache::{cache_key, hash_file, CachedImage, ImageCache};
pub use config::{Config, Credentials};
pub use document::{parse_document, parse_document_file, update_frontmatter, Document, Frontmatter, Status};
pub use error::{Error, ImageIssue};
pub use markdown::gutenberg::{to_gutenberg, ImageMap, MediaRef};
pub use markdown::images::{extract_images, ImageRef};
pub use markdown::tree::{parse_tree, Block, Inline};
pub use pipeline::{scan_images, ImageReport, ReconcileOutcome};
pub use publish::{publish, validate, PublishOptions, PublishOutcome, ValidationOutcome};
pub use remote::wordpress::WordPressClient;
pub use remote::{MediaItem, Platform, PostInput, PostRecord};
