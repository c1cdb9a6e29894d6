//! Markdown document parsing: frontmatter + body.
//!
//! A post is a single markdown file with a leading `---` delimited YAML
//! frontmatter block. Parsing splits the two, deserializes the frontmatter
//! into a typed [`Frontmatter`], and keeps the body text verbatim — the body
//! is the input to the block transform and must survive a frontmatter
//! rewrite byte-for-byte.
//!
//! Unrecognized frontmatter keys are deliberately preserved: they are
//! captured into an insertion-order map and written back untouched by
//! [`update_frontmatter`], so a file that carries keys for other tools is
//! never damaged by a publish.

use crate::error::Error;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// Post visibility on the remote platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    #[default]
    Draft,
    Publish,
}

impl Status {
    /// Wire value expected by the WordPress REST API.
    pub fn as_str(self) -> &'static str {
        match self {
            Status::Draft => "draft",
            Status::Publish => "publish",
        }
    }
}

/// Typed frontmatter of a post.
///
/// `title` is the only required field. Everything WordPress-specific that
/// gets written back after a publish (`wp_post_id`, `wp_url`, `wp_modified`)
/// is optional on the way in. Keys this crate does not recognize land in
/// `extra` and round-trip through [`update_frontmatter`] unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Frontmatter {
    /// Defaulted rather than required at the serde level: an absent title
    /// must surface as the missing-field error from [`Frontmatter::validate`],
    /// not as a generic deserialization failure.
    #[serde(default)]
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<Status>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub excerpt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub categories: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub featured_image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wp_post_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wp_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wp_modified: Option<String>,
    #[serde(flatten)]
    pub extra: IndexMap<String, serde_yaml::Value>,
}

impl Frontmatter {
    /// Check invariants beyond what serde enforces structurally.
    ///
    /// `title` non-empty; `date` (if present) parseable as ISO-8601.
    pub fn validate(&self) -> Result<(), Error> {
        if self.title.trim().is_empty() {
            return Err(Error::MissingRequiredField { field: "title" });
        }
        if let Some(date) = &self.date {
            let ok = chrono::DateTime::parse_from_rfc3339(date).is_ok()
                || chrono::NaiveDate::parse_from_str(date, "%Y-%m-%d").is_ok();
            if !ok {
                return Err(Error::InvalidFrontmatter(format!(
                    "\"date\" must be an ISO 8601 date, got {date:?}"
                )));
            }
        }
        Ok(())
    }
}

/// A parsed post: typed frontmatter plus the untouched body text.
#[derive(Debug, Clone)]
pub struct Document {
    pub frontmatter: Frontmatter,
    /// Body markdown, exactly as it appeared after the frontmatter block.
    pub body: String,
}

/// Split raw file contents into (frontmatter yaml, body).
///
/// The frontmatter block is a leading `---` line, YAML, and a closing `---`
/// line. A file without one parses as (empty yaml, whole file) — the title
/// requirement then fails downstream with a precise error.
fn split_frontmatter(raw: &str) -> (&str, &str) {
    let Some(rest) = raw.strip_prefix("---\n").or_else(|| raw.strip_prefix("---\r\n")) else {
        return ("", raw);
    };
    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end() == "---" {
            return (&rest[..offset], &rest[offset + line.len()..]);
        }
        offset += line.len();
    }
    // No closing fence: not frontmatter at all.
    ("", raw)
}

/// Parse raw file contents into a [`Document`].
///
/// Fails with [`Error::MissingRequiredField`] when no usable `title` is
/// present, and [`Error::InvalidFrontmatter`] on malformed YAML.
pub fn parse_document(raw: &str) -> Result<Document, Error> {
    let (yaml, body) = split_frontmatter(raw);
    let frontmatter: Frontmatter = if yaml.is_empty() {
        Frontmatter::default()
    } else {
        serde_yaml::from_str(yaml).map_err(|e| Error::InvalidFrontmatter(e.to_string()))?
    };
    frontmatter.validate()?;
    debug!(title = %frontmatter.title, "parsed document");
    Ok(Document {
        frontmatter,
        body: body.to_string(),
    })
}

/// Read and parse a markdown file from disk.
pub async fn parse_document_file(path: &Path) -> Result<Document, Error> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| Error::ReadFailed {
            path: path.to_path_buf(),
            source,
        })?;
    parse_document(&raw)
}

/// Merge remote-assigned identifiers back into a file's frontmatter.
///
/// Re-reads the file, merges `updates` into the raw frontmatter map
/// (updates win on collision, all other keys — known or not — keep their
/// original order), and rewrites `---\n<yaml>---\n\n<body>`. The body is
/// the original byte sequence, untouched.
///
/// Rewriting twice with the same updates is a no-op the second time: the
/// YAML serializer is deterministic, so the re-parse of its own output
/// serializes back identically.
pub async fn update_frontmatter(
    path: &Path,
    updates: &IndexMap<String, serde_yaml::Value>,
) -> Result<(), Error> {
    let rewrite_err = |detail: String| Error::FrontmatterRewrite {
        path: path.to_path_buf(),
        detail,
    };

    let raw = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| rewrite_err(e.to_string()))?;
    let (yaml, body) = split_frontmatter(&raw);

    let mut map: IndexMap<String, serde_yaml::Value> = if yaml.is_empty() {
        IndexMap::new()
    } else {
        serde_yaml::from_str(yaml).map_err(|e| rewrite_err(e.to_string()))?
    };
    for (key, value) in updates {
        map.insert(key.clone(), value.clone());
    }

    let new_yaml = serde_yaml::to_string(&map).map_err(|e| rewrite_err(e.to_string()))?;
    let rewritten = format!("---\n{new_yaml}---\n{body}");
    tokio::fs::write(path, rewritten)
        .await
        .map_err(|e| rewrite_err(e.to_string()))?;
    debug!(path = %path.display(), keys = updates.len(), "frontmatter updated");
    Ok(())
}
