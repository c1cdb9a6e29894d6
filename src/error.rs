//! Error types for the markpress library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`Error`] — **Fatal**: the publish cannot proceed at all (missing
//!   frontmatter title, a required image absent from disk, an upload or
//!   post-creation rejected by the remote API). Returned as `Err(Error)`
//!   from the top-level `publish`/`validate` functions.
//!
//! * [`ImageIssue`] — **Non-fatal**: a single image failed validation
//!   (missing file, over the size limit, unreadable). Collected inside
//!   [`crate::pipeline::ImageReport`] so the whole batch can be scanned
//!   and reported in one pass rather than dying on the first bad path.
//!
//! Validation issues aggregate; network errors fail fast; a corrupt cache
//! file is never an error at all (the store silently starts fresh).

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the markpress library.
///
/// Per-image validation failures use [`ImageIssue`] and are stored in
/// [`crate::pipeline::ImageReport`] rather than propagated here.
#[derive(Debug, Error)]
pub enum Error {
    // ── Document errors ───────────────────────────────────────────────────
    /// Frontmatter is missing a required field.
    #[error("Frontmatter must include a \"{field}\" field")]
    MissingRequiredField { field: &'static str },

    /// Frontmatter was present but failed to deserialize or validate.
    #[error("Invalid frontmatter: {0}")]
    InvalidFrontmatter(String),

    /// The markdown file itself could not be read.
    #[error("Failed to read '{path}': {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Image batch errors ────────────────────────────────────────────────
    /// At least one referenced image failed validation during a publish.
    ///
    /// Uploads never start while any required file is missing, so this is
    /// always raised before the first network call.
    #[error("{count} image(s) failed validation:\n{summary}")]
    ImageValidation { count: usize, summary: String },

    // ── Remote errors ─────────────────────────────────────────────────────
    /// A media upload was rejected; the remainder of the batch is aborted.
    /// Cache records written before the failure survive for the rerun.
    #[error("Failed to upload media '{path}': {detail}")]
    UploadFailed { path: PathBuf, detail: String },

    /// Any other non-success response from the remote platform.
    #[error("Remote API error ({status}): {body}")]
    RemoteApi { status: u16, body: String },

    /// The HTTP request itself failed (connection, TLS, timeout).
    #[error("Request to remote platform failed: {0}")]
    Transport(#[from] reqwest::Error),

    // ── Local state errors ────────────────────────────────────────────────
    /// Could not persist the image cache file.
    #[error("Failed to write cache file '{path}': {source}")]
    CacheWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Frontmatter rewrite after a successful publish failed.
    ///
    /// Callers treat this as a warning: the remote post already exists,
    /// only the local bookkeeping is stale.
    #[error("Failed to update frontmatter in '{path}': {detail}")]
    FrontmatterRewrite { path: PathBuf, detail: String },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Configuration file could not be parsed or failed validation.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// A non-fatal problem with a single referenced image.
///
/// Collected during the validation scan; the scan always visits every
/// image so the user sees the full list in one run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ImageIssue {
    /// The referenced file does not exist at its resolved path.
    #[error("File not found: {path}")]
    NotFound { path: PathBuf },

    /// Over the hard 10 MiB limit WordPress typically rejects.
    #[error("File too large: {size_formatted} (WordPress limit typically 10 MB)")]
    TooLarge { path: PathBuf, size_formatted: String },

    /// Reading the file to hash its contents failed.
    #[error("Failed to hash '{path}': {detail}")]
    HashFailed { path: PathBuf, detail: String },
}

impl ImageIssue {
    /// Whether this issue must block an actual publish.
    ///
    /// All current variants do; warnings (large-but-acceptable files) are
    /// tracked separately and never block.
    pub fn is_fatal(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_field_display() {
        let e = Error::MissingRequiredField { field: "title" };
        assert!(e.to_string().contains("\"title\""));
    }

    #[test]
    fn image_validation_display() {
        let e = Error::ImageValidation {
            count: 2,
            summary: "  - a.png\n  - b.png".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("2 image(s)"));
        assert!(msg.contains("a.png"));
    }

    #[test]
    fn issue_not_found_display() {
        let e = ImageIssue::NotFound {
            path: PathBuf::from("./img/x.png"),
        };
        assert!(e.to_string().contains("x.png"));
        assert!(e.is_fatal());
    }

    #[test]
    fn remote_api_display() {
        let e = Error::RemoteApi {
            status: 401,
            body: "rest_cannot_create".into(),
        };
        assert!(e.to_string().contains("401"));
        assert!(e.to_string().contains("rest_cannot_create"));
    }
}
