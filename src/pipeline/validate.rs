//! Per-image local validation: existence and size thresholds.
//!
//! Validation never aborts the batch scan — every image gets checked so
//! the user sees the complete picture in one run. Whether the collected
//! issues are fatal is the caller's decision (a real publish: yes; the
//! offline validate command: report only).

use crate::error::ImageIssue;
use std::path::{Path, PathBuf};

/// Hard limit: WordPress installs typically reject uploads above this.
pub const MAX_UPLOAD_BYTES: u64 = 10 * 1024 * 1024;
/// Soft limit: above this we warn, the upload still proceeds.
pub const LARGE_FILE_BYTES: u64 = 2 * 1024 * 1024;

/// Size-threshold classification, separated out so the boundaries are
/// testable without creating multi-MiB files.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeClass {
    Ok,
    /// Above 2 MiB — warning only.
    Large,
    /// Above 10 MiB — hard error.
    TooLarge,
}

pub fn classify_size(bytes: u64) -> SizeClass {
    if bytes > MAX_UPLOAD_BYTES {
        SizeClass::TooLarge
    } else if bytes > LARGE_FILE_BYTES {
        SizeClass::Large
    } else {
        SizeClass::Ok
    }
}

/// Outcome of validating one image file.
#[derive(Debug, Clone)]
pub struct Validation {
    pub exists: bool,
    pub absolute_path: PathBuf,
    /// File size in bytes, when the file exists and could be stat'd.
    pub size: Option<u64>,
    pub errors: Vec<ImageIssue>,
    pub warnings: Vec<String>,
}

/// Validate a single image at its resolved absolute path.
pub async fn validate_image(absolute_path: &Path) -> Validation {
    let mut validation = Validation {
        exists: false,
        absolute_path: absolute_path.to_path_buf(),
        size: None,
        errors: Vec::new(),
        warnings: Vec::new(),
    };

    let meta = match tokio::fs::metadata(absolute_path).await {
        Ok(meta) => meta,
        Err(_) => {
            validation.errors.push(ImageIssue::NotFound {
                path: absolute_path.to_path_buf(),
            });
            return validation;
        }
    };

    validation.exists = true;
    let size = meta.len();
    validation.size = Some(size);

    match classify_size(size) {
        SizeClass::TooLarge => validation.errors.push(ImageIssue::TooLarge {
            path: absolute_path.to_path_buf(),
            size_formatted: format_bytes(size),
        }),
        SizeClass::Large => validation.warnings.push(format!(
            "Large file size: {} (recommend <2 MB)",
            format_bytes(size)
        )),
        SizeClass::Ok => {}
    }

    validation
}

/// Human-readable byte count: `0 B`, `245.3 KB`, `1.5 MB`.
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    if bytes == 0 {
        return "0 B".to_string();
    }
    let exp = (bytes as f64).log(1024.0).floor() as usize;
    let exp = exp.min(UNITS.len() - 1);
    let value = bytes as f64 / 1024f64.powi(exp as i32);
    if exp == 0 {
        format!("{bytes} {}", UNITS[0])
    } else {
        format!("{:.1} {}", value, UNITS[exp])
    }
}
