//! Image reference extraction from the body tree.
//!
//! One depth-first walk over every node, collecting `image` nodes in
//! encounter order at any nesting depth. Duplicates are preserved — the
//! reconciliation pipeline dedupes naturally through hash equality, the
//! extractor does not.

use super::tree::{Block, Inline};
use std::path::{Path, PathBuf};

/// An image reference exactly as written in the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRef {
    /// Path or URL as it appeared in the markdown.
    pub path: String,
    pub alt: Option<String>,
}

/// Whether a path points at a local file rather than something already
/// hosted remotely. Scheme-relative (`//`) URLs count as remote.
pub fn is_local_path(path: &str) -> bool {
    !path.starts_with("http://") && !path.starts_with("https://") && !path.starts_with("//")
}

/// Resolve a reference's path against the markdown file's directory (or an
/// explicit base-path override), never the process working directory.
pub fn resolve_image_path(image_path: &str, document_path: &Path, base: Option<&Path>) -> PathBuf {
    let dir = match base {
        Some(base) => base.to_path_buf(),
        None => document_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default(),
    };
    dir.join(image_path)
}

/// Collect every local image reference in the tree, in document order.
pub fn extract_images(tree: &[Block]) -> Vec<ImageRef> {
    let mut found = Vec::new();
    for block in tree {
        walk_block(block, &mut found);
    }
    found
}

fn walk_block(block: &Block, found: &mut Vec<ImageRef>) {
    match block {
        Block::Heading { children, .. } | Block::Paragraph(children) => {
            walk_inlines(children, found)
        }
        Block::List { items, .. } => {
            for item in items {
                for child in item {
                    walk_block(child, found);
                }
            }
        }
        Block::Quote(children) => {
            for child in children {
                walk_block(child, found);
            }
        }
        Block::Code(_) | Block::Separator => {}
    }
}

fn walk_inlines(inlines: &[Inline], found: &mut Vec<ImageRef>) {
    for inline in inlines {
        match inline {
            Inline::Image { url, alt } => {
                if is_local_path(url) {
                    found.push(ImageRef {
                        path: url.clone(),
                        alt: (!alt.is_empty()).then(|| alt.clone()),
                    });
                }
            }
            Inline::Bold(children) | Inline::Italic(children) => walk_inlines(children, found),
            Inline::Link { children, .. } => walk_inlines(children, found),
            Inline::Text(_) | Inline::Code(_) | Inline::Break => {}
        }
    }
}
