//! Markdown processing stages.
//!
//! Three passes over one structure:
//!
//! 1. [`tree`]      — fold the pulldown-cmark event stream into a typed
//!    block/inline tree (the only place the parser crate is touched)
//! 2. [`images`]    — depth-first extraction of local image references
//! 3. [`gutenberg`] — serialise the tree to Gutenberg block HTML, with
//!    uploaded images substituted via a [`gutenberg::ImageMap`]
//!
//! Extraction and transform are kept as two walks on purpose: both are
//! cheap, and the transform needs the reconciliation result that is only
//! known after extraction has run.

pub mod gutenberg;
pub mod images;
pub mod tree;
