//! Image pipeline stages.
//!
//! ## Data Flow
//!
//! ```text
//! extract ──▶ scan ──▶ reconcile ──▶ ImageMap
//! (tree)      (local: resolve,       (network: verify hits,
//!              validate, hash,        upload misses, persist
//!              cache lookup)          cache incrementally)
//! ```
//!
//! The split point is the network boundary: everything before
//! [`reconcile::reconcile`] is offline and shared with the validate
//! command; everything after requires a [`crate::remote::Platform`].

pub mod reconcile;
pub mod validate;

pub use reconcile::{reconcile, scan_images, ImageReport, ReconcileOutcome, ScannedImage};
pub use validate::{classify_size, format_bytes, validate_image, SizeClass, Validation};
