//! Mural Media Storage
//!
//! This crate provides content-addressed binary storage for visitor-submitted
//! media: uploaded images and decoded graffiti drawings.
//!
//! ## Design Principles
//!
//! - Post and attachment records (semantic data) live in the content store;
//!   binary bytes live here, referenced by content hash
//! - Blobs are immutable: identical bytes always map to the same path, and
//!   re-adding existing content is a no-op
//! - References to blobs are explicit and auditable (hash + relative path)
//! - The record stores remain valid even when a blob is absent
//!
//! ## Storage Layout
//!
//! All blobs share one media root, addressed by SHA-256 with two-level
//! sharding:
//!
//! ```text
//! <media_dir>/
//! └── sha256/
//!     └── ab/
//!         └── cd/
//!             └── abcdef…   # full hash as filename
//! ```
//!
//! ## Example Usage
//!
//! ```no_run
//! use mural_files::BlobStore;
//! use std::path::Path;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let store = BlobStore::new(Path::new("media_data"))?;
//! let metadata = store.add(b"\x89PNG...", "drawing.png")?;
//! let bytes = store.read(metadata.hash.as_str())?;
//! # Ok(())
//! # }
//! ```

mod store;

pub use store::{BlobMetadata, BlobStore};

/// Best-effort media type detection from byte content.
///
/// Thin wrapper so callers can classify blobs without depending on the
/// detection crate directly.
pub fn detect_media_type(bytes: &[u8]) -> Option<&'static str> {
    infer::get(bytes).map(|kind| kind.mime_type())
}

/// Errors that can occur during blob operations
#[derive(Debug, thiserror::Error)]
pub enum FilesError {
    /// Media root does not exist or is not a directory
    #[error("Invalid media root: {0}")]
    InvalidMediaRoot(String),

    /// No blob is stored under the requested hash
    #[error("Blob not found for hash: {0}")]
    BlobNotFound(String),

    /// The requested hash is not a well-formed SHA-256 hex digest
    #[error("Invalid blob hash: {0}")]
    InvalidHash(String),

    /// I/O error occurred
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
