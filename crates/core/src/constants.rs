//! Constants used throughout the mural core crate.
//!
//! This module contains path and filename constants so the storage layout
//! is defined in one place.

/// Default directory for content data storage when no explicit directory is configured.
pub const DEFAULT_CONTENT_DATA_DIR: &str = "content_data";

/// Default directory for media blob storage.
pub const DEFAULT_MEDIA_DATA_DIR: &str = "media_data";

/// Directory name for post records.
pub const POSTS_DIR_NAME: &str = "posts";

/// Directory name for attachment records.
pub const ATTACHMENTS_DIR_NAME: &str = "attachments";

/// Directory name for graffiti records.
pub const GRAFFITI_DIR_NAME: &str = "graffiti";

/// Filename for post record files.
pub const POST_FILENAME: &str = "post.yaml";

/// Filename for attachment record files.
pub const ATTACHMENT_FILENAME: &str = "attachment.yaml";

/// Filename for graffiti record files.
pub const GRAFFITI_FILENAME: &str = "record.yaml";

/// Default maximum upload size in bytes (2 MiB, matching the editing
/// surface's image cap; drawings use the same limit).
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 2 * 1024 * 1024;
