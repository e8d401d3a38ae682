//! Content-addressed blob storage implementation.
//!
//! This module provides the core implementation of mural's media storage
//! through the [`BlobStore`] type. It holds the binary side of every
//! visitor submission; the describing records (attachments, graffiti)
//! live in the content store and reference blobs by hash.
//!
//! # Content Addressing
//!
//! Blobs are stored under their SHA-256 hash. This provides:
//!
//! - **Deduplication**: identical submissions are stored once
//! - **Integrity**: blob content can be verified against its hash
//! - **Immutability**: blobs cannot be modified after creation
//! - **Deterministic paths**: same content always produces the same path
//!
//! # Security Model
//!
//! - The media root is canonicalised at construction time
//! - Hashes supplied by callers are validated as 64-character hex digests
//!   before being turned into paths, so untrusted input cannot escape the
//!   media root
//! - Blob directories are created lazily on first write

use crate::FilesError;
use chrono::{DateTime, Utc};
use mural_types::NonEmptyText;
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};

/// Directory under the media root holding all sha256-addressed blobs.
const HASH_DIR_NAME: &str = "sha256";

/// Metadata for a stored blob.
///
/// Returned from [`BlobStore::add`] so callers can persist an auditable
/// reference (hash, relative path, detected media type) alongside their
/// own records. Contains no post or visitor identifiers.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq, Eq)]
pub struct BlobMetadata {
    /// Hexadecimal SHA-256 digest of the blob content
    pub hash: NonEmptyText,

    /// Path relative to the media root where the blob is stored
    pub relative_path: NonEmptyText,

    /// Size of the blob in bytes
    pub size_bytes: u64,

    /// Detected media type (MIME type), if available
    ///
    /// Best-effort detection from the byte content; not authoritative.
    pub media_type: Option<NonEmptyText>,

    /// Filename the submitter supplied for this content
    pub original_filename: NonEmptyText,

    /// UTC timestamp when the blob was stored
    pub stored_at: DateTime<Utc>,
}

/// Content-addressed store for visitor-submitted media.
///
/// # Design
///
/// - One store per media root; all blobs share the sha256 namespace
/// - Immutable: a blob is never rewritten once present
/// - Defensive: caller-supplied hashes are validated before path use
#[derive(Debug)]
pub struct BlobStore {
    /// Canonicalised media root directory
    media_root: PathBuf,
}

impl BlobStore {
    /// Creates a new `BlobStore` rooted at `media_root`.
    ///
    /// # Errors
    ///
    /// Returns `FilesError::InvalidMediaRoot` if the root does not exist,
    /// is not a directory, or cannot be canonicalised.
    pub fn new(media_root: &Path) -> Result<Self, FilesError> {
        if !media_root.exists() {
            return Err(FilesError::InvalidMediaRoot(format!(
                "Directory does not exist: {}",
                media_root.display()
            )));
        }

        if !media_root.is_dir() {
            return Err(FilesError::InvalidMediaRoot(format!(
                "Path is not a directory: {}",
                media_root.display()
            )));
        }

        let media_root = media_root.canonicalize().map_err(|e| {
            FilesError::InvalidMediaRoot(format!(
                "Cannot canonicalize path {}: {}",
                media_root.display(),
                e
            ))
        })?;

        Ok(Self { media_root })
    }

    /// Adds a blob to content-addressed storage.
    ///
    /// Computes the SHA-256 hash of `bytes` and writes them under the
    /// sharded hash path. If a blob with the same hash already exists the
    /// bytes are not rewritten and the existing blob's metadata is
    /// returned — visitor re-submissions of identical content are expected
    /// and deduplicate here.
    ///
    /// # Arguments
    ///
    /// * `bytes` - Blob content
    /// * `original_filename` - Submitter-supplied filename, recorded in the
    ///   returned metadata (falls back to `"unnamed"` when blank)
    ///
    /// # Errors
    ///
    /// Returns `FilesError::Io` if the blob directory cannot be created or
    /// the write fails.
    pub fn add(&self, bytes: &[u8], original_filename: &str) -> Result<BlobMetadata, FilesError> {
        let hash = hex_digest(bytes);
        let storage_path = self.blob_path_unchecked(&hash);

        if !storage_path.exists() {
            if let Some(parent) = storage_path.parent() {
                fs::create_dir_all(parent).map_err(|e| {
                    FilesError::Io(std::io::Error::new(
                        e.kind(),
                        format!(
                            "Failed to create blob directory {}: {}",
                            parent.display(),
                            e
                        ),
                    ))
                })?;
            }

            fs::write(&storage_path, bytes).map_err(|e| {
                FilesError::Io(std::io::Error::new(
                    e.kind(),
                    format!("Failed to write blob to {}: {}", storage_path.display(), e),
                ))
            })?;
        }

        let original_filename = NonEmptyText::new(original_filename)
            .unwrap_or_else(|_| NonEmptyText::new("unnamed").expect("literal is non-empty"));

        let media_type = infer::get(bytes)
            .map(|kind| NonEmptyText::new(kind.mime_type()).expect("mime type is non-empty"));

        Ok(BlobMetadata {
            relative_path: relative_path(&hash),
            hash: NonEmptyText::new(&hash).expect("digest is non-empty"),
            size_bytes: bytes.len() as u64,
            media_type,
            original_filename,
            stored_at: Utc::now(),
        })
    }

    /// Retrieves a blob by its hash.
    ///
    /// # Errors
    ///
    /// Returns `FilesError::InvalidHash` for malformed hashes and
    /// `FilesError::BlobNotFound` when no blob is stored under the hash.
    pub fn read(&self, hash: &str) -> Result<Vec<u8>, FilesError> {
        let storage_path = self.blob_path(hash)?;

        if !storage_path.exists() {
            return Err(FilesError::BlobNotFound(hash.to_string()));
        }

        fs::read(&storage_path).map_err(|e| {
            FilesError::Io(std::io::Error::new(
                e.kind(),
                format!("Failed to read blob from {}: {}", storage_path.display(), e),
            ))
        })
    }

    /// Reports whether a blob is stored under the given hash.
    pub fn contains(&self, hash: &str) -> bool {
        self.blob_path(hash)
            .map(|path| path.exists())
            .unwrap_or(false)
    }

    /// Computes the absolute storage path for a caller-supplied hash.
    ///
    /// The hash is validated as a 64-character lowercase hex digest first,
    /// so untrusted input (e.g. a URL path segment) cannot traverse out of
    /// the media root.
    fn blob_path(&self, hash: &str) -> Result<PathBuf, FilesError> {
        let well_formed =
            hash.len() == 64 && hash.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'));
        if !well_formed {
            return Err(FilesError::InvalidHash(hash.to_string()));
        }
        Ok(self.blob_path_unchecked(hash))
    }

    /// Computes the absolute storage path for a hash this store produced.
    fn blob_path_unchecked(&self, hash: &str) -> PathBuf {
        self.media_root.join(relative_path(hash).as_str())
    }

    /// Returns the canonicalised media root.
    #[must_use]
    pub fn media_root(&self) -> &Path {
        &self.media_root
    }
}

/// Computes the relative path from the media root to a blob.
///
/// Format: `sha256/<shard1>/<shard2>/<hash>`, where the shards are the
/// first four hex characters of the hash split in two.
fn relative_path(hash: &str) -> NonEmptyText {
    let shard1 = &hash[0..2];
    let shard2 = &hash[2..4];
    NonEmptyText::new(format!("{}/{}/{}/{}", HASH_DIR_NAME, shard1, shard2, hash))
        .expect("computed path is non-empty")
}

/// Formats the SHA-256 digest of `bytes` as lowercase hex.
fn hex_digest(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    let mut out = String::with_capacity(64);
    for byte in digest {
        out.push_str(&format!("{:02x}", byte));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn create_store(temp: &TempDir) -> BlobStore {
        let root = temp.path().join("media");
        fs::create_dir_all(&root).expect("Failed to create media root");
        BlobStore::new(&root).expect("store should construct")
    }

    // Minimal valid PNG header, enough for `infer` to detect image/png.
    const PNG_HEADER: &[u8] = &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

    #[test]
    fn test_new_success() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("media");
        fs::create_dir_all(&root).unwrap();

        let store = BlobStore::new(&root);

        assert!(store.is_ok());
        assert!(store.unwrap().media_root().ends_with("media"));
    }

    #[test]
    fn test_new_root_not_exists() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("non-existent");

        let store = BlobStore::new(&root);

        assert!(matches!(store, Err(FilesError::InvalidMediaRoot(_))));
    }

    #[test]
    fn test_new_root_not_directory() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("file.txt");
        fs::write(&root, "not a directory").unwrap();

        let store = BlobStore::new(&root);

        assert!(matches!(store, Err(FilesError::InvalidMediaRoot(_))));
    }

    #[test]
    fn test_add_blob_success() {
        let temp = TempDir::new().unwrap();
        let store = create_store(&temp);

        let metadata = store.add(b"Hello, World!", "hello.txt").unwrap();

        assert_eq!(metadata.size_bytes, 13);
        assert_eq!(metadata.original_filename.as_str(), "hello.txt");
        assert_eq!(metadata.hash.as_str().len(), 64);
        assert!(metadata.relative_path.as_str().starts_with("sha256/"));

        let stored = store.read(metadata.hash.as_str()).unwrap();
        assert_eq!(stored, b"Hello, World!");
    }

    #[test]
    fn test_add_is_idempotent() {
        let temp = TempDir::new().unwrap();
        let store = create_store(&temp);

        let first = store.add(b"Same content", "a.bin").unwrap();
        let second = store.add(b"Same content", "b.bin").unwrap();

        assert_eq!(first.hash, second.hash);
        assert_eq!(first.relative_path, second.relative_path);
        // The filename reflects each submission, not the stored blob.
        assert_eq!(second.original_filename.as_str(), "b.bin");
    }

    #[test]
    fn test_add_detects_media_type() {
        let temp = TempDir::new().unwrap();
        let store = create_store(&temp);

        let metadata = store.add(PNG_HEADER, "drawing.png").unwrap();

        assert_eq!(
            metadata.media_type.as_ref().map(|t| t.as_str()),
            Some("image/png")
        );
    }

    #[test]
    fn test_add_blank_filename_falls_back() {
        let temp = TempDir::new().unwrap();
        let store = create_store(&temp);

        let metadata = store.add(b"content", "   ").unwrap();

        assert_eq!(metadata.original_filename.as_str(), "unnamed");
    }

    #[test]
    fn test_sharded_path_layout() {
        let temp = TempDir::new().unwrap();
        let store = create_store(&temp);

        let metadata = store.add(b"shard me", "s.bin").unwrap();
        let hash = metadata.hash.as_str();

        let expected = format!("sha256/{}/{}/{}", &hash[0..2], &hash[2..4], hash);
        assert_eq!(metadata.relative_path.as_str(), expected);
        assert!(store.media_root().join(&expected).exists());
    }

    #[test]
    fn test_read_not_found() {
        let temp = TempDir::new().unwrap();
        let store = create_store(&temp);

        let fake_hash = "abcdef1234567890abcdef1234567890abcdef1234567890abcdef1234567890";
        let result = store.read(fake_hash);

        assert!(matches!(result, Err(FilesError::BlobNotFound(_))));
    }

    #[test]
    fn test_read_rejects_malformed_hash() {
        let temp = TempDir::new().unwrap();
        let store = create_store(&temp);

        let result = store.read("../../etc/passwd");

        assert!(matches!(result, Err(FilesError::InvalidHash(_))));
    }

    #[test]
    fn test_contains() {
        let temp = TempDir::new().unwrap();
        let store = create_store(&temp);

        let metadata = store.add(b"present", "p.bin").unwrap();

        assert!(store.contains(metadata.hash.as_str()));
        assert!(
            !store.contains("0000000000000000000000000000000000000000000000000000000000000000")
        );
        assert!(!store.contains("not-a-hash"));
    }

    #[test]
    fn test_binary_roundtrip() {
        let temp = TempDir::new().unwrap();
        let store = create_store(&temp);

        let binary_data: Vec<u8> = (0..=255).collect();
        let metadata = store.add(&binary_data, "binary.dat").unwrap();

        assert_eq!(metadata.size_bytes, 256);
        assert_eq!(store.read(metadata.hash.as_str()).unwrap(), binary_data);
    }

    #[test]
    fn test_metadata_serialization() {
        let temp = TempDir::new().unwrap();
        let store = create_store(&temp);

        let metadata = store.add(PNG_HEADER, "drawing.png").unwrap();

        let json = serde_json::to_string(&metadata).unwrap();
        assert!(json.contains(metadata.hash.as_str()));
        assert!(json.contains("image/png"));
    }
}
