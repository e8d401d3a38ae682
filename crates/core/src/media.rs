//! Media intake and attachment records.
//!
//! This module sits between the transport layer and the blob store. It
//! validates visitor-submitted images (type allowlist, size cap), writes
//! the bytes into content-addressed storage, records an [`Attachment`]
//! describing the submission, and issues the public URL the stored blob
//! is served from.
//!
//! Attachment records carry tracking fields (source post, submitter IP,
//! visitor flag) so uploads remain attributable after the fact.

use crate::config::CoreConfig;
use crate::constants::ATTACHMENT_FILENAME;
use crate::error::{CoreError, CoreResult};
use crate::records;
use crate::sanitize::sanitize_text_field;
use chrono::{DateTime, Utc};
use mural_files::BlobStore;
use std::path::PathBuf;
use std::sync::Arc;

/// MIME types visitors may upload.
pub const ALLOWED_UPLOAD_TYPES: [&str; 4] =
    ["image/jpeg", "image/png", "image/gif", "image/webp"];

/// A stored media object record.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Attachment {
    pub id: u64,
    /// SHA-256 hash addressing the bytes in the blob store
    pub hash: String,
    pub mime_type: String,
    /// Display title derived from the submitted filename
    pub title: String,
    pub size_bytes: u64,
    /// The post this upload was submitted against
    pub source_post: u64,
    pub uploader_ip: String,
    /// True for anonymous visitor submissions (all submissions through
    /// this service are)
    pub visitor_upload: bool,
    pub created_at: DateTime<Utc>,
}

/// Validated intake of visitor media.
#[derive(Debug)]
pub struct MediaService {
    cfg: Arc<CoreConfig>,
    blobs: BlobStore,
}

impl MediaService {
    /// Creates a media service over the configured media root.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::Storage` when the media root is missing or not
    /// a directory.
    pub fn new(cfg: Arc<CoreConfig>) -> CoreResult<Self> {
        let blobs = BlobStore::new(cfg.media_dir())?;
        Ok(Self { cfg, blobs })
    }

    fn attachments_dir(&self) -> PathBuf {
        self.cfg.attachments_dir()
    }

    /// Validates and stores one visitor-submitted image.
    ///
    /// Validation order matches the original surface: claimed type first,
    /// then size, then content. The detected content type, when
    /// determinable, must itself be in the allowlist — a renamed payload
    /// does not pass on its claimed type alone.
    ///
    /// # Arguments
    ///
    /// * `source_post` - The post the upload was submitted against
    /// * `bytes` - Decoded image content
    /// * `filename` - Submitter-supplied filename
    /// * `claimed_mime` - Content type claimed by the submission
    /// * `uploader_ip` - Client address from the request context
    ///
    /// # Errors
    ///
    /// - `Validation(invalid_file_type)` — claimed or detected type not allowed
    /// - `Validation(file_too_large)` — above the configured cap
    /// - `Storage` — blob write failed
    pub fn store_image(
        &self,
        source_post: u64,
        bytes: &[u8],
        filename: &str,
        claimed_mime: &str,
        uploader_ip: &str,
    ) -> CoreResult<(Attachment, String)> {
        if !ALLOWED_UPLOAD_TYPES.contains(&claimed_mime) {
            return Err(CoreError::validation(
                "invalid_file_type",
                "Invalid file type. Only JPEG, PNG, GIF, and WebP images are allowed.",
            ));
        }

        if bytes.len() as u64 > self.cfg.max_upload_bytes() {
            return Err(CoreError::validation(
                "file_too_large",
                format!(
                    "File is too large. Maximum size is {} bytes.",
                    self.cfg.max_upload_bytes()
                ),
            ));
        }

        if let Some(detected) = mural_files::detect_media_type(bytes) {
            if !ALLOWED_UPLOAD_TYPES.contains(&detected) {
                return Err(CoreError::validation(
                    "invalid_file_type",
                    "Invalid file type. Only JPEG, PNG, GIF, and WebP images are allowed.",
                ));
            }
        }

        let metadata = self.blobs.add(bytes, filename)?;

        let attachment = Attachment {
            id: records::next_id(&self.attachments_dir()),
            hash: metadata.hash.as_str().to_string(),
            mime_type: metadata
                .media_type
                .as_ref()
                .map(|t| t.as_str().to_string())
                .unwrap_or_else(|| claimed_mime.to_string()),
            title: filename_title(filename),
            size_bytes: metadata.size_bytes,
            source_post,
            uploader_ip: uploader_ip.to_string(),
            visitor_upload: true,
            created_at: Utc::now(),
        };

        records::write_record(
            &self.attachments_dir(),
            attachment.id,
            ATTACHMENT_FILENAME,
            &attachment,
        )?;

        let url = self.public_url(&attachment.hash);
        Ok((attachment, url))
    }

    /// Loads an attachment record by id.
    pub fn load_attachment(&self, id: u64) -> CoreResult<Option<Attachment>> {
        records::read_record(&self.attachments_dir(), id, ATTACHMENT_FILENAME)
    }

    /// Reads a stored blob and its best-effort content type.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::Storage` wrapping `BlobNotFound`/`InvalidHash`
    /// when the hash does not resolve.
    pub fn read_blob(&self, hash: &str) -> CoreResult<(Vec<u8>, String)> {
        let bytes = self.blobs.read(hash)?;
        let mime = mural_files::detect_media_type(&bytes)
            .unwrap_or("application/octet-stream")
            .to_string();
        Ok((bytes, mime))
    }

    /// Issues the public URL a stored blob is served from.
    pub fn public_url(&self, hash: &str) -> String {
        format!("{}/media/{}", self.cfg.public_base_url(), hash)
    }
}

/// Derives an attachment title from a submitted filename: the stem,
/// sanitised as plain text, falling back to the whole name.
fn filename_title(filename: &str) -> String {
    let stem = std::path::Path::new(filename)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(filename);
    let title = sanitize_text_field(stem);
    if title.is_empty() {
        "upload".to_string()
    } else {
        title
    }
}
