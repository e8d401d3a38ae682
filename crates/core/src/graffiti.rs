//! Graffiti records and the drawing submission pipeline.
//!
//! A drawing is an append-only child record anchored to a parent post and
//! a segment index, plus a PNG blob in media storage. Records are never
//! updated or merged after creation; several drawings may share one
//! anchor and render as a cluster.
//!
//! Submission is the one multi-step write in the system, and it keeps a
//! strict no-partial-state rule: the record is created first (so the id
//! exists for naming), then the image is stored — and if the image step
//! fails, the record is deleted again. A record must never outlive the
//! ability to retrieve its image.

use crate::config::CoreConfig;
use crate::constants::GRAFFITI_FILENAME;
use crate::error::{CoreError, CoreResult};
use crate::media::MediaService;
use crate::permission::PermissionGate;
use crate::posts::PostStore;
use crate::records;
use base64::{engine::general_purpose, Engine as _};
use chrono::{DateTime, Utc};
use std::path::PathBuf;
use std::sync::Arc;

/// Required prefix for submitted drawings. Drawings are canvas exports
/// and are restricted to this single raster format.
pub const PNG_DATA_URI_PREFIX: &str = "data:image/png;base64,";

/// One stored drawing.
///
/// `attachment_id` and `image_hash` are `None` only transiently, between
/// record creation and image linkage inside [`GraffitiService::submit`];
/// a record that survives submission always has both.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct GraffitiRecord {
    pub id: u64,
    pub post_id: u64,
    /// Segment index the drawing anchors to, recomputed against the live
    /// body at render time
    pub paragraph_index: usize,
    pub title: String,
    #[serde(default)]
    pub attachment_id: Option<u64>,
    #[serde(default)]
    pub image_hash: Option<String>,
    pub submitter_ip: String,
    pub created_at: DateTime<Utc>,
}

/// Result of a successful drawing submission.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawingCreated {
    pub graffiti_id: u64,
    pub image_url: String,
}

/// File-backed store for graffiti records.
#[derive(Debug, Clone)]
pub struct GraffitiStore {
    cfg: Arc<CoreConfig>,
}

impl GraffitiStore {
    pub fn new(cfg: Arc<CoreConfig>) -> Self {
        Self { cfg }
    }

    fn base_dir(&self) -> PathBuf {
        self.cfg.graffiti_dir()
    }

    pub fn next_id(&self) -> u64 {
        records::next_id(&self.base_dir())
    }

    pub fn save(&self, record: &GraffitiRecord) -> CoreResult<()> {
        records::write_record(&self.base_dir(), record.id, GRAFFITI_FILENAME, record)
    }

    pub fn load(&self, id: u64) -> CoreResult<Option<GraffitiRecord>> {
        records::read_record(&self.base_dir(), id, GRAFFITI_FILENAME)
    }

    pub fn delete(&self, id: u64) -> CoreResult<()> {
        records::remove_record(&self.base_dir(), id)
    }

    /// Lists all drawings for a post, oldest first (creation time, then
    /// id for same-instant submissions). This is the renderer's input
    /// order, so clusters come out in submission order.
    pub fn list_for_post(&self, post_id: u64) -> CoreResult<Vec<GraffitiRecord>> {
        let mut drawings = Vec::new();

        for id in records::list_ids(&self.base_dir()) {
            match self.load(id)? {
                Some(record) if record.post_id == post_id => drawings.push(record),
                _ => {}
            }
        }

        drawings.sort_by(|a, b| (a.created_at, a.id).cmp(&(b.created_at, b.id)));
        Ok(drawings)
    }
}

/// The drawing submission pipeline.
#[derive(Debug)]
pub struct GraffitiService {
    cfg: Arc<CoreConfig>,
    posts: PostStore,
    store: GraffitiStore,
    media: MediaService,
}

impl GraffitiService {
    pub fn new(
        cfg: Arc<CoreConfig>,
        posts: PostStore,
        store: GraffitiStore,
        media: MediaService,
    ) -> Self {
        Self {
            cfg,
            posts,
            store,
            media,
        }
    }

    /// Accepts one drawing submission.
    ///
    /// Validation, in order: parent post exists (missing or unloadable
    /// parents surface as `invalid_post`), parent passes the graffiti
    /// gate, payload carries the PNG data-URI prefix, base64 body
    /// decodes, decoded size is within the configured cap. Only then is
    /// anything written.
    ///
    /// # Errors
    ///
    /// Gate failures, `Validation` codes (`invalid_post`, `invalid_image`,
    /// `decode_failed`, `image_too_large`), or `Storage` when the image
    /// cannot be persisted — in which case the already-created record has
    /// been rolled back.
    pub fn submit(
        &self,
        post_id: u64,
        paragraph_index: usize,
        image_data: &str,
        submitter_ip: &str,
    ) -> CoreResult<DrawingCreated> {
        let post = self.posts.load(post_id).map_err(|e| match e {
            CoreError::PostNotFound => CoreError::validation("invalid_post", "Invalid parent post."),
            other => other,
        })?;

        PermissionGate::ensure_graffiti(&post)?;

        let Some(encoded) = image_data.strip_prefix(PNG_DATA_URI_PREFIX) else {
            return Err(CoreError::validation("invalid_image", "Invalid image data."));
        };

        let bytes = general_purpose::STANDARD
            .decode(encoded)
            .map_err(|_| CoreError::validation("decode_failed", "Failed to decode image."))?;

        if bytes.len() as u64 > self.cfg.max_upload_bytes() {
            return Err(CoreError::validation(
                "image_too_large",
                format!(
                    "Image is too large. Maximum size is {} bytes.",
                    self.cfg.max_upload_bytes()
                ),
            ));
        }

        let graffiti_id = self.store.next_id();
        let mut record = GraffitiRecord {
            id: graffiti_id,
            post_id,
            paragraph_index,
            title: format!("Graffiti on {}", post.title),
            attachment_id: None,
            image_hash: None,
            submitter_ip: submitter_ip.to_string(),
            created_at: Utc::now(),
        };
        self.store.save(&record)?;

        let filename = format!("graffiti-{}.png", graffiti_id);
        let stored = self
            .media
            .store_image(post_id, &bytes, &filename, "image/png", submitter_ip);

        let (attachment, image_url) = match stored {
            Ok(result) => result,
            Err(submit_error) => return Err(self.rollback(graffiti_id, submit_error)),
        };

        record.attachment_id = Some(attachment.id);
        record.image_hash = Some(attachment.hash);
        if let Err(submit_error) = self.store.save(&record) {
            return Err(self.rollback(graffiti_id, submit_error));
        }

        Ok(DrawingCreated {
            graffiti_id,
            image_url,
        })
    }

    /// Deletes the partially-created record after a failed submission.
    ///
    /// If the cleanup itself fails, both errors are reported together so
    /// the orphaned record is at least visible in the logs.
    fn rollback(&self, record_id: u64, submit_error: CoreError) -> CoreError {
        tracing::error!(
            record_id,
            error = %submit_error,
            "drawing submission failed, rolling back record"
        );

        match self.store.delete(record_id) {
            Ok(()) => submit_error,
            Err(CoreError::FileDelete(cleanup_error)) => CoreError::CleanupAfterSubmitFailed {
                record_id,
                submit_error: Box::new(submit_error),
                cleanup_error,
            },
            Err(other_cleanup_error) => CoreError::CleanupAfterSubmitFailed {
                record_id,
                submit_error: Box::new(submit_error),
                cleanup_error: std::io::Error::other(other_cleanup_error.to_string()),
            },
        }
    }
}
