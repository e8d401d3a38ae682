//! # Mural Core
//!
//! Core business logic for the mural visitor annotation service.
//!
//! This crate contains pure data operations and content handling:
//! - Post, attachment, and graffiti record storage (YAML documents under
//!   `CONTENT_DATA_DIR`)
//! - The permission gate guarding all visitor mutations
//! - Body segmentation, sanitisation, and artifact-interleaved rendering
//! - The drawing submission pipeline with compensating rollback
//!
//! **No API concerns**: HTTP routing, request contexts, multipart parsing,
//! and response envelopes belong in `api-rest`.

pub mod config;
pub mod constants;
pub mod editing;
pub mod error;
pub mod graffiti;
pub mod media;
pub mod permission;
pub mod posts;
mod records;
pub mod render;
pub mod sanitize;
pub mod segment;

pub use config::CoreConfig;
pub use constants::{DEFAULT_CONTENT_DATA_DIR, DEFAULT_MEDIA_DATA_DIR};
pub use editing::{EditingService, PostUpdate, UpdatedPost};
pub use error::{CoreError, CoreResult};
pub use graffiti::{DrawingCreated, GraffitiRecord, GraffitiService, GraffitiStore};
pub use media::{Attachment, MediaService, ALLOWED_UPLOAD_TYPES};
pub use mural_files::FilesError;
pub use mural_types::NonEmptyText;
pub use permission::PermissionGate;
pub use posts::{NewPost, Post, PostKind, PostStatus, PostStore};
pub use render::Renderer;
