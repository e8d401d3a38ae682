//! Post storage.
//!
//! This module provides the content-item side of the system: the [`Post`]
//! model and the file-backed [`PostStore`]. Posts are the parent documents
//! that visitor artifacts attach to. Each post is one YAML document at
//! `<content_data_dir>/posts/<id>/post.yaml`.
//!
//! ## Pure Data Operations
//!
//! This module contains **only** data operations — no permission logic,
//! sanitisation, or HTTP concerns. Those belong in `permission`,
//! `editing`, and the `api-rest` crate respectively.

use crate::config::CoreConfig;
use crate::constants::POST_FILENAME;
use crate::error::{CoreError, CoreResult};
use crate::records;
use chrono::{DateTime, Utc};
use std::path::PathBuf;
use std::sync::Arc;

/// Content kinds that accept visitor artifacts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostKind {
    Post,
    Page,
}

/// Publication status. Only published posts accept mutations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostStatus {
    Published,
    Draft,
}

/// A stored content item.
///
/// `featured_media` is an attachment id, with 0 meaning "no featured
/// image" — the same convention the editing API exposes, so the stored
/// form and the wire form never need translating.
///
/// The two `*_enabled` flags are the per-post permission metadata checked
/// by the gate; both default to false so a post must opt in to visitor
/// mutation.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Post {
    pub id: u64,
    pub kind: PostKind,
    pub status: PostStatus,
    pub title: String,
    /// HTML body, the document the segmenter runs over.
    pub content: String,
    pub excerpt: String,
    #[serde(default)]
    pub featured_media: u64,
    #[serde(default)]
    pub categories: Vec<u64>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub editing_enabled: bool,
    #[serde(default)]
    pub graffiti_enabled: bool,
    pub created_at: DateTime<Utc>,
}

/// Fields for creating a post. Ids are allocated by the store.
#[derive(Debug, Clone)]
pub struct NewPost {
    pub kind: PostKind,
    pub status: PostStatus,
    pub title: String,
    pub content: String,
    pub excerpt: String,
    pub editing_enabled: bool,
    pub graffiti_enabled: bool,
}

/// File-backed store for posts.
#[derive(Debug, Clone)]
pub struct PostStore {
    cfg: Arc<CoreConfig>,
}

impl PostStore {
    pub fn new(cfg: Arc<CoreConfig>) -> Self {
        Self { cfg }
    }

    fn base_dir(&self) -> PathBuf {
        self.cfg.posts_dir()
    }

    /// Creates a new post with a freshly allocated id.
    pub fn create(&self, new_post: NewPost) -> CoreResult<Post> {
        let post = Post {
            id: records::next_id(&self.base_dir()),
            kind: new_post.kind,
            status: new_post.status,
            title: new_post.title,
            content: new_post.content,
            excerpt: new_post.excerpt,
            featured_media: 0,
            categories: Vec::new(),
            tags: Vec::new(),
            editing_enabled: new_post.editing_enabled,
            graffiti_enabled: new_post.graffiti_enabled,
            created_at: Utc::now(),
        };

        self.save(&post)?;
        Ok(post)
    }

    /// Loads a post by id.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::PostNotFound` when no post exists under the id.
    pub fn load(&self, id: u64) -> CoreResult<Post> {
        records::read_record(&self.base_dir(), id, POST_FILENAME)?.ok_or(CoreError::PostNotFound)
    }

    /// Writes a post back to storage, overwriting the stored record.
    ///
    /// Field updates have no history: the previous stored form is gone
    /// once this returns.
    pub fn save(&self, post: &Post) -> CoreResult<()> {
        records::write_record(&self.base_dir(), post.id, POST_FILENAME, post)
    }

    /// Reports whether a post exists under the id.
    pub fn exists(&self, id: u64) -> bool {
        records::record_dir(&self.base_dir(), id)
            .join(POST_FILENAME)
            .is_file()
    }
}
