//! Visitor field editing.
//!
//! Applies a partial update to a post's editable fields. Every field is
//! optional: absent fields are left untouched, present fields are
//! sanitised per their type and overwritten in place (no history). The
//! featured-image semantics are exact: an absent `featured_media` key
//! leaves the image unchanged, while a present key with value 0 (or any
//! falsy coercion) explicitly removes it.

use crate::error::CoreResult;
use crate::posts::{Post, PostStore};
use crate::sanitize::{sanitize_post_content, sanitize_text_field, sanitize_textarea_field};

/// A partial set of editable fields.
///
/// Numeric ids arrive as signed integers and are coerced non-negative
/// (absolute value), matching the original API's tolerant coercion.
#[derive(Debug, Clone, Default, serde::Deserialize)]
pub struct PostUpdate {
    pub title: Option<String>,
    pub content: Option<String>,
    pub excerpt: Option<String>,
    pub featured_media: Option<i64>,
    pub categories: Option<Vec<i64>>,
    pub tags: Option<Vec<String>>,
}

/// The post-update canonical representation of all editable fields.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct UpdatedPost {
    pub id: u64,
    pub title: String,
    pub content: String,
    pub excerpt: String,
    pub featured_media: u64,
    pub categories: Vec<u64>,
    pub tags: Vec<String>,
}

impl UpdatedPost {
    fn from_post(post: &Post) -> Self {
        Self {
            id: post.id,
            title: post.title.clone(),
            content: post.content.clone(),
            excerpt: post.excerpt.clone(),
            featured_media: post.featured_media,
            categories: post.categories.clone(),
            tags: post.tags.clone(),
        }
    }
}

/// Applies partial field updates to posts.
#[derive(Debug, Clone)]
pub struct EditingService {
    posts: PostStore,
}

impl EditingService {
    pub fn new(posts: PostStore) -> Self {
        Self { posts }
    }

    /// Applies `update` to an already-gated post and persists it.
    ///
    /// The caller is responsible for running the permission gate first;
    /// this method only sanitises, mutates, and saves.
    ///
    /// # Errors
    ///
    /// Returns storage errors from writing the post record.
    pub fn apply(&self, mut post: Post, update: PostUpdate) -> CoreResult<UpdatedPost> {
        if let Some(title) = update.title {
            post.title = sanitize_text_field(&title);
        }

        if let Some(content) = update.content {
            post.content = sanitize_post_content(&content);
        }

        if let Some(excerpt) = update.excerpt {
            post.excerpt = sanitize_textarea_field(&excerpt);
        }

        if let Some(featured_media) = update.featured_media {
            // Present key: non-zero sets, zero removes. An absent key
            // never reaches here.
            post.featured_media = featured_media.unsigned_abs();
        }

        if let Some(categories) = update.categories {
            post.categories = categories.iter().map(|id| id.unsigned_abs()).collect();
        }

        if let Some(tags) = update.tags {
            post.tags = tags
                .iter()
                .map(|tag| sanitize_text_field(tag))
                .filter(|tag| !tag.is_empty())
                .collect();
        }

        self.posts.save(&post)?;
        Ok(UpdatedPost::from_post(&post))
    }
}
