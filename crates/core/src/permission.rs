//! The permission gate guarding all mutation endpoints.
//!
//! A visitor mutation is permitted only when the target post exists, is
//! published, and carries the relevant opt-in flag. Each failing condition
//! yields a distinct typed error so the transport layer can surface
//! distinct statuses (404 vs 403) and machine codes — callers need to
//! tell "gone" apart from "not allowed" for correct UI messaging.

use crate::error::{CoreError, CoreResult};
use crate::posts::{Post, PostStatus, PostStore};

/// Checks the per-post permission flags ahead of any mutation.
#[derive(Debug, Clone)]
pub struct PermissionGate {
    posts: PostStore,
}

impl PermissionGate {
    pub fn new(posts: PostStore) -> Self {
        Self { posts }
    }

    /// Loads the post and verifies it accepts visitor field edits and
    /// uploads.
    ///
    /// # Errors
    ///
    /// - `CoreError::PostNotFound` — no such post
    /// - `CoreError::PostNotPublished` — exists but not published
    /// - `CoreError::EditingNotEnabled` — published but not opted in
    pub fn check_editing(&self, post_id: u64) -> CoreResult<Post> {
        let post = self.posts.load(post_id)?;
        Self::ensure_editable(&post)?;
        Ok(post)
    }

    /// Loads the post and verifies it accepts graffiti submissions.
    ///
    /// # Errors
    ///
    /// As [`check_editing`](Self::check_editing), with
    /// `CoreError::GraffitiNotEnabled` for the missing flag.
    pub fn check_graffiti(&self, post_id: u64) -> CoreResult<Post> {
        let post = self.posts.load(post_id)?;
        Self::ensure_graffiti(&post)?;
        Ok(post)
    }

    /// Verifies an already-loaded post accepts visitor field edits.
    pub fn ensure_editable(post: &Post) -> CoreResult<()> {
        if post.status != PostStatus::Published {
            return Err(CoreError::PostNotPublished);
        }
        if !post.editing_enabled {
            return Err(CoreError::EditingNotEnabled);
        }
        Ok(())
    }

    /// Verifies an already-loaded post accepts graffiti submissions.
    pub fn ensure_graffiti(post: &Post) -> CoreResult<()> {
        if post.status != PostStatus::Published {
            return Err(CoreError::PostNotPublished);
        }
        if !post.graffiti_enabled {
            return Err(CoreError::GraffitiNotEnabled);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CoreConfig;
    use crate::constants::DEFAULT_MAX_UPLOAD_BYTES;
    use crate::posts::{NewPost, PostKind};
    use std::sync::Arc;
    use tempfile::TempDir;

    fn gate_with_post(temp: &TempDir, status: PostStatus, editing: bool, graffiti: bool) -> (PermissionGate, u64) {
        let cfg = CoreConfig::new(
            temp.path().join("content"),
            temp.path().join("media"),
            "http://localhost:3000".into(),
            DEFAULT_MAX_UPLOAD_BYTES,
            true,
        )
        .unwrap();
        let posts = PostStore::new(Arc::new(cfg));
        let post = posts
            .create(NewPost {
                kind: PostKind::Post,
                status,
                title: "Gated".into(),
                content: "<p>Body.</p>".into(),
                excerpt: String::new(),
                editing_enabled: editing,
                graffiti_enabled: graffiti,
            })
            .unwrap();
        (PermissionGate::new(posts), post.id)
    }

    #[test]
    fn test_editing_allowed() {
        let temp = TempDir::new().unwrap();
        let (gate, id) = gate_with_post(&temp, PostStatus::Published, true, false);

        let post = gate.check_editing(id).unwrap();
        assert_eq!(post.id, id);
    }

    #[test]
    fn test_missing_post_is_not_found() {
        let temp = TempDir::new().unwrap();
        let (gate, _) = gate_with_post(&temp, PostStatus::Published, true, true);

        assert!(matches!(
            gate.check_editing(99999),
            Err(CoreError::PostNotFound)
        ));
        assert!(matches!(
            gate.check_graffiti(99999),
            Err(CoreError::PostNotFound)
        ));
    }

    #[test]
    fn test_draft_post_is_rejected() {
        let temp = TempDir::new().unwrap();
        let (gate, id) = gate_with_post(&temp, PostStatus::Draft, true, true);

        assert!(matches!(
            gate.check_editing(id),
            Err(CoreError::PostNotPublished)
        ));
        assert!(matches!(
            gate.check_graffiti(id),
            Err(CoreError::PostNotPublished)
        ));
    }

    #[test]
    fn test_flag_off_is_forbidden() {
        let temp = TempDir::new().unwrap();
        let (gate, id) = gate_with_post(&temp, PostStatus::Published, false, false);

        assert!(matches!(
            gate.check_editing(id),
            Err(CoreError::EditingNotEnabled)
        ));
        assert!(matches!(
            gate.check_graffiti(id),
            Err(CoreError::GraffitiNotEnabled)
        ));
    }

    #[test]
    fn test_flags_are_independent() {
        let temp = TempDir::new().unwrap();
        let (gate, id) = gate_with_post(&temp, PostStatus::Published, false, true);

        assert!(gate.check_graffiti(id).is_ok());
        assert!(matches!(
            gate.check_editing(id),
            Err(CoreError::EditingNotEnabled)
        ));
    }
}
