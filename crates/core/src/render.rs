//! Re-assembly of post bodies with visitor artifacts interleaved.
//!
//! The renderer is the read side of the anchoring model: it re-runs the
//! segmenter over the *current* stored body, then walks the segments in
//! order, emitting each drawing cluster immediately before the block it
//! anchors to. Index `block_count` (and anything beyond it, which can
//! happen after the body shrinks) renders after the final block.
//!
//! Composition order for a full page render is fixed: graffiti clusters
//! are interleaved into the raw body first, then block wrappers for the
//! editing overlay are applied — cluster markup is spacing to the
//! wrapper pass, so blocks keep their indices either way.

use crate::config::CoreConfig;
use crate::graffiti::GraffitiRecord;
use crate::posts::Post;
use crate::sanitize::escape_attribute;
use crate::segment::{block_count, segment, Segment};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Renders post bodies with clusters and editing wrappers.
#[derive(Debug, Clone)]
pub struct Renderer {
    cfg: Arc<CoreConfig>,
}

impl Renderer {
    pub fn new(cfg: Arc<CoreConfig>) -> Self {
        Self { cfg }
    }

    /// Full page render for a post: graffiti interleave (unless the
    /// global kill-switch is off), then editing wrappers when the post
    /// has editing enabled.
    pub fn render_page(&self, post: &Post, drawings: &[GraffitiRecord]) -> String {
        let html = if self.cfg.graffiti_enabled() {
            self.inject_graffiti(&post.content, drawings)
        } else {
            post.content.clone()
        };

        if post.editing_enabled {
            self.wrap_blocks(&html)
        } else {
            html
        }
    }

    /// Interleaves drawing clusters into a body.
    ///
    /// `drawings` must already be in submission order (oldest first), as
    /// [`GraffitiStore::list_for_post`](crate::graffiti::GraffitiStore::list_for_post)
    /// returns them; grouping preserves that order within each cluster.
    pub fn inject_graffiti(&self, body: &str, drawings: &[GraffitiRecord]) -> String {
        if drawings.is_empty() {
            return body.to_string();
        }

        let segments = segment(body);
        let last_position = block_count(&segments);

        // Group by anchor, clamping stale out-of-range anchors to the
        // after-last position rather than dropping them.
        let mut clusters: BTreeMap<usize, Vec<&GraffitiRecord>> = BTreeMap::new();
        for drawing in drawings {
            let position = drawing.paragraph_index.min(last_position);
            clusters.entry(position).or_default().push(drawing);
        }

        let mut output = String::with_capacity(body.len());
        for part in &segments {
            match part {
                Segment::Block { index, html, .. } => {
                    if let Some(cluster) = clusters.get(index) {
                        output.push_str(&self.render_cluster(*index, cluster));
                    }
                    output.push_str(html);
                }
                Segment::Spacing { html } => output.push_str(html),
            }
        }

        if let Some(cluster) = clusters.get(&last_position) {
            output.push_str(&self.render_cluster(last_position, cluster));
        }

        output
    }

    /// Wraps each block-level segment in an editing container carrying
    /// its index, leaving spacing untouched.
    pub fn wrap_blocks(&self, body: &str) -> String {
        let segments = segment(body);
        let mut output = String::with_capacity(body.len());

        for part in &segments {
            match part {
                Segment::Block { tag, index, html } => {
                    output.push_str(&format!(
                        "<div class=\"editable-block\" data-block-index=\"{}\" data-block-tag=\"{}\">{}</div>",
                        index,
                        escape_attribute(tag),
                        html
                    ));
                }
                Segment::Spacing { html } => output.push_str(html),
            }
        }

        output
    }

    /// Renders one cluster: a single container for all drawings sharing
    /// an anchor, one item per drawing. Drawings whose image never got
    /// linked (which submission rollback prevents) are skipped.
    fn render_cluster(&self, position: usize, drawings: &[&GraffitiRecord]) -> String {
        let mut html = format!(
            "<div class=\"graffiti-cluster\" data-paragraph=\"{}\">",
            position
        );

        for drawing in drawings {
            let Some(hash) = drawing.image_hash.as_deref() else {
                continue;
            };
            let url = format!("{}/media/{}", self.cfg.public_base_url(), hash);
            html.push_str(&format!(
                "<div class=\"graffiti-item\"><img src=\"{}\" alt=\"Visitor graffiti\" loading=\"lazy\" /></div>",
                escape_attribute(&url)
            ));
        }

        html.push_str("</div>");
        html
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::DEFAULT_MAX_UPLOAD_BYTES;
    use crate::posts::{PostKind, PostStatus};
    use chrono::{TimeZone, Utc};

    fn renderer(graffiti_enabled: bool) -> Renderer {
        let cfg = CoreConfig::new(
            "content".into(),
            "media".into(),
            "http://localhost:3000".into(),
            DEFAULT_MAX_UPLOAD_BYTES,
            graffiti_enabled,
        )
        .unwrap();
        Renderer::new(Arc::new(cfg))
    }

    fn drawing(id: u64, paragraph_index: usize) -> GraffitiRecord {
        GraffitiRecord {
            id,
            post_id: 1,
            paragraph_index,
            title: "Graffiti on Test".into(),
            attachment_id: Some(id),
            image_hash: Some(format!("{:064x}", id)),
            submitter_ip: "203.0.113.1".into(),
            created_at: Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, id as u32).unwrap(),
        }
    }

    fn test_post(content: &str, editing_enabled: bool) -> Post {
        Post {
            id: 1,
            kind: PostKind::Post,
            status: PostStatus::Published,
            title: "Test".into(),
            content: content.into(),
            excerpt: String::new(),
            featured_media: 0,
            categories: Vec::new(),
            tags: Vec::new(),
            editing_enabled,
            graffiti_enabled: true,
            created_at: Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_no_drawings_returns_body_unchanged() {
        let body = "<p>a</p><p>b</p>";
        assert_eq!(renderer(true).inject_graffiti(body, &[]), body);
    }

    #[test]
    fn test_cluster_before_anchored_block() {
        let body = "<p>zero</p><p>one</p>";
        let output = renderer(true).inject_graffiti(body, &[drawing(1, 1)]);

        let cluster_at = output.find("graffiti-cluster").unwrap();
        let block_one_at = output.find("<p>one</p>").unwrap();
        assert!(output.starts_with("<p>zero</p>"));
        assert!(cluster_at < block_one_at);
        assert!(output.contains("data-paragraph=\"1\""));
    }

    #[test]
    fn test_two_drawings_same_index_share_one_cluster() {
        let body = "<p>a</p><p>b</p><p>c</p>";
        let output = renderer(true).inject_graffiti(body, &[drawing(1, 2), drawing(2, 2)]);

        assert_eq!(output.matches("graffiti-cluster").count(), 1);
        assert_eq!(output.matches("graffiti-item").count(), 2);

        // Submission order within the cluster.
        let first = output.find(&format!("{:064x}", 1u64)).unwrap();
        let second = output.find(&format!("{:064x}", 2u64)).unwrap();
        assert!(first < second);
    }

    #[test]
    fn test_after_last_position() {
        let body = "<p>a</p><p>b</p>";
        let output = renderer(true).inject_graffiti(body, &[drawing(1, 2)]);

        assert!(output.starts_with("<p>a</p><p>b</p>"));
        assert!(output.ends_with("</div>"));
        assert!(output.contains("data-paragraph=\"2\""));
    }

    #[test]
    fn test_stale_anchor_clamps_to_after_last() {
        // Anchored at index 9 of a two-block body: rendered after the
        // last block instead of disappearing.
        let body = "<p>a</p><p>b</p>";
        let output = renderer(true).inject_graffiti(body, &[drawing(1, 9)]);

        assert!(output.contains("data-paragraph=\"2\""));
        assert_eq!(output.matches("graffiti-cluster").count(), 1);
    }

    #[test]
    fn test_empty_body_collapses_to_position_zero() {
        let output = renderer(true).inject_graffiti("", &[drawing(1, 5)]);

        assert!(output.starts_with("<div class=\"graffiti-cluster\" data-paragraph=\"0\">"));
    }

    #[test]
    fn test_spacing_preserved_around_clusters() {
        let body = "<p>a</p>\n\n<p>b</p>";
        let output = renderer(true).inject_graffiti(body, &[drawing(1, 1)]);

        assert!(output.contains("</p>\n\n<div class=\"graffiti-cluster\""));
    }

    #[test]
    fn test_wrap_blocks_indices_and_tags() {
        let body = "<p>a</p><h2>b</h2>";
        let output = renderer(true).wrap_blocks(body);

        assert!(output.contains(
            "<div class=\"editable-block\" data-block-index=\"0\" data-block-tag=\"p\"><p>a</p></div>"
        ));
        assert!(output.contains(
            "<div class=\"editable-block\" data-block-index=\"1\" data-block-tag=\"h2\"><h2>b</h2></div>"
        ));
    }

    #[test]
    fn test_wrap_blocks_leaves_spacing_unwrapped() {
        let body = "<p>a</p>\n<div>aside</div>\n<p>b</p>";
        let output = renderer(true).wrap_blocks(body);

        assert!(output.contains("\n<div>aside</div>\n"));
        assert_eq!(output.matches("editable-block").count(), 2);
    }

    #[test]
    fn test_render_page_kill_switch_off() {
        let post = test_post("<p>a</p>", false);
        let output = renderer(false).render_page(&post, &[drawing(1, 0)]);

        assert_eq!(output, "<p>a</p>");
    }

    #[test]
    fn test_render_page_composes_clusters_then_wrappers() {
        let post = test_post("<p>a</p><p>b</p>", true);
        let output = renderer(true).render_page(&post, &[drawing(1, 1)]);

        // Cluster present, blocks wrapped, cluster not wrapped.
        assert_eq!(output.matches("graffiti-cluster").count(), 1);
        assert_eq!(output.matches("editable-block").count(), 2);
        assert!(!output.contains("editable-block\" data-block-index=\"0\" data-block-tag=\"div"));

        // The cluster stays between the two wrapped blocks.
        let cluster_at = output.find("graffiti-cluster").unwrap();
        let block_b_at = output.find("<p>b</p>").unwrap();
        assert!(cluster_at < block_b_at);
    }
}
