//! The content segmenter.
//!
//! Splits an HTML body into an ordered sequence of segments: block-level
//! units (paragraphs, headings, lists, quotes, figures) that receive
//! consecutive zero-based indices, and spacing runs between them that are
//! rendered but never counted. Drawings anchor to these indices, so the
//! scan must be deterministic and re-entrant — identical input always
//! yields identical segmentation.
//!
//! Indices are recomputed from the live body on every render and are only
//! stable while the block structure is unchanged. Edits that add or
//! remove blocks shift downstream anchors to different visual positions;
//! that drift is an accepted property of the model, not something this
//! module compensates for.

/// The fixed set of block-level element names that receive indices.
pub const BLOCK_TAGS: [&str; 11] = [
    "p",
    "h1",
    "h2",
    "h3",
    "h4",
    "h5",
    "h6",
    "ul",
    "ol",
    "blockquote",
    "figure",
];

/// One segment of a content body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// A counted block-level unit.
    Block {
        /// Lowercased element name (always one of [`BLOCK_TAGS`])
        tag: String,
        /// Zero-based position among the body's blocks
        index: usize,
        /// The block's full markup, opening tag through closing tag
        html: String,
    },
    /// Uncounted content between blocks: whitespace, comments, markup
    /// outside the block-tag set.
    Spacing { html: String },
}

impl Segment {
    /// Returns the segment's markup regardless of kind.
    pub fn html(&self) -> &str {
        match self {
            Segment::Block { html, .. } => html,
            Segment::Spacing { html } => html,
        }
    }
}

/// Splits `body` into segments.
///
/// Insertion points for artifacts are defined over the result: "before
/// block `i`" for `i` in `0..block_count`, and `block_count` itself for
/// "after the last block". An empty body yields no segments and the two
/// implicit positions collapse to index 0.
pub fn segment(body: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut index = 0;
    let mut cursor = 0;
    let mut spacing_start = 0;

    while let Some(offset) = body[cursor..].find('<') {
        let tag_start = cursor + offset;

        let Some(tag) = block_tag_at(body, tag_start) else {
            cursor = tag_start + 1;
            continue;
        };

        let block_end = find_block_end(body, tag_start, &tag);

        if tag_start > spacing_start {
            segments.push(Segment::Spacing {
                html: body[spacing_start..tag_start].to_string(),
            });
        }

        segments.push(Segment::Block {
            tag,
            index,
            html: body[tag_start..block_end].to_string(),
        });
        index += 1;

        cursor = block_end;
        spacing_start = block_end;
    }

    if spacing_start < body.len() {
        segments.push(Segment::Spacing {
            html: body[spacing_start..].to_string(),
        });
    }

    segments
}

/// Returns the number of counted blocks in a segmentation.
pub fn block_count(segments: &[Segment]) -> usize {
    segments
        .iter()
        .filter(|segment| matches!(segment, Segment::Block { .. }))
        .count()
}

/// If an opening block-level tag starts at `at`, returns its lowercased
/// name.
fn block_tag_at(body: &str, at: usize) -> Option<String> {
    let bytes = body.as_bytes();
    debug_assert_eq!(bytes[at], b'<');

    let mut i = at + 1;
    if bytes.get(i) == Some(&b'/') {
        return None;
    }

    let name_start = i;
    while i < bytes.len() && bytes[i].is_ascii_alphanumeric() {
        i += 1;
    }
    if i == name_start {
        return None;
    }

    // The name must end at whitespace, '>', or '/': "<ulx>" is not "<ul>".
    match bytes.get(i) {
        Some(b) if b.is_ascii_whitespace() || *b == b'>' || *b == b'/' => {}
        _ => return None,
    }

    let name = body[name_start..i].to_ascii_lowercase();
    if BLOCK_TAGS.contains(&name.as_str()) {
        Some(name)
    } else {
        None
    }
}

/// Finds the byte offset just past the closing tag matching the block
/// that opens at `open_at`, counting nested occurrences of the same
/// element (a blockquote within a blockquote). An unclosed block runs to
/// the end of the body.
fn find_block_end(body: &str, open_at: usize, tag: &str) -> usize {
    let mut depth = 0usize;
    let mut cursor = open_at;

    while let Some(offset) = body[cursor..].find('<') {
        let at = cursor + offset;
        let rest = &body[at..];

        if starts_with_tag(rest, tag, true) {
            // Closing tag.
            let close_end = match rest.find('>') {
                Some(gt) => at + gt + 1,
                None => body.len(),
            };
            depth = depth.saturating_sub(1);
            if depth == 0 {
                return close_end;
            }
            cursor = close_end;
        } else if starts_with_tag(rest, tag, false) {
            depth += 1;
            cursor = at + 1;
        } else {
            cursor = at + 1;
        }
    }

    body.len()
}

/// Tests whether `rest` begins with an opening or closing tag of `name`,
/// ASCII case-insensitively, with a proper name boundary after it.
fn starts_with_tag(rest: &str, name: &str, closing: bool) -> bool {
    let bytes = rest.as_bytes();
    let mut i = 0;

    if bytes.get(i) != Some(&b'<') {
        return false;
    }
    i += 1;

    if closing {
        if bytes.get(i) != Some(&b'/') {
            return false;
        }
        i += 1;
    } else if bytes.get(i) == Some(&b'/') {
        return false;
    }

    for expected in name.bytes() {
        match bytes.get(i) {
            Some(b) if b.to_ascii_lowercase() == expected => i += 1,
            _ => return false,
        }
    }

    match bytes.get(i) {
        None => false,
        Some(b) => b.is_ascii_whitespace() || *b == b'>' || *b == b'/',
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blocks(segments: &[Segment]) -> Vec<(usize, String)> {
        segments
            .iter()
            .filter_map(|segment| match segment {
                Segment::Block { index, tag, .. } => Some((*index, tag.clone())),
                Segment::Spacing { .. } => None,
            })
            .collect()
    }

    #[test]
    fn test_consecutive_indices_in_document_order() {
        let body = "<p>one</p>\n<h2>two</h2>\n<ul><li>three</li></ul>";
        let segments = segment(body);

        assert_eq!(
            blocks(&segments),
            vec![(0, "p".into()), (1, "h2".into()), (2, "ul".into())]
        );
        assert_eq!(block_count(&segments), 3);
    }

    #[test]
    fn test_spacing_is_rendered_but_not_counted() {
        let body = "<p>a</p>\n\n<p>b</p>";
        let segments = segment(body);

        assert_eq!(segments.len(), 3);
        assert_eq!(segments[1], Segment::Spacing { html: "\n\n".into() });
        assert_eq!(block_count(&segments), 2);
    }

    #[test]
    fn test_reassembly_is_lossless() {
        let body = "intro text <p>a</p><div>aside</div><blockquote>q</blockquote> tail";
        let segments = segment(body);

        let reassembled: String = segments.iter().map(Segment::html).collect();
        assert_eq!(reassembled, body);
    }

    #[test]
    fn test_determinism() {
        let body = "<p>a</p><h3>b</h3><figure><img src=\"x.png\" /></figure>";
        assert_eq!(segment(body), segment(body));
    }

    #[test]
    fn test_empty_document() {
        assert!(segment("").is_empty());
        assert_eq!(block_count(&segment("")), 0);
    }

    #[test]
    fn test_document_without_blocks() {
        let body = "<div>just a div</div> and text";
        let segments = segment(body);

        assert_eq!(block_count(&segments), 0);
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0], Segment::Spacing { html: body.into() });
    }

    #[test]
    fn test_nested_same_tag_matches_outer_close() {
        let body = "<blockquote>outer<blockquote>inner</blockquote>still outer</blockquote><p>after</p>";
        let segments = segment(body);

        assert_eq!(block_count(&segments), 2);
        match &segments[0] {
            Segment::Block { tag, html, .. } => {
                assert_eq!(tag, "blockquote");
                assert!(html.ends_with("still outer</blockquote>"));
            }
            other => panic!("expected block, got {:?}", other),
        }
    }

    #[test]
    fn test_attributes_and_case_are_tolerated() {
        let body = "<P class=\"lede\">caps</P><UL><li>x</li></UL>";
        let segments = segment(body);

        assert_eq!(
            blocks(&segments),
            vec![(0, "p".into()), (1, "ul".into())]
        );
    }

    #[test]
    fn test_prefix_tag_names_do_not_count() {
        // <ulx> shares a prefix with <ul> but is not a block tag.
        let body = "<ulx>custom</ulx><p>real</p>";
        let segments = segment(body);

        assert_eq!(blocks(&segments), vec![(0, "p".into())]);
    }

    #[test]
    fn test_unclosed_block_runs_to_end() {
        let body = "<p>never closed";
        let segments = segment(body);

        assert_eq!(block_count(&segments), 1);
        assert_eq!(segments[0].html(), body);
    }

    #[test]
    fn test_blocks_nested_in_wrappers_still_count() {
        // Blocks inside non-block wrappers are found, matching the
        // original's scan-anywhere behaviour.
        let body = "<div class=\"wrap\"><p>inner</p></div>";
        let segments = segment(body);

        assert_eq!(blocks(&segments), vec![(0, "p".into())]);
    }
}
