//! Sanitisation of untrusted visitor input.
//!
//! Three levels, matching what each editable field tolerates:
//!
//! - plain text (titles, tag names): all markup stripped, whitespace
//!   collapsed to single spaces
//! - textarea text (excerpts): markup stripped, newlines preserved
//! - post content (bodies): a constrained safe-HTML subset — tag and
//!   attribute allowlists, script-scheme URLs removed, comments dropped
//!
//! Everything here is a pure function over the input string; nothing
//! reads configuration or state.

/// Tags allowed in post content, each with its tag-specific attributes.
/// Attributes in [`GLOBAL_ATTRIBUTES`] are allowed on every tag.
const ALLOWED_TAGS: &[(&str, &[&str])] = &[
    ("a", &["href", "rel", "target"]),
    ("abbr", &[]),
    ("b", &[]),
    ("blockquote", &["cite"]),
    ("br", &[]),
    ("code", &[]),
    ("del", &[]),
    ("em", &[]),
    ("figcaption", &[]),
    ("figure", &[]),
    ("h1", &[]),
    ("h2", &[]),
    ("h3", &[]),
    ("h4", &[]),
    ("h5", &[]),
    ("h6", &[]),
    ("hr", &[]),
    ("i", &[]),
    ("img", &["src", "alt", "width", "height", "loading"]),
    ("li", &[]),
    ("ol", &["start"]),
    ("p", &[]),
    ("pre", &[]),
    ("q", &["cite"]),
    ("s", &[]),
    ("span", &[]),
    ("strong", &[]),
    ("sub", &[]),
    ("sup", &[]),
    ("table", &[]),
    ("tbody", &[]),
    ("td", &["colspan", "rowspan"]),
    ("th", &["colspan", "rowspan", "scope"]),
    ("thead", &[]),
    ("tr", &[]),
    ("u", &[]),
    ("ul", &[]),
];

/// Attributes allowed on every tag in the safe subset.
const GLOBAL_ATTRIBUTES: &[&str] = &["class", "id", "title"];

/// Attributes whose values are URLs and need scheme filtering.
const URL_ATTRIBUTES: &[&str] = &["href", "src", "cite"];

/// URL schemes that execute or smuggle content and are never allowed.
const FORBIDDEN_SCHEMES: &[&str] = &["javascript:", "vbscript:", "data:"];

/// Sanitises a single-line text field: strips all markup and collapses
/// every whitespace run (including newlines) to one space.
pub fn sanitize_text_field(input: &str) -> String {
    let stripped = strip_tags(input);
    let mut out = String::with_capacity(stripped.len());
    let mut pending_space = false;

    for ch in stripped.chars() {
        if ch.is_whitespace() || ch.is_control() {
            pending_space = !out.is_empty();
        } else {
            if pending_space {
                out.push(' ');
                pending_space = false;
            }
            out.push(ch);
        }
    }

    out
}

/// Sanitises a multi-line text field: strips markup, preserves newlines,
/// collapses runs of other whitespace.
pub fn sanitize_textarea_field(input: &str) -> String {
    let stripped = strip_tags(input);
    let lines: Vec<String> = stripped
        .lines()
        .map(|line| {
            let mut out = String::with_capacity(line.len());
            let mut pending_space = false;
            for ch in line.chars() {
                if ch.is_whitespace() || ch.is_control() {
                    pending_space = !out.is_empty();
                } else {
                    if pending_space {
                        out.push(' ');
                        pending_space = false;
                    }
                    out.push(ch);
                }
            }
            out
        })
        .collect();

    lines.join("\n").trim_matches('\n').to_string()
}

/// Escapes a value for use inside a double-quoted HTML attribute.
pub fn escape_attribute(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '"' => out.push_str("&quot;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Filters post content down to the safe-HTML subset.
///
/// Disallowed tags are removed while their inner text is kept; allowed
/// tags are re-emitted lowercased with only their allowed attributes;
/// comments are dropped; stray `<` characters are entity-escaped.
pub fn sanitize_post_content(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(lt) = rest.find('<') {
        out.push_str(&rest[..lt]);
        rest = &rest[lt..];

        if rest.starts_with("<!--") {
            // Drop the comment entirely.
            match rest.find("-->") {
                Some(end) => rest = &rest[end + 3..],
                None => rest = "",
            }
            continue;
        }

        match parse_tag(rest) {
            Some(tag) => {
                if let Some(allowed_attrs) = tag_allowlist(&tag.name) {
                    emit_tag(&mut out, &tag, allowed_attrs);
                }
                rest = &rest[tag.consumed..];
            }
            None => {
                // Not a tag: escape the angle bracket and move on.
                out.push_str("&lt;");
                rest = &rest[1..];
            }
        }
    }

    out.push_str(rest);
    out
}

/// Removes all tag markup and comments, keeping text content.
pub fn strip_tags(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(lt) = rest.find('<') {
        out.push_str(&rest[..lt]);
        rest = &rest[lt..];

        if rest.starts_with("<!--") {
            match rest.find("-->") {
                Some(end) => rest = &rest[end + 3..],
                None => rest = "",
            }
            continue;
        }

        match parse_tag(rest) {
            Some(tag) => rest = &rest[tag.consumed..],
            None => {
                out.push('<');
                rest = &rest[1..];
            }
        }
    }

    out.push_str(rest);
    out
}

/// One parsed tag token.
struct ParsedTag {
    /// Lowercased element name
    name: String,
    closing: bool,
    self_closing: bool,
    /// (name, value) pairs in document order; value is `None` for bare attributes
    attributes: Vec<(String, Option<String>)>,
    /// Bytes of input consumed, including the trailing `>`
    consumed: usize,
}

/// Parses a tag starting at `input[0] == '<'`. Returns `None` when the
/// text does not form a tag (no element name, or no closing `>`).
fn parse_tag(input: &str) -> Option<ParsedTag> {
    let bytes = input.as_bytes();
    let mut i = 1;

    let closing = bytes.get(i) == Some(&b'/');
    if closing {
        i += 1;
    }

    let name_start = i;
    while i < bytes.len() && bytes[i].is_ascii_alphanumeric() {
        i += 1;
    }
    if i == name_start {
        return None;
    }
    let name = input[name_start..i].to_ascii_lowercase();

    // Find the closing '>', honouring quoted attribute values.
    let mut attributes = Vec::new();
    let mut self_closing = false;
    loop {
        while i < bytes.len() && bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        match bytes.get(i) {
            None => return None,
            Some(b'>') => {
                i += 1;
                break;
            }
            Some(b'/') => {
                self_closing = true;
                i += 1;
            }
            Some(_) => {
                let (attr, next) = parse_attribute(input, i)?;
                attributes.push(attr);
                i = next;
            }
        }
    }

    Some(ParsedTag {
        name,
        closing,
        self_closing,
        attributes,
        consumed: i,
    })
}

/// Parses one attribute at byte offset `at`. Returns the attribute and
/// the offset just past it.
fn parse_attribute(input: &str, at: usize) -> Option<((String, Option<String>), usize)> {
    let bytes = input.as_bytes();
    let mut i = at;

    let name_start = i;
    while i < bytes.len() && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'-' || bytes[i] == b'_')
    {
        i += 1;
    }
    if i == name_start {
        // Unparseable junk inside the tag; skip a byte to make progress.
        return Some(((String::new(), None), i + 1));
    }
    let name = input[name_start..i].to_ascii_lowercase();

    while i < bytes.len() && bytes[i].is_ascii_whitespace() {
        i += 1;
    }

    if bytes.get(i) != Some(&b'=') {
        return Some(((name, None), i));
    }
    i += 1;

    while i < bytes.len() && bytes[i].is_ascii_whitespace() {
        i += 1;
    }

    match bytes.get(i) {
        Some(&quote @ (b'"' | b'\'')) => {
            i += 1;
            let value_start = i;
            while i < bytes.len() && bytes[i] != quote {
                i += 1;
            }
            if i >= bytes.len() {
                return None;
            }
            let value = input[value_start..i].to_string();
            Some(((name, Some(value)), i + 1))
        }
        _ => {
            let value_start = i;
            while i < bytes.len() && !bytes[i].is_ascii_whitespace() && bytes[i] != b'>' {
                i += 1;
            }
            let value = input[value_start..i].to_string();
            Some(((name, Some(value)), i))
        }
    }
}

/// Returns the tag-specific attribute allowlist, or `None` when the tag
/// is not in the safe subset.
fn tag_allowlist(name: &str) -> Option<&'static [&'static str]> {
    ALLOWED_TAGS
        .iter()
        .find(|(tag, _)| *tag == name)
        .map(|(_, attrs)| *attrs)
}

/// Re-emits an allowed tag with filtered attributes.
fn emit_tag(out: &mut String, tag: &ParsedTag, allowed_attrs: &[&str]) {
    if tag.closing {
        out.push_str("</");
        out.push_str(&tag.name);
        out.push('>');
        return;
    }

    out.push('<');
    out.push_str(&tag.name);

    for (name, value) in &tag.attributes {
        if name.is_empty() {
            continue;
        }
        let allowed =
            allowed_attrs.contains(&name.as_str()) || GLOBAL_ATTRIBUTES.contains(&name.as_str());
        if !allowed {
            continue;
        }

        match value {
            Some(value) => {
                if URL_ATTRIBUTES.contains(&name.as_str()) && has_forbidden_scheme(value) {
                    continue;
                }
                out.push(' ');
                out.push_str(name);
                out.push_str("=\"");
                out.push_str(&escape_attribute(value));
                out.push('"');
            }
            None => {
                out.push(' ');
                out.push_str(name);
            }
        }
    }

    if tag.self_closing {
        out.push_str(" />");
    } else {
        out.push('>');
    }
}

/// Detects executable URL schemes, ignoring embedded whitespace and
/// control characters that browsers tolerate (`java\tscript:`).
fn has_forbidden_scheme(value: &str) -> bool {
    let compact: String = value
        .chars()
        .filter(|ch| !ch.is_whitespace() && !ch.is_control())
        .collect::<String>()
        .to_ascii_lowercase();

    FORBIDDEN_SCHEMES
        .iter()
        .any(|scheme| compact.starts_with(scheme))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_field_strips_markup() {
        assert_eq!(
            sanitize_text_field("A <strong>bold</strong> title"),
            "A bold title"
        );
    }

    #[test]
    fn test_text_field_collapses_whitespace() {
        assert_eq!(
            sanitize_text_field("  Title\twith\n\nbreaks  "),
            "Title with breaks"
        );
    }

    #[test]
    fn test_textarea_field_preserves_newlines() {
        assert_eq!(
            sanitize_textarea_field("Line one\nLine   two\n<em>Line</em> three"),
            "Line one\nLine two\nLine three"
        );
    }

    #[test]
    fn test_post_content_keeps_allowed_tags() {
        let input = r#"<p>Hello <strong>world</strong></p>"#;
        assert_eq!(sanitize_post_content(input), input);
    }

    #[test]
    fn test_post_content_drops_script_tags_keeps_text() {
        let input = "<p>ok</p><script>alert('x')</script>";
        assert_eq!(sanitize_post_content(input), "<p>ok</p>alert('x')");
    }

    #[test]
    fn test_post_content_filters_attributes() {
        let input = r#"<p onclick="steal()" class="lede">Hi</p>"#;
        assert_eq!(sanitize_post_content(input), r#"<p class="lede">Hi</p>"#);
    }

    #[test]
    fn test_post_content_drops_javascript_urls() {
        let input = r#"<a href="javascript:alert(1)" title="x">link</a>"#;
        assert_eq!(sanitize_post_content(input), r#"<a title="x">link</a>"#);

        let sneaky = "<a href=\"java\tscript:alert(1)\">link</a>";
        assert_eq!(sanitize_post_content(sneaky), "<a>link</a>");
    }

    #[test]
    fn test_post_content_keeps_http_urls() {
        let input = r#"<a href="https://example.com/page">link</a>"#;
        assert_eq!(sanitize_post_content(input), input);
    }

    #[test]
    fn test_post_content_drops_comments() {
        assert_eq!(
            sanitize_post_content("<p>a</p><!-- hidden --><p>b</p>"),
            "<p>a</p><p>b</p>"
        );
    }

    #[test]
    fn test_post_content_escapes_stray_angle_bracket() {
        assert_eq!(sanitize_post_content("2 < 3"), "2 &lt; 3");
    }

    #[test]
    fn test_post_content_lowercases_tags() {
        assert_eq!(
            sanitize_post_content("<P>Shouty</P>"),
            "<p>Shouty</p>"
        );
    }

    #[test]
    fn test_post_content_preserves_self_closing_img() {
        let input = r#"<img src="https://example.com/a.png" alt="a" />"#;
        assert_eq!(sanitize_post_content(input), input);
    }

    #[test]
    fn test_strip_tags_handles_unclosed_tag() {
        assert_eq!(strip_tags("before <p unclosed"), "before <p unclosed");
    }
}
