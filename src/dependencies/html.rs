//! Small HTML helpers used by the aggregator.
//!
//! These operate on tag strings and raw bytes, not on a parsed DOM. Media tags are
//! generated by this crate or written by component authors as single elements, so
//! attribute lookup with a strict pattern is enough.

use regex::Regex;
use regex::bytes::Regex as BytesRegex;
use std::sync::LazyLock;

use super::ScriptKind;

static TAG_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*<\s*([A-Za-z][A-Za-z0-9\-]*)").expect("tag name regex is valid"));

static HEAD_CLOSE_RE: LazyLock<BytesRegex> =
    LazyLock::new(|| BytesRegex::new(r"(?i)</head\s*>").expect("head regex is valid"));

static BODY_CLOSE_RE: LazyLock<BytesRegex> =
    LazyLock::new(|| BytesRegex::new(r"(?i)</body\s*>").expect("body regex is valid"));

static SRC_ATTR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)[\s<]src\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'>]+))"#).expect("src regex is valid")
});

static HREF_ATTR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)[\s<]href\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'>]+))"#).expect("href regex is valid")
});

/// URL attribute of a media tag (`src` for scripts, `href` for stylesheets), if present
/// and non-empty.
///
/// Only the opening tag is searched. Handles double-quoted, single-quoted and unquoted
/// values.
pub fn url_attribute(tag: &str, kind: ScriptKind) -> Option<String> {
    let re = match kind {
        ScriptKind::Js => &*SRC_ATTR_RE,
        ScriptKind::Css => &*HREF_ATTR_RE,
    };
    let caps = re.captures(opening_tag(tag))?;
    let value = caps.get(1).or_else(|| caps.get(2)).or_else(|| caps.get(3))?.as_str();
    if value.is_empty() { None } else { Some(value.to_string()) }
}

/// Name of the first element in `tag`, lowercased.
pub fn tag_name(tag: &str) -> String {
    TAG_NAME_RE
        .captures(tag)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_ascii_lowercase())
        .unwrap_or_default()
}

fn opening_tag(tag: &str) -> &str {
    match tag.find('>') {
        Some(end) => &tag[..=end],
        None => tag,
    }
}

/// Where to insert content when a placeholder is missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Location {
    /// Just before `</head>`.
    HeadEnd,
    /// Just before `</body>`.
    BodyEnd,
}

/// Insert `insertion` before the closing tag for `location`.
///
/// Returns `None` when the document has no such closing tag.
pub fn insert_at(content: &[u8], insertion: &[u8], location: Location) -> Option<Vec<u8>> {
    let re = match location {
        Location::HeadEnd => &*HEAD_CLOSE_RE,
        Location::BodyEnd => &*BODY_CLOSE_RE,
    };
    // Last occurrence, so a stray `</head>` inside an inlined string earlier on does not win.
    let found = re.find_iter(content).last()?;

    let mut out = Vec::with_capacity(content.len() + insertion.len());
    out.extend_from_slice(&content[..found.start()]);
    out.extend_from_slice(insertion);
    out.extend_from_slice(&content[found.start()..]);
    Some(out)
}

/// Byte-level substring search.
pub fn find_bytes(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || needle.len() > haystack.len() {
        return None;
    }
    haystack.windows(needle.len()).position(|window| window == needle)
}

/// Replace the first `needle` with `replacement` and remove any later occurrences.
///
/// Returns the new content and whether `needle` was present at all.
pub fn replace_first_remove_rest(
    content: &[u8],
    needle: &[u8],
    replacement: &[u8],
) -> (Vec<u8>, bool) {
    let Some(first) = find_bytes(content, needle) else {
        return (content.to_vec(), false);
    };

    let mut out = Vec::with_capacity(content.len() + replacement.len());
    out.extend_from_slice(&content[..first]);
    out.extend_from_slice(replacement);

    let mut rest = &content[first + needle.len()..];
    while let Some(next) = find_bytes(rest, needle) {
        out.extend_from_slice(&rest[..next]);
        rest = &rest[next + needle.len()..];
    }
    out.extend_from_slice(rest);
    (out, true)
}
