//! Dependency markers embedded in rendered HTML.
//!
//! Every rendered component is prefixed with `<!-- _RENDERED {class_hash},{component_id} -->`.
//! Markers survive nesting because the rendered HTML is never escaped again, and their
//! left-to-right order in the final document is the order of first appearance.

use regex::bytes::Regex;
use std::sync::{Arc, LazyLock};

use super::registry::ClassRegistry;
use crate::component::ComponentClass;
use crate::constants::{COMPONENT_DEPS_COMMENT_PREFIX, COMPONENT_DEPS_COMMENT_SUFFIX};
use crate::core::ComponentError;

/// Loose match for the comment itself; the payload is validated separately.
static MARKER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<!-- _RENDERED (?P<data>[\w\-,/\.]+?) -->").expect("marker regex is valid")
});

static MARKER_DATA_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<comp_cls_hash>[\w\-\./]+?),(?P<id>[\w]+?)$")
        .expect("marker data regex is valid")
});

/// A `(class_hash, component_id)` pair recovered from a marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Marker {
    /// Opaque hash of the component class.
    pub class_hash: String,
    /// Id of the rendered instance.
    pub component_id: String,
}

/// Prepend the marker for `class`/`component_id` to `html` and register the class.
pub fn embed_marker(
    registry: &ClassRegistry,
    class: &Arc<ComponentClass>,
    component_id: &str,
    html: &str,
) -> String {
    registry.register(class);
    format!(
        "{COMPONENT_DEPS_COMMENT_PREFIX}{},{component_id}{COMPONENT_DEPS_COMMENT_SUFFIX}{html}",
        class.class_hash()
    )
}

/// Find all markers in order of appearance and return the content with markers removed.
///
/// # Errors
///
/// [`ComponentError::MalformedMarker`] if a comment looks like a marker but its payload
/// is not exactly `{class_hash},{component_id}`.
pub fn extract_markers(content: &[u8]) -> Result<(Vec<u8>, Vec<Marker>), ComponentError> {
    let mut markers = Vec::new();

    for caps in MARKER_RE.captures_iter(content) {
        let data = &caps["data"];
        let parsed = MARKER_DATA_RE
            .captures(data)
            .ok_or_else(|| ComponentError::MalformedMarker {
                data: String::from_utf8_lossy(data).into_owned(),
            })?;

        markers.push(Marker {
            class_hash: String::from_utf8_lossy(&parsed["comp_cls_hash"]).into_owned(),
            component_id: String::from_utf8_lossy(&parsed["id"]).into_owned(),
        });
    }

    let stripped = MARKER_RE.replace_all(content, &b""[..]).into_owned();
    tracing::debug!("Found {} component markers", markers.len());
    Ok((stripped, markers))
}

/// Class hashes in first-seen order, without duplicates.
pub fn unique_class_hashes(markers: &[Marker]) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    markers
        .iter()
        .filter(|marker| seen.insert(marker.class_hash.as_str()))
        .map(|marker| marker.class_hash.clone())
        .collect()
}
