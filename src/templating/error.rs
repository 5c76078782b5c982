//! Readable messages from Tera errors.

use regex::Regex;
use std::error::Error;
use std::sync::LazyLock;

static INLINE_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"['"]__inline_[0-9a-f]+\.html['"]"#).expect("inline name regex is valid"));

/// Flatten a Tera error chain into one message.
///
/// Tera reports the innermost cause (the useful part) in the source chain, wrapped in
/// generic "Failed to render" messages that name internal template ids. Those ids are
/// replaced and the generic wrappers dropped.
pub fn format_tera_error(error: &tera::Error) -> String {
    let mut all_messages = vec![error.to_string()];
    let mut current_error: Option<&dyn Error> = error.source();
    while let Some(err) = current_error {
        all_messages.push(err.to_string());
        current_error = err.source();
    }

    let messages: Vec<String> = all_messages
        .iter()
        .map(|msg| INLINE_NAME_RE.replace_all(msg, "inline template").trim().to_string())
        .filter(|msg| {
            !msg.is_empty()
                && !(msg.starts_with("Failed to render") && all_messages.len() > 1)
        })
        .collect();

    if messages.is_empty() {
        "Template syntax error".to_string()
    } else {
        messages.join("\n  → ")
    }
}
