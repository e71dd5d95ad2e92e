//! Warning text formatting.
//!
//! Warnings list offending identifiers quoted and comma separated. Long lists
//! are cut after a preview count and end with `and N more`:
//!
//! ```text
//! Could not match individuals to partition: 'x', 'y', 'z' and 2 more
//! ```

/// Quotes `text` with single quotes, or double quotes if it contains a
/// single quote and no double quote.
pub fn quote(text: &str) -> String {
    if text.contains('\'') && !text.contains('"') {
        format!("\"{text}\"")
    } else {
        format!("'{}'", text.replace('\'', "\\'"))
    }
}

/// The first `preview` items quoted and joined, followed by `and N more` if
/// some were left out.
pub fn quoted_preview<S: AsRef<str>>(items: &[S], preview: usize) -> String {
    let mut text = items
        .iter()
        .take(preview)
        .map(|item| quote(item.as_ref()))
        .collect::<Vec<_>>()
        .join(", ");
    if items.len() > preview {
        text.push_str(&format!(" and {} more", items.len() - preview));
    }
    text
}

/// `"s"` unless there is exactly one item.
pub fn plural(count: usize) -> &'static str {
    if count == 1 { "" } else { "s" }
}

/// A warning about `items`, or `None` if there are none.
///
/// `noun` is pluralized with [`plural`]; `prefix` and `suffix` surround it.
pub(crate) fn listing<S: AsRef<str>>(
    prefix: &str,
    noun: &str,
    suffix: &str,
    items: &[S],
    preview: usize,
) -> Option<String> {
    if items.is_empty() {
        return None;
    }
    Some(format!(
        "{prefix}{noun}{}{suffix}: {}",
        plural(items.len()),
        quoted_preview(items, preview)
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote() {
        assert_eq!(quote("abc"), "'abc'");
        assert_eq!(quote("it's"), "\"it's\"");
        assert_eq!(quote("'\""), "'\\'\"'");
    }

    #[test]
    fn test_preview_truncates() {
        let ids = ["v", "w", "x", "y", "z"];
        assert_eq!(quoted_preview(&ids, 3), "'v', 'w', 'x' and 2 more");
        assert_eq!(quoted_preview(&ids[..3], 3), "'v', 'w', 'x'");
        assert_eq!(quoted_preview(&ids[..1], 3), "'v'");
    }

    #[test]
    fn test_listing_plural() {
        assert_eq!(
            listing("Could not match ", "individual", " to partition", &["x"], 3).unwrap(),
            "Could not match individual to partition: 'x'"
        );
        assert_eq!(
            listing("Could not match ", "individual", " to partition", &["x", "y"], 3).unwrap(),
            "Could not match individuals to partition: 'x', 'y'"
        );
        assert!(listing::<&str>("", "individual", "", &[], 3).is_none());
    }
}
