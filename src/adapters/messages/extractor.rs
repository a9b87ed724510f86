//! Substring lookups over response text.
//!
//! Acquirer responses are small and flat, and the signature check works on the
//! literal bytes of the response, so fields are located textually rather than
//! through a DOM.

/// Text between the first `<tag>` at or after `from_offset` and the next
/// `</tag>` following it.
///
/// Only the literal form `<tag>` matches; a start tag carrying attributes is
/// not found.
pub fn extract_value<'a>(tag: &str, text: &'a str, from_offset: usize) -> Option<&'a str> {
    let open = format!("<{tag}>");
    let close = format!("</{tag}>");

    let haystack = text.get(from_offset..)?;
    let begin = from_offset + haystack.find(&open)? + open.len();
    let end = begin + text[begin..].find(&close)?;
    Some(&text[begin..end])
}

/// Start offsets of every occurrence of `marker` in `text`, in document order.
///
/// The search resumes one byte past each match.
pub fn repeated_groups(marker: &str, text: &str) -> Vec<usize> {
    let mut offsets = Vec::new();
    if marker.is_empty() {
        return offsets;
    }

    let mut position = 0;
    while let Some(found) = text.get(position..).and_then(|rest| rest.find(marker)) {
        let offset = position + found;
        offsets.push(offset);
        position = offset + 1;
        while !text.is_char_boundary(position) {
            position += 1;
        }
    }
    offsets
}

/// Slice of `text` starting at a group's offset and ending before the next
/// occurrence of `marker`, so field lookups stay inside one group.
pub fn group_scope<'a>(marker: &str, text: &'a str, offset: usize) -> &'a str {
    let Some(group) = text.get(offset..) else {
        return "";
    };
    let next = group
        .get(marker.len()..)
        .and_then(|rest| rest.find(marker))
        .map(|found| found + marker.len());
    match next {
        Some(end) => &group[..end],
        None => group,
    }
}
