//! Lenient Key/Value Scanning
//!
//! Mesh payloads are small flat JSON objects written by other firmware, often
//! by hand-rolled `snprintf` code. Rather than parse them strictly, nodes
//! look for the keys they care about with ASCII case-insensitive substring
//! search and read the text that follows.
//!
//! A quoted key only counts when a `:` follows it, so a string value that
//! happens to spell a key name is skipped. The key's value is everything
//! between the `:` and the next field boundary (`,` or `}`), with
//! surrounding whitespace stripped. Both `"k":true` and `"k":"true"` yield
//! `true`.
//!
//! None of this allocates; all results borrow the input text.

/// Byte offset of the first case-insensitive match of `needle` at or after `from`
pub fn find_ci(haystack: &str, needle: &str, from: usize) -> Option<usize> {
    let hay = haystack.as_bytes();
    let pat = needle.as_bytes();
    if pat.is_empty() || from > hay.len() || pat.len() > hay.len() - from {
        return None;
    }
    (from..=hay.len() - pat.len()).find(|&i| hay[i..i + pat.len()].eq_ignore_ascii_case(pat))
}

/// `needle` occurs anywhere in `haystack`, ignoring ASCII case
pub fn contains_ci(haystack: &str, needle: &str) -> bool {
    find_ci(haystack, needle, 0).is_some()
}

/// First byte is `{` and last is `}` once outer whitespace is trimmed
pub fn is_bracketed(text: &str) -> bool {
    let trimmed = text.trim();
    trimmed.len() >= 2 && trimmed.starts_with('{') && trimmed.ends_with('}')
}

/// Offset just past the `:` of the first `"key"` used as a key
///
/// Occurrences not followed by a `:` (after optional whitespace) are values
/// or fragments of other text and are skipped.
pub fn find_quoted_key(text: &str, key: &str) -> Option<usize> {
    let bytes = text.as_bytes();
    let mut from = 0;
    while let Some(at) = find_ci(text, key, from) {
        let end = at + key.len();
        if at > 0 && bytes[at - 1] == b'"' && bytes.get(end) == Some(&b'"') {
            let after = &text[end + 1..];
            let gap = after.len() - after.trim_start().len();
            if bytes.get(end + 1 + gap) == Some(&b':') {
                return Some(end + 2 + gap);
            }
        }
        from = at + 1;
    }
    None
}

/// Text between the key's `:` and the next `,` or `}`
fn value_span<'a>(text: &'a str, key: &str) -> Option<&'a str> {
    let rest = &text[find_quoted_key(text, key)?..];
    let end = rest.find([',', '}']).unwrap_or(rest.len());
    Some(&rest[..end])
}

/// Raw value text of `key`, trimmed of whitespace and quotes
///
/// Returns `Some("")` when the key is present with nothing usable after it.
pub fn value_of<'a>(text: &'a str, key: &str) -> Option<&'a str> {
    Some(value_span(text, key)?.trim().trim_matches('"'))
}

/// Boolean reading of `key`: `true` if the token appears in its value span
pub fn flag_value(text: &str, key: &str, true_token: &str) -> Option<bool> {
    Some(contains_ci(value_span(text, key)?, true_token))
}

/// Numeric reading of `key`, bare or quoted
pub fn number_value(text: &str, key: &str) -> Option<f32> {
    value_of(text, key)?.trim().parse::<f32>().ok()
}
