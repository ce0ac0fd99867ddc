//! Balanced-brace JSON extraction shared by the store-page strategies.

/// Find the first balanced `{...}` object in `text`.
///
/// Brace characters inside double-quoted string literals do not count
/// toward the balance, so literal braces in documentation prose or schema
/// descriptions cannot truncate the match. Backslash escapes inside strings
/// are honored. Returns `None` when no candidate closes before the end of
/// the text.
pub(crate) fn first_json_object(text: &str) -> Option<&str> {
    let bytes = text.as_bytes();
    let mut search_from = 0;

    while let Some(offset) = text[search_from..].find('{') {
        let start = search_from + offset;
        if let Some(len) = balanced_object_len(&bytes[start..]) {
            return Some(&text[start..start + len]);
        }
        // This opener never closes; a later one still might.
        search_from = start + 1;
    }
    None
}

/// Length of the balanced object starting at `bytes[0]` (which must be
/// `b'{'`), or `None` if it never closes.
fn balanced_object_len(bytes: &[u8]) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, &b) in bytes.iter().enumerate() {
        if in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i + 1);
                }
            }
            _ => {}
        }
    }
    None
}
