//! Isolates the JSON payload inside a raw model response.
//!
//! Models wrap their answer in code fences and chatty prose. `normalize`
//! strips the fences, finds the first `{` or `[`, and slices up to the
//! matching close bracket. When the close never arrives (truncated output)
//! the remainder is returned for the repair cascade to deal with, minus any
//! closing fence that sits outside a string literal.

const FENCE: &str = "```";

/// Running `normalize` on its own output returns that output unchanged.
pub fn normalize(raw: &str) -> String {
    let text = strip_leading_fence(raw.trim());

    match find_json_span(text) {
        Some(span) if span.closed => text[span.start..span.end].trim().to_string(),
        Some(span) => strip_trailing_fences(&text[span.start..]).to_string(),
        None => String::new(),
    }
}

/// Removes one leading fence with its optional language tag.
pub fn strip_leading_fence(text: &str) -> &str {
    let text = text.trim();
    let Some(rest) = text.strip_prefix(FENCE) else {
        return text;
    };

    // The language tag runs to the end of the fence line.
    let tag_len = rest
        .find(|c: char| c == '\n' || c == '{' || c == '[')
        .unwrap_or(rest.len());
    let tag = &rest[..tag_len];
    if tag.chars().all(|c| c.is_alphanumeric() || c == '-' || c == '_' || c.is_whitespace()) {
        rest[tag_len..].trim()
    } else {
        rest.trim()
    }
}

/// Drops closing fences from the end of an unclosed payload. A fence that
/// belongs to a string still open at that point is content and stays.
pub fn strip_trailing_fences(text: &str) -> &str {
    let mut text = text.trim();
    while let Some(rest) = text.strip_suffix(FENCE) {
        if ends_inside_string(rest) {
            break;
        }
        text = rest.trim_end();
    }
    text
}

fn ends_inside_string(text: &str) -> bool {
    let mut in_string = false;
    let mut escaped = false;
    for b in text.bytes() {
        if escaped {
            escaped = false;
        } else if in_string && b == b'\\' {
            escaped = true;
        } else if b == b'"' {
            in_string = !in_string;
        }
    }
    in_string
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JsonSpan {
    pub start: usize,
    /// Exclusive.
    pub end: usize,
    /// False when the container never closes and the span runs to the end.
    pub closed: bool,
}

/// Byte span of the first JSON container in `text`. Depth is counted for
/// the opening bracket's own kind only; brackets inside string literals are
/// ignored.
pub fn find_json_span(text: &str) -> Option<JsonSpan> {
    let start = text.find(|c: char| c == '{' || c == '[')?;
    let open = text.as_bytes()[start];
    let close = if open == b'{' { b'}' } else { b']' };

    let span = match matching_close(text.as_bytes(), start, open, close) {
        Some(end) => JsonSpan { start, end: end + 1, closed: true },
        None => JsonSpan { start, end: text.len(), closed: false },
    };
    Some(span)
}

/// Index of the byte closing the container opened at `start`.
pub(crate) fn matching_close(bytes: &[u8], start: usize, open: u8, close: u8) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (idx, &b) in bytes.iter().enumerate().skip(start) {
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

        if b == b'"' {
            in_string = true;
        } else if b == open {
            depth += 1;
        } else if b == close {
            depth = depth.saturating_sub(1);
            if depth == 0 {
                return Some(idx);
            }
        }
    }
    None
}
