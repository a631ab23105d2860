//! HTML utility functions.
//!
//! - `escape()`, `escape_attr()`, `unescape()` - HTML entity handling
//! - `scan_start_tag()` - span-aware start tag scanning, so callers can edit
//!   one attribute value in place without re-serializing the element
//! - `find_ci()` - ASCII case-insensitive substring search for close tags

use std::borrow::Cow;

// =============================================================================
// HTML Escaping
// =============================================================================

const ESCAPE_CHARS: [char; 5] = ['<', '>', '&', '"', '\''];

#[inline]
fn escape_char(c: char) -> Option<&'static str> {
    match c {
        '<' => Some("&lt;"),
        '>' => Some("&gt;"),
        '&' => Some("&amp;"),
        '"' => Some("&quot;"),
        '\'' => Some("&#39;"),
        _ => None,
    }
}

/// Escape HTML special characters in text content.
///
/// Uses `Cow` to avoid allocation when no escaping is needed.
///
/// # Example
/// ```ignore
/// assert_eq!(escape("<script>"), "&lt;script&gt;");
/// assert_eq!(escape("hello"), "hello"); // No allocation
/// ```
#[inline]
pub fn escape(s: &str) -> Cow<'_, str> {
    if !s.contains(ESCAPE_CHARS) {
        return Cow::Borrowed(s);
    }

    let mut result = String::with_capacity(s.len() + 8);
    for c in s.chars() {
        match escape_char(c) {
            Some(entity) => result.push_str(entity),
            None => result.push(c),
        }
    }
    Cow::Owned(result)
}

/// Escape HTML attribute values. Same character set as [`escape`].
#[inline]
pub fn escape_attr(s: &str) -> Cow<'_, str> {
    escape(s)
}

/// Unescape HTML entities back to characters.
///
/// Handles the named entities `escape` produces plus numeric references.
pub fn unescape(s: &str) -> Cow<'_, str> {
    if !s.contains('&') {
        return Cow::Borrowed(s);
    }

    let mut result = String::with_capacity(s.len());
    let mut rest = s;

    while let Some(amp) = rest.find('&') {
        result.push_str(&rest[..amp]);
        let tail = &rest[amp..];
        let entity_end = tail[1..].find(';').map(|i| i + 1).filter(|&i| i <= 10);

        let decoded = entity_end.and_then(|end| match &tail[1..end] {
            "lt" => Some('<'),
            "gt" => Some('>'),
            "amp" => Some('&'),
            "quot" => Some('"'),
            "apos" => Some('\''),
            "nbsp" => Some('\u{00A0}'),
            e if e.starts_with("#x") || e.starts_with("#X") => {
                u32::from_str_radix(&e[2..], 16).ok().and_then(char::from_u32)
            }
            e if e.starts_with('#') => e[1..].parse().ok().and_then(char::from_u32),
            _ => None,
        });

        match (decoded, entity_end) {
            (Some(c), Some(end)) => {
                result.push(c);
                rest = &tail[end + 1..];
            }
            _ => {
                result.push('&');
                rest = &tail[1..];
            }
        }
    }
    result.push_str(rest);

    Cow::Owned(result)
}

// =============================================================================
// Start Tag Scanning
// =============================================================================

/// Byte span of an attribute value, excluding quotes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValueSpan {
    pub start: usize,
    pub end: usize,
    pub quoted: bool,
}

/// One attribute of a start tag, with absolute byte offsets into the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attr {
    /// Lowercased attribute name.
    pub name: String,
    pub value: Option<ValueSpan>,
}

impl Attr {
    /// The raw (still escaped) value text.
    pub fn raw_value<'a>(&self, src: &'a str) -> &'a str {
        self.value.map_or("", |v| &src[v.start..v.end])
    }
}

/// A scanned start tag: `<name attr=value ...>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartTag {
    /// Lowercased element name.
    pub name: String,
    /// Offset of `<`.
    pub start: usize,
    /// Offset one past `>`.
    pub end: usize,
    /// Offset where a new attribute can be inserted (before `>` or `/>`).
    pub insert_at: usize,
    pub attrs: Vec<Attr>,
}

impl StartTag {
    /// Find an attribute by (lowercase) name.
    pub fn attr(&self, name: &str) -> Option<&Attr> {
        self.attrs.iter().find(|a| a.name == name)
    }

    /// Unescaped attribute value, if the attribute is present.
    pub fn value<'a>(&self, src: &'a str, name: &str) -> Option<Cow<'a, str>> {
        self.attr(name).map(|a| unescape(a.raw_value(src)))
    }

    /// Check whether an attribute's value equals `expected`, ignoring ASCII case.
    pub fn value_is(&self, src: &str, name: &str, expected: &str) -> bool {
        self.value(src, name)
            .is_some_and(|v| v.trim().eq_ignore_ascii_case(expected))
    }
}

/// Scan the start tag beginning at `start` (which must point at `<`).
///
/// Quote-aware: a `>` inside a quoted value does not end the tag.
/// Returns `None` if `start` is not a start tag or the tag is unterminated.
pub fn scan_start_tag(src: &str, start: usize) -> Option<StartTag> {
    let bytes = src.as_bytes();
    if bytes.get(start) != Some(&b'<') {
        return None;
    }

    let mut i = start + 1;
    let name_start = i;
    while i < bytes.len() && !bytes[i].is_ascii_whitespace() && !matches!(bytes[i], b'>' | b'/')
    {
        i += 1;
    }
    if i == name_start || !bytes[name_start].is_ascii_alphabetic() {
        return None;
    }
    let name = src[name_start..i].to_ascii_lowercase();

    let mut attrs = Vec::new();
    loop {
        while i < bytes.len() && bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        match bytes.get(i)? {
            b'>' => {
                return Some(StartTag {
                    name,
                    start,
                    end: i + 1,
                    insert_at: trim_end_ws(bytes, i, start),
                    attrs,
                });
            }
            b'/' if bytes.get(i + 1) == Some(&b'>') => {
                return Some(StartTag {
                    name,
                    start,
                    end: i + 2,
                    insert_at: trim_end_ws(bytes, i, start),
                    attrs,
                });
            }
            b'/' => {
                i += 1;
                continue;
            }
            _ => {}
        }

        // Attribute name
        let attr_start = i;
        while i < bytes.len()
            && !bytes[i].is_ascii_whitespace()
            && !matches!(bytes[i], b'=' | b'>')
            && !(bytes[i] == b'/' && bytes.get(i + 1) == Some(&b'>'))
        {
            i += 1;
        }
        let attr_name = src[attr_start..i].to_ascii_lowercase();

        let mut j = i;
        while j < bytes.len() && bytes[j].is_ascii_whitespace() {
            j += 1;
        }

        if bytes.get(j) != Some(&b'=') {
            attrs.push(Attr {
                name: attr_name,
                value: None,
            });
            continue;
        }

        // Value
        i = j + 1;
        while i < bytes.len() && bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        let value = match bytes.get(i)? {
            &q @ (b'"' | b'\'') => {
                let value_start = i + 1;
                let len = src[value_start..].find(q as char)?;
                i = value_start + len + 1;
                ValueSpan {
                    start: value_start,
                    end: value_start + len,
                    quoted: true,
                }
            }
            _ => {
                let value_start = i;
                while i < bytes.len() && !bytes[i].is_ascii_whitespace() && bytes[i] != b'>' {
                    i += 1;
                }
                ValueSpan {
                    start: value_start,
                    end: i,
                    quoted: false,
                }
            }
        };
        attrs.push(Attr {
            name: attr_name,
            value: Some(value),
        });
    }
}

fn trim_end_ws(bytes: &[u8], mut i: usize, floor: usize) -> usize {
    while i > floor && bytes[i - 1].is_ascii_whitespace() {
        i -= 1;
    }
    i
}

/// ASCII case-insensitive search for `needle` in `haystack[from..]`.
///
/// Returns the absolute offset of the first match.
pub fn find_ci(haystack: &str, needle: &str, from: usize) -> Option<usize> {
    let hay = haystack.as_bytes().get(from..)?;
    let needle = needle.as_bytes();
    if needle.is_empty() || hay.len() < needle.len() {
        return None;
    }
    hay.windows(needle.len())
        .position(|w| w.eq_ignore_ascii_case(needle))
        .map(|pos| from + pos)
}

// =============================================================================
// Tests
// =============================================================================
