//! Start-tag index over an HTML document.
//!
//! `tl` finds the elements; each element is then re-scanned with
//! [`scan_start_tag`] so attribute values carry byte spans into the original
//! text. Editors change the text by span and leave every other byte alone.
//!
//! Tags inside raw-text elements (`<script>`, `<style>`, `<title>`,
//! `<textarea>`) are ignored even if a parser reports them.

use crate::utils::html::{StartTag, find_ci, scan_start_tag};

/// Elements whose content is text, not markup.
const RAW_TEXT: &[&str] = &["script", "style", "title", "textarea"];

/// Where missing head tags go.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeadInsert {
    /// Inside an existing head, at this offset.
    InHead(usize),
    /// No head element: a new `<head>` block goes at this offset.
    NewHead(usize),
}

/// Parsed view of one HTML document.
pub struct Document<'a> {
    src: &'a str,
    tags: Vec<StartTag>,
    has_head: bool,
    /// Offset of `</head`, if the document closes its head.
    head_close: Option<usize>,
    /// End of the region searched for head tags.
    scope_end: usize,
}

impl<'a> Document<'a> {
    pub fn parse(src: &'a str) -> Self {
        let mut starts = tl_tag_offsets(src);
        if starts.is_empty() && src.contains('<') {
            starts = src.match_indices('<').map(|(i, _)| i).collect();
        }
        starts.sort_unstable();
        starts.dedup();

        let mut tags = Vec::with_capacity(starts.len());
        let mut raw_ranges = Vec::new();
        let mut skip_until = 0;
        for start in starts {
            if start < skip_until {
                continue;
            }
            let Some(tag) = scan_start_tag(src, start) else {
                continue;
            };
            // An unclosed raw-text element is malformed; what follows stays markup
            if RAW_TEXT.contains(&tag.name.as_str())
                && let Some(close) = find_close_tag(src, &tag.name, tag.end)
            {
                raw_ranges.push((tag.end, close));
                skip_until = close;
            }
            tags.push(tag);
        }

        let head_close = find_close_outside(src, "head", &raw_ranges);
        let has_head = tags.iter().any(|t| t.name == "head");
        let scope_end = head_close.unwrap_or_else(|| {
            tags.iter()
                .find(|t| t.name == "body")
                .map(|t| t.start)
                .or_else(|| find_close_outside(src, "html", &raw_ranges))
                .unwrap_or(src.len())
        });

        Self {
            src,
            tags,
            has_head,
            head_close,
            scope_end,
        }
    }

    pub fn src(&self) -> &'a str {
        self.src
    }

    /// Every start tag outside raw text, in document order.
    pub fn tags(&self) -> &[StartTag] {
        &self.tags
    }

    /// Start tags that belong to the head: everything before `</head>`,
    /// or before `<body>` when the head is never closed.
    pub fn head_tags(&self) -> impl Iterator<Item = &StartTag> {
        self.tags.iter().filter(|t| t.start < self.scope_end)
    }

    pub fn head_insert(&self) -> HeadInsert {
        match (self.head_close, self.has_head) {
            (Some(close), _) => HeadInsert::InHead(close),
            (None, true) => HeadInsert::InHead(self.scope_end),
            (None, false) => HeadInsert::NewHead(self.scope_end),
        }
    }

    /// Span of an element's text content and the offset one past its end tag.
    ///
    /// Returns `None` when the element is never closed.
    pub fn element_content(&self, tag: &StartTag) -> Option<(usize, usize, usize)> {
        let close = find_close_tag(self.src, &tag.name, tag.end)?;
        let end = self.src[close..].find('>').map(|i| close + i + 1)?;
        Some((tag.end, close, end))
    }

    /// End of the text of an element that is never closed: the next tag,
    /// or the end of the head scope, whichever comes first.
    pub fn open_text_end(&self, tag: &StartTag) -> usize {
        let next = self
            .tags
            .iter()
            .map(|t| t.start)
            .find(|&start| start > tag.start)
            .unwrap_or(self.src.len());
        next.min(self.scope_end).max(tag.end)
    }

    /// Source text of an element including its end tag, or just the start
    /// tag when it has none.
    pub fn outer_html(&self, tag: &StartTag) -> &'a str {
        match self.element_content(tag) {
            Some((_, _, end)) => &self.src[tag.start..end],
            None => &self.src[tag.start..tag.end],
        }
    }
}

/// Byte offsets of every element `tl` finds.
fn tl_tag_offsets(src: &str) -> Vec<usize> {
    let Ok(dom) = tl::parse(src, tl::ParserOptions::default()) else {
        return Vec::new();
    };
    let base = src.as_ptr() as usize;
    dom.nodes()
        .iter()
        .filter_map(tl::Node::as_tag)
        .filter_map(|tag| {
            let offset = (tag.raw().as_bytes().as_ptr() as usize).checked_sub(base)?;
            (offset < src.len()).then_some(offset)
        })
        .collect()
}

/// Offset of the first `</name` end tag at or after `from`.
fn find_close_tag(src: &str, name: &str, from: usize) -> Option<usize> {
    let needle = format!("</{name}");
    let mut at = from;
    while let Some(pos) = find_ci(src, &needle, at) {
        let next = src.as_bytes().get(pos + needle.len());
        if next.is_none_or(|b| b.is_ascii_whitespace() || matches!(b, b'>' | b'/')) {
            return Some(pos);
        }
        at = pos + needle.len();
    }
    None
}

/// Like [`find_close_tag`] from the start, skipping matches inside raw text.
fn find_close_outside(src: &str, name: &str, raw_ranges: &[(usize, usize)]) -> Option<usize> {
    let mut at = 0;
    while let Some(pos) = find_close_tag(src, name, at) {
        if !raw_ranges.iter().any(|&(s, e)| pos >= s && pos < e) {
            return Some(pos);
        }
        at = pos + 2;
    }
    None
}
