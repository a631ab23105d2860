//! Metadata merge: rewrite head tags in place and append missing assets.
//!
//! Edits are byte-span replacements on the original text, so markup that is
//! not a merge target survives byte for byte. Running the merge on its own
//! output changes nothing.

use super::dom::{Document, HeadInsert};
use super::types::{AssetManifest, MetadataRecord};
use crate::utils::html::{StartTag, escape, escape_attr};

/// How a head tag is identified and which attribute carries its value.
pub(super) struct Target {
    pub(super) element: &'static str,
    /// Attributes that may name the tag (`name`, `property`, `rel`).
    keys: &'static [&'static str],
    pub(super) key: &'static str,
    pub(super) value_attr: &'static str,
}

impl Target {
    const fn meta_name(key: &'static str) -> Self {
        Self {
            element: "meta",
            keys: &["name"],
            key,
            value_attr: "content",
        }
    }

    /// Open Graph tags are sometimes written with `name` instead of `property`.
    const fn meta_property(key: &'static str) -> Self {
        Self {
            element: "meta",
            keys: &["property", "name"],
            key,
            value_attr: "content",
        }
    }

    const fn link_rel(key: &'static str) -> Self {
        Self {
            element: "link",
            keys: &["rel"],
            key,
            value_attr: "href",
        }
    }

    pub(super) fn matches(&self, src: &str, tag: &StartTag) -> bool {
        if tag.name != self.element {
            return false;
        }
        self.keys.iter().any(|&attr| match attr {
            "rel" => tag.value(src, attr).is_some_and(|rel| {
                rel.split_ascii_whitespace()
                    .any(|token| token.eq_ignore_ascii_case(self.key))
            }),
            _ => tag.value_is(src, attr, self.key),
        })
    }

    fn render(&self, value: &str) -> String {
        format!(
            "<{} {}=\"{}\" {}=\"{}\">",
            self.element,
            self.keys[0],
            self.key,
            self.value_attr,
            escape_attr(value)
        )
    }
}

const DESCRIPTION: Target = Target::meta_name("description");
const CANONICAL: Target = Target::link_rel("canonical");
const OG_TITLE: Target = Target::meta_property("og:title");
const OG_DESCRIPTION: Target = Target::meta_property("og:description");
const OG_URL: Target = Target::meta_property("og:url");

/// Head tags carrying the record's non-title fields, in insertion order.
pub(super) fn targets(record: &MetadataRecord) -> [(&'static Target, &Option<String>); 5] {
    [
        (&DESCRIPTION, &record.description),
        (&CANONICAL, &record.canonical),
        (&OG_TITLE, &record.og_title),
        (&OG_DESCRIPTION, &record.og_description),
        (&OG_URL, &record.og_url),
    ]
}

/// A pending replacement of `src[start..end]`.
struct Edit {
    start: usize,
    end: usize,
    text: String,
}

/// Merge a metadata record and the asset manifest into a document.
///
/// - the first `<title>` gets the record's title; further titles in the head
///   are removed
/// - description, canonical and Open Graph tags get only their
///   `content`/`href` value replaced
/// - missing tags and assets are inserted before `</head>`, or in a new
///   head when the document has none
/// - `None` fields leave the document's tags untouched
pub fn merge(html: &str, record: &MetadataRecord, assets: &AssetManifest) -> String {
    let doc = Document::parse(html);
    let mut edits = Vec::new();
    let mut missing = Vec::new();

    if let Some(title) = &record.title {
        merge_title(&doc, title, &mut edits, &mut missing);
    }

    for (target, value) in targets(record) {
        let Some(value) = value else { continue };
        match doc.head_tags().find(|tag| target.matches(html, tag)) {
            Some(tag) => edits.push(set_attr(tag, target.value_attr, value)),
            None => missing.push(target.render(value)),
        }
    }

    missing.extend(
        assets
            .iter()
            .filter(|asset| !asset_present(&doc, &asset.url, &asset.html))
            .map(|asset| asset.html.clone()),
    );

    if !missing.is_empty() {
        let mut block: String = missing.iter().map(|tag| format!("{tag}\n")).collect();
        let at = match doc.head_insert() {
            HeadInsert::InHead(at) => at,
            HeadInsert::NewHead(at) => {
                block = format!("<head>\n{block}</head>\n");
                at
            }
        };
        edits.push(Edit {
            start: at,
            end: at,
            text: block,
        });
    }

    apply(html, edits)
}

fn merge_title(doc: &Document, title: &str, edits: &mut Vec<Edit>, missing: &mut Vec<String>) {
    let mut titles = doc.head_tags().filter(|t| t.name == "title");

    let Some(first) = titles.next() else {
        missing.push(format!("<title>{}</title>", escape(title)));
        return;
    };
    match doc.element_content(first) {
        Some((start, end, _)) => edits.push(Edit {
            start,
            end,
            text: escape(title).into_owned(),
        }),
        // Unclosed: replace its text and close it
        None => edits.push(Edit {
            start: first.end,
            end: doc.open_text_end(first),
            text: format!("{}</title>", escape(title)),
        }),
    }
    for extra in titles {
        let end = doc
            .element_content(extra)
            .map_or_else(|| doc.open_text_end(extra), |(_, _, outer_end)| outer_end);
        edits.push(Edit {
            start: extra.start,
            end,
            text: String::new(),
        });
    }
}

/// Replace an attribute value, quoting it; add the attribute if absent.
///
/// The escaped value contains neither quote character, so it is safe inside
/// single or double quotes.
fn set_attr(tag: &StartTag, name: &str, value: &str) -> Edit {
    let value = escape_attr(value);
    // A bare `content` attribute has no span to replace
    let span = tag
        .attrs
        .iter()
        .filter(|a| a.name == name)
        .find_map(|a| a.value);

    match span {
        Some(span) if span.quoted => Edit {
            start: span.start,
            end: span.end,
            text: value.into_owned(),
        },
        Some(span) => Edit {
            start: span.start,
            end: span.end,
            text: format!("\"{value}\""),
        },
        None => Edit {
            start: tag.insert_at,
            end: tag.insert_at,
            text: format!(" {name}=\"{value}\""),
        },
    }
}

fn apply(src: &str, mut edits: Vec<Edit>) -> String {
    edits.sort_by_key(|e| (e.start, e.end));
    let extra: usize = edits.iter().map(|e| e.text.len()).sum();
    let mut out = String::with_capacity(src.len() + extra);
    let mut pos = 0;
    for edit in edits {
        if edit.start < pos {
            continue;
        }
        out.push_str(&src[pos..edit.start]);
        out.push_str(&edit.text);
        pos = edit.end;
    }
    out.push_str(&src[pos..]);
    out
}

/// Whether the document already carries an asset: the exact tag text, or
/// any `<link href>`/`<script src>` with the same URL.
fn asset_present(doc: &Document, url: &str, html: &str) -> bool {
    doc.src().contains(html) || doc.tags().iter().any(|tag| loads_url(doc.src(), tag, url))
}

/// Whether a `<link href>` or `<script src>` points at `url`.
pub(super) fn loads_url(src: &str, tag: &StartTag, url: &str) -> bool {
    let attr = match tag.name.as_str() {
        "link" => "href",
        "script" => "src",
        _ => return false,
    };
    tag.value(src, attr).is_some_and(|v| v.trim() == url)
}
