//! Check a materialized document against its record and the manifest.

use std::fmt;

use super::dom::Document;
use super::merge::{loads_url, targets};
use super::types::{AssetManifest, MetadataRecord};
use crate::utils::html::unescape;

/// One way a document disagrees with what the build should have written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mismatch {
    /// The head does not hold exactly one `<title>`.
    TitleCount(usize),
    Title { expected: String, found: String },
    /// No tag for a declared field (`link rel=canonical`, `meta og:url`...).
    MissingTag(&'static str),
    Value {
        tag: &'static str,
        expected: String,
        found: String,
    },
    /// An asset is loaded zero or several times.
    AssetCount { url: String, count: usize },
}

impl fmt::Display for Mismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TitleCount(n) => write!(f, "expected one <title>, found {n}"),
            Self::Title { expected, found } => {
                write!(f, "title is `{found}`, expected `{expected}`")
            }
            Self::MissingTag(tag) => write!(f, "no `{tag}` tag"),
            Self::Value {
                tag,
                expected,
                found,
            } => write!(f, "`{tag}` is `{found}`, expected `{expected}`"),
            Self::AssetCount { url, count } => {
                write!(f, "`{url}` loaded {count} times, expected once")
            }
        }
    }
}

/// Every mismatch in `html`. Fields the record leaves unset are not checked.
pub fn audit(html: &str, record: &MetadataRecord, assets: &AssetManifest) -> Vec<Mismatch> {
    let doc = Document::parse(html);
    let mut found = Vec::new();

    if let Some(expected) = &record.title {
        let titles: Vec<_> = doc.head_tags().filter(|t| t.name == "title").collect();
        match titles.as_slice() {
            [title] => {
                let text = doc
                    .element_content(title)
                    .map(|(start, end, _)| unescape(html[start..end].trim()).into_owned())
                    .unwrap_or_default();
                if text != *expected {
                    found.push(Mismatch::Title {
                        expected: expected.clone(),
                        found: text,
                    });
                }
            }
            other => found.push(Mismatch::TitleCount(other.len())),
        }
    }

    for (target, value) in targets(record) {
        let Some(expected) = value else { continue };
        let Some(tag) = doc.head_tags().find(|tag| target.matches(html, tag)) else {
            found.push(Mismatch::MissingTag(target.key));
            continue;
        };
        let actual = tag.value(html, target.value_attr).unwrap_or_default();
        if actual.trim() != expected.as_str() {
            found.push(Mismatch::Value {
                tag: target.key,
                expected: expected.clone(),
                found: actual.into_owned(),
            });
        }
    }

    for asset in assets.iter() {
        let count = doc
            .tags()
            .iter()
            .filter(|tag| loads_url(html, tag, &asset.url))
            .count();
        if count != 1 {
            found.push(Mismatch::AssetCount {
                url: asset.url.clone(),
                count,
            });
        }
    }

    found
}
