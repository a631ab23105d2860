//! Asset extraction from the bundler's reference document.
//!
//! Only the tags the bundler emits for the main entry are kept:
//!
//! | Tag | Kind |
//! |-----|------|
//! | `<link rel="stylesheet" href="/assets/…">` | [`AssetKind::Stylesheet`] |
//! | `<link rel="modulepreload" href="/assets/…">` | [`AssetKind::ModulePreload`] |
//! | `<script type="module" src="/assets/…">` | [`AssetKind::ModuleScript`] |
//!
//! Inline scripts, classic scripts and anything pointing off-site (analytics,
//! tag managers, CDNs) never match.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

use super::dom::Document;
use super::types::{AssetKind, AssetManifest, AssetTag};
use crate::utils::html::StartTag;
use crate::utils::path::is_local_url;

/// Extract the asset manifest from HTML text.
///
/// `prefix` restricts matches to URLs under the bundler's asset directory;
/// an empty prefix accepts any same-site URL.
pub fn extract(src: &str, prefix: &str) -> AssetManifest {
    let doc = Document::parse(src);
    AssetManifest::new(
        doc.tags()
            .iter()
            .filter_map(|tag| classify(&doc, tag, prefix)),
    )
}

/// Extract the asset manifest from the reference document on disk.
pub fn extract_file(path: &Path, prefix: &str) -> Result<AssetManifest> {
    let src = fs::read_to_string(path)
        .with_context(|| format!("failed to read reference document {}", path.display()))?;
    Ok(extract(&src, prefix))
}

fn classify(doc: &Document, tag: &StartTag, prefix: &str) -> Option<AssetTag> {
    let src = doc.src();
    let (kind, url, html) = match tag.name.as_str() {
        "link" => {
            let rel = tag.value(src, "rel")?;
            let kind = rel.split_ascii_whitespace().find_map(|token| {
                if token.eq_ignore_ascii_case("stylesheet") {
                    Some(AssetKind::Stylesheet)
                } else if token.eq_ignore_ascii_case("modulepreload") {
                    Some(AssetKind::ModulePreload)
                } else {
                    None
                }
            })?;
            (kind, tag.value(src, "href")?, &src[tag.start..tag.end])
        }
        "script" if tag.value_is(src, "type", "module") => {
            (AssetKind::ModuleScript, tag.value(src, "src")?, doc.outer_html(tag))
        }
        _ => return None,
    };

    let url = url.trim();
    is_local_url(url, prefix).then(|| AssetTag {
        kind,
        url: url.to_owned(),
        html: html.to_owned(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const VITE_SHELL: &str = r#"<!doctype html>
<html lang="en">
  <head>
    <meta charset="UTF-8" />
    <script async src="https://www.googletagmanager.com/gtag/js?id=G-1"></script>
    <script>window.dataLayer = window.dataLayer || [];</script>
    <script type="module" crossorigin src="/assets/index-B2x9.js"></script>
    <link rel="modulepreload" crossorigin href="/assets/vendor-Q1.js">
    <link rel="stylesheet" crossorigin href="/assets/index-Cc3.css">
    <link rel="icon" href="/favicon.ico">
    <link rel="stylesheet" href="https://fonts.googleapis.com/css2?family=Inter">
  </head>
  <body><div id="root"></div></body>
</html>"#;

    #[test]
    fn test_extracts_entry_assets_in_order() {
        let manifest = extract(VITE_SHELL, "/assets/");
        let kinds: Vec<_> = manifest.iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            [AssetKind::Stylesheet, AssetKind::ModulePreload, AssetKind::ModuleScript]
        );
        let html: Vec<_> = manifest.iter().map(|t| t.html.as_str()).collect();
        assert_eq!(
            html,
            [
                r#"<link rel="stylesheet" crossorigin href="/assets/index-Cc3.css">"#,
                r#"<link rel="modulepreload" crossorigin href="/assets/vendor-Q1.js">"#,
                r#"<script type="module" crossorigin src="/assets/index-B2x9.js"></script>"#,
            ]
        );
    }

    #[test]
    fn test_ignores_third_party_and_inline() {
        let manifest = extract(VITE_SHELL, "");
        assert!(manifest.iter().all(|t| !t.url.contains("google")));
        assert_eq!(manifest.len(), 3);
    }

    #[test]
    fn test_prefix_filters_public_files() {
        let src = r#"<head><script type="module" src="/sw-register.js"></script></head>"#;
        assert!(extract(src, "/assets/").is_empty());
        assert_eq!(extract(src, "").len(), 1);
    }

    #[test]
    fn test_attribute_order_and_quoting() {
        let src = "<head><link href=/assets/a.css REL='preload stylesheet'>\
                   <script src='/assets/m.js' type=MODULE></script></head>";
        let manifest = extract(src, "/assets/");
        let urls: Vec<_> = manifest.iter().map(|t| t.url.as_str()).collect();
        assert_eq!(urls, ["/assets/a.css", "/assets/m.js"]);
    }

    #[test]
    fn test_empty_document() {
        assert!(extract("<html><body></body></html>", "/assets/").is_empty());
    }

    #[test]
    fn test_extract_file_missing() {
        let dir = tempfile::TempDir::new().unwrap();
        assert!(extract_file(&dir.path().join("index.html"), "/assets/").is_err());
    }
}
