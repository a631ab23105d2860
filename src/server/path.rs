//! URL to filesystem path resolution.

use std::path::{Path, PathBuf};

use percent_encoding::percent_decode_str;

use crate::utils::path::{is_within, strip_query};

/// Resolve a request URL to a file under `root`.
///
/// Tries, in order: the exact file, `<dir>/index.html`, then the flat
/// `<path>.html` written for flat-layout routes.
pub fn resolve_path(url: &str, root: &Path) -> Option<PathBuf> {
    let clean = normalize_url(url)?;
    if !is_within(Path::new(&clean)) {
        return None;
    }

    // Symlinks may still point outside the root
    let root = root.canonicalize().ok()?;
    let inside = |path: PathBuf| -> Option<PathBuf> {
        let canonical = path.canonicalize().ok()?;
        canonical.starts_with(&root).then_some(canonical)
    };

    let local = root.join(&clean);
    if local.is_file() {
        return inside(local);
    }
    if local.is_dir() {
        let index = local.join("index.html");
        if index.is_file() {
            return inside(index);
        }
    }
    if !clean.is_empty() && Path::new(&clean).extension().is_none() {
        let flat = root.join(format!("{clean}.html"));
        if flat.is_file() {
            return inside(flat);
        }
    }
    None
}

/// Whether a URL looks like a page navigation rather than a file request.
///
/// `/`, `/about`, `/about/` and `/about.html` are pages; `/assets/a.js` is not.
pub fn is_page_url(url: &str) -> bool {
    let path = strip_query(url);
    let last = path.rsplit('/').next().unwrap_or_default();
    match last.rsplit_once('.') {
        None => true,
        Some((_, ext)) => ext.eq_ignore_ascii_case("html") || ext.eq_ignore_ascii_case("htm"),
    }
}

/// Decode, strip query and fragment, trim slashes.
fn normalize_url(url: &str) -> Option<String> {
    let decoded = percent_decode_str(strip_query(url)).decode_utf8().ok()?;
    Some(decoded.trim_matches('/').to_string())
}
