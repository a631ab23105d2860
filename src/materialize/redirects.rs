//! `_redirects` rules for flat-file routes.
//!
//! A route written as `about.html` also needs `/about` to resolve, so each
//! flat route contributes one rewrite rule:
//!
//! ```text
//! /about /about.html 200
//! ```
//!
//! Rules are merged into an existing `_redirects` file: hand-written lines
//! are kept in place and a rule already present is not repeated.

use std::fs;
use std::io::{self, Write};
use std::path::Path;

use anyhow::{Context, Result};

use super::write::write_atomic;
use crate::core::RoutePath;

pub const REDIRECTS_FILE: &str = "_redirects";

/// Rewrite rule mapping the directory-style path to the flat file.
pub fn rule_for(route: &RoutePath) -> Option<String> {
    route
        .flat_url()
        .map(|flat| format!("{} {} 200", route.to_encoded(), flat_encoded(&flat)))
}

fn flat_encoded(flat: &str) -> String {
    // `flat_url` is the route plus `.html`, the same segments encode the same
    RoutePath::parse(flat).map_or_else(|_| flat.to_owned(), |p| p.to_encoded())
}

/// Merge `rules` into the redirects file. Returns how many rules were added.
pub fn write_redirects(output: &Path, rules: &[String]) -> Result<usize> {
    let path = output.join(REDIRECTS_FILE);
    let existing = match fs::read_to_string(&path) {
        Ok(content) => content,
        Err(e) if e.kind() == io::ErrorKind::NotFound => String::new(),
        Err(e) => {
            return Err(e).with_context(|| format!("failed to read {}", path.display()));
        }
    };

    let merged = merge_rules(&existing, rules);
    if merged.added == 0 && (existing.is_empty() || existing.ends_with('\n')) {
        return Ok(0);
    }

    write_atomic(&path, |file| file.write_all(merged.content.as_bytes()))?;
    Ok(merged.added)
}

struct Merged {
    content: String,
    added: usize,
}

fn merge_rules(existing: &str, rules: &[String]) -> Merged {
    let normalize = |line: &str| line.split_whitespace().collect::<Vec<_>>().join(" ");
    let mut seen: rustc_hash::FxHashSet<String> =
        existing.lines().map(normalize).filter(|l| !l.is_empty()).collect();

    let mut content = existing.to_owned();
    if !content.is_empty() && !content.ends_with('\n') {
        content.push('\n');
    }

    let mut added = 0;
    for rule in rules {
        if seen.insert(normalize(rule)) {
            content.push_str(rule);
            content.push('\n');
            added += 1;
        }
    }
    Merged { content, added }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn route(path: &str) -> RoutePath {
        RoutePath::parse(path).unwrap()
    }

    #[test]
    fn test_rule_format() {
        assert_eq!(rule_for(&route("/about")).unwrap(), "/about /about.html 200");
        assert_eq!(
            rule_for(&route("/get-involved/volunteer")).unwrap(),
            "/get-involved/volunteer /get-involved/volunteer.html 200"
        );
        assert_eq!(rule_for(&route("/our story")).unwrap(), "/our%20story /our%20story.html 200");
        assert!(rule_for(&route("/")).is_none());
    }

    #[test]
    fn test_merge_keeps_existing_lines() {
        let existing = "# hand written\n/old   /new 301\n/about /about.html 200";
        let merged = merge_rules(
            existing,
            &["/about /about.html 200".into(), "/donate /donate.html 200".into()],
        );
        assert_eq!(merged.added, 1);
        assert_eq!(
            merged.content,
            "# hand written\n/old   /new 301\n/about /about.html 200\n/donate /donate.html 200\n"
        );
    }

    #[test]
    fn test_write_redirects_twice() {
        let dir = tempfile::TempDir::new().unwrap();
        let rules = vec!["/about /about.html 200".to_string()];

        assert_eq!(write_redirects(dir.path(), &rules).unwrap(), 1);
        assert_eq!(write_redirects(dir.path(), &rules).unwrap(), 0);

        let content = fs::read_to_string(dir.path().join(REDIRECTS_FILE)).unwrap();
        assert_eq!(content, "/about /about.html 200\n");
    }

    #[test]
    fn test_no_rules_no_file() {
        let dir = tempfile::TempDir::new().unwrap();
        assert_eq!(write_redirects(dir.path(), &[]).unwrap(), 0);
        assert!(!dir.path().join(REDIRECTS_FILE).exists());
    }
}
