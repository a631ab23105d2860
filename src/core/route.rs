//! Route path type.
//!
//! A route path is the URL path a page is served at (`/`, `/about`,
//! `/get-involved/volunteer`). It decides where the page lands on disk and
//! how its template is named by default.

use std::fmt;
use std::path::PathBuf;

use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};
use thiserror::Error;

/// Characters escaped in a path segment when building a request URL.
const SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoutePathError {
    #[error("route path is empty")]
    Empty,
    #[error("route path `{0}` must start with `/`")]
    Relative(String),
    #[error("route path `{0}` contains a `.` or `..` segment")]
    DotSegment(String),
    #[error("route path `{0}` contains a query or fragment")]
    QueryOrFragment(String),
    #[error("route path `{0}` contains a backslash")]
    Backslash(String),
}

/// Normalized route path.
///
/// Invariants:
/// - Starts with `/`
/// - No trailing slash, except the root `/`
/// - No empty, `.` or `..` segments
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RoutePath(String);

impl RoutePath {
    /// Parse and normalize a route path as written in the config.
    ///
    /// Collapses repeated slashes and drops a trailing slash.
    pub fn parse(raw: &str) -> Result<Self, RoutePathError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(RoutePathError::Empty);
        }
        if !trimmed.starts_with('/') {
            return Err(RoutePathError::Relative(trimmed.to_string()));
        }
        if trimmed.contains(['?', '#']) {
            return Err(RoutePathError::QueryOrFragment(trimmed.to_string()));
        }
        if trimmed.contains('\\') {
            return Err(RoutePathError::Backslash(trimmed.to_string()));
        }

        let mut normalized = String::with_capacity(trimmed.len());
        for segment in trimmed.split('/').filter(|s| !s.is_empty()) {
            if segment == "." || segment == ".." {
                return Err(RoutePathError::DotSegment(trimmed.to_string()));
            }
            normalized.push('/');
            normalized.push_str(segment);
        }
        if normalized.is_empty() {
            normalized.push('/');
        }
        Ok(Self(normalized))
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[inline]
    pub fn is_root(&self) -> bool {
        self.0 == "/"
    }

    fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('/').filter(|s| !s.is_empty())
    }

    /// Directory-style output file: `about/index.html`, `index.html` for root.
    pub fn directory_file(&self) -> PathBuf {
        let mut path: PathBuf = self.segments().collect();
        path.push("index.html");
        path
    }

    /// Flat output file: `about.html`. The root has none.
    pub fn flat_file(&self) -> Option<PathBuf> {
        if self.is_root() {
            return None;
        }
        let mut path: PathBuf = self.segments().collect();
        let name = format!("{}.html", path.file_name()?.to_string_lossy());
        path.set_file_name(name);
        Some(path)
    }

    /// URL of the flat file: `/about.html`.
    pub fn flat_url(&self) -> Option<String> {
        (!self.is_root()).then(|| format!("{}.html", self.0))
    }

    /// Default template name: `/` → `index.html`, `/get-involved/volunteer`
    /// → `get-involved-volunteer.html`.
    pub fn default_template(&self) -> String {
        if self.is_root() {
            return "index.html".into();
        }
        format!("{}.html", self.segments().collect::<Vec<_>>().join("-"))
    }

    /// Percent-encoded form for request URLs.
    pub fn to_encoded(&self) -> String {
        self.0
            .split('/')
            .map(|segment| utf8_percent_encode(segment, SEGMENT).to_string())
            .collect::<Vec<_>>()
            .join("/")
    }
}

impl fmt::Display for RoutePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for RoutePath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_parse_normalizes() {
        assert_eq!(RoutePath::parse("/about/").unwrap().as_str(), "/about");
        assert_eq!(RoutePath::parse(" //a//b ").unwrap().as_str(), "/a/b");
        assert_eq!(RoutePath::parse("/").unwrap().as_str(), "/");
        assert!(RoutePath::parse("///").unwrap().is_root());
    }

    #[test]
    fn test_parse_rejects() {
        assert_eq!(RoutePath::parse(""), Err(RoutePathError::Empty));
        assert!(matches!(RoutePath::parse("about"), Err(RoutePathError::Relative(_))));
        assert!(matches!(RoutePath::parse("/a/../b"), Err(RoutePathError::DotSegment(_))));
        assert!(matches!(RoutePath::parse("/a?x=1"), Err(RoutePathError::QueryOrFragment(_))));
        assert!(matches!(RoutePath::parse("/a\\b"), Err(RoutePathError::Backslash(_))));
    }

    #[test]
    fn test_output_files() {
        let about = RoutePath::parse("/about").unwrap();
        assert_eq!(about.directory_file(), Path::new("about/index.html"));
        assert_eq!(about.flat_file().unwrap(), Path::new("about.html"));
        assert_eq!(about.flat_url().unwrap(), "/about.html");

        let nested = RoutePath::parse("/get-involved/volunteer").unwrap();
        assert_eq!(nested.directory_file(), Path::new("get-involved/volunteer/index.html"));
        assert_eq!(nested.flat_file().unwrap(), Path::new("get-involved/volunteer.html"));

        let root = RoutePath::parse("/").unwrap();
        assert_eq!(root.directory_file(), Path::new("index.html"));
        assert!(root.flat_file().is_none());
        assert!(root.flat_url().is_none());
    }

    #[test]
    fn test_default_template() {
        assert_eq!(RoutePath::parse("/").unwrap().default_template(), "index.html");
        assert_eq!(RoutePath::parse("/about").unwrap().default_template(), "about.html");
        assert_eq!(
            RoutePath::parse("/get-involved/volunteer").unwrap().default_template(),
            "get-involved-volunteer.html"
        );
    }

    #[test]
    fn test_to_encoded() {
        let route = RoutePath::parse("/our story").unwrap();
        assert_eq!(route.to_encoded(), "/our%20story");
    }
}
