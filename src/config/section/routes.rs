//! `[[routes]]` configuration: the route table.
//!
//! Every route is declared once and stays immutable for the build.
//!
//! # Example
//!
//! ```toml
//! [[routes]]
//! path = "/about"
//! strategy = "template"          # crawl | template
//! template = "about.html"        # default: path with `/` → `-`
//! layout = "both"                # directory | flat | both
//! title = "About Us"
//! canonical = "https://example.org/about"
//! ```

use crate::config::{ConfigDiagnostics, FieldPath};
use crate::core::RoutePath;
use crate::utils::path::is_within;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// How a route's base document is produced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Load the built application in a headless browser and take its DOM.
    #[default]
    Crawl,
    /// Read a hand-authored HTML file.
    Template,
}

/// Where a route's document is written.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Layout {
    /// `<route>/index.html`
    #[default]
    Directory,
    /// `<route>.html` plus a rewrite rule so `<route>` serves it.
    Flat,
    /// Both files plus the rewrite rule.
    Both,
}

impl Layout {
    /// Output files for a route, relative to the output directory.
    ///
    /// The root has no flat file, so `flat` and `both` fall back to the
    /// directory file there (rejected at validation anyway for `flat`).
    pub fn files(self, route: &RoutePath) -> Vec<PathBuf> {
        match (self, route.flat_file()) {
            (Self::Directory, _) | (_, None) => vec![route.directory_file()],
            (Self::Flat, Some(flat)) => vec![flat],
            (Self::Both, Some(flat)) => vec![route.directory_file(), flat],
        }
    }

    /// Whether this layout needs a rewrite rule for the route.
    pub const fn needs_redirect(self) -> bool {
        matches!(self, Self::Flat | Self::Both)
    }
}

/// One `[[routes]]` entry.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RouteConfig {
    pub path: String,
    pub strategy: Strategy,
    /// Template file name under `build.templates`.
    pub template: Option<String>,
    pub layout: Layout,

    pub title: Option<String>,
    pub description: Option<String>,
    pub canonical: Option<String>,
    pub og_title: Option<String>,
    pub og_description: Option<String>,
    pub og_url: Option<String>,
}

impl RouteConfig {
    /// Metadata fields in declaration order, paired with their TOML names.
    pub fn metadata_fields(&self) -> [(&'static str, Option<&str>); 6] {
        [
            ("title", self.title.as_deref()),
            ("description", self.description.as_deref()),
            ("canonical", self.canonical.as_deref()),
            ("og_title", self.og_title.as_deref()),
            ("og_description", self.og_description.as_deref()),
            ("og_url", self.og_url.as_deref()),
        ]
    }

    /// Template file name, explicit or derived from the path.
    pub fn template_name(&self, route: &RoutePath) -> String {
        self.template
            .clone()
            .unwrap_or_else(|| route.default_template())
    }
}

/// Validate the whole route table.
///
/// # Checks
/// - `path` parses as a route path
/// - present metadata values are not empty after trimming
/// - `canonical` and `og_url` are absolute http(s) URLs (warning otherwise)
/// - `template` is a relative path below the templates directory
/// - the root route cannot use `layout = "flat"`
/// - no two routes write the same output file
pub fn validate_routes(routes: &[RouteConfig], diag: &mut ConfigDiagnostics) {
    if routes.is_empty() {
        diag.warn(
            FieldPath::new("routes"),
            "no routes declared, nothing will be materialized",
        );
    }

    // output file → index of the route that claimed it
    let mut claimed: FxHashMap<PathBuf, usize> = FxHashMap::default();

    for (index, entry) in routes.iter().enumerate() {
        let field = |name: &str| FieldPath::indexed("routes", index, name);

        for (name, value) in entry.metadata_fields() {
            if value.is_some_and(|v| v.trim().is_empty()) {
                diag.error_with_hint(
                    field(name),
                    "must not be empty",
                    "remove the field to fall back to the [site] default",
                );
            }
        }

        for (name, value) in [
            ("canonical", entry.canonical.as_deref()),
            ("og_url", entry.og_url.as_deref()),
        ] {
            if let Some(value) = value.filter(|v| !v.trim().is_empty())
                && !url::Url::parse(value).is_ok_and(|u| matches!(u.scheme(), "http" | "https"))
            {
                diag.warn(field(name), format!("`{value}` is not an absolute http(s) URL"));
            }
        }

        if let Some(template) = &entry.template {
            if entry.strategy == Strategy::Crawl {
                diag.warn(field("template"), "ignored for strategy = \"crawl\"");
            } else if template.trim().is_empty() || !is_within(Path::new(template)) {
                diag.error(
                    field("template"),
                    format!("`{template}` must be a relative path inside the templates directory"),
                );
            }
        }

        let route = match RoutePath::parse(&entry.path) {
            Ok(route) => route,
            Err(e) => {
                diag.error_with_hint(field("path"), e.to_string(), "use a path like \"/about\"");
                continue;
            }
        };

        if route.is_root() && entry.layout == Layout::Flat {
            diag.error_with_hint(
                field("layout"),
                "the root route has no flat file",
                "use layout = \"directory\"",
            );
            continue;
        }

        for file in entry.layout.files(&route) {
            if let Some(&other) = claimed.get(&file) {
                diag.error(
                    field("path"),
                    format!(
                        "writes `{}`, already written by routes[{other}] (`{}`)",
                        file.display(),
                        routes[other].path
                    ),
                );
            } else {
                claimed.insert(file, index);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_parse_config;

    fn validate(toml: &str) -> ConfigDiagnostics {
        let config = test_parse_config(toml);
        let mut diag = ConfigDiagnostics::new();
        validate_routes(&config.routes, &mut diag);
        diag
    }

    fn error_fields(diag: &ConfigDiagnostics) -> Vec<&str> {
        diag.errors().iter().map(|e| e.field.as_str()).collect()
    }

    #[test]
    fn test_parse_routes() {
        let config = test_parse_config(
            r#"
[[routes]]
path = "/"

[[routes]]
path = "/about"
strategy = "template"
layout = "both"
title = "About Us"
canonical = "https://example.org/about"
"#,
        );
        assert_eq!(config.routes.len(), 2);
        assert_eq!(config.routes[0].strategy, Strategy::Crawl);
        assert_eq!(config.routes[0].layout, Layout::Directory);

        let about = &config.routes[1];
        assert_eq!(about.strategy, Strategy::Template);
        assert_eq!(about.layout, Layout::Both);
        assert_eq!(about.title.as_deref(), Some("About Us"));
        let route = RoutePath::parse(&about.path).unwrap();
        assert_eq!(about.template_name(&route), "about.html");
    }

    #[test]
    fn test_unknown_route_field_rejected() {
        let result = toml::from_str::<RouteConfig>("path = \"/a\"\ntitel = \"x\"");
        assert!(result.is_err());
    }

    #[test]
    fn test_layout_files() {
        let about = RoutePath::parse("/about").unwrap();
        assert_eq!(Layout::Directory.files(&about), [PathBuf::from("about/index.html")]);
        assert_eq!(Layout::Flat.files(&about), [PathBuf::from("about.html")]);
        assert_eq!(
            Layout::Both.files(&about),
            [PathBuf::from("about/index.html"), PathBuf::from("about.html")]
        );
        let root = RoutePath::parse("/").unwrap();
        assert_eq!(Layout::Both.files(&root), [PathBuf::from("index.html")]);
    }

    #[test]
    fn test_empty_metadata_rejected() {
        let diag = validate("[[routes]]\npath = \"/about\"\ntitle = \"  \"\nog_url = \"\"");
        assert_eq!(error_fields(&diag), ["routes[0].title", "routes[0].og_url"]);
    }

    #[test]
    fn test_invalid_path_rejected() {
        let diag = validate("[[routes]]\npath = \"about\"\n[[routes]]\npath = \"/a/../b\"");
        assert_eq!(error_fields(&diag), ["routes[0].path", "routes[1].path"]);
    }

    #[test]
    fn test_root_flat_rejected() {
        let diag = validate("[[routes]]\npath = \"/\"\nlayout = \"flat\"");
        assert_eq!(error_fields(&diag), ["routes[0].layout"]);
    }

    #[test]
    fn test_duplicate_destination_rejected() {
        let diag = validate("[[routes]]\npath = \"/about\"\n[[routes]]\npath = \"/about/\"");
        assert_eq!(error_fields(&diag), ["routes[1].path"]);
        assert!(diag.errors()[0].message.contains("routes[0]"));
    }

    #[test]
    fn test_template_escape_rejected() {
        let diag = validate(
            "[[routes]]\npath = \"/a\"\nstrategy = \"template\"\ntemplate = \"../secret.html\"",
        );
        assert_eq!(error_fields(&diag), ["routes[0].template"]);
    }

    #[test]
    fn test_relative_canonical_warns() {
        let diag = validate("[[routes]]\npath = \"/a\"\ncanonical = \"/a\"");
        assert!(!diag.has_errors());
        assert_eq!(diag.warnings().len(), 1);
    }

    #[test]
    fn test_no_routes_warns() {
        let diag = validate("");
        assert!(!diag.has_errors());
        assert_eq!(diag.warnings().len(), 1);
    }
}
