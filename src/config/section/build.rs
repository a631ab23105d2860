//! `[build]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [build]
//! output = "dist"                       # Bundler output, also the static tree
//! templates = "prerender"               # Hand-authored route templates
//! shell = "index.html"                  # Reference document inside output
//! assets_prefix = "/assets/"            # Where the bundler emits entry assets
//! jobs = 1                              # Routes processed in parallel
//! on_failure = "skip"                   # skip | shell
//! bundle = ["npm", "run", "build"]      # Bundle command, run before materializing
//! sitemap = false                       # Write sitemap.xml (needs site.url)
//! ```

use crate::config::ConfigDiagnostics;
use macros::Config;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// What to do with a route whose renderer failed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OnFailure {
    /// Write nothing; the route keeps being served by the single-page shell.
    #[default]
    Skip,
    /// Use the shell as the base document so the route still gets its metadata.
    Shell,
}

/// Build settings.
#[derive(Debug, Clone, Serialize, Deserialize, Config)]
#[serde(default)]
#[config(section = "build")]
pub struct BuildSectionConfig {
    /// Bundler output directory, materialized pages are written here too.
    #[config(inline_doc)]
    pub output: PathBuf,

    /// Directory of hand-authored route templates.
    #[config(inline_doc)]
    pub templates: PathBuf,

    /// Reference document the assets are extracted from, relative to output.
    #[config(inline_doc)]
    pub shell: PathBuf,

    /// URL prefix of bundler entry assets. Empty accepts any local URL.
    #[config(inline_doc)]
    pub assets_prefix: String,

    /// Number of routes processed in parallel.
    #[config(inline_doc)]
    pub jobs: usize,

    /// Failed routes: "skip" writes nothing, "shell" merges into the shell.
    #[config(inline_doc)]
    pub on_failure: OnFailure,

    /// Bundle command run by `staticize build`, e.g. ["npm", "run", "build"].
    pub bundle: Vec<String>,

    /// Write sitemap.xml for materialized routes (requires site.url).
    #[config(inline_doc)]
    pub sitemap: bool,

    /// Set by `--skip-bundle`.
    #[serde(skip)]
    #[config(skip)]
    pub skip_bundle: bool,
}

impl Default for BuildSectionConfig {
    fn default() -> Self {
        Self {
            output: "dist".into(),
            templates: "prerender".into(),
            shell: "index.html".into(),
            assets_prefix: "/assets/".into(),
            jobs: 1,
            on_failure: OnFailure::Skip,
            bundle: Vec::new(),
            sitemap: false,
            skip_bundle: false,
        }
    }
}

impl BuildSectionConfig {
    /// Validate build configuration.
    ///
    /// Runs before path normalization, so relative paths are still as written.
    pub fn validate(&self, site_url: Option<&str>, diag: &mut ConfigDiagnostics) {
        if self.jobs == 0 {
            diag.error(Self::FIELDS.jobs, "must be at least 1");
        }

        if self.output.as_os_str().is_empty() {
            diag.error(Self::FIELDS.output, "must not be empty");
        }

        if self.shell.as_os_str().is_empty() || self.shell.is_absolute() {
            diag.error_with_hint(
                Self::FIELDS.shell,
                "must be a file name relative to the output directory",
                "the default is \"index.html\"",
            );
        }

        if !self.assets_prefix.is_empty() && !self.assets_prefix.starts_with('/') {
            diag.error_with_hint(
                Self::FIELDS.assets_prefix,
                format!("`{}` is not a root-relative URL path", self.assets_prefix),
                "use a prefix like \"/assets/\", or \"\" to accept any local URL",
            );
        }

        if self.bundle.first().is_some_and(|program| program.trim().is_empty()) {
            diag.error(Self::FIELDS.bundle, "first element must name a program");
        }

        if self.sitemap && site_url.is_none() {
            diag.error_with_hint(
                Self::FIELDS.sitemap,
                "sitemap is enabled but site.url is not configured",
                "set site.url, e.g.: \"https://example.org\"",
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_parse_config;

    #[test]
    fn test_build_defaults() {
        let config = test_parse_config("");
        let build = &config.build;
        assert_eq!(build.output, PathBuf::from("dist"));
        assert_eq!(build.templates, PathBuf::from("prerender"));
        assert_eq!(build.assets_prefix, "/assets/");
        assert_eq!(build.jobs, 1);
        assert_eq!(build.on_failure, OnFailure::Skip);
        assert!(build.bundle.is_empty());
        assert!(!build.sitemap);
    }

    #[test]
    fn test_build_parse() {
        let config = test_parse_config(
            "[build]\noutput = \"public\"\njobs = 4\non_failure = \"shell\"\nbundle = [\"npm\", \"run\", \"build\"]",
        );
        assert_eq!(config.build.output, PathBuf::from("public"));
        assert_eq!(config.build.jobs, 4);
        assert_eq!(config.build.on_failure, OnFailure::Shell);
        assert_eq!(config.build.bundle, ["npm", "run", "build"]);
    }

    #[test]
    fn test_build_validation() {
        let mut build = BuildSectionConfig::default();
        build.jobs = 0;
        build.assets_prefix = "assets/".into();
        build.sitemap = true;

        let mut diag = ConfigDiagnostics::new();
        build.validate(None, &mut diag);
        let fields: Vec<_> = diag.errors().iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, ["build.jobs", "build.assets_prefix", "build.sitemap"]);
    }

    #[test]
    fn test_sitemap_with_url_ok() {
        let mut build = BuildSectionConfig::default();
        build.sitemap = true;
        let mut diag = ConfigDiagnostics::new();
        build.validate(Some("https://example.org"), &mut diag);
        assert!(!diag.has_errors());
    }

    #[test]
    fn test_template_lists_fields() {
        let template = BuildSectionConfig::template_with_header();
        assert!(template.contains("[build]"));
        assert!(template.contains("jobs = 1"));
        assert!(template.contains("on_failure = \"skip\""));
        assert!(!template.contains("skip_bundle"));
    }
}
