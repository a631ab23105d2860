//! Project configuration from `staticize.toml`.
//!
//! # Module Structure
//!
//! ```text
//! config/
//! ├── section/       # Configuration section definitions
//! │   ├── site       # [site]
//! │   ├── build      # [build]
//! │   ├── crawl      # [crawl]
//! │   ├── serve      # [serve]
//! │   ├── functions  # [functions], [functions.payment], [functions.volunteer]
//! │   └── routes     # [[routes]]
//! ├── types/         # ConfigError, ConfigDiagnostics, FieldPath
//! └── mod.rs         # SiteConfig (this file)
//! ```

pub mod section;
pub mod types;
mod util;

use util::find_config_file;

pub use section::{
    BuildSectionConfig, CrawlConfig, FunctionsConfig, Layout, OnFailure, PaymentConfig,
    RouteConfig, ServeConfig, SiteSectionConfig, Strategy, VolunteerConfig,
};
pub use types::{ConfigDiagnostics, ConfigError, FieldPath};

use crate::{
    cli::{Cli, Commands},
    log,
    utils::path::normalize_path,
};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

/// File name of the saved shell inside the output directory.
const SHELL_COPY: &str = ".shell.html";

/// Example route appended to the generated config template.
const ROUTE_TEMPLATE: &str = r#"
# One entry per route. Metadata fields fall back to [site].
# [[routes]]
# path = "/about"
# strategy = "template"          # crawl | template
# template = "about.html"        # default: path with `/` replaced by `-`
# layout = "directory"           # directory | flat | both
# title = "About Us"
# description = ""
# canonical = "https://example.org/about"
"#;

// ============================================================================
// root configuration
// ============================================================================

/// Root configuration structure representing staticize.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    /// Absolute path to the config file (internal use only)
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Project root directory - parent of config file (internal use only)
    #[serde(skip)]
    pub root: PathBuf,

    pub site: SiteSectionConfig,
    pub build: BuildSectionConfig,
    pub crawl: CrawlConfig,
    pub serve: ServeConfig,
    pub functions: FunctionsConfig,
    pub routes: Vec<RouteConfig>,
}

impl SiteConfig {
    /// Load configuration for the given command line.
    ///
    /// `init` gets defaults rooted at the cwd; every other command searches
    /// upward from the cwd for the config file, and the project root is the
    /// config file's parent directory.
    pub fn load(cli: &Cli) -> Result<Self> {
        let cwd = std::env::current_dir().context("Failed to get current working directory")?;

        if cli.is_init() {
            let mut config = Self::default();
            config.config_path = cwd.join(&cli.config);
            config.root = cwd;
            return Ok(config);
        }

        let config_path =
            find_config_file(&cli.config).ok_or_else(|| ConfigError::NotFound(cli.config.clone()))?;

        let mut config = Self::from_path(&config_path)?;
        config.config_path = normalize_path(&config_path);
        config.root = config
            .config_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or(cwd);

        config.apply_command_options(cli);
        config.validate()?;
        config.normalize_paths();
        Ok(config)
    }

    /// Load configuration from file path with unknown field detection.
    fn from_path(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;

        let (config, ignored) = Self::parse_with_ignored(&content)?;
        if !ignored.is_empty() {
            Self::print_unknown_fields_warning(&ignored, path);
        }
        Ok(config)
    }

    /// Parse TOML content, collecting any unknown fields.
    fn parse_with_ignored(content: &str) -> Result<(Self, Vec<String>), ConfigError> {
        let mut ignored = Vec::new();
        let deserializer = toml::Deserializer::new(content);
        let config = serde_ignored::deserialize(deserializer, |path: serde_ignored::Path| {
            ignored.push(path.to_string());
        })?;
        Ok((config, ignored))
    }

    fn print_unknown_fields_warning(fields: &[String], path: &Path) {
        let display_path = path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_else(|| path.to_string_lossy());
        log!("warning"; "unknown fields in {}, ignoring:", display_path);
        for field in fields {
            eprintln!("- {field}");
        }
    }

    // ========================================================================
    // cli configuration updates
    // ========================================================================

    /// Apply command-specific configuration options.
    fn apply_command_options(&mut self, cli: &Cli) {
        Self::update_option(&mut self.build.output, cli.output.as_ref());

        match &cli.command {
            Commands::Build { build_args } => {
                crate::logger::set_verbose(build_args.verbose);
                Self::update_option(&mut self.build.jobs, build_args.jobs.as_ref());
                self.build.skip_bundle = build_args.skip_bundle;
            }
            Commands::Serve { interface, port } => {
                Self::update_option(&mut self.serve.interface, interface.as_ref());
                Self::update_option(&mut self.serve.port, port.as_ref());
            }
            Commands::Init { .. } | Commands::Validate { .. } => {}
        }
    }

    /// Update config option if CLI value is provided.
    fn update_option<T: Clone>(config_option: &mut T, cli_option: Option<&T>) {
        if let Some(option) = cli_option {
            *config_option = option.clone();
        }
    }

    /// Resolve the output and templates directories against the root.
    fn normalize_paths(&mut self) {
        self.build.output = normalize_path(&self.root.join(&self.build.output));
        self.build.templates = normalize_path(&self.root.join(&self.build.templates));
    }

    // ========================================================================
    // accessors
    // ========================================================================

    pub fn output_dir(&self) -> &Path {
        &self.build.output
    }

    pub fn templates_dir(&self) -> &Path {
        &self.build.templates
    }

    /// The bundler's single-page shell, the reference document for assets.
    pub fn shell_path(&self) -> PathBuf {
        self.build.output.join(&self.build.shell)
    }

    /// Saved copy of the shell. The root route's page replaces `index.html`,
    /// so later builds read the shell from here.
    pub fn shell_copy_path(&self) -> PathBuf {
        self.build.output.join(SHELL_COPY)
    }

    /// Where the shell currently lives: the saved copy once a build made one.
    pub fn shell_source(&self) -> PathBuf {
        let copy = self.shell_copy_path();
        if copy.is_file() { copy } else { self.shell_path() }
    }

    // ========================================================================
    // validation
    // ========================================================================

    /// Validate the configuration, collecting every error before failing.
    ///
    /// Runs before path normalization so paths are checked as written.
    pub fn validate(&self) -> Result<()> {
        let mut diag = ConfigDiagnostics::new();

        self.site.validate(&mut diag);
        self.build.validate(self.site.url.as_deref(), &mut diag);
        self.crawl.validate(&mut diag);
        self.functions.validate(&mut diag);
        section::validate_routes(&self.routes, &mut diag);

        diag.print_warnings();
        diag.into_result()
            .map_err(|e| ConfigError::Diagnostics(e).into())
    }

    /// Commented config file written by `staticize init`.
    pub fn template() -> String {
        [
            SiteSectionConfig::template_with_header(),
            BuildSectionConfig::template_with_header(),
            CrawlConfig::template_with_header(),
            ServeConfig::template_with_header(),
            FunctionsConfig::template_with_header(),
        ]
        .join("\n")
            + ROUTE_TEMPLATE
    }
}

// ============================================================================
// Test Helpers (available to all modules via `use crate::config::test_*`)
// ============================================================================

/// Parse config with a minimal `[site]` table.
/// Panics if there are unknown fields (to catch config typos in tests).
#[cfg(test)]
pub fn test_parse_config(extra: &str) -> SiteConfig {
    let config = format!("[site]\ntitle = \"Test\"\ndescription = \"Test\"\n{extra}");
    let (parsed, ignored) = SiteConfig::parse_with_ignored(&config).unwrap();
    assert!(
        ignored.is_empty(),
        "test config has unknown fields: {:?}",
        ignored
    );
    parsed
}

/// Config rooted at a temporary directory, with absolute output and
/// templates directories, as `load` would produce.
#[cfg(test)]
pub fn test_config_at(root: &Path, extra: &str) -> SiteConfig {
    let mut config = test_parse_config(extra);
    config.root = root.to_path_buf();
    config.config_path = root.join("staticize.toml");
    config.normalize_paths();
    config
}

// ============================================================================
// tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_invalid_toml() {
        assert!(SiteConfig::parse_with_ignored("[site\ntitle = \"x\"").is_err());
    }

    #[test]
    fn test_unknown_fields_detected() {
        let content = "[site]\ntitle = \"Test\"\n[unknown_section]\nfield = \"value\"";
        let (config, ignored) = SiteConfig::parse_with_ignored(content).unwrap();
        assert_eq!(config.site.title, "Test");
        assert!(ignored.iter().any(|f| f.contains("unknown_section")));
    }

    #[test]
    fn test_cli_overrides() {
        let cli = Cli::parse_from(["staticize", "build", "-o", "public", "-j", "3", "--skip-bundle"]);
        let mut config = test_parse_config("");
        config.apply_command_options(&cli);
        assert_eq!(config.build.output, PathBuf::from("public"));
        assert_eq!(config.build.jobs, 3);
        assert!(config.build.skip_bundle);
    }

    #[test]
    fn test_validate_collects_all_errors() {
        let config = test_parse_config(
            "url = \"nope\"\n[build]\njobs = 0\n[[routes]]\npath = \"about\"",
        );
        let err = config.validate().unwrap_err();
        let Some(ConfigError::Diagnostics(diag)) = err.downcast_ref::<ConfigError>() else {
            panic!("expected diagnostics, got {err}");
        };
        let fields: Vec<_> = diag.errors().iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, ["site.url", "build.jobs", "routes[0].path"]);
    }

    #[test]
    fn test_paths_resolved_against_root() {
        let dir = tempfile::TempDir::new().unwrap();
        let config = test_config_at(dir.path(), "[build]\noutput = \"public\"");
        assert!(config.output_dir().is_absolute());
        assert!(config.output_dir().ends_with("public"));
        assert!(config.templates_dir().ends_with("prerender"));
        assert_eq!(config.shell_path(), config.output_dir().join("index.html"));
        assert_eq!(config.shell_source(), config.shell_path());
        fs::create_dir_all(config.output_dir()).unwrap();
        fs::write(config.shell_copy_path(), "shell").unwrap();
        assert_eq!(config.shell_source(), config.output_dir().join(".shell.html"));
    }

    #[test]
    fn test_template_parses_back() {
        let template = SiteConfig::template();
        let (config, ignored) = SiteConfig::parse_with_ignored(&template).unwrap();
        assert!(ignored.is_empty(), "{ignored:?}");
        assert_eq!(config.build.jobs, 1);
        assert_eq!(config.serve.port, 4173);
        assert!(config.routes.is_empty());
    }
}
