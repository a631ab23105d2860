//! `staticize validate`: check the output tree against the route table.
//!
//! For every route and every file its layout writes:
//!
//! - the file exists
//! - the head holds exactly one `<title>`, equal to the resolved title
//! - description, canonical and Open Graph tags carry the resolved values
//! - every manifest asset is loaded exactly once

use std::collections::BTreeMap;
use std::fs;

use anyhow::{Context, Result};
use owo_colors::OwoColorize;

use crate::config::SiteConfig;
use crate::log;
use crate::materialize::{AssetManifest, Route, assets, audit::audit};
use crate::utils::plural;

/// Problems grouped by output file.
#[derive(Debug, Default)]
pub struct ValidationReport {
    pub files: BTreeMap<String, Vec<String>>,
    pub checked: usize,
}

impl ValidationReport {
    fn add(&mut self, file: String, problem: String) {
        self.files.entry(file).or_default().push(problem);
    }

    pub fn error_count(&self) -> usize {
        self.files.values().map(Vec::len).sum()
    }

    pub fn is_ok(&self) -> bool {
        self.files.is_empty()
    }

    fn print(&self) {
        if self.files.is_empty() {
            return;
        }
        eprintln!();
        eprintln!(
            "{} {}",
            "pages".red().bold(),
            format!(
                "({}, {})",
                plural(self.files.len(), "file"),
                plural(self.error_count(), "error")
            )
            .dimmed()
        );
        for (file, problems) in &self.files {
            eprintln!("{}{}{}", "[".dimmed(), file.cyan(), "]".dimmed());
            for problem in problems {
                eprintln!("{} {}", "→".red(), problem);
            }
        }
    }
}

/// Validate the output tree; fails unless `warn_only`.
pub fn validate_site(config: &SiteConfig, warn_only: bool) -> Result<()> {
    let report = check_output(config)?;
    report.print();

    if report.is_ok() {
        log!("validate"; "{} checked, all valid", plural(report.checked, "file"));
        return Ok(());
    }

    let summary = format!(
        "found {} in {}",
        plural(report.error_count(), "error"),
        plural(report.files.len(), "file")
    );
    if warn_only {
        log!("warning"; "{summary}");
        Ok(())
    } else {
        anyhow::bail!(summary)
    }
}

/// Check every output file of every route.
pub fn check_output(config: &SiteConfig) -> Result<ValidationReport> {
    let routes = Route::table(config).context("invalid route table")?;
    let manifest = match assets::extract_file(&config.shell_source(), &config.build.assets_prefix) {
        Ok(manifest) => manifest,
        Err(e) => {
            log!("warning"; "{e:#}, asset checks skipped");
            AssetManifest::default()
        }
    };

    let mut report = ValidationReport::default();
    for route in &routes {
        for file in route.layout.files(&route.path) {
            let name = file.display().to_string();
            let path = config.output_dir().join(&file);
            report.checked += 1;

            let html = match fs::read_to_string(&path) {
                Ok(html) => html,
                Err(e) => {
                    report.add(name, format!("cannot read: {e}"));
                    continue;
                }
            };
            for mismatch in audit(&html, &route.metadata, &manifest) {
                report.add(name.clone(), mismatch.to_string());
            }
        }
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_config_at;

    const SHELL: &str = r#"<html><head><title>Site</title>
<link rel="stylesheet" href="/assets/index-C3.css">
</head><body><div id="root"></div></body></html>"#;

    fn project() -> (tempfile::TempDir, SiteConfig) {
        let dir = tempfile::TempDir::new().unwrap();
        let config = test_config_at(
            dir.path(),
            "[[routes]]\npath = \"/about\"\nstrategy = \"template\"\ntitle = \"About\"\nlayout = \"both\"",
        );
        fs::create_dir_all(config.output_dir().join("about")).unwrap();
        fs::write(config.shell_path(), SHELL).unwrap();
        (dir, config)
    }

    #[test]
    fn test_valid_output() {
        let (_dir, config) = project();
        let page = r#"<html><head><title>About</title>
<meta name="description" content="Test">
<meta property="og:title" content="About">
<meta property="og:description" content="Test">
<link rel="stylesheet" href="/assets/index-C3.css">
</head></html>"#;
        fs::write(config.output_dir().join("about/index.html"), page).unwrap();
        fs::write(config.output_dir().join("about.html"), page).unwrap();

        let report = check_output(&config).unwrap();
        assert_eq!(report.checked, 2);
        assert!(report.is_ok(), "{:?}", report.files);
        assert!(validate_site(&config, false).is_ok());
    }

    #[test]
    fn test_missing_file_and_wrong_title() {
        let (_dir, config) = project();
        fs::write(config.output_dir().join("about/index.html"), SHELL).unwrap();

        let report = check_output(&config).unwrap();
        assert_eq!(report.files.len(), 2);
        assert!(report.files["about.html"][0].starts_with("cannot read"));
        let problems = &report.files["about/index.html"];
        assert!(problems.iter().any(|p| p.contains("title is `Site`")));

        assert!(validate_site(&config, false).is_err());
        assert!(validate_site(&config, true).is_ok());
    }
}
