//! `staticize build`: bundle, then materialize every route.

use anyhow::{Context, Result};
use owo_colors::OwoColorize;

use crate::browser::select_browser;
use crate::config::SiteConfig;
use crate::log;
use crate::materialize::{self, BuildReport, sitemap::Sitemap};
use crate::utils::exec::{BUNDLE_FILTER, Cmd};
use crate::utils::plural;

/// Run the whole build.
///
/// The bundle command failing stops the build; route failures do not, they
/// are listed in the summary.
pub fn build_site(config: &SiteConfig) -> Result<BuildReport> {
    run_bundle(config)?;

    let shell = config.shell_path();
    if !shell.is_file() {
        log!("warning"; "{} does not exist, did the bundler write to {}?",
            shell.display(), config.output_dir().display());
    }

    let browser = select_browser(&config.crawl);
    let report = materialize::materialize(config, browser.as_ref())?;

    if config.build.sitemap
        && let Some(base) = config.site.url.as_deref()
    {
        Sitemap::build(base, &report.written).write(config.output_dir())?;
    }

    print_summary(&report);
    Ok(report)
}

/// Run `build.bundle` in the project root unless skipped.
fn run_bundle(config: &SiteConfig) -> Result<()> {
    let bundle = &config.build.bundle;
    if config.build.skip_bundle || bundle.is_empty() {
        return Ok(());
    }

    log!("bundle"; "{}", bundle.join(" "));
    Cmd::from_slice(bundle.as_slice())
        .cwd(&config.root)
        .pty(true)
        .filter(&BUNDLE_FILTER)
        .run()
        .with_context(|| format!("bundle command `{}` failed", bundle.join(" ")))?;
    Ok(())
}

fn print_summary(report: &BuildReport) {
    let degraded = report.degraded.len();
    log!("done"; "{} written, {} degraded, {}",
        plural(report.written.len(), "route"),
        degraded,
        plural(report.files.len(), "file"));

    if report.redirects_added > 0 {
        log!("write"; "{} added to _redirects", plural(report.redirects_added, "rule"));
    }
    if report.interrupted > 0 {
        log!("warning"; "{} not started (interrupted)", plural(report.interrupted, "route"));
    }
    if degraded == 0 {
        return;
    }

    eprintln!();
    eprintln!("{}", "degraded routes".red().bold());
    for entry in &report.degraded {
        let fallback = if entry.used_shell { " (wrote shell)" } else { "" };
        eprintln!("{}{}{}", "[".dimmed(), entry.route.as_str().cyan(), "]".dimmed());
        eprintln!("{} {}{}", "→".red(), entry.reason, fallback.dimmed());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_config_at;
    use std::fs;

    #[test]
    fn test_skip_bundle() {
        let dir = tempfile::TempDir::new().unwrap();
        let mut config = test_config_at(dir.path(), "[build]\nbundle = [\"false\"]");
        config.build.skip_bundle = true;
        assert!(run_bundle(&config).is_ok());
    }

    #[test]
    fn test_empty_bundle_is_noop() {
        let dir = tempfile::TempDir::new().unwrap();
        let config = test_config_at(dir.path(), "[build]\nbundle = []");
        assert!(run_bundle(&config).is_ok());
    }

    #[cfg(unix)]
    #[test]
    fn test_bundle_failure_stops_build() {
        let dir = tempfile::TempDir::new().unwrap();
        let config = test_config_at(dir.path(), "[build]\nbundle = [\"sh\", \"-c\", \"exit 3\"]");
        let err = build_site(&config).unwrap_err();
        assert!(format!("{err:#}").contains("bundle command"));
    }

    #[test]
    fn test_build_writes_sitemap() {
        let dir = tempfile::TempDir::new().unwrap();
        let config = test_config_at(
            dir.path(),
            r#"url = "https://example.org"

[build]
bundle = []
sitemap = true

[[routes]]
path = "/about"
strategy = "template"
"#,
        );
        fs::create_dir_all(config.templates_dir()).unwrap();
        fs::write(config.templates_dir().join("about.html"), "<head></head>").unwrap();

        let report = build_site(&config).unwrap();
        assert_eq!(report.written.len(), 1);
        let sitemap = fs::read_to_string(config.output_dir().join("sitemap.xml")).unwrap();
        assert!(sitemap.contains("<loc>https://example.org/about</loc>"));
    }
}
