//! Static page materializer.
//!
//! Turns the bundler's single-page build into one static document per
//! route:
//!
//! ```text
//! shell ──► assets::extract ──► AssetManifest
//!                                   │
//! route ──► render ──► base ──► merge(metadata, manifest) ──► write
//!   (× N, on a `build.jobs` pool)                               │
//!                                                   _redirects ◄┘
//! ```
//!
//! A failing route never stops the build: it is reported as degraded and
//! the remaining routes continue.

pub mod assets;
pub mod audit;
mod dom;
pub mod merge;
pub mod redirects;
pub mod render;
pub mod sitemap;
pub mod types;
pub mod write;

pub use render::{RenderError, Renderer};
pub use types::{AssetKind, AssetManifest, AssetTag, MetadataRecord, Route};
pub use write::OutputWriter;

use std::fs;
use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use rayon::prelude::*;

use crate::browser::{Browser, RenderBudget};
use crate::config::{OnFailure, SiteConfig, Strategy};
use crate::core::{RoutePath, is_shutdown};
use crate::logger::ProgressLine;
use crate::server::{Shell, StaticServer, StaticSite};
use crate::{debug, log};

/// A route that did not get its own static document, or got one built
/// from the shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Degraded {
    pub route: RoutePath,
    pub reason: String,
    /// The shell was used as the base document (`on_failure = "shell"`).
    pub used_shell: bool,
}

/// Result of materializing every route.
#[derive(Debug, Default)]
pub struct BuildReport {
    /// Routes written, in route-table order.
    pub written: Vec<Route>,
    pub files: Vec<PathBuf>,
    pub degraded: Vec<Degraded>,
    /// Routes not started because of Ctrl+C.
    pub interrupted: usize,
    pub redirects_added: usize,
    pub assets: usize,
}

enum Outcome {
    Written {
        files: Vec<PathBuf>,
        degraded: Option<Degraded>,
    },
    Failed(Degraded),
    Interrupted,
}

/// Everything the per-route step reads.
struct Worker<'a> {
    renderer: Renderer<'a>,
    writer: &'a OutputWriter,
    manifest: &'a AssetManifest,
    shell: Option<&'a str>,
    on_failure: OnFailure,
    progress: &'a ProgressLine,
}

/// Materialize every route of the config.
pub fn materialize(config: &SiteConfig, browser: &dyn Browser) -> Result<BuildReport> {
    let routes = Route::table(config).context("invalid route table")?;
    if routes.is_empty() {
        log!("build"; "no routes declared");
        return Ok(BuildReport::default());
    }

    let shell = load_shell(config);
    let manifest = shell
        .as_deref()
        .map(|shell| assets::extract(shell, &config.build.assets_prefix))
        .unwrap_or_default();
    if shell.is_some() && manifest.is_empty() {
        log!("warning"; "no bundler assets found in {}, pages will load without scripts or styles", config.shell_path().display());
    }
    debug!("assets"; "{}", crate::utils::plural(manifest.len(), "asset tag"));

    let count = |strategy: Strategy| routes.iter().filter(|r| r.strategy == strategy).count();
    let crawls = count(Strategy::Crawl);
    let templates = count(Strategy::Template);

    if crawls > 0 && !browser.is_available() {
        log!("warning"; "{} will fall back: no headless browser", crate::utils::plural(crawls, "crawl route"));
    }
    // Serves the pinned shell, so writing `index.html` mid-build is harmless
    let server = match &shell {
        Some(shell) if crawls > 0 => Some(StaticServer::start(StaticSite::new(
            config.output_dir(),
            Shell::Pinned(shell.clone().into_bytes()),
        ))?),
        _ => None,
    };
    let origin = server.as_ref().map(StaticServer::origin);

    let writer = OutputWriter::new(config.output_dir());
    let progress = ProgressLine::new(&[("crawl", crawls), ("template", templates)]);
    let ctx = Worker {
        renderer: Renderer::new(
            browser,
            origin.as_deref(),
            config.templates_dir(),
            RenderBudget::from_config(&config.crawl),
            &config.crawl.root_id,
        ),
        writer: &writer,
        manifest: &manifest,
        shell: shell.as_deref(),
        on_failure: config.build.on_failure,
        progress: &progress,
    };

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.build.jobs.max(1))
        .thread_name(|i| format!("route-{i}"))
        .build()
        .context("failed to create route worker pool")?;
    let outcomes: Vec<Outcome> = pool.install(|| routes.par_iter().map(|route| process(route, &ctx)).collect());

    progress.finish();
    drop(server);

    let mut report = BuildReport {
        assets: manifest.len(),
        ..Default::default()
    };
    let mut rules = Vec::new();
    for (route, outcome) in routes.into_iter().zip(outcomes) {
        match outcome {
            Outcome::Written { files, degraded } => {
                if route.layout.needs_redirect()
                    && let Some(rule) = redirects::rule_for(&route.path)
                {
                    rules.push(rule);
                }
                report.files.extend(files);
                report.degraded.extend(degraded);
                report.written.push(route);
            }
            Outcome::Failed(degraded) => report.degraded.push(degraded),
            Outcome::Interrupted => report.interrupted += 1,
        }
    }

    report.redirects_added = match redirects::write_redirects(config.output_dir(), &rules) {
        Ok(added) => added,
        Err(e) => {
            log!("warning"; "{e:#}");
            0
        }
    };
    Ok(report)
}

/// The bundler's shell.
///
/// `index.html` is saved to [`SiteConfig::shell_copy_path`] whenever it
/// looks like a fresh bundle. Once the root route has been materialized,
/// `index.html` is a rendered page carrying the same bundle's assets, and
/// the saved copy is used instead.
fn load_shell(config: &SiteConfig) -> Option<String> {
    let shell_path = config.shell_path();
    let copy_path = config.shell_copy_path();
    let current = match fs::read_to_string(&shell_path) {
        Ok(current) => current,
        Err(e) => {
            log!("warning"; "reference document {} unreadable ({e}), pages get no assets", shell_path.display());
            return None;
        }
    };
    let saved = fs::read_to_string(&copy_path).ok();

    if let Some(saved) = saved.as_deref()
        && render::is_mounted(&current, &config.crawl.root_id)
    {
        let prefix = &config.build.assets_prefix;
        if assets::extract(saved, prefix).is_subset_of(&assets::extract(&current, prefix)) {
            debug!("shell"; "{} is a rendered page, using {}", shell_path.display(), copy_path.display());
            return Some(saved.to_owned());
        }
    } else if saved.as_deref() == Some(current.as_str()) {
        return Some(current);
    }

    if let Err(e) = write::write_atomic(&copy_path, |file| file.write_all(current.as_bytes())) {
        log!("warning"; "{e:#}");
    }
    Some(current)
}

/// Render, merge and write one route.
fn process(route: &Route, ctx: &Worker) -> Outcome {
    if is_shutdown() {
        return Outcome::Interrupted;
    }

    let kind = match route.strategy {
        Strategy::Crawl => "crawl",
        Strategy::Template => "template",
    };
    let result = render_base(route, ctx);
    ctx.progress.inc(kind);

    let (base, degraded) = match result {
        Ok(found) => found,
        Err(degraded) => {
            log!("skip"; "{}: {}", degraded.route, degraded.reason);
            return Outcome::Failed(degraded);
        }
    };
    if let Some(degraded) = &degraded {
        log!("warning"; "{}: {}, using the shell", degraded.route, degraded.reason);
    }

    let html = merge::merge(&base, &route.metadata, ctx.manifest);
    let mut files = Vec::new();
    for file in route.layout.files(&route.path) {
        match ctx.writer.write(&file, html.as_bytes()) {
            Ok(path) => files.push(path),
            Err(e) => {
                let degraded = Degraded {
                    route: route.path.clone(),
                    reason: format!("{e:#}"),
                    used_shell: false,
                };
                log!("error"; "{}: {}", degraded.route, degraded.reason);
                return Outcome::Failed(degraded);
            }
        }
    }
    Outcome::Written { files, degraded }
}

/// The base document, or the shell when rendering failed and the config
/// asks for it.
fn render_base(route: &Route, ctx: &Worker) -> Result<(String, Option<Degraded>), Degraded> {
    let error = match ctx.renderer.render(route) {
        Ok(html) => return Ok((html, None)),
        Err(e) => e,
    };

    let reason = error.to_string();
    match (ctx.on_failure, ctx.shell) {
        (OnFailure::Shell, Some(shell)) => Ok((
            shell.to_owned(),
            Some(Degraded {
                route: route.path.clone(),
                reason,
                used_shell: true,
            }),
        )),
        _ => Err(Degraded {
            route: route.path.clone(),
            reason,
            used_shell: false,
        }),
    }
}
