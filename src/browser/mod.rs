//! Headless browser capability.
//!
//! Crawling needs a browser that can load a URL and hand back the rendered
//! DOM. The capability is a trait with two implementations, chosen once per
//! build by [`select_browser`]:
//!
//! - [`HeadlessChrome`]: a Chrome/Chromium binary run with `--dump-dom`
//! - [`Unavailable`]: no binary found; every crawl fails with the reason

mod chrome;

pub use chrome::HeadlessChrome;

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::config::CrawlConfig;
use crate::debug;

/// Binaries tried, in order, when `crawl.browser` is not set.
const CANDIDATES: &[&str] = &[
    "chromium",
    "chromium-browser",
    "google-chrome",
    "google-chrome-stable",
    "chrome",
];

/// Time limits for one page load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderBudget {
    /// Wall-clock limit; the browser is killed when it passes.
    pub timeout: Duration,
    /// Virtual time the page gets to finish fetching and rendering.
    pub settle: Duration,
}

impl RenderBudget {
    pub fn from_config(crawl: &CrawlConfig) -> Self {
        Self {
            timeout: Duration::from_secs(crawl.timeout_secs),
            settle: Duration::from_millis(crawl.settle_ms),
        }
    }
}

#[derive(Debug, Error)]
pub enum BrowserError {
    #[error("no headless browser available: {0}")]
    Unavailable(String),

    #[error("page did not finish within {}s", .0.as_secs_f32())]
    Timeout(Duration),

    #[error("browser exited with {}: {stderr}", .code.map_or("a signal".to_string(), |c| format!("status {c}")))]
    Exit { code: Option<i32>, stderr: String },

    #[error("failed to start browser: {0}")]
    Spawn(String),
}

/// A browser that can render a URL to HTML.
///
/// Implementations must be usable from several build workers at once;
/// each call gets its own page (or process).
pub trait Browser: Send + Sync {
    fn name(&self) -> &str;

    fn is_available(&self) -> bool {
        true
    }

    /// Load `url`, let it settle, and return the serialized DOM.
    fn dump_dom(&self, url: &str, budget: &RenderBudget) -> Result<String, BrowserError>;
}

/// Stand-in when no browser binary exists.
#[derive(Debug, Clone)]
pub struct Unavailable {
    reason: String,
}

impl Unavailable {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl Browser for Unavailable {
    fn name(&self) -> &str {
        "unavailable"
    }

    fn is_available(&self) -> bool {
        false
    }

    fn dump_dom(&self, _url: &str, _budget: &RenderBudget) -> Result<String, BrowserError> {
        Err(BrowserError::Unavailable(self.reason.clone()))
    }
}

/// Pick the browser for this build.
///
/// An explicit `crawl.browser` is resolved on `PATH` (or used as a path);
/// otherwise the usual Chrome/Chromium names are tried.
pub fn select_browser(crawl: &CrawlConfig) -> Box<dyn Browser> {
    let found = match &crawl.browser {
        Some(name) => which::which(name)
            .map_err(|_| format!("`{name}` (from crawl.browser) was not found")),
        None => find_candidate().ok_or_else(|| {
            format!(
                "none of {} found on PATH, set crawl.browser",
                CANDIDATES.join(", ")
            )
        }),
    };

    match found {
        Ok(program) => {
            debug!("crawl"; "using {}", program.display());
            Box::new(HeadlessChrome::new(program, crawl.args.clone()))
        }
        Err(reason) => Box::new(Unavailable::new(reason)),
    }
}

fn find_candidate() -> Option<PathBuf> {
    CANDIDATES.iter().find_map(|name| which::which(name).ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn budget() -> RenderBudget {
        RenderBudget {
            timeout: Duration::from_secs(1),
            settle: Duration::from_millis(10),
        }
    }

    #[test]
    fn test_unavailable_fails_every_call() {
        let browser = Unavailable::new("no chromium");
        let err = browser.dump_dom("http://127.0.0.1:1/", &budget()).unwrap_err();
        assert!(matches!(err, BrowserError::Unavailable(_)));
        assert!(err.to_string().contains("no chromium"));
    }

    #[test]
    fn test_select_missing_explicit_browser() {
        let crawl = CrawlConfig {
            browser: Some("definitely-not-a-browser-binary".into()),
            ..Default::default()
        };
        let browser = select_browser(&crawl);
        assert_eq!(browser.name(), "unavailable");
        assert!(!browser.is_available());
    }

    #[test]
    fn test_budget_from_config() {
        let crawl = CrawlConfig::default();
        let budget = RenderBudget::from_config(&crawl);
        assert_eq!(budget.timeout, Duration::from_secs(30));
        assert_eq!(budget.settle, Duration::from_millis(5000));
    }

    #[test]
    fn test_error_display() {
        let exit = BrowserError::Exit {
            code: Some(21),
            stderr: "crashed".into(),
        };
        assert_eq!(exit.to_string(), "browser exited with status 21: crashed");
        let timeout = BrowserError::Timeout(Duration::from_millis(1500));
        assert_eq!(timeout.to_string(), "page did not finish within 1.5s");
    }
}
