//! `[crawl]` section configuration.
//!
//! Settings for routes rendered by loading the built application in a
//! headless browser.
//!
//! # Example
//!
//! ```toml
//! [crawl]
//! browser = "chromium"   # Auto-detected on PATH when unset
//! args = []              # Extra browser flags
//! timeout_secs = 30      # Wall-clock bound per route
//! settle_ms = 5000       # Virtual-time budget for the app to settle
//! root_id = "root"       # Mount element that must contain markup
//! ```

use crate::config::ConfigDiagnostics;
use macros::Config;
use serde::{Deserialize, Serialize};

/// Headless browser settings.
#[derive(Debug, Clone, Serialize, Deserialize, Config)]
#[serde(default)]
#[config(section = "crawl")]
pub struct CrawlConfig {
    /// Browser program name or path. Auto-detected when unset.
    #[config(inline_doc)]
    pub browser: Option<String>,

    /// Extra command-line flags passed to the browser.
    pub args: Vec<String>,

    /// Wall-clock timeout per route, in seconds.
    #[config(inline_doc)]
    pub timeout_secs: u64,

    /// Virtual-time budget the app gets to settle, in milliseconds.
    #[config(inline_doc)]
    pub settle_ms: u64,

    /// Id of the element the application mounts into.
    #[config(inline_doc)]
    pub root_id: String,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            browser: None,
            args: Vec::new(),
            timeout_secs: 30,
            settle_ms: 5000,
            root_id: "root".into(),
        }
    }
}

impl CrawlConfig {
    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        if self.timeout_secs == 0 {
            diag.error(Self::FIELDS.timeout_secs, "must be at least 1");
        } else if self.settle_ms / 1000 >= self.timeout_secs {
            diag.warn(
                Self::FIELDS.settle_ms,
                "settle budget reaches the timeout, every crawl may time out",
            );
        }

        if self.root_id.trim().is_empty() {
            diag.error(Self::FIELDS.root_id, "must not be empty");
        }

        if let Some(browser) = &self.browser
            && which::which(browser).is_err()
        {
            diag.warn(
                Self::FIELDS.browser,
                format!("`{browser}` not found, crawl routes will be skipped"),
            );
        }
    }
}
