//! `[site]` section configuration.
//!
//! Site-wide defaults for per-route metadata. A route that leaves a field
//! unset falls back to these values.
//!
//! # Example
//!
//! ```toml
//! [site]
//! title = "Hope Recovery"
//! description = "Peer recovery support"
//! url = "https://example.org"
//! language = "en"
//! ```

use crate::config::ConfigDiagnostics;
use macros::Config;
use serde::{Deserialize, Serialize};

/// Site-wide metadata defaults.
#[derive(Debug, Clone, Serialize, Deserialize, Config)]
#[serde(default)]
#[config(section = "site")]
pub struct SiteSectionConfig {
    /// Default page title.
    #[config(inline_doc)]
    pub title: String,

    /// Default meta description.
    #[config(inline_doc)]
    pub description: String,

    /// Public site URL, used to derive canonical URLs and the sitemap.
    #[config(inline_doc)]
    pub url: Option<String>,

    /// Language code (e.g., "en").
    #[config(default = "en", inline_doc)]
    pub language: String,
}

impl Default for SiteSectionConfig {
    fn default() -> Self {
        Self {
            title: String::new(),
            description: String::new(),
            url: None,
            language: "en".into(),
        }
    }
}

impl SiteSectionConfig {
    /// Validate site configuration.
    ///
    /// # Checks
    /// - `url` must be an http(s) URL with a host
    /// - `title` should not be empty (routes without a title would get none)
    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        if self.title.trim().is_empty() {
            diag.warn(
                Self::FIELDS.title,
                "empty, routes without their own title get no <title>",
            );
        }

        let Some(url_str) = &self.url else {
            return;
        };
        match url::Url::parse(url_str) {
            Ok(parsed) => {
                if !matches!(parsed.scheme(), "http" | "https") {
                    diag.error_with_hint(
                        Self::FIELDS.url,
                        format!(
                            "scheme '{}' not supported, must be http or https",
                            parsed.scheme()
                        ),
                        "use format like https://example.org",
                    );
                }
                if parsed.host_str().is_none() {
                    diag.error_with_hint(
                        Self::FIELDS.url,
                        "URL must have a valid host",
                        "use format like https://example.org",
                    );
                }
            }
            Err(e) => {
                diag.error_with_hint(
                    Self::FIELDS.url,
                    format!("invalid URL: {e}"),
                    "use format like https://example.org",
                );
            }
        }
    }
}
