//! Sitemap generation.
//!
//! Lists every materialized route under `site.url`.
//!
//! ```xml
//! <?xml version="1.0" encoding="UTF-8"?>
//! <urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
//!   <url>
//!     <loc>https://example.org/about</loc>
//!   </url>
//! </urlset>
//! ```

use std::borrow::Cow;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::Result;

use super::types::{Route, join_site_url};
use super::write::write_atomic;
use crate::config::Layout;
use crate::log;

const SITEMAP_NS: &str = "http://www.sitemaps.org/schemas/sitemap/0.9";
pub const SITEMAP_FILE: &str = "sitemap.xml";

pub struct Sitemap {
    urls: Vec<String>,
}

impl Sitemap {
    /// Sitemap for the given routes. The canonical URL is preferred; a
    /// flat-only route without one is listed by its `.html` URL.
    pub fn build<'a>(base_url: &str, routes: impl IntoIterator<Item = &'a Route>) -> Self {
        let urls = routes
            .into_iter()
            .map(|route| match (&route.metadata.canonical, route.layout) {
                (Some(canonical), _) => canonical.clone(),
                (None, Layout::Flat) => match route.path.flat_url() {
                    Some(flat) => format!("{}{flat}", base_url.trim_end_matches('/')),
                    None => join_site_url(base_url, &route.path),
                },
                (None, _) => join_site_url(base_url, &route.path),
            })
            .collect();
        Self { urls }
    }

    fn into_xml(self) -> String {
        let mut xml = String::with_capacity(128 + self.urls.len() * 64);

        xml.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
        xml.push_str("<urlset xmlns=\"");
        xml.push_str(SITEMAP_NS);
        xml.push_str("\">\n");

        for loc in self.urls {
            xml.push_str("  <url>\n    <loc>");
            xml.push_str(&escape_xml(&loc));
            xml.push_str("</loc>\n  </url>\n");
        }

        xml.push_str("</urlset>\n");
        xml
    }

    /// Write `sitemap.xml` into the output directory.
    pub fn write(self, output: &Path) -> Result<PathBuf> {
        let path = output.join(SITEMAP_FILE);
        let count = self.urls.len();
        let xml = self.into_xml();
        write_atomic(&path, |file| file.write_all(xml.as_bytes()))?;
        log!("sitemap"; "{} ({})", SITEMAP_FILE, crate::utils::plural(count, "url"));
        Ok(path)
    }
}

/// Escape special XML characters.
fn escape_xml(s: &str) -> Cow<'_, str> {
    if !s.contains(['&', '<', '>', '"', '\'']) {
        return Cow::Borrowed(s);
    }

    Cow::Owned(
        s.replace('&', "&amp;")
            .replace('<', "&lt;")
            .replace('>', "&gt;")
            .replace('"', "&quot;")
            .replace('\'', "&apos;"),
    )
}
