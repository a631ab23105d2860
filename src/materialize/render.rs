//! Route renderer: produce the base document for one route.
//!
//! - `crawl`: the browser loads the route from the local server and its DOM
//!   is taken once the mount element holds markup
//! - `template`: a hand-authored HTML file is read from the templates
//!   directory

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use super::dom::Document;
use super::types::Route;
use crate::browser::{Browser, BrowserError, RenderBudget};
use crate::config::Strategy;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error(transparent)]
    Browser(#[from] BrowserError),

    #[error("`#{0}` is empty after rendering, the application did not mount")]
    NotSettled(String),

    #[error("template {} not found", .0.display())]
    TemplateMissing(PathBuf),

    #[error("failed to read template {}", .0.display())]
    Io(PathBuf, #[source] io::Error),

    #[error("no local server to crawl from")]
    NoServer,
}

/// Renders routes for one build.
pub struct Renderer<'a> {
    browser: &'a dyn Browser,
    /// `http://127.0.0.1:<port>` of the server crawls load from.
    origin: Option<&'a str>,
    templates: &'a Path,
    budget: RenderBudget,
    root_id: &'a str,
}

impl<'a> Renderer<'a> {
    pub fn new(
        browser: &'a dyn Browser,
        origin: Option<&'a str>,
        templates: &'a Path,
        budget: RenderBudget,
        root_id: &'a str,
    ) -> Self {
        Self {
            browser,
            origin,
            templates,
            budget,
            root_id,
        }
    }

    pub fn render(&self, route: &Route) -> Result<String, RenderError> {
        match route.strategy {
            Strategy::Crawl => self.crawl(route),
            Strategy::Template => self.template(route),
        }
    }

    fn crawl(&self, route: &Route) -> Result<String, RenderError> {
        let origin = self.origin.ok_or(RenderError::NoServer)?;
        let url = format!("{}{}", origin.trim_end_matches('/'), route.path.to_encoded());
        let html = self.browser.dump_dom(&url, &self.budget)?;
        if !is_mounted(&html, self.root_id) {
            return Err(RenderError::NotSettled(self.root_id.to_owned()));
        }
        Ok(html)
    }

    fn template(&self, route: &Route) -> Result<String, RenderError> {
        let path = self.templates.join(&route.template);
        fs::read_to_string(&path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => RenderError::TemplateMissing(path.clone()),
            _ => RenderError::Io(path.clone(), e),
        })
    }
}

/// Whether the element with id `root_id` has any content.
///
/// A hydration failure leaves the mount element as the shell ships it:
/// `<div id="root"></div>`.
pub fn is_mounted(html: &str, root_id: &str) -> bool {
    let doc = Document::parse(html);
    let Some(mount) = doc.tags().iter().find(|t| t.value_is(html, "id", root_id)) else {
        return false;
    };
    let rest = html[mount.end..].trim_start();
    !rest.is_empty() && !rest.starts_with("</")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Layout, Strategy};
    use crate::core::RoutePath;
    use crate::materialize::MetadataRecord;
    use parking_lot::Mutex;
    use std::time::Duration;

    /// Browser returning canned HTML and recording requested URLs.
    struct FakeBrowser {
        html: Result<String, fn() -> BrowserError>,
        urls: Mutex<Vec<String>>,
    }

    impl FakeBrowser {
        fn ok(html: &str) -> Self {
            Self {
                html: Ok(html.into()),
                urls: Mutex::new(Vec::new()),
            }
        }

        fn failing(error: fn() -> BrowserError) -> Self {
            Self {
                html: Err(error),
                urls: Mutex::new(Vec::new()),
            }
        }
    }

    impl Browser for FakeBrowser {
        fn name(&self) -> &str {
            "fake"
        }

        fn dump_dom(&self, url: &str, _budget: &RenderBudget) -> Result<String, BrowserError> {
            self.urls.lock().push(url.to_owned());
            self.html.clone().map_err(|make| make())
        }
    }

    fn budget() -> RenderBudget {
        RenderBudget {
            timeout: Duration::from_secs(1),
            settle: Duration::from_millis(10),
        }
    }

    fn route(path: &str, strategy: Strategy, template: &str) -> Route {
        Route {
            path: RoutePath::parse(path).unwrap(),
            strategy,
            template: template.into(),
            layout: Layout::Directory,
            metadata: MetadataRecord::default(),
        }
    }

    #[test]
    fn test_is_mounted() {
        assert!(is_mounted(r#"<div id="root"><main>hi</main></div>"#, "root"));
        assert!(is_mounted("<div id=root>\n  text</div>", "root"));
        assert!(!is_mounted(r#"<div id="root"></div>"#, "root"));
        assert!(!is_mounted("<div id=\"root\">\n  </div>", "root"));
        assert!(!is_mounted(r#"<div id="app"><p>x</p></div>"#, "root"));
    }

    #[test]
    fn test_crawl_requests_route_url() {
        let browser = FakeBrowser::ok(r#"<html><body><div id="root"><h1>About</h1></div></body></html>"#);
        let dir = tempfile::TempDir::new().unwrap();
        let renderer = Renderer::new(&browser, Some("http://127.0.0.1:4000/"), dir.path(), budget(), "root");

        let html = renderer.render(&route("/get-involved/volunteer", Strategy::Crawl, "")).unwrap();
        assert!(html.contains("<h1>About</h1>"));
        assert_eq!(*browser.urls.lock(), ["http://127.0.0.1:4000/get-involved/volunteer"]);
    }

    #[test]
    fn test_crawl_unmounted_is_error() {
        let browser = FakeBrowser::ok(r#"<html><body><div id="root"></div></body></html>"#);
        let dir = tempfile::TempDir::new().unwrap();
        let renderer = Renderer::new(&browser, Some("http://127.0.0.1:4000"), dir.path(), budget(), "root");
        let err = renderer.render(&route("/", Strategy::Crawl, "")).unwrap_err();
        assert!(matches!(err, RenderError::NotSettled(_)));
    }

    #[test]
    fn test_crawl_timeout() {
        let browser = FakeBrowser::failing(|| BrowserError::Timeout(Duration::from_secs(1)));
        let dir = tempfile::TempDir::new().unwrap();
        let renderer = Renderer::new(&browser, Some("http://127.0.0.1:4000"), dir.path(), budget(), "root");
        let err = renderer.render(&route("/", Strategy::Crawl, "")).unwrap_err();
        assert!(matches!(err, RenderError::Browser(BrowserError::Timeout(_))));
    }

    #[test]
    fn test_crawl_without_server() {
        let browser = FakeBrowser::ok("");
        let dir = tempfile::TempDir::new().unwrap();
        let renderer = Renderer::new(&browser, None, dir.path(), budget(), "root");
        let err = renderer.render(&route("/", Strategy::Crawl, "")).unwrap_err();
        assert!(matches!(err, RenderError::NoServer));
        assert!(browser.urls.lock().is_empty());
    }

    #[test]
    fn test_template_read() {
        let dir = tempfile::TempDir::new().unwrap();
        fs::write(dir.path().join("about.html"), "<title>x</title>").unwrap();
        let browser = FakeBrowser::ok("");
        let renderer = Renderer::new(&browser, None, dir.path(), budget(), "root");

        let html = renderer.render(&route("/about", Strategy::Template, "about.html")).unwrap();
        assert_eq!(html, "<title>x</title>");

        let err = renderer
            .render(&route("/donate", Strategy::Template, "donate.html"))
            .unwrap_err();
        assert!(matches!(err, RenderError::TemplateMissing(p) if p.ends_with("donate.html")));
    }
}
