//! `staticize serve`: the output tree plus the `/api/*` handlers.
//!
//! Mirrors a static host: files are served as built, page URLs without a
//! file fall back to the shell, and `/api/*` goes to [`Functions`].

use std::io::Read;
use std::sync::Arc;

use anyhow::Result;
use tiny_http::Request;

use crate::config::SiteConfig;
use crate::core::register_server;
use crate::functions::Functions;
use crate::log;
use crate::server::{Shell, StaticSite, bind_with_retry, response, run_request_loop};

/// URL prefix routed to the handlers.
const API_PREFIX: &str = "/api/";

/// Largest request body the handlers accept.
const MAX_BODY_BYTES: u64 = 64 * 1024;

/// Serve until Ctrl+C.
pub fn serve_site(config: &SiteConfig) -> Result<()> {
    let site = StaticSite::new(config.output_dir(), Shell::Fallback(config.shell_source()));
    let functions = Functions::from_config(&config.functions)?;
    let app = Arc::new(App { site, functions });

    let (server, addr) = bind_with_retry(config.serve.interface, config.serve.port)?;
    let server = Arc::new(server);
    register_server(Arc::clone(&server));

    log!("serve"; "http://{addr} ({})", config.output_dir().display());
    run_request_loop(&server, move |request| app.handle(request))
}

struct App {
    site: StaticSite,
    functions: Functions,
}

impl App {
    fn handle(&self, request: Request) -> Result<()> {
        if !request.url().starts_with(API_PREFIX) {
            return self.site.respond(request);
        }
        self.call_function(request)
    }

    fn call_function(&self, mut request: Request) -> Result<()> {
        if request.body_length().is_some_and(|len| len as u64 > MAX_BODY_BYTES) {
            return response::respond_json(
                request,
                413,
                &serde_json::json!({ "error": "Request body too large" }),
            );
        }

        let mut body = String::new();
        let read = request
            .as_reader()
            .take(MAX_BODY_BYTES)
            .read_to_string(&mut body);
        if let Err(e) = read {
            return response::respond_json(
                request,
                400,
                &serde_json::json!({ "error": "Unreadable request body", "details": e.to_string() }),
            );
        }

        let method = request.method().as_str().to_owned();
        let url = request.url().to_owned();
        let answer = self.functions.handle(&method, &url, &body);
        log!("api"; "{method} {url} → {}", answer.status);
        response::respond_json(request, answer.status, &answer.body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::functions::fakes::{FakeGateway, FakeVerifier, FakeWebhook};
    use parking_lot::Mutex;
    use std::fs;

    /// Serve `App` on a free port for the duration of a test.
    fn start(root: &std::path::Path) -> (Arc<tiny_http::Server>, String, std::thread::JoinHandle<()>) {
        let app = App {
            site: StaticSite::new(root, Shell::Fallback(root.join("index.html"))),
            functions: Functions::new(
                Box::new(FakeGateway::default()),
                "usd",
                Box::new(FakeVerifier {
                    valid: "ok",
                    calls: Mutex::new(Vec::new()),
                }),
                Box::new(FakeWebhook::default()),
            ),
        };
        let (server, addr) = bind_with_retry([127, 0, 0, 1].into(), 0).unwrap();
        let server = Arc::new(server);
        let loop_server = Arc::clone(&server);
        let app = Arc::new(app);
        let handle = std::thread::spawn(move || {
            run_request_loop(&loop_server, move |request| app.handle(request)).unwrap();
        });
        let origin = format!("http://{}", server.server_addr().to_ip().unwrap_or(addr));
        (server, origin, handle)
    }

    fn client() -> reqwest::blocking::Client {
        reqwest::blocking::Client::builder().no_proxy().build().unwrap()
    }

    #[test]
    fn test_pages_and_api() {
        let dir = tempfile::TempDir::new().unwrap();
        fs::write(dir.path().join("index.html"), "<div id=\"root\"></div>").unwrap();
        fs::create_dir_all(dir.path().join("about")).unwrap();
        fs::write(dir.path().join("about/index.html"), "<title>About</title>").unwrap();

        let (server, origin, handle) = start(dir.path());
        let client = client();

        let about = client.get(format!("{origin}/about")).send().unwrap();
        assert_eq!(about.text().unwrap(), "<title>About</title>");

        let fallback = client.get(format!("{origin}/team")).send().unwrap();
        assert_eq!(fallback.status(), 200);
        assert!(fallback.text().unwrap().contains("root"));

        let api = client
            .post(format!("{origin}/api/volunteer"))
            .body(r#"{"name":"Ada","email":"ada@example.org","token":"ok"}"#)
            .send()
            .unwrap();
        assert_eq!(api.status(), 200);
        let body: serde_json::Value = api.json().unwrap();
        assert_eq!(body["success"], true);

        let bad = client.post(format!("{origin}/api/volunteer")).body("{").send().unwrap();
        assert_eq!(bad.status(), 400);

        server.unblock();
        handle.join().unwrap();
    }
}
