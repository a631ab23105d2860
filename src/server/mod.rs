//! Static file server for the output tree.
//!
//! Two users share it:
//!
//! - the build, which starts a private [`StaticServer`] on a free loopback
//!   port so the headless browser can load the application
//! - `staticize serve`, which serves the finished output and the `/api/*`
//!   handlers
//!
//! Page navigations with no file of their own get the single-page shell, so
//! client-side routes resolve the way they do on a static host.

mod path;
pub mod response;

pub use path::{is_page_url, resolve_path};

use std::net::{IpAddr, Ipv4Addr, SocketAddr, TcpListener};
use std::path::PathBuf;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use anyhow::{Context, Result, anyhow};
use tiny_http::{Method, Request, Server};

use crate::{debug, log};

/// Maximum number of port binding attempts.
const MAX_PORT_RETRIES: u16 = 10;

/// Worker threads answering requests.
const REQUEST_THREADS: usize = 4;

/// Where page navigations without a file of their own are answered from.
pub enum Shell {
    /// In-memory copy of the bundler's shell. Every page navigation gets
    /// it, even when a materialized file exists, so crawls always start
    /// from the application and never from an earlier build's output.
    Pinned(Vec<u8>),
    /// `index.html` on disk, only for paths with no file.
    Fallback(PathBuf),
}

/// The served directory and its fallback.
pub struct StaticSite {
    root: PathBuf,
    shell: Shell,
}

impl StaticSite {
    pub fn new(root: impl Into<PathBuf>, shell: Shell) -> Self {
        Self {
            root: root.into(),
            shell,
        }
    }

    /// Answer a GET/HEAD request from the directory.
    pub fn respond(&self, request: Request) -> Result<()> {
        if crate::core::is_shutdown() {
            return response::respond_unavailable(request);
        }
        if !matches!(request.method(), Method::Get | Method::Head) {
            return response::respond_method_not_allowed(request, "GET, HEAD");
        }

        let url = request.url().to_owned();
        let is_page = is_page_url(&url);
        let file = resolve_path(&url, &self.root);

        match (&self.shell, file) {
            (Shell::Pinned(shell), _) if is_page => response::respond_html(request, shell.clone()),
            (_, Some(file)) => response::respond_file(request, &file),
            (Shell::Fallback(shell), None) if is_page && shell.is_file() => {
                response::respond_file(request, shell)
            }
            _ => response::respond_not_found(request, &self.root),
        }
    }
}

/// Bind to the specified interface and port, with automatic port retry.
pub fn bind_with_retry(interface: IpAddr, base_port: u16) -> Result<(Server, SocketAddr)> {
    let mut last_error = None;
    for offset in 0..MAX_PORT_RETRIES {
        let port = base_port.saturating_add(offset);
        let addr = SocketAddr::new(interface, port);

        match Server::http(addr) {
            Ok(server) => {
                if offset > 0 {
                    log!("serve"; "port {} in use, using {} instead", base_port, port);
                }
                return Ok((server, addr));
            }
            Err(e) => last_error = Some(e),
        }
    }
    Err(anyhow!(
        "Failed to bind after {} attempts (ports {}-{}): {}",
        MAX_PORT_RETRIES,
        base_port,
        base_port.saturating_add(MAX_PORT_RETRIES - 1),
        last_error.map_or_else(String::new, |e| e.to_string())
    ))
}

/// Answer requests on a small thread pool until the server is unblocked.
pub fn run_request_loop<F>(server: &Server, handler: F) -> Result<()>
where
    F: Fn(Request) -> Result<()> + Send + Sync + 'static,
{
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(REQUEST_THREADS)
        .thread_name(|i| format!("http-{i}"))
        .build()
        .context("failed to create request thread pool")?;
    let handler = Arc::new(handler);

    for request in server.incoming_requests() {
        let handler = Arc::clone(&handler);
        pool.spawn(move || {
            let url = request.url().to_owned();
            if let Err(e) = handler(request) {
                debug!("serve"; "{url}: {e:#}");
            }
        });
    }
    Ok(())
}

/// A private server on a free loopback port, stopped on drop.
pub struct StaticServer {
    server: Arc<Server>,
    addr: SocketAddr,
    handle: Option<JoinHandle<()>>,
}

impl StaticServer {
    pub fn start(site: StaticSite) -> Result<Self> {
        let addr = free_loopback_addr()?;
        let (server, addr) = bind_with_retry(addr.ip(), addr.port())?;
        let server = Arc::new(server);

        let site = Arc::new(site);
        let loop_server = Arc::clone(&server);
        let handle = thread::Builder::new()
            .name("crawl-server".into())
            .spawn(move || {
                let result = run_request_loop(&loop_server, move |request| site.respond(request));
                if let Err(e) = result {
                    log!("error"; "crawl server stopped: {e:#}");
                }
            })
            .context("failed to start crawl server thread")?;

        debug!("crawl"; "serving build at http://{addr}");
        Ok(Self {
            server,
            addr,
            handle: Some(handle),
        })
    }

    /// `http://127.0.0.1:<port>`
    pub fn origin(&self) -> String {
        format!("http://{}", self.addr)
    }
}

impl Drop for StaticServer {
    fn drop(&mut self) {
        self.server.unblock();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

/// Ask the OS for a free loopback port.
fn free_loopback_addr() -> Result<SocketAddr> {
    let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0))
        .context("failed to find a free port for the crawl server")?;
    Ok(listener.local_addr()?)
}
