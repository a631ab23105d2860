//! Chrome/Chromium in headless mode.

use std::path::PathBuf;

use super::{Browser, BrowserError, RenderBudget};
use crate::utils::exec::{Cmd, Timed, strip_ansi};

/// A Chrome-compatible binary, one process per page.
///
/// `--virtual-time-budget` makes Chrome advance its clock until the network
/// is idle or the budget is used up, then `--dump-dom` prints the DOM.
#[derive(Debug, Clone)]
pub struct HeadlessChrome {
    program: PathBuf,
    name: String,
    /// Extra arguments from `crawl.args`, passed before the built-in flags.
    args: Vec<String>,
}

impl HeadlessChrome {
    pub fn new(program: impl Into<PathBuf>, args: Vec<String>) -> Self {
        let program = program.into();
        let name = program
            .file_name()
            .map_or_else(|| program.to_string_lossy(), |n| n.to_string_lossy())
            .into_owned();
        Self {
            program,
            name,
            args,
        }
    }

    fn command(&self, url: &str, budget: &RenderBudget) -> Cmd {
        Cmd::new(&self.program)
            .args(&self.args)
            .args([
                "--headless",
                "--disable-gpu",
                "--no-first-run",
                "--no-default-browser-check",
                "--hide-scrollbars",
                "--mute-audio",
            ])
            .arg(format!("--virtual-time-budget={}", budget.settle.as_millis()))
            .arg("--dump-dom")
            .arg(url)
    }
}

impl Browser for HeadlessChrome {
    fn name(&self) -> &str {
        &self.name
    }

    fn dump_dom(&self, url: &str, budget: &RenderBudget) -> Result<String, BrowserError> {
        let outcome = self
            .command(url, budget)
            .run_with_timeout(budget.timeout)
            .map_err(|e| BrowserError::Spawn(format!("{e:#}")))?;

        let output = match outcome {
            Timed::TimedOut => return Err(BrowserError::Timeout(budget.timeout)),
            Timed::Finished(output) => output,
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let last = strip_ansi(stderr.trim())
                .lines()
                .rev()
                .find(|l| !l.trim().is_empty())
                .unwrap_or_default()
                .to_string();
            return Err(BrowserError::Exit {
                code: output.status.code(),
                stderr: last,
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}
