//! Output writer: atomic, per-path serialized file writes.
//!
//! Every file is written to a temporary file in its destination directory
//! and renamed into place, so the final path only ever holds a complete
//! document. A failed write drops the temporary file.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use dashmap::DashMap;
use parking_lot::Mutex;
use tempfile::NamedTempFile;

use crate::debug;

/// Writes documents below the output directory.
///
/// Shared across build workers; writes to the same destination are
/// serialized by a per-path lock.
pub struct OutputWriter {
    root: PathBuf,
    locks: DashMap<PathBuf, Arc<Mutex<()>>>,
}

impl OutputWriter {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            locks: DashMap::new(),
        }
    }

    /// Write `content` to `relative` under the output directory.
    pub fn write(&self, relative: &Path, content: &[u8]) -> Result<PathBuf> {
        self.write_with(relative, |file| file.write_all(content))
    }

    /// Write a file whose content is produced by `fill`.
    ///
    /// If `fill` fails, the destination keeps its previous content (or stays
    /// absent) and no temporary file is left behind.
    pub fn write_with<F>(&self, relative: &Path, fill: F) -> Result<PathBuf>
    where
        F: FnOnce(&mut dyn Write) -> io::Result<()>,
    {
        let path = self.root.join(relative);
        let lock = self
            .locks
            .entry(path.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let _guard = lock.lock();

        write_atomic(&path, fill)?;
        debug!("write"; "{}", relative.display());
        Ok(path)
    }
}

/// Write a file through a temporary sibling and rename it into place.
pub fn write_atomic<F>(path: &Path, fill: F) -> Result<()>
where
    F: FnOnce(&mut dyn Write) -> io::Result<()>,
{
    let dir = path
        .parent()
        .with_context(|| format!("{} has no parent directory", path.display()))?;
    fs::create_dir_all(dir)
        .with_context(|| format!("failed to create directory {}", dir.display()))?;

    let mut file = NamedTempFile::new_in(dir)
        .with_context(|| format!("failed to create temporary file in {}", dir.display()))?;
    fill(file.as_file_mut())
        .and_then(|()| file.as_file_mut().sync_all())
        .with_context(|| format!("failed to write {}", path.display()))?;
    file.persist(path)
        .map_err(|e| e.error)
        .with_context(|| format!("failed to move {} into place", path.display()))?;
    Ok(())
}
