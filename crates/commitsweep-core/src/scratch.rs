//! Ephemeral per-item scratch directories

use crate::types::WorkItem;
use std::io;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Parent directory of every scratch space in a cycle
#[derive(Debug, Clone)]
pub struct ScratchRoot {
    path: PathBuf,
}

impl ScratchRoot {
    /// Create a handle; nothing touches the disk until [`ScratchRoot::ensure`]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Root path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Create the root if missing
    pub fn ensure(&self) -> io::Result<()> {
        std::fs::create_dir_all(&self.path)
    }

    /// Remove the root and everything under it. Missing root is fine.
    pub fn purge(&self) -> io::Result<()> {
        match std::fs::remove_dir_all(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e),
        }
    }

    /// Allocate a uniquely named directory for one work item
    pub fn allocate(&self, item: &WorkItem) -> io::Result<ScratchSpace> {
        self.ensure()?;
        let dir = tempfile::Builder::new()
            .prefix(&scratch_prefix(item))
            .tempdir_in(&self.path)?;
        Ok(ScratchSpace { dir })
    }

    /// Number of scratch spaces currently on disk
    pub fn live_count(&self) -> io::Result<usize> {
        match std::fs::read_dir(&self.path) {
            Ok(entries) => Ok(entries
                .filter_map(|e| e.ok())
                .filter(|e| e.file_type().map(|t| t.is_dir()).unwrap_or(false))
                .count()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(0),
            Err(e) => Err(e),
        }
    }
}

/// Exclusively owned directory; removed on [`ScratchSpace::close`] or drop
#[derive(Debug)]
pub struct ScratchSpace {
    dir: TempDir,
}

impl ScratchSpace {
    /// Directory path
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Remove the directory, reporting failure instead of swallowing it
    pub fn close(self) -> io::Result<()> {
        self.dir.close()
    }
}

/// `owner-repo-sha7-`, restricted to filename-safe characters
fn scratch_prefix(item: &WorkItem) -> String {
    let raw = format!("{}-{}-{}-", item.owner, item.repo, item.short_sha());
    raw.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.' {
                c
            } else {
                '_'
            }
        })
        .collect()
}
