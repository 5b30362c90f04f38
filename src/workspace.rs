//! Scoped temporary workspace for one pipeline run

use crate::PackResult;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Prefix of every workspace directory name
pub const WORKSPACE_PREFIX: &str = "html2exe_";

/// Exclusively owned temporary directory.
///
/// The directory and everything below it is removed when the workspace is
/// dropped, whether the run succeeded, failed or unwound.
#[derive(Debug)]
pub struct Workspace {
    dir: TempDir,
}

impl Workspace {
    /// Create a workspace in the system temp directory
    pub fn new() -> PackResult<Self> {
        let dir = tempfile::Builder::new()
            .prefix(WORKSPACE_PREFIX)
            .tempdir()?;
        tracing::debug!("Workspace created: {}", dir.path().display());
        Ok(Self { dir })
    }

    /// Create a workspace below `parent`
    pub fn new_in(parent: impl AsRef<Path>) -> PackResult<Self> {
        let dir = tempfile::Builder::new()
            .prefix(WORKSPACE_PREFIX)
            .tempdir_in(parent)?;
        tracing::debug!("Workspace created: {}", dir.path().display());
        Ok(Self { dir })
    }

    /// Root directory of the workspace
    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Path of `name` inside the workspace
    pub fn join(&self, name: impl AsRef<Path>) -> PathBuf {
        self.dir.path().join(name)
    }

    /// Remove the workspace now, reporting cleanup errors instead of ignoring them
    pub fn close(self) -> PackResult<()> {
        let path = self.dir.path().to_path_buf();
        self.dir.close()?;
        tracing::debug!("Workspace removed: {}", path.display());
        Ok(())
    }
}
