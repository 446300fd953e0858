use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::{DripError, Result};
use crate::system::FsOps;

const STATE_DIR: &str = ".gitdrip";
const MERGE_BASE_FILE: &str = "MERGE_BASE";

/// File recording that a finish stopped on a merge conflict.
///
/// It holds the master branch the merge targeted. Its presence is the only
/// signal that a finish is waiting for manual resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResumeMarker {
    path: PathBuf,
}

impl ResumeMarker {
    #[must_use]
    pub fn locate(git_dir: &Path) -> Self {
        Self {
            path: git_dir.join(STATE_DIR).join(MERGE_BASE_FILE),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn exists(&self, fs: &dyn FsOps) -> bool {
        fs.exists(&self.path)
    }

    /// # Errors
    /// Returns [`DripError::Marker`] when the file cannot be written.
    pub fn write(&self, fs: &dyn FsOps, master: &str) -> Result<()> {
        fs.write(&self.path, master).map_err(|source| self.error(source))?;
        info!(path = %self.path.display(), %master, "recorded merge conflict");
        Ok(())
    }

    /// Read the recorded master branch and delete the marker.
    ///
    /// # Errors
    /// Returns [`DripError::Marker`] when the file cannot be read or removed.
    pub fn take(&self, fs: &dyn FsOps) -> Result<String> {
        let content = fs
            .read_to_string(&self.path)
            .map_err(|source| self.error(source))?;
        fs.remove(&self.path).map_err(|source| self.error(source))?;
        info!(path = %self.path.display(), "consumed resume marker");
        Ok(content.trim().to_string())
    }

    fn error(&self, source: std::io::Error) -> DripError {
        DripError::Marker {
            path: self.path.clone(),
            source,
        }
    }
}
