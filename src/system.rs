use std::path::{Path, PathBuf};

/// Filesystem access used for the resume marker and the settings file.
pub trait FsOps {
    fn exists(&self, path: &Path) -> bool;
    /// # Errors
    /// Returns the underlying I/O error when the file cannot be read.
    fn read_to_string(&self, path: &Path) -> std::io::Result<String>;
    /// Write `contents`, creating missing parent directories first.
    ///
    /// # Errors
    /// Returns the underlying I/O error when a directory or the file cannot be written.
    fn write(&self, path: &Path, contents: &str) -> std::io::Result<()>;
    /// # Errors
    /// Returns the underlying I/O error when the file cannot be removed.
    fn remove(&self, path: &Path) -> std::io::Result<()>;
    fn expand_tilde(&self, p: &Path) -> PathBuf;
}

pub struct DefaultFsOps;
impl FsOps for DefaultFsOps {
    fn exists(&self, path: &Path) -> bool {
        path.is_file()
    }
    fn read_to_string(&self, path: &Path) -> std::io::Result<String> {
        std::fs::read_to_string(path)
    }
    fn write(&self, path: &Path, contents: &str) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, contents)
    }
    fn remove(&self, path: &Path) -> std::io::Result<()> {
        std::fs::remove_file(path)
    }
    fn expand_tilde(&self, p: &Path) -> PathBuf {
        if let Some(home) = std::env::var_os("HOME") {
            let home = PathBuf::from(home);
            if p.starts_with("~")
                && let Ok(rest) = p.strip_prefix("~")
            {
                return home.join(rest);
            }
        }
        p.to_path_buf()
    }
}
