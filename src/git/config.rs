use std::collections::HashMap;

use tracing::debug;

use crate::error::Result;

use super::Git;

/// Cached view of `git config --list`.
///
/// Loaded with a single listing call. [`GitConfig::set`] writes through to git
/// and only touches the cache once git accepted the value.
#[derive(Debug, Clone, Default)]
pub struct GitConfig {
    entries: HashMap<String, String>,
}

impl GitConfig {
    /// # Errors
    /// Returns an error when `git config --list` cannot be run.
    pub fn load(git: &Git) -> Result<Self> {
        let listing = git.capture(&["config", "--list"])?;
        let config = Self::parse(&listing);
        debug!(keys = config.entries.len(), "loaded git config");
        Ok(config)
    }

    /// Parse `key=value` lines, splitting on the first `=` only.
    #[must_use]
    pub fn parse(listing: &str) -> Self {
        let mut entries = HashMap::new();
        for line in listing.lines().filter(|l| !l.trim().is_empty()) {
            match line.split_once('=') {
                Some((key, value)) => entries.insert(key.to_string(), value.to_string()),
                None => entries.insert(line.to_string(), String::new()),
            };
        }
        Self { entries }
    }

    /// Value for `key`, empty when absent.
    #[must_use]
    pub fn get(&self, key: &str) -> &str {
        self.entries.get(key).map_or("", String::as_str)
    }

    #[must_use]
    pub fn has(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// # Errors
    /// Returns the git failure; the cached value is left unchanged.
    pub fn set(&mut self, git: &Git, key: &str, value: &str) -> Result<()> {
        git.run(&["config", key, value])?;
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}
