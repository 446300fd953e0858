//! User-level operations built on the git layer.

mod branches;
mod finish;
mod guards;
mod init;
mod marker;

use std::cell::RefCell;
use std::path::PathBuf;

pub use branches::{
    ListOptions, StartOptions, checkout, delete, describe, diff, list, rebase, resolve_branch,
    resolve_branch_or_current, start,
};
pub use finish::{FinishOptions, finish};
pub use guards::{require_branch, require_branch_absent, require_clean_tree, require_initialized};
pub use init::{InitOptions, init};
pub use marker::ResumeMarker;

use crate::error::{DripError, Result};
use crate::git::{Branch, Git, GitConfig, refs};
use crate::output::Console;
use crate::settings::{
    BranchKind, DEFAULT_REMOTE, MASTER_KEY, ORIGIN_KEY, PREFIX_KEYS, description_key,
};
use crate::system::FsOps;

/// Asks the user a question, offering `default` when they just press enter.
pub trait Prompter {
    /// # Errors
    /// Returns an error when no answer can be read.
    fn ask(&self, question: &str, default: &str) -> Result<String>;
}

pub struct DialoguerPrompter;

impl Prompter for DialoguerPrompter {
    fn ask(&self, question: &str, default: &str) -> Result<String> {
        dialoguer::Input::<String>::new()
            .with_prompt(question)
            .default(default.to_string())
            .allow_empty(true)
            .interact_text()
            .map_err(|err| DripError::Prompt(err.to_string()))
    }
}

/// Everything a workflow step needs: the gated git handle, filesystem access
/// for the resume marker, a prompter and the lazily loaded git config.
pub struct Context {
    git: Git,
    fs: Box<dyn FsOps>,
    prompter: Box<dyn Prompter>,
    config: RefCell<Option<GitConfig>>,
}

impl Context {
    #[must_use]
    pub fn new(git: Git, fs: Box<dyn FsOps>, prompter: Box<dyn Prompter>) -> Self {
        Self {
            git,
            fs,
            prompter,
            config: RefCell::new(None),
        }
    }

    #[must_use]
    pub const fn git(&self) -> &Git {
        &self.git
    }

    #[must_use]
    pub const fn console(&self) -> &Console {
        self.git.console()
    }

    #[must_use]
    pub fn fs(&self) -> &dyn FsOps {
        self.fs.as_ref()
    }

    #[must_use]
    pub fn prompter(&self) -> &dyn Prompter {
        self.prompter.as_ref()
    }

    fn ensure_config(&self) -> Result<()> {
        if self.config.borrow().is_none() {
            let loaded = GitConfig::load(&self.git)?;
            *self.config.borrow_mut() = Some(loaded);
        }
        Ok(())
    }

    fn with_config<T>(&self, f: impl FnOnce(&GitConfig) -> T) -> Result<T> {
        self.ensure_config()?;
        let guard = self.config.borrow();
        Ok(match guard.as_ref() {
            Some(config) => f(config),
            None => f(&GitConfig::default()),
        })
    }

    /// # Errors
    /// Returns an error when the config listing cannot be loaded.
    pub fn config_get(&self, key: &str) -> Result<String> {
        self.with_config(|c| c.get(key).to_string())
    }

    /// # Errors
    /// Returns an error when the config listing cannot be loaded.
    pub fn config_has(&self, key: &str) -> Result<bool> {
        self.with_config(|c| c.has(key))
    }

    /// # Errors
    /// Returns an error when loading the config or writing the key fails.
    pub fn config_set(&self, key: &str, value: &str) -> Result<()> {
        self.ensure_config()?;
        self.config
            .borrow_mut()
            .get_or_insert_with(GitConfig::default)
            .set(&self.git, key, value)
    }

    /// Forget the cached config so the next access reloads it.
    pub fn reset_config(&self) {
        self.config.borrow_mut().take();
    }

    /// # Errors
    /// Returns an error when the config listing cannot be loaded.
    pub fn master(&self) -> Result<String> {
        self.config_get(MASTER_KEY)
    }

    /// Remote used for upstream comparisons; `origin` unless configured.
    ///
    /// # Errors
    /// Returns an error when the config listing cannot be loaded.
    pub fn remote(&self) -> Result<String> {
        let remote = self.config_get(ORIGIN_KEY)?;
        Ok(if remote.is_empty() {
            DEFAULT_REMOTE.to_string()
        } else {
            remote
        })
    }

    /// # Errors
    /// Returns an error when the config listing cannot be loaded.
    pub fn prefix(&self, kind: BranchKind) -> Result<String> {
        self.config_get(kind.config_key())
    }

    /// Configured, non-empty branch prefixes in feature, release, hotfix order.
    ///
    /// # Errors
    /// Returns an error when the config listing cannot be loaded.
    pub fn branch_prefixes(&self) -> Result<Vec<String>> {
        let mut prefixes = Vec::new();
        for kind in BranchKind::ALL {
            let prefix = self.prefix(kind)?;
            if !prefix.is_empty() {
                prefixes.push(prefix);
            }
        }
        Ok(prefixes)
    }

    /// # Errors
    /// Returns an error when the config listing cannot be loaded.
    pub fn current_branch(&self) -> Result<Option<Branch>> {
        Ok(refs::current_branch(&self.git, &self.branch_prefixes()?))
    }

    /// # Errors
    /// Returns an error when the branches cannot be listed.
    pub fn local_branches(&self) -> Result<Vec<Branch>> {
        refs::local_branches(&self.git, &self.branch_prefixes()?)
    }

    /// # Errors
    /// Returns an error when the branches cannot be listed.
    pub fn category_branches(&self, kind: BranchKind) -> Result<Vec<Branch>> {
        refs::prefixed_branches(&self.git, &self.branch_prefixes()?, &self.prefix(kind)?)
    }

    /// # Errors
    /// Returns [`DripError::NotARepository`] outside a repository.
    pub fn git_dir(&self) -> Result<PathBuf> {
        refs::require_git_dir(&self.git)
    }

    /// # Errors
    /// Returns an error when the config or the branch list cannot be read.
    pub fn is_master_configured(&self) -> Result<bool> {
        let master = self.master()?;
        if !self.config_has(MASTER_KEY)? || master.is_empty() {
            return Ok(false);
        }
        Ok(refs::contains(&self.local_branches()?, &master))
    }

    /// # Errors
    /// Returns an error when the config listing cannot be loaded.
    pub fn are_prefixes_configured(&self) -> Result<bool> {
        for key in PREFIX_KEYS {
            if !self.config_has(key)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// # Errors
    /// Returns an error when the config or the branch list cannot be read.
    pub fn is_initialized(&self) -> Result<bool> {
        Ok(self.is_master_configured()? && self.are_prefixes_configured()?)
    }

    /// Record a free-text description for `branch`.
    ///
    /// # Errors
    /// Returns an error when git refuses the config write.
    pub fn set_description(&self, branch: &Branch, description: &str) -> Result<()> {
        self.config_set(&description_key(&branch.prefixed_name()), description)
    }
}
