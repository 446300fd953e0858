#![forbid(unsafe_code)]
#![deny(warnings, clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

mod error;
mod system;
mod types;
pub mod git;
pub mod output;
pub mod settings;
pub mod workflow;

#[cfg(test)]
mod testing;

pub use error::{DripError, Result};
pub use git::{DefaultGitRunner, Git, GitRunner};
pub use output::Console;
pub use settings::{BranchKind, FileSettings, load_settings};
pub use system::{DefaultFsOps, FsOps};
pub use types::{BranchEntry, Commit, CompareStatus, PendingInfo, RunOptions, TreeStatus};
pub use workflow::{Context, DialoguerPrompter, Prompter};
