use std::path::PathBuf;

use thiserror::Error;

/// Every way a git-drip operation can stop early.
///
/// Only [`DripError::MergeConflict`] and [`DripError::UnresolvedConflicts`] are
/// retryable: the user resolves the conflict and runs `finish` again.
#[derive(Debug, Error)]
pub enum DripError {
    #[error("failed to launch `{command}`: {source}")]
    CommandIo {
        command: String,
        source: std::io::Error,
    },
    #[error("`{command}` failed with {}", status_text(*.code))]
    CommandFailed {
        command: String,
        code: Option<i32>,
        output: String,
    },
    #[error("failed to read settings file {}: {source}", .path.display())]
    SettingsRead {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse settings file {}: {source}", .path.display())]
    SettingsParse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("resume marker {}: {source}", .path.display())]
    Marker {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to encode branch listing: {0}")]
    Json(#[from] serde_json::Error),
    #[error("prompt failed: {0}")]
    Prompt(String),
    #[error("not a git repository")]
    NotARepository,
    #[error("Not a git-drip enabled repo yet. Please run \"git drip init\" first.")]
    NotInitialized,
    #[error("Already initialized for git-drip. To force reinitialization, use: git drip init -f")]
    AlreadyInitialized,
    #[error("Local branch '{0}' does not exist.")]
    MasterMissing(String),
    #[error("Working tree contains unstaged changes. Aborting.")]
    UnstagedChanges,
    #[error("Working tree contains uncommitted changes. Aborting.")]
    UncommittedChanges,
    #[error("Branch '{0}' does not exist and is required")]
    BranchMissing(String),
    #[error("Branch '{0}' already exists. Pick another name")]
    BranchExists(String),
    #[error("Could not create {kind} branch '{branch}'")]
    BranchCreate { kind: &'static str, branch: String },
    #[error("No branch matches prefix {0}")]
    NoBranchMatch(String),
    #[error("Multiple branches match prefix '{prefix}': {}", .matches.join(", "))]
    AmbiguousBranch { prefix: String, matches: Vec<String> },
    #[error("The current HEAD is not a {0} branch. Please specify a <name> argument")]
    NotOnCategoryBranch(&'static str),
    #[error("Branches '{local}' and '{remote}' have diverged. And branch '{local}' may be fast-forwarded.")]
    BranchBehind { local: String, remote: String },
    #[error("Branches '{local}' and '{remote}' have diverged. Branches need merging first.")]
    BranchesNeedMerge { local: String, remote: String },
    #[error("Branches '{local}' and '{remote}' share no common ancestor.")]
    NoCommonAncestor { local: String, remote: String },
    #[error(
        "Finish was aborted due to conflicts during rebase.\n\
         Please finish the rebase manually now.\n\
         When finished, re-run:\n    git drip {kind} finish {name}"
    )]
    RebaseFailed { kind: &'static str, name: String },
    #[error(
        "There were merge conflicts. To resolve the merge conflict manually, use:\n    \
         git mergetool\n    git commit\n\n\
         You can then complete the finish by running it again:\n    git drip {kind} finish {name}"
    )]
    MergeConflict { kind: &'static str, name: String },
    #[error(
        "Merge conflicts not resolved yet, use:\n    git mergetool\n    git commit\n\n\
         You can then complete the finish by running it again:\n    git drip {kind} finish {name}"
    )]
    UnresolvedConflicts { kind: &'static str, name: String },
}

impl DripError {
    /// Whether a second `finish` after manual resolution can complete the work.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::MergeConflict { .. } | Self::UnresolvedConflicts { .. }
        )
    }

    /// Text the failed command printed, if this error came from one.
    #[must_use]
    pub fn command_output(&self) -> Option<&str> {
        match self {
            Self::CommandFailed { output, .. } => Some(output),
            _ => None,
        }
    }
}

fn status_text(code: Option<i32>) -> String {
    code.map_or_else(
        || "no exit status".to_string(),
        |c| format!("exit status {c}"),
    )
}

pub type Result<T, E = DripError> = std::result::Result<T, E>;
