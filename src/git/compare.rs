use crate::error::{DripError, Result};
use crate::types::CompareStatus;

use super::Git;
use super::refs::{merge_base, rev_parse};

/// Classify how `local` relates to `remote` through their merge base.
///
/// # Errors
/// Returns an error when either ref cannot be resolved.
pub fn compare(git: &Git, local: &str, remote: &str) -> Result<CompareStatus> {
    let local_commit = rev_parse(git, local)?;
    let remote_commit = rev_parse(git, remote)?;
    if local_commit == remote_commit {
        return Ok(CompareStatus::Equal);
    }
    let Ok(base) = merge_base(git, &local_commit, &remote_commit) else {
        return Ok(CompareStatus::NoCommonAncestor);
    };
    Ok(if local_commit == base {
        CompareStatus::Behind
    } else if remote_commit == base {
        CompareStatus::Ahead
    } else {
        CompareStatus::NeedMerge
    })
}

/// Insist that `local` and `remote` point at the same commit.
///
/// Being ahead only earns a warning; every other difference is an error.
///
/// # Errors
/// [`DripError::BranchBehind`], [`DripError::BranchesNeedMerge`] or
/// [`DripError::NoCommonAncestor`], or a failure resolving either ref.
pub fn require_equal(git: &Git, local: &str, remote: &str) -> Result<()> {
    let (local, remote) = (local.to_string(), remote.to_string());
    match compare(git, &local, &remote)? {
        CompareStatus::Equal => Ok(()),
        CompareStatus::Ahead => {
            git.console().errln(&format!(
                "Branches '{local}' and '{remote}' have diverged.\n\
                 And local branch '{local}' is ahead of '{remote}'."
            ));
            Ok(())
        }
        CompareStatus::Behind => Err(DripError::BranchBehind { local, remote }),
        CompareStatus::NeedMerge => Err(DripError::BranchesNeedMerge { local, remote }),
        CompareStatus::NoCommonAncestor => Err(DripError::NoCommonAncestor { local, remote }),
    }
}
