use crate::error::{DripError, Result};
use crate::git::{Branch, refs};
use crate::types::TreeStatus;

use super::Context;

/// # Errors
/// [`DripError::NotInitialized`] unless `git drip init` has been run.
pub fn require_initialized(ctx: &Context) -> Result<()> {
    if ctx.is_initialized()? {
        Ok(())
    } else {
        Err(DripError::NotInitialized)
    }
}

/// # Errors
/// [`DripError::UnstagedChanges`] or [`DripError::UncommittedChanges`].
pub fn require_clean_tree(ctx: &Context) -> Result<()> {
    match refs::working_tree_status(ctx.git())? {
        TreeStatus::Clean => Ok(()),
        TreeStatus::Unstaged => Err(DripError::UnstagedChanges),
        TreeStatus::Uncommitted => Err(DripError::UncommittedChanges),
    }
}

/// # Errors
/// [`DripError::BranchMissing`] when `branch` is not a local branch.
pub fn require_branch(ctx: &Context, branch: &Branch) -> Result<()> {
    let name = branch.prefixed_name();
    if refs::contains(&ctx.local_branches()?, &name) {
        Ok(())
    } else {
        Err(DripError::BranchMissing(name))
    }
}

/// # Errors
/// [`DripError::BranchExists`] when `branch` is already a local branch.
pub fn require_branch_absent(ctx: &Context, branch: &Branch) -> Result<()> {
    let name = branch.prefixed_name();
    if refs::contains(&ctx.local_branches()?, &name) {
        Err(DripError::BranchExists(name))
    } else {
        Ok(())
    }
}
