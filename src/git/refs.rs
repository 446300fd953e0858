use std::path::PathBuf;

use crate::error::{DripError, Result};
use crate::types::TreeStatus;

use super::{Branch, Git};

#[must_use]
pub fn current_branch(git: &Git, prefixes: &[String]) -> Option<Branch> {
    let name = git
        .capture_trimmed(&["rev-parse", "--abbrev-ref", "HEAD"])
        .ok()?;
    if name.is_empty() {
        return None;
    }
    let name = name.strip_prefix("heads/").unwrap_or(&name);
    Some(Branch::split(name, prefixes))
}

/// # Errors
/// Returns an error when the branch listing cannot be read.
pub fn local_branches(git: &Git, prefixes: &[String]) -> Result<Vec<Branch>> {
    let out = git.capture(&["for-each-ref", "--format=%(refname:short)", "refs/heads"])?;
    Ok(out
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(|l| Branch::split(l, prefixes))
        .collect())
}

/// Local branches whose name starts with `prefix`.
///
/// # Errors
/// Returns an error when the branch listing cannot be read.
pub fn prefixed_branches(git: &Git, prefixes: &[String], prefix: &str) -> Result<Vec<Branch>> {
    Ok(local_branches(git, prefixes)?
        .into_iter()
        .filter(|b| b.prefixed_name().starts_with(prefix))
        .collect())
}

#[must_use]
pub fn contains(branches: &[Branch], prefixed_name: &str) -> bool {
    branches.iter().any(|b| b.prefixed_name() == prefixed_name)
}

/// Remote-tracking branches of `remote`, as `remote/name`.
///
/// # Errors
/// Returns an error when the ref listing cannot be read.
pub fn remote_branches(git: &Git, remote: &str) -> Result<Vec<String>> {
    let pattern = format!("refs/remotes/{remote}");
    let out = git.capture(&["for-each-ref", "--format=%(refname:short)", &pattern])?;
    Ok(out
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && *l != remote && !l.ends_with("/HEAD"))
        .map(str::to_string)
        .collect())
}

/// # Errors
/// Returns an error when the ref listing cannot be read.
pub fn remote_contains(git: &Git, remote: &str, name: &str) -> Result<bool> {
    Ok(remote_branches(git, remote)?.iter().any(|b| b == name))
}

/// Names of local and remote branches containing `commit`, with the
/// current-branch marker and the `remotes/` qualifier removed.
///
/// # Errors
/// Returns an error when git cannot list the branches.
pub fn branches_containing(git: &Git, commit: &str) -> Result<Vec<String>> {
    let out = git.capture(&["branch", "-a", "--no-color", "--contains", commit])?;
    Ok(out
        .lines()
        .map(|l| {
            let l = l.trim();
            let l = l.strip_prefix("* ").unwrap_or(l);
            // "remotes/origin/HEAD -> origin/master"
            let l = l.split(" -> ").next().unwrap_or(l);
            l.strip_prefix("remotes/").unwrap_or(l).to_string()
        })
        .filter(|l| !l.is_empty())
        .collect())
}

/// # Errors
/// Returns an error when `rev` does not name a commit.
pub fn rev_parse(git: &Git, rev: &str) -> Result<String> {
    git.capture_trimmed(&["rev-parse", rev])
}

/// # Errors
/// Returns an error when the two commits share no history.
pub fn merge_base(git: &Git, a: &str, b: &str) -> Result<String> {
    git.capture_trimmed(&["merge-base", a, b])
}

/// Path of the repository metadata directory, if inside a repository.
#[must_use]
pub fn git_dir(git: &Git) -> Option<PathBuf> {
    let dir = git.capture_trimmed(&["rev-parse", "--git-dir"]).ok()?;
    if dir.is_empty() {
        return None;
    }
    let dir = PathBuf::from(dir);
    Some(if dir.is_absolute() {
        dir
    } else {
        git.repo().join(dir)
    })
}

/// # Errors
/// Returns [`DripError::NotARepository`] outside a repository.
pub fn require_git_dir(git: &Git) -> Result<PathBuf> {
    git_dir(git).ok_or(DripError::NotARepository)
}

/// True when HEAD does not point at a commit yet.
///
/// # Errors
/// Returns an error when git cannot be launched.
pub fn is_headless(git: &Git) -> Result<bool> {
    Ok(!git.succeeds(&["rev-parse", "--quiet", "--verify", "HEAD"])?)
}

/// # Errors
/// Returns an error when git cannot be launched.
pub fn working_tree_status(git: &Git) -> Result<TreeStatus> {
    if !git.succeeds(&[
        "diff",
        "--no-ext-diff",
        "--ignore-submodules",
        "--quiet",
        "--exit-code",
    ])? {
        return Ok(TreeStatus::Unstaged);
    }
    if !git.succeeds(&[
        "diff-index",
        "--cached",
        "--quiet",
        "--ignore-submodules",
        "HEAD",
        "--",
    ])? {
        return Ok(TreeStatus::Uncommitted);
    }
    Ok(TreeStatus::Clean)
}

fn porcelain_status(git: &Git) -> Result<String> {
    git.capture(&["status", "-b", "--porcelain"])
}

fn is_change_code(c: char) -> bool {
    matches!(c, 'A' | 'C' | 'D' | 'M' | 'R' | 'U')
}

/// # Errors
/// Returns an error when `git status` fails.
pub fn has_staged_changes(git: &Git) -> Result<bool> {
    Ok(porcelain_status(git)?.lines().any(|line| {
        let mut chars = line.chars();
        let (x, y) = (chars.next(), chars.next());
        match (x, y) {
            (Some('U'), _) | (_, Some('U')) => true,
            (Some(x), Some(' ')) => is_change_code(x),
            _ => false,
        }
    }))
}

/// # Errors
/// Returns an error when `git status` fails.
pub fn has_unstaged_changes(git: &Git) -> Result<bool> {
    Ok(porcelain_status(git)?
        .lines()
        .filter(|line| !line.starts_with("##"))
        .any(|line| line.chars().nth(1).is_some_and(is_change_code)))
}

/// Free-text description of a branch, empty when none was recorded.
#[must_use]
pub fn branch_description(git: &Git, prefixed_name: &str) -> String {
    let key = format!("branch.{prefixed_name}.description");
    git.capture_trimmed(&["config", &key]).unwrap_or_default()
}

/// Nearest tag reachable from `commit`, if any.
#[must_use]
pub fn nearest_tag(git: &Git, commit: &str) -> Option<String> {
    git.capture_trimmed(&["name-rev", "--tags", "--no-undefined", "--name-only", commit])
        .ok()
        .filter(|s| !s.is_empty())
}
