use tracing::{info, warn};

use crate::error::{DripError, Result};
use crate::git::{Branch, refs, require_equal};
use crate::output::format_summary;
use crate::settings::BranchKind;
use crate::types::TreeStatus;

use super::branches::{prepare_rebase, rebase_args, resolve_branch_or_current};
use super::{Context, ResumeMarker, require_branch, require_clean_tree, require_initialized};

#[derive(Debug, Clone, Copy, Default)]
#[allow(clippy::struct_excessive_bools)]
pub struct FinishOptions {
    /// Fetch from the remote first and delete the remote branch afterwards.
    pub remote: bool,
    /// Keep the branch after merging.
    pub keep: bool,
    /// Squash the branch into a single commit on master.
    pub squash: bool,
    /// Rebase onto master before merging.
    pub rebase: bool,
}

/// Merge a `kind` branch into master and remove it.
///
/// A merge conflict leaves a resume marker behind; running `finish` again once
/// the conflict is committed completes the cleanup.
///
/// # Errors
/// [`DripError::MergeConflict`] and [`DripError::UnresolvedConflicts`] are
/// retryable; everything else (dirty tree, diverged branches, failed rebase,
/// failing git calls) is fatal.
pub fn finish(ctx: &Context, kind: BranchKind, name: Option<&str>, opts: FinishOptions) -> Result<()> {
    require_initialized(ctx)?;
    let branch = resolve_branch_or_current(ctx, kind, name)?;
    require_branch(ctx, &branch)?;

    let master = ctx.master()?;
    let remote = ctx.remote()?;
    let marker = ResumeMarker::locate(&ctx.git_dir()?);

    if marker.exists(ctx.fs()) {
        if has_unresolved_changes(ctx)? {
            return Err(DripError::UnresolvedConflicts {
                kind: kind.label(),
                name: branch.name,
            });
        }
        let merged_into = marker.take(ctx.fs())?;
        if branch.is_merged_into(ctx.git(), &merged_into)? {
            info!(branch = %branch.prefixed_name(), "resuming finish after conflict");
            return cleanup(ctx, kind, &branch, &merged_into, &remote, opts);
        }
        warn!(branch = %branch.prefixed_name(), "resume marker found but branch not merged");
    }

    require_clean_tree(ctx)?;

    let git = ctx.git();
    let prefixed = branch.prefixed_name();
    let remote_branch = format!("{remote}/{prefixed}");
    let remote_master = format!("{remote}/{master}");
    if refs::remote_contains(git, &remote, &remote_branch)? {
        if opts.remote {
            git.run(&["fetch", "-q", &remote, &prefixed])?;
        }
        require_equal(git, &prefixed, &remote_branch)?;
    }
    let has_remote_master = refs::remote_contains(git, &remote, &remote_master)?;
    if has_remote_master {
        require_equal(git, &master, &remote_master)?;
    }

    if opts.rebase {
        let onto = if has_remote_master {
            remote_master.as_str()
        } else {
            master.as_str()
        };
        prepare_rebase(ctx, &branch)?;
        match git.run(&rebase_args(onto, false)) {
            Ok(()) => {}
            Err(DripError::CommandFailed { .. }) => {
                return Err(DripError::RebaseFailed {
                    kind: kind.label(),
                    name: branch.name,
                });
            }
            Err(err) => return Err(err),
        }
    }

    git.run(&["checkout", &master])?;
    let merged = if opts.squash {
        git.run_quiet(&["merge", "--squash", &prefixed])
    } else {
        git.run_quiet(&["merge", "--no-edit", &prefixed])
    };
    match merged {
        Ok(()) => {}
        Err(DripError::CommandFailed { .. }) => {
            marker.write(ctx.fs(), &master)?;
            return Err(DripError::MergeConflict {
                kind: kind.label(),
                name: branch.name,
            });
        }
        Err(err) => return Err(err),
    }
    if opts.squash && refs::has_staged_changes(git)? {
        let message = format!("Squashed {} branch '{prefixed}'", kind.label());
        git.run(&["commit", "-m", &message])?;
    }

    cleanup(ctx, kind, &branch, &master, &remote, opts)
}

/// Anything left in the index or the worktree after a conflicted merge,
/// including unmerged paths.
fn has_unresolved_changes(ctx: &Context) -> Result<bool> {
    let git = ctx.git();
    Ok(refs::has_unstaged_changes(git)?
        || refs::has_staged_changes(git)?
        || refs::working_tree_status(git)? != TreeStatus::Clean)
}

fn cleanup(
    ctx: &Context,
    kind: BranchKind,
    branch: &Branch,
    master: &str,
    remote: &str,
    opts: FinishOptions,
) -> Result<()> {
    require_branch(ctx, branch)?;
    require_clean_tree(ctx)?;

    let git = ctx.git();
    let prefixed = branch.prefixed_name();
    if opts.remote && refs::remote_contains(git, remote, &format!("{remote}/{prefixed}"))? {
        git.run(&["push", remote, &format!(":{prefixed}")])?;
    }
    if !opts.keep {
        let flag = if opts.squash { "-D" } else { "-d" };
        git.run(&["branch", flag, &prefixed])?;
    }

    let fate = if opts.keep {
        "is still available"
    } else {
        "has been removed"
    };
    ctx.console().out(&format_summary(&[
        format!(
            "The {} branch '{prefixed}' was merged into '{master}'",
            kind.label()
        ),
        format!("{} branch '{prefixed}' {fate}", kind.title()),
        format!("You are now on branch '{master}'"),
    ]));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedRunner;
    use crate::workflow::test_support::context;
    use tempfile::tempdir;

    const HEADS: &str = "for-each-ref --format=%(refname:short) refs/heads";
    const REMOTES: &str = "for-each-ref --format=%(refname:short) refs/remotes/origin";

    fn scripted(git_dir: &std::path::Path) -> ScriptedRunner {
        let script = ScriptedRunner::default();
        script.reply(HEADS, "master\nfeature/foo\n");
        script.reply("rev-parse --git-dir", &format!("{}\n", git_dir.display()));
        script
    }

    #[test]
    fn clean_finish_merges_and_deletes() {
        let temp = tempdir().expect("tempdir");
        let script = scripted(temp.path());
        let ctx = context(&script, temp.path());
        finish(&ctx, BranchKind::Feature, Some("foo"), FinishOptions::default()).unwrap();

        let log = script.log();
        let merge = log
            .iter()
            .position(|c| c == "git merge --no-edit feature/foo")
            .expect("merge ran");
        let checkout = log
            .iter()
            .position(|c| c == "git checkout master")
            .expect("checkout ran");
        assert!(checkout < merge);
        assert!(log.contains(&"git branch -d feature/foo".to_string()));
        let out = ctx.console().stdout_text();
        assert!(out.contains("The feature branch 'feature/foo' was merged into 'master'"));
        assert!(out.contains("Feature branch 'feature/foo' has been removed"));
    }

    #[test]
    fn conflict_writes_marker_and_keeps_branch() {
        let temp = tempdir().expect("tempdir");
        let script = scripted(temp.path());
        script.fail("merge --no-edit feature/foo", "CONFLICT");
        let ctx = context(&script, temp.path());
        let err = finish(&ctx, BranchKind::Feature, Some("foo"), FinishOptions::default())
            .unwrap_err();
        assert!(err.is_retryable());
        assert!(err.to_string().contains("git drip feature finish foo"));

        let marker = temp.path().join(".gitdrip").join("MERGE_BASE");
        assert_eq!(std::fs::read_to_string(marker).unwrap(), "master");
        assert!(!script.log().iter().any(|c| c.starts_with("git branch -d")));
    }

    #[test]
    fn resume_with_dirty_tree_is_refused() {
        let temp = tempdir().expect("tempdir");
        let script = scripted(temp.path());
        script.fail("diff --no-ext-diff --ignore-submodules --quiet --exit-code", "");
        let ctx = context(&script, temp.path());
        ResumeMarker::locate(temp.path())
            .write(ctx.fs(), "master")
            .unwrap();

        let err = finish(&ctx, BranchKind::Feature, Some("foo"), FinishOptions::default())
            .unwrap_err();
        assert!(matches!(err, DripError::UnresolvedConflicts { .. }));
        assert!(ResumeMarker::locate(temp.path()).exists(ctx.fs()));
    }

    #[test]
    fn resume_after_commit_only_cleans_up() {
        let temp = tempdir().expect("tempdir");
        let script = scripted(temp.path());
        script.reply(
            "branch -a --no-color --contains refs/heads/feature/foo",
            "* master\n  feature/foo\n",
        );
        let ctx = context(&script, temp.path());
        ResumeMarker::locate(temp.path())
            .write(ctx.fs(), "master")
            .unwrap();

        finish(&ctx, BranchKind::Feature, Some("foo"), FinishOptions::default()).unwrap();
        let log = script.log();
        assert!(!log.iter().any(|c| c.starts_with("git merge")));
        assert!(log.contains(&"git branch -d feature/foo".to_string()));
        assert!(!ResumeMarker::locate(temp.path()).exists(ctx.fs()));
    }

    #[test]
    fn failed_rebase_stops_before_merge() {
        let temp = tempdir().expect("tempdir");
        let script = scripted(temp.path());
        script.fail("rebase master", "CONFLICT");
        let ctx = context(&script, temp.path());
        let opts = FinishOptions {
            rebase: true,
            ..FinishOptions::default()
        };
        let err = finish(&ctx, BranchKind::Feature, Some("foo"), opts).unwrap_err();
        assert!(matches!(err, DripError::RebaseFailed { .. }));
        assert!(!script.log().iter().any(|c| c.starts_with("git merge")));
    }

    #[test]
    fn squash_commits_staged_result_and_force_deletes() {
        let temp = tempdir().expect("tempdir");
        let script = scripted(temp.path());
        script.reply("status -b --porcelain", "## master\nM  a.txt\n");
        let ctx = context(&script, temp.path());
        let opts = FinishOptions {
            squash: true,
            ..FinishOptions::default()
        };
        finish(&ctx, BranchKind::Feature, Some("foo"), opts).unwrap();
        let log = script.log();
        assert!(log.contains(&"git merge --squash feature/foo".to_string()));
        assert!(log.contains(&"git commit -m Squashed feature branch 'feature/foo'".to_string()));
        assert!(log.contains(&"git branch -D feature/foo".to_string()));
    }

    #[test]
    fn unpushed_branch_skips_fetch_with_remote_option() {
        let temp = tempdir().expect("tempdir");
        let script = scripted(temp.path());
        script.reply(REMOTES, "origin/master\n");
        script.reply("rev-parse master", "aaa\n");
        script.reply("rev-parse origin/master", "aaa\n");
        script.fail("fetch -q origin feature/foo", "fatal: couldn't find remote ref");
        let ctx = context(&script, temp.path());
        let opts = FinishOptions {
            remote: true,
            ..FinishOptions::default()
        };
        finish(&ctx, BranchKind::Feature, Some("foo"), opts).unwrap();

        let log = script.log();
        assert!(!log.iter().any(|c| c.starts_with("git fetch")));
        assert!(!log.iter().any(|c| c.starts_with("git push")));
        assert!(log.contains(&"git merge --no-edit feature/foo".to_string()));
        assert!(log.contains(&"git branch -d feature/foo".to_string()));
    }

    #[test]
    fn pushed_branch_is_fetched_then_deleted_on_remote() {
        let temp = tempdir().expect("tempdir");
        let script = scripted(temp.path());
        script.reply(REMOTES, "origin/master\norigin/feature/foo\n");
        script.reply("rev-parse master", "aaa\n");
        script.reply("rev-parse origin/master", "aaa\n");
        script.reply("rev-parse feature/foo", "bbb\n");
        script.reply("rev-parse origin/feature/foo", "bbb\n");
        let ctx = context(&script, temp.path());
        let opts = FinishOptions {
            remote: true,
            ..FinishOptions::default()
        };
        finish(&ctx, BranchKind::Feature, Some("foo"), opts).unwrap();

        let log = script.log();
        let position = |cmd: &str| log.iter().position(|c| c == cmd);
        let fetch = position("git fetch -q origin feature/foo").expect("fetch ran");
        let merge = position("git merge --no-edit feature/foo").expect("merge ran");
        let push = position("git push origin :feature/foo").expect("remote delete ran");
        assert!(fetch < merge);
        assert!(merge < push);
    }

    #[test]
    fn keep_leaves_branch_in_place() {
        let temp = tempdir().expect("tempdir");
        let script = scripted(temp.path());
        let ctx = context(&script, temp.path());
        let opts = FinishOptions {
            keep: true,
            ..FinishOptions::default()
        };
        finish(&ctx, BranchKind::Feature, Some("foo"), opts).unwrap();
        assert!(!script.log().iter().any(|c| c.starts_with("git branch -")));
        assert!(ctx
            .console()
            .stdout_text()
            .contains("Feature branch 'feature/foo' is still available"));
    }

    #[test]
    fn stale_marker_is_consumed_and_merge_runs() {
        let temp = tempdir().expect("tempdir");
        let script = scripted(temp.path());
        script.reply(
            "branch -a --no-color --contains refs/heads/feature/foo",
            "  feature/foo\n",
        );
        let ctx = context(&script, temp.path());
        let marker = ResumeMarker::locate(temp.path());
        marker.write(ctx.fs(), "master").unwrap();

        finish(&ctx, BranchKind::Feature, Some("foo"), FinishOptions::default()).unwrap();
        assert!(!marker.exists(ctx.fs()));
        let log = script.log();
        assert!(log.contains(&"git merge --no-edit feature/foo".to_string()));
        assert!(log.contains(&"git branch -d feature/foo".to_string()));
    }

    #[test]
    fn resume_with_unmerged_paths_is_refused() {
        let temp = tempdir().expect("tempdir");
        let script = scripted(temp.path());
        script.reply("status -b --porcelain", "## master\nUU a.txt\n");
        let ctx = context(&script, temp.path());
        let marker = ResumeMarker::locate(temp.path());
        marker.write(ctx.fs(), "master").unwrap();

        let err = finish(&ctx, BranchKind::Feature, Some("foo"), FinishOptions::default())
            .unwrap_err();
        assert!(matches!(err, DripError::UnresolvedConflicts { .. }));
        assert!(marker.exists(ctx.fs()));
    }

    #[test]
    fn failed_checkout_before_rebase_is_not_a_rebase_conflict() {
        let temp = tempdir().expect("tempdir");
        let script = scripted(temp.path());
        script.fail("checkout -q feature/foo", "error: pathspec");
        let ctx = context(&script, temp.path());
        let opts = FinishOptions {
            rebase: true,
            ..FinishOptions::default()
        };
        let err = finish(&ctx, BranchKind::Feature, Some("foo"), opts).unwrap_err();
        assert!(matches!(
            err,
            DripError::CommandFailed { ref command, .. } if command == "git checkout -q feature/foo"
        ));
        assert!(!script.log().iter().any(|c| c.starts_with("git rebase")));
    }
}
