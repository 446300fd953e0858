use crate::error::{DripError, Result};
use crate::git::{Branch, refs, require_equal};
use crate::output::{format_listing, format_summary, to_json};
use crate::settings::BranchKind;
use crate::types::BranchEntry;

use super::{Context, require_branch, require_branch_absent, require_clean_tree, require_initialized};

/// Find the `kind` branch named `arg`, or the only one whose name starts with it.
///
/// # Errors
/// [`DripError::NoBranchMatch`] or [`DripError::AmbiguousBranch`].
pub fn resolve_branch(ctx: &Context, kind: BranchKind, arg: &str) -> Result<Branch> {
    let prefix = ctx.prefix(kind)?;
    let wanted = Branch::new(&prefix, arg);
    let wanted_name = wanted.prefixed_name();
    let branches = ctx.category_branches(kind)?;
    if refs::contains(&branches, &wanted_name) {
        return Ok(wanted);
    }
    let matches: Vec<Branch> = branches
        .into_iter()
        .filter(|b| b.prefixed_name().starts_with(&wanted_name))
        .collect();
    match matches.as_slice() {
        [] => Err(DripError::NoBranchMatch(arg.to_string())),
        [only] => Ok(only.clone()),
        many => Err(DripError::AmbiguousBranch {
            prefix: arg.to_string(),
            matches: many.iter().map(Branch::full_name).collect(),
        }),
    }
}

/// Resolve `arg` when given, otherwise require HEAD to be a `kind` branch.
///
/// # Errors
/// As [`resolve_branch`], or [`DripError::NotOnCategoryBranch`].
pub fn resolve_branch_or_current(
    ctx: &Context,
    kind: BranchKind,
    arg: Option<&str>,
) -> Result<Branch> {
    if let Some(arg) = arg {
        return resolve_branch(ctx, kind, arg);
    }
    let prefix = ctx.prefix(kind)?;
    match ctx.current_branch()? {
        Some(branch) if !branch.is_detached() && branch.prefix == prefix => Ok(branch),
        _ => Err(DripError::NotOnCategoryBranch(kind.label())),
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ListOptions {
    pub descriptions: bool,
    pub json: bool,
}

/// Print the `kind` branches, or a hint on stderr when there are none.
///
/// # Errors
/// Returns an error when the workflow is not initialized or git queries fail.
pub fn list(ctx: &Context, kind: BranchKind, opts: ListOptions) -> Result<()> {
    require_initialized(ctx)?;
    let branches = ctx.category_branches(kind)?;
    if branches.is_empty() {
        let label = kind.label();
        ctx.console().errln(&format!(
            "No {label} branches exist.\n\n\
             You can start a new {label} branch:\n\n    \
             git drip {label} start <name> [<base>]\n"
        ));
        return Ok(());
    }

    let master = ctx.master()?;
    let current = ctx.current_branch()?.map(|b| b.prefixed_name());
    let verbose = ctx.git().options().verbosity > 0;
    let mut entries = Vec::with_capacity(branches.len());
    for branch in &branches {
        let prefixed = branch.prefixed_name();
        let description = (opts.descriptions || verbose)
            .then(|| refs::branch_description(ctx.git(), &prefixed))
            .filter(|d| !d.is_empty());
        let status = if verbose {
            Some(branch_status(ctx, kind, branch, &master)?)
        } else {
            None
        };
        entries.push(BranchEntry {
            name: branch.name.clone(),
            current: current.as_deref() == Some(prefixed.as_str()),
            branch: prefixed,
            description,
            status,
        });
    }

    if opts.json {
        ctx.console().outln(&to_json(&entries)?);
    } else {
        ctx.console().out(&format_listing(&entries));
    }
    Ok(())
}

fn branch_status(ctx: &Context, kind: BranchKind, branch: &Branch, master: &str) -> Result<String> {
    let git = ctx.git();
    let full = branch.full_name();
    let base = refs::merge_base(git, &full, master)?;
    let master_sha = refs::rev_parse(git, master)?;
    let branch_sha = refs::rev_parse(git, &full)?;
    if branch_sha == master_sha {
        return Ok("(no commits yet)".to_string());
    }
    if kind == BranchKind::Hotfix {
        let based_on = match refs::nearest_tag(git, &base) {
            Some(tag) => tag,
            None => git.capture_trimmed(&["rev-parse", "--short", &base])?,
        };
        return Ok(format!("(based on {based_on})"));
    }
    Ok(if base == branch_sha {
        format!("(is behind {master}, may ff)")
    } else if base == master_sha {
        format!("(based on latest {master})")
    } else {
        "(may be rebased)".to_string()
    })
}

#[derive(Debug, Clone, Default)]
pub struct StartOptions {
    pub name: String,
    /// Start point; the master branch when absent.
    pub base: Option<String>,
    /// Fetch the master branch from the remote first.
    pub fetch: bool,
    pub description: Option<String>,
    /// Open an editor for the description.
    pub edit_description: bool,
}

/// Create and check out a new `kind` branch.
///
/// # Errors
/// [`DripError::BranchExists`], a master that differs from its remote
/// counterpart, [`DripError::BranchCreate`], or failing git calls.
pub fn start(ctx: &Context, kind: BranchKind, opts: &StartOptions) -> Result<()> {
    require_initialized(ctx)?;
    let branch = Branch::new(&ctx.prefix(kind)?, &opts.name);
    require_branch_absent(ctx, &branch)?;

    let master = ctx.master()?;
    let remote = ctx.remote()?;
    let base = opts.base.clone().unwrap_or_else(|| master.clone());
    let git = ctx.git();

    if opts.fetch {
        git.run(&["fetch", "-q", &remote, &master])?;
    }
    let remote_master = format!("{remote}/{master}");
    if refs::remote_contains(git, &remote, &remote_master)? {
        require_equal(git, &master, &remote_master)?;
    }

    let prefixed = branch.prefixed_name();
    if git.run_quiet(&["checkout", "-b", &prefixed, &base]).is_err() {
        return Err(DripError::BranchCreate {
            kind: kind.label(),
            branch: prefixed,
        });
    }
    if let Some(description) = opts.description.as_deref().filter(|d| !d.is_empty()) {
        ctx.set_description(&branch, description)?;
    }
    if opts.edit_description {
        git.run(&["branch", "--edit-description", &prefixed])?;
    }

    ctx.console().out(&format_summary(&[
        format!("A new branch '{prefixed}' was created, based on '{base}'"),
        format!("You are now on branch '{prefixed}'"),
    ]));
    ctx.console().outln(&format!(
        "Now, start committing on your {}. When done, use:\n\n    git drip {} finish {}\n",
        kind.label(),
        kind.label(),
        branch.name
    ));
    Ok(())
}

/// Set a branch description, or open an editor when none is given.
///
/// # Errors
/// Returns an error when the branch cannot be resolved or git fails.
pub fn describe(
    ctx: &Context,
    kind: BranchKind,
    name: Option<&str>,
    description: Option<&str>,
) -> Result<()> {
    require_initialized(ctx)?;
    let branch = resolve_branch_or_current(ctx, kind, name)?;
    let prefixed = branch.prefixed_name();
    match description.filter(|d| !d.is_empty()) {
        Some(description) => ctx.set_description(&branch, description)?,
        None => ctx
            .git()
            .run(&["branch", "--edit-description", &prefixed])?,
    }
    ctx.console().out(&format_summary(&[format!(
        "The local branch '{prefixed}' had description edited"
    )]));
    Ok(())
}

/// Delete a `kind` branch locally and optionally on the remote.
///
/// # Errors
/// Returns an error when the branch is missing, the tree is dirty or git fails.
pub fn delete(ctx: &Context, kind: BranchKind, name: &str, remote: bool) -> Result<()> {
    require_initialized(ctx)?;
    let branch = resolve_branch(ctx, kind, name)?;
    require_branch(ctx, &branch)?;
    require_clean_tree(ctx)?;

    let master = ctx.master()?;
    let prefixed = branch.prefixed_name();
    let git = ctx.git();
    git.run(&["checkout", &master])?;
    if remote {
        git.run(&["push", &ctx.remote()?, &format!(":{prefixed}")])?;
    }
    git.run(&["branch", "-d", &prefixed])?;

    ctx.console().out(&format_summary(&[
        format!("{} branch '{prefixed}' has been removed", kind.title()),
        format!("You are now on branch '{master}'"),
    ]));
    Ok(())
}

/// # Errors
/// Returns an error when the branch cannot be resolved or checked out.
pub fn checkout(ctx: &Context, kind: BranchKind, name: &str) -> Result<()> {
    require_initialized(ctx)?;
    let branch = resolve_branch(ctx, kind, name)?;
    ctx.git().run(&["checkout", &branch.prefixed_name()])
}

/// Show what the branch (or the current one) changed since leaving master.
///
/// # Errors
/// Returns an error when not on a `kind` branch without a name, or git fails.
pub fn diff(ctx: &Context, kind: BranchKind, name: Option<&str>) -> Result<()> {
    require_initialized(ctx)?;
    let master = ctx.master()?;
    let git = ctx.git();
    if let Some(name) = name {
        let prefixed = resolve_branch(ctx, kind, name)?.prefixed_name();
        let base = refs::merge_base(git, &master, &prefixed)?;
        return git.run(&["diff", &format!("{base}..{prefixed}")]);
    }
    resolve_branch_or_current(ctx, kind, None)?;
    let base = refs::merge_base(git, &master, "HEAD")?;
    git.run(&["diff", &base])
}

/// Rebase the branch (or the current one) onto the master branch.
///
/// # Errors
/// Returns an error when the tree is dirty, the branch is missing or the
/// rebase stops.
pub fn rebase(ctx: &Context, kind: BranchKind, name: Option<&str>, interactive: bool) -> Result<()> {
    require_initialized(ctx)?;
    let branch = resolve_branch_or_current(ctx, kind, name)?;
    let master = ctx.master()?;
    prepare_rebase(ctx, &branch)?;
    ctx.git().run(&rebase_args(&master, interactive))
}

/// Announce the rebase, check the preconditions and check out the branch.
pub(super) fn prepare_rebase(ctx: &Context, branch: &Branch) -> Result<()> {
    ctx.console()
        .errln(&format!("Will try to rebase '{}'", branch.name));
    require_clean_tree(ctx)?;
    require_branch(ctx, branch)?;
    ctx.git().run(&["checkout", "-q", &branch.prefixed_name()])
}

pub(super) fn rebase_args(onto: &str, interactive: bool) -> Vec<&str> {
    let mut args = vec!["rebase"];
    if interactive {
        args.push("-i");
    }
    args.push(onto);
    args
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedRunner;
    use crate::workflow::test_support::context;
    use std::path::Path;

    const HEADS: &str = "for-each-ref --format=%(refname:short) refs/heads";

    #[test]
    fn resolves_exact_then_unique_prefix() {
        let script = ScriptedRunner::default();
        script.reply(HEADS, "master\nfeature/login\nfeature/logout\nfeature/search\n");
        let ctx = context(&script, Path::new("/repo"));
        let exact = resolve_branch(&ctx, BranchKind::Feature, "login").unwrap();
        assert_eq!(exact, Branch::new("feature/", "login"));
        let unique = resolve_branch(&ctx, BranchKind::Feature, "sea").unwrap();
        assert_eq!(unique, Branch::new("feature/", "search"));
        assert!(matches!(
            resolve_branch(&ctx, BranchKind::Feature, "log"),
            Err(DripError::AmbiguousBranch { ref matches, .. }) if matches.len() == 2
        ));
        assert!(matches!(
            resolve_branch(&ctx, BranchKind::Feature, "zzz"),
            Err(DripError::NoBranchMatch(_))
        ));
    }

    #[test]
    fn current_branch_must_match_kind() {
        let script = ScriptedRunner::default();
        script.reply("rev-parse --abbrev-ref HEAD", "hotfix/urgent\n");
        let ctx = context(&script, Path::new("/repo"));
        assert!(matches!(
            resolve_branch_or_current(&ctx, BranchKind::Feature, None),
            Err(DripError::NotOnCategoryBranch("feature"))
        ));
        let hotfix = resolve_branch_or_current(&ctx, BranchKind::Hotfix, None).unwrap();
        assert_eq!(hotfix.name, "urgent");
    }

    #[test]
    fn empty_listing_prints_hint_only() {
        let script = ScriptedRunner::default();
        script.reply(HEADS, "master\n");
        let ctx = context(&script, Path::new("/repo"));
        list(&ctx, BranchKind::Feature, ListOptions::default()).unwrap();
        assert_eq!(ctx.console().stdout_text(), "");
        let err = ctx.console().stderr_text();
        assert!(err.contains("No feature branches exist."));
        assert!(err.contains("git drip feature start <name>"));
    }

    #[test]
    fn listing_marks_current_and_shows_descriptions() {
        let script = ScriptedRunner::default();
        script.reply(HEADS, "master\nfeature/foo\nfeature/longer\nhotfix/x\n");
        script.reply("rev-parse --abbrev-ref HEAD", "feature/foo\n");
        script.reply("config branch.feature/foo.description", "Foo work\n");
        script.fail("config branch.feature/longer.description", "");
        let ctx = context(&script, Path::new("/repo"));
        list(
            &ctx,
            BranchKind::Feature,
            ListOptions {
                descriptions: true,
                json: false,
            },
        )
        .unwrap();
        assert_eq!(
            ctx.console().stdout_text(),
            "* foo      Foo work\n  longer\n"
        );
    }

    #[test]
    fn start_creates_branch_from_master_with_description() {
        let script = ScriptedRunner::default();
        script.reply(HEADS, "master\n");
        let ctx = context(&script, Path::new("/repo"));
        start(
            &ctx,
            BranchKind::Feature,
            &StartOptions {
                name: "foo".into(),
                description: Some("Adds foo".into()),
                ..StartOptions::default()
            },
        )
        .unwrap();
        let log = script.log();
        assert!(log.contains(&"git checkout -b feature/foo master".to_string()));
        assert!(log.contains(&"git config branch.feature/foo.description Adds foo".to_string()));
        let out = ctx.console().stdout_text();
        assert!(out.contains("A new branch 'feature/foo' was created, based on 'master'"));
        assert!(out.contains("git drip feature finish foo"));
    }

    #[test]
    fn start_refuses_existing_branch() {
        let script = ScriptedRunner::default();
        script.reply(HEADS, "master\nfeature/foo\n");
        let ctx = context(&script, Path::new("/repo"));
        let opts = StartOptions {
            name: "foo".into(),
            ..StartOptions::default()
        };
        assert!(matches!(
            start(&ctx, BranchKind::Feature, &opts),
            Err(DripError::BranchExists(ref b)) if b == "feature/foo"
        ));
    }

    #[test]
    fn start_requires_master_in_sync_with_remote() {
        let script = ScriptedRunner::default();
        script.reply(HEADS, "master\n");
        script.reply(
            "for-each-ref --format=%(refname:short) refs/remotes/origin",
            "origin/master\n",
        );
        script.reply("rev-parse master", "aaa\n");
        script.reply("rev-parse origin/master", "bbb\n");
        script.reply("merge-base aaa bbb", "aaa\n");
        let ctx = context(&script, Path::new("/repo"));
        let opts = StartOptions {
            name: "foo".into(),
            ..StartOptions::default()
        };
        assert!(matches!(
            start(&ctx, BranchKind::Feature, &opts),
            Err(DripError::BranchBehind { .. })
        ));
        assert!(!script.log().iter().any(|c| c.starts_with("git checkout")));
    }
}
