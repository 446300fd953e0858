use tracing::info;

use crate::error::{DripError, Result};
use crate::git::refs;
use crate::settings::{BranchKind, DEFAULT_MASTER, MASTER_KEY, PREFIX_KEYS, VERSION_TAG_KEY};

use super::{Context, require_clean_tree};

#[derive(Debug, Clone, Copy, Default)]
pub struct InitOptions {
    /// Reconfigure even when already initialized.
    pub force: bool,
    /// Take every suggested answer without prompting.
    pub defaults: bool,
}

/// Set up the repository for the workflow: master branch, prefixes and, for a
/// repository without commits, an initial empty commit on the master branch.
///
/// # Errors
/// [`DripError::AlreadyInitialized`] without `force`, a dirty tree, a missing
/// master branch in an existing repository, or any failing git call.
pub fn init(ctx: &Context, opts: InitOptions) -> Result<()> {
    require_clean_repo(ctx)?;

    if ctx.is_initialized()? && !opts.force {
        return Err(DripError::AlreadyInitialized);
    }

    if opts.defaults {
        ctx.console().outln("Using default branch names.");
    }

    let master = configure_master(ctx, opts)?;
    enforce_head(ctx, &master)?;
    configure_prefixes(ctx, opts)?;

    info!(%master, "initialized");
    ctx.console().outln("\ngit drip has been initialized");
    Ok(())
}

fn require_clean_repo(ctx: &Context) -> Result<()> {
    if refs::git_dir(ctx.git()).is_none() {
        ctx.git().run(&["init"])?;
        ctx.reset_config();
    }
    if !refs::is_headless(ctx.git())? {
        require_clean_tree(ctx)?;
    }
    Ok(())
}

fn ask(ctx: &Context, opts: InitOptions, question: &str, suggestion: &str) -> Result<String> {
    if opts.defaults {
        ctx.console().outln(&format!("{question} [{suggestion}]"));
        return Ok(suggestion.to_string());
    }
    let answer = ctx.prompter().ask(question, suggestion)?;
    let answer = answer.trim();
    Ok(if answer.is_empty() {
        suggestion.to_string()
    } else {
        answer.to_string()
    })
}

fn configure_master(ctx: &Context, opts: InitOptions) -> Result<String> {
    if ctx.is_master_configured()? && !opts.force {
        return ctx.master();
    }

    let branches = ctx.local_branches()?;
    let configured = ctx.master()?;
    let existing_repo = !branches.is_empty();
    let suggestion = if existing_repo {
        ctx.console()
            .outln("\nWhich branch should be used for development?");
        for branch in &branches {
            ctx.console().outln(&format!("   - {}", branch.prefixed_name()));
        }
        if configured.is_empty() || !refs::contains(&branches, &configured) {
            DEFAULT_MASTER.to_string()
        } else {
            configured
        }
    } else {
        ctx.console()
            .outln("No branches exist yet. Base branches must be created now.");
        if configured.is_empty() {
            DEFAULT_MASTER.to_string()
        } else {
            configured
        }
    };

    let master = ask(ctx, opts, "Branch name for development", &suggestion)?;
    if existing_repo && !refs::contains(&ctx.local_branches()?, &master) {
        return Err(DripError::MasterMissing(master));
    }
    ctx.config_set(MASTER_KEY, &master)?;
    Ok(master)
}

fn enforce_head(ctx: &Context, master: &str) -> Result<()> {
    if !refs::is_headless(ctx.git())? {
        return Ok(());
    }
    let head = format!("refs/heads/{master}");
    ctx.git().run(&["symbolic-ref", "HEAD", &head])?;
    ctx.git()
        .run(&["commit", "--allow-empty", "--quiet", "-m", "Initial commit"])?;
    ctx.git().run(&["checkout", "-q", master])
}

fn configure_prefixes(ctx: &Context, opts: InitOptions) -> Result<()> {
    let mut all_present = true;
    for key in PREFIX_KEYS {
        all_present &= ctx.config_has(key)?;
    }
    if all_present && !opts.force {
        return Ok(());
    }

    ctx.console()
        .outln("\nHow to name supporting branch prefixes?");
    let questions = [
        (
            BranchKind::Feature.config_key(),
            BranchKind::Feature.default_prefix(),
            "Feature branches?",
        ),
        (
            BranchKind::Release.config_key(),
            BranchKind::Release.default_prefix(),
            "Release branches?",
        ),
        (
            BranchKind::Hotfix.config_key(),
            BranchKind::Hotfix.default_prefix(),
            "Hotfix branches?",
        ),
        (VERSION_TAG_KEY, "", "Version tag prefix?"),
    ];
    for (key, default, question) in questions {
        let current = ctx.config_get(key)?;
        let suggestion = if current.is_empty() {
            default
        } else {
            current.as_str()
        };
        let prefix = ask(ctx, opts, question, suggestion)?;
        ctx.config_set(key, &prefix)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::Git;
    use crate::output::Console;
    use crate::system::DefaultFsOps;
    use crate::testing::ScriptedRunner;
    use crate::types::RunOptions;
    use crate::workflow::test_support::{DefaultAnswers, context};
    use std::path::Path;

    #[test]
    fn fresh_repository_gets_initial_commit_and_keys() {
        let script = ScriptedRunner::default();
        script.fail("rev-parse --git-dir", "fatal: not a git repository");
        script.fail("rev-parse --quiet --verify HEAD", "");
        script.reply("config --list", "");
        let git = Git::new(
            Box::new(script.clone()),
            "/repo",
            RunOptions::default(),
            Console::captured(),
        );
        let ctx = Context::new(git, Box::new(DefaultFsOps), Box::new(DefaultAnswers));

        init(
            &ctx,
            InitOptions {
                force: false,
                defaults: true,
            },
        )
        .unwrap();

        let mutations: Vec<String> = script
            .log()
            .into_iter()
            .filter(|c| {
                c.starts_with("git init")
                    || c.starts_with("git symbolic-ref")
                    || c.starts_with("git commit")
                    || c.starts_with("git checkout")
                    || (c.starts_with("git config ") && c != "git config --list")
            })
            .collect();
        assert_eq!(
            mutations,
            vec![
                "git init",
                "git config gitdrip.branch.master master",
                "git symbolic-ref HEAD refs/heads/master",
                "git commit --allow-empty --quiet -m Initial commit",
                "git checkout -q master",
                "git config gitdrip.prefix.feature feature/",
                "git config gitdrip.prefix.release release/",
                "git config gitdrip.prefix.hotfix hotfix/",
                "git config gitdrip.prefix.versiontag ",
            ]
        );
        let out = ctx.console().stdout_text();
        assert!(out.contains("No branches exist yet."));
        assert!(out.ends_with("git drip has been initialized\n"));
    }

    #[test]
    fn second_init_without_force_is_refused() {
        let script = ScriptedRunner::default();
        script.reply("rev-parse --git-dir", ".git\n");
        script.reply(
            "for-each-ref --format=%(refname:short) refs/heads",
            "master\n",
        );
        let ctx = context(&script, Path::new("/repo"));
        let err = init(&ctx, InitOptions::default()).unwrap_err();
        assert!(matches!(err, DripError::AlreadyInitialized));
        assert!(err.to_string().contains("Already initialized"));
    }

    #[test]
    fn existing_repo_needs_existing_master() {
        let script = ScriptedRunner::default();
        script.reply("rev-parse --git-dir", ".git\n");
        script.reply("config --list", "");
        script.reply(
            "for-each-ref --format=%(refname:short) refs/heads",
            "main\n",
        );
        let git = Git::new(
            Box::new(script.clone()),
            "/repo",
            RunOptions::default(),
            Console::captured(),
        );
        let ctx = Context::new(git, Box::new(DefaultFsOps), Box::new(DefaultAnswers));
        let err = init(
            &ctx,
            InitOptions {
                force: false,
                defaults: true,
            },
        )
        .unwrap_err();
        assert!(matches!(err, DripError::MasterMissing(ref name) if name == "master"));
    }
}
