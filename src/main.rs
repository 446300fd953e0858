#![forbid(unsafe_code)]
#![deny(warnings, clippy::all, clippy::pedantic)]

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{ArgAction, Args, Parser, Subcommand};
use git_drip::workflow::{self, FinishOptions, InitOptions, ListOptions, StartOptions};
use git_drip::{
    BranchKind, Console, Context, DefaultFsOps, DefaultGitRunner, DialoguerPrompter, FileSettings,
    Git, RunOptions, load_settings,
};
use tracing::debug;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

const LOG_ENV: &str = "GIT_DRIP_LOG";

#[derive(Parser, Debug)]
#[command(name = "git-drip", version, about = "Feature, release and hotfix branches on top of git.")]
struct Cli {
    /// Echo mutating git commands; repeat to echo queries too
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Print the git commands that would change the repository without running them
    #[arg(short = 'n', long = "no-run", global = true)]
    no_run: bool,

    /// Settings file (default: ./.gitdrip.toml, then ~/.gitdrip.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Configure the repository for git-drip
    Init {
        /// Reconfigure even if already initialized
        #[arg(short, long)]
        force: bool,
        /// Accept every default without prompting
        #[arg(short, long)]
        defaults: bool,
    },
    /// Manage feature branches
    Feature(CategoryArgs),
    /// Manage release branches
    Release(CategoryArgs),
    /// Manage hotfix branches
    Hotfix(CategoryArgs),
}

#[derive(Args, Debug)]
struct CategoryArgs {
    #[command(subcommand)]
    action: Option<Action>,
}

#[derive(Subcommand, Debug)]
enum Action {
    /// List existing branches
    List {
        /// Show branch descriptions
        #[arg(long)]
        descriptions: bool,
        /// Emit a JSON array instead of text
        #[arg(long)]
        json: bool,
    },
    /// Create a branch and check it out
    Start {
        name: String,
        /// Start point (default: the master branch)
        base: Option<String>,
        /// Fetch the master branch from the remote first
        #[arg(short = 'F', long)]
        fetch: bool,
        /// Branch description
        #[arg(short = 'm', long = "message")]
        description: Option<String>,
        /// Edit the branch description in an editor
        #[arg(short = 'd', long = "describe")]
        describe: bool,
    },
    /// Set or edit a branch description
    Describe {
        name: Option<String>,
        /// Description text; opens an editor when omitted
        #[arg(short = 'm', long = "message")]
        description: Option<String>,
    },
    /// Merge a branch into the master branch and remove it
    Finish {
        name: Option<String>,
        /// Fetch first and delete the remote branch afterwards
        #[arg(short, long)]
        remote: bool,
        /// Keep the branch after merging
        #[arg(short, long)]
        keep: bool,
        /// Squash all commits into one
        #[arg(short, long)]
        squash: bool,
        /// Rebase onto the master branch before merging
        #[arg(short = 'R', long)]
        rebase: bool,
    },
    /// Delete a branch
    Delete {
        name: String,
        /// Delete the remote branch too
        #[arg(short, long)]
        remote: bool,
    },
    /// Check out a branch
    #[command(visible_alias = "co")]
    Checkout { name: String },
    /// Show changes since the branch left the master branch
    Diff { name: Option<String> },
    /// Rebase a branch onto the master branch
    Rebase {
        name: Option<String>,
        /// Interactive rebase
        #[arg(short, long)]
        interactive: bool,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .try_init()
        .ok();
}

fn run_category(
    ctx: &Context,
    kind: BranchKind,
    action: Option<Action>,
    settings: &FileSettings,
) -> git_drip::Result<()> {
    let descriptions_default = settings.descriptions.unwrap_or(false);
    let action = action.unwrap_or(Action::List {
        descriptions: descriptions_default,
        json: false,
    });
    match action {
        Action::List { descriptions, json } => workflow::list(
            ctx,
            kind,
            ListOptions {
                descriptions: descriptions || descriptions_default,
                json,
            },
        ),
        Action::Start {
            name,
            base,
            fetch,
            description,
            describe,
        } => workflow::start(
            ctx,
            kind,
            &StartOptions {
                name,
                base,
                fetch,
                description,
                edit_description: describe,
            },
        ),
        Action::Describe { name, description } => {
            workflow::describe(ctx, kind, name.as_deref(), description.as_deref())
        }
        Action::Finish {
            name,
            remote,
            keep,
            squash,
            rebase,
        } => {
            let defaults = &settings.finish;
            let opts = FinishOptions {
                remote: remote || defaults.remote.unwrap_or(false),
                keep: keep || defaults.keep.unwrap_or(false),
                squash: squash || defaults.squash.unwrap_or(false),
                rebase: rebase || defaults.rebase.unwrap_or(false),
            };
            workflow::finish(ctx, kind, name.as_deref(), opts)
        }
        Action::Delete { name, remote } => workflow::delete(ctx, kind, &name, remote),
        Action::Checkout { name } => workflow::checkout(ctx, kind, &name),
        Action::Diff { name } => workflow::diff(ctx, kind, name.as_deref()),
        Action::Rebase { name, interactive } => {
            workflow::rebase(ctx, kind, name.as_deref(), interactive)
        }
    }
}

fn run(cli: Cli) -> git_drip::Result<()> {
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let settings = load_settings(&DefaultFsOps, cli.config.as_deref(), &cwd)?;
    let options = RunOptions {
        verbosity: cli.verbose.max(settings.verbose.unwrap_or(0)),
        dry_run: cli.no_run || settings.no_run.unwrap_or(false),
    };
    debug!(?options, ?settings, "starting");

    let git = Git::new(Box::new(DefaultGitRunner), cwd, options, Console::Stdio);
    let ctx = Context::new(git, Box::new(DefaultFsOps), Box::new(DialoguerPrompter));

    match cli.command {
        Command::Init { force, defaults } => workflow::init(&ctx, InitOptions { force, defaults }),
        Command::Feature(args) => run_category(&ctx, BranchKind::Feature, args.action, &settings),
        Command::Release(args) => run_category(&ctx, BranchKind::Release, args.action, &settings),
        Command::Hotfix(args) => run_category(&ctx, BranchKind::Hotfix, args.action, &settings),
    }
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) if err.is_retryable() => {
            println!("{err}");
            ExitCode::FAILURE
        }
        Err(err) => {
            if let Some(output) = err.command_output().filter(|o| !o.trim().is_empty()) {
                eprintln!("{}", output.trim_end());
            }
            eprintln!("git-drip: fatal: {err}");
            ExitCode::FAILURE
        }
    }
}
