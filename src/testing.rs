//! Scripted git used by unit tests: records every command line and replays
//! canned replies instead of spawning processes.

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::path::Path;
use std::process::{ExitStatus, Output};
use std::rc::Rc;

use crate::git::GitRunner;
use crate::git::runner::command_string;

#[derive(Debug, Clone)]
struct Reply {
    code: i32,
    stdout: String,
    stderr: String,
}

#[derive(Debug, Default)]
struct Script {
    replies: HashMap<String, VecDeque<Reply>>,
    log: Vec<String>,
}

/// Cloning shares the script, so a test keeps a handle after boxing one copy
/// into a `Git`.
#[derive(Debug, Clone, Default)]
pub(crate) struct ScriptedRunner {
    inner: Rc<RefCell<Script>>,
}

impl ScriptedRunner {
    /// Queue a successful reply for the command line `args` (without `git`).
    /// The last queued reply for a command repeats forever.
    pub(crate) fn reply(&self, args: &str, stdout: &str) -> &Self {
        self.push(args, 0, stdout, "")
    }

    pub(crate) fn fail(&self, args: &str, stderr: &str) -> &Self {
        self.push(args, 1, "", stderr)
    }

    fn push(&self, args: &str, code: i32, stdout: &str, stderr: &str) -> &Self {
        self.inner
            .borrow_mut()
            .replies
            .entry(format!("git {args}"))
            .or_default()
            .push_back(Reply {
                code,
                stdout: stdout.to_string(),
                stderr: stderr.to_string(),
            });
        self
    }

    pub(crate) fn log(&self) -> Vec<String> {
        self.inner.borrow().log.clone()
    }

    fn next_reply(&self, args: &[&str]) -> Reply {
        let command = command_string(args);
        let mut script = self.inner.borrow_mut();
        script.log.push(command.clone());
        match script.replies.get_mut(&command) {
            Some(queue) if queue.len() > 1 => queue.pop_front().unwrap_or_else(success),
            Some(queue) => queue.front().cloned().unwrap_or_else(success),
            None => success(),
        }
    }
}

fn success() -> Reply {
    Reply {
        code: 0,
        stdout: String::new(),
        stderr: String::new(),
    }
}

#[cfg(unix)]
fn exit_status(code: i32) -> ExitStatus {
    use std::os::unix::process::ExitStatusExt;
    ExitStatus::from_raw(code << 8)
}

#[cfg(windows)]
fn exit_status(code: i32) -> ExitStatus {
    use std::os::windows::process::ExitStatusExt;
    ExitStatus::from_raw(code.unsigned_abs())
}

impl GitRunner for ScriptedRunner {
    fn run_git(&self, _repo: &Path, args: &[&str]) -> std::io::Result<Output> {
        let reply = self.next_reply(args);
        Ok(Output {
            status: exit_status(reply.code),
            stdout: reply.stdout.into_bytes(),
            stderr: reply.stderr.into_bytes(),
        })
    }

    fn run_git_attached(&self, _repo: &Path, args: &[&str]) -> std::io::Result<ExitStatus> {
        Ok(exit_status(self.next_reply(args).code))
    }
}
