use tracing::debug;

use crate::error::{DripError, Result};
use crate::types::{Commit, PendingInfo};

use super::log::{PENDING_LOG_FORMAT, change_id, parse_log_records};
use super::refs::{branches_containing, rev_parse};
use super::Git;

/// Name git reports for a detached checkout.
pub const HEAD: &str = "HEAD";

/// Where a branch without upstream configuration is assumed to track.
#[derive(Debug, Clone, Copy)]
pub struct Upstream<'a> {
    pub remote: &'a str,
    pub master: &'a str,
}

/// A local branch, split into its workflow prefix and short name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Branch {
    pub name: String,
    pub prefix: String,
}

impl Branch {
    #[must_use]
    pub fn new(prefix: &str, name: &str) -> Self {
        Self {
            name: name.to_string(),
            prefix: prefix.to_string(),
        }
    }

    #[must_use]
    pub fn detached() -> Self {
        Self::new("", HEAD)
    }

    /// Split `full` on the first configured prefix it starts with.
    #[must_use]
    pub fn split(full: &str, prefixes: &[String]) -> Self {
        if full == HEAD {
            return Self::detached();
        }
        prefixes
            .iter()
            .filter(|p| !p.is_empty())
            .find_map(|p| full.strip_prefix(p.as_str()).map(|name| Self::new(p, name)))
            .unwrap_or_else(|| Self::new("", full))
    }

    #[must_use]
    pub fn is_detached(&self) -> bool {
        self.name == HEAD
    }

    /// Name as git knows it locally, e.g. `feature/foo`.
    #[must_use]
    pub fn prefixed_name(&self) -> String {
        if self.is_detached() {
            return self.name.clone();
        }
        format!("{}{}", self.prefix, self.name)
    }

    /// Fully qualified ref, e.g. `refs/heads/feature/foo`.
    #[must_use]
    pub fn full_name(&self) -> String {
        if self.is_detached() {
            return self.name.clone();
        }
        format!("refs/heads/{}", self.prefixed_name())
    }

    /// Upstream tracking ref such as `origin/master`.
    ///
    /// Branches created before upstream tracking was configured fall back to
    /// the remote's master branch.
    ///
    /// # Errors
    /// Returns an error for any failure other than a missing upstream.
    pub fn origin_branch(&self, git: &Git, upstream: Upstream<'_>) -> Result<String> {
        if self.is_detached() {
            // Clearly bogus, but easy to spot if it leaks into a command.
            return Ok(format!("{}/{HEAD}", upstream.remote));
        }
        let spec = format!("{}@{{u}}", self.prefixed_name());
        match git.capture_trimmed(&["rev-parse", "--abbrev-ref", &spec]) {
            Ok(name) if !name.is_empty() => Ok(name),
            Ok(_) => Ok(default_upstream(upstream)),
            Err(err)
                if err
                    .command_output()
                    .is_some_and(|o| o.to_lowercase().contains("upstream configured")) =>
            {
                Ok(default_upstream(upstream))
            }
            Err(err) => Err(err),
        }
    }

    /// True when the branch does not track its same-named remote branch.
    ///
    /// # Errors
    /// Propagates [`Branch::origin_branch`] failures.
    pub fn is_local_only(&self, git: &Git, upstream: Upstream<'_>) -> Result<bool> {
        let expected = format!("{}/{}", upstream.remote, self.prefixed_name());
        Ok(expected != self.origin_branch(git, upstream)?)
    }

    /// True when `base` is among the branches containing this branch's tip.
    ///
    /// # Errors
    /// Returns an error when git cannot list the branches.
    pub fn is_merged_into(&self, git: &Git, base: &str) -> Result<bool> {
        Ok(branches_containing(git, &self.full_name())?
            .iter()
            .any(|b| b == base))
    }

    /// Compare the branch with its upstream: pending commits, ahead/behind
    /// counts and the branch point.
    ///
    /// # Errors
    /// Returns an error when any of the underlying git queries fail.
    pub fn load_pending(&self, git: &Git, upstream: Upstream<'_>) -> Result<PendingInfo> {
        let mut info = PendingInfo {
            branchpoint: rev_parse(git, HEAD)?,
            ..PendingInfo::default()
        };
        if self.is_detached() {
            info.origin_branch = self.origin_branch(git, upstream)?;
            return Ok(info);
        }

        let origin = self.origin_branch(git, upstream)?;
        let full = self.full_name();
        let range = format!("{origin}..{full}");
        let out = git.capture(&["log", "--topo-order", PENDING_LOG_FORMAT, &range, "--"])?;

        // Records arrive children first, so the first merge whose parent sits
        // on the upstream pins the branch point; otherwise it is the parent of
        // the oldest pending commit.
        let mut found_merge_branchpoint = false;
        for record in parse_log_records(&out) {
            if let Some(merge) = &record.merge {
                if is_on(git, &record.parent, &origin)? {
                    found_merge_branchpoint = true;
                    info.branchpoint.clone_from(&record.parent);
                }
                if is_on(git, merge, &origin)? {
                    found_merge_branchpoint = true;
                    info.branchpoint.clone_from(merge);
                }
            }
            if !found_merge_branchpoint {
                info.branchpoint.clone_from(&record.parent);
            }
            info.pending.push(Commit {
                change_id: change_id(&record.message),
                hash: record.hash,
                short_hash: record.short_hash,
                parent: record.parent,
                merge: record.merge,
                message: record.message,
                subject: record.subject,
            });
        }
        info.commits_ahead = info.pending.len();

        let behind_range = format!("{full}..{origin}");
        info.commits_behind = git
            .capture(&["log", "--format=format:x", &behind_range, "--"])?
            .lines()
            .filter(|l| !l.trim().is_empty())
            .count();
        info.origin_branch = origin;
        debug!(
            branch = %self.prefixed_name(),
            ahead = info.commits_ahead,
            behind = info.commits_behind,
            branchpoint = %info.branchpoint,
            "loaded pending commits"
        );
        Ok(info)
    }
}

fn default_upstream(upstream: Upstream<'_>) -> String {
    format!("{}/{}", upstream.remote, upstream.master)
}

fn is_on(git: &Git, commit: &str, origin: &str) -> Result<bool, DripError> {
    Ok(branches_containing(git, commit)?.iter().any(|b| b == origin))
}
