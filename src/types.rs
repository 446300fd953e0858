use serde::Serialize;

/// How mutating and read-only git invocations are gated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunOptions {
    /// 0 = silent, 1 = echo mutating commands, 2+ = also echo queries.
    pub verbosity: u8,
    /// Echo mutating commands but do not run them.
    pub dry_run: bool,
}

/// One commit that is on a branch but not yet on its upstream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Commit {
    pub hash: String,
    pub short_hash: String,
    /// First parent.
    pub parent: String,
    /// Second parent, only for merge commits.
    pub merge: Option<String>,
    pub message: String,
    pub subject: String,
    /// Last `Change-Id:` trailer in the message.
    pub change_id: Option<String>,
}

/// Facts derived from comparing a branch with its upstream.
///
/// Computed once by `Branch::load_pending` and passed around by value; it is
/// not refreshed if the repository changes afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PendingInfo {
    pub origin_branch: String,
    pub commits_ahead: usize,
    pub commits_behind: usize,
    /// Latest commit shared with the upstream.
    pub branchpoint: String,
    /// Newest first (children before parents).
    pub pending: Vec<Commit>,
}

impl PendingInfo {
    #[must_use]
    pub const fn has_pending_commit(&self) -> bool {
        self.commits_ahead > 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareStatus {
    Equal,
    /// Local can be fast-forwarded to remote.
    Behind,
    /// Local has commits remote lacks.
    Ahead,
    NeedMerge,
    NoCommonAncestor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TreeStatus {
    Clean,
    Unstaged,
    Uncommitted,
}

/// A row of `<kind> list` output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BranchEntry {
    pub name: String,
    pub branch: String,
    pub current: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}
