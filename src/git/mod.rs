mod branch;
mod compare;
mod config;
pub mod log;
pub mod refs;
pub(crate) mod runner;

pub use branch::{Branch, HEAD, Upstream};
pub use compare::{compare, require_equal};
pub use config::GitConfig;
pub use runner::{DefaultGitRunner, Git, GitRunner};
