//! Workflow configuration keys and the optional `.gitdrip.toml` defaults file.

use std::path::Path;

use serde::Deserialize;

use crate::error::{DripError, Result};
use crate::system::FsOps;

pub const MASTER_KEY: &str = "gitdrip.branch.master";
pub const FEATURE_KEY: &str = "gitdrip.prefix.feature";
pub const RELEASE_KEY: &str = "gitdrip.prefix.release";
pub const HOTFIX_KEY: &str = "gitdrip.prefix.hotfix";
pub const VERSION_TAG_KEY: &str = "gitdrip.prefix.versiontag";
pub const ORIGIN_KEY: &str = "gitdrip.origin";

pub const DEFAULT_MASTER: &str = "master";
pub const DEFAULT_REMOTE: &str = "origin";

/// Keys that must exist for the workflow to count as initialized.
pub const PREFIX_KEYS: [&str; 4] = [FEATURE_KEY, RELEASE_KEY, HOTFIX_KEY, VERSION_TAG_KEY];

#[must_use]
pub fn description_key(prefixed_name: &str) -> String {
    format!("branch.{prefixed_name}.description")
}

/// Category of supporting branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BranchKind {
    Feature,
    Release,
    Hotfix,
}

impl BranchKind {
    pub const ALL: [Self; 3] = [Self::Feature, Self::Release, Self::Hotfix];

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Feature => "feature",
            Self::Release => "release",
            Self::Hotfix => "hotfix",
        }
    }

    #[must_use]
    pub const fn config_key(self) -> &'static str {
        match self {
            Self::Feature => FEATURE_KEY,
            Self::Release => RELEASE_KEY,
            Self::Hotfix => HOTFIX_KEY,
        }
    }

    #[must_use]
    pub const fn default_prefix(self) -> &'static str {
        match self {
            Self::Feature => "feature/",
            Self::Release => "release/",
            Self::Hotfix => "hotfix/",
        }
    }

    /// Label with a leading capital, for summaries.
    #[must_use]
    pub fn title(self) -> String {
        let label = self.label();
        let mut chars = label.chars();
        chars.next().map_or_else(String::new, |c| {
            c.to_uppercase().chain(chars).collect()
        })
    }
}

/// Defaults read from a `.gitdrip.toml` file. Command-line flags win.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileSettings {
    pub verbose: Option<u8>,
    #[serde(rename = "no-run")]
    pub no_run: Option<bool>,
    pub descriptions: Option<bool>,
    pub finish: FinishDefaults,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FinishDefaults {
    pub remote: Option<bool>,
    pub keep: Option<bool>,
    pub squash: Option<bool>,
    pub rebase: Option<bool>,
}

const SETTINGS_FILE: &str = ".gitdrip.toml";

/// Load the settings file: `explicit` if given (it must exist), otherwise the
/// first of `<cwd>/.gitdrip.toml` and `~/.gitdrip.toml` that exists.
///
/// # Errors
/// Returns an error when the chosen file cannot be read or parsed.
pub fn load_settings(fs: &dyn FsOps, explicit: Option<&Path>, cwd: &Path) -> Result<FileSettings> {
    let path = match explicit {
        Some(path) => Some(fs.expand_tilde(path)),
        None => [
            cwd.join(SETTINGS_FILE),
            fs.expand_tilde(&Path::new("~").join(SETTINGS_FILE)),
        ]
        .into_iter()
        .find(|p| fs.exists(p)),
    };
    let Some(path) = path else {
        return Ok(FileSettings::default());
    };
    parse_settings(fs, &path)
}

fn parse_settings(fs: &dyn FsOps, path: &Path) -> Result<FileSettings> {
    let text = fs
        .read_to_string(path)
        .map_err(|source| DripError::SettingsRead {
            path: path.to_path_buf(),
            source,
        })?;
    toml::from_str(&text).map_err(|source| DripError::SettingsParse {
        path: path.to_path_buf(),
        source,
    })
}
