use std::fmt::Write as _;

use crate::types::BranchEntry;

/// One line per branch: current-branch marker, padded name, then the
/// optional description and status.
#[must_use]
pub fn format_listing(entries: &[BranchEntry]) -> String {
    let width = entries.iter().map(|e| e.name.len()).max().unwrap_or(0) + 3;
    let mut out = String::new();
    for entry in entries {
        out.push_str(if entry.current { "* " } else { "  " });
        let mut rest = String::new();
        if let Some(description) = &entry.description {
            rest.push_str(description);
            rest.push(' ');
        }
        if let Some(status) = &entry.status {
            rest.push_str(status);
        }
        let line = format!("{:<width$}{rest}", entry.name);
        out.push_str(line.trim_end());
        out.push('\n');
    }
    out
}

/// The "Summary of actions" block printed after every successful step.
#[must_use]
pub fn format_summary(actions: &[String]) -> String {
    let mut out = String::from("\nSummary of actions:\n");
    for action in actions {
        let _ = writeln!(out, "- {action}");
    }
    out.push('\n');
    out
}
