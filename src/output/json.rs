use crate::error::Result;
use crate::types::BranchEntry;

/// Branch listing as a pretty-printed JSON array.
///
/// # Errors
/// Returns an error if serialization fails.
pub fn to_json(entries: &[BranchEntry]) -> Result<String> {
    Ok(serde_json::to_string_pretty(entries)?)
}
