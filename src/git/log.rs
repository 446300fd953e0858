//! Parsing of the NUL-delimited `git log` records used to find pending commits.

/// Hash, short hash, parents, body, subject; each field ends in NUL.
pub const PENDING_LOG_FORMAT: &str = "--format=format:%H%x00%h%x00%P%x00%B%x00%s%x00";

const FIELDS_PER_RECORD: usize = 5;
const CHANGE_ID_PREFIX: &str = "Change-Id: ";

/// One record of pending-log output before any repository lookups.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    pub hash: String,
    pub short_hash: String,
    pub parent: String,
    pub merge: Option<String>,
    pub message: String,
    pub subject: String,
}

/// Split log output into records, preserving git's order
/// (children before parents with `--topo-order`).
#[must_use]
pub fn parse_log_records(output: &str) -> Vec<LogRecord> {
    let fields: Vec<&str> = output
        .trim()
        .split('\0')
        .map(|f| f.trim_start_matches(['\r', '\n']))
        .collect();
    if fields.len() < FIELDS_PER_RECORD {
        return Vec::new();
    }
    fields
        .chunks_exact(FIELDS_PER_RECORD)
        .map(|chunk| {
            // %P can start with a newline left over from the previous record.
            let parents = chunk[2].trim();
            let (parent, merge) = match parents.split_once(' ') {
                Some((first, second)) => (first.to_string(), Some(second.to_string())),
                None => (parents.to_string(), None),
            };
            LogRecord {
                hash: chunk[0].to_string(),
                short_hash: chunk[1].to_string(),
                parent,
                merge,
                message: chunk[3].to_string(),
                subject: chunk[4].to_string(),
            }
        })
        .collect()
}

/// The value of the last `Change-Id:` line; a message may quote another
/// commit's message, so later lines win.
#[must_use]
pub fn change_id(message: &str) -> Option<String> {
    message
        .lines()
        .filter_map(|line| line.strip_prefix(CHANGE_ID_PREFIX))
        .last()
        .map(str::to_string)
}
