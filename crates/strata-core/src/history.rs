//! Append-only history ledger.
//!
//! One physical line per version, in increasing version order:
//! `"<version>: <message>"`. Embedded newlines in the message are
//! escaped as `\n` on write and restored on read, so the ledger stays
//! line-oriented while preserving multi-line messages.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::{StrataError, StrataResult};

/// One recorded version with its message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogEntry {
    pub version: u64,
    /// Full message, with any embedded newlines restored.
    pub message: String,
}

impl LogEntry {
    /// One-line display form: the version and the first line of the
    /// message. The full message stays intact in storage.
    pub fn summary(&self) -> String {
        let first_line = self.message.lines().next().unwrap_or("");
        format!("{}: {}", self.version, first_line)
    }
}

/// Handle on the ledger file. Lines are only ever appended.
pub struct HistoryLog {
    path: PathBuf,
}

impl HistoryLog {
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
        }
    }

    /// Append one entry. Never rewrites or removes prior lines.
    pub fn record(&self, version: u64, message: &str) -> StrataResult<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{}: {}", version, escape(message))?;
        Ok(())
    }

    /// Look up the full message recorded for a version.
    ///
    /// The version token is the run of digits before the first colon,
    /// compared as a parsed number — never as a string prefix — so a
    /// lookup for version 1 cannot match a stored `10:` line.
    pub fn entry_for(&self, version: u64) -> StrataResult<LogEntry> {
        for entry in self.entries()? {
            if entry.version == version {
                return Ok(entry);
            }
        }
        Err(StrataError::InvalidVersion(version.to_string()))
    }

    /// The last `limit` entries, most recent first.
    ///
    /// `None` (or a limit of 0 mapped to `None` by the caller) returns
    /// all entries. A missing or empty ledger yields an empty result
    /// rather than an error.
    pub fn recent(&self, limit: Option<usize>) -> StrataResult<Vec<LogEntry>> {
        let mut entries = self.entries()?;
        entries.reverse();
        if let Some(n) = limit {
            entries.truncate(n);
        }
        Ok(entries)
    }

    /// All entries in stored (increasing-version) order.
    fn entries(&self) -> StrataResult<Vec<LogEntry>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let data = fs::read_to_string(&self.path)?;
        Ok(data.lines().filter_map(parse_line).collect())
    }
}

/// Parse one ledger line into an entry. Malformed lines are skipped.
fn parse_line(line: &str) -> Option<LogEntry> {
    let (token, rest) = line.split_once(':')?;
    if token.is_empty() || !token.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let version = token.parse().ok()?;
    let message = unescape(rest.strip_prefix(' ').unwrap_or(rest));
    Some(LogEntry { version, message })
}

fn escape(message: &str) -> String {
    message.replace('\n', "\\n")
}

fn unescape(stored: &str) -> String {
    stored.replace("\\n", "\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn log_in(dir: &Path) -> HistoryLog {
        HistoryLog::new(&dir.join("history.log"))
    }

    #[test]
    fn test_record_and_lookup() {
        let dir = tempdir().unwrap();
        let log = log_in(dir.path());

        log.record(0, "initialized").unwrap();
        log.record(1, "added foo").unwrap();

        assert_eq!(log.entry_for(1).unwrap().message, "added foo");
        assert_eq!(log.entry_for(0).unwrap().message, "initialized");
    }

    #[test]
    fn test_lookup_missing_version() {
        let dir = tempdir().unwrap();
        let log = log_in(dir.path());
        log.record(0, "initialized").unwrap();

        let result = log.entry_for(7);
        assert!(matches!(result, Err(StrataError::InvalidVersion(_))));
    }

    #[test]
    fn test_multiline_message_round_trip() {
        let dir = tempdir().unwrap();
        let log = log_in(dir.path());

        log.record(1, "first line\nsecond line").unwrap();

        // Stored on a single physical line.
        let raw = fs::read_to_string(dir.path().join("history.log")).unwrap();
        assert_eq!(raw.lines().count(), 1);
        assert!(raw.contains("first line\\nsecond line"));

        let entry = log.entry_for(1).unwrap();
        assert_eq!(entry.message, "first line\nsecond line");
        assert_eq!(entry.summary(), "1: first line");
    }

    #[test]
    fn test_version_one_does_not_match_ten() {
        let dir = tempdir().unwrap();
        let log = log_in(dir.path());

        for v in 0..=10 {
            log.record(v, &format!("version {v}")).unwrap();
        }

        assert_eq!(log.entry_for(1).unwrap().message, "version 1");
        assert_eq!(log.entry_for(10).unwrap().message, "version 10");
    }

    #[test]
    fn test_recent_ordering_and_limit() {
        let dir = tempdir().unwrap();
        let log = log_in(dir.path());

        for v in 0..5 {
            log.record(v, &format!("v{v}")).unwrap();
        }

        let last_two = log.recent(Some(2)).unwrap();
        assert_eq!(last_two.len(), 2);
        assert_eq!(last_two[0].version, 4);
        assert_eq!(last_two[1].version, 3);

        let all = log.recent(None).unwrap();
        assert_eq!(all.len(), 5);
        let versions: Vec<_> = all.iter().map(|e| e.version).collect();
        assert_eq!(versions, vec![4, 3, 2, 1, 0]);
    }

    #[test]
    fn test_recent_missing_ledger_is_empty() {
        let dir = tempdir().unwrap();
        let log = log_in(dir.path());
        assert!(log.recent(None).unwrap().is_empty());
        assert!(log.recent(Some(3)).unwrap().is_empty());
    }

    #[test]
    fn test_malformed_lines_are_skipped() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("history.log");
        fs::write(&path, "0: ok\nnot a version line\n1: also ok\n").unwrap();

        let log = HistoryLog::new(&path);
        let all = log.recent(None).unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].version, 1);
    }
}
