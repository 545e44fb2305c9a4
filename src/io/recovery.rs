//! Append-only recovery log.
//!
//! Anything tasky could not save normally (a failed state write, an unreadable
//! state file, deleted tasks and lists) is appended here as a markdown entry so
//! it can be recovered by hand.

use std::fmt;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, Utc};
use tempfile::NamedTempFile;

/// Size above which old entries are pruned before appending (1 MB).
const MAX_LOG_SIZE: u64 = 1_048_576;

/// Entries older than this many days are prunable.
pub const PRUNE_AGE_DAYS: i64 = 30;

const FILE_HEADER: &str = "\
<!-- tasky recovery log: data that could not be saved normally.
     View with: tasky recovery
     Prune old entries: tasky recovery prune -->

";

const ENTRY_END: &str = "---";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryCategory {
    /// The state file could not be decoded
    Parser,
    /// The state file could not be written
    Write,
    /// A task or list was deleted
    Delete,
}

impl fmt::Display for RecoveryCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RecoveryCategory::Parser => "parser",
            RecoveryCategory::Write => "write",
            RecoveryCategory::Delete => "delete",
        };
        f.write_str(s)
    }
}

impl FromStr for RecoveryCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "parser" => Ok(RecoveryCategory::Parser),
            "write" => Ok(RecoveryCategory::Write),
            "delete" => Ok(RecoveryCategory::Delete),
            other => Err(format!("unknown recovery category: {}", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecoveryEntry {
    pub timestamp: DateTime<Utc>,
    pub category: RecoveryCategory,
    pub description: String,
    pub fields: Vec<(String, String)>,
    /// Raw payload (usually JSON) kept verbatim
    pub body: String,
}

impl RecoveryEntry {
    pub fn new(category: RecoveryCategory, description: impl Into<String>) -> Self {
        RecoveryEntry {
            timestamp: Utc::now(),
            category,
            description: description.into(),
            fields: Vec::new(),
            body: String::new(),
        }
    }

    pub fn field(mut self, key: &str, value: impl Into<String>) -> Self {
        self.fields.push((key.to_string(), value.into()));
        self
    }

    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    fn to_markdown(&self) -> String {
        let mut out = format!(
            "## {} {}: {}\n\n",
            self.timestamp.to_rfc3339_opts(SecondsFormat::Secs, true),
            self.category,
            self.description,
        );
        for (key, value) in &self.fields {
            out.push_str(&format!("{}: {}\n", key, value));
        }
        if !self.body.is_empty() {
            let fence = body_fence(&self.body);
            out.push_str(&format!("\n{}text\n", fence));
            out.push_str(&self.body);
            if !self.body.ends_with('\n') {
                out.push('\n');
            }
            out.push_str(&fence);
            out.push('\n');
        }
        out.push('\n');
        out.push_str(ENTRY_END);
        out.push('\n');
        out
    }

    /// JSON form for `tasky recovery --json`
    pub fn to_json(&self) -> serde_json::Value {
        let fields: serde_json::Map<String, serde_json::Value> = self
            .fields
            .iter()
            .map(|(k, v)| (k.clone(), serde_json::Value::String(v.clone())))
            .collect();
        serde_json::json!({
            "timestamp": self.timestamp.to_rfc3339_opts(SecondsFormat::Secs, true),
            "category": self.category.to_string(),
            "description": self.description,
            "fields": fields,
            "body": self.body,
        })
    }
}

/// A backtick fence longer than any backtick run in `body`, so the body can
/// never close it early.
fn body_fence(body: &str) -> String {
    let mut longest = 0;
    let mut run = 0;
    for c in body.chars() {
        if c == '`' {
            run += 1;
            longest = longest.max(run);
        } else {
            run = 0;
        }
    }
    "`".repeat((longest + 1).max(3))
}

pub fn recovery_log_path(data_dir: &Path) -> PathBuf {
    data_dir.join(".recovery.log")
}

/// Write `content` to `path` through a temp file in the same directory + rename.
pub fn atomic_write(path: &Path, content: &[u8]) -> io::Result<()> {
    let dir = path.parent().unwrap_or(Path::new("."));
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(content)?;
    tmp.flush()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Writing
// ---------------------------------------------------------------------------

/// Append an entry. Failures only produce a warning on stderr.
pub fn log_recovery(data_dir: &Path, entry: RecoveryEntry) {
    if let Err(e) = append_entry(data_dir, &entry) {
        eprintln!("warning: could not write to recovery log: {}", e);
    }
}

fn append_entry(data_dir: &Path, entry: &RecoveryEntry) -> io::Result<()> {
    let path = recovery_log_path(data_dir);
    if fs::metadata(&path).is_ok_and(|m| m.len() > MAX_LOG_SIZE) {
        let cutoff = Utc::now() - chrono::Duration::days(PRUNE_AGE_DAYS);
        prune_recovery(data_dir, cutoff)?;
    }
    fs::create_dir_all(data_dir)?;
    let is_new = fs::metadata(&path).map_or(true, |m| m.len() == 0);
    let mut file = OpenOptions::new().create(true).append(true).open(&path)?;
    if is_new {
        file.write_all(FILE_HEADER.as_bytes())?;
    }
    file.write_all(entry.to_markdown().as_bytes())
}

/// Record something the user deleted, with its JSON so it can be pasted back.
pub fn log_deletion(data_dir: &Path, kind: &str, id: &str, snapshot: &impl serde::Serialize) {
    let body = serde_json::to_string_pretty(snapshot).unwrap_or_default();
    log_recovery(
        data_dir,
        RecoveryEntry::new(RecoveryCategory::Delete, format!("{} {} deleted", kind, id))
            .field("Id", id)
            .body(body),
    );
}

// ---------------------------------------------------------------------------
// Reading
// ---------------------------------------------------------------------------

/// Entries newest first, optionally capped at `limit`.
pub fn read_recovery_entries(data_dir: &Path, limit: Option<usize>) -> Vec<RecoveryEntry> {
    let Ok(content) = fs::read_to_string(recovery_log_path(data_dir)) else {
        return Vec::new();
    };
    let mut entries = parse_entries(&content);
    entries.reverse();
    if let Some(n) = limit {
        entries.truncate(n);
    }
    entries
}

fn parse_entries(content: &str) -> Vec<RecoveryEntry> {
    let mut entries = Vec::new();
    let mut current: Option<RecoveryEntry> = None;
    // Closing fence of the body being read, if any
    let mut fence: Option<&str> = None;

    for line in content.lines() {
        if let Some(close) = fence {
            if line == close {
                fence = None;
            } else if let Some(entry) = current.as_mut() {
                if !entry.body.is_empty() {
                    entry.body.push('\n');
                }
                entry.body.push_str(line);
            }
            continue;
        }
        if let Some(header) = line.strip_prefix("## ") {
            entries.extend(current.take());
            current = parse_header(header);
        } else if line == ENTRY_END {
            entries.extend(current.take());
        } else if line.starts_with("```") {
            if current.is_some() {
                let ticks = line.len() - line.trim_start_matches('`').len();
                fence = Some(&line[..ticks]);
            }
        } else if let Some(entry) = current.as_mut()
            && let Some((key, value)) = line.split_once(": ")
        {
            entry.fields.push((key.to_string(), value.to_string()));
        }
    }
    entries.extend(current);
    entries
}

/// `<rfc3339> <category>: <description>`
fn parse_header(header: &str) -> Option<RecoveryEntry> {
    let (stamp, rest) = header.split_once(' ')?;
    let (category, description) = rest.split_once(": ")?;
    let timestamp = DateTime::parse_from_rfc3339(stamp).ok()?.with_timezone(&Utc);
    Some(RecoveryEntry {
        timestamp,
        category: category.parse().ok()?,
        description: description.to_string(),
        fields: Vec::new(),
        body: String::new(),
    })
}

// ---------------------------------------------------------------------------
// Pruning
// ---------------------------------------------------------------------------

/// Drop entries older than `cutoff`. Returns how many were removed.
pub fn prune_recovery(data_dir: &Path, cutoff: DateTime<Utc>) -> io::Result<usize> {
    let path = recovery_log_path(data_dir);
    let content = match fs::read_to_string(&path) {
        Ok(c) => c,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(0),
        Err(e) => return Err(e),
    };
    let entries = parse_entries(&content);
    let before = entries.len();
    let mut out = String::from(FILE_HEADER);
    for entry in entries.iter().filter(|e| e.timestamp >= cutoff) {
        out.push_str(&entry.to_markdown());
    }
    let kept = entries.iter().filter(|e| e.timestamp >= cutoff).count();
    atomic_write(&path, out.as_bytes())?;
    Ok(before - kept)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn entry_at(days_ago: i64, description: &str) -> RecoveryEntry {
        let mut entry = RecoveryEntry::new(RecoveryCategory::Write, description)
            .field("Target", "state.json")
            .body("{\n  \"lists\": []\n}");
        entry.timestamp = Utc::now() - chrono::Duration::days(days_ago);
        entry
    }

    #[test]
    fn markdown_shape() {
        let md = entry_at(0, "state write failed").to_markdown();
        assert!(md.starts_with("## "));
        assert!(md.contains(" write: state write failed\n"));
        assert!(md.contains("Target: state.json\n"));
        assert!(md.contains("```text\n{\n  \"lists\": []\n}\n```\n"));
        assert!(md.ends_with("---\n"));
    }

    #[test]
    fn log_then_read_round_trip() {
        let tmp = TempDir::new().unwrap();
        log_recovery(tmp.path(), entry_at(0, "first"));
        log_recovery(
            tmp.path(),
            RecoveryEntry::new(RecoveryCategory::Parser, "state file unreadable")
                .field("Error", "expected value at line 1 column 1"),
        );

        let content = fs::read_to_string(recovery_log_path(tmp.path())).unwrap();
        assert!(content.starts_with("<!-- tasky recovery log"));

        let entries = read_recovery_entries(tmp.path(), None);
        assert_eq!(entries.len(), 2);
        // Newest first
        assert_eq!(entries[0].category, RecoveryCategory::Parser);
        assert_eq!(
            entries[0].fields,
            vec![(
                "Error".to_string(),
                "expected value at line 1 column 1".to_string()
            )]
        );
        assert!(entries[0].body.is_empty());
        assert_eq!(entries[1].description, "first");
        assert_eq!(entries[1].body, "{\n  \"lists\": []\n}");
    }

    #[test]
    fn read_respects_limit_and_missing_file() {
        let tmp = TempDir::new().unwrap();
        assert!(read_recovery_entries(tmp.path(), None).is_empty());
        for i in 0..5 {
            log_recovery(tmp.path(), entry_at(0, &format!("entry {}", i)));
        }
        let entries = read_recovery_entries(tmp.path(), Some(2));
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].description, "entry 4");
    }

    #[test]
    fn log_deletion_keeps_json_snapshot() {
        let tmp = TempDir::new().unwrap();
        let task = crate::model::task::Task::new_root("t_1".into(), "Buy milk".into(), "l_1".into());
        log_deletion(tmp.path(), "task", "t_1", &task);
        let entries = read_recovery_entries(tmp.path(), None);
        assert_eq!(entries[0].category, RecoveryCategory::Delete);
        assert_eq!(entries[0].description, "task t_1 deleted");
        let back: crate::model::task::Task = serde_json::from_str(&entries[0].body).unwrap();
        assert_eq!(back, task);
    }

    #[test]
    fn prune_drops_old_entries_only() {
        let tmp = TempDir::new().unwrap();
        log_recovery(tmp.path(), entry_at(45, "old"));
        log_recovery(tmp.path(), entry_at(1, "recent"));
        let cutoff = Utc::now() - chrono::Duration::days(PRUNE_AGE_DAYS);
        assert_eq!(prune_recovery(tmp.path(), cutoff).unwrap(), 1);
        let entries = read_recovery_entries(tmp.path(), None);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].description, "recent");
        assert_eq!(prune_recovery(tmp.path(), cutoff).unwrap(), 0);
    }

    #[test]
    fn body_with_fence_lines_survives_prune() {
        let tmp = TempDir::new().unwrap();
        let body = "{ \"lists\": [\n```\n---\n## 2025-05-01T10:00:00Z write: fake\nKey: value\n````\n";
        log_recovery(
            tmp.path(),
            RecoveryEntry::new(RecoveryCategory::Parser, "state.json unreadable").body(body),
        );
        let md = fs::read_to_string(recovery_log_path(tmp.path())).unwrap();
        assert!(md.contains("\n`````text\n"));

        let cutoff = Utc::now() - chrono::Duration::days(PRUNE_AGE_DAYS);
        assert_eq!(prune_recovery(tmp.path(), cutoff).unwrap(), 0);
        let entries = read_recovery_entries(tmp.path(), None);
        assert_eq!(entries.len(), 1);
        assert!(entries[0].fields.is_empty());
        assert_eq!(entries[0].body, body.trim_end_matches('\n'));
    }

    #[test]
    fn prune_without_log_is_zero() {
        let tmp = TempDir::new().unwrap();
        assert_eq!(prune_recovery(tmp.path(), Utc::now()).unwrap(), 0);
    }

    #[test]
    fn unknown_headers_are_skipped() {
        let entries = parse_entries("## not-a-date write: x\n\n---\n## 2025-05-01T10:00:00Z bogus: y\n");
        assert!(entries.is_empty());
    }

    #[test]
    fn category_text_round_trip() {
        for cat in [
            RecoveryCategory::Parser,
            RecoveryCategory::Write,
            RecoveryCategory::Delete,
        ] {
            assert_eq!(cat.to_string().parse::<RecoveryCategory>().unwrap(), cat);
        }
        assert!("conflict".parse::<RecoveryCategory>().is_err());
    }

    #[test]
    fn atomic_write_replaces_content() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("state.json");
        atomic_write(&path, b"one").unwrap();
        atomic_write(&path, b"two").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "two");
    }
}
