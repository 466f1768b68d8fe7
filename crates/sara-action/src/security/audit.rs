//! Durable audit trail storage.
//!
//! Two layouts are supported. JSON Lines appends one object per entry and is
//! the default. The JSON array layout rewrites the whole file on every entry,
//! going through a temporary file and a rename so a crash mid-write leaves the
//! previous array intact.
//!
//! Both stores assume a single writer. Two processes sharing one file will
//! interleave or clobber each other's writes.

use std::fs::{self, OpenOptions};
use std::io::{BufRead, BufReader, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use chrono::Utc;
use sara_core::config::AuditFormat;
use tracing::{debug, warn};

use crate::error::AuditError;
use crate::types::AuditEntry;

/// Backing store for audit entries.
pub trait AuditStore: Send + Sync {
    /// Read every persisted entry, oldest first. A missing file is empty.
    fn load(&self) -> Result<Vec<AuditEntry>, AuditError>;

    /// Persist `entry`, which has just been appended to `all`.
    fn persist(&self, entry: &AuditEntry, all: &[AuditEntry]) -> Result<(), AuditError>;

    /// Where the store writes, for diagnostics.
    fn location(&self) -> &Path;

    /// Move an unreadable file out of the way so later writes cannot
    /// overwrite it. Returns where the old bytes now live.
    fn quarantine(&self) -> Result<Option<PathBuf>, AuditError> {
        let path = self.location();
        if !path.exists() {
            return Ok(None);
        }
        let target = quarantine_path(path);
        fs::rename(path, &target)?;
        warn!(
            from = %path.display(),
            to = %target.display(),
            "Unreadable audit log moved aside"
        );
        Ok(Some(target))
    }
}

/// `<name>.corrupt-<timestamp>` next to `path`.
fn quarantine_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(format!(".corrupt-{}", Utc::now().format("%Y%m%dT%H%M%S%.3fZ")));
    path.with_file_name(name)
}

/// Open the store matching `format` at `path`.
pub fn open_store(format: AuditFormat, path: impl Into<PathBuf>) -> Box<dyn AuditStore> {
    let path = path.into();
    match format {
        AuditFormat::JsonLines => Box::new(JsonLinesAuditStore::new(path)),
        AuditFormat::JsonArray => Box::new(JsonArrayAuditStore::new(path)),
    }
}

fn ensure_parent(path: &Path) -> Result<(), AuditError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

// =============================================================================
// JSON Lines
// =============================================================================

/// Append-only store, one JSON object per line.
pub struct JsonLinesAuditStore {
    path: PathBuf,
}

impl JsonLinesAuditStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl AuditStore for JsonLinesAuditStore {
    fn load(&self) -> Result<Vec<AuditEntry>, AuditError> {
        let file = match fs::File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut entries = Vec::new();
        for (index, line) in BufReader::new(file).lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<AuditEntry>(&line) {
                Ok(entry) => entries.push(entry),
                Err(e) => warn!(
                    path = %self.path.display(),
                    line = index + 1,
                    error = %e,
                    "Skipping corrupt audit line"
                ),
            }
        }
        Ok(entries)
    }

    fn persist(&self, entry: &AuditEntry, _all: &[AuditEntry]) -> Result<(), AuditError> {
        ensure_parent(&self.path)?;
        let mut line = serde_json::to_string(entry)?;
        line.push('\n');
        let mut file = OpenOptions::new()
            .read(true)
            .create(true)
            .append(true)
            .open(&self.path)?;

        // A torn earlier write leaves a tail without a newline; close it off
        // so the new entry starts on a line of its own.
        if file.metadata()?.len() > 0 {
            let mut last = [0u8; 1];
            file.seek(SeekFrom::End(-1))?;
            file.read_exact(&mut last)?;
            if last[0] != b'\n' {
                line.insert(0, '\n');
            }
        }
        file.write_all(line.as_bytes())?;
        file.flush()?;
        Ok(())
    }

    fn location(&self) -> &Path {
        &self.path
    }
}

// =============================================================================
// JSON array
// =============================================================================

/// Whole-file store holding a single pretty-printed JSON array.
pub struct JsonArrayAuditStore {
    path: PathBuf,
}

impl JsonArrayAuditStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl AuditStore for JsonArrayAuditStore {
    fn load(&self) -> Result<Vec<AuditEntry>, AuditError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        if content.trim().is_empty() {
            return Ok(Vec::new());
        }
        Ok(serde_json::from_str(&content)?)
    }

    fn persist(&self, _entry: &AuditEntry, all: &[AuditEntry]) -> Result<(), AuditError> {
        ensure_parent(&self.path)?;
        let content = serde_json::to_string_pretty(all)?;
        let tmp = self.temp_path();
        fs::write(&tmp, content)?;
        fs::rename(&tmp, &self.path)?;
        debug!(path = %self.path.display(), entries = all.len(), "Audit array rewritten");
        Ok(())
    }

    fn location(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PermissionLevel;
    use chrono::Utc;

    fn entry(action: &str, approved: bool) -> AuditEntry {
        AuditEntry {
            timestamp: Utc::now(),
            action: action.to_string(),
            permission_level: PermissionLevel::Medium,
            approved,
            result: Some("Success".to_string()),
        }
    }

    // ---- JSON Lines ----

    #[test]
    fn test_json_lines_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonLinesAuditStore::new(dir.path().join("absent.jsonl"));
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn test_json_lines_appends_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("audit.jsonl");
        let store = JsonLinesAuditStore::new(&path);

        let mut all = Vec::new();
        for name in ["first", "second", "third"] {
            let e = entry(name, true);
            all.push(e.clone());
            store.persist(&e, &all).unwrap();
        }

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 3);

        let loaded = store.load().unwrap();
        let names: Vec<&str> = loaded.iter().map(|e| e.action.as_str()).collect();
        assert_eq!(names, vec!["first", "second", "third"]);
    }

    #[test]
    fn test_json_lines_skips_corrupt_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audit.jsonl");
        let good = serde_json::to_string(&entry("kept", false)).unwrap();
        fs::write(&path, format!("{}\n{{not json\n\n{}\n", good, good)).unwrap();

        let loaded = JsonLinesAuditStore::new(&path).load().unwrap();
        assert_eq!(loaded.len(), 2);
        assert!(loaded.iter().all(|e| e.action == "kept"));
    }

    #[test]
    fn test_json_lines_entry_after_torn_tail_survives() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audit.jsonl");
        let store = JsonLinesAuditStore::new(&path);

        let first = entry("first", true);
        store.persist(&first, std::slice::from_ref(&first)).unwrap();
        let mut file = OpenOptions::new().append(true).open(&path).unwrap();
        file.write_all(b"{\"timestamp\":\"2024-01-01T00:00:00Z\",\"act").unwrap();
        drop(file);

        let second = entry("second", true);
        store.persist(&second, &[]).unwrap();

        let names: Vec<String> = store.load().unwrap().into_iter().map(|e| e.action).collect();
        assert_eq!(names, vec!["first", "second"]);
    }

    // ---- JSON array ----

    #[test]
    fn test_json_array_rewrites_whole_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audit.json");
        let store = JsonArrayAuditStore::new(&path);

        let mut all = vec![entry("one", true)];
        store.persist(&all[0], &all).unwrap();
        all.push(entry("two", false));
        store.persist(&all[1], &all).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value.as_array().unwrap().len(), 2);
        assert!(!store.temp_path().exists());

        let loaded = store.load().unwrap();
        assert_eq!(loaded, all);
    }

    #[test]
    fn test_json_array_corrupt_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audit.json");
        fs::write(&path, "[{\"broken\":").unwrap();
        let err = JsonArrayAuditStore::new(&path).load().unwrap_err();
        assert!(matches!(err, AuditError::Serialization(_)));
    }

    #[test]
    fn test_json_array_empty_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audit.json");
        fs::write(&path, "  \n").unwrap();
        assert!(JsonArrayAuditStore::new(&path).load().unwrap().is_empty());
    }

    // ---- quarantine ----

    #[test]
    fn test_quarantine_keeps_old_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audit.json");
        fs::write(&path, "[{\"broken\":").unwrap();
        let store = JsonArrayAuditStore::new(&path);

        let moved = store.quarantine().unwrap().unwrap();
        assert!(!path.exists());
        assert_eq!(fs::read_to_string(&moved).unwrap(), "[{\"broken\":");
        assert!(moved
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with("audit.json.corrupt-"));
    }

    #[test]
    fn test_quarantine_missing_file_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonLinesAuditStore::new(dir.path().join("absent.jsonl"));
        assert!(store.quarantine().unwrap().is_none());
    }

    // ---- open_store ----

    #[test]
    fn test_open_store_respects_format() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audit.log");

        let store = open_store(AuditFormat::JsonLines, &path);
        store.persist(&entry("x", true), &[]).unwrap();
        assert_eq!(store.location(), path.as_path());
        let raw = fs::read_to_string(&path).unwrap();
        assert!(raw.starts_with('{'));

        let path = dir.path().join("audit.arr");
        let store = open_store(AuditFormat::JsonArray, &path);
        let e = entry("y", true);
        store.persist(&e, std::slice::from_ref(&e)).unwrap();
        let raw = fs::read_to_string(&path).unwrap();
        assert!(raw.starts_with('['));
    }
}
