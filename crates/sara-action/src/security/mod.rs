//! Permission checks and the audit trail.

pub mod audit;

use std::sync::{Mutex, MutexGuard};

use chrono::Utc;
use sara_core::config::PipelineConfig;
use tracing::{error, info, warn};

use crate::types::{AuditEntry, PermissionLevel};
pub use audit::{open_store, AuditStore, JsonArrayAuditStore, JsonLinesAuditStore};

/// Which tiers the gate lets through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SecurityPolicy {
    /// Highest tier permitted. Anything above it is denied outright.
    pub max_level: PermissionLevel,
}

impl Default for SecurityPolicy {
    fn default() -> Self {
        Self {
            max_level: PermissionLevel::High,
        }
    }
}

impl SecurityPolicy {
    pub fn from_config(config: &PipelineConfig) -> Self {
        Self {
            max_level: config.max_permission_level,
        }
    }
}

/// Evaluates permission for actions and records every attempt.
///
/// Entries are held in memory and mirrored to an [`AuditStore`]. Persistence
/// is best effort: a failed write is logged and the in-memory record and the
/// caller's outcome are left untouched.
///
/// A store that cannot be read is moved aside before anything new is written,
/// so earlier history is never overwritten. If it cannot be moved, the gate
/// keeps its entries in memory only.
pub struct SecurityGate {
    policy: SecurityPolicy,
    store: Box<dyn AuditStore>,
    entries: Mutex<Vec<AuditEntry>>,
    persist: bool,
}

impl SecurityGate {
    /// Create a gate and load any history already in `store`.
    pub fn new(policy: SecurityPolicy, store: Box<dyn AuditStore>) -> Self {
        let (entries, persist) = match store.load() {
            Ok(entries) => {
                info!(
                    path = %store.location().display(),
                    entries = entries.len(),
                    "Audit log loaded"
                );
                (entries, true)
            }
            Err(e) => {
                error!(
                    path = %store.location().display(),
                    error = %e,
                    "Error loading audit log, starting empty"
                );
                match store.quarantine() {
                    Ok(_) => (Vec::new(), true),
                    Err(e) => {
                        error!(
                            path = %store.location().display(),
                            error = %e,
                            "Could not move unreadable audit log aside, keeping audit in memory only"
                        );
                        (Vec::new(), false)
                    }
                }
            }
        };

        Self {
            policy,
            store,
            entries: Mutex::new(entries),
            persist,
        }
    }

    /// Whether new entries reach the durable store.
    pub fn is_persistent(&self) -> bool {
        self.persist
    }

    pub fn policy(&self) -> SecurityPolicy {
        self.policy
    }

    fn entries(&self) -> MutexGuard<'_, Vec<AuditEntry>> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Decide whether an action at `level` may run.
    ///
    /// HIGH actions are flagged; their human confirmation happens upstream.
    pub fn check_permission(&self, action: &str, level: PermissionLevel) -> bool {
        info!(action, level = %level, "Permission check");

        if level > self.policy.max_level {
            warn!(
                action,
                level = %level,
                max_level = %self.policy.max_level,
                "Permission denied by policy"
            );
            return false;
        }

        if level.requires_confirmation() {
            warn!(action, "High-risk action requires confirmation");
        }
        true
    }

    /// Append an entry to the audit trail and persist it.
    pub fn log_action(
        &self,
        action: &str,
        level: PermissionLevel,
        approved: bool,
        result: Option<&str>,
    ) {
        let entry = AuditEntry {
            timestamp: Utc::now(),
            action: action.to_string(),
            permission_level: level,
            approved,
            result: result.map(str::to_string),
        };

        let mut entries = self.entries();
        entries.push(entry);
        info!(action, approved, "Audit log");

        if !self.persist {
            return;
        }
        if let Some(latest) = entries.last() {
            if let Err(e) = self.store.persist(latest, &entries) {
                error!(
                    path = %self.store.location().display(),
                    error = %e,
                    "Error saving audit log"
                );
            }
        }
    }

    /// The most recent `count` entries, oldest first.
    pub fn recent_entries(&self, count: usize) -> Vec<AuditEntry> {
        let entries = self.entries();
        let start = entries.len().saturating_sub(count);
        entries[start..].to_vec()
    }

    /// Every entry recorded so far, oldest first.
    pub fn all_entries(&self) -> Vec<AuditEntry> {
        self.entries().clone()
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AuditError;
    use std::path::{Path, PathBuf};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Store whose writes always fail.
    struct BrokenStore {
        path: PathBuf,
        attempts: AtomicUsize,
    }

    impl AuditStore for BrokenStore {
        fn load(&self) -> Result<Vec<AuditEntry>, AuditError> {
            Err(AuditError::Io(std::io::Error::other("unreadable")))
        }

        fn persist(&self, _: &AuditEntry, _: &[AuditEntry]) -> Result<(), AuditError> {
            self.attempts.fetch_add(1, Ordering::SeqCst);
            Err(AuditError::Io(std::io::Error::other("disk full")))
        }

        fn location(&self) -> &Path {
            &self.path
        }
    }

    fn gate_at(path: &Path) -> SecurityGate {
        SecurityGate::new(
            SecurityPolicy::default(),
            Box::new(JsonLinesAuditStore::new(path)),
        )
    }

    #[test]
    fn test_default_policy_permits_every_tier() {
        let dir = tempfile::tempdir().unwrap();
        let gate = gate_at(&dir.path().join("audit.jsonl"));
        for level in PermissionLevel::ALL {
            assert!(gate.check_permission("anything", level));
        }
    }

    #[test]
    fn test_policy_denies_above_max_level() {
        let dir = tempfile::tempdir().unwrap();
        let gate = SecurityGate::new(
            SecurityPolicy {
                max_level: PermissionLevel::Low,
            },
            Box::new(JsonLinesAuditStore::new(dir.path().join("audit.jsonl"))),
        );
        assert!(gate.check_permission("Get time", PermissionLevel::Observe));
        assert!(gate.check_permission("Volume up", PermissionLevel::Low));
        assert!(!gate.check_permission("Open notepad", PermissionLevel::Medium));
        assert!(!gate.check_permission("Shutdown", PermissionLevel::High));
    }

    #[test]
    fn test_check_permission_does_not_write_audit() {
        let dir = tempfile::tempdir().unwrap();
        let gate = gate_at(&dir.path().join("audit.jsonl"));
        gate.check_permission("Get time", PermissionLevel::Observe);
        assert!(gate.is_empty());
    }

    #[test]
    fn test_log_action_records_fields() {
        let dir = tempfile::tempdir().unwrap();
        let gate = gate_at(&dir.path().join("audit.jsonl"));
        gate.log_action("Open notepad", PermissionLevel::Medium, true, Some("Success"));

        let entries = gate.all_entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].action, "Open notepad");
        assert_eq!(entries[0].permission_level, PermissionLevel::Medium);
        assert!(entries[0].approved);
        assert_eq!(entries[0].result.as_deref(), Some("Success"));
    }

    #[test]
    fn test_history_survives_new_gate() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audit.jsonl");
        {
            let gate = gate_at(&path);
            gate.log_action("first", PermissionLevel::Low, true, Some("Success"));
            gate.log_action("second", PermissionLevel::High, false, Some("Permission denied"));
        }

        let reopened = gate_at(&path);
        let entries = reopened.all_entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].action, "first");
        assert_eq!(entries[1].action, "second");
        assert!(!entries[1].approved);
    }

    #[test]
    fn test_history_survives_new_gate_json_array() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audit.json");
        {
            let gate = SecurityGate::new(
                SecurityPolicy::default(),
                Box::new(JsonArrayAuditStore::new(&path)),
            );
            gate.log_action("one", PermissionLevel::Observe, true, None);
        }
        let reopened = SecurityGate::new(
            SecurityPolicy::default(),
            Box::new(JsonArrayAuditStore::new(&path)),
        );
        assert_eq!(reopened.len(), 1);
        assert!(reopened.all_entries()[0].result.is_none());
    }

    #[test]
    fn test_unreadable_log_is_moved_aside_not_overwritten() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sara_audit.jsonl");
        {
            let gate = gate_at(&path);
            for name in ["a", "b", "c"] {
                gate.log_action(name, PermissionLevel::Low, true, Some("Success"));
            }
        }
        let original = std::fs::read_to_string(&path).unwrap();

        // Same file, read back after switching to the array layout.
        let gate = SecurityGate::new(
            SecurityPolicy::default(),
            Box::new(JsonArrayAuditStore::new(&path)),
        );
        assert!(gate.is_empty());
        assert!(gate.is_persistent());
        gate.log_action("d", PermissionLevel::Low, true, Some("Success"));

        let moved: Vec<PathBuf> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().path())
            .filter(|p| p.to_string_lossy().contains(".corrupt-"))
            .collect();
        assert_eq!(moved.len(), 1);
        assert_eq!(std::fs::read_to_string(&moved[0]).unwrap(), original);

        let reopened = SecurityGate::new(
            SecurityPolicy::default(),
            Box::new(JsonArrayAuditStore::new(&path)),
        );
        assert_eq!(reopened.all_entries()[0].action, "d");
    }

    /// Unreadable store that also refuses to be moved aside.
    struct StuckStore {
        path: PathBuf,
        writes: Arc<AtomicUsize>,
    }

    impl AuditStore for StuckStore {
        fn load(&self) -> Result<Vec<AuditEntry>, AuditError> {
            Err(AuditError::Io(std::io::Error::other("unreadable")))
        }

        fn persist(&self, _: &AuditEntry, _: &[AuditEntry]) -> Result<(), AuditError> {
            self.writes.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        fn location(&self) -> &Path {
            &self.path
        }

        fn quarantine(&self) -> Result<Option<PathBuf>, AuditError> {
            Err(AuditError::Io(std::io::Error::other("read-only directory")))
        }
    }

    #[test]
    fn test_unmovable_log_is_never_written() {
        let writes = Arc::new(AtomicUsize::new(0));
        let gate = SecurityGate::new(
            SecurityPolicy::default(),
            Box::new(StuckStore {
                path: PathBuf::from("/var/lib/sara/audit.json"),
                writes: writes.clone(),
            }),
        );
        assert!(!gate.is_persistent());

        gate.log_action("Open notepad", PermissionLevel::Medium, true, Some("Success"));
        assert_eq!(gate.len(), 1);
        assert_eq!(writes.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_unreadable_missing_log_keeps_persisting() {
        let gate = SecurityGate::new(
            SecurityPolicy::default(),
            Box::new(BrokenStore {
                path: PathBuf::from("/dev/null/audit"),
                attempts: AtomicUsize::new(0),
            }),
        );
        assert!(gate.is_persistent());
    }

    #[test]
    fn test_persist_failure_keeps_memory_record() {
        let gate = SecurityGate::new(
            SecurityPolicy::default(),
            Box::new(BrokenStore {
                path: PathBuf::from("/dev/null/audit"),
                attempts: AtomicUsize::new(0),
            }),
        );
        assert!(gate.is_empty());

        gate.log_action("Lock screen", PermissionLevel::Medium, true, Some("Success"));
        gate.log_action("Lock screen", PermissionLevel::Medium, true, Some("Success"));
        assert_eq!(gate.len(), 2);
    }

    #[test]
    fn test_recent_entries_returns_tail() {
        let dir = tempfile::tempdir().unwrap();
        let gate = gate_at(&dir.path().join("audit.jsonl"));
        for i in 0..5 {
            gate.log_action(&format!("action {}", i), PermissionLevel::Low, true, None);
        }

        let recent = gate.recent_entries(2);
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].action, "action 3");
        assert_eq!(recent[1].action, "action 4");

        assert_eq!(gate.recent_entries(50).len(), 5);
        assert!(gate.recent_entries(0).is_empty());
    }

    #[test]
    fn test_policy_from_config() {
        let mut config = PipelineConfig::default();
        assert_eq!(
            SecurityPolicy::from_config(&config).max_level,
            PermissionLevel::High
        );
        config.max_permission_level = PermissionLevel::Medium;
        assert_eq!(
            SecurityPolicy::from_config(&config).max_level,
            PermissionLevel::Medium
        );
    }
}
