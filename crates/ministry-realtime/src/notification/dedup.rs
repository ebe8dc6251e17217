//! Session-scoped record of notices already surfaced.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tracing::{debug, warn};

use ministry_core::error::AppError;
use ministry_core::types::id::NoticeId;

/// Notice id → time it was first surfaced in this session.
///
/// Entries are never removed while the session lives. With a backing file
/// the table survives reloads of the same session; a new session should
/// use a fresh path (or [`SessionDedupTable::in_memory`]).
#[derive(Debug)]
pub struct SessionDedupTable {
    /// Shown notices.
    entries: DashMap<NoticeId, DateTime<Utc>>,
    /// Optional write-through file.
    path: Option<PathBuf>,
    /// Serializes file writes.
    write_lock: Mutex<()>,
}

impl SessionDedupTable {
    /// Table that lives only as long as the process.
    pub fn in_memory() -> Self {
        Self {
            entries: DashMap::new(),
            path: None,
            write_lock: Mutex::new(()),
        }
    }

    /// Table persisted to `path`, seeded with whatever the file already holds.
    ///
    /// An unreadable or malformed file is logged and treated as empty.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = DashMap::new();

        match load(&path) {
            Ok(Some(saved)) => {
                for (id, shown_at) in saved {
                    entries.insert(NoticeId::from(id), shown_at);
                }
                debug!(path = %path.display(), count = entries.len(), "Session dedup table restored");
            }
            Ok(None) => {}
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Ignoring unreadable session dedup file");
            }
        }

        Self {
            entries,
            path: Some(path),
            write_lock: Mutex::new(()),
        }
    }

    /// Whether the notice was already surfaced this session.
    pub fn was_shown(&self, id: &NoticeId) -> bool {
        self.entries.contains_key(id)
    }

    /// When the notice was first surfaced, if ever.
    pub fn shown_at(&self, id: &NoticeId) -> Option<DateTime<Utc>> {
        self.entries.get(id).map(|entry| *entry.value())
    }

    /// Record the notice as shown.
    ///
    /// Returns `true` if this is the first time. Persistence failures are
    /// logged; the in-memory entry is kept regardless.
    pub fn mark_shown(&self, id: &NoticeId) -> bool {
        let inserted = match self.entries.entry(id.clone()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(Utc::now());
                true
            }
        };

        if inserted {
            if let Err(e) = self.persist() {
                warn!(notice_id = %id, error = %e, "Failed to persist session dedup table");
            }
        }
        inserted
    }

    /// Number of shown notices.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing has been shown yet.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Every entry, oldest first.
    pub fn entries(&self) -> Vec<(NoticeId, DateTime<Utc>)> {
        let mut entries: Vec<_> = self
            .entries
            .iter()
            .map(|entry| (entry.key().clone(), *entry.value()))
            .collect();
        entries.sort_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.as_str().cmp(b.0.as_str())));
        entries
    }

    fn persist(&self) -> Result<(), AppError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());

        let snapshot: BTreeMap<String, DateTime<Utc>> = self
            .entries
            .iter()
            .map(|entry| (entry.key().to_string(), *entry.value()))
            .collect();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let tmp = path.with_extension("tmp");
        fs::write(&tmp, serde_json::to_vec_pretty(&snapshot)?)?;
        fs::rename(&tmp, path)?;
        Ok(())
    }
}

impl Default for SessionDedupTable {
    fn default() -> Self {
        Self::in_memory()
    }
}

fn load(path: &Path) -> Result<Option<BTreeMap<String, DateTime<Utc>>>, AppError> {
    if !path.exists() {
        return Ok(None);
    }
    let raw = fs::read(path)?;
    Ok(Some(serde_json::from_slice(&raw)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mark_shown_is_idempotent() {
        let table = SessionDedupTable::in_memory();
        let id = NoticeId::new("n-1");
        assert!(!table.was_shown(&id));
        assert!(table.mark_shown(&id));
        let first = table.shown_at(&id).expect("recorded");
        assert!(!table.mark_shown(&id));
        assert_eq!(table.shown_at(&id), Some(first));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_reload_within_session_keeps_entries() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session").join("overlay-dedup.json");

        let table = SessionDedupTable::open(&path);
        table.mark_shown(&NoticeId::new("a"));
        table.mark_shown(&NoticeId::new("b"));
        drop(table);

        let reloaded = SessionDedupTable::open(&path);
        assert!(reloaded.was_shown(&NoticeId::new("a")));
        assert!(reloaded.was_shown(&NoticeId::new("b")));
        assert!(!reloaded.was_shown(&NoticeId::new("c")));
    }

    #[test]
    fn test_new_session_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let first = SessionDedupTable::open(dir.path().join("session-1.json"));
        first.mark_shown(&NoticeId::new("a"));

        let second = SessionDedupTable::open(dir.path().join("session-2.json"));
        assert!(second.is_empty());
    }

    #[test]
    fn test_malformed_file_treated_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dedup.json");
        fs::write(&path, b"{not json").unwrap();

        let table = SessionDedupTable::open(&path);
        assert!(table.is_empty());
        assert!(table.mark_shown(&NoticeId::new("x")));
        assert!(SessionDedupTable::open(&path).was_shown(&NoticeId::new("x")));
    }

    #[test]
    fn test_entries_oldest_first() {
        let table = SessionDedupTable::in_memory();
        table.mark_shown(&NoticeId::new("first"));
        std::thread::sleep(std::time::Duration::from_millis(2));
        table.mark_shown(&NoticeId::new("second"));

        let ids: Vec<String> = table
            .entries()
            .into_iter()
            .map(|(id, _)| id.into_inner())
            .collect();
        assert_eq!(ids, vec!["first", "second"]);
    }
}
