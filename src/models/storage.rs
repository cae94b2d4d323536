use crate::error::{Result, SnippetError};
use crate::models::Snippet;
use chrono::Utc;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, warn};

/// Reads and writes the whole snippet collection as one blob in a named slot.
///
/// `read_all` returns `Ok(None)` when the slot has never been written (or holds
/// only whitespace) and `Err(PersistenceRead)` when it holds something that is
/// not a snippet collection. There is no incremental write.
pub trait PersistenceAdapter {
    fn read_all(&self) -> Result<Option<Vec<Snippet>>>;
    fn write_all(&self, snippets: &[Snippet]) -> Result<()>;
}

/// Serializes a collection into the durable document format
pub fn encode_collection(snippets: &[Snippet]) -> Result<String> {
    serde_json::to_string_pretty(snippets)
        .map_err(|e| SnippetError::PersistenceWrite(format!("failed to serialize snippets: {e}")))
}

/// Parses the durable document format
pub fn decode_collection(blob: &str) -> Result<Option<Vec<Snippet>>> {
    if blob.trim().is_empty() {
        return Ok(None);
    }

    serde_json::from_str(blob)
        .map(Some)
        .map_err(|e| SnippetError::PersistenceRead(format!("failed to parse snippets JSON: {e}")))
}

/// Storage Manager for disk operations.
///
/// A slot named `key` lives at `<data_dir>/<key>.json`.
#[derive(Debug, Clone)]
pub struct StorageManager {
    data_dir: PathBuf,
    key: String,
    slot_file: PathBuf,
}

impl StorageManager {
    pub fn new(data_dir: impl Into<PathBuf>, key: &str) -> Result<Self> {
        if key.is_empty() || key.contains(['/', '\\']) || key.starts_with('.') {
            return Err(SnippetError::Config(format!("invalid storage key '{key}'")));
        }

        let data_dir = data_dir.into();
        fs::create_dir_all(&data_dir)?;

        Ok(Self {
            slot_file: data_dir.join(format!("{key}.json")),
            data_dir,
            key: key.to_string(),
        })
    }

    pub fn slot_path(&self) -> &Path {
        &self.slot_file
    }

    /// Copies an unreadable blob next to the slot so the next write
    /// does not destroy it
    fn quarantine(&self, blob: &str) -> Option<PathBuf> {
        let stamp = Utc::now().format("%Y%m%d_%H%M%S%3f");
        let backup = self
            .data_dir
            .join(format!("{}.corrupt-{}.json", self.key, stamp));

        match fs::write(&backup, blob) {
            Ok(()) => Some(backup),
            Err(e) => {
                warn!(error = %e, path = %backup.display(), "failed to back up corrupt snippet storage");
                None
            }
        }
    }
}

impl PersistenceAdapter for StorageManager {
    fn read_all(&self) -> Result<Option<Vec<Snippet>>> {
        if !self.slot_file.exists() {
            debug!(path = %self.slot_file.display(), "no snippet storage yet");
            return Ok(None);
        }

        let blob = fs::read_to_string(&self.slot_file).map_err(|e| {
            SnippetError::PersistenceRead(format!("failed to read snippet storage: {e}"))
        })?;

        decode_collection(&blob).inspect_err(|_| {
            if let Some(backup) = self.quarantine(&blob) {
                warn!(path = %backup.display(), "kept a copy of unreadable snippet storage");
            }
        })
    }

    fn write_all(&self, snippets: &[Snippet]) -> Result<()> {
        let blob = encode_collection(snippets)?;
        atomic_write(&self.slot_file, blob.as_bytes())?;
        debug!(count = snippets.len(), path = %self.slot_file.display(), "snippet storage written");
        Ok(())
    }
}

/// Writes through a sibling temp file and a rename so readers never observe
/// a half-written slot
fn atomic_write(target: &Path, content: &[u8]) -> Result<()> {
    let write_err =
        |step: &str, e: std::io::Error| SnippetError::PersistenceWrite(format!("{step}: {e}"));

    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent).map_err(|e| write_err("create data dir", e))?;
    }

    let temp = target.with_extension("json.tmp");
    fs::write(&temp, content).map_err(|e| write_err("write temp file", e))?;
    fs::rename(&temp, target).map_err(|e| write_err("replace storage file", e))?;
    Ok(())
}

#[derive(Debug, Default)]
struct MemorySlot {
    blob: Option<String>,
    fail_writes: bool,
    writes: usize,
}

/// In-process slot. Clones share the same slot, so a caller can keep a handle
/// while a repository owns another.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    slot: Arc<Mutex<MemorySlot>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// A slot pre-filled with a raw blob, valid or not
    pub fn with_blob(blob: impl Into<String>) -> Self {
        let storage = Self::new();
        storage.lock().blob = Some(blob.into());
        storage
    }

    pub fn blob(&self) -> Option<String> {
        self.lock().blob.clone()
    }

    /// Makes subsequent writes fail until switched off again
    pub fn set_fail_writes(&self, fail: bool) {
        self.lock().fail_writes = fail;
    }

    /// Number of successful writes so far
    pub fn write_count(&self) -> usize {
        self.lock().writes
    }

    fn lock(&self) -> MutexGuard<'_, MemorySlot> {
        self.slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl PersistenceAdapter for MemoryStorage {
    fn read_all(&self) -> Result<Option<Vec<Snippet>>> {
        match self.lock().blob.as_deref() {
            Some(blob) => decode_collection(blob),
            None => Ok(None),
        }
    }

    fn write_all(&self, snippets: &[Snippet]) -> Result<()> {
        let blob = encode_collection(snippets)?;
        let mut slot = self.lock();
        if slot.fail_writes {
            return Err(SnippetError::PersistenceWrite(
                "memory slot is read-only".to_string(),
            ));
        }
        slot.blob = Some(blob);
        slot.writes += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{SnippetDraft, SnippetId, SnippetLanguage};
    use tempfile::TempDir;

    fn sample(title: &str) -> Snippet {
        let draft = SnippetDraft::new(title, "fn main() {}", SnippetLanguage::Rust)
            .with_tags("cli,rust")
            .with_description("entry point");
        Snippet::from_draft(SnippetId::generate(), draft, Utc::now())
    }

    #[test]
    fn test_file_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let storage = StorageManager::new(temp_dir.path(), "codeSnippets").unwrap();
        let snippets = vec![sample("one"), sample("two")];

        storage.write_all(&snippets).unwrap();

        assert_eq!(storage.read_all().unwrap(), Some(snippets));
        assert!(storage.slot_path().ends_with("codeSnippets.json"));
    }

    #[test]
    fn test_file_round_trip_empty_collection() {
        let temp_dir = TempDir::new().unwrap();
        let storage = StorageManager::new(temp_dir.path(), "codeSnippets").unwrap();

        storage.write_all(&[]).unwrap();

        assert_eq!(storage.read_all().unwrap(), Some(Vec::new()));
    }

    #[test]
    fn test_missing_file_is_absent() {
        let temp_dir = TempDir::new().unwrap();
        let storage = StorageManager::new(temp_dir.path().join("nested"), "codeSnippets").unwrap();

        assert_eq!(storage.read_all().unwrap(), None);
    }

    #[test]
    fn test_corrupt_file_is_quarantined() {
        let temp_dir = TempDir::new().unwrap();
        let storage = StorageManager::new(temp_dir.path(), "codeSnippets").unwrap();
        fs::write(storage.slot_path(), "{not json").unwrap();

        let result = storage.read_all();
        assert!(matches!(result, Err(SnippetError::PersistenceRead(_))));

        let backups: Vec<_> = fs::read_dir(temp_dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| {
                e.file_name()
                    .to_str()
                    .map(|s| s.starts_with("codeSnippets.corrupt-"))
                    .unwrap_or(false)
            })
            .collect();
        assert_eq!(backups.len(), 1);
        assert_eq!(fs::read_to_string(backups[0].path()).unwrap(), "{not json");
    }

    #[test]
    fn test_no_tmp_files_after_write() {
        let temp_dir = TempDir::new().unwrap();
        let storage = StorageManager::new(temp_dir.path(), "codeSnippets").unwrap();

        storage.write_all(&[sample("clean")]).unwrap();

        let tmp_count = fs::read_dir(temp_dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| {
                e.file_name()
                    .to_str()
                    .map(|s| s.ends_with(".tmp"))
                    .unwrap_or(false)
            })
            .count();
        assert_eq!(tmp_count, 0);
    }

    #[test]
    fn test_rejects_path_like_keys() {
        let temp_dir = TempDir::new().unwrap();
        assert!(StorageManager::new(temp_dir.path(), "../escape").is_err());
        assert!(StorageManager::new(temp_dir.path(), "").is_err());
    }

    #[test]
    fn test_memory_slot_tolerates_garbage_and_blank() {
        assert!(MemoryStorage::with_blob("garbage").read_all().is_err());
        assert_eq!(MemoryStorage::with_blob("  \n").read_all().unwrap(), None);
        assert_eq!(MemoryStorage::new().read_all().unwrap(), None);
    }

    #[test]
    fn test_memory_write_failure_keeps_previous_blob() {
        let storage = MemoryStorage::new();
        storage.write_all(&[sample("kept")]).unwrap();
        let before = storage.blob();

        storage.set_fail_writes(true);
        assert!(matches!(
            storage.write_all(&[]),
            Err(SnippetError::PersistenceWrite(_))
        ));
        assert_eq!(storage.blob(), before);
        assert_eq!(storage.write_count(), 1);
    }
}
