//! JSON file store for memos.
//!
//! The backing file holds one JSON array of `{id, description, content}`
//! objects, pretty-printed with two-space indentation. The handle is opened
//! once and held for the lifetime of the store; every read seeks back to the
//! start and decodes the whole file again.
//!
//! Writes truncate the file and serialize the full set in one pass. A crash
//! between the truncate and the write loses the file contents; there is no
//! temp-file-and-rename step.

use std::collections::BTreeMap;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use tracing::{debug, info};

use memos_types::{strip_whitespace, Memo};

use crate::error::StorageError;

/// Result of [`MemoStore::append`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppendOutcome {
    /// A new memo was written with a freshly assigned id
    Stored(Memo),
    /// Content matched an existing memo; nothing was written
    Duplicate { existing_id: u64 },
}

/// File-backed memo store.
///
/// A single mutex guards the handle so that id assignment and the
/// truncate/rewrite window are serialized within one process. Writers in
/// other processes are not coordinated.
pub struct MemoStore {
    path: PathBuf,
    file: Mutex<File>,
}

impl MemoStore {
    /// Open the store at `path`, creating the file if necessary.
    ///
    /// The current contents are decoded once so that a malformed file is
    /// rejected at open time. An empty file is an empty store.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let path = path.as_ref().to_path_buf();
        info!("Opening memo store at {:?}", path);

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)?;

        let memos = read_memos(&mut file)?;
        info!(count = memos.len(), "Memo store opened");

        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current memo set, re-read from disk.
    pub fn read_all(&self) -> Result<BTreeMap<u64, Memo>, StorageError> {
        let mut file = self.lock()?;
        read_memos(&mut file)
    }

    /// Look up a single memo by id.
    pub fn get(&self, id: u64) -> Result<Option<Memo>, StorageError> {
        Ok(self.read_all()?.remove(&id))
    }

    /// Render every memo as model-readable text, in id order.
    pub fn render_corpus(&self) -> Result<String, StorageError> {
        Ok(self
            .read_all()?
            .values()
            .map(ToString::to_string)
            .collect())
    }

    /// Append a memo unless its content duplicates an existing one.
    ///
    /// Duplicates (equal after removing all whitespace) are a silent no-op:
    /// no id is consumed and nothing is written. Otherwise the memo gets
    /// `max(existing ids) + 1` and the whole file is rewritten.
    pub fn append(
        &self,
        description: impl Into<String>,
        content: impl Into<String>,
    ) -> Result<AppendOutcome, StorageError> {
        let mut file = self.lock()?;
        let mut memos = read_memos(&mut file)?;

        let content = content.into();
        let normalized = strip_whitespace(&content);
        if let Some(existing) = memos.values().find(|m| m.normalized_content() == normalized) {
            debug!(existing_id = existing.id, "Duplicate memo content, skipping");
            return Ok(AppendOutcome::Duplicate {
                existing_id: existing.id,
            });
        }

        let id = next_id(&memos)?;
        let memo = Memo::new(id, description, content);
        memos.insert(id, memo.clone());

        write_memos(&mut file, &memos)?;
        info!(id, total = memos.len(), "Stored memo");

        Ok(AppendOutcome::Stored(memo))
    }

    /// Flush, sync and release the backing file.
    pub fn close(self) -> Result<(), StorageError> {
        let mut file = self.file.into_inner().map_err(|_| StorageError::Poisoned)?;
        file.flush()?;
        file.sync_all()?;
        debug!("Memo store closed at {:?}", self.path);
        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, File>, StorageError> {
        self.file.lock().map_err(|_| StorageError::Poisoned)
    }
}

/// Next id: one past the highest existing id, 1 for an empty set.
fn next_id(memos: &BTreeMap<u64, Memo>) -> Result<u64, StorageError> {
    match memos.keys().next_back() {
        None => Ok(1),
        Some(&max) => max.checked_add(1).ok_or(StorageError::IdExhausted(max)),
    }
}

/// Decode the whole file from the start.
fn read_memos(file: &mut File) -> Result<BTreeMap<u64, Memo>, StorageError> {
    file.seek(SeekFrom::Start(0))?;
    let mut raw = Vec::new();
    file.read_to_end(&mut raw)?;
    decode_memos(&raw)
}

/// Parse persisted bytes. Blank input and `null` are an empty set.
fn decode_memos(raw: &[u8]) -> Result<BTreeMap<u64, Memo>, StorageError> {
    if raw.iter().all(u8::is_ascii_whitespace) {
        return Ok(BTreeMap::new());
    }

    let memos: Option<Vec<Memo>> =
        serde_json::from_slice(raw).map_err(|e| StorageError::Decode(e.to_string()))?;

    Ok(memos
        .unwrap_or_default()
        .into_iter()
        .map(|memo| (memo.id, memo))
        .collect())
}

/// Truncate and rewrite the full set.
fn write_memos(file: &mut File, memos: &BTreeMap<u64, Memo>) -> Result<(), StorageError> {
    file.set_len(0)?;
    file.seek(SeekFrom::Start(0))?;

    let records: Vec<&Memo> = memos.values().collect();
    let mut writer = BufWriter::new(&mut *file);
    serde_json::to_writer_pretty(&mut writer, &records)
        .map_err(|e| StorageError::Encode(e.to_string()))?;
    writer.flush()?;
    Ok(())
}
