//! File-backed ledger: an append-only JSON-lines journal of committed batches.
//!
//! # File Layout
//!
//! ```text
//! {path}
//! {"version":1,"ops":[{"key":"user/User0","value":"eyJ1aWQiOi..."}]}
//! {"version":2,"ops":[{"key":"request/R1","value":"eyJ0eXBlIj..."}]}
//! ```
//!
//! Values are base64-encoded. On open the journal is replayed into memory.
//! A trailing line that fails to parse is a torn write from a crash and is
//! truncated away; a malformed line anywhere else is reported as corruption.
//!
//! **Invariants:**
//! 1. One committed batch per line
//! 2. Versions are strictly increasing along the file
//! 3. A batch is on disk (fsync, unless disabled) before it becomes visible
//! 4. A failed append is cut back off the file before the error is returned

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::batch::{WriteBatch, WriteOp};
use crate::memory::LedgerState;
use crate::{Key, Ledger, LedgerError, Result, Version, Versioned};

#[derive(Debug, Serialize, Deserialize)]
struct JournalEntry {
    version: Version,
    ops: Vec<JournalOp>,
}

#[derive(Debug, Serialize, Deserialize)]
struct JournalOp {
    key: Key,
    value: String,
}

#[derive(Debug)]
struct Inner {
    state: LedgerState,
    file: File,
    /// Length of the journal covered by `state`.
    len: u64,
    /// Set when a failed append could not be cut back off the file.
    broken: bool,
    #[cfg(test)]
    torn_append: Option<usize>,
}

/// Durable ledger persisted to a single journal file.
#[derive(Debug)]
pub struct FileLedger {
    path: PathBuf,
    fsync: bool,
    inner: RwLock<Inner>,
}

impl FileLedger {
    /// Opens (or creates) the journal at `path` and replays it.
    ///
    /// Parent directories are created as needed.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|source| LedgerError::Io {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }

        let (state, valid_len) = if path.exists() {
            replay(&path)?
        } else {
            (LedgerState::default(), 0)
        };

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|source| LedgerError::Io {
                path: path.clone(),
                source,
            })?;

        let on_disk = file
            .metadata()
            .map_err(|source| LedgerError::Io {
                path: path.clone(),
                source,
            })?
            .len();
        if on_disk > valid_len {
            tracing::warn!(
                path = %path.display(),
                dropped_bytes = on_disk - valid_len,
                "truncating torn journal tail"
            );
            file.set_len(valid_len).map_err(|source| LedgerError::Io {
                path: path.clone(),
                source,
            })?;
        }

        tracing::debug!(path = %path.display(), version = %state.version(), "journal replayed");

        Ok(Self {
            path,
            fsync: true,
            inner: RwLock::new(Inner {
                state,
                file,
                len: valid_len,
                broken: false,
                #[cfg(test)]
                torn_append: None,
            }),
        })
    }

    /// Disables fsync after each commit (for tests and scratch ledgers).
    pub fn without_fsync(mut self) -> Self {
        self.fsync = false;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> LedgerError {
        LedgerError::Io {
            path: self.path.clone(),
            source,
        }
    }

    /// Makes the next append write only the first `keep` bytes and then fail.
    #[cfg(test)]
    pub(crate) fn tear_next_append(&self, keep: usize) {
        if let Ok(mut inner) = self.inner.write() {
            inner.torn_append = Some(keep);
        }
    }

    fn append(&self, inner: &mut Inner, record: &[u8]) -> std::io::Result<()> {
        #[cfg(test)]
        {
            if let Some(keep) = inner.torn_append.take() {
                inner.file.write_all(&record[..keep.min(record.len())])?;
                return Err(std::io::Error::other("write interrupted"));
            }
        }

        inner.file.write_all(record)?;
        if self.fsync {
            inner.file.sync_all()?;
        }
        Ok(())
    }
}

/// Rebuilds state from the journal. Returns the state and the byte length of
/// the valid prefix of the file.
///
/// Lines are parsed as bytes so a tail torn inside a multi-byte character is
/// still treated as a torn tail.
fn replay(path: &Path) -> Result<(LedgerState, u64)> {
    let contents = std::fs::read(path).map_err(|source| LedgerError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let mut state = LedgerState::default();
    let mut valid_len = 0u64;
    let lines: Vec<&[u8]> = contents.split_inclusive(|b| *b == b'\n').collect();
    let last = lines.len().saturating_sub(1);

    for (idx, raw) in lines.iter().enumerate() {
        let line = raw.trim_ascii_end();
        if line.is_empty() {
            valid_len += raw.len() as u64;
            continue;
        }

        let complete = raw.ends_with(b"\n");
        let parsed = serde_json::from_slice::<JournalEntry>(line)
            .map_err(|e| e.to_string())
            .and_then(|entry| decode_entry(entry, state.version()));

        match parsed {
            Ok((version, ops)) if complete => {
                state.apply(version, ops);
                valid_len += raw.len() as u64;
            }
            Err(reason) if idx != last => {
                return Err(LedgerError::Journal {
                    path: path.to_path_buf(),
                    line: idx + 1,
                    reason,
                });
            }
            // Torn tail: the entry was never acknowledged to a caller.
            _ => break,
        }
    }

    Ok((state, valid_len))
}

fn decode_entry(
    entry: JournalEntry,
    current: Version,
) -> std::result::Result<(Version, Vec<WriteOp>), String> {
    if entry.version <= current {
        return Err(format!(
            "version {} does not follow {}",
            entry.version, current
        ));
    }
    let ops = entry
        .ops
        .into_iter()
        .map(|op| {
            STANDARD
                .decode(op.value.as_bytes())
                .map(|value| WriteOp::Put {
                    key: op.key,
                    value: Bytes::from(value),
                })
                .map_err(|e| format!("invalid base64 value: {e}"))
        })
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok((entry.version, ops))
}

impl Ledger for FileLedger {
    fn get(&self, key: &Key) -> Result<Option<Versioned>> {
        let inner = self.inner.read().map_err(|_| LedgerError::Poisoned)?;
        Ok(inner.state.get(key))
    }

    fn scan_prefix(&self, prefix: &str) -> Result<Vec<(Key, Versioned)>> {
        let inner = self.inner.read().map_err(|_| LedgerError::Poisoned)?;
        Ok(inner.state.scan_prefix(prefix))
    }

    fn commit(&self, batch: WriteBatch) -> Result<Version> {
        let mut inner = self.inner.write().map_err(|_| LedgerError::Poisoned)?;
        if inner.broken {
            return Err(LedgerError::Broken {
                path: self.path.clone(),
            });
        }
        inner.state.validate(&batch)?;

        if batch.is_empty() {
            return Ok(inner.state.version());
        }

        let version = inner.state.version().next();
        let entry = JournalEntry {
            version,
            ops: batch
                .ops()
                .iter()
                .map(|op| match op {
                    WriteOp::Put { key, value } => JournalOp {
                        key: key.clone(),
                        value: STANDARD.encode(value),
                    },
                })
                .collect(),
        };
        let mut record = serde_json::to_vec(&entry).map_err(|e| LedgerError::Journal {
            path: self.path.clone(),
            line: 0,
            reason: format!("failed to encode batch: {e}"),
        })?;
        record.push(b'\n');

        // Durable first, visible second.
        if let Err(source) = self.append(&mut inner, &record) {
            let committed_len = inner.len;
            if let Err(truncate) = inner.file.set_len(committed_len) {
                tracing::error!(
                    path = %self.path.display(),
                    error = %truncate,
                    "failed to cut back partial journal append"
                );
                inner.broken = true;
            } else {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %source,
                    "journal append failed; partial entry removed"
                );
            }
            return Err(self.io_error(source));
        }
        inner.len += record.len() as u64;

        let writes = batch.ops().len();
        inner.state.apply(version, batch.into_ops());
        tracing::debug!(%version, writes, path = %self.path.display(), "ledger batch committed");
        Ok(version)
    }

    fn version(&self) -> Result<Version> {
        let inner = self.inner.read().map_err(|_| LedgerError::Poisoned)?;
        Ok(inner.state.version())
    }
}
