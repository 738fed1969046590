//! In-memory ledger backend and the commit logic shared with the file backend.

use std::collections::BTreeMap;
use std::sync::RwLock;

use crate::batch::{WriteBatch, WriteOp};
use crate::{Key, Ledger, LedgerError, Result, Version, Versioned};

/// Committed state: latest value per key plus the ledger version.
#[derive(Debug, Default)]
pub(crate) struct LedgerState {
    entries: BTreeMap<Key, Versioned>,
    version: Version,
}

impl LedgerState {
    pub(crate) fn get(&self, key: &Key) -> Option<Versioned> {
        self.entries.get(key).cloned()
    }

    pub(crate) fn scan_prefix(&self, prefix: &str) -> Vec<(Key, Versioned)> {
        self.entries
            .range(Key::from_raw(prefix)..)
            .take_while(|(k, _)| k.as_str().starts_with(prefix))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    pub(crate) fn version(&self) -> Version {
        self.version
    }

    /// Checks every read-set entry against the current versions.
    pub(crate) fn validate(&self, batch: &WriteBatch) -> Result<()> {
        for (key, expected) in batch.reads() {
            let actual = self.entries.get(key).map(|v| v.version);
            if actual != *expected {
                return Err(LedgerError::Conflict {
                    key: key.clone(),
                    expected: *expected,
                    actual,
                });
            }
        }
        Ok(())
    }

    /// Applies writes as `version`. Callers validate first.
    pub(crate) fn apply(&mut self, version: Version, ops: Vec<WriteOp>) {
        debug_assert!(version > self.version, "versions must increase");
        for op in ops {
            match op {
                WriteOp::Put { key, value } => {
                    self.entries.insert(key, Versioned { value, version });
                }
            }
        }
        self.version = version;
    }
}

/// Ephemeral ledger held entirely in memory.
#[derive(Debug, Default)]
pub struct MemoryLedger {
    state: RwLock<LedgerState>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Ledger for MemoryLedger {
    fn get(&self, key: &Key) -> Result<Option<Versioned>> {
        let state = self.state.read().map_err(|_| LedgerError::Poisoned)?;
        Ok(state.get(key))
    }

    fn scan_prefix(&self, prefix: &str) -> Result<Vec<(Key, Versioned)>> {
        let state = self.state.read().map_err(|_| LedgerError::Poisoned)?;
        Ok(state.scan_prefix(prefix))
    }

    fn commit(&self, batch: WriteBatch) -> Result<Version> {
        let mut state = self.state.write().map_err(|_| LedgerError::Poisoned)?;
        state.validate(&batch)?;

        if batch.is_empty() {
            return Ok(state.version());
        }

        let version = state.version().next();
        let writes = batch.ops().len();
        state.apply(version, batch.into_ops());
        tracing::debug!(%version, writes, "ledger batch committed");
        Ok(version)
    }

    fn version(&self) -> Result<Version> {
        let state = self.state.read().map_err(|_| LedgerError::Poisoned)?;
        Ok(state.version())
    }
}
