//! Read-tracking transactions over a [`Ledger`].

use std::collections::BTreeMap;

use bytes::Bytes;

use crate::{Key, Ledger, Result, Version, WriteBatch};

/// Stages reads and writes against a ledger and commits them as one batch.
///
/// Reads see the transaction's own pending writes. Every key read from the
/// ledger joins the read set, so the commit fails if another writer touched
/// it in between. Dropping a transaction without committing discards it.
#[derive(Debug)]
pub struct Transaction<'a, L: Ledger + ?Sized> {
    ledger: &'a L,
    reads: BTreeMap<Key, Option<Version>>,
    writes: BTreeMap<Key, Bytes>,
}

impl<'a, L: Ledger + ?Sized> Transaction<'a, L> {
    pub fn begin(ledger: &'a L) -> Self {
        Self {
            ledger,
            reads: BTreeMap::new(),
            writes: BTreeMap::new(),
        }
    }

    /// Reads a key, preferring a value staged by this transaction.
    pub fn get(&mut self, key: &Key) -> Result<Option<Bytes>> {
        if let Some(pending) = self.writes.get(key) {
            return Ok(Some(pending.clone()));
        }

        let found = self.ledger.get(key)?;
        // First observation wins; re-reading must not mask a concurrent change.
        self.reads
            .entry(key.clone())
            .or_insert(found.as_ref().map(|v| v.version));
        Ok(found.map(|v| v.value))
    }

    /// Stages a write. Later puts to the same key replace earlier ones.
    pub fn put(&mut self, key: Key, value: impl Into<Bytes>) {
        self.writes.insert(key, value.into());
    }

    pub fn has_writes(&self) -> bool {
        !self.writes.is_empty()
    }

    /// Commits the staged writes, validated against the read set.
    pub fn commit(self) -> Result<Version> {
        let mut batch = WriteBatch::new();
        for (key, version) in self.reads {
            batch = batch.expect(key, version);
        }
        for (key, value) in self.writes {
            batch = batch.put(key, value);
        }
        self.ledger.commit(batch)
    }
}
