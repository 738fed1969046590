//! # trustgate-ledger: Versioned key-value ledger for `trustgate`
//!
//! The ledger is the only place state lives. The decision engine and the trust
//! adjuster stage their reads and writes in a [`Transaction`]; the ledger
//! commits each transaction atomically or not at all.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────┐
//! │  Transaction                 │
//! │  ├─ get(key)  → read set     │
//! │  └─ put(key)  → write set    │
//! └──────────────┬───────────────┘
//!                │ WriteBatch
//!                ▼
//! ┌──────────────────────────────┐
//! │  Ledger::commit              │
//! │  ├─ validate read versions   │
//! │  ├─ journal (file backend)   │
//! │  └─ apply, bump version      │
//! └──────────────────────────────┘
//! ```
//!
//! ## Backends
//!
//! - [`MemoryLedger`]: ephemeral, for tests and one-shot evaluation.
//! - [`FileLedger`]: JSON-lines journal of committed batches, replayed on open.
//!
//! Commits use optimistic concurrency: every key read through a transaction is
//! recorded with the version observed, and the commit is rejected with
//! [`LedgerError::Conflict`] if any of those keys has changed since. The ledger
//! never retries; re-submission is the caller's responsibility.
//!
//! ## Example
//!
//! ```
//! use trustgate_ledger::{Key, Ledger, MemoryLedger, Namespace, Transaction};
//!
//! let ledger = MemoryLedger::new();
//! let key = Key::new(Namespace::User, "User0");
//!
//! let mut tx = Transaction::begin(&ledger);
//! assert!(tx.get(&key).unwrap().is_none());
//! tx.put(key.clone(), b"{}".to_vec());
//! tx.commit().unwrap();
//!
//! assert!(ledger.get(&key).unwrap().is_some());
//! ```

use std::fmt::{Debug, Display};
use std::sync::Arc;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

mod batch;
mod error;
mod file;
mod memory;
mod transaction;

pub use batch::{WriteBatch, WriteOp};
pub use error::{LedgerError, Result};
pub use file::FileLedger;
pub use memory::MemoryLedger;
pub use transaction::Transaction;

// ============================================================================
// Keys
// ============================================================================

/// Record families stored in the ledger. Each family owns a key prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Namespace {
    User,
    Device,
    Request,
}

impl Namespace {
    /// Key prefix for this family, including the trailing separator.
    pub fn prefix(self) -> &'static str {
        match self {
            Self::User => "user/",
            Self::Device => "device/",
            Self::Request => "request/",
        }
    }
}

/// A namespaced ledger key (`user/User0`, `request/R17`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Key(String);

impl Key {
    pub fn new(namespace: Namespace, id: &str) -> Self {
        Self(format!("{}{id}", namespace.prefix()))
    }

    /// Wraps an already-namespaced key (as read back from a journal or scan).
    pub fn from_raw(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The id portion after the namespace prefix, if the key is in `namespace`.
    pub fn id_in(&self, namespace: Namespace) -> Option<&str> {
        self.0.strip_prefix(namespace.prefix())
    }
}

impl Display for Key {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// Versions
// ============================================================================

/// Commit sequence number. Every committed batch gets the next version, and
/// every value remembers the version of the commit that wrote it.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub struct Version(u64);

impl Version {
    /// Version of an empty ledger.
    pub const ZERO: Version = Version(0);

    pub fn new(v: u64) -> Self {
        Self(v)
    }

    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "v{}", self.0)
    }
}

/// A stored value together with the version that wrote it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Versioned {
    pub value: Bytes,
    pub version: Version,
}

// ============================================================================
// Ledger trait
// ============================================================================

/// Versioned key-value storage with atomic batch commits.
///
/// Implementations serialize commits internally; readers never observe a
/// partially applied batch.
pub trait Ledger: Send + Sync + Debug {
    /// Point read of the latest committed value.
    fn get(&self, key: &Key) -> Result<Option<Versioned>>;

    /// All committed entries whose key starts with `prefix`, in key order.
    fn scan_prefix(&self, prefix: &str) -> Result<Vec<(Key, Versioned)>>;

    /// Atomically validates the batch's read set and applies its writes.
    ///
    /// # Errors
    ///
    /// * [`LedgerError::Conflict`] - a key in the read set changed since it was read
    /// * [`LedgerError::Io`] / [`LedgerError::Journal`] - the batch could not be made durable
    fn commit(&self, batch: WriteBatch) -> Result<Version>;

    /// Version of the most recent commit.
    fn version(&self) -> Result<Version>;
}

impl<L: Ledger + ?Sized> Ledger for Arc<L> {
    fn get(&self, key: &Key) -> Result<Option<Versioned>> {
        (**self).get(key)
    }

    fn scan_prefix(&self, prefix: &str) -> Result<Vec<(Key, Versioned)>> {
        (**self).scan_prefix(prefix)
    }

    fn commit(&self, batch: WriteBatch) -> Result<Version> {
        (**self).commit(batch)
    }

    fn version(&self) -> Result<Version> {
        (**self).version()
    }
}

impl<L: Ledger + ?Sized> Ledger for Box<L> {
    fn get(&self, key: &Key) -> Result<Option<Versioned>> {
        (**self).get(key)
    }

    fn scan_prefix(&self, prefix: &str) -> Result<Vec<(Key, Versioned)>> {
        (**self).scan_prefix(prefix)
    }

    fn commit(&self, batch: WriteBatch) -> Result<Version> {
        (**self).commit(batch)
    }

    fn version(&self) -> Result<Version> {
        (**self).version()
    }
}
