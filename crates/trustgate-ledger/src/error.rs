//! Ledger error types.

use std::path::PathBuf;

use thiserror::Error;

use crate::{Key, Version};

#[derive(Debug, Error)]
pub enum LedgerError {
    /// A key read by the transaction was changed by another commit.
    #[error("write conflict on {key}: read at {expected:?}, now at {actual:?}")]
    Conflict {
        key: Key,
        expected: Option<Version>,
        actual: Option<Version>,
    },

    /// The journal file could not be read or written.
    #[error("journal I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// A journal entry is malformed and is not the trailing (torn) entry.
    #[error("corrupt journal entry at {path} line {line}: {reason}")]
    Journal {
        path: PathBuf,
        line: usize,
        reason: String,
    },

    /// A failed append left bytes in the journal that could not be removed.
    /// Reopening the ledger truncates them as a torn tail.
    #[error("journal at {path} has a partial entry; reopen the ledger")]
    Broken { path: PathBuf },

    /// Another thread panicked while holding the ledger lock.
    #[error("ledger lock poisoned")]
    Poisoned,
}

/// Result type for ledger operations.
pub type Result<T> = std::result::Result<T, LedgerError>;
