//! Error type for engine, adjuster, and registry operations.

use std::fmt::Display;

use thiserror::Error;
use trustgate_ledger::LedgerError;
use trustgate_types::ParseError;

use crate::registry::AdminOperation;

/// Kind of record a lookup targeted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    User,
    Device,
    Request,
}

impl Display for RecordKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::User => "user",
            Self::Device => "device",
            Self::Request => "request",
        })
    }
}

#[derive(Debug, Error)]
pub enum AbacError {
    /// Request type is neither U2D nor D2D. Nothing is persisted.
    #[error("invalid request type '{0}': expected U2D or D2D")]
    InvalidRequestType(String),

    /// A referenced record does not exist.
    #[error("{kind} '{id}' not found")]
    NotFound { kind: RecordKind, id: String },

    /// The authorizer rejected an attribute-management operation.
    #[error("caller '{caller}' is not authorized to {operation}")]
    AuthorizationDenied {
        caller: String,
        operation: AdminOperation,
    },

    /// Registering an id that is already taken.
    #[error("{kind} '{id}' already exists")]
    AlreadyExists { kind: RecordKind, id: String },

    /// Seeding was attempted on a ledger that already holds users.
    #[error("ledger already initialized with {users} user(s)")]
    AlreadyInitialized { users: usize },

    /// Trust level outside `0..=100`.
    #[error("trust level {0} out of range (0..=100)")]
    InvalidTrustLevel(i64),

    /// An attribute value failed validation.
    #[error("invalid attribute: {0}")]
    InvalidAttribute(ParseError),

    /// Stored bytes do not decode as the expected record.
    #[error("failed to decode {kind} '{id}': {reason}")]
    Codec {
        kind: RecordKind,
        id: String,
        reason: String,
    },

    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

impl From<ParseError> for AbacError {
    fn from(err: ParseError) -> Self {
        match err {
            ParseError::RequestType(value) => Self::InvalidRequestType(value),
            ParseError::TrustLevel(value) => Self::InvalidTrustLevel(value),
            other => Self::InvalidAttribute(other),
        }
    }
}

impl AbacError {
    pub(crate) fn not_found(kind: RecordKind, id: impl Display) -> Self {
        Self::NotFound {
            kind,
            id: id.to_string(),
        }
    }

    /// True for the `NotFound` condition of any record kind.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Result type for ABAC operations.
pub type Result<T> = std::result::Result<T, AbacError>;
