//! Write batches: the unit of atomic commit.

use bytes::Bytes;

use crate::{Key, Version};

/// A single write in a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOp {
    Put { key: Key, value: Bytes },
}

impl WriteOp {
    pub fn key(&self) -> &Key {
        match self {
            Self::Put { key, .. } => key,
        }
    }
}

/// Writes plus the read set they depend on.
///
/// `reads` pairs each key with the version observed when it was read (`None`
/// if the key was absent). Commit fails if any of them no longer holds.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteBatch {
    reads: Vec<(Key, Option<Version>)>,
    ops: Vec<WriteOp>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a put (builder pattern).
    pub fn put(mut self, key: Key, value: impl Into<Bytes>) -> Self {
        self.ops.push(WriteOp::Put {
            key,
            value: value.into(),
        });
        self
    }

    /// Requires `key` to still be at `version` when the batch commits.
    pub fn expect(mut self, key: Key, version: Option<Version>) -> Self {
        self.reads.push((key, version));
        self
    }

    pub fn reads(&self) -> &[(Key, Option<Version>)] {
        &self.reads
    }

    pub fn ops(&self) -> &[WriteOp] {
        &self.ops
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub(crate) fn into_ops(self) -> Vec<WriteOp> {
        self.ops
    }
}
