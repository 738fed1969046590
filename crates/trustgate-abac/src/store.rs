//! Typed record access over the ledger.
//!
//! Records are stored as flat JSON objects under namespaced keys.

use serde::Serialize;
use serde::de::DeserializeOwned;
use trustgate_ledger::{Key, Ledger, Namespace, Transaction};
use trustgate_types::{Device, Request, User};

use crate::error::{AbacError, RecordKind, Result};

/// A record type with a fixed namespace in the ledger.
pub(crate) trait Record: Serialize + DeserializeOwned {
    const NAMESPACE: Namespace;
    const KIND: RecordKind;
}

impl Record for User {
    const NAMESPACE: Namespace = Namespace::User;
    const KIND: RecordKind = RecordKind::User;
}

impl Record for Device {
    const NAMESPACE: Namespace = Namespace::Device;
    const KIND: RecordKind = RecordKind::Device;
}

impl Record for Request {
    const NAMESPACE: Namespace = Namespace::Request;
    const KIND: RecordKind = RecordKind::Request;
}

fn decode<T: Record>(id: &str, bytes: &[u8]) -> Result<T> {
    serde_json::from_slice(bytes).map_err(|e| AbacError::Codec {
        kind: T::KIND,
        id: id.to_string(),
        reason: e.to_string(),
    })
}

fn encode<T: Record>(id: &str, record: &T) -> Result<Vec<u8>> {
    serde_json::to_vec(record).map_err(|e| AbacError::Codec {
        kind: T::KIND,
        id: id.to_string(),
        reason: e.to_string(),
    })
}

/// Reads a record inside a transaction. The key joins the read set.
pub(crate) fn load<T: Record, L: Ledger + ?Sized>(
    tx: &mut Transaction<'_, L>,
    id: &str,
) -> Result<Option<T>> {
    tx.get(&Key::new(T::NAMESPACE, id))?
        .map(|bytes| decode(id, &bytes))
        .transpose()
}

/// Like [`load`], but a missing record is `NotFound`.
pub(crate) fn load_existing<T: Record, L: Ledger + ?Sized>(
    tx: &mut Transaction<'_, L>,
    id: &str,
) -> Result<T> {
    load(tx, id)?.ok_or_else(|| AbacError::not_found(T::KIND, id))
}

/// Stages a record write under its own id.
pub(crate) fn stage<T: Record, L: Ledger + ?Sized>(
    tx: &mut Transaction<'_, L>,
    id: &str,
    record: &T,
) -> Result<()> {
    tx.put(Key::new(T::NAMESPACE, id), encode(id, record)?);
    Ok(())
}

/// Point lookup outside a transaction.
pub(crate) fn get<T: Record, L: Ledger + ?Sized>(ledger: &L, id: &str) -> Result<Option<T>> {
    ledger
        .get(&Key::new(T::NAMESPACE, id))?
        .map(|versioned| decode(id, &versioned.value))
        .transpose()
}

/// Every record of one kind, ordered by id.
pub(crate) fn list<T: Record, L: Ledger + ?Sized>(ledger: &L) -> Result<Vec<(String, T)>> {
    ledger
        .scan_prefix(T::NAMESPACE.prefix())?
        .into_iter()
        .filter_map(|(key, versioned)| {
            key.id_in(T::NAMESPACE)
                .map(|id| decode(id, &versioned.value).map(|record| (id.to_string(), record)))
        })
        .collect()
}
