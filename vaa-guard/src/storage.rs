//! Persisted state: guardian sets, claim records and sequence trackers.
//!
//! Records live in namespaces carved out of a flat byte key space. A namespace is prefixed with
//! its length so that no two namespaces can produce the same key, and values are stored as JSON.

use std::collections::BTreeMap;

use parking_lot::Mutex;
use serde::{de::DeserializeOwned, Serialize};

use crate::{Error, Result};

pub static GUARDIAN_SET_KEY: &[u8] = b"guardian_set";
pub static CURRENT_GUARDIAN_SET_KEY: &[u8] = b"current_guardian_set";
pub static CLAIM_KEY: &[u8] = b"claim";
pub static SEQUENCE_KEY: &[u8] = b"sequence";

/// Durable key/value storage shared by every component.
///
/// Implementations must make `compare_and_swap` linearizable per key: two concurrent calls with
/// the same `expected` value can not both succeed. Replay protection and sequence allocation
/// depend on this.
pub trait Storage {
    fn get(&self, key: &[u8]) -> Option<Vec<u8>>;

    fn set(&self, key: &[u8], value: &[u8]);

    /// Stores `value` only if the current value equals `expected`, where `None` means the key is
    /// absent. Returns whether the write happened.
    fn compare_and_swap(&self, key: &[u8], expected: Option<&[u8]>, value: &[u8]) -> bool;

    /// Stores `value` only if `key` is absent. Returns whether the write happened.
    fn insert_if_absent(&self, key: &[u8], value: &[u8]) -> bool {
        self.compare_and_swap(key, None, value)
    }
}

impl<S: Storage + ?Sized> Storage for &S {
    fn get(&self, key: &[u8]) -> Option<Vec<u8>> {
        (**self).get(key)
    }

    fn set(&self, key: &[u8], value: &[u8]) {
        (**self).set(key, value)
    }

    fn compare_and_swap(&self, key: &[u8], expected: Option<&[u8]>, value: &[u8]) -> bool {
        (**self).compare_and_swap(key, expected, value)
    }

    fn insert_if_absent(&self, key: &[u8], value: &[u8]) -> bool {
        (**self).insert_if_absent(key, value)
    }
}

/// In-process storage. Safe to share between threads.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    data: Mutex<BTreeMap<Vec<u8>, Vec<u8>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.data.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.lock().is_empty()
    }
}

impl Storage for MemoryStorage {
    fn get(&self, key: &[u8]) -> Option<Vec<u8>> {
        self.data.lock().get(key).cloned()
    }

    fn set(&self, key: &[u8], value: &[u8]) {
        let _ = self.data.lock().insert(key.to_vec(), value.to_vec());
    }

    fn compare_and_swap(&self, key: &[u8], expected: Option<&[u8]>, value: &[u8]) -> bool {
        let mut data = self.data.lock();
        if data.get(key).map(Vec::as_slice) != expected {
            return false;
        }

        let _ = data.insert(key.to_vec(), value.to_vec());
        true
    }
}

/// Builds the key for `key` inside `namespace`.
pub fn namespaced(namespace: &[u8], key: &[u8]) -> Vec<u8> {
    // Namespaces are short static strings.
    let len = namespace.len() as u16;

    let mut out = Vec::with_capacity(2 + namespace.len() + key.len());
    out.extend_from_slice(&len.to_be_bytes());
    out.extend_from_slice(namespace);
    out.extend_from_slice(key);
    out
}

pub(crate) fn load<T: DeserializeOwned, S: Storage + ?Sized>(
    storage: &S,
    key: &[u8],
) -> Result<Option<T>> {
    decode(key, storage.get(key).as_deref())
}

pub(crate) fn decode<T: DeserializeOwned>(key: &[u8], raw: Option<&[u8]>) -> Result<Option<T>> {
    raw.map(|raw| {
        serde_json::from_slice(raw).map_err(|source| Error::CorruptRecord {
            key: hex::encode(key),
            source,
        })
    })
    .transpose()
}

pub(crate) fn to_vec<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    serde_json::to_vec(value).map_err(Error::from)
}
