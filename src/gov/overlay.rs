//! Key-value application state and its copy-on-write overlay.
//!
//! `KvState` is the state an approved action batch mutates. `StateOverlay`
//! stages those mutations: reads fall through to the base unless shadowed,
//! writes land in a private write set. The overlay is owned, never shared -
//! it is either consumed into a committed write set or dropped whole, so a
//! failed batch cannot leak partial mutations.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Deterministically ordered key-value application state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KvState {
    entries: BTreeMap<String, Vec<u8>>,
}

impl KvState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&[u8]> {
        self.entries.get(key).map(Vec::as_slice)
    }

    pub fn set(&mut self, key: impl Into<String>, value: Vec<u8>) {
        self.entries.insert(key.into(), value);
    }

    pub fn delete(&mut self, key: &str) {
        self.entries.remove(key);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Start a discardable overlay over this state.
    pub fn overlay(&self) -> StateOverlay<'_> {
        StateOverlay {
            base: self,
            writes: BTreeMap::new(),
        }
    }

    /// Apply a committed write set.
    pub fn commit(&mut self, writes: OverlayWrites) {
        for (key, value) in writes.0 {
            match value {
                Some(value) => {
                    self.entries.insert(key, value);
                }
                None => {
                    self.entries.remove(&key);
                }
            }
        }
    }
}

/// Write set of a fully executed overlay. `None` is a tombstone.
#[derive(Debug, Default)]
pub struct OverlayWrites(BTreeMap<String, Option<Vec<u8>>>);

impl OverlayWrites {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Copy-on-write view over a [`KvState`].
///
/// Consumed by value: [`StateOverlay::into_writes`] hands the staged
/// mutations to the caller for commit; dropping the overlay discards them.
#[derive(Debug)]
pub struct StateOverlay<'a> {
    base: &'a KvState,
    writes: BTreeMap<String, Option<Vec<u8>>>,
}

impl StateOverlay<'_> {
    pub fn get(&self, key: &str) -> Option<&[u8]> {
        match self.writes.get(key) {
            Some(Some(value)) => Some(value.as_slice()),
            Some(None) => None,
            None => self.base.get(key),
        }
    }

    pub fn set(&mut self, key: impl Into<String>, value: Vec<u8>) {
        self.writes.insert(key.into(), Some(value));
    }

    pub fn delete(&mut self, key: impl Into<String>) {
        self.writes.insert(key.into(), None);
    }

    pub fn into_writes(self) -> OverlayWrites {
        OverlayWrites(self.writes)
    }
}
