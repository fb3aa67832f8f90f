//! Ledger collaborator contract and an in-memory reference ledger.
//!
//! The core only ever talks to the [`Ledger`] trait: `get_state`, `put_state` and
//! `caller_attribute`. Ordering, durability and conflict detection belong to whoever
//! implements it.
//!
//! [`InMemoryLedger`] is the reference implementation used by the hosts and the tests. It
//! models the execute/validate/commit cycle of a permissioned ledger:
//!
//! - every key carries a version that is bumped on each committed write;
//! - a [`Transaction`] records the version of every key it reads (its read set) and
//!   buffers every write (its write set), serving its own writes back on later reads;
//! - [`Transaction::commit`] re-checks the whole read set under the world-state lock and
//!   rejects the transaction with [`LedgerError::Conflict`] if any key moved underneath it.
//!
//! Correctness of the registry depends on this: two `create` calls both read and rewrite
//! the `entity-index` document, and the one that commits second must be told so instead of
//! silently overwriting the first.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

/// Errors raised by a ledger implementation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    #[error("attribute '{0}' is not present in the caller attestation")]
    AttributeMissing(String),
    #[error("transaction conflict on key {key}: the value read is no longer current")]
    Conflict { key: String },
    #[error("ledger state unavailable: {0}")]
    Unavailable(String),
    #[error("invalid ledger snapshot: {0}")]
    Snapshot(String),
}

/// The operations the core consumes from its hosting ledger.
pub trait Ledger {
    /// Reads the value stored at `key`, or `None` if the key has never been written.
    fn get_state(&mut self, key: &str) -> Result<Option<Vec<u8>>, LedgerError>;

    /// Replaces the value stored at `key`.
    fn put_state(&mut self, key: &str, value: Vec<u8>) -> Result<(), LedgerError>;

    /// Reads an attribute from the caller's attested identity.
    fn caller_attribute(&self, name: &str) -> Result<String, LedgerError>;
}

/// Attributes attested for the caller of one invocation.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CallerAttributes(BTreeMap<String, String>);

impl CallerAttributes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.0.insert(name.into(), value.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }
}

// ============================================================================
// WORLD STATE
// ============================================================================

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
struct VersionedValue {
    version: u64,
    #[serde(with = "base64_bytes")]
    value: Vec<u8>,
}

/// Serialisable copy of a ledger's world state.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Snapshot {
    entries: BTreeMap<String, VersionedValue>,
}

impl Snapshot {
    /// Reads a snapshot from a JSON file; a missing file yields an empty snapshot.
    pub fn read_from(path: &Path) -> Result<Self, LedgerError> {
        match std::fs::read(path) {
            Ok(bytes) => serde_json::from_slice(&bytes)
                .map_err(|e| LedgerError::Snapshot(format!("{}: {e}", path.display()))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(LedgerError::Snapshot(format!("{}: {e}", path.display()))),
        }
    }

    /// Writes the snapshot to `path` as pretty-printed JSON.
    pub fn write_to(&self, path: &Path) -> Result<(), LedgerError> {
        let json = serde_json::to_vec_pretty(self)
            .map_err(|e| LedgerError::Snapshot(e.to_string()))?;
        std::fs::write(path, json)
            .map_err(|e| LedgerError::Snapshot(format!("{}: {e}", path.display())))
    }

    /// Keys currently present, in lexical order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

mod base64_bytes {
    use super::*;
    use base64::{engine::general_purpose, Engine as _};

    pub fn serialize<S, T>(value: &T, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
        T: AsRef<[u8]>,
    {
        serializer.serialize_str(&general_purpose::STANDARD.encode(value.as_ref()))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<u8>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let encoded = String::deserialize(deserializer)?;
        general_purpose::STANDARD
            .decode(encoded)
            .map_err(serde::de::Error::custom)
    }
}

// ============================================================================
// IN-MEMORY LEDGER
// ============================================================================

/// Shared, versioned key-value world state.
///
/// Cloning is cheap and every clone observes the same state.
#[derive(Clone, Debug, Default)]
pub struct InMemoryLedger {
    state: Arc<Mutex<Snapshot>>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_snapshot(snapshot: Snapshot) -> Self {
        Self {
            state: Arc::new(Mutex::new(snapshot)),
        }
    }

    /// Copies the current world state.
    pub fn snapshot(&self) -> Result<Snapshot, LedgerError> {
        Ok(self.lock()?.clone())
    }

    /// Opens a transaction on behalf of `caller`.
    pub fn begin(&self, caller: CallerAttributes) -> Transaction {
        Transaction {
            ledger: self.clone(),
            caller,
            read_set: BTreeMap::new(),
            write_set: BTreeMap::new(),
        }
    }

    /// Runs `op` in a fresh transaction and commits it.
    ///
    /// If the commit fails with [`LedgerError::Conflict`] the whole invocation is re-run on
    /// a new transaction, up to `max_retries` extra times. An error returned by `op` aborts
    /// immediately and nothing is written.
    pub fn execute<T, E, F>(
        &self,
        caller: &CallerAttributes,
        max_retries: u32,
        mut op: F,
    ) -> Result<T, E>
    where
        F: FnMut(&mut Transaction) -> Result<T, E>,
        E: From<LedgerError>,
    {
        let mut attempt = 0;
        loop {
            let mut tx = self.begin(caller.clone());
            let output = op(&mut tx)?;
            match tx.commit() {
                Ok(_) => return Ok(output),
                Err(LedgerError::Conflict { key }) if attempt < max_retries => {
                    attempt += 1;
                    tracing::warn!(%key, attempt, "commit conflicted, re-running invocation");
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Runs `op` in a transaction that is discarded afterwards.
    pub fn query<T, E, F>(&self, caller: &CallerAttributes, op: F) -> Result<T, E>
    where
        F: FnOnce(&mut Transaction) -> Result<T, E>,
    {
        let mut tx = self.begin(caller.clone());
        op(&mut tx)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Snapshot>, LedgerError> {
        self.state
            .lock()
            .map_err(|_| LedgerError::Unavailable("world state lock poisoned".into()))
    }

    fn read_versioned(&self, key: &str) -> Result<Option<(u64, Vec<u8>)>, LedgerError> {
        Ok(self
            .lock()?
            .entries
            .get(key)
            .map(|v| (v.version, v.value.clone())))
    }
}

/// One unit of work against an [`InMemoryLedger`].
#[derive(Debug)]
pub struct Transaction {
    ledger: InMemoryLedger,
    caller: CallerAttributes,
    read_set: BTreeMap<String, Option<u64>>,
    write_set: BTreeMap<String, Vec<u8>>,
}

impl Transaction {
    /// Writes buffered so far, keyed by ledger key.
    pub fn write_set(&self) -> &BTreeMap<String, Vec<u8>> {
        &self.write_set
    }

    /// Validates the read set and applies the write set atomically.
    ///
    /// Returns the number of keys written.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Conflict`] naming the first key whose version changed since
    /// this transaction read it; in that case nothing is applied.
    pub fn commit(self) -> Result<usize, LedgerError> {
        let mut state = self.ledger.lock()?;

        for (key, seen) in &self.read_set {
            let current = state.entries.get(key).map(|v| v.version);
            if current != *seen {
                return Err(LedgerError::Conflict { key: key.clone() });
            }
        }

        let written = self.write_set.len();
        for (key, value) in self.write_set {
            let version = state.entries.get(&key).map_or(1, |v| v.version + 1);
            state
                .entries
                .insert(key, VersionedValue { version, value });
        }
        Ok(written)
    }
}

impl Ledger for Transaction {
    fn get_state(&mut self, key: &str) -> Result<Option<Vec<u8>>, LedgerError> {
        if let Some(pending) = self.write_set.get(key) {
            return Ok(Some(pending.clone()));
        }
        let found = self.ledger.read_versioned(key)?;
        let version = found.as_ref().map(|(v, _)| *v);
        self.read_set.entry(key.to_string()).or_insert(version);
        Ok(found.map(|(_, value)| value))
    }

    fn put_state(&mut self, key: &str, value: Vec<u8>) -> Result<(), LedgerError> {
        self.write_set.insert(key.to_string(), value);
        Ok(())
    }

    fn caller_attribute(&self, name: &str) -> Result<String, LedgerError> {
        self.caller
            .get(name)
            .map(str::to_string)
            .ok_or_else(|| LedgerError::AttributeMissing(name.to_string()))
    }
}
