//! The registry of created citizen IDs.
//!
//! A single JSON document under [`REGISTRY_KEY`] lists every `personid` in creation order.
//! Updates are load-append-save inside the caller's transaction, so two concurrent
//! registrations both read the same document version and the ledger rejects whichever
//! commits second.

use crate::constants::REGISTRY_KEY;
use crate::ledger::Ledger;
use crate::store::RecordStore;
use crate::{CitizenError, CitizenResult};
use serde::{Deserialize, Deserializer, Serialize};

/// Stored form of the registry.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IdIndex {
    #[serde(deserialize_with = "null_as_empty")]
    pub ids: Vec<String>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Registry operations. Zero-sized; state lives in the ledger.
pub struct Registry;

impl Registry {
    /// Writes an empty index if none exists yet. An existing index is left untouched, so
    /// bootstrapping a populated ledger again keeps every registered ID.
    pub fn initialise<L: Ledger + ?Sized>(store: &mut RecordStore<'_, L>) -> CitizenResult<()> {
        if store.exists(REGISTRY_KEY)? {
            return Ok(());
        }
        store.save_document(REGISTRY_KEY, &IdIndex::default())
    }

    /// Appends `person_id` to the index.
    ///
    /// # Errors
    ///
    /// Returns [`CitizenError::DuplicateId`] if the ID is already registered, or
    /// [`CitizenError::CorruptRecord`] if the index does not decode.
    pub fn register<L: Ledger + ?Sized>(
        store: &mut RecordStore<'_, L>,
        person_id: &str,
    ) -> CitizenResult<()> {
        let mut index = Self::load(store)?;
        if index.ids.iter().any(|id| id == person_id) {
            return Err(CitizenError::DuplicateId(person_id.to_string()));
        }
        index.ids.push(person_id.to_string());
        store.save_document(REGISTRY_KEY, &index)
    }

    /// Registered IDs in creation order. A missing index reads as empty.
    pub fn list<L: Ledger + ?Sized>(store: &mut RecordStore<'_, L>) -> CitizenResult<Vec<String>> {
        Ok(Self::load(store)?.ids)
    }

    fn load<L: Ledger + ?Sized>(store: &mut RecordStore<'_, L>) -> CitizenResult<IdIndex> {
        Ok(store.load_document(REGISTRY_KEY)?.unwrap_or_default())
    }
}
