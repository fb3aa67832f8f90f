//! JSON document storage over a [`Ledger`].
//!
//! This is the only place bytes from the ledger are decoded or encoded. Everything above it
//! works with typed documents.

use crate::ledger::Ledger;
use crate::model::{Citizen, SubRecord};
use crate::{CitizenError, CitizenResult};
use serde::de::DeserializeOwned;
use serde::Serialize;

pub struct RecordStore<'a, L: Ledger + ?Sized> {
    ledger: &'a mut L,
}

impl<'a, L: Ledger + ?Sized> RecordStore<'a, L> {
    pub fn new(ledger: &'a mut L) -> Self {
        Self { ledger }
    }

    /// Raw bytes at `key`.
    ///
    /// # Errors
    ///
    /// Returns [`CitizenError::NotFound`] if nothing was ever written at `key`.
    pub fn get(&mut self, key: &str) -> CitizenResult<Vec<u8>> {
        self.try_get(key)?
            .ok_or_else(|| CitizenError::NotFound(key.to_string()))
    }

    pub fn try_get(&mut self, key: &str) -> CitizenResult<Option<Vec<u8>>> {
        Ok(self.ledger.get_state(key)?)
    }

    pub fn put(&mut self, key: &str, value: Vec<u8>) -> CitizenResult<()> {
        Ok(self.ledger.put_state(key, value)?)
    }

    /// `true` if any bytes are stored at `key`, decodable or not.
    pub fn exists(&mut self, key: &str) -> CitizenResult<bool> {
        Ok(self.try_get(key)?.is_some())
    }

    /// Decodes the JSON document at `key`, or `None` if the key is empty.
    pub fn load_document<T: DeserializeOwned>(&mut self, key: &str) -> CitizenResult<Option<T>> {
        match self.try_get(key)? {
            None => Ok(None),
            Some(bytes) => serde_json::from_slice(&bytes)
                .map(Some)
                .map_err(|source| CitizenError::CorruptRecord {
                    key: key.to_string(),
                    source,
                }),
        }
    }

    pub fn save_document<T: Serialize>(&mut self, key: &str, document: &T) -> CitizenResult<()> {
        let bytes = serde_json::to_vec(document).map_err(|source| CitizenError::Serialization {
            key: key.to_string(),
            source,
        })?;
        self.put(key, bytes)
    }

    /// Loads the citizen stored under `person_id`.
    ///
    /// # Errors
    ///
    /// - [`CitizenError::NotFound`] if no document exists at the key
    /// - [`CitizenError::CorruptRecord`] if the document does not decode
    /// - [`CitizenError::KeyMismatch`] if the stored `personid` differs from the key
    pub fn load_entity<R: SubRecord>(&mut self, person_id: &str) -> CitizenResult<Citizen<R>> {
        let citizen: Citizen<R> = self
            .load_document(person_id)?
            .ok_or_else(|| CitizenError::NotFound(person_id.to_string()))?;
        if citizen.person_id != person_id {
            return Err(CitizenError::KeyMismatch {
                key: person_id.to_string(),
                found: citizen.person_id,
            });
        }
        Ok(citizen)
    }

    /// Writes `citizen` under its own `personid`.
    pub fn save_entity<R: SubRecord>(&mut self, citizen: &Citizen<R>) -> CitizenResult<()> {
        self.save_document(&citizen.person_id, citizen)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::{CallerAttributes, InMemoryLedger};
    use crate::model::{HealthRecord, NewCitizen};
    use crate::validation::RequiredText;

    fn citizen(id: &str) -> Citizen<HealthRecord> {
        Citizen::new(NewCitizen {
            person_id: RequiredText::new("personid", id).unwrap(),
            dob: "1990-01-01".into(),
            gender: "F".into(),
        })
    }

    #[test]
    fn never_created_key_is_not_found() {
        let ledger = InMemoryLedger::new();
        let mut tx = ledger.begin(CallerAttributes::new());
        let mut store = RecordStore::new(&mut tx);

        let err = store
            .load_entity::<HealthRecord>("P404")
            .expect_err("nothing stored");
        assert!(matches!(err, CitizenError::NotFound(id) if id == "P404"));
        assert!(!store.exists("P404").unwrap());
    }

    #[test]
    fn saved_entity_loads_back() {
        let ledger = InMemoryLedger::new();
        let mut tx = ledger.begin(CallerAttributes::new());
        let mut store = RecordStore::new(&mut tx);

        store.save_entity(&citizen("P1")).unwrap();
        assert_eq!(store.load_entity::<HealthRecord>("P1").unwrap(), citizen("P1"));
    }

    #[test]
    fn undecodable_bytes_are_corrupt_but_exist() {
        let ledger = InMemoryLedger::new();
        let mut tx = ledger.begin(CallerAttributes::new());
        let mut store = RecordStore::new(&mut tx);

        store.put("P1", b"{not json".to_vec()).unwrap();
        let err = store.load_entity::<HealthRecord>("P1").expect_err("corrupt");
        assert!(matches!(err, CitizenError::CorruptRecord { .. }));
        assert!(store.exists("P1").unwrap());
    }

    #[test]
    fn document_under_the_wrong_key_is_corrupt() {
        let ledger = InMemoryLedger::new();
        let mut tx = ledger.begin(CallerAttributes::new());
        let mut store = RecordStore::new(&mut tx);

        store.save_document("P2", &citizen("P1")).unwrap();
        let err = store.load_entity::<HealthRecord>("P2").expect_err("mismatch");
        assert!(matches!(err, CitizenError::KeyMismatch { found, .. } if found == "P1"));
    }
}
