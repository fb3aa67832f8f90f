//! The citizen entity and its wire model.
//!
//! Responsibilities:
//! - Define the domain-level [`Citizen`] used by the service
//! - Define a wire model matching the stored JSON (lower-case names, no separators)
//! - Translate between the two, including the variant-specific name of the log field
//! - Provide the redaction projection

use crate::constants::SENTINEL;
use crate::model::{Address, Closing, SubRecord};
use crate::validation::RequiredText;
use crate::{CitizenError, CitizenResult};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;

// ============================================================================
// Public domain-level types
// ============================================================================

/// A citizen's identity record plus its sub-record log.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Citizen<R> {
    pub person_id: String,
    pub govt_id: String,
    pub name: String,
    pub gender: String,
    pub dob: String,
    /// Present only in deployments whose variant carries a blood group.
    pub blood_group: Option<String>,
    pub current_address: Address,
    pub records: Vec<R>,
}

/// Named parameters for a new citizen.
///
/// Named rather than positional so date of birth and gender cannot be swapped.
#[derive(Clone, Debug)]
pub struct NewCitizen {
    pub person_id: RequiredText,
    pub dob: String,
    pub gender: String,
}

/// How much of a citizen a read returns.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum View {
    /// Identity and demographics only; the sub-record log is withheld.
    Redacted,
    /// Everything, including the sub-record log.
    Full,
}

impl<R: SubRecord> Citizen<R> {
    /// Builds a citizen with every optional field at the sentinel and an empty log.
    pub fn new(new: NewCitizen) -> Self {
        Self {
            person_id: new.person_id.into_inner(),
            govt_id: SENTINEL.into(),
            name: SENTINEL.into(),
            gender: new.gender,
            dob: new.dob,
            blood_group: R::VARIANT
                .has_blood_group()
                .then(|| SENTINEL.to_string()),
            current_address: Address::undefined(),
            records: Vec::new(),
        }
    }

    /// Returns the fields visible under `view`.
    ///
    /// Every field is copied explicitly, so a field added to [`Citizen`] later is only
    /// exposed once it is listed here.
    pub fn project(&self, view: View) -> Self {
        Self {
            person_id: self.person_id.clone(),
            govt_id: self.govt_id.clone(),
            name: self.name.clone(),
            gender: self.gender.clone(),
            dob: self.dob.clone(),
            blood_group: self.blood_group.clone(),
            current_address: self.current_address.clone(),
            records: match view {
                View::Full => self.records.clone(),
                View::Redacted => Vec::new(),
            },
        }
    }

    pub fn record(&self, record_id: &str) -> Option<&R> {
        self.records.iter().find(|r| r.record_id() == record_id)
    }

    /// Appends `record` to the log.
    ///
    /// # Errors
    ///
    /// Returns [`CitizenError::DuplicateSubRecord`] if a record with the same ID exists.
    pub fn append_record(&mut self, record: R) -> CitizenResult<()> {
        if self.record(record.record_id()).is_some() {
            return Err(CitizenError::DuplicateSubRecord {
                person_id: self.person_id.clone(),
                record_id: record.record_id().to_string(),
            });
        }
        self.records.push(record);
        Ok(())
    }

    /// Closes the record with `record_id`.
    ///
    /// # Errors
    ///
    /// Returns [`CitizenError::SubRecordNotFound`] if no record has that ID, or whatever
    /// [`SubRecord::close`] reports for the record itself.
    pub fn close_record(&mut self, record_id: &str, closing: &Closing) -> CitizenResult<()> {
        let person_id = &self.person_id;
        let record = self
            .records
            .iter_mut()
            .find(|r| r.record_id() == record_id)
            .ok_or_else(|| CitizenError::SubRecordNotFound {
                person_id: person_id.clone(),
                record_id: record_id.to_string(),
            })?;
        record.close(closing)
    }
}

// ============================================================================
// Wire types (internal)
// ============================================================================

/// Stored JSON shape of a citizen.
///
/// The log field's name depends on the variant, so it is captured through a flattened map
/// and resolved against [`SubRecord::LOG_KEY`] during translation. Any other leftover key
/// is rejected.
#[derive(Serialize, Deserialize)]
struct CitizenWire {
    personid: String,
    govtid: String,
    name: String,
    gender: String,
    dob: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    bloodgroup: Option<String>,
    currentaddress: Address,
    #[serde(flatten)]
    log: BTreeMap<String, serde_json::Value>,
}

fn domain_to_wire<R: SubRecord>(citizen: &Citizen<R>) -> Result<CitizenWire, serde_json::Error> {
    let mut log = BTreeMap::new();
    log.insert(R::LOG_KEY.to_string(), serde_json::to_value(&citizen.records)?);
    Ok(CitizenWire {
        personid: citizen.person_id.clone(),
        govtid: citizen.govt_id.clone(),
        name: citizen.name.clone(),
        gender: citizen.gender.clone(),
        dob: citizen.dob.clone(),
        bloodgroup: citizen.blood_group.clone(),
        currentaddress: citizen.current_address.clone(),
        log,
    })
}

fn wire_to_domain<R: SubRecord>(mut wire: CitizenWire) -> Result<Citizen<R>, String> {
    if let Some(unexpected) = wire.log.keys().find(|k| k.as_str() != R::LOG_KEY) {
        return Err(format!(
            "unknown field `{unexpected}`, expected log field `{}`",
            R::LOG_KEY
        ));
    }
    if wire.bloodgroup.is_some() && !R::VARIANT.has_blood_group() {
        return Err(format!(
            "unknown field `bloodgroup` for {} records",
            R::VARIANT
        ));
    }
    // A missing or null log decodes as empty; redacted documents written by older
    // deployments carry `null`.
    let records = match wire.log.remove(R::LOG_KEY) {
        None | Some(serde_json::Value::Null) => Vec::new(),
        Some(value) => serde_json::from_value(value)
            .map_err(|e| format!("invalid `{}`: {e}", R::LOG_KEY))?,
    };
    Ok(Citizen {
        person_id: wire.personid,
        govt_id: wire.govtid,
        name: wire.name,
        gender: wire.gender,
        dob: wire.dob,
        blood_group: wire.bloodgroup,
        current_address: wire.currentaddress,
        records,
    })
}

impl<R: SubRecord> Serialize for Citizen<R> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        domain_to_wire(self)
            .map_err(serde::ser::Error::custom)?
            .serialize(serializer)
    }
}

impl<'de, R: SubRecord> Deserialize<'de> for Citizen<R> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let wire = CitizenWire::deserialize(deserializer)?;
        wire_to_domain(wire).map_err(serde::de::Error::custom)
    }
}
