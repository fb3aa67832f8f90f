//! Health visits.
//!
//! A visit is open from admission until it is discharged. Discharge sets the date and
//! summary exactly once; an open visit carries the sentinel in both.

use crate::config::RecordVariant;
use crate::constants::{ADDRESS_FIELD_COUNT, SENTINEL, SUB_RECORD_FIELD_COUNT};
use crate::model::{expect_fields, Address, Closing, SubRecord};
use crate::validation::RequiredText;
use crate::{CitizenError, CitizenResult};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HealthRecord {
    #[serde(rename = "healthrecordid")]
    pub record_id: String,
    #[serde(rename = "physicianname")]
    pub physician_name: String,
    #[serde(rename = "facilityname")]
    pub facility_name: String,
    #[serde(rename = "facilityaddress")]
    pub facility_address: Address,
    #[serde(rename = "typeofservice")]
    pub type_of_service: String,
    #[serde(rename = "servicedescription")]
    pub service_description: String,
    #[serde(rename = "dateofservice")]
    pub date_of_service: String,
    #[serde(rename = "dateofadmission")]
    pub date_of_admission: String,
    #[serde(rename = "dateofdischarge")]
    pub date_of_discharge: String,
    #[serde(rename = "dischargesummary")]
    pub discharge_summary: String,
}

/// Named fields for a new, open visit.
#[derive(Clone, Debug)]
pub struct NewHealthRecord {
    pub record_id: RequiredText,
    pub physician_name: String,
    pub facility_name: String,
    pub facility_address: Address,
    pub type_of_service: String,
    pub service_description: String,
    pub date_of_service: String,
    pub date_of_admission: String,
}

impl HealthRecord {
    pub fn new(new: NewHealthRecord) -> Self {
        Self {
            record_id: new.record_id.into_inner(),
            physician_name: new.physician_name,
            facility_name: new.facility_name,
            facility_address: new.facility_address,
            type_of_service: new.type_of_service,
            service_description: new.service_description,
            date_of_service: new.date_of_service,
            date_of_admission: new.date_of_admission,
            date_of_discharge: SENTINEL.into(),
            discharge_summary: SENTINEL.into(),
        }
    }

    pub fn is_open(&self) -> bool {
        self.date_of_discharge == SENTINEL && self.discharge_summary == SENTINEL
    }
}

impl SubRecord for HealthRecord {
    const VARIANT: RecordVariant = RecordVariant::Health;
    const LOG_KEY: &'static str = "personahealth";

    fn record_id(&self) -> &str {
        &self.record_id
    }

    // physician, facility, facility address (6), type, description, service date,
    // admission date
    fn from_positional(record_id: RequiredText, fields: &[String]) -> CitizenResult<Self> {
        expect_fields("addSubRecord", fields, SUB_RECORD_FIELD_COUNT)?;
        let address_end = 2 + ADDRESS_FIELD_COUNT;
        Ok(Self::new(NewHealthRecord {
            record_id,
            physician_name: fields[0].clone(),
            facility_name: fields[1].clone(),
            facility_address: Address::from_positional("addSubRecord", &fields[2..address_end])?,
            type_of_service: fields[address_end].clone(),
            service_description: fields[address_end + 1].clone(),
            date_of_service: fields[address_end + 2].clone(),
            date_of_admission: fields[address_end + 3].clone(),
        }))
    }

    fn close(&mut self, closing: &Closing) -> CitizenResult<()> {
        if !self.is_open() {
            return Err(CitizenError::SubRecordClosed {
                record_id: self.record_id.clone(),
            });
        }
        if closing.close_date.as_str() == SENTINEL || closing.close_summary.as_str() == SENTINEL {
            return Err(CitizenError::InvalidInput(format!(
                "cannot close sub-record {} with the placeholder value '{SENTINEL}'",
                self.record_id
            )));
        }
        self.date_of_discharge = closing.close_date.as_str().to_string();
        self.discharge_summary = closing.close_summary.as_str().to_string();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn positional() -> Vec<String> {
        [
            "Dr. Rao",
            "City Hospital",
            "1 Main Rd",
            "",
            "Central",
            "Pune",
            "MH",
            "411001",
            "Inpatient",
            "Appendectomy",
            "2020-01-01",
            "2020-01-01",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect()
    }

    fn closing(date: &str, summary: &str) -> Closing {
        Closing {
            close_date: RequiredText::new("closeDate", date).unwrap(),
            close_summary: RequiredText::new("closeSummary", summary).unwrap(),
        }
    }

    #[test]
    fn positional_fields_land_in_named_slots() {
        let record =
            HealthRecord::from_positional(RequiredText::new("recordID", "H1").unwrap(), &positional())
                .expect("valid fields");

        assert_eq!(record.record_id, "H1");
        assert_eq!(record.physician_name, "Dr. Rao");
        assert_eq!(record.facility_address.city, "Pune");
        assert_eq!(record.facility_address.area_code, "411001");
        assert_eq!(record.type_of_service, "Inpatient");
        assert_eq!(record.date_of_admission, "2020-01-01");
        assert!(record.is_open());
    }

    #[test]
    fn rejects_wrong_field_count() {
        let mut fields = positional();
        fields.pop();
        let err = HealthRecord::from_positional(RequiredText::new("recordID", "H1").unwrap(), &fields)
            .expect_err("eleven fields");
        assert!(matches!(err, CitizenError::ArgumentCount { expected: 12, .. }));
    }

    #[test]
    fn closes_exactly_once() {
        let mut record =
            HealthRecord::from_positional(RequiredText::new("recordID", "H1").unwrap(), &positional())
                .unwrap();

        record.close(&closing("2020-01-05", "Recovered")).expect("first close");
        assert!(!record.is_open());
        assert_eq!(record.date_of_discharge, "2020-01-05");
        assert_eq!(record.discharge_summary, "Recovered");

        let err = record
            .close(&closing("2020-02-01", "Again"))
            .expect_err("second close");
        assert!(matches!(err, CitizenError::SubRecordClosed { .. }));
        assert_eq!(record.discharge_summary, "Recovered");
    }

    #[test]
    fn placeholder_closing_is_rejected_and_leaves_record_open() {
        let mut record =
            HealthRecord::from_positional(RequiredText::new("recordID", "H1").unwrap(), &positional())
                .unwrap();

        let placeholders = [
            (SENTINEL, SENTINEL),
            (SENTINEL, "Recovered"),
            ("2020-01-05", SENTINEL),
        ];
        for (date, summary) in placeholders {
            let err = record.close(&closing(date, summary)).expect_err("placeholder");
            assert!(matches!(err, CitizenError::InvalidInput(_)));
            assert!(record.is_open());
        }

        record.close(&closing("2020-01-05", "Recovered")).expect("real close");
        assert!(record.close(&closing("2020-02-01", "Again")).is_err());
    }

    #[test]
    fn free_text_with_quotes_survives_encoding() {
        let mut fields = positional();
        fields[9] = r#"Patient said "ouch", then {left}"#.into();
        let record =
            HealthRecord::from_positional(RequiredText::new("recordID", "H1").unwrap(), &fields).unwrap();

        let json = serde_json::to_string(&record).unwrap();
        let decoded: HealthRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded, record);
    }
}
