//! Academic records.
//!
//! These are append-only facts about a completed course of study. There is no lifecycle,
//! so closing one is always rejected.

use crate::config::RecordVariant;
use crate::constants::{ADDRESS_FIELD_COUNT, SUB_RECORD_FIELD_COUNT};
use crate::model::{expect_fields, Address, Closing, SubRecord};
use crate::validation::RequiredText;
use crate::{CitizenError, CitizenResult};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AcademicRecord {
    #[serde(rename = "academicrecordid")]
    pub record_id: String,
    #[serde(rename = "institutename")]
    pub institute_name: String,
    #[serde(rename = "instituteaddress")]
    pub institute_address: Address,
    #[serde(rename = "coursename")]
    pub course_name: String,
    pub qualification: String,
    pub grade: String,
    #[serde(rename = "dateofadmission")]
    pub date_of_admission: String,
    #[serde(rename = "dateofcompletion")]
    pub date_of_completion: String,
}

#[derive(Clone, Debug)]
pub struct NewAcademicRecord {
    pub record_id: RequiredText,
    pub institute_name: String,
    pub institute_address: Address,
    pub course_name: String,
    pub qualification: String,
    pub grade: String,
    pub date_of_admission: String,
    pub date_of_completion: String,
}

impl AcademicRecord {
    pub fn new(new: NewAcademicRecord) -> Self {
        Self {
            record_id: new.record_id.into_inner(),
            institute_name: new.institute_name,
            institute_address: new.institute_address,
            course_name: new.course_name,
            qualification: new.qualification,
            grade: new.grade,
            date_of_admission: new.date_of_admission,
            date_of_completion: new.date_of_completion,
        }
    }
}

impl SubRecord for AcademicRecord {
    const VARIANT: RecordVariant = RecordVariant::Academic;
    const LOG_KEY: &'static str = "personacademic";

    fn record_id(&self) -> &str {
        &self.record_id
    }

    fn from_positional(record_id: RequiredText, fields: &[String]) -> CitizenResult<Self> {
        expect_fields("addSubRecord", fields, SUB_RECORD_FIELD_COUNT)?;
        let address_end = 1 + ADDRESS_FIELD_COUNT;
        Ok(Self::new(NewAcademicRecord {
            record_id,
            institute_name: fields[0].clone(),
            institute_address: Address::from_positional("addSubRecord", &fields[1..address_end])?,
            course_name: fields[address_end].clone(),
            qualification: fields[address_end + 1].clone(),
            grade: fields[address_end + 2].clone(),
            date_of_admission: fields[address_end + 3].clone(),
            date_of_completion: fields[address_end + 4].clone(),
        }))
    }

    fn close(&mut self, _closing: &Closing) -> CitizenResult<()> {
        Err(CitizenError::NoLifecycle {
            variant: Self::VARIANT,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positional_fields_land_in_named_slots() {
        let fields: Vec<String> = [
            "State University",
            "Campus Rd",
            "",
            "North",
            "Chennai",
            "TN",
            "600001",
            "Computer Science",
            "B.Tech",
            "A",
            "2012-07-01",
            "2016-05-30",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();

        let record =
            AcademicRecord::from_positional(RequiredText::new("recordID", "A1").unwrap(), &fields)
                .expect("valid fields");

        assert_eq!(record.institute_name, "State University");
        assert_eq!(record.institute_address.area_code, "600001");
        assert_eq!(record.course_name, "Computer Science");
        assert_eq!(record.date_of_completion, "2016-05-30");
    }

    #[test]
    fn closing_is_rejected() {
        let fields: Vec<String> = vec![String::new(); SUB_RECORD_FIELD_COUNT];
        let mut record =
            AcademicRecord::from_positional(RequiredText::new("recordID", "A1").unwrap(), &fields)
                .unwrap();
        let before = record.clone();

        let err = record
            .close(&Closing {
                close_date: RequiredText::new("closeDate", "2020-01-01").unwrap(),
                close_summary: RequiredText::new("closeSummary", "done").unwrap(),
            })
            .expect_err("no lifecycle");

        assert!(matches!(err, CitizenError::NoLifecycle { .. }));
        assert_eq!(record, before);
    }
}
