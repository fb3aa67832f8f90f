use crate::constants::{ADDRESS_FIELD_COUNT, SENTINEL};
use crate::model::expect_fields;
use crate::CitizenResult;
use serde::{Deserialize, Serialize};

/// Postal address embedded in citizens and sub-records.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Address {
    #[serde(rename = "addressline1")]
    pub line1: String,
    #[serde(rename = "addressline2")]
    pub line2: String,
    pub locality: String,
    pub city: String,
    pub state: String,
    #[serde(rename = "areacode")]
    pub area_code: String,
}

impl Address {
    /// An address whose every field is the sentinel.
    pub fn undefined() -> Self {
        Self {
            line1: SENTINEL.into(),
            line2: SENTINEL.into(),
            locality: SENTINEL.into(),
            city: SENTINEL.into(),
            state: SENTINEL.into(),
            area_code: SENTINEL.into(),
        }
    }

    /// Builds an address from six positional fields in wire order.
    pub fn from_positional(operation: &'static str, fields: &[String]) -> CitizenResult<Self> {
        expect_fields(operation, fields, ADDRESS_FIELD_COUNT)?;
        Ok(Self {
            line1: fields[0].clone(),
            line2: fields[1].clone(),
            locality: fields[2].clone(),
            city: fields[3].clone(),
            state: fields[4].clone(),
            area_code: fields[5].clone(),
        })
    }
}
