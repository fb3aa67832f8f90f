//! Entity schema: citizens, their address and their sub-record log.
//!
//! A deployment stores exactly one sub-record shape. The shape is a type parameter on
//! [`Citizen`] bounded by [`SubRecord`], so health and academic documents can never be
//! mixed in one log.

pub mod academic;
pub mod address;
pub mod citizen;
pub mod health;

pub use academic::{AcademicRecord, NewAcademicRecord};
pub use address::Address;
pub use citizen::{Citizen, NewCitizen, View};
pub use health::{HealthRecord, NewHealthRecord};

use crate::config::RecordVariant;
use crate::validation::RequiredText;
use crate::CitizenResult;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Fields supplied when closing a sub-record.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Closing {
    pub close_date: RequiredText,
    pub close_summary: RequiredText,
}

/// A domain-specific entry in a citizen's append-only log.
pub trait SubRecord:
    Clone + std::fmt::Debug + PartialEq + Serialize + DeserializeOwned + Send + Sync + 'static
{
    /// Deployment variant this shape belongs to.
    const VARIANT: RecordVariant;

    /// Wire name of the citizen field holding the log.
    const LOG_KEY: &'static str;

    /// Identifier unique within the owning citizen's log.
    fn record_id(&self) -> &str;

    /// Builds a record from the positional fields that follow the record ID in an
    /// `addSubRecord` invocation.
    ///
    /// # Errors
    ///
    /// Returns [`crate::CitizenError::ArgumentCount`] unless exactly
    /// [`crate::constants::SUB_RECORD_FIELD_COUNT`] fields are supplied.
    fn from_positional(record_id: RequiredText, fields: &[String]) -> CitizenResult<Self>;

    /// Applies the closing transition.
    ///
    /// # Errors
    ///
    /// Fails if the record is already closed or the shape has no lifecycle.
    fn close(&mut self, closing: &Closing) -> CitizenResult<()>;
}

/// Checks a positional field list against its expected length.
pub(crate) fn expect_fields(
    operation: &'static str,
    fields: &[String],
    expected: usize,
) -> CitizenResult<()> {
    if fields.len() != expected {
        return Err(crate::CitizenError::ArgumentCount {
            operation,
            expected,
            actual: fields.len(),
        });
    }
    Ok(())
}
