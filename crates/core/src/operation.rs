//! The invocation surface: every operation a host can dispatch, its names and arity.

use crate::config::RecordVariant;
use crate::constants::{ADDRESS_FIELD_COUNT, SUB_RECORD_FIELD_COUNT};

/// Entry point an invocation arrives on.
///
/// Mirrors the ledger host's split between transactions that may write (`invoke`) and
/// read-only queries whose writes are discarded (`query`).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Surface {
    Invoke,
    Query,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Operation {
    Create,
    SetExternalId,
    SetName,
    SetBloodGroup,
    SetAddress,
    AddSubRecord,
    CloseSubRecord,
    WriteKey,
    GetRedactedEntity,
    GetFullEntity,
    ListAll,
    CheckUnique,
    ReadKey,
    GetCredential,
    Heartbeat,
}

impl Operation {
    pub const ALL: [Operation; 15] = [
        Operation::Create,
        Operation::SetExternalId,
        Operation::SetName,
        Operation::SetBloodGroup,
        Operation::SetAddress,
        Operation::AddSubRecord,
        Operation::CloseSubRecord,
        Operation::WriteKey,
        Operation::GetRedactedEntity,
        Operation::GetFullEntity,
        Operation::ListAll,
        Operation::CheckUnique,
        Operation::ReadKey,
        Operation::GetCredential,
        Operation::Heartbeat,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Operation::Create => "create",
            Operation::SetExternalId => "setExternalID",
            Operation::SetName => "setName",
            Operation::SetBloodGroup => "setBloodGroup",
            Operation::SetAddress => "setAddress",
            Operation::AddSubRecord => "addSubRecord",
            Operation::CloseSubRecord => "closeSubRecord",
            Operation::WriteKey => "writeKey",
            Operation::GetRedactedEntity => "getRedactedEntity",
            Operation::GetFullEntity => "getFullEntity",
            Operation::ListAll => "listAll",
            Operation::CheckUnique => "checkUnique",
            Operation::ReadKey => "readKey",
            Operation::GetCredential => "getCredential",
            Operation::Heartbeat => "heartbeat",
        }
    }

    /// Function name used by earlier clients of the ledger contract.
    pub fn legacy_name(self) -> &'static str {
        match self {
            Operation::Create => "create_person",
            Operation::SetExternalId => "add_govtid",
            Operation::SetName => "add_name",
            Operation::SetBloodGroup => "add_bloodgroup",
            Operation::SetAddress => "update_address",
            Operation::AddSubRecord => "add_healthrecord",
            Operation::CloseSubRecord => "update_healthrecord",
            Operation::WriteKey => "write",
            Operation::GetRedactedEntity => "get_person_details",
            Operation::GetFullEntity => "get_health_details",
            Operation::ListAll => "get_persons",
            Operation::CheckUnique => "check_unique_ID",
            Operation::ReadKey => "read",
            Operation::GetCredential => "get_ecert",
            Operation::Heartbeat => "ping",
        }
    }

    /// Looks an operation up by current or legacy name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|op| op.name() == name || op.legacy_name() == name)
    }

    /// Number of positional arguments the operation takes.
    pub fn arity(self) -> usize {
        match self {
            Operation::Create => 3,
            Operation::SetExternalId | Operation::SetName | Operation::SetBloodGroup => 2,
            Operation::SetAddress => 1 + ADDRESS_FIELD_COUNT,
            Operation::AddSubRecord => 2 + SUB_RECORD_FIELD_COUNT,
            Operation::CloseSubRecord => 4,
            Operation::WriteKey => 2,
            Operation::GetRedactedEntity
            | Operation::GetFullEntity
            | Operation::CheckUnique
            | Operation::ReadKey
            | Operation::GetCredential => 1,
            Operation::ListAll | Operation::Heartbeat => 0,
        }
    }

    pub fn on_surface(self, surface: Surface) -> bool {
        match self {
            Operation::Heartbeat => true,
            Operation::Create
            | Operation::SetExternalId
            | Operation::SetName
            | Operation::SetBloodGroup
            | Operation::SetAddress
            | Operation::AddSubRecord
            | Operation::CloseSubRecord
            | Operation::WriteKey => surface == Surface::Invoke,
            Operation::GetRedactedEntity
            | Operation::GetFullEntity
            | Operation::ListAll
            | Operation::CheckUnique
            | Operation::ReadKey
            | Operation::GetCredential => surface == Surface::Query,
        }
    }

    pub fn available_in(self, variant: RecordVariant) -> bool {
        match self {
            Operation::SetBloodGroup => variant.has_blood_group(),
            _ => true,
        }
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_and_legacy_names_resolve() {
        for op in Operation::ALL {
            assert_eq!(Operation::from_name(op.name()), Some(op));
            assert_eq!(Operation::from_name(op.legacy_name()), Some(op));
        }
        assert_eq!(Operation::from_name("drop_everything"), None);
    }

    #[test]
    fn every_operation_is_on_some_surface() {
        for op in Operation::ALL {
            assert!(op.on_surface(Surface::Invoke) || op.on_surface(Surface::Query));
        }
        assert!(Operation::Heartbeat.on_surface(Surface::Invoke));
        assert!(Operation::Heartbeat.on_surface(Surface::Query));
        assert!(!Operation::Create.on_surface(Surface::Query));
        assert!(!Operation::ListAll.on_surface(Surface::Invoke));
    }

    #[test]
    fn sub_record_arity_counts_id_and_record_id() {
        assert_eq!(Operation::AddSubRecord.arity(), 14);
        assert_eq!(Operation::SetAddress.arity(), 7);
    }

    #[test]
    fn blood_group_is_health_only() {
        assert!(Operation::SetBloodGroup.available_in(RecordVariant::Health));
        assert!(!Operation::SetBloodGroup.available_in(RecordVariant::Academic));
    }
}
