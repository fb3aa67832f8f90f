use crate::config::RecordVariant;
use crate::ledger::LedgerError;
use crate::validation::TextError;

/// Coarse classification of a [`CitizenError`].
///
/// The invocation surface only carries a message string; hosts use the kind to pick a
/// transport status and tests use it to assert on failure classes without matching
/// message text.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Argument,
    Identity,
    PermissionDenied,
    NotFound,
    DuplicateId,
    CorruptRecord,
    Store,
    UnknownOperation,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::Argument => "argument",
            ErrorKind::Identity => "identity",
            ErrorKind::PermissionDenied => "permission_denied",
            ErrorKind::NotFound => "not_found",
            ErrorKind::DuplicateId => "duplicate_id",
            ErrorKind::CorruptRecord => "corrupt_record",
            ErrorKind::Store => "store",
            ErrorKind::UnknownOperation => "unknown_operation",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CitizenError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("invalid input: {0}")]
    Text(#[from] TextError),
    #[error(
        "Incorrect number of arguments for {operation}. Expecting {expected}, got {actual}"
    )]
    ArgumentCount {
        operation: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error("sub-record {record_id} is already closed")]
    SubRecordClosed { record_id: String },
    #[error("{variant} records have no lifecycle to close")]
    NoLifecycle { variant: RecordVariant },

    #[error("Couldn't get attribute '{attribute}'. Error: {reason}")]
    Identity {
        attribute: &'static str,
        reason: String,
    },

    #[error("Permission denied. {operation} (role: {role})")]
    PermissionDenied { operation: &'static str, role: String },

    #[error("Error retrieving person with ID = {0}")]
    NotFound(String),
    #[error("no sub-record {record_id} for person with ID = {person_id}")]
    SubRecordNotFound {
        person_id: String,
        record_id: String,
    },

    #[error("Citizen already exists: {0}")]
    DuplicateId(String),
    #[error("sub-record {record_id} already exists for person with ID = {person_id}")]
    DuplicateSubRecord {
        person_id: String,
        record_id: String,
    },

    #[error("Corrupt record at {key}: {source}")]
    CorruptRecord {
        key: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("Corrupt record at {key}: stored personid {found} does not match its key")]
    KeyMismatch { key: String, found: String },

    #[error("failed to serialise record {key}: {source}")]
    Serialization {
        key: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),

    #[error("Received unknown function invocation: {0}")]
    UnknownOperation(String),

    #[error("failed to read configuration file: {0}")]
    ConfigRead(std::io::Error),
    #[error("failed to parse configuration: {0}")]
    ConfigParse(serde_yaml::Error),
}

impl CitizenError {
    /// Returns the taxonomy class this error belongs to.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidInput(_)
            | Self::Text(_)
            | Self::ArgumentCount { .. }
            | Self::SubRecordClosed { .. }
            | Self::NoLifecycle { .. }
            | Self::ConfigRead(_)
            | Self::ConfigParse(_) => ErrorKind::Argument,
            Self::Identity { .. } => ErrorKind::Identity,
            Self::PermissionDenied { .. } => ErrorKind::PermissionDenied,
            Self::NotFound(_) | Self::SubRecordNotFound { .. } => ErrorKind::NotFound,
            Self::DuplicateId(_) | Self::DuplicateSubRecord { .. } => ErrorKind::DuplicateId,
            Self::CorruptRecord { .. } | Self::KeyMismatch { .. } => ErrorKind::CorruptRecord,
            Self::Serialization { .. } | Self::Ledger(_) => ErrorKind::Store,
            Self::UnknownOperation(_) => ErrorKind::UnknownOperation,
        }
    }

    /// Returns `true` if the failure was an optimistic-concurrency conflict that a host
    /// may resolve by re-running the invocation.
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Ledger(LedgerError::Conflict { .. }))
    }
}

pub type CitizenResult<T> = std::result::Result<T, CitizenError>;
