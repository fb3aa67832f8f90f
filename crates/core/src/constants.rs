//! Constants used throughout the citizen core crate.
//!
//! Reserved ledger keys, attestation attribute names and wire sentinels live here so
//! the storage layout is defined in exactly one place.

/// Placeholder written into every field that has not been populated yet.
pub const SENTINEL: &str = "UNDEFINED";

/// Reserved ledger key holding the ordered index of every created citizen.
pub const REGISTRY_KEY: &str = "entity-index";

/// Key prefix for pre-provisioned caller credentials.
pub const CREDENTIAL_KEY_PREFIX: &str = "credential/";

/// Attestation attribute carrying the caller's user name.
pub const USERNAME_ATTRIBUTE: &str = "username";

/// Attestation attribute carrying the caller's role.
pub const ROLE_ATTRIBUTE: &str = "role";

/// Payload returned by `heartbeat`.
pub const HEARTBEAT_PAYLOAD: &str = "Alive!!!";

/// Number of descriptive positional fields following the record ID in `addSubRecord`.
pub const SUB_RECORD_FIELD_COUNT: usize = 12;

/// Number of positional fields making up an address.
pub const ADDRESS_FIELD_COUNT: usize = 6;

/// Default number of times a host re-runs an invocation whose commit conflicted.
pub const DEFAULT_MAX_COMMIT_RETRIES: u32 = 3;

/// Default listen address for the REST host.
pub const DEFAULT_REST_ADDR: &str = "0.0.0.0:3000";
