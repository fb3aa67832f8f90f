//! # Citizen Core
//!
//! Core business logic for the citizen identity record service.
//!
//! This crate contains the access-controlled record engine that runs on top of a ledger
//! key-value store:
//! - Role-based access policy and caller identity resolution
//! - Citizen documents with an append-only sub-record log (health or academic)
//! - The ID registry that lets every created citizen be enumerated
//! - Operation routing by name with positional arguments
//! - An in-memory, optimistically concurrent reference ledger and host
//!
//! **No transport concerns**: HTTP servers and command-line tooling belong in `api-rest`
//! and `citizen-cli`.

pub mod config;
pub mod constants;
pub mod error;
pub mod host;
pub mod identity;
pub mod ledger;
pub mod model;
pub mod operation;
pub mod policy;
pub mod registry;
pub mod router;
pub mod service;
pub mod store;
pub mod validation;

pub use config::{RecordVariant, RoleMapping, ServiceConfig};
pub use error::{CitizenError, CitizenResult, ErrorKind};
pub use host::{host_for, Host, LedgerHost};
pub use identity::{Caller, IdentityResolver};
pub use ledger::{CallerAttributes, InMemoryLedger, Ledger, LedgerError, Snapshot, Transaction};
pub use model::{AcademicRecord, Address, Citizen, HealthRecord, NewCitizen, SubRecord, View};
pub use operation::{Operation, Surface};
pub use policy::{AccessPolicy, Allowed, Role};
pub use registry::{IdIndex, Registry};
pub use router::{OperationRouter, Response, ResponseStatus};
pub use service::{RecordService, Uniqueness};
pub use store::RecordStore;
