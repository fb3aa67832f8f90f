//! Citizen record service.
//!
//! Every public method takes the ledger transaction it runs in and the already resolved
//! [`Caller`]. The permission check is always the first thing a method does, so a denied
//! call reads no entity and writes nothing.

use crate::config::ServiceConfig;
use crate::constants::{HEARTBEAT_PAYLOAD, REGISTRY_KEY};
use crate::identity::Caller;
use crate::ledger::Ledger;
use crate::model::{Address, Citizen, Closing, NewCitizen, SubRecord, View};
use crate::operation::Operation;
use crate::policy::AccessPolicy;
use crate::registry::Registry;
use crate::store::RecordStore;
use crate::validation::{credential_key, is_reserved_key, RequiredText};
use crate::{CitizenError, CitizenResult, ErrorKind};
use std::marker::PhantomData;
use std::sync::Arc;

/// Outcome of [`RecordService::check_unique`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Uniqueness {
    Unique,
    /// Something, decodable or not, is already stored at the ID.
    NotUnique,
}

/// Business operations for a deployment storing sub-records of type `R`.
pub struct RecordService<R> {
    config: Arc<ServiceConfig>,
    policy: AccessPolicy,
    _record: PhantomData<fn() -> R>,
}

impl<R: SubRecord> RecordService<R> {
    /// # Errors
    ///
    /// Returns [`CitizenError::InvalidInput`] if `config` names a different variant than `R`.
    pub fn new(config: Arc<ServiceConfig>) -> CitizenResult<Self> {
        if config.variant() != R::VARIANT {
            return Err(CitizenError::InvalidInput(format!(
                "configured for {} records but the service stores {} records",
                config.variant(),
                R::VARIANT
            )));
        }
        let policy = AccessPolicy::new(config.variant());
        Ok(Self {
            config,
            policy,
            _record: PhantomData,
        })
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    pub fn policy(&self) -> &AccessPolicy {
        &self.policy
    }

    /// Creates a citizen with sentinel defaults and registers its ID.
    ///
    /// The entity and the updated registry are written in the same transaction.
    pub fn create<L: Ledger + ?Sized>(
        &self,
        ledger: &mut L,
        caller: &Caller,
        new: NewCitizen,
    ) -> CitizenResult<()> {
        self.policy.check(Operation::Create, caller)?;
        let mut store = RecordStore::new(ledger);

        let person_id = new.person_id.as_str().to_string();
        if is_reserved_key(&person_id) {
            return Err(CitizenError::InvalidInput(format!(
                "personID '{person_id}' collides with a reserved key"
            )));
        }
        if store.exists(&person_id)? {
            return Err(CitizenError::DuplicateId(person_id));
        }
        let citizen = Citizen::<R>::new(new);
        store.save_entity(&citizen)?;
        Registry::register(&mut store, &person_id)?;

        tracing::info!(person_id = %person_id, caller = %caller.name, "citizen created");
        Ok(())
    }

    pub fn set_external_id<L: Ledger + ?Sized>(
        &self,
        ledger: &mut L,
        caller: &Caller,
        person_id: &str,
        govt_id: String,
    ) -> CitizenResult<()> {
        self.update(ledger, caller, Operation::SetExternalId, person_id, |c| {
            c.govt_id = govt_id;
            Ok(())
        })
    }

    pub fn set_name<L: Ledger + ?Sized>(
        &self,
        ledger: &mut L,
        caller: &Caller,
        person_id: &str,
        name: String,
    ) -> CitizenResult<()> {
        self.update(ledger, caller, Operation::SetName, person_id, |c| {
            c.name = name;
            Ok(())
        })
    }

    /// Health deployments only; academic deployments report the operation as unknown.
    pub fn set_blood_group<L: Ledger + ?Sized>(
        &self,
        ledger: &mut L,
        caller: &Caller,
        person_id: &str,
        blood_group: String,
    ) -> CitizenResult<()> {
        self.update(ledger, caller, Operation::SetBloodGroup, person_id, |c| {
            c.blood_group = Some(blood_group);
            Ok(())
        })
    }

    pub fn set_address<L: Ledger + ?Sized>(
        &self,
        ledger: &mut L,
        caller: &Caller,
        person_id: &str,
        address: Address,
    ) -> CitizenResult<()> {
        self.update(ledger, caller, Operation::SetAddress, person_id, |c| {
            c.current_address = address;
            Ok(())
        })
    }

    /// Appends `record` to the citizen's log.
    ///
    /// # Errors
    ///
    /// Returns [`CitizenError::DuplicateSubRecord`] if the record ID is already in the log.
    pub fn add_sub_record<L: Ledger + ?Sized>(
        &self,
        ledger: &mut L,
        caller: &Caller,
        person_id: &str,
        record: R,
    ) -> CitizenResult<()> {
        self.update(ledger, caller, Operation::AddSubRecord, person_id, |c| {
            c.append_record(record)
        })
    }

    /// Applies the closing transition to one sub-record.
    ///
    /// # Errors
    ///
    /// - [`CitizenError::SubRecordNotFound`] if no record has `record_id`
    /// - [`CitizenError::SubRecordClosed`] if the record was already closed
    /// - [`CitizenError::NoLifecycle`] if the variant's records cannot be closed
    pub fn close_sub_record<L: Ledger + ?Sized>(
        &self,
        ledger: &mut L,
        caller: &Caller,
        person_id: &str,
        record_id: &str,
        closing: &Closing,
    ) -> CitizenResult<()> {
        self.update(ledger, caller, Operation::CloseSubRecord, person_id, |c| {
            c.close_record(record_id, closing)
        })
    }

    pub fn get_redacted_entity<L: Ledger + ?Sized>(
        &self,
        ledger: &mut L,
        caller: &Caller,
        person_id: &str,
    ) -> CitizenResult<Citizen<R>> {
        self.policy.check(Operation::GetRedactedEntity, caller)?;
        let citizen = RecordStore::new(ledger).load_entity::<R>(person_id)?;
        Ok(citizen.project(View::Redacted))
    }

    pub fn get_full_entity<L: Ledger + ?Sized>(
        &self,
        ledger: &mut L,
        caller: &Caller,
        person_id: &str,
    ) -> CitizenResult<Citizen<R>> {
        self.policy.check(Operation::GetFullEntity, caller)?;
        let citizen = RecordStore::new(ledger).load_entity::<R>(person_id)?;
        Ok(citizen.project(View::Full))
    }

    /// Redacted view of every registered citizen, in creation order.
    ///
    /// Entries that are missing or fail to decode are logged and skipped. Ledger failures
    /// abort the whole listing.
    pub fn list_all<L: Ledger + ?Sized>(
        &self,
        ledger: &mut L,
        caller: &Caller,
    ) -> CitizenResult<Vec<Citizen<R>>> {
        self.policy.check(Operation::ListAll, caller)?;
        let mut store = RecordStore::new(ledger);

        let ids = Registry::list(&mut store)?;
        let mut citizens = Vec::with_capacity(ids.len());
        for id in ids {
            match store.load_entity::<R>(&id) {
                Ok(citizen) => citizens.push(citizen.project(View::Redacted)),
                Err(e) if e.kind() == ErrorKind::Store => return Err(e),
                Err(e) => {
                    tracing::warn!(person_id = %id, error = %e, "skipping unreadable citizen");
                }
            }
        }
        Ok(citizens)
    }

    pub fn check_unique<L: Ledger + ?Sized>(
        &self,
        ledger: &mut L,
        caller: &Caller,
        person_id: &RequiredText,
    ) -> CitizenResult<Uniqueness> {
        self.policy.check(Operation::CheckUnique, caller)?;
        if RecordStore::new(ledger).exists(person_id.as_str())? {
            Ok(Uniqueness::NotUnique)
        } else {
            Ok(Uniqueness::Unique)
        }
    }

    /// Raw bytes at `key`.
    pub fn read_key<L: Ledger + ?Sized>(
        &self,
        ledger: &mut L,
        caller: &Caller,
        key: &str,
    ) -> CitizenResult<Vec<u8>> {
        self.policy.check(Operation::ReadKey, caller)?;
        RecordStore::new(ledger).get(key)
    }

    /// Stores raw bytes at `key`.
    ///
    /// # Errors
    ///
    /// Returns [`CitizenError::InvalidInput`] for the registry key and credential keys.
    pub fn write_key<L: Ledger + ?Sized>(
        &self,
        ledger: &mut L,
        caller: &Caller,
        key: &RequiredText,
        value: String,
    ) -> CitizenResult<()> {
        self.policy.check(Operation::WriteKey, caller)?;
        if is_reserved_key(key.as_str()) {
            return Err(CitizenError::InvalidInput(format!(
                "key '{key}' is reserved and cannot be written directly"
            )));
        }
        RecordStore::new(ledger).put(key.as_str(), value.into_bytes())?;
        tracing::info!(key = %key, caller = %caller.name, "raw value written");
        Ok(())
    }

    /// The credential provisioned for `name` at bootstrap.
    pub fn get_credential<L: Ledger + ?Sized>(
        &self,
        ledger: &mut L,
        caller: &Caller,
        name: &str,
    ) -> CitizenResult<Vec<u8>> {
        self.policy.check(Operation::GetCredential, caller)?;
        RecordStore::new(ledger).get(&credential_key(name))
    }

    pub fn heartbeat(&self, caller: &Caller) -> CitizenResult<&'static str> {
        self.policy.check(Operation::Heartbeat, caller)?;
        Ok(HEARTBEAT_PAYLOAD)
    }

    /// Bootstrap: writes an empty registry unless one exists, and one document per
    /// `(name, credential)` pair.
    ///
    /// Runs outside any caller identity, as part of deploying the service.
    pub fn initialise<L: Ledger + ?Sized>(
        &self,
        ledger: &mut L,
        credentials: &[(RequiredText, String)],
    ) -> CitizenResult<()> {
        let mut store = RecordStore::new(ledger);
        Registry::initialise(&mut store)?;
        for (name, credential) in credentials {
            store.put(&credential_key(name.as_str()), credential.clone().into_bytes())?;
        }
        tracing::info!(
            registry = REGISTRY_KEY,
            credentials = credentials.len(),
            "ledger initialised"
        );
        Ok(())
    }

    /// Check, load, mutate, save.
    fn update<L, F>(
        &self,
        ledger: &mut L,
        caller: &Caller,
        operation: Operation,
        person_id: &str,
        mutate: F,
    ) -> CitizenResult<()>
    where
        L: Ledger + ?Sized,
        F: FnOnce(&mut Citizen<R>) -> CitizenResult<()>,
    {
        self.policy.check(operation, caller)?;
        let mut store = RecordStore::new(ledger);

        let mut citizen = store.load_entity::<R>(person_id)?;
        mutate(&mut citizen)?;
        store.save_entity(&citizen)?;

        tracing::info!(
            operation = operation.name(),
            person_id = %person_id,
            caller = %caller.name,
            "citizen updated"
        );
        Ok(())
    }
}
