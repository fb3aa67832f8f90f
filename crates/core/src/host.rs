//! Binding of the operation router to a concrete ledger.
//!
//! A [`Host`] owns the world state and runs each invocation in its own transaction.
//! Mutations commit with conflict retry; queries run on a transaction that is dropped.
//! The trait is object safe so servers can hold an `Arc<dyn Host>` without knowing which
//! record variant the deployment stores.

use crate::config::{RecordVariant, ServiceConfig};
use crate::ledger::{CallerAttributes, InMemoryLedger, Snapshot};
use crate::model::{AcademicRecord, HealthRecord, SubRecord};
use crate::router::{OperationRouter, Response};
use crate::CitizenResult;
use std::sync::Arc;

pub trait Host: Send + Sync {
    fn variant(&self) -> RecordVariant;

    fn invoke(
        &self,
        caller: &CallerAttributes,
        operation: &str,
        args: &[String],
    ) -> CitizenResult<Response>;

    fn query(
        &self,
        caller: &CallerAttributes,
        operation: &str,
        args: &[String],
    ) -> CitizenResult<Response>;

    /// Bootstrap with name/credential pairs.
    fn initialise(&self, args: &[String]) -> CitizenResult<()>;

    /// Copy of the current world state.
    fn snapshot(&self) -> CitizenResult<Snapshot>;
}

pub struct LedgerHost<R> {
    ledger: InMemoryLedger,
    router: OperationRouter<R>,
    max_retries: u32,
}

impl<R: SubRecord> LedgerHost<R> {
    pub fn new(config: Arc<ServiceConfig>, ledger: InMemoryLedger) -> CitizenResult<Self> {
        let max_retries = config.max_commit_retries();
        Ok(Self {
            ledger,
            router: OperationRouter::new(config)?,
            max_retries,
        })
    }

    pub fn ledger(&self) -> &InMemoryLedger {
        &self.ledger
    }
}

impl<R: SubRecord> Host for LedgerHost<R> {
    fn variant(&self) -> RecordVariant {
        R::VARIANT
    }

    fn invoke(
        &self,
        caller: &CallerAttributes,
        operation: &str,
        args: &[String],
    ) -> CitizenResult<Response> {
        self.ledger.execute(caller, self.max_retries, |tx| {
            self.router.invoke(tx, operation, args)
        })
    }

    fn query(
        &self,
        caller: &CallerAttributes,
        operation: &str,
        args: &[String],
    ) -> CitizenResult<Response> {
        self.ledger
            .query(caller, |tx| self.router.query(tx, operation, args))
    }

    fn initialise(&self, args: &[String]) -> CitizenResult<()> {
        self.ledger
            .execute(&CallerAttributes::new(), self.max_retries, |tx| {
                self.router.initialise(tx, args)
            })
    }

    fn snapshot(&self) -> CitizenResult<Snapshot> {
        Ok(self.ledger.snapshot()?)
    }
}

/// Builds the host matching the configured variant.
pub fn host_for(config: Arc<ServiceConfig>, ledger: InMemoryLedger) -> CitizenResult<Arc<dyn Host>> {
    Ok(match config.variant() {
        RecordVariant::Health => Arc::new(LedgerHost::<HealthRecord>::new(config, ledger)?),
        RecordVariant::Academic => Arc::new(LedgerHost::<AcademicRecord>::new(config, ledger)?),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;

    fn caller(role: &str) -> CallerAttributes {
        CallerAttributes::new()
            .with("username", "tester")
            .with("role", role)
    }

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn picks_the_configured_variant() {
        let academic = Arc::new(ServiceConfig::for_variant(RecordVariant::Academic));
        let host = host_for(academic, InMemoryLedger::new()).unwrap();
        assert_eq!(host.variant(), RecordVariant::Academic);
    }

    #[test]
    fn failed_invocations_write_nothing() {
        let host = host_for(
            Arc::new(ServiceConfig::for_variant(RecordVariant::Health)),
            InMemoryLedger::new(),
        )
        .unwrap();
        host.invoke(&caller("govt_admin"), "create", &args(&["P1", "d", "g"]))
            .unwrap();
        let before = host.snapshot().unwrap();

        let err = host
            .invoke(&caller("govt_admin"), "create", &args(&["P1", "d", "g"]))
            .expect_err("duplicate");
        assert_eq!(err.kind(), ErrorKind::DuplicateId);
        assert_eq!(host.snapshot().unwrap(), before);
    }

    #[test]
    fn queries_never_commit() {
        let host = host_for(
            Arc::new(ServiceConfig::for_variant(RecordVariant::Health)),
            InMemoryLedger::new(),
        )
        .unwrap();
        host.query(&caller("person"), "heartbeat", &[]).unwrap();
        assert!(host.snapshot().unwrap().is_empty());
    }
}
