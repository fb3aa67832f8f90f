//! Concurrent `create` calls all touch the registry document. These tests check that the
//! ledger's read-set validation turns the lost update into a conflict, and that the host's
//! retry makes every created ID land in the registry exactly once.

use citizen_core::constants::REGISTRY_KEY;
use citizen_core::{
    host_for, CallerAttributes, CitizenError, IdIndex, InMemoryLedger, Ledger, LedgerError,
    OperationRouter, RecordVariant, ServiceConfig,
};
use std::sync::{Arc, Barrier};
use std::thread;

fn registry_admin() -> CallerAttributes {
    CallerAttributes::new()
        .with("username", "registrar")
        .with("role", "govt_admin")
}

fn create_args(id: &str) -> Vec<String> {
    vec![id.to_string(), "1990-01-01".to_string(), "F".to_string()]
}

fn registered(ledger: &InMemoryLedger) -> Vec<String> {
    let mut tx = ledger.begin(CallerAttributes::new());
    let bytes = tx
        .get_state(REGISTRY_KEY)
        .unwrap()
        .expect("registry written");
    serde_json::from_slice::<IdIndex>(&bytes).unwrap().ids
}

#[test]
fn losing_create_conflicts_at_commit() {
    let config = Arc::new(ServiceConfig::for_variant(RecordVariant::Health));
    let router = OperationRouter::<citizen_core::HealthRecord>::new(config).unwrap();
    let ledger = InMemoryLedger::new();

    let mut first = ledger.begin(registry_admin());
    let mut second = ledger.begin(registry_admin());
    router.invoke(&mut first, "create", &create_args("P1")).unwrap();
    router.invoke(&mut second, "create", &create_args("P2")).unwrap();

    first.commit().unwrap();
    let lost = second.commit().expect_err("stale registry read");
    assert_eq!(
        lost,
        LedgerError::Conflict {
            key: REGISTRY_KEY.to_string()
        }
    );
    assert!(CitizenError::from(lost).is_conflict());
    assert_eq!(registered(&ledger), vec!["P1"]);
}

#[test]
fn retried_creates_all_register_exactly_once() {
    let ledger = InMemoryLedger::new();
    let config = ServiceConfig::new(
        RecordVariant::Health,
        citizen_core::RoleMapping::health(),
        16,
    )
    .unwrap();
    let host = host_for(Arc::new(config), ledger.clone()).unwrap();

    let ids: Vec<String> = (0..8).map(|i| format!("P{i}")).collect();
    let barrier = Arc::new(Barrier::new(ids.len()));

    let handles: Vec<_> = ids
        .iter()
        .cloned()
        .map(|id| {
            let host = Arc::clone(&host);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                host.invoke(&registry_admin(), "create", &create_args(&id))
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap().unwrap();
    }

    let mut listed = registered(&ledger);
    listed.sort();
    let mut expected = ids.clone();
    expected.sort();
    assert_eq!(listed, expected);

    let person = CallerAttributes::new()
        .with("username", "someone")
        .with("role", "person");
    let all = host.query(&person, "listAll", &[]).unwrap();
    let citizens: Vec<serde_json::Value> = serde_json::from_slice(&all.payload).unwrap();
    assert_eq!(citizens.len(), ids.len());
}

#[test]
fn racing_creates_of_the_same_id_leave_one_citizen() {
    let ledger = InMemoryLedger::new();
    let host = host_for(
        Arc::new(ServiceConfig::for_variant(RecordVariant::Health)),
        ledger.clone(),
    )
    .unwrap();
    let barrier = Arc::new(Barrier::new(4));

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let host = Arc::clone(&host);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                host.invoke(&registry_admin(), "create", &create_args("P1"))
            })
        })
        .collect();
    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert_eq!(registered(&ledger), vec!["P1"]);
}
