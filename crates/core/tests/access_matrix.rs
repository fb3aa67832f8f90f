//! Every operation, called by every role outside its permitted set, is denied without
//! writing anything.

use citizen_core::constants::SUB_RECORD_FIELD_COUNT;
use citizen_core::{
    AccessPolicy, CallerAttributes, CitizenError, HealthRecord, InMemoryLedger, Operation,
    OperationRouter, RecordVariant, Role, ServiceConfig, Surface,
};
use std::sync::Arc;

const ROLES: [(&str, Option<Role>); 5] = [
    ("person", Some(Role::Subject)),
    ("healthcare_user", Some(Role::DomainUser)),
    ("healthcare_admin", Some(Role::DomainAdmin)),
    ("govt_admin", Some(Role::RegistryAdmin)),
    ("auditor", None),
];

fn caller(role: &str) -> CallerAttributes {
    CallerAttributes::new()
        .with("username", "matrix")
        .with("role", role)
}

fn valid_args(op: Operation) -> Vec<String> {
    let mut args: Vec<String> = match op {
        Operation::Create => vec!["P2".into(), "2001-02-03".into(), "F".into()],
        Operation::AddSubRecord => {
            let mut a = vec!["P1".to_string(), "H2".to_string()];
            a.extend((0..SUB_RECORD_FIELD_COUNT).map(|i| format!("f{i}")));
            a
        }
        Operation::CloseSubRecord => {
            vec!["P1".into(), "H1".into(), "2020-01-01".into(), "done".into()]
        }
        Operation::WriteKey => vec!["scratch".into(), "value".into()],
        Operation::GetCredential => vec!["alice".into()],
        _ => vec!["P1".to_string()],
    };
    args.resize(op.arity(), "value".to_string());
    args
}

fn seeded() -> (InMemoryLedger, OperationRouter<HealthRecord>) {
    let config = Arc::new(ServiceConfig::for_variant(RecordVariant::Health));
    let router = OperationRouter::new(config).unwrap();
    let ledger = InMemoryLedger::new();

    let mut tx = ledger.begin(caller("govt_admin"));
    router
        .initialise(&mut tx, &["alice".to_string(), "cert".to_string()])
        .unwrap();
    router
        .invoke(
            &mut tx,
            "create",
            &["P1".to_string(), "1990-01-01".to_string(), "M".to_string()],
        )
        .unwrap();
    tx.commit().unwrap();

    let mut tx = ledger.begin(caller("healthcare_admin"));
    router
        .invoke(&mut tx, "addSubRecord", &{
            let mut a = vec!["P1".to_string(), "H1".to_string()];
            a.extend((0..SUB_RECORD_FIELD_COUNT).map(|i| format!("f{i}")));
            a
        })
        .unwrap();
    tx.commit().unwrap();

    (ledger, router)
}

#[test]
fn denied_roles_get_permission_denied_and_write_nothing() {
    let (ledger, router) = seeded();
    let policy = AccessPolicy::new(RecordVariant::Health);
    let mut denials = 0;

    for op in Operation::ALL {
        for (attribute, role) in ROLES {
            if policy.allowed(op).permits(role) {
                continue;
            }
            let mut tx = ledger.begin(caller(attribute));
            let result = if op.on_surface(Surface::Invoke) {
                router.invoke(&mut tx, op.name(), &valid_args(op))
            } else {
                router.query(&mut tx, op.name(), &valid_args(op))
            };

            match result {
                Err(CitizenError::PermissionDenied { operation, role }) => {
                    assert_eq!(operation, op.name());
                    assert_eq!(role, attribute);
                }
                other => panic!("{op} as {attribute}: expected denial, got {other:?}"),
            }
            assert!(tx.write_set().is_empty(), "{op} as {attribute} wrote");
            denials += 1;
        }
    }
    assert!(denials > 0);
}

#[test]
fn permitted_roles_are_not_denied() {
    let (ledger, router) = seeded();
    let policy = AccessPolicy::new(RecordVariant::Health);

    for op in Operation::ALL {
        for (attribute, role) in ROLES {
            if !policy.allowed(op).permits(role) {
                continue;
            }
            let mut tx = ledger.begin(caller(attribute));
            let result = if op.on_surface(Surface::Invoke) {
                router.invoke(&mut tx, op.name(), &valid_args(op))
            } else {
                router.query(&mut tx, op.name(), &valid_args(op))
            };
            assert!(
                !matches!(result, Err(CitizenError::PermissionDenied { .. })),
                "{op} as {attribute}: {result:?}"
            );
        }
    }
}
