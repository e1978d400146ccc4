//! Integration test: settlement address registry alongside the ledger.

use zenith_core::ChannelError;
use zenith_integration_tests::{funded_ledger, principal};
use zenith_ledger::registry::MAX_ADDRESS_LEN;
use zenith_ledger::{RegisterOutcome, SettlementRegistry};

#[test]
fn test_register_lookup_overwrite() {
    let registry = SettlementRegistry::new();
    let deployer = principal("deployer");

    assert_eq!(registry.lookup(&deployer), None);

    assert_eq!(
        registry.register(&deployer, "bc1qfirstaddress").unwrap(),
        RegisterOutcome::Created
    );
    assert_eq!(
        registry.register(&deployer, "bc1qfirstaddress").unwrap(),
        RegisterOutcome::Unchanged
    );
    assert_eq!(
        registry.register(&deployer, "bc1qsecondaddress").unwrap(),
        RegisterOutcome::Replaced {
            previous: "bc1qfirstaddress".into()
        }
    );
    assert_eq!(
        registry.lookup(&deployer).as_deref(),
        Some("bc1qsecondaddress")
    );
    assert_eq!(registry.len(), 1);
}

#[test]
fn test_registry_independent_of_channels() {
    let mut ledger = funded_ledger(&["deployer", "wallet_1"]);
    let registry = SettlementRegistry::new();
    let sender = principal("deployer");
    let receiver = principal("wallet_1");

    // A receiver with no registered address can still be paid.
    let id = ledger.create_channel(&sender, &receiver, 1_000).unwrap();
    ledger.execute_payment(&sender, id, 1_000).unwrap();
    ledger.confirm_payment(&receiver, id).unwrap();
    assert!(registry.lookup(&receiver).is_none());

    registry.register(&receiver, "bc1qreceiver").unwrap();
    assert_eq!(registry.lookup(&receiver).as_deref(), Some("bc1qreceiver"));
    assert!(registry.lookup(&sender).is_none());
}

#[test]
fn test_registry_concurrent_writers() {
    let registry = std::sync::Arc::new(SettlementRegistry::new());
    let handles: Vec<_> = (0..8)
        .map(|i| {
            let registry = registry.clone();
            std::thread::spawn(move || {
                let owner = principal(&format!("wallet_{i}"));
                for round in 0..50 {
                    registry
                        .register(&owner, &format!("bc1q{i}x{round}"))
                        .unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(registry.len(), 8);
    for i in 0..8 {
        assert_eq!(
            registry.lookup(&principal(&format!("wallet_{i}"))),
            Some(format!("bc1q{i}x49"))
        );
    }
}

#[test]
fn test_racing_first_registrations_create_once() {
    let registry = std::sync::Arc::new(SettlementRegistry::new());
    let owner = principal("wallet_1");
    let handles: Vec<_> = (0..8)
        .map(|i| {
            let registry = registry.clone();
            let owner = owner.clone();
            std::thread::spawn(move || registry.register(&owner, &format!("bc1qrace{i}")).unwrap())
        })
        .collect();
    let outcomes: Vec<RegisterOutcome> = handles
        .into_iter()
        .map(|handle| handle.join().unwrap())
        .collect();

    let created = outcomes
        .iter()
        .filter(|outcome| **outcome == RegisterOutcome::Created)
        .count();
    assert_eq!(created, 1);
    assert_eq!(registry.len(), 1);
}

#[test]
fn test_address_is_stored_as_given() {
    let registry = SettlementRegistry::new();
    let owner = principal("wallet_1");
    registry.register(&owner, "  bc1q whitespace kept\t").unwrap();
    assert_eq!(
        registry.lookup(&owner).as_deref(),
        Some("  bc1q whitespace kept\t")
    );
}

#[test]
fn test_oversized_address_rejected() {
    let registry = SettlementRegistry::new();
    let address = "x".repeat(MAX_ADDRESS_LEN + 1);
    let err = registry.register(&principal("deployer"), &address).unwrap_err();
    assert!(matches!(err, ChannelError::InvalidAddress(_)));
    assert_eq!(err.code(), 110);
    assert!(registry.is_empty());
}
