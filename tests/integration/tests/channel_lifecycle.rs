//! Integration test: channel lifecycle across zenith-core and zenith-ledger.
//!
//! Drives the ledger the way a node does: create, execute, confirm, refund,
//! and close against the in-memory substrate, checking escrow conservation
//! after every step.

use zenith_core::{ChannelError, ChannelId, ChannelState, ErrorKind, LedgerConfig, REFUND_WINDOW};
use zenith_integration_tests::{
    assert_conserved, funded_ledger, funded_ledger_with, principal, STARTING_BALANCE,
};
use zenith_ledger::Substrate;

// =========================================================================
// Refund after timeout
// =========================================================================

#[test]
fn test_refund_after_timeout_scenario() {
    let mut ledger = funded_ledger(&["deployer", "wallet_1"]);
    let supply = ledger.substrate().total_supply();
    let sender = principal("deployer");
    let receiver = principal("wallet_1");

    let id = ledger
        .create_channel(&sender, &receiver, 2_000_000)
        .expect("create should succeed");
    assert_conserved(&ledger, supply);

    let start = ledger.height();
    ledger
        .execute_payment(&sender, id, 1_000_000)
        .expect("execute should succeed");
    let info = ledger.get_channel_info(id).unwrap();
    assert_eq!(info.pending, 1_000_000);
    assert_eq!(info.timeout, start + REFUND_WINDOW);

    ledger.substrate_mut().advance(REFUND_WINDOW);
    ledger
        .refund_payment(&sender, id)
        .expect("refund should succeed once the window has passed");

    let info = ledger.get_channel_info(id).unwrap();
    assert_eq!(info.pending, 0);
    assert_eq!(info.timeout, 0);
    assert_eq!(info.balance, 0);
    assert_eq!(info.state, ChannelState::Active);
    assert_conserved(&ledger, supply);
}

// =========================================================================
// Confirm flow
// =========================================================================

#[test]
fn test_execute_confirm_credits_receiver() {
    let mut ledger = funded_ledger(&["deployer", "wallet_1"]);
    let supply = ledger.substrate().total_supply();
    let sender = principal("deployer");
    let receiver = principal("wallet_1");

    let id = ledger.create_channel(&sender, &receiver, 2_000_000).unwrap();
    ledger.execute_payment(&sender, id, 750_000).unwrap();
    ledger.confirm_payment(&receiver, id).unwrap();

    let info = ledger.get_channel_info(id).unwrap();
    assert_eq!(info.balance, 750_000);
    assert_eq!(info.pending, 0);
    assert_eq!(
        ledger.substrate().balance_of(&receiver),
        STARTING_BALANCE + 750_000
    );
    assert_eq!(
        ledger.substrate().balance_of(&sender),
        STARTING_BALANCE - 2_000_000
    );
    assert_conserved(&ledger, supply);
}

#[test]
fn test_many_payments_then_close() {
    let mut ledger = funded_ledger(&["deployer", "wallet_1"]);
    let supply = ledger.substrate().total_supply();
    let sender = principal("deployer");
    let receiver = principal("wallet_1");

    let id = ledger.create_channel(&sender, &receiver, 10_000).unwrap();
    for amount in [1_000, 2_500, 500] {
        ledger.execute_payment(&sender, id, amount).unwrap();
        ledger.confirm_payment(&receiver, id).unwrap();
        assert_conserved(&ledger, supply);
    }

    // An expired payment is refunded and its amount offered again.
    ledger.execute_payment(&sender, id, 6_000).unwrap();
    ledger.substrate_mut().advance(REFUND_WINDOW + 5);
    ledger.refund_payment(&sender, id).unwrap();
    assert_eq!(ledger.channel(id).unwrap().remaining(), 6_000);

    let returned = ledger.close_channel(&sender, id).unwrap();
    assert_eq!(returned, 6_000);
    assert_eq!(
        ledger.substrate().balance_of(&sender),
        STARTING_BALANCE - 4_000
    );
    assert_eq!(
        ledger.substrate().balance_of(&receiver),
        STARTING_BALANCE + 4_000
    );
    assert_eq!(
        ledger.get_channel_info(id).unwrap().state,
        ChannelState::Closed
    );
    assert_conserved(&ledger, supply);
}

// =========================================================================
// Rejections leave state untouched
// =========================================================================

#[test]
fn test_rejected_calls_change_nothing() {
    let mut ledger = funded_ledger(&["deployer", "wallet_1", "wallet_2"]);
    let supply = ledger.substrate().total_supply();
    let sender = principal("deployer");
    let receiver = principal("wallet_1");
    let stranger = principal("wallet_2");

    let id = ledger.create_channel(&sender, &receiver, 1_000).unwrap();
    ledger.execute_payment(&sender, id, 400).unwrap();
    let before = ledger.get_channel_info(id).unwrap();
    let journal_len = ledger.substrate().journal().len();

    let failures = [
        ledger.execute_payment(&sender, id, 1).unwrap_err(),
        ledger.execute_payment(&stranger, id, 1).unwrap_err(),
        ledger.confirm_payment(&stranger, id).unwrap_err(),
        ledger.refund_payment(&sender, id).unwrap_err(),
        ledger.refund_payment(&receiver, id).unwrap_err(),
        ledger.close_channel(&sender, id).unwrap_err(),
        ledger.execute_payment(&sender, ChannelId(77), 1).unwrap_err(),
    ];
    let kinds: Vec<ErrorKind> = failures.iter().map(ChannelError::kind).collect();
    assert_eq!(
        kinds,
        vec![
            ErrorKind::InvalidState,
            ErrorKind::NotAuthorized,
            ErrorKind::NotAuthorized,
            ErrorKind::InvalidState,
            ErrorKind::NotAuthorized,
            ErrorKind::InvalidState,
            ErrorKind::NotFound,
        ]
    );

    assert_eq!(ledger.get_channel_info(id).unwrap(), before);
    assert_eq!(ledger.substrate().journal().len(), journal_len);
    assert_conserved(&ledger, supply);
}

#[test]
fn test_create_beyond_balance_fails_without_allocating_id() {
    let mut ledger = funded_ledger(&["deployer", "wallet_1"]);
    let sender = principal("deployer");
    let receiver = principal("wallet_1");

    let err = ledger
        .create_channel(&sender, &receiver, STARTING_BALANCE + 1)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InsufficientFunds);
    assert_eq!(err.code(), 102);

    let id = ledger.create_channel(&sender, &receiver, 1).unwrap();
    assert_eq!(id, ChannelId::FIRST);
}

// =========================================================================
// Independent channels and configuration
// =========================================================================

#[test]
fn test_channels_are_independent() {
    let mut ledger = funded_ledger(&["deployer", "wallet_1", "wallet_2"]);
    let supply = ledger.substrate().total_supply();
    let deployer = principal("deployer");
    let wallet1 = principal("wallet_1");
    let wallet2 = principal("wallet_2");

    let a = ledger.create_channel(&deployer, &wallet1, 5_000).unwrap();
    let b = ledger.create_channel(&deployer, &wallet2, 5_000).unwrap();
    let c = ledger.create_channel(&wallet1, &wallet2, 5_000).unwrap();

    ledger.execute_payment(&deployer, a, 1_000).unwrap();
    ledger.execute_payment(&deployer, b, 2_000).unwrap();
    ledger.execute_payment(&wallet1, c, 3_000).unwrap();

    ledger.confirm_payment(&wallet2, b).unwrap();
    ledger.substrate_mut().advance(REFUND_WINDOW);
    ledger.refund_payment(&deployer, a).unwrap();
    ledger.confirm_payment(&wallet2, c).unwrap();

    assert_eq!(ledger.get_channel_info(a).unwrap().balance, 0);
    assert_eq!(ledger.get_channel_info(b).unwrap().balance, 2_000);
    assert_eq!(ledger.get_channel_info(c).unwrap().balance, 3_000);
    assert_eq!(ledger.channels_for(&wallet2).len(), 2);
    assert_conserved(&ledger, supply);
}

#[test]
fn test_custom_refund_window() {
    let config = LedgerConfig {
        refund_window: 10,
        ..LedgerConfig::default()
    };
    let mut ledger = funded_ledger_with(config, &["deployer", "wallet_1"]);
    let sender = principal("deployer");
    let receiver = principal("wallet_1");

    let id = ledger.create_channel(&sender, &receiver, 100).unwrap();
    assert_eq!(ledger.execute_payment(&sender, id, 50).unwrap(), 10);

    ledger.substrate_mut().advance(9);
    assert!(matches!(
        ledger.refund_payment(&sender, id),
        Err(ChannelError::TimeoutNotReached {
            deadline: 10,
            height: 9,
            ..
        })
    ));
    ledger.substrate_mut().advance(1);
    assert_eq!(ledger.refund_payment(&sender, id).unwrap(), 50);
}

#[test]
fn test_channel_info_json_shape() {
    let mut ledger = funded_ledger(&["deployer", "wallet_1"]);
    let id = ledger
        .create_channel(&principal("deployer"), &principal("wallet_1"), 2_000_000)
        .unwrap();

    let json = serde_json::to_value(ledger.get_channel_info(id).unwrap()).unwrap();
    assert_eq!(json["id"], 1);
    assert_eq!(json["sender"], "deployer");
    assert_eq!(json["receiver"], "wallet_1");
    assert_eq!(json["capacity"], 2_000_000);
    assert_eq!(json["pending"], 0);
    assert_eq!(json["timeout"], 0);
    assert_eq!(json["state"], "ACTIVE");
}
