//! Fixtures shared by the Zenith integration scenarios.

use zenith_core::{Amount, LedgerConfig, Principal};
use zenith_ledger::{ChannelLedger, InMemorySubstrate, Substrate};

/// Starting balance of every fixture account.
pub const STARTING_BALANCE: Amount = 100_000_000;

/// Parse a fixture identity.
pub fn principal(id: &str) -> Principal {
    Principal::new(id).unwrap_or_else(|e| panic!("bad fixture principal {id:?}: {e}"))
}

/// A ledger with default parameters whose `accounts` each hold
/// [`STARTING_BALANCE`].
pub fn funded_ledger(accounts: &[&str]) -> ChannelLedger<InMemorySubstrate> {
    funded_ledger_with(LedgerConfig::default(), accounts)
}

pub fn funded_ledger_with(
    config: LedgerConfig,
    accounts: &[&str],
) -> ChannelLedger<InMemorySubstrate> {
    let mut substrate = InMemorySubstrate::new();
    for id in accounts {
        substrate.credit(&principal(id), STARTING_BALANCE);
    }
    ChannelLedger::new(config, substrate).unwrap_or_else(|e| panic!("ledger setup failed: {e}"))
}

/// The escrow account holds exactly the unsettled funds of every active
/// channel, no supply was created or destroyed, and every channel record is
/// internally consistent.
pub fn assert_conserved(ledger: &ChannelLedger<InMemorySubstrate>, supply: Amount) {
    let substrate = ledger.substrate();
    assert_eq!(
        substrate.balance_of(ledger.escrow()),
        ledger.escrowed_total(),
        "escrow balance diverged from channel records"
    );
    assert_eq!(substrate.total_supply(), supply, "total supply changed");
    assert!(
        ledger.channels().all(|ch| ch.is_consistent()),
        "inconsistent channel record"
    );
}
