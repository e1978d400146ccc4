//! Zenith Pay Ledger
//!
//! The escrow channel ledger, the substrate it moves value on, and the
//! settlement address registry that binds identities to Bitcoin addresses.

pub mod substrate;
pub mod adapters;
pub mod ledger;
pub mod registry;

pub use adapters::memory::InMemorySubstrate;
pub use ledger::ChannelLedger;
pub use registry::{RegisterOutcome, SettlementBinding, SettlementRegistry};
pub use substrate::{Substrate, TransferReceipt};
