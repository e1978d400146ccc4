//! Zenith Pay Core
//!
//! Shared types for the escrow channel ledger. The channel record and its
//! payment slot live in [`channel`]; identities and amounts in [`types`].

pub mod error;
pub mod types;
pub mod channel;
pub mod config;

pub use channel::{Channel, ChannelInfo, ChannelState, PaymentSlot};
pub use config::LedgerConfig;
pub use error::{ChannelError, ErrorKind};
pub use types::{Amount, BlockHeight, ChannelId, Principal, REFUND_WINDOW};
