use serde::{Deserialize, Serialize};
use std::fmt;

use crate::types::{Amount, BlockHeight, ChannelId};

/// Coarse error classes callers can branch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    /// The referenced channel does not exist.
    NotFound,
    /// The caller is not the party the operation requires.
    NotAuthorized,
    /// The channel's payment slot or lifecycle state rejects the operation.
    InvalidState,
    /// Not enough funds or escrow room to cover the request.
    InsufficientFunds,
    /// A malformed argument (zero amount, bad principal or address).
    InvalidArgument,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "NotFound"),
            Self::NotAuthorized => write!(f, "NotAuthorized"),
            Self::InvalidState => write!(f, "InvalidState"),
            Self::InsufficientFunds => write!(f, "InsufficientFunds"),
            Self::InvalidArgument => write!(f, "InvalidArgument"),
        }
    }
}

/// Channel ledger errors.
///
/// Every variant is recoverable: a failed call leaves the ledger untouched and
/// the caller decides whether to resubmit.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChannelError {
    #[error("caller {caller} is not authorized on channel {channel_id}")]
    NotAuthorized { channel_id: ChannelId, caller: String },

    #[error("channel not found: {0}")]
    ChannelNotFound(ChannelId),

    #[error("insufficient funds: available {available}, required {required}")]
    InsufficientFunds { available: Amount, required: Amount },

    #[error("capacity exceeded on channel {channel_id}: requested {requested}, available {available}")]
    CapacityExceeded {
        channel_id: ChannelId,
        requested: Amount,
        available: Amount,
    },

    #[error("payment already in flight on channel {0}")]
    PaymentInFlight(ChannelId),

    #[error("no pending payment on channel {0}")]
    NoPendingPayment(ChannelId),

    #[error("refund timeout not reached on channel {channel_id}: deadline {deadline}, height {height}")]
    TimeoutNotReached {
        channel_id: ChannelId,
        deadline: BlockHeight,
        height: BlockHeight,
    },

    #[error("channel {0} is closed")]
    ChannelClosed(ChannelId),

    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    #[error("invalid principal: {0}")]
    InvalidPrincipal(String),

    #[error("invalid settlement address: {0}")]
    InvalidAddress(String),

    /// Persisted state failed validation on restore.
    #[error("corrupt ledger record: {0}")]
    CorruptRecord(String),
}

impl ChannelError {
    /// Stable numeric code reported as `(err code)` on the external interface.
    pub fn code(&self) -> u32 {
        match self {
            Self::NotAuthorized { .. } => 100,
            Self::ChannelNotFound(_) => 101,
            Self::InsufficientFunds { .. } => 102,
            Self::CapacityExceeded { .. } => 103,
            Self::PaymentInFlight(_) => 104,
            Self::NoPendingPayment(_) => 105,
            Self::TimeoutNotReached { .. } => 106,
            Self::ChannelClosed(_) => 107,
            Self::InvalidAmount(_) => 108,
            Self::InvalidPrincipal(_) => 109,
            Self::InvalidAddress(_) => 110,
            Self::CorruptRecord(_) => 111,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::ChannelNotFound(_) => ErrorKind::NotFound,
            Self::NotAuthorized { .. } => ErrorKind::NotAuthorized,
            Self::PaymentInFlight(_)
            | Self::NoPendingPayment(_)
            | Self::TimeoutNotReached { .. }
            | Self::ChannelClosed(_)
            | Self::CorruptRecord(_) => ErrorKind::InvalidState,
            Self::InsufficientFunds { .. } | Self::CapacityExceeded { .. } => {
                ErrorKind::InsufficientFunds
            }
            Self::InvalidAmount(_) | Self::InvalidPrincipal(_) | Self::InvalidAddress(_) => {
                ErrorKind::InvalidArgument
            }
        }
    }
}
