use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ChannelError;

/// Value in the substrate's smallest unit (micro-STX, satoshis, ...).
pub type Amount = u128;

/// Ledger block height.
pub type BlockHeight = u64;

/// Number of blocks a pending payment stays confirm-only before the sender
/// may reclaim it. 144 blocks is roughly one day at ten-minute spacing.
pub const REFUND_WINDOW: BlockHeight = 144;

/// Longest identity string accepted by [`Principal::new`].
pub const MAX_PRINCIPAL_LEN: usize = 128;

/// An on-chain identity as attributed by the substrate.
///
/// The ledger never authenticates principals; it only compares them.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Principal(String);

impl Principal {
    /// Create a principal, rejecting empty, oversized, or whitespace-bearing strings.
    pub fn new(id: impl Into<String>) -> Result<Self, ChannelError> {
        let id = id.into();
        if id.is_empty() {
            return Err(ChannelError::InvalidPrincipal("principal must not be empty".into()));
        }
        if id.len() > MAX_PRINCIPAL_LEN {
            return Err(ChannelError::InvalidPrincipal(format!(
                "principal longer than {} bytes",
                MAX_PRINCIPAL_LEN
            )));
        }
        if id.chars().any(char::is_whitespace) {
            return Err(ChannelError::InvalidPrincipal(format!(
                "principal contains whitespace: {:?}",
                id
            )));
        }
        Ok(Self(id))
    }

    /// The raw identity string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for Principal {
    type Err = ChannelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Monotonically assigned channel identifier. The first channel is `1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChannelId(pub u64);

impl ChannelId {
    /// The id handed to the very first channel of a fresh ledger.
    pub const FIRST: ChannelId = ChannelId(1);

    /// The id following this one.
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }

    /// Big-endian bytes, used as a storage key so ids sort numerically.
    pub fn to_key(self) -> [u8; 8] {
        self.0.to_be_bytes()
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
