use serde::{Deserialize, Serialize};
use uuid::Uuid;
use zenith_core::{Amount, BlockHeight, ChannelError, Principal};

/// Proof that value moved between two accounts on the substrate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferReceipt {
    /// Transfer identifier (UUID v7, time-ordered).
    pub id: Uuid,
    pub from: Principal,
    pub to: Principal,
    pub amount: Amount,
    /// Height at which the transfer was applied.
    pub height: BlockHeight,
}

/// The ledger substrate the channel ledger runs on.
///
/// Implementations provide the three primitives the channel logic needs:
/// the current block height, account balances, and an all-or-nothing value
/// transfer. A transfer that fails must leave every balance untouched.
pub trait Substrate: Send {
    /// Current block height. Never decreases.
    fn height(&self) -> BlockHeight;

    /// Spendable balance of an account. Unknown accounts hold zero.
    fn balance_of(&self, who: &Principal) -> Amount;

    /// Move `amount` from `from` to `to`.
    fn transfer(
        &mut self,
        from: &Principal,
        to: &Principal,
        amount: Amount,
    ) -> Result<TransferReceipt, ChannelError>;
}
