use std::collections::HashMap;

use uuid::Uuid;
use zenith_core::{Amount, BlockHeight, ChannelError, Principal};

use crate::substrate::{Substrate, TransferReceipt};

/// In-memory substrate: account balances, a block height counter, and a
/// journal of every applied transfer.
///
/// Backs the node's devnet chain and the test suites.
#[derive(Debug, Default)]
pub struct InMemorySubstrate {
    height: BlockHeight,
    balances: HashMap<Principal, Amount>,
    journal: Vec<TransferReceipt>,
}

impl InMemorySubstrate {
    /// Create an empty substrate at height 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a substrate from persisted balances and height.
    pub fn restore(
        height: BlockHeight,
        balances: impl IntoIterator<Item = (Principal, Amount)>,
    ) -> Self {
        Self {
            height,
            balances: balances.into_iter().collect(),
            journal: Vec::new(),
        }
    }

    /// Mint `amount` into an account (genesis allocation, faucet).
    pub fn credit(&mut self, who: &Principal, amount: Amount) -> Amount {
        let balance = self.balances.entry(who.clone()).or_insert(0);
        *balance += amount;
        tracing::debug!(account = %who, amount, balance = *balance, "account credited");
        *balance
    }

    /// Mine `blocks` empty blocks. Returns the new height.
    pub fn advance(&mut self, blocks: BlockHeight) -> BlockHeight {
        self.height = self.height.saturating_add(blocks);
        tracing::trace!(height = self.height, "height advanced");
        self.height
    }

    /// Transfers applied since this substrate was created or restored.
    pub fn journal(&self) -> &[TransferReceipt] {
        &self.journal
    }

    /// All accounts with their balances.
    pub fn accounts(&self) -> impl Iterator<Item = (&Principal, Amount)> {
        self.balances.iter().map(|(who, balance)| (who, *balance))
    }

    /// Sum of every account balance.
    pub fn total_supply(&self) -> Amount {
        self.balances.values().sum()
    }
}

impl Substrate for InMemorySubstrate {
    fn height(&self) -> BlockHeight {
        self.height
    }

    fn balance_of(&self, who: &Principal) -> Amount {
        self.balances.get(who).copied().unwrap_or(0)
    }

    fn transfer(
        &mut self,
        from: &Principal,
        to: &Principal,
        amount: Amount,
    ) -> Result<TransferReceipt, ChannelError> {
        if amount == 0 {
            return Err(ChannelError::InvalidAmount(
                "transfer amount must be greater than zero".into(),
            ));
        }
        let available = self.balance_of(from);
        if available < amount {
            return Err(ChannelError::InsufficientFunds {
                available,
                required: amount,
            });
        }

        // Debit sender
        self.balances.insert(from.clone(), available - amount);
        // Credit receiver
        *self.balances.entry(to.clone()).or_insert(0) += amount;

        let receipt = TransferReceipt {
            id: Uuid::now_v7(),
            from: from.clone(),
            to: to.clone(),
            amount,
            height: self.height,
        };
        self.journal.push(receipt.clone());
        tracing::debug!(
            transfer_id = %receipt.id,
            from = %from,
            to = %to,
            amount,
            "transfer applied"
        );
        Ok(receipt)
    }
}
