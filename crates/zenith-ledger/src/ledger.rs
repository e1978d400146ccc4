use std::collections::BTreeMap;

use zenith_core::{
    Amount, BlockHeight, Channel, ChannelError, ChannelId, ChannelInfo, ChannelState,
    LedgerConfig, Principal,
};

use crate::substrate::Substrate;

/// The escrow channel ledger.
///
/// Owns every channel record and drives their transitions. Funds are moved
/// on the substrate `S`: into the escrow account at creation, out of it on
/// confirmation and close.
///
/// Each operation validates every precondition first and performs its single
/// substrate transfer before touching the channel record, so a call either
/// applies fully or leaves ledger and substrate unchanged. Callers must apply
/// operations one at a time; the ledger takes `&mut self` for every mutation.
pub struct ChannelLedger<S> {
    config: LedgerConfig,
    escrow: Principal,
    substrate: S,
    channels: BTreeMap<ChannelId, Channel>,
    next_id: ChannelId,
}

impl<S: Substrate> ChannelLedger<S> {
    /// Create an empty ledger over `substrate`.
    pub fn new(config: LedgerConfig, substrate: S) -> Result<Self, ChannelError> {
        Self::restore(config, substrate, Vec::new())
    }

    /// Rebuild a ledger from persisted channel records.
    ///
    /// The next id continues after the highest restored id. Fails with
    /// `CorruptRecord` if a record breaks the channel invariants, an id is
    /// repeated, or the escrow account does not hold exactly the unsettled
    /// funds of the active channels.
    pub fn restore(
        config: LedgerConfig,
        substrate: S,
        channels: impl IntoIterator<Item = Channel>,
    ) -> Result<Self, ChannelError> {
        let escrow = Principal::new(config.escrow_principal.clone())?;
        let mut restored: BTreeMap<ChannelId, Channel> = BTreeMap::new();
        for channel in channels {
            if !channel.is_consistent() {
                return Err(ChannelError::CorruptRecord(format!(
                    "channel {} breaks its balance invariants",
                    channel.id()
                )));
            }
            if let Some(previous) = restored.insert(channel.id(), channel) {
                return Err(ChannelError::CorruptRecord(format!(
                    "channel {} stored twice",
                    previous.id()
                )));
            }
        }
        let channels = restored;

        let expected: Amount = channels
            .values()
            .filter(|ch| ch.state() == ChannelState::Active)
            .map(Channel::unsettled)
            .sum();
        let held = substrate.balance_of(&escrow);
        if held != expected {
            return Err(ChannelError::CorruptRecord(format!(
                "escrow holds {held}, active channels need {expected}"
            )));
        }
        let next_id = channels
            .keys()
            .next_back()
            .map(|id| id.next())
            .unwrap_or(ChannelId::FIRST);

        tracing::info!(
            channels = channels.len(),
            next_id = %next_id,
            escrow = %escrow,
            refund_window = config.refund_window,
            "channel ledger ready"
        );

        Ok(Self {
            config,
            escrow,
            substrate,
            channels,
            next_id,
        })
    }

    /// `create-channel`: escrow `amount` from `caller` into a new channel
    /// payable to `receiver`.
    pub fn create_channel(
        &mut self,
        caller: &Principal,
        receiver: &Principal,
        amount: Amount,
    ) -> Result<ChannelId, ChannelError> {
        if amount == 0 {
            return Err(ChannelError::InvalidAmount(
                "channel amount must be greater than zero".into(),
            ));
        }
        if caller == &self.escrow || receiver == &self.escrow {
            return Err(ChannelError::InvalidPrincipal(
                "the escrow account cannot be a channel party".into(),
            ));
        }

        let id = self.next_id;
        let height = self.substrate.height();
        let channel = Channel::open(id, caller.clone(), receiver.clone(), amount, height)?;

        self.substrate.transfer(caller, &self.escrow, amount)?;
        self.channels.insert(id, channel);
        self.next_id = id.next();

        tracing::info!(
            channel_id = %id,
            sender = %caller,
            receiver = %receiver,
            capacity = amount,
            "channel created"
        );
        Ok(id)
    }

    /// `execute-payment`: put `amount` in flight. Returns the refund deadline.
    pub fn execute_payment(
        &mut self,
        caller: &Principal,
        channel_id: ChannelId,
        amount: Amount,
    ) -> Result<BlockHeight, ChannelError> {
        let height = self.substrate.height();
        let window = self.config.refund_window;
        let channel = self
            .channels
            .get_mut(&channel_id)
            .ok_or(ChannelError::ChannelNotFound(channel_id))?;

        channel.ensure_active()?;
        channel.ensure_sender(caller)?;
        let deadline = channel.begin_payment(amount, height, window)?;

        tracing::info!(
            channel_id = %channel_id,
            amount,
            deadline,
            "payment executed"
        );
        Ok(deadline)
    }

    /// `confirm-payment`: release the pending amount to the receiver.
    ///
    /// Allowed at any time while a payment is pending, including after its
    /// refund deadline. Returns the amount transferred.
    pub fn confirm_payment(
        &mut self,
        caller: &Principal,
        channel_id: ChannelId,
    ) -> Result<Amount, ChannelError> {
        let channel = self
            .channels
            .get_mut(&channel_id)
            .ok_or(ChannelError::ChannelNotFound(channel_id))?;

        channel.ensure_active()?;
        if !channel.slot().is_pending() {
            return Err(ChannelError::NoPendingPayment(channel_id));
        }
        channel.ensure_receiver(caller)?;

        let amount = channel.slot().amount();
        let receipt = self
            .substrate
            .transfer(&self.escrow, channel.receiver(), amount)?;
        channel.settle_pending()?;

        tracing::info!(
            channel_id = %channel_id,
            amount,
            balance = channel.balance(),
            transfer_id = %receipt.id,
            "payment confirmed"
        );
        Ok(amount)
    }

    /// `refund-payment`: drop a pending payment whose deadline has passed.
    ///
    /// The amount never left escrow, so nothing is transferred; the capacity
    /// simply becomes available for another `execute_payment`. Returns the
    /// released amount.
    pub fn refund_payment(
        &mut self,
        caller: &Principal,
        channel_id: ChannelId,
    ) -> Result<Amount, ChannelError> {
        let height = self.substrate.height();
        let channel = self
            .channels
            .get_mut(&channel_id)
            .ok_or(ChannelError::ChannelNotFound(channel_id))?;

        channel.ensure_active()?;
        channel.ensure_sender(caller)?;
        let amount = channel.release_pending(height)?;

        tracing::info!(
            channel_id = %channel_id,
            amount,
            height,
            "payment refunded"
        );
        Ok(amount)
    }

    /// `close-channel`: return the unsettled escrow to the sender and mark the
    /// channel closed. Either party may close an idle channel.
    ///
    /// Returns the amount sent back to the sender.
    pub fn close_channel(
        &mut self,
        caller: &Principal,
        channel_id: ChannelId,
    ) -> Result<Amount, ChannelError> {
        let channel = self
            .channels
            .get_mut(&channel_id)
            .ok_or(ChannelError::ChannelNotFound(channel_id))?;

        channel.ensure_active()?;
        channel.ensure_party(caller)?;
        if channel.slot().is_pending() {
            return Err(ChannelError::PaymentInFlight(channel_id));
        }

        let returned = channel.unsettled();
        if returned > 0 {
            self.substrate
                .transfer(&self.escrow, channel.sender(), returned)?;
        }
        channel.close()?;

        tracing::info!(
            channel_id = %channel_id,
            closed_by = %caller,
            returned,
            "channel closed"
        );
        Ok(returned)
    }

    /// `get-channel-info`.
    pub fn get_channel_info(&self, channel_id: ChannelId) -> Option<ChannelInfo> {
        self.channels.get(&channel_id).map(Channel::info)
    }

    pub fn channel(&self, channel_id: ChannelId) -> Option<&Channel> {
        self.channels.get(&channel_id)
    }

    /// Channels where `who` is sender or receiver, ordered by id.
    pub fn channels_for(&self, who: &Principal) -> Vec<ChannelInfo> {
        self.channels
            .values()
            .filter(|ch| ch.is_party(who))
            .map(Channel::info)
            .collect()
    }

    /// All channel records, ordered by id.
    pub fn channels(&self) -> impl Iterator<Item = &Channel> {
        self.channels.values()
    }

    /// Total the escrow account should hold: unsettled funds of every active
    /// channel.
    pub fn escrowed_total(&self) -> Amount {
        self.channels
            .values()
            .filter(|ch| ch.state() == ChannelState::Active)
            .map(Channel::unsettled)
            .sum()
    }

    pub fn height(&self) -> BlockHeight {
        self.substrate.height()
    }

    pub fn escrow(&self) -> &Principal {
        &self.escrow
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    pub fn substrate(&self) -> &S {
        &self.substrate
    }

    pub fn substrate_mut(&mut self) -> &mut S {
        &mut self.substrate
    }

    /// Id the next created channel will receive.
    pub fn next_id(&self) -> ChannelId {
        self.next_id
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }
}
