use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::ChannelError;
use crate::types::{Amount, BlockHeight, ChannelId, Principal};

/// Lifecycle state of a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChannelState {
    /// Open for payments. Stays active across any number of confirms and refunds.
    Active,
    /// Unsettled escrow returned to the sender. Final state.
    Closed,
}

impl ChannelState {
    /// Whether this is a final (terminal) state.
    pub fn is_final(&self) -> bool {
        matches!(self, Self::Closed)
    }
}

impl fmt::Display for ChannelState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Active => write!(f, "ACTIVE"),
            Self::Closed => write!(f, "CLOSED"),
        }
    }
}

/// The single payment a channel may have in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentSlot {
    /// Nothing in flight.
    Idle,
    /// An executed payment awaiting the receiver's confirmation. After
    /// `deadline` the sender may also release it.
    Pending { amount: Amount, deadline: BlockHeight },
}

impl PaymentSlot {
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending { .. })
    }

    /// In-flight amount, `0` when idle.
    pub fn amount(&self) -> Amount {
        match self {
            Self::Idle => 0,
            Self::Pending { amount, .. } => *amount,
        }
    }

    /// Refund deadline, `0` when idle.
    pub fn deadline(&self) -> BlockHeight {
        match self {
            Self::Idle => 0,
            Self::Pending { deadline, .. } => *deadline,
        }
    }
}

/// An escrow channel from a single sender to a single receiver.
///
/// Identity fields and `capacity` are fixed at [`Channel::open`]. The payment
/// slot and state only move through the transition methods below, each of
/// which validates before touching anything so a rejected call leaves the
/// record as it was.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Channel {
    id: ChannelId,
    sender: Principal,
    receiver: Principal,
    capacity: Amount,
    balance: Amount,
    slot: PaymentSlot,
    state: ChannelState,
    opened_at: BlockHeight,
}

impl Channel {
    /// Open a fresh, idle channel funded with `capacity`.
    pub fn open(
        id: ChannelId,
        sender: Principal,
        receiver: Principal,
        capacity: Amount,
        opened_at: BlockHeight,
    ) -> Result<Self, ChannelError> {
        if capacity == 0 {
            return Err(ChannelError::InvalidAmount(
                "channel capacity must be greater than zero".into(),
            ));
        }
        Ok(Self {
            id,
            sender,
            receiver,
            capacity,
            balance: 0,
            slot: PaymentSlot::Idle,
            state: ChannelState::Active,
            opened_at,
        })
    }

    pub fn id(&self) -> ChannelId {
        self.id
    }

    pub fn sender(&self) -> &Principal {
        &self.sender
    }

    pub fn receiver(&self) -> &Principal {
        &self.receiver
    }

    pub fn capacity(&self) -> Amount {
        self.capacity
    }

    /// Amount already confirmed to the receiver.
    pub fn balance(&self) -> Amount {
        self.balance
    }

    pub fn slot(&self) -> PaymentSlot {
        self.slot
    }

    pub fn state(&self) -> ChannelState {
        self.state
    }

    pub fn opened_at(&self) -> BlockHeight {
        self.opened_at
    }

    /// Funds still held in escrow for this channel (`capacity - balance`).
    pub fn unsettled(&self) -> Amount {
        self.capacity - self.balance
    }

    /// Room left for a new payment (`capacity - balance - pending`).
    pub fn remaining(&self) -> Amount {
        self.unsettled() - self.slot.amount()
    }

    /// Whether `who` is the sender or the receiver.
    pub fn is_party(&self, who: &Principal) -> bool {
        &self.sender == who || &self.receiver == who
    }

    pub fn ensure_active(&self) -> Result<(), ChannelError> {
        match self.state {
            ChannelState::Active => Ok(()),
            ChannelState::Closed => Err(ChannelError::ChannelClosed(self.id)),
        }
    }

    pub fn ensure_sender(&self, caller: &Principal) -> Result<(), ChannelError> {
        if caller != &self.sender {
            return Err(self.unauthorized(caller));
        }
        Ok(())
    }

    pub fn ensure_receiver(&self, caller: &Principal) -> Result<(), ChannelError> {
        if caller != &self.receiver {
            return Err(self.unauthorized(caller));
        }
        Ok(())
    }

    pub fn ensure_party(&self, caller: &Principal) -> Result<(), ChannelError> {
        if !self.is_party(caller) {
            return Err(self.unauthorized(caller));
        }
        Ok(())
    }

    fn unauthorized(&self, caller: &Principal) -> ChannelError {
        ChannelError::NotAuthorized {
            channel_id: self.id,
            caller: caller.to_string(),
        }
    }

    /// Put `amount` in flight with a refund deadline of `height + window`.
    ///
    /// Returns the deadline.
    pub fn begin_payment(
        &mut self,
        amount: Amount,
        height: BlockHeight,
        window: BlockHeight,
    ) -> Result<BlockHeight, ChannelError> {
        self.ensure_active()?;
        if self.slot.is_pending() {
            return Err(ChannelError::PaymentInFlight(self.id));
        }
        if amount == 0 {
            return Err(ChannelError::InvalidAmount(
                "payment amount must be greater than zero".into(),
            ));
        }
        let available = self.remaining();
        if amount > available {
            return Err(ChannelError::CapacityExceeded {
                channel_id: self.id,
                requested: amount,
                available,
            });
        }

        // A zero window would make the deadline 0, which reads as "idle".
        let deadline = height.saturating_add(window.max(1));
        self.slot = PaymentSlot::Pending { amount, deadline };
        tracing::debug!(
            channel_id = %self.id,
            amount,
            deadline,
            "payment slot: idle -> pending"
        );
        Ok(deadline)
    }

    /// Move the pending amount into the confirmed balance.
    ///
    /// Returns the amount that now belongs to the receiver.
    pub fn settle_pending(&mut self) -> Result<Amount, ChannelError> {
        self.ensure_active()?;
        let amount = match self.slot {
            PaymentSlot::Idle => return Err(ChannelError::NoPendingPayment(self.id)),
            PaymentSlot::Pending { amount, .. } => amount,
        };
        self.balance += amount;
        self.slot = PaymentSlot::Idle;
        tracing::debug!(
            channel_id = %self.id,
            amount,
            balance = self.balance,
            "payment slot: pending -> idle (settled)"
        );
        Ok(amount)
    }

    /// Drop the pending payment once its deadline has passed. The amount stays
    /// in escrow and can be offered again.
    pub fn release_pending(&mut self, height: BlockHeight) -> Result<Amount, ChannelError> {
        self.ensure_active()?;
        let (amount, deadline) = match self.slot {
            PaymentSlot::Idle => return Err(ChannelError::NoPendingPayment(self.id)),
            PaymentSlot::Pending { amount, deadline } => (amount, deadline),
        };
        if height < deadline {
            return Err(ChannelError::TimeoutNotReached {
                channel_id: self.id,
                deadline,
                height,
            });
        }
        self.slot = PaymentSlot::Idle;
        tracing::debug!(
            channel_id = %self.id,
            amount,
            height,
            "payment slot: pending -> idle (released)"
        );
        Ok(amount)
    }

    /// Mark the channel closed. Returns the unsettled amount owed back to the
    /// sender.
    pub fn close(&mut self) -> Result<Amount, ChannelError> {
        self.ensure_active()?;
        if self.slot.is_pending() {
            return Err(ChannelError::PaymentInFlight(self.id));
        }
        self.state = ChannelState::Closed;
        tracing::debug!(channel_id = %self.id, "channel state: ACTIVE -> CLOSED");
        Ok(self.unsettled())
    }

    /// `balance + pending <= capacity` and a non-empty pending slot carries a
    /// non-zero amount and deadline.
    pub fn is_consistent(&self) -> bool {
        let slot_ok = match self.slot {
            PaymentSlot::Idle => true,
            PaymentSlot::Pending { amount, deadline } => amount > 0 && deadline > 0,
        };
        let closed_ok = self.state == ChannelState::Active || !self.slot.is_pending();
        slot_ok
            && closed_ok
            && self
                .balance
                .checked_add(self.slot.amount())
                .is_some_and(|used| used <= self.capacity)
    }

    /// Flattened read-only view.
    pub fn info(&self) -> ChannelInfo {
        ChannelInfo {
            id: self.id,
            sender: self.sender.clone(),
            receiver: self.receiver.clone(),
            capacity: self.capacity,
            balance: self.balance,
            pending: self.slot.amount(),
            timeout: self.slot.deadline(),
            state: self.state,
            opened_at: self.opened_at,
        }
    }
}

/// Snapshot returned by `get-channel-info`. `pending` and `timeout` are both
/// zero while no payment is in flight.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelInfo {
    pub id: ChannelId,
    pub sender: Principal,
    pub receiver: Principal,
    pub capacity: Amount,
    pub balance: Amount,
    pub pending: Amount,
    pub timeout: BlockHeight,
    pub state: ChannelState,
    pub opened_at: BlockHeight,
}
