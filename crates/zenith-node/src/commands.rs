//! Commands dispatched from the HTTP API to the node event loop.
//!
//! The event loop owns the channel ledger and applies these one at a time,
//! which is the total order every ledger operation observes.

use serde::Serialize;
use tokio::sync::oneshot;

use zenith_core::{Amount, BlockHeight, ChannelError, ChannelId, ChannelInfo, Principal};

/// Reply half carried by every command.
pub type Reply<T> = oneshot::Sender<Result<T, ChannelError>>;

/// A command sent from the HTTP API to the node's main event loop.
pub enum NodeCommand {
    /// Open a channel funded by `caller`.
    CreateChannel {
        caller: Principal,
        receiver: Principal,
        amount: Amount,
        reply: Reply<CreateChannelResponse>,
    },
    /// Put a payment in flight.
    ExecutePayment {
        caller: Principal,
        channel_id: ChannelId,
        amount: Amount,
        reply: Reply<ExecuteResponse>,
    },
    /// Receiver accepts the pending payment.
    ConfirmPayment {
        caller: Principal,
        channel_id: ChannelId,
        reply: Reply<SettleResponse>,
    },
    /// Sender reclaims an expired pending payment.
    RefundPayment {
        caller: Principal,
        channel_id: ChannelId,
        reply: Reply<SettleResponse>,
    },
    /// Return unsettled escrow and close the channel.
    CloseChannel {
        caller: Principal,
        channel_id: ChannelId,
        reply: Reply<SettleResponse>,
    },
    /// Bind a settlement address to `caller`.
    RegisterAddress {
        caller: Principal,
        address: String,
        reply: Reply<RegisterResponse>,
    },
    /// Snapshot of one channel.
    GetChannel {
        channel_id: ChannelId,
        reply: Reply<ChannelInfo>,
    },
    /// Channels where `who` is a party.
    ChannelsFor {
        who: Principal,
        reply: Reply<ChannelListResponse>,
    },
    /// Substrate balance of an account.
    GetAccount {
        who: Principal,
        reply: Reply<AccountResponse>,
    },
    /// Chain height and ledger totals.
    Status { reply: Reply<ChainStatus> },
    /// Produce `blocks` empty blocks.
    Mine {
        blocks: BlockHeight,
        reply: Reply<ChainStatus>,
    },
}

/// Response after creating a channel.
#[derive(Debug, Clone, Serialize)]
pub struct CreateChannelResponse {
    pub channel_id: ChannelId,
}

/// Response after executing a payment.
#[derive(Debug, Clone, Serialize)]
pub struct ExecuteResponse {
    pub channel_id: ChannelId,
    pub amount: Amount,
    /// Height from which the sender may refund.
    pub deadline: BlockHeight,
}

/// Response after confirm, refund, or close.
#[derive(Debug, Clone, Serialize)]
pub struct SettleResponse {
    pub channel_id: ChannelId,
    /// Amount paid to the receiver (confirm), released back to capacity
    /// (refund), or returned to the sender (close).
    pub amount: Amount,
    pub status: String,
}

/// Response after registering a settlement address.
#[derive(Debug, Clone, Serialize)]
pub struct RegisterResponse {
    pub owner: Principal,
    pub address: String,
    /// `created`, `unchanged`, or `replaced`.
    pub outcome: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChannelListResponse {
    pub channels: Vec<ChannelInfo>,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct AccountResponse {
    pub identity: Principal,
    pub balance: Amount,
}

/// Chain height and escrow totals.
#[derive(Debug, Clone, Serialize)]
pub struct ChainStatus {
    pub height: BlockHeight,
    pub channels: usize,
    pub escrow: Principal,
    pub escrow_balance: Amount,
    pub refund_window: BlockHeight,
}
