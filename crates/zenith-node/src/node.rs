//! The Zenith node orchestrator.
//!
//! Owns the channel ledger and its substrate, restores them from storage,
//! runs the HTTP API in a background task, and applies API commands and
//! block ticks in a single event loop.

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

use zenith_core::{Amount, BlockHeight, ChannelError, ChannelId, Principal};
use zenith_ledger::{
    ChannelLedger, InMemorySubstrate, RegisterOutcome, SettlementRegistry, Substrate,
};

use crate::commands::{
    AccountResponse, ChainStatus, ChannelListResponse, CreateChannelResponse, ExecuteResponse,
    NodeCommand, RegisterResponse, SettleResponse,
};
use crate::config::ZenithConfig;
use crate::state::NodeState;
use crate::storage::Storage;

/// The Zenith ledger node.
pub struct ZenithNode {
    /// Node configuration.
    config: ZenithConfig,
    /// Channel ledger over the local substrate.
    ledger: ChannelLedger<InMemorySubstrate>,
    /// Settlement address registry, shared with HTTP handlers.
    registry: Arc<SettlementRegistry>,
    /// Persistent storage.
    storage: Option<Storage>,
    /// Shared state accessible from HTTP handlers.
    node_state: Option<Arc<NodeState>>,
    /// Receives commands from the HTTP API.
    command_rx: Option<mpsc::Receiver<NodeCommand>>,
}

impl ZenithNode {
    /// Open storage and restore the ledger, registry, and chain from it.
    ///
    /// A data directory without a stored height is initialized from the
    /// genesis accounts in `config`.
    pub fn new(config: ZenithConfig) -> Result<Self> {
        let storage = Storage::open(&config.storage.data_dir)?;
        tracing::info!(path = %config.storage.data_dir.display(), "storage initialized");

        let substrate = match storage.get_height()? {
            Some(height) => InMemorySubstrate::restore(height, storage.load_balances()?),
            None => Self::genesis(&config, &storage)?,
        };
        let channels = storage.load_channels()?;
        let ledger = ChannelLedger::restore(config.ledger.clone(), substrate, channels)?;
        let registry = Arc::new(SettlementRegistry::restore(storage.load_bindings()?));

        tracing::info!(
            height = ledger.height(),
            channels = ledger.len(),
            bindings = registry.len(),
            "Zenith node created"
        );

        Ok(Self {
            config,
            ledger,
            registry,
            storage: Some(storage),
            node_state: None,
            command_rx: None,
        })
    }

    /// Mint the configured genesis balances into a fresh substrate and
    /// persist them.
    fn genesis(config: &ZenithConfig, storage: &Storage) -> Result<InMemorySubstrate> {
        let mut substrate = InMemorySubstrate::new();
        for account in &config.genesis.accounts {
            let who: Principal = account.principal.parse()?;
            let balance = substrate.credit(&who, Amount::from(account.balance));
            storage.put_balance(&who, balance)?;
        }
        storage.put_height(substrate.height())?;
        tracing::info!(
            accounts = config.genesis.accounts.len(),
            supply = substrate.total_supply(),
            "genesis applied"
        );
        Ok(substrate)
    }

    /// Create the command channel and spawn the HTTP API server.
    pub async fn start(&mut self) -> Result<()> {
        tracing::info!("starting Zenith node");

        // Create the NodeCommand channel (HTTP API → main event loop)
        let (command_tx, command_rx) = mpsc::channel::<NodeCommand>(256);
        let node_state = Arc::new(NodeState::new(
            self.registry.clone(),
            self.config.chain.allow_mine,
            command_tx,
        ));

        let api_addr: SocketAddr = self.config.api_addr().parse()?;
        let api_state = node_state.clone();
        tokio::spawn(async move {
            if let Err(e) = crate::api::start_api_server(api_addr, api_state).await {
                tracing::error!(error = %e, "HTTP API server error");
            }
        });

        self.node_state = Some(node_state);
        self.command_rx = Some(command_rx);
        Ok(())
    }

    /// Run the node's main event loop: applies API commands and produces
    /// blocks on the configured interval.
    pub async fn run(&mut self) -> Result<()> {
        let mut command_rx = self
            .command_rx
            .take()
            .ok_or_else(|| anyhow::anyhow!("node not started"))?;

        let block_interval = self.config.chain.block_interval_ms;
        let ticking = block_interval > 0;
        let period = Duration::from_millis(block_interval.max(1));
        let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + period, period);

        tracing::info!(block_interval_ms = block_interval, "entering main event loop");

        loop {
            tokio::select! {
                cmd = command_rx.recv() => {
                    match cmd {
                        Some(c) => self.handle_command(c),
                        None => {
                            tracing::info!("API command channel closed");
                            break;
                        }
                    }
                }
                _ = ticker.tick(), if ticking => {
                    self.mine(1);
                }
            }
        }

        Ok(())
    }

    /// Gracefully shut down the node.
    pub async fn shutdown(&mut self) -> Result<()> {
        tracing::info!("shutting down Zenith node");

        self.node_state = None;
        self.command_rx = None;

        if let Some(storage) = self.storage.take() {
            storage.flush()?;
            drop(storage);
            tracing::info!("storage closed");
        }

        tracing::info!("Zenith node shut down");
        Ok(())
    }

    /// Get a reference to the channel ledger.
    pub fn ledger(&self) -> &ChannelLedger<InMemorySubstrate> {
        &self.ledger
    }

    /// Get a reference to the settlement registry.
    pub fn registry(&self) -> &Arc<SettlementRegistry> {
        &self.registry
    }

    /// Shared state handed to the HTTP API, once started.
    pub fn node_state(&self) -> Option<&Arc<NodeState>> {
        self.node_state.as_ref()
    }

    /// Advance the chain by `blocks` and persist the new height.
    pub fn mine(&mut self, blocks: BlockHeight) -> BlockHeight {
        let height = self.ledger.substrate_mut().advance(blocks);
        if let Some(storage) = &self.storage {
            if let Err(e) = storage.put_height(height) {
                tracing::error!(error = %e, height, "failed to persist height");
            }
        }
        tracing::debug!(height, blocks, "blocks produced");
        height
    }

    fn status(&self) -> ChainStatus {
        let escrow = self.ledger.escrow().clone();
        ChainStatus {
            height: self.ledger.height(),
            channels: self.ledger.len(),
            escrow_balance: self.ledger.substrate().balance_of(&escrow),
            escrow,
            refund_window: self.ledger.config().refund_window,
        }
    }

    /// Write a channel and its parties' balances after a successful mutation.
    fn persist_channel(&self, channel_id: ChannelId) {
        let (Some(storage), Some(channel)) = (&self.storage, self.ledger.channel(channel_id))
        else {
            return;
        };
        let substrate = self.ledger.substrate();
        let balances: Vec<(Principal, Amount)> =
            [channel.sender(), channel.receiver(), self.ledger.escrow()]
                .into_iter()
                .map(|who| (who.clone(), substrate.balance_of(who)))
                .collect();
        if let Err(e) = storage.commit(Some(channel), &balances, substrate.height()) {
            tracing::error!(error = %e, channel_id = %channel_id, "failed to persist channel");
        }
    }

    fn persist_binding(&self, owner: &Principal) {
        let (Some(storage), Some(binding)) = (&self.storage, self.registry.binding(owner)) else {
            return;
        };
        if let Err(e) = storage.put_binding(&binding) {
            tracing::error!(error = %e, owner = %owner, "failed to persist settlement binding");
        }
    }

    /// Apply a command from the HTTP API and send its reply.
    pub fn handle_command(&mut self, cmd: NodeCommand) {
        match cmd {
            NodeCommand::CreateChannel {
                caller,
                receiver,
                amount,
                reply,
            } => {
                let result = self.ledger.create_channel(&caller, &receiver, amount);
                if let Ok(channel_id) = result {
                    self.persist_channel(channel_id);
                }
                let _ = reply.send(result.map(|channel_id| CreateChannelResponse { channel_id }));
            }
            NodeCommand::ExecutePayment {
                caller,
                channel_id,
                amount,
                reply,
            } => {
                let result = self.ledger.execute_payment(&caller, channel_id, amount);
                if result.is_ok() {
                    self.persist_channel(channel_id);
                }
                let _ = reply.send(result.map(|deadline| ExecuteResponse {
                    channel_id,
                    amount,
                    deadline,
                }));
            }
            NodeCommand::ConfirmPayment {
                caller,
                channel_id,
                reply,
            } => {
                let result = self.ledger.confirm_payment(&caller, channel_id);
                self.settled(channel_id, result, "confirmed", reply);
            }
            NodeCommand::RefundPayment {
                caller,
                channel_id,
                reply,
            } => {
                let result = self.ledger.refund_payment(&caller, channel_id);
                self.settled(channel_id, result, "refunded", reply);
            }
            NodeCommand::CloseChannel {
                caller,
                channel_id,
                reply,
            } => {
                let result = self.ledger.close_channel(&caller, channel_id);
                self.settled(channel_id, result, "closed", reply);
            }
            NodeCommand::RegisterAddress {
                caller,
                address,
                reply,
            } => {
                let result = self.registry.register(&caller, &address);
                if matches!(
                    result,
                    Ok(RegisterOutcome::Created | RegisterOutcome::Replaced { .. })
                ) {
                    self.persist_binding(&caller);
                }
                let _ = reply.send(result.map(|outcome| {
                    let (outcome, previous) = match outcome {
                        RegisterOutcome::Created => ("created", None),
                        RegisterOutcome::Unchanged => ("unchanged", None),
                        RegisterOutcome::Replaced { previous } => ("replaced", Some(previous)),
                    };
                    RegisterResponse {
                        address,
                        owner: caller,
                        outcome: outcome.into(),
                        previous,
                    }
                }));
            }
            NodeCommand::GetChannel { channel_id, reply } => {
                let _ = reply.send(
                    self.ledger
                        .get_channel_info(channel_id)
                        .ok_or(ChannelError::ChannelNotFound(channel_id)),
                );
            }
            NodeCommand::ChannelsFor { who, reply } => {
                let channels = self.ledger.channels_for(&who);
                let _ = reply.send(Ok(ChannelListResponse {
                    count: channels.len(),
                    channels,
                }));
            }
            NodeCommand::GetAccount { who, reply } => {
                let balance = self.ledger.substrate().balance_of(&who);
                let _ = reply.send(Ok(AccountResponse {
                    identity: who,
                    balance,
                }));
            }
            NodeCommand::Status { reply } => {
                let _ = reply.send(Ok(self.status()));
            }
            NodeCommand::Mine { blocks, reply } => {
                self.mine(blocks);
                let _ = reply.send(Ok(self.status()));
            }
        }
    }

    /// Shared tail of confirm, refund, and close.
    fn settled(
        &self,
        channel_id: ChannelId,
        result: Result<Amount, ChannelError>,
        status: &str,
        reply: crate::commands::Reply<SettleResponse>,
    ) {
        if result.is_ok() {
            self.persist_channel(channel_id);
        }
        let _ = reply.send(result.map(|amount| SettleResponse {
            channel_id,
            amount,
            status: status.into(),
        }));
    }
}
