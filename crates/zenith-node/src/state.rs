//! Shared node state for cross-task communication.

use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;

use zenith_ledger::SettlementRegistry;

use crate::commands::NodeCommand;

/// Shared state for the running node, accessible from HTTP handlers.
pub struct NodeState {
    /// When the node started.
    pub start_time: Instant,
    /// Settlement address registry. Lookups are served directly from here;
    /// writes go through the event loop so they are persisted.
    pub registry: Arc<SettlementRegistry>,
    /// Whether the mine endpoint is enabled.
    pub allow_mine: bool,
    /// Channel to send commands to the event loop.
    pub command_tx: mpsc::Sender<NodeCommand>,
}

impl NodeState {
    pub fn new(
        registry: Arc<SettlementRegistry>,
        allow_mine: bool,
        command_tx: mpsc::Sender<NodeCommand>,
    ) -> Self {
        Self {
            start_time: Instant::now(),
            registry,
            allow_mine,
            command_tx,
        }
    }
}
