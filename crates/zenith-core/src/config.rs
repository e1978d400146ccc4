use serde::{Deserialize, Serialize};

use crate::types::{BlockHeight, REFUND_WINDOW};

/// Channel ledger parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerConfig {
    /// Blocks between executing a payment and the sender being allowed to
    /// reclaim it.
    #[serde(default = "default_refund_window")]
    pub refund_window: BlockHeight,
    /// Substrate account that holds channel escrow.
    #[serde(default = "default_escrow_principal")]
    pub escrow_principal: String,
}

fn default_refund_window() -> BlockHeight {
    REFUND_WINDOW
}

fn default_escrow_principal() -> String {
    "zenith-pay.escrow".into()
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            refund_window: default_refund_window(),
            escrow_principal: default_escrow_principal(),
        }
    }
}
