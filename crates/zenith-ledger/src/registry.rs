use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use zenith_core::{ChannelError, Principal};

/// Storage limit on a single external address. Addresses are otherwise
/// opaque and stored exactly as given.
pub const MAX_ADDRESS_LEN: usize = 4096;

/// An identity's registered settlement address on the external chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementBinding {
    pub owner: Principal,
    pub external_address: String,
    pub registered_at: DateTime<Utc>,
}

/// Result of [`SettlementRegistry::register`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegisterOutcome {
    /// First binding for this identity.
    Created,
    /// Same address registered again; the existing binding is kept.
    Unchanged,
    /// A different address replaced the previous one.
    Replaced { previous: String },
}

/// Maps each identity to at most one external settlement address.
///
/// Only the owner can write its own entry: `register` binds the address to
/// the authenticated caller, never to an identity named in the request.
pub struct SettlementRegistry {
    bindings: DashMap<Principal, SettlementBinding>,
}

impl SettlementRegistry {
    pub fn new() -> Self {
        Self {
            bindings: DashMap::new(),
        }
    }

    /// Rebuild a registry from persisted bindings.
    pub fn restore(bindings: impl IntoIterator<Item = SettlementBinding>) -> Self {
        let registry = Self::new();
        for binding in bindings {
            registry.bindings.insert(binding.owner.clone(), binding);
        }
        registry
    }

    /// `register-btc-address`: bind `address` to `caller`, replacing any
    /// previous binding.
    pub fn register(
        &self,
        caller: &Principal,
        address: &str,
    ) -> Result<RegisterOutcome, ChannelError> {
        if address.len() > MAX_ADDRESS_LEN {
            return Err(ChannelError::InvalidAddress(format!(
                "exceeds {MAX_ADDRESS_LEN} bytes"
            )));
        }

        let binding = SettlementBinding {
            owner: caller.clone(),
            external_address: address.to_string(),
            registered_at: Utc::now(),
        };

        let outcome = match self.bindings.entry(caller.clone()) {
            Entry::Occupied(existing) if existing.get().external_address == address => {
                RegisterOutcome::Unchanged
            }
            Entry::Occupied(mut existing) => {
                let previous = existing.insert(binding).external_address;
                RegisterOutcome::Replaced { previous }
            }
            Entry::Vacant(slot) => {
                slot.insert(binding);
                RegisterOutcome::Created
            }
        };

        tracing::info!(
            owner = %caller,
            address = %address,
            outcome = ?outcome,
            "settlement address registered"
        );
        Ok(outcome)
    }

    /// `get-btc-address`: the address bound to `who`, if any.
    pub fn lookup(&self, who: &Principal) -> Option<String> {
        self.bindings
            .get(who)
            .map(|binding| binding.external_address.clone())
    }

    /// Full binding record for `who`.
    pub fn binding(&self, who: &Principal) -> Option<SettlementBinding> {
        self.bindings.get(who).map(|binding| binding.clone())
    }

    /// Snapshot of every binding.
    pub fn bindings(&self) -> Vec<SettlementBinding> {
        self.bindings.iter().map(|entry| entry.value().clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

impl Default for SettlementRegistry {
    fn default() -> Self {
        Self::new()
    }
}
