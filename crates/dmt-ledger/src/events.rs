use serde::{Deserialize, Serialize};
use tracing::info;

use crate::account::AccountId;
use crate::amount::Amount;

/// Notifications for off-ledger observers.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LedgerEvent {
    /// Administrator minted to `to`.
    Mint {
        to: AccountId,
        #[serde(with = "crate::amount::units")]
        amount: Amount,
    },
    /// `account` minted for itself.
    SelfMint {
        account: AccountId,
        #[serde(with = "crate::amount::units")]
        amount: Amount,
        #[serde(with = "crate::amount::units")]
        total_supply: Amount,
    },
    /// The supply cap was reached; minting is closed for good.
    MintFinished,
    OwnershipTransferred {
        previous: AccountId,
        new: AccountId,
    },
    Transfer {
        from: AccountId,
        to: AccountId,
        #[serde(with = "crate::amount::units")]
        amount: Amount,
    },
    Approval {
        owner: AccountId,
        spender: AccountId,
        #[serde(with = "crate::amount::units")]
        amount: Amount,
    },
}

impl LedgerEvent {
    pub fn name(&self) -> &'static str {
        match self {
            LedgerEvent::Mint { .. } => "mint",
            LedgerEvent::SelfMint { .. } => "self_mint",
            LedgerEvent::MintFinished => "mint_finished",
            LedgerEvent::OwnershipTransferred { .. } => "ownership_transferred",
            LedgerEvent::Transfer { .. } => "transfer",
            LedgerEvent::Approval { .. } => "approval",
        }
    }
}

/// Receiver of ledger notifications.
///
/// The ledger only records events of operations that fully succeeded.
pub trait EventSink {
    fn record(&mut self, event: LedgerEvent);
}

impl EventSink for Vec<LedgerEvent> {
    fn record(&mut self, event: LedgerEvent) {
        self.push(event);
    }
}

/// Sink that writes every event to the `tracing` subscriber.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn record(&mut self, event: LedgerEvent) {
        info!(event = event.name(), ?event, "ledger event");
    }
}
