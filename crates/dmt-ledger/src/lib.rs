//! Denali token (DMT) issuance ledger.
//!
//! The crate exposes the accounting state machine that tracks balances,
//! total supply and the phased minting policy of the token:
//!
//! * [`policy`]: supply constants, [`MintPolicy`] and phase derivation.
//! * [`ledger`]: the [`IssuanceLedger`] itself: owner mints, self mints,
//!   the transfer lock and the conventional transfer/approval protocol.
//! * [`ownership`]: the administrator capability consulted by the ledger.
//! * [`events`]: notifications handed to an [`EventSink`].
//! * [`snapshot`]: serializable state with a SHA-256 state root.
//! * [`shared`]: a single-writer handle for multi-threaded callers.
//! * [`config`]: TOML configuration and genesis allocations.
//!
//! Amounts passed into operations are whole tokens; everything the ledger
//! stores and reports is in base units of `10^18`.

#![forbid(unsafe_code)]

pub mod account;
pub mod amount;
pub mod config;
pub mod events;
pub mod ledger;
pub mod operation;
pub mod ownership;
pub mod policy;
pub mod shared;
pub mod snapshot;

mod error;

pub use account::{AccountId, ParseAccountError};
pub use amount::{format_units, to_base_units, Amount, DECIMALS, UNIT};
pub use config::{load_config, ConfigError, LedgerConfig};
pub use error::{ErrorKind, LedgerError, LedgerResult};
pub use events::{EventSink, LedgerEvent, TracingSink};
pub use ledger::{IssuanceLedger, TokenInfo};
pub use operation::Operation;
pub use ownership::Ownership;
pub use policy::{
    MintPolicy, Phase, PolicyError, OWNER_MINT_CAP, OWNER_MINT_LIMIT, SELF_MINT_CAP, SELF_MINT_LIMIT,
    TOTAL_SUPPLY_CAP,
};
pub use shared::SharedLedger;
pub use snapshot::LedgerSnapshot;
