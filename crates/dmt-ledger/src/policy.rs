//! Supply constants and phase derivation.
//!
//! The phase is never stored: it is a pure function of the total supply.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::amount::{to_base_units, Amount};

/// Cumulative amount the administrator may mint to any single account.
pub const OWNER_MINT_LIMIT: Amount = to_base_units(500_000);

/// Total supply at which administrator minting closes.
pub const OWNER_MINT_CAP: Amount = to_base_units(3_000_000);

/// Cumulative amount any single account may mint for itself.
pub const SELF_MINT_LIMIT: Amount = to_base_units(100_000);

/// Hard ceiling on total supply.
pub const TOTAL_SUPPLY_CAP: Amount = to_base_units(10_000_000);

/// Upper bound of the self-mint window; identical to the supply cap.
pub const SELF_MINT_CAP: Amount = TOTAL_SUPPLY_CAP;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Administrator minting (supply below the owner mint cap).
    OwnerMint,
    /// Self minting (owner mint cap reached, supply cap not yet reached).
    SelfMint,
    /// Supply cap reached; no minting of either kind.
    Finished,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Phase::OwnerMint => "owner-mint",
            Phase::SelfMint => "self-mint",
            Phase::Finished => "finished",
        })
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PolicyError {
    #[error("{limit} must be greater than zero")]
    ZeroLimit { limit: &'static str },

    #[error("owner mint cap {owner_mint_cap} exceeds total supply cap {total_supply_cap}")]
    OwnerMintCapAboveSupplyCap {
        owner_mint_cap: Amount,
        total_supply_cap: Amount,
    },
}

/// The four issuance limits, in base units.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MintPolicy {
    pub owner_mint_limit: Amount,
    pub owner_mint_cap: Amount,
    pub self_mint_limit: Amount,
    pub total_supply_cap: Amount,
}

impl Default for MintPolicy {
    fn default() -> Self {
        Self {
            owner_mint_limit: OWNER_MINT_LIMIT,
            owner_mint_cap: OWNER_MINT_CAP,
            self_mint_limit: SELF_MINT_LIMIT,
            total_supply_cap: TOTAL_SUPPLY_CAP,
        }
    }
}

impl MintPolicy {
    /// Build a policy from whole-token values, rejecting inconsistent limits.
    pub fn from_whole_tokens(
        owner_mint_limit: u64,
        owner_mint_cap: u64,
        self_mint_limit: u64,
        total_supply_cap: u64,
    ) -> Result<Self, PolicyError> {
        let policy = Self {
            owner_mint_limit: to_base_units(owner_mint_limit),
            owner_mint_cap: to_base_units(owner_mint_cap),
            self_mint_limit: to_base_units(self_mint_limit),
            total_supply_cap: to_base_units(total_supply_cap),
        };
        policy.validate()?;
        Ok(policy)
    }

    pub fn validate(&self) -> Result<(), PolicyError> {
        let limits = [
            ("owner mint limit", self.owner_mint_limit),
            ("owner mint cap", self.owner_mint_cap),
            ("self mint limit", self.self_mint_limit),
            ("total supply cap", self.total_supply_cap),
        ];
        if let Some((limit, _)) = limits.iter().find(|(_, value)| *value == 0) {
            return Err(PolicyError::ZeroLimit { limit: *limit });
        }
        if self.owner_mint_cap > self.total_supply_cap {
            return Err(PolicyError::OwnerMintCapAboveSupplyCap {
                owner_mint_cap: self.owner_mint_cap,
                total_supply_cap: self.total_supply_cap,
            });
        }
        Ok(())
    }

    pub fn phase_at(&self, total_supply: Amount) -> Phase {
        if total_supply >= self.total_supply_cap {
            Phase::Finished
        } else if total_supply >= self.owner_mint_cap {
            Phase::SelfMint
        } else {
            Phase::OwnerMint
        }
    }

    /// Supply still available before the cap.
    pub fn remaining(&self, total_supply: Amount) -> Amount {
        self.total_supply_cap.saturating_sub(total_supply)
    }
}
