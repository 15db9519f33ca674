//! Configuration management for the issuance ledger.

use std::fs;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use crate::account::AccountId;
use crate::amount::{to_base_units, Amount, DECIMALS};
use crate::error::LedgerResult;
use crate::ledger::{IssuanceLedger, TokenInfo};
use crate::policy::{MintPolicy, PolicyError};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),

    #[error("invalid [policy] section: {0}")]
    Policy(#[from] PolicyError),
}

#[derive(Debug, Deserialize)]
pub struct LedgerConfig {
    pub administrator: AccountId,
    #[serde(default)]
    pub token: TokenConfig,
    #[serde(default)]
    pub policy: PolicyConfig,
    #[serde(default)]
    pub genesis: Vec<GenesisAllocation>,
}

#[derive(Debug, Deserialize)]
pub struct TokenConfig {
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default = "default_symbol")]
    pub symbol: String,
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            symbol: default_symbol(),
        }
    }
}

/// Mint limits in whole tokens.
#[derive(Debug, Deserialize)]
pub struct PolicyConfig {
    #[serde(default = "default_owner_mint_limit")]
    pub owner_mint_limit: u64,
    #[serde(default = "default_owner_mint_cap")]
    pub owner_mint_cap: u64,
    #[serde(default = "default_self_mint_limit")]
    pub self_mint_limit: u64,
    #[serde(default = "default_total_supply_cap")]
    pub total_supply_cap: u64,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            owner_mint_limit: default_owner_mint_limit(),
            owner_mint_cap: default_owner_mint_cap(),
            self_mint_limit: default_self_mint_limit(),
            total_supply_cap: default_total_supply_cap(),
        }
    }
}

impl PolicyConfig {
    pub fn to_policy(&self) -> Result<MintPolicy, PolicyError> {
        MintPolicy::from_whole_tokens(
            self.owner_mint_limit,
            self.owner_mint_cap,
            self.self_mint_limit,
            self.total_supply_cap,
        )
    }
}

/// Holding credited before the first operation.
#[derive(Debug, Deserialize)]
pub struct GenesisAllocation {
    pub account: AccountId,
    pub tokens: u64,
}

impl LedgerConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: LedgerConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.administrator.is_zero() {
            return Err(ConfigError::Invalid(
                "administrator must not be the zero account".into(),
            ));
        }
        if self.token.name.trim().is_empty() || self.token.symbol.trim().is_empty() {
            return Err(ConfigError::Invalid("token name and symbol must be set".into()));
        }
        let policy = self.policy.to_policy()?;
        let mut genesis_total: Amount = 0;
        for allocation in &self.genesis {
            if allocation.account.is_zero() || allocation.tokens == 0 {
                return Err(ConfigError::Invalid(format!(
                    "genesis allocation to {} of {} tokens is not allowed",
                    allocation.account, allocation.tokens
                )));
            }
            genesis_total = genesis_total.saturating_add(to_base_units(allocation.tokens));
        }
        if genesis_total > policy.total_supply_cap {
            return Err(ConfigError::Invalid(format!(
                "genesis allocations total {} exceed the supply cap {}",
                genesis_total, policy.total_supply_cap
            )));
        }
        Ok(())
    }
}

pub fn load_config(path: &Path) -> Result<LedgerConfig, ConfigError> {
    let config_str = fs::read_to_string(path)?;
    LedgerConfig::from_toml_str(&config_str)
}

impl IssuanceLedger {
    /// Build a ledger and apply its genesis allocations.
    pub fn from_config(config: &LedgerConfig) -> LedgerResult<Self> {
        let policy = config.policy.to_policy()?;
        let token = TokenInfo {
            name: config.token.name.clone(),
            symbol: config.token.symbol.clone(),
            decimals: DECIMALS,
        };
        let mut ledger = Self::with_policy(token, policy, config.administrator)?;
        for allocation in &config.genesis {
            ledger.allocate_genesis(allocation.account, allocation.tokens)?;
        }
        Ok(ledger)
    }
}

fn default_name() -> String {
    "DenaliToken".to_string()
}

fn default_symbol() -> String {
    "DMT".to_string()
}

fn default_owner_mint_limit() -> u64 {
    500_000
}

fn default_owner_mint_cap() -> u64 {
    3_000_000
}

fn default_self_mint_limit() -> u64 {
    100_000
}

fn default_total_supply_cap() -> u64 {
    10_000_000
}
