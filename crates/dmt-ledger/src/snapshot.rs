use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::account::AccountId;
use crate::amount::Amount;
use crate::error::{LedgerError, LedgerResult};
use crate::ledger::{IssuanceLedger, TokenInfo};
use crate::ownership::Ownership;
use crate::policy::MintPolicy;

/// Serializable image of an [`IssuanceLedger`] with its state root.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct LedgerSnapshot {
    pub token: TokenInfo,
    pub policy: MintPolicy,
    pub owner: AccountId,
    pub height: u64,
    pub total_supply: Amount,
    pub minting_finished: bool,
    pub balances: BTreeMap<AccountId, Amount>,
    pub allowances: BTreeMap<AccountId, BTreeMap<AccountId, Amount>>,
    pub owner_minted: BTreeMap<AccountId, Amount>,
    pub self_minted: BTreeMap<AccountId, Amount>,
    #[serde(with = "hex::serde")]
    pub state_root: [u8; 32],
}

impl IssuanceLedger {
    pub fn snapshot(&self) -> LedgerSnapshot {
        LedgerSnapshot {
            token: self.token.clone(),
            policy: self.policy,
            owner: *self.owner(),
            height: self.height,
            total_supply: self.total_supply,
            minting_finished: self.minting_finished,
            balances: self.balances.clone(),
            allowances: self.allowances.clone(),
            owner_minted: self.owner_minted.clone(),
            self_minted: self.self_minted.clone(),
            state_root: self.state_root(),
        }
    }

    /// Rebuild a ledger from a snapshot, rejecting tampered or inconsistent
    /// state.
    pub fn restore(snapshot: LedgerSnapshot) -> LedgerResult<Self> {
        snapshot.policy.validate()?;
        let ledger = Self {
            token: snapshot.token,
            policy: snapshot.policy,
            ownership: Ownership::new(snapshot.owner)?,
            balances: snapshot.balances,
            allowances: snapshot.allowances,
            owner_minted: snapshot.owner_minted,
            self_minted: snapshot.self_minted,
            total_supply: snapshot.total_supply,
            minting_finished: snapshot.minting_finished,
            height: snapshot.height,
        };
        let root = ledger.state_root();
        if root != snapshot.state_root {
            return Err(LedgerError::Corrupted(format!(
                "state root mismatch: recorded {}, computed {}",
                hex::encode(snapshot.state_root),
                hex::encode(root)
            )));
        }
        ledger.check_invariants()?;
        Ok(ledger)
    }

    /// SHA-256 Merkle root over every piece of ledger state, including the
    /// height and token metadata.
    pub fn state_root(&self) -> [u8; 32] {
        let mut leaves: Vec<[u8; 32]> = Vec::new();

        let mut hasher = Sha256::new();
        hasher.update(b"supply");
        hasher.update(self.total_supply.to_le_bytes());
        hasher.update([self.minting_finished as u8]);
        hasher.update(self.owner().as_bytes());
        hasher.update(self.height.to_le_bytes());
        for field in [&self.token.name, &self.token.symbol] {
            hasher.update((field.len() as u64).to_le_bytes());
            hasher.update(field.as_bytes());
        }
        hasher.update([self.token.decimals]);
        hasher.update(self.policy.owner_mint_limit.to_le_bytes());
        hasher.update(self.policy.owner_mint_cap.to_le_bytes());
        hasher.update(self.policy.self_mint_limit.to_le_bytes());
        hasher.update(self.policy.total_supply_cap.to_le_bytes());
        leaves.push(hasher.finalize().into());

        for (account, balance) in &self.balances {
            leaves.push(account_leaf(b"acct", account, *balance));
        }
        for (account, minted) in &self.owner_minted {
            leaves.push(account_leaf(b"omint", account, *minted));
        }
        for (account, minted) in &self.self_minted {
            leaves.push(account_leaf(b"smint", account, *minted));
        }
        for (owner, spenders) in &self.allowances {
            for (spender, amount) in spenders {
                let mut hasher = Sha256::new();
                hasher.update(b"allow");
                hasher.update(owner.as_bytes());
                hasher.update(spender.as_bytes());
                hasher.update(amount.to_le_bytes());
                leaves.push(hasher.finalize().into());
            }
        }
        build_merkle(leaves)
    }
}

fn account_leaf(tag: &[u8], account: &AccountId, amount: Amount) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(tag);
    hasher.update(account.as_bytes());
    hasher.update(amount.to_le_bytes());
    hasher.finalize().into()
}

fn build_merkle(mut leaves: Vec<[u8; 32]>) -> [u8; 32] {
    if leaves.is_empty() {
        return Sha256::digest(b"dmt-ledger-empty").into();
    }
    while leaves.len() > 1 {
        let mut next = Vec::with_capacity((leaves.len() + 1) / 2);
        for chunk in leaves.chunks(2) {
            let mut hasher = Sha256::new();
            hasher.update(b"node");
            hasher.update(chunk[0]);
            // odd leaf pairs with itself
            hasher.update(chunk.get(1).unwrap_or(&chunk[0]));
            next.push(hasher.finalize().into());
        }
        leaves = next;
    }
    leaves[0]
}
