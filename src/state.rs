//! On-disk ledger state used by the CLI.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use dmt_ledger::{AccountId, IssuanceLedger, LedgerSnapshot};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct StateFile {
    pub ledger: LedgerSnapshot,
    /// Highest nonce consumed per caller. Nonces must strictly increase.
    #[serde(default)]
    pub nonces: BTreeMap<AccountId, u64>,
}

impl StateFile {
    pub fn new(ledger: &IssuanceLedger) -> Self {
        Self {
            ledger: ledger.snapshot(),
            nonces: BTreeMap::new(),
        }
    }

    /// Whether `nonce` is still unused for `caller`.
    pub fn is_fresh(&self, caller: &AccountId, nonce: u64) -> bool {
        self.nonces.get(caller).map_or(true, |last| nonce > *last)
    }

    /// Mark `nonce` as consumed; later requests from `caller` must exceed it.
    pub fn consume(&mut self, caller: AccountId, nonce: u64) {
        self.nonces.insert(caller, nonce);
    }

    pub fn load(path: &Path) -> Result<Self> {
        let bytes = fs::read(path).with_context(|| format!("read state {}", path.display()))?;
        serde_json::from_slice(&bytes).with_context(|| format!("parse state {}", path.display()))
    }

    /// Write to a sibling temp file, then rename over `path`.
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_vec_pretty(self)?;
        let tmp = path.with_extension("tmp");
        fs::write(&tmp, json).with_context(|| format!("write {}", tmp.display()))?;
        fs::rename(&tmp, path).with_context(|| format!("replace {}", path.display()))?;
        Ok(())
    }

    pub fn restore(&self) -> Result<IssuanceLedger> {
        IssuanceLedger::restore(self.ledger.clone()).context("state file failed verification")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn save_load_restore() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");

        let admin = AccountId::new([0xaa; 32]);
        let mut ledger = IssuanceLedger::new(admin).unwrap();
        ledger
            .mint(&admin, &AccountId::new([1; 32]), 250_000, &mut Vec::new())
            .unwrap();
        let mut state = StateFile::new(&ledger);
        state.consume(AccountId::new([1; 32]), 4);
        state.save(&path).unwrap();
        assert!(!path.with_extension("tmp").exists());

        let loaded = StateFile::load(&path).unwrap();
        assert_eq!(loaded.nonces.get(&AccountId::new([1; 32])), Some(&4));
        let restored = loaded.restore().unwrap();
        assert_eq!(restored.total_supply(), ledger.total_supply());
        assert_eq!(restored.state_root(), ledger.state_root());
    }

    #[test]
    fn edited_state_fails_restore() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        let admin = AccountId::new([0xaa; 32]);
        let mut state = StateFile::new(&IssuanceLedger::new(admin).unwrap());
        state.ledger.total_supply = 1;
        state.save(&path).unwrap();
        assert!(StateFile::load(&path).unwrap().restore().is_err());
    }

    #[test]
    fn nonces_strictly_increase_per_caller() {
        let admin = AccountId::new([0xaa; 32]);
        let mut state = StateFile::new(&IssuanceLedger::new(admin).unwrap());
        let alice = AccountId::new([1; 32]);
        let bob = AccountId::new([2; 32]);

        assert!(state.is_fresh(&alice, 0));
        state.consume(alice, 3);
        assert!(!state.is_fresh(&alice, 3));
        assert!(!state.is_fresh(&alice, 2));
        assert!(state.is_fresh(&alice, 4));
        assert!(state.is_fresh(&bob, 0));
    }
}
