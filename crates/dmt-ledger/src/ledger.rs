use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::account::AccountId;
use crate::amount::{to_base_units, Amount, DECIMALS};
use crate::error::{LedgerError, LedgerResult};
use crate::events::{EventSink, LedgerEvent};
use crate::ownership::Ownership;
use crate::policy::{MintPolicy, Phase};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenInfo {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
}

impl Default for TokenInfo {
    fn default() -> Self {
        Self {
            name: "DenaliToken".to_string(),
            symbol: "DMT".to_string(),
            decimals: DECIMALS,
        }
    }
}

/// Balance and supply state plus the phase logic that gates issuance and
/// transfers.
///
/// Every operation takes the caller explicitly and either applies in full,
/// recording its events into the supplied sink, or fails without touching
/// any state.
#[derive(Clone, Debug)]
pub struct IssuanceLedger {
    pub(crate) token: TokenInfo,
    pub(crate) policy: MintPolicy,
    pub(crate) ownership: Ownership,
    pub(crate) balances: BTreeMap<AccountId, Amount>,
    pub(crate) allowances: BTreeMap<AccountId, BTreeMap<AccountId, Amount>>,
    pub(crate) owner_minted: BTreeMap<AccountId, Amount>,
    pub(crate) self_minted: BTreeMap<AccountId, Amount>,
    pub(crate) total_supply: Amount,
    pub(crate) minting_finished: bool,
    pub(crate) height: u64,
}

impl IssuanceLedger {
    /// Fresh ledger with the default token metadata and mint policy.
    pub fn new(owner: AccountId) -> LedgerResult<Self> {
        Self::with_policy(TokenInfo::default(), MintPolicy::default(), owner)
    }

    pub fn with_policy(token: TokenInfo, policy: MintPolicy, owner: AccountId) -> LedgerResult<Self> {
        policy.validate()?;
        Ok(Self {
            token,
            policy,
            ownership: Ownership::new(owner)?,
            balances: BTreeMap::new(),
            allowances: BTreeMap::new(),
            owner_minted: BTreeMap::new(),
            self_minted: BTreeMap::new(),
            total_supply: 0,
            minting_finished: false,
            height: 0,
        })
    }

    /// Credit a pre-existing holding before the first operation.
    ///
    /// Mint counters are untouched, so genesis holdings never consume an
    /// account's owner or self mint allowance.
    pub fn allocate_genesis(&mut self, account: AccountId, tokens: u64) -> LedgerResult<()> {
        if self.height > 0 {
            return Err(LedgerError::GenesisSealed);
        }
        if account.is_zero() {
            return Err(LedgerError::ZeroAccount {
                role: "genesis recipient",
            });
        }
        let amount = positive(tokens)?;
        let new_supply = self.supply_after(amount)?;
        let new_balance = self
            .balance_of(&account)
            .checked_add(amount)
            .ok_or(LedgerError::Overflow)?;

        self.balances.insert(account, new_balance);
        self.total_supply = new_supply;
        if self.total_supply == self.policy.total_supply_cap {
            self.minting_finished = true;
        }
        debug!(%account, amount, total_supply = self.total_supply, "genesis allocation");
        Ok(())
    }

    // ------------------------------------------------------------------
    // Issuance
    // ------------------------------------------------------------------

    /// Administrator mint of `tokens` whole tokens to `to`.
    pub fn mint(
        &mut self,
        caller: &AccountId,
        to: &AccountId,
        tokens: u64,
        sink: &mut dyn EventSink,
    ) -> LedgerResult<()> {
        self.ownership.require_administrator(caller)?;
        if to.is_zero() {
            return Err(LedgerError::ZeroAccount {
                role: "mint recipient",
            });
        }
        let amount = positive(tokens)?;

        let phase = self.phase();
        if phase != Phase::OwnerMint {
            return Err(LedgerError::WrongPhase {
                operation: "mint",
                phase,
            });
        }

        let minted = self.owner_mint_count(to);
        let new_minted = minted.checked_add(amount).ok_or(LedgerError::Overflow)?;
        if new_minted > self.policy.owner_mint_limit {
            return Err(LedgerError::OwnerMintLimitExceeded {
                account: *to,
                minted,
                requested: amount,
                limit: self.policy.owner_mint_limit,
            });
        }
        let new_supply = self.supply_after(amount)?;
        let new_balance = self
            .balance_of(to)
            .checked_add(amount)
            .ok_or(LedgerError::Overflow)?;

        self.balances.insert(*to, new_balance);
        self.owner_minted.insert(*to, new_minted);
        self.total_supply = new_supply;
        self.height += 1;

        debug!(%to, amount, total_supply = self.total_supply, "owner mint applied");
        sink.record(LedgerEvent::Mint { to: *to, amount });
        self.close_minting_if_capped(sink);
        Ok(())
    }

    /// Non-administrator mint of `tokens` whole tokens to the caller.
    pub fn self_mint(
        &mut self,
        caller: &AccountId,
        tokens: u64,
        sink: &mut dyn EventSink,
    ) -> LedgerResult<()> {
        if caller.is_zero() {
            return Err(LedgerError::ZeroAccount {
                role: "self minter",
            });
        }
        let amount = positive(tokens)?;
        if self.ownership.is_administrator(caller) {
            return Err(LedgerError::AdministratorSelfMint { caller: *caller });
        }

        let phase = self.phase();
        if phase != Phase::SelfMint {
            return Err(LedgerError::WrongPhase {
                operation: "self mint",
                phase,
            });
        }

        let minted = self.self_mint_count(caller);
        let new_minted = minted.checked_add(amount).ok_or(LedgerError::Overflow)?;
        if new_minted > self.policy.self_mint_limit {
            return Err(LedgerError::SelfMintLimitExceeded {
                account: *caller,
                minted,
                requested: amount,
                limit: self.policy.self_mint_limit,
            });
        }
        let new_supply = self.supply_after(amount)?;
        let new_balance = self
            .balance_of(caller)
            .checked_add(amount)
            .ok_or(LedgerError::Overflow)?;

        self.balances.insert(*caller, new_balance);
        self.self_minted.insert(*caller, new_minted);
        self.total_supply = new_supply;
        self.height += 1;

        debug!(account = %caller, amount, total_supply = self.total_supply, "self mint applied");
        sink.record(LedgerEvent::SelfMint {
            account: *caller,
            amount,
            total_supply: self.total_supply,
        });
        self.close_minting_if_capped(sink);
        Ok(())
    }

    /// Administrator request to close minting.
    ///
    /// Succeeds regardless of supply but only sets the flag once the cap has
    /// been reached; it cannot close minting early. Returns the flag.
    pub fn finish_minting(&mut self, caller: &AccountId, sink: &mut dyn EventSink) -> LedgerResult<bool> {
        self.ownership.require_administrator(caller)?;
        self.close_minting_if_capped(sink);
        self.height += 1;
        Ok(self.minting_finished)
    }

    fn close_minting_if_capped(&mut self, sink: &mut dyn EventSink) {
        if self.minting_finished || self.total_supply != self.policy.total_supply_cap {
            return;
        }
        self.minting_finished = true;
        info!(total_supply = self.total_supply, "supply cap reached, minting finished");
        sink.record(LedgerEvent::MintFinished);
    }

    // ------------------------------------------------------------------
    // Transfers and approvals (locked until minting is finished)
    // ------------------------------------------------------------------

    pub fn transfer(
        &mut self,
        caller: &AccountId,
        to: &AccountId,
        tokens: u64,
        sink: &mut dyn EventSink,
    ) -> LedgerResult<()> {
        self.require_unlocked()?;
        if to.is_zero() {
            return Err(LedgerError::ZeroAccount {
                role: "transfer recipient",
            });
        }
        let amount = positive(tokens)?;
        self.move_balance(caller, to, amount)?;
        self.height += 1;

        debug!(from = %caller, %to, amount, "transfer applied");
        sink.record(LedgerEvent::Transfer {
            from: *caller,
            to: *to,
            amount,
        });
        Ok(())
    }

    /// Move `tokens` from `from` to `to` on the strength of the caller's
    /// allowance.
    pub fn transfer_from(
        &mut self,
        caller: &AccountId,
        from: &AccountId,
        to: &AccountId,
        tokens: u64,
        sink: &mut dyn EventSink,
    ) -> LedgerResult<()> {
        self.require_unlocked()?;
        if to.is_zero() {
            return Err(LedgerError::ZeroAccount {
                role: "transfer recipient",
            });
        }
        let amount = positive(tokens)?;
        let allowed = self.allowance(from, caller);
        if allowed < amount {
            return Err(LedgerError::InsufficientAllowance {
                owner: *from,
                spender: *caller,
                have: allowed,
                need: amount,
            });
        }
        self.move_balance(from, to, amount)?;
        self.set_allowance(from, caller, allowed - amount);
        self.height += 1;

        debug!(spender = %caller, %from, %to, amount, "delegated transfer applied");
        sink.record(LedgerEvent::Transfer {
            from: *from,
            to: *to,
            amount,
        });
        Ok(())
    }

    pub fn approve(
        &mut self,
        caller: &AccountId,
        spender: &AccountId,
        tokens: u64,
        sink: &mut dyn EventSink,
    ) -> LedgerResult<()> {
        self.require_unlocked()?;
        require_spender(spender)?;
        self.record_approval(caller, spender, to_base_units(tokens), sink);
        Ok(())
    }

    pub fn increase_approval(
        &mut self,
        caller: &AccountId,
        spender: &AccountId,
        tokens: u64,
        sink: &mut dyn EventSink,
    ) -> LedgerResult<()> {
        self.require_unlocked()?;
        require_spender(spender)?;
        let amount = self
            .allowance(caller, spender)
            .checked_add(to_base_units(tokens))
            .ok_or(LedgerError::Overflow)?;
        self.record_approval(caller, spender, amount, sink);
        Ok(())
    }

    /// Lower the allowance, flooring at zero.
    pub fn decrease_approval(
        &mut self,
        caller: &AccountId,
        spender: &AccountId,
        tokens: u64,
        sink: &mut dyn EventSink,
    ) -> LedgerResult<()> {
        self.require_unlocked()?;
        require_spender(spender)?;
        let amount = self
            .allowance(caller, spender)
            .saturating_sub(to_base_units(tokens));
        self.record_approval(caller, spender, amount, sink);
        Ok(())
    }

    fn record_approval(
        &mut self,
        owner: &AccountId,
        spender: &AccountId,
        amount: Amount,
        sink: &mut dyn EventSink,
    ) {
        self.set_allowance(owner, spender, amount);
        self.height += 1;
        debug!(%owner, %spender, amount, "allowance updated");
        sink.record(LedgerEvent::Approval {
            owner: *owner,
            spender: *spender,
            amount,
        });
    }

    fn require_unlocked(&self) -> LedgerResult<()> {
        if !self.minting_finished {
            return Err(LedgerError::TransfersLocked);
        }
        Ok(())
    }

    fn move_balance(&mut self, from: &AccountId, to: &AccountId, amount: Amount) -> LedgerResult<()> {
        let have = self.balance_of(from);
        if have < amount {
            return Err(LedgerError::InsufficientBalance {
                account: *from,
                have,
                need: amount,
            });
        }
        if from == to {
            return Ok(());
        }
        let new_to = self
            .balance_of(to)
            .checked_add(amount)
            .ok_or(LedgerError::Overflow)?;
        self.balances.insert(*from, have - amount);
        self.balances.insert(*to, new_to);
        Ok(())
    }

    fn set_allowance(&mut self, owner: &AccountId, spender: &AccountId, amount: Amount) {
        self.allowances
            .entry(*owner)
            .or_default()
            .insert(*spender, amount);
    }

    // ------------------------------------------------------------------
    // Administration
    // ------------------------------------------------------------------

    pub fn transfer_ownership(
        &mut self,
        caller: &AccountId,
        new_owner: &AccountId,
        sink: &mut dyn EventSink,
    ) -> LedgerResult<()> {
        let event = self.ownership.transfer(caller, *new_owner)?;
        self.height += 1;
        info!(previous = %caller, new = %new_owner, "administrator changed");
        sink.record(event);
        Ok(())
    }

    // ------------------------------------------------------------------
    // Read accessors
    // ------------------------------------------------------------------

    pub fn token(&self) -> &TokenInfo {
        &self.token
    }

    pub fn policy(&self) -> &MintPolicy {
        &self.policy
    }

    pub fn phase(&self) -> Phase {
        self.policy.phase_at(self.total_supply)
    }

    pub fn owner(&self) -> &AccountId {
        self.ownership.owner()
    }

    pub fn is_administrator(&self, account: &AccountId) -> bool {
        self.ownership.is_administrator(account)
    }

    pub fn balance_of(&self, account: &AccountId) -> Amount {
        self.balances.get(account).copied().unwrap_or(0)
    }

    pub fn allowance(&self, owner: &AccountId, spender: &AccountId) -> Amount {
        self.allowances
            .get(owner)
            .and_then(|spenders| spenders.get(spender))
            .copied()
            .unwrap_or(0)
    }

    pub fn total_supply(&self) -> Amount {
        self.total_supply
    }

    pub fn minting_finished(&self) -> bool {
        self.minting_finished
    }

    pub fn owner_mint_count(&self, account: &AccountId) -> Amount {
        self.owner_minted.get(account).copied().unwrap_or(0)
    }

    pub fn self_mint_count(&self, account: &AccountId) -> Amount {
        self.self_minted.get(account).copied().unwrap_or(0)
    }

    /// Number of operations applied so far.
    pub fn height(&self) -> u64 {
        self.height
    }

    pub fn balances(&self) -> impl Iterator<Item = (&AccountId, &Amount)> {
        self.balances.iter()
    }

    /// Verify the supply and mint-count invariants of the current state.
    pub fn check_invariants(&self) -> LedgerResult<()> {
        let sum = self
            .balances
            .values()
            .try_fold(0 as Amount, |acc, b| acc.checked_add(*b))
            .ok_or_else(|| LedgerError::Corrupted("balance sum overflows".into()))?;
        if sum != self.total_supply {
            return Err(LedgerError::Corrupted(format!(
                "balances sum to {sum} but total supply is {}",
                self.total_supply
            )));
        }
        if self.total_supply > self.policy.total_supply_cap {
            return Err(LedgerError::Corrupted(format!(
                "total supply {} above cap {}",
                self.total_supply, self.policy.total_supply_cap
            )));
        }
        if let Some((account, minted)) = self
            .owner_minted
            .iter()
            .find(|(_, m)| **m > self.policy.owner_mint_limit)
        {
            return Err(LedgerError::Corrupted(format!(
                "owner mint count {minted} of {account} above limit"
            )));
        }
        if let Some((account, minted)) = self
            .self_minted
            .iter()
            .find(|(_, m)| **m > self.policy.self_mint_limit)
        {
            return Err(LedgerError::Corrupted(format!(
                "self mint count {minted} of {account} above limit"
            )));
        }
        if self.minting_finished != (self.total_supply == self.policy.total_supply_cap) {
            return Err(LedgerError::Corrupted(format!(
                "minting finished flag {} disagrees with total supply {}",
                self.minting_finished, self.total_supply
            )));
        }
        if self.owner().is_zero() {
            return Err(LedgerError::Corrupted("administrator is the zero account".into()));
        }
        Ok(())
    }

    fn supply_after(&self, amount: Amount) -> LedgerResult<Amount> {
        let would_have = self
            .total_supply
            .checked_add(amount)
            .ok_or(LedgerError::Overflow)?;
        if would_have > self.policy.total_supply_cap {
            return Err(LedgerError::SupplyCapExceeded {
                max: self.policy.total_supply_cap,
                would_have,
            });
        }
        Ok(would_have)
    }
}

fn positive(tokens: u64) -> LedgerResult<Amount> {
    if tokens == 0 {
        return Err(LedgerError::ZeroAmount);
    }
    Ok(to_base_units(tokens))
}

fn require_spender(spender: &AccountId) -> LedgerResult<()> {
    if spender.is_zero() {
        return Err(LedgerError::ZeroAccount { role: "spender" });
    }
    Ok(())
}
