use serde::{Deserialize, Serialize};

use crate::account::AccountId;
use crate::error::{LedgerError, LedgerResult};
use crate::events::LedgerEvent;

/// Holder of the administrator capability.
///
/// Exactly one account is administrator at any time and it is never the
/// zero account.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ownership {
    owner: AccountId,
}

impl Ownership {
    pub fn new(owner: AccountId) -> LedgerResult<Self> {
        if owner.is_zero() {
            return Err(LedgerError::ZeroAccount {
                role: "administrator",
            });
        }
        Ok(Self { owner })
    }

    pub fn owner(&self) -> &AccountId {
        &self.owner
    }

    pub fn is_administrator(&self, caller: &AccountId) -> bool {
        self.owner == *caller
    }

    pub fn require_administrator(&self, caller: &AccountId) -> LedgerResult<()> {
        if !self.is_administrator(caller) {
            return Err(LedgerError::NotAdministrator { caller: *caller });
        }
        Ok(())
    }

    /// Hand the capability to `new_owner`.
    pub fn transfer(&mut self, caller: &AccountId, new_owner: AccountId) -> LedgerResult<LedgerEvent> {
        self.require_administrator(caller)?;
        if new_owner.is_zero() {
            return Err(LedgerError::ZeroAccount {
                role: "administrator",
            });
        }
        let previous = self.owner;
        self.owner = new_owner;
        Ok(LedgerEvent::OwnershipTransferred {
            previous,
            new: new_owner,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account(id: u8) -> AccountId {
        AccountId::new([id; 32])
    }

    #[test]
    fn zero_account_cannot_own() {
        assert!(Ownership::new(AccountId::ZERO).is_err());
        let mut ownership = Ownership::new(account(1)).unwrap();
        assert_eq!(
            ownership.transfer(&account(1), AccountId::ZERO),
            Err(LedgerError::ZeroAccount {
                role: "administrator"
            })
        );
        assert_eq!(ownership.owner(), &account(1));
    }

    #[test]
    fn only_owner_can_transfer() {
        let mut ownership = Ownership::new(account(1)).unwrap();
        assert!(ownership.transfer(&account(2), account(2)).is_err());

        let event = ownership.transfer(&account(1), account(2)).unwrap();
        assert_eq!(
            event,
            LedgerEvent::OwnershipTransferred {
                previous: account(1),
                new: account(2)
            }
        );
        assert!(ownership.is_administrator(&account(2)));
        assert!(!ownership.is_administrator(&account(1)));
    }
}
