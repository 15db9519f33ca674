use thiserror::Error;

use crate::account::AccountId;
use crate::amount::Amount;
use crate::policy::{Phase, PolicyError};

/// Broad failure categories reported to callers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Unauthorized,
    PhaseMismatch,
    LimitExceeded,
    InvalidArgument,
    InsufficientBalance,
    TransfersLocked,
    Internal,
}

/// Canonical error type of the issuance ledger.
///
/// Every rejected operation leaves the ledger untouched.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// Caller is not the administrator.
    #[error("caller {caller} is not the administrator")]
    NotAdministrator { caller: AccountId },

    /// Self minting is reserved for non-administrator accounts.
    #[error("administrator {caller} cannot self mint")]
    AdministratorSelfMint { caller: AccountId },

    #[error("{operation} is not permitted in the {phase} phase")]
    WrongPhase {
        operation: &'static str,
        phase: Phase,
    },

    #[error("owner mint limit exceeded for {account}: minted {minted}, requested {requested}, limit {limit}")]
    OwnerMintLimitExceeded {
        account: AccountId,
        minted: Amount,
        requested: Amount,
        limit: Amount,
    },

    #[error("self mint limit exceeded for {account}: minted {minted}, requested {requested}, limit {limit}")]
    SelfMintLimitExceeded {
        account: AccountId,
        minted: Amount,
        requested: Amount,
        limit: Amount,
    },

    #[error("supply cap exceeded: max {max}, would have {would_have}")]
    SupplyCapExceeded { max: Amount, would_have: Amount },

    /// Null identity supplied where a real account is required.
    #[error("the zero account is not a valid {role}")]
    ZeroAccount { role: &'static str },

    #[error("zero amount not allowed")]
    ZeroAmount,

    #[error("insufficient balance for {account}: have {have}, need {need}")]
    InsufficientBalance {
        account: AccountId,
        have: Amount,
        need: Amount,
    },

    #[error("insufficient allowance from {owner} to {spender}: have {have}, need {need}")]
    InsufficientAllowance {
        owner: AccountId,
        spender: AccountId,
        have: Amount,
        need: Amount,
    },

    /// Transfers and approvals stay locked until the supply cap is reached.
    #[error("transfers are locked until minting is finished")]
    TransfersLocked,

    #[error("invalid mint policy: {0}")]
    InvalidPolicy(#[from] PolicyError),

    #[error("genesis allocations are only accepted before the first operation")]
    GenesisSealed,

    #[error("arithmetic overflow")]
    Overflow,

    #[error("ledger state corrupted: {0}")]
    Corrupted(String),
}

impl LedgerError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            LedgerError::NotAdministrator { .. } | LedgerError::AdministratorSelfMint { .. } => {
                ErrorKind::Unauthorized
            }
            LedgerError::WrongPhase { .. } | LedgerError::GenesisSealed => {
                ErrorKind::PhaseMismatch
            }
            LedgerError::OwnerMintLimitExceeded { .. }
            | LedgerError::SelfMintLimitExceeded { .. }
            | LedgerError::SupplyCapExceeded { .. } => ErrorKind::LimitExceeded,
            LedgerError::ZeroAccount { .. }
            | LedgerError::ZeroAmount
            | LedgerError::InvalidPolicy(_) => ErrorKind::InvalidArgument,
            LedgerError::InsufficientBalance { .. } | LedgerError::InsufficientAllowance { .. } => {
                ErrorKind::InsufficientBalance
            }
            LedgerError::TransfersLocked => ErrorKind::TransfersLocked,
            LedgerError::Overflow | LedgerError::Corrupted(_) => ErrorKind::Internal,
        }
    }
}

/// Result type for ledger operations.
pub type LedgerResult<T> = Result<T, LedgerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_category_is_reachable() {
        let account = AccountId::new([7u8; 32]);
        assert_eq!(
            LedgerError::NotAdministrator { caller: account }.kind(),
            ErrorKind::Unauthorized
        );
        assert_eq!(
            LedgerError::WrongPhase {
                operation: "mint",
                phase: Phase::SelfMint
            }
            .kind(),
            ErrorKind::PhaseMismatch
        );
        assert_eq!(
            LedgerError::SupplyCapExceeded {
                max: 10,
                would_have: 11
            }
            .kind(),
            ErrorKind::LimitExceeded
        );
        assert_eq!(LedgerError::ZeroAmount.kind(), ErrorKind::InvalidArgument);
        assert_eq!(
            LedgerError::InsufficientBalance {
                account,
                have: 0,
                need: 1
            }
            .kind(),
            ErrorKind::InsufficientBalance
        );
        assert_eq!(LedgerError::TransfersLocked.kind(), ErrorKind::TransfersLocked);
    }

    #[test]
    fn messages_name_the_phase() {
        let err = LedgerError::WrongPhase {
            operation: "self mint",
            phase: Phase::OwnerMint,
        };
        assert_eq!(
            err.to_string(),
            "self mint is not permitted in the owner-mint phase"
        );
    }
}
