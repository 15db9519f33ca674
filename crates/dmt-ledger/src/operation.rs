use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::account::AccountId;
use crate::error::LedgerResult;
use crate::events::EventSink;
use crate::ledger::IssuanceLedger;

/// A mutating ledger operation as submitted by a caller.
///
/// Token quantities are whole tokens.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Operation {
    Mint {
        to: AccountId,
        tokens: u64,
    },
    SelfMint {
        tokens: u64,
    },
    FinishMinting,
    Transfer {
        to: AccountId,
        tokens: u64,
    },
    Approve {
        spender: AccountId,
        tokens: u64,
    },
    TransferFrom {
        from: AccountId,
        to: AccountId,
        tokens: u64,
    },
    IncreaseApproval {
        spender: AccountId,
        tokens: u64,
    },
    DecreaseApproval {
        spender: AccountId,
        tokens: u64,
    },
    TransferOwnership {
        new_owner: AccountId,
    },
}

impl Operation {
    pub fn name(&self) -> &'static str {
        match self {
            Operation::Mint { .. } => "mint",
            Operation::SelfMint { .. } => "self_mint",
            Operation::FinishMinting => "finish_minting",
            Operation::Transfer { .. } => "transfer",
            Operation::Approve { .. } => "approve",
            Operation::TransferFrom { .. } => "transfer_from",
            Operation::IncreaseApproval { .. } => "increase_approval",
            Operation::DecreaseApproval { .. } => "decrease_approval",
            Operation::TransferOwnership { .. } => "transfer_ownership",
        }
    }
}

impl IssuanceLedger {
    /// Dispatch `operation` on behalf of `caller`.
    pub fn apply(
        &mut self,
        caller: &AccountId,
        operation: &Operation,
        sink: &mut dyn EventSink,
    ) -> LedgerResult<()> {
        let result = match operation {
            Operation::Mint { to, tokens } => self.mint(caller, to, *tokens, sink),
            Operation::SelfMint { tokens } => self.self_mint(caller, *tokens, sink),
            Operation::FinishMinting => self.finish_minting(caller, sink).map(|_| ()),
            Operation::Transfer { to, tokens } => self.transfer(caller, to, *tokens, sink),
            Operation::Approve { spender, tokens } => self.approve(caller, spender, *tokens, sink),
            Operation::TransferFrom { from, to, tokens } => {
                self.transfer_from(caller, from, to, *tokens, sink)
            }
            Operation::IncreaseApproval { spender, tokens } => {
                self.increase_approval(caller, spender, *tokens, sink)
            }
            Operation::DecreaseApproval { spender, tokens } => {
                self.decrease_approval(caller, spender, *tokens, sink)
            }
            Operation::TransferOwnership { new_owner } => {
                self.transfer_ownership(caller, new_owner, sink)
            }
        };
        if let Err(err) = &result {
            debug!(%caller, op = operation.name(), %err, "operation rejected");
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::events::LedgerEvent;

    fn account(id: u8) -> AccountId {
        AccountId::new([id; 32])
    }

    #[test]
    fn parses_tagged_json() {
        let json = format!(
            r#"{{"op":"transfer_from","from":"{}","to":"{}","tokens":1000}}"#,
            account(1),
            account(2)
        );
        let op: Operation = serde_json::from_str(&json).unwrap();
        assert_eq!(
            op,
            Operation::TransferFrom {
                from: account(1),
                to: account(2),
                tokens: 1_000
            }
        );
        let finish: Operation = serde_json::from_str(r#"{"op":"finish_minting"}"#).unwrap();
        assert_eq!(finish.name(), "finish_minting");
    }

    #[test]
    fn apply_dispatches_and_reports_failures() {
        let admin = account(0xaa);
        let mut ledger = IssuanceLedger::new(admin).unwrap();
        let mut sink: Vec<LedgerEvent> = Vec::new();

        ledger
            .apply(
                &admin,
                &Operation::Mint {
                    to: account(1),
                    tokens: 10,
                },
                &mut sink,
            )
            .unwrap();
        assert_eq!(sink.len(), 1);

        let err = ledger
            .apply(&account(1), &Operation::SelfMint { tokens: 10 }, &mut sink)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PhaseMismatch);

        let err = ledger
            .apply(
                &account(1),
                &Operation::Transfer {
                    to: account(2),
                    tokens: 1,
                },
                &mut sink,
            )
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TransfersLocked);

        ledger
            .apply(
                &admin,
                &Operation::TransferOwnership {
                    new_owner: account(3),
                },
                &mut sink,
            )
            .unwrap();
        assert_eq!(ledger.owner(), &account(3));
        assert_eq!(ledger.height(), 2);
    }
}
