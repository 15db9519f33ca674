//! Randomized operation sequences must never break the accounting invariants.

use dmt_ledger::{
    AccountId, IssuanceLedger, LedgerEvent, MintPolicy, Operation, Phase, TokenInfo,
};
use proptest::prelude::*;

const ADMIN: AccountId = AccountId::new([0xaa; 32]);

fn account(id: u8) -> AccountId {
    AccountId::new([id; 32])
}

/// Scaled-down policy so random runs actually cross both phase boundaries.
fn small_policy() -> MintPolicy {
    MintPolicy::from_whole_tokens(500, 3_000, 100, 10_000).unwrap()
}

fn arb_caller() -> impl Strategy<Value = AccountId> {
    prop_oneof![1 => Just(ADMIN), 6 => (1u8..=40).prop_map(account)]
}

fn arb_operation() -> impl Strategy<Value = Operation> {
    let target = (1u8..=40).prop_map(account);
    let tokens = 0u64..=600;
    prop_oneof![
        4 => (target.clone(), tokens.clone()).prop_map(|(to, tokens)| Operation::Mint { to, tokens }),
        4 => tokens.clone().prop_map(|tokens| Operation::SelfMint { tokens }),
        1 => Just(Operation::FinishMinting),
        2 => (target.clone(), tokens.clone()).prop_map(|(to, tokens)| Operation::Transfer { to, tokens }),
        1 => (target.clone(), tokens.clone())
            .prop_map(|(spender, tokens)| Operation::Approve { spender, tokens }),
        1 => (target.clone(), tokens.clone())
            .prop_map(|(spender, tokens)| Operation::IncreaseApproval { spender, tokens }),
        1 => (target.clone(), tokens.clone())
            .prop_map(|(spender, tokens)| Operation::DecreaseApproval { spender, tokens }),
        1 => (target.clone(), target.clone(), tokens)
            .prop_map(|(from, to, tokens)| Operation::TransferFrom { from, to, tokens }),
        1 => prop_oneof![1 => Just(AccountId::ZERO), 9 => target]
            .prop_map(|new_owner| Operation::TransferOwnership { new_owner }),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn random_sequences_preserve_supply_and_limits(
        steps in prop::collection::vec((arb_caller(), arb_operation()), 1..300)
    ) {
        let policy = small_policy();
        let mut ledger =
            IssuanceLedger::with_policy(TokenInfo::default(), policy, ADMIN).unwrap();

        for (caller, op) in &steps {
            let supply_before = ledger.total_supply();
            let owner_before = *ledger.owner();
            let finished_before = ledger.minting_finished();
            let mut events: Vec<LedgerEvent> = Vec::new();
            let result = ledger.apply(caller, op, &mut events);

            if result.is_err() {
                prop_assert!(events.is_empty());
                prop_assert_eq!(ledger.total_supply(), supply_before);
            }
            if !finished_before
                && matches!(
                    op,
                    Operation::Transfer { .. }
                        | Operation::Approve { .. }
                        | Operation::IncreaseApproval { .. }
                        | Operation::DecreaseApproval { .. }
                        | Operation::TransferFrom { .. }
                )
            {
                prop_assert!(result.is_err());
            }
            if let Operation::TransferOwnership { new_owner } = op {
                if result.is_ok() {
                    prop_assert_eq!(caller, &owner_before);
                    prop_assert_eq!(ledger.owner(), new_owner);
                } else {
                    prop_assert_eq!(ledger.owner(), &owner_before);
                }
            }
            prop_assert!(!ledger.owner().is_zero());

            prop_assert!(ledger.check_invariants().is_ok());
            let sum: u128 = ledger.balances().map(|(_, balance)| *balance).sum();
            prop_assert_eq!(sum, ledger.total_supply());
            prop_assert!(ledger.total_supply() >= supply_before);
            prop_assert!(ledger.total_supply() <= policy.total_supply_cap);
            prop_assert_eq!(
                ledger.minting_finished(),
                ledger.total_supply() == policy.total_supply_cap
            );
            if ledger.minting_finished() {
                prop_assert_eq!(ledger.phase(), Phase::Finished);
            }
            for id in 1u8..=40 {
                prop_assert!(ledger.owner_mint_count(&account(id)) <= policy.owner_mint_limit);
                prop_assert!(ledger.self_mint_count(&account(id)) <= policy.self_mint_limit);
            }
        }
    }

    #[test]
    fn minting_stops_exactly_at_the_cap(rounds in 1usize..5) {
        let policy = small_policy();
        let mut ledger =
            IssuanceLedger::with_policy(TokenInfo::default(), policy, ADMIN).unwrap();
        let mut sink = Vec::new();

        for id in 1u8..=6 {
            ledger.mint(&ADMIN, &account(id), 500, &mut sink).unwrap();
        }
        prop_assert_eq!(ledger.phase(), Phase::SelfMint);

        // 70 self minters x 100 tokens is exactly the remaining 7,000
        for _ in 0..rounds {
            for id in 100u8..170 {
                let _ = ledger.self_mint(&account(id), 100, &mut sink);
            }
        }
        prop_assert!(ledger.minting_finished());
        prop_assert_eq!(ledger.total_supply(), policy.total_supply_cap);
        prop_assert_eq!(
            sink.iter().filter(|e| matches!(e, LedgerEvent::MintFinished)).count(),
            1
        );
    }
}
