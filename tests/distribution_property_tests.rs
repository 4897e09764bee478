//! Property tests for distribution invariants: per-level exactness,
//! conservation between result, batch row and ledger entries, and
//! all-or-nothing rollback under injected failures.

use farmledger_core::prelude::*;
use proptest::prelude::*;
use rust_decimal_macros::dec;
use std::sync::Arc;
use tokio::runtime::Runtime;

const T0: i64 = 1_700_000_000_000;
const SOURCE: i64 = 999;

fn amount_strategy() -> impl Strategy<Value = Decimal> {
    // 0.0001 ..= 100_000.0000
    (1i64..=1_000_000_000).prop_map(|n| Decimal::new(n, 4))
}

fn percent_table_strategy() -> impl Strategy<Value = Vec<Decimal>> {
    // 0.00% ..= 100.00%, up to the full depth
    prop::collection::vec((0i64..=10_000).prop_map(|n| Decimal::new(n, 2)), 0..=20)
}

struct Scenario {
    engine: LedgerEngine,
    store: MemoryStore,
    depth: u8,
}

/// Seeds the source user with `depth` ancestors, ancestor at level L being
/// account L.
async fn scenario(policy: PolicyConfig, depth: u8) -> Scenario {
    let store = MemoryStore::new();
    let engine = LedgerEngine::new(
        Arc::new(store.clone()),
        policy,
        Arc::new(ManualClock::new(T0)),
    )
    .unwrap();

    store
        .insert_account(Account::new(UserId::new(SOURCE), "ref-src", T0))
        .await;
    let mut edges = Vec::new();
    for level in 1..=depth {
        let id = i64::from(level);
        store
            .insert_account(Account::new(UserId::new(id), format!("ref-{id}"), T0))
            .await;
        edges.push(CommissionEdge::new(
            UserId::new(SOURCE),
            UserId::new(id),
            level,
        ));
    }
    store.insert_edges(&edges).await.unwrap();
    Scenario {
        engine,
        store,
        depth,
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn credits_match_the_percentage_table_exactly(
        amount in amount_strategy(),
        percents in percent_table_strategy(),
        depth in 0u8..=20,
    ) {
        let rt = Runtime::new().unwrap();
        rt.block_on(async {
            let policy = PolicyConfig::default()
                .with_level_percents(percents.clone())
                .with_min_distribution(Decimal::ZERO)
                .with_dust_threshold(Currency::Token, Decimal::ZERO);
            let s = scenario(policy, depth).await;

            let result = s
                .engine
                .distribute(UserId::new(SOURCE), amount, Currency::Token)
                .await
                .unwrap();

            let mut expected_total = Decimal::ZERO;
            let mut expected_levels = 0u32;
            for level in 1..=depth {
                let percent = percents
                    .get(usize::from(level) - 1)
                    .copied()
                    .unwrap_or(Decimal::ZERO);
                let bonus = amount * percent / dec!(100);
                let balance = s
                    .store
                    .account(UserId::new(i64::from(level)))
                    .await
                    .unwrap()
                    .unwrap()
                    .token_balance;
                prop_assert_eq!(balance, bonus);
                if !bonus.is_zero() {
                    expected_total += bonus;
                    expected_levels += 1;
                }
            }

            prop_assert_eq!(result.total_distributed, expected_total);
            prop_assert_eq!(result.levels_processed, expected_levels);
            Ok(())
        })?;
    }

    #[test]
    fn batch_row_and_ledger_entries_agree_with_the_result(
        amount in amount_strategy(),
        percents in percent_table_strategy(),
        depth in 0u8..=20,
    ) {
        let rt = Runtime::new().unwrap();
        rt.block_on(async {
            let policy = PolicyConfig::default()
                .with_level_percents(percents)
                .with_min_distribution(Decimal::ZERO)
                .with_dust_threshold(Currency::Token, Decimal::ZERO);
            let s = scenario(policy, depth).await;

            let result = s
                .engine
                .distribute(UserId::new(SOURCE), amount, Currency::Token)
                .await
                .unwrap();

            let batch = s.engine.get_batch_status(result.batch_id).await.unwrap();
            prop_assert_eq!(batch.status, BatchStatus::Completed);
            prop_assert_eq!(batch.total_distributed, result.total_distributed);
            prop_assert_eq!(batch.levels_processed, result.levels_processed);
            prop_assert_eq!(batch.ancestor_count, u32::from(depth));

            let mut entry_sum = Decimal::ZERO;
            let mut entry_count = 0u32;
            for level in 1..=depth {
                let user = UserId::new(i64::from(level));
                for entry in s.store.entries(user).await.unwrap() {
                    prop_assert_eq!(entry.batch_id, Some(result.batch_id));
                    prop_assert_eq!(entry.source_user, Some(UserId::new(SOURCE)));
                    prop_assert_eq!(entry.level, Some(level));
                    entry_sum += entry.amount;
                    entry_count += 1;
                }
                prop_assert!(s.engine.reconcile_account(user).await.unwrap());
            }
            prop_assert_eq!(entry_sum, result.total_distributed);
            prop_assert_eq!(entry_count, result.levels_processed);
            Ok(())
        })?;
    }

    #[test]
    fn dust_threshold_only_ever_shrinks_the_batch(
        amount in amount_strategy(),
        percents in percent_table_strategy(),
        depth in 0u8..=20,
        dust_raw in 0i64..=1_000_000,
    ) {
        let rt = Runtime::new().unwrap();
        rt.block_on(async {
            let dust = Decimal::new(dust_raw, 4);
            let policy = PolicyConfig::default()
                .with_level_percents(percents.clone())
                .with_min_distribution(Decimal::ZERO)
                .with_dust_threshold(Currency::Token, dust);
            let s = scenario(policy, depth).await;

            let result = s
                .engine
                .distribute(UserId::new(SOURCE), amount, Currency::Token)
                .await
                .unwrap();

            let mut expected_total = Decimal::ZERO;
            let mut expected_levels = 0u32;
            for level in 1..=depth {
                let percent = percents
                    .get(usize::from(level) - 1)
                    .copied()
                    .unwrap_or(Decimal::ZERO);
                let bonus = amount * percent / dec!(100);
                let credited = !bonus.is_zero() && bonus >= dust;
                if credited {
                    expected_total += bonus;
                    expected_levels += 1;
                }
                let balance = s
                    .store
                    .account(UserId::new(i64::from(level)))
                    .await
                    .unwrap()
                    .unwrap()
                    .token_balance;
                prop_assert_eq!(balance, if credited { bonus } else { Decimal::ZERO });
            }
            prop_assert_eq!(result.total_distributed, expected_total);
            prop_assert_eq!(result.levels_processed, expected_levels);
            Ok(())
        })?;
    }

    #[test]
    fn injected_failure_leaves_no_partial_credit(
        amount in amount_strategy(),
        fail_after in 0u32..=6,
    ) {
        let rt = Runtime::new().unwrap();
        rt.block_on(async {
            let policy = PolicyConfig::default()
                .with_level_percents(vec![dec!(10); 5])
                .with_min_distribution(Decimal::ZERO)
                .with_dust_threshold(Currency::Token, Decimal::ZERO);
            let s = scenario(policy, 5).await;

            s.store.fail_after_credits(fail_after);
            let outcome = s
                .engine
                .distribute(UserId::new(SOURCE), amount, Currency::Token)
                .await;
            s.store.clear_failure_injection();

            if fail_after >= u32::from(s.depth) {
                prop_assert!(outcome.is_ok());
            } else {
                let err = outcome.unwrap_err();
                prop_assert!(err.is_retryable());
                for level in 1..=s.depth {
                    let user = UserId::new(i64::from(level));
                    let account = s.store.account(user).await.unwrap().unwrap();
                    prop_assert_eq!(account.token_balance, Decimal::ZERO);
                    prop_assert!(s.store.entries(user).await.unwrap().is_empty());
                }
            }
            Ok(())
        })?;
    }
}
