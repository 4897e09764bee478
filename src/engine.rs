//! The ledger engine.
//!
//! [`LedgerEngine`] is the single entry point collaborators (API layer, bot
//! layer, schedulers) call into. It is wired by explicit dependency
//! injection: a store handle, a policy struct and a clock, no module-level
//! state. The engine itself holds no locks; correctness under concurrent
//! triggers is delegated to the store's transaction contract.
//!
//! Operations are implemented next to their domain logic:
//! deposit settlement in [`crate::accrual`], inviter binding in
//! [`crate::chain`], commission distribution in [`crate::distribution`] and
//! the registration trigger in [`crate::registration`].

use crate::config::PolicyConfig;
use crate::error::{Error, Result};
use crate::store::LedgerStore;
use crate::time::Clock;
use crate::types::{BatchId, Currency, DistributionBatch, UserId};
use rust_decimal::Decimal;
use std::sync::Arc;

/// Reward ledger engine: continuous accrual plus referral commission
/// cascade.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use farmledger_core::config::PolicyConfig;
/// use farmledger_core::engine::LedgerEngine;
/// use farmledger_core::store::MemoryStore;
/// use farmledger_core::time::SystemClock;
///
/// let engine = LedgerEngine::new(
///     Arc::new(MemoryStore::new()),
///     PolicyConfig::default(),
///     Arc::new(SystemClock),
/// )
/// .unwrap();
/// ```
pub struct LedgerEngine {
    pub(crate) store: Arc<dyn LedgerStore>,
    pub(crate) policy: PolicyConfig,
    pub(crate) clock: Arc<dyn Clock>,
}

impl LedgerEngine {
    /// Wires an engine. Fails with `InvalidArgument` if the policy does not
    /// validate, so a bad percentage table is rejected at startup rather
    /// than mid-distribution.
    pub fn new(
        store: Arc<dyn LedgerStore>,
        policy: PolicyConfig,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        policy.validate()?;
        Ok(Self {
            store,
            policy,
            clock,
        })
    }

    /// The policy the engine was wired with.
    pub fn policy(&self) -> &PolicyConfig {
        &self.policy
    }

    /// Read-only batch lookup for audit and ops tooling.
    pub async fn get_batch_status(&self, batch_id: BatchId) -> Result<DistributionBatch> {
        self.store
            .batch(batch_id)
            .await?
            .ok_or_else(|| Error::not_found(format!("batch {batch_id}")))
    }

    /// Batches stuck in `Pending` for at least `older_than_ms`; input for an
    /// out-of-band reconciliation sweep. The engine never retries them
    /// itself.
    pub async fn pending_batches(&self, older_than_ms: i64) -> Result<Vec<DistributionBatch>> {
        let cutoff = self.clock.now_ms().saturating_sub(older_than_ms);
        self.store.pending_batches(cutoff).await
    }

    /// Verifies the reconciliation invariant for one account: the sum of its
    /// ledger entries per currency must equal the current balance. Returns
    /// `false` (and logs) on divergence.
    pub async fn reconcile_account(&self, user: UserId) -> Result<bool> {
        let account = self
            .store
            .account(user)
            .await?
            .ok_or_else(|| Error::not_found(format!("account {user}")))?;
        let entries = self.store.entries(user).await?;

        for currency in [Currency::Token, Currency::Usdt] {
            let sum: Decimal = entries
                .iter()
                .filter(|e| e.currency == currency)
                .map(|e| e.amount)
                .sum();
            let balance = account.balance(currency);
            if sum != balance {
                tracing::warn!(
                    user_id = %user,
                    currency = %currency,
                    entry_sum = %sum,
                    balance = %balance,
                    "ledger entries diverge from balance"
                );
                return Ok(false);
            }
        }
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use crate::time::ManualClock;
    use rust_decimal_macros::dec;

    fn engine_with(policy: PolicyConfig) -> Result<LedgerEngine> {
        LedgerEngine::new(
            Arc::new(MemoryStore::new()),
            policy,
            Arc::new(ManualClock::new(0)),
        )
    }

    #[test]
    fn rejects_invalid_policy_at_wiring_time() {
        let bad = PolicyConfig::default().with_level_percents(vec![dec!(150)]);
        assert!(engine_with(bad).is_err());
        assert!(engine_with(PolicyConfig::default()).is_ok());
    }

    #[tokio::test]
    async fn batch_status_not_found() {
        let engine = engine_with(PolicyConfig::default()).unwrap();
        let err = engine.get_batch_status(BatchId::new()).await.unwrap_err();
        assert!(err.as_not_found().is_some());
    }

    #[tokio::test]
    async fn reconcile_missing_account_is_not_found() {
        let engine = engine_with(PolicyConfig::default()).unwrap();
        let err = engine.reconcile_account(UserId::new(1)).await.unwrap_err();
        assert!(err.as_not_found().is_some());
    }
}
