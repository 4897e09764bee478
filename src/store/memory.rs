//! In-memory reference implementation of the ledger store.
//!
//! Backs the test suite and local development. A transaction takes the state
//! mutex for its whole lifetime and keeps a snapshot for rollback, which
//! makes it genuinely all-or-nothing and serializes concurrent writers the
//! way row locks would in a relational backend. Failure injection lets tests
//! force a mid-batch abort.

use super::{BatchOutcome, LedgerStore, StoreTransaction};
use crate::error::{Error, Result, StoreError};
use crate::types::{
    Account, BatchId, BatchStatus, CommissionEdge, Currency, Deposit, DepositId,
    DistributionBatch, LedgerEntry, UserId,
};
use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

#[derive(Debug, Clone, Default)]
struct MemoryState {
    accounts: HashMap<UserId, Account>,
    deposits: HashMap<DepositId, Deposit>,
    /// Ancestor edges per descendant, kept sorted ascending by level.
    edges: HashMap<UserId, Vec<CommissionEdge>>,
    entries: Vec<LedgerEntry>,
    batches: HashMap<BatchId, DistributionBatch>,
    multipliers: HashMap<UserId, Decimal>,
}

/// In-memory [`LedgerStore`].
///
/// Cloning shares the underlying state, like cloning a connection pool
/// handle.
#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
    /// Remaining credits before an injected failure; negative = disabled.
    fail_after: Arc<AtomicI64>,
}

impl MemoryStore {
    /// Creates an empty store with failure injection disabled.
    pub fn new() -> Self {
        let store = Self::default();
        store.fail_after.store(-1, Ordering::SeqCst);
        store
    }

    /// Seeds an account. Replaces any existing account for the same user.
    pub async fn insert_account(&self, account: Account) {
        self.state
            .lock()
            .await
            .accounts
            .insert(account.user, account);
    }

    /// Seeds a deposit.
    pub async fn insert_deposit(&self, deposit: Deposit) {
        self.state.lock().await.deposits.insert(deposit.id, deposit);
    }

    /// Removes an account, leaving its edges behind. Used to exercise the
    /// missing-ancestor skip policy.
    pub async fn remove_account(&self, user: UserId) {
        self.state.lock().await.accounts.remove(&user);
    }

    /// Flips a deposit's active flag.
    pub async fn set_deposit_active(&self, id: DepositId, active: bool) {
        if let Some(dep) = self.state.lock().await.deposits.get_mut(&id) {
            dep.active = active;
        }
    }

    /// Sets the live boost multiplier for a user.
    pub async fn set_rate_multiplier(&self, user: UserId, multiplier: Decimal) {
        self.state.lock().await.multipliers.insert(user, multiplier);
    }

    /// Makes the `n + 1`-th subsequent balance credit fail with a transient
    /// store error. The counter is shared across transactions and is not
    /// rolled back with them.
    pub fn fail_after_credits(&self, n: u32) {
        self.fail_after.store(i64::from(n), Ordering::SeqCst);
    }

    /// Disables failure injection.
    pub fn clear_failure_injection(&self) {
        self.fail_after.store(-1, Ordering::SeqCst);
    }

    fn take_credit_permit(fail_after: &AtomicI64) -> Result<()> {
        let mut current = fail_after.load(Ordering::SeqCst);
        loop {
            if current < 0 {
                return Ok(());
            }
            if current == 0 {
                return Err(StoreError::Unavailable("injected failure".into()).into());
            }
            match fail_after.compare_exchange_weak(
                current,
                current - 1,
                Ordering::SeqCst,
                Ordering::SeqCst,
            ) {
                Ok(_) => return Ok(()),
                Err(actual) => current = actual,
            }
        }
    }
}

#[async_trait]
impl LedgerStore for MemoryStore {
    async fn begin(&self) -> Result<Box<dyn StoreTransaction>> {
        let guard = Arc::clone(&self.state).lock_owned().await;
        let snapshot = guard.clone();
        Ok(Box::new(MemoryTransaction {
            guard,
            snapshot: Some(snapshot),
            fail_after: Arc::clone(&self.fail_after),
            committed: false,
        }))
    }

    async fn account(&self, user: UserId) -> Result<Option<Account>> {
        Ok(self.state.lock().await.accounts.get(&user).cloned())
    }

    async fn deposit(&self, id: DepositId) -> Result<Option<Deposit>> {
        Ok(self.state.lock().await.deposits.get(&id).cloned())
    }

    async fn ancestors(&self, user: UserId) -> Result<Vec<CommissionEdge>> {
        Ok(self
            .state
            .lock()
            .await
            .edges
            .get(&user)
            .cloned()
            .unwrap_or_default())
    }

    async fn insert_edges(&self, edges: &[CommissionEdge]) -> Result<usize> {
        for edge in edges {
            if !edge.is_valid() {
                return Err(Error::invalid_argument(format!(
                    "edge level {} outside 1..=20",
                    edge.level
                )));
            }
        }
        let mut state = self.state.lock().await;
        let mut inserted = 0;
        for edge in edges {
            let list = state.edges.entry(edge.descendant).or_default();
            // Insert-ignore-conflict on the (descendant, ancestor) key.
            if list.iter().any(|e| e.ancestor == edge.ancestor) {
                continue;
            }
            list.push(*edge);
            list.sort_by_key(|e| e.level);
            inserted += 1;
        }
        Ok(inserted)
    }

    async fn resolve_ref_code(&self, code: &str) -> Result<Option<UserId>> {
        Ok(self
            .state
            .lock()
            .await
            .accounts
            .values()
            .find(|a| a.ref_code == code)
            .map(|a| a.user))
    }

    async fn rate_multiplier(&self, user: UserId) -> Result<Decimal> {
        Ok(self
            .state
            .lock()
            .await
            .multipliers
            .get(&user)
            .copied()
            .unwrap_or(Decimal::ONE))
    }

    async fn insert_batch(&self, batch: &DistributionBatch) -> Result<()> {
        let mut state = self.state.lock().await;
        if state.batches.contains_key(&batch.id) {
            return Err(StoreError::Conflict(format!("duplicate batch id {}", batch.id)).into());
        }
        state.batches.insert(batch.id, batch.clone());
        Ok(())
    }

    async fn finish_batch(
        &self,
        id: BatchId,
        outcome: BatchOutcome,
        completed_at_ms: i64,
    ) -> Result<()> {
        let mut state = self.state.lock().await;
        let batch = state
            .batches
            .get_mut(&id)
            .ok_or_else(|| Error::not_found(format!("batch {id}")))?;
        if batch.is_terminal() {
            return Err(Error::invalid_state(format!("batch {id} already terminal")));
        }
        match outcome {
            BatchOutcome::Completed {
                levels_processed,
                ancestor_count,
                total_distributed,
            } => {
                batch.status = BatchStatus::Completed;
                batch.levels_processed = levels_processed;
                batch.ancestor_count = ancestor_count;
                batch.total_distributed = total_distributed;
            }
            BatchOutcome::Failed { error } => {
                batch.status = BatchStatus::Failed;
                batch.error_message = Some(error);
            }
        }
        batch.completed_at_ms = Some(completed_at_ms);
        Ok(())
    }

    async fn batch(&self, id: BatchId) -> Result<Option<DistributionBatch>> {
        Ok(self.state.lock().await.batches.get(&id).cloned())
    }

    async fn pending_batches(&self, created_before_ms: i64) -> Result<Vec<DistributionBatch>> {
        let state = self.state.lock().await;
        let mut pending: Vec<_> = state
            .batches
            .values()
            .filter(|b| b.status == BatchStatus::Pending && b.created_at_ms <= created_before_ms)
            .cloned()
            .collect();
        pending.sort_by_key(|b| b.created_at_ms);
        Ok(pending)
    }

    async fn entries(&self, user: UserId) -> Result<Vec<LedgerEntry>> {
        Ok(self
            .state
            .lock()
            .await
            .entries
            .iter()
            .filter(|e| e.account == user)
            .cloned()
            .collect())
    }
}

struct MemoryTransaction {
    guard: OwnedMutexGuard<MemoryState>,
    snapshot: Option<MemoryState>,
    fail_after: Arc<AtomicI64>,
    committed: bool,
}

impl MemoryTransaction {
    fn restore(&mut self) {
        if let Some(snapshot) = self.snapshot.take() {
            *self.guard = snapshot;
        }
    }
}

#[async_trait]
impl StoreTransaction for MemoryTransaction {
    async fn deposit(&mut self, id: DepositId) -> Result<Option<Deposit>> {
        Ok(self.guard.deposits.get(&id).cloned())
    }

    async fn credit_balance(
        &mut self,
        user: UserId,
        currency: Currency,
        delta: Decimal,
    ) -> Result<Decimal> {
        MemoryStore::take_credit_permit(&self.fail_after)?;
        let account = self
            .guard
            .accounts
            .get_mut(&user)
            .ok_or_else(|| Error::not_found(format!("account {user}")))?;
        let balance = account.balance_mut(currency);
        let new_balance = *balance + delta;
        if new_balance < Decimal::ZERO {
            return Err(Error::invalid_state(format!(
                "balance of account {user} would go negative"
            )));
        }
        *balance = new_balance;
        Ok(new_balance)
    }

    async fn append_entry(&mut self, entry: LedgerEntry) -> Result<()> {
        self.guard.entries.push(entry);
        Ok(())
    }

    async fn mark_deposit_settled(&mut self, id: DepositId, settled_at_ms: i64) -> Result<()> {
        let deposit = self
            .guard
            .deposits
            .get_mut(&id)
            .ok_or_else(|| Error::not_found(format!("deposit {id}")))?;
        if settled_at_ms < deposit.last_settled_at_ms {
            return Err(Error::invalid_state(format!(
                "settlement timestamp for deposit {id} would move backwards"
            )));
        }
        deposit.last_settled_at_ms = settled_at_ms;
        Ok(())
    }

    async fn commit(mut self: Box<Self>) -> Result<()> {
        self.committed = true;
        self.snapshot = None;
        Ok(())
    }

    async fn rollback(mut self: Box<Self>) -> Result<()> {
        self.restore();
        self.committed = true;
        Ok(())
    }
}

impl Drop for MemoryTransaction {
    fn drop(&mut self) {
        // Dropping an uncommitted transaction is a rollback.
        if !self.committed {
            self.restore();
        }
    }
}
