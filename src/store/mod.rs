//! The ledger store seam.
//!
//! The engine owns no cross-task locks: every correctness-critical invariant
//! (balance accuracy, no double-credit, all-or-nothing distribution) is
//! delegated to the store's transaction contract, mirroring how a relational
//! backend provides them with read-committed isolation and server-side
//! atomic increments.
//!
//! [`LedgerStore`] is the dependency-injection seam: production wires a
//! relational adapter, tests wire [`MemoryStore`]. Calls into the store are
//! the only suspension points in the engine; all other computation is pure.

mod memory;

use crate::error::Result;
use crate::types::{
    Account, BatchId, CommissionEdge, Currency, Deposit, DepositId, DistributionBatch,
    LedgerEntry, UserId,
};
use async_trait::async_trait;
use rust_decimal::Decimal;

pub use memory::MemoryStore;

/// Terminal outcome applied to a pending distribution batch.
///
/// A batch transitions to exactly one terminal state and is never re-opened;
/// stores must reject a second transition.
#[derive(Debug, Clone, PartialEq)]
pub enum BatchOutcome {
    /// All credits committed.
    Completed {
        /// Number of levels actually credited.
        levels_processed: u32,
        /// Number of ancestors the source user had.
        ancestor_count: u32,
        /// Sum of all applied credits.
        total_distributed: Decimal,
    },
    /// The transaction rolled back; no credit survived.
    Failed {
        /// Captured error message.
        error: String,
    },
}

/// Storage backend for accounts, deposits, commission edges, ledger entries
/// and distribution batches.
///
/// Write-once data (commission edges) and append-mostly data (batches,
/// entries) are mutated through plain store calls; every balance mutation
/// goes through a [`StoreTransaction`].
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Opens a transaction. All balance mutations inside it commit together
    /// or not at all; dropping an uncommitted transaction rolls it back.
    async fn begin(&self) -> Result<Box<dyn StoreTransaction>>;

    /// Looks up an account.
    async fn account(&self, user: UserId) -> Result<Option<Account>>;

    /// Looks up a deposit.
    async fn deposit(&self, id: DepositId) -> Result<Option<Deposit>>;

    /// Returns the flattened ancestor list for `user`, ascending by level.
    /// Edges are write-once, so reading them outside a transaction is safe.
    async fn ancestors(&self, user: UserId) -> Result<Vec<CommissionEdge>>;

    /// Inserts chain edges with insert-ignore-conflict semantics: an edge
    /// whose `(descendant, ancestor)` pair already exists is skipped rather
    /// than aborting the batch. Returns the number actually inserted.
    async fn insert_edges(&self, edges: &[CommissionEdge]) -> Result<usize>;

    /// Resolves a referral code to the owning account's user id.
    async fn resolve_ref_code(&self, code: &str) -> Result<Option<UserId>>;

    /// Live boost multiplier applied to a user's accrual rate at read time.
    /// `1` when the user holds no boost.
    async fn rate_multiplier(&self, user: UserId) -> Result<Decimal>;

    /// Inserts a `Pending` batch row. Deliberately outside the main
    /// transaction: a crash before any credit still leaves an auditable
    /// "attempted" record. Fails on a duplicate batch id.
    async fn insert_batch(&self, batch: &DistributionBatch) -> Result<()>;

    /// Applies the terminal outcome to a pending batch. Fails with
    /// `InvalidState` if the batch is already terminal.
    async fn finish_batch(
        &self,
        id: BatchId,
        outcome: BatchOutcome,
        completed_at_ms: i64,
    ) -> Result<()>;

    /// Looks up a batch row.
    async fn batch(&self, id: BatchId) -> Result<Option<DistributionBatch>>;

    /// Batches still `Pending` that were created at or before
    /// `created_before_ms`; candidates for an out-of-band reconciliation
    /// sweep. The engine itself never retries them.
    async fn pending_batches(&self, created_before_ms: i64) -> Result<Vec<DistributionBatch>>;

    /// All ledger entries for an account, oldest first.
    async fn entries(&self, user: UserId) -> Result<Vec<LedgerEntry>>;
}

/// One open ledger transaction.
///
/// Reads through the transaction observe a state consistent with its own
/// writes; `credit_balance` has server-side atomic increment semantics, never
/// read-modify-write in application code.
#[async_trait]
pub trait StoreTransaction: Send {
    /// Reads a deposit within the transaction (row-stable for the duration).
    async fn deposit(&mut self, id: DepositId) -> Result<Option<Deposit>>;

    /// Atomically increments an account balance (`delta` may be negative for
    /// debits) and returns the new balance. Fails with `NotFound` if the
    /// account does not exist and `InvalidState` if the balance would go
    /// negative.
    async fn credit_balance(
        &mut self,
        user: UserId,
        currency: Currency,
        delta: Decimal,
    ) -> Result<Decimal>;

    /// Appends one immutable ledger entry.
    async fn append_entry(&mut self, entry: LedgerEntry) -> Result<()>;

    /// Advances a deposit's last-settled timestamp. Fails with
    /// `InvalidState` if the timestamp would move backwards.
    async fn mark_deposit_settled(&mut self, id: DepositId, settled_at_ms: i64) -> Result<()>;

    /// Commits every mutation made through this transaction.
    async fn commit(self: Box<Self>) -> Result<()>;

    /// Discards every mutation made through this transaction.
    async fn rollback(self: Box<Self>) -> Result<()>;
}
