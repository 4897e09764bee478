//! Distribution batch audit types.
//!
//! One row per earning event processed by the distribution engine. The row is
//! created in `Pending` before any credit is attempted, so a crash mid-flight
//! still leaves an auditable "attempted" record, and transitions to exactly
//! one terminal state. A terminal batch is never re-opened: a caller retry
//! mints a fresh batch id for the same source event.

use super::account::{Currency, UserId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Globally unique distribution batch identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BatchId(pub Uuid);

impl BatchId {
    /// Generates a fresh batch id.
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for BatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for BatchId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::from_str(s).map(Self)
    }
}

/// Distribution batch status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BatchStatus {
    /// Inserted, credits not yet committed.
    Pending,
    /// All credits committed (possibly zero of them).
    Completed,
    /// Rolled back; no credit survived.
    Failed,
}

/// Append-only audit record of one distribution attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistributionBatch {
    /// Batch identifier.
    pub id: BatchId,
    /// User whose earning event triggered the distribution.
    pub source_user: UserId,
    /// Amount earned by the source user.
    pub earned_amount: Decimal,
    /// Currency of the earning and of every credit in the batch.
    pub currency: Currency,
    /// Current status.
    pub status: BatchStatus,
    /// Number of levels actually credited (dust and missing-account skips
    /// excluded).
    pub levels_processed: u32,
    /// Number of ancestors the source user had at distribution time.
    pub ancestor_count: u32,
    /// Sum of all credits applied.
    pub total_distributed: Decimal,
    /// Captured error message for failed batches.
    pub error_message: Option<String>,
    /// Creation timestamp, milliseconds since the Unix epoch.
    pub created_at_ms: i64,
    /// Terminal-transition timestamp.
    pub completed_at_ms: Option<i64>,
}

impl DistributionBatch {
    /// Creates a `Pending` batch row for an earning event.
    pub fn pending(
        id: BatchId,
        source_user: UserId,
        earned_amount: Decimal,
        currency: Currency,
        now_ms: i64,
    ) -> Self {
        Self {
            id,
            source_user,
            earned_amount,
            currency,
            status: BatchStatus::Pending,
            levels_processed: 0,
            ancestor_count: 0,
            total_distributed: Decimal::ZERO,
            error_message: None,
            created_at_ms: now_ms,
            completed_at_ms: None,
        }
    }

    /// Returns `true` once the batch reached a terminal state.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self.status, BatchStatus::Completed | BatchStatus::Failed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn pending_batch_starts_empty() {
        let b = DistributionBatch::pending(
            BatchId::new(),
            UserId::new(1),
            dec!(10),
            Currency::Token,
            1000,
        );
        assert_eq!(b.status, BatchStatus::Pending);
        assert!(!b.is_terminal());
        assert_eq!(b.total_distributed, Decimal::ZERO);
        assert_eq!(b.levels_processed, 0);
        assert!(b.completed_at_ms.is_none());
    }

    #[test]
    fn batch_id_round_trips_through_string() {
        let id = BatchId::new();
        let parsed: BatchId = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn terminal_states() {
        let mut b = DistributionBatch::pending(
            BatchId::new(),
            UserId::new(1),
            dec!(1),
            Currency::Token,
            0,
        );
        b.status = BatchStatus::Completed;
        assert!(b.is_terminal());
        b.status = BatchStatus::Failed;
        assert!(b.is_terminal());
    }
}
