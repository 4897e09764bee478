//! Deposit type definitions.

use super::account::UserId;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Deposit identifier (zero-cost wrapper).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DepositId(pub i64);

impl DepositId {
    /// Creates a new deposit id.
    pub fn new(id: i64) -> Self {
        Self(id)
    }
}

impl fmt::Display for DepositId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for DepositId {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

/// A principal deposit continuously accruing yield.
///
/// `rate_per_second` is stored with full [`Decimal`] precision (28
/// significant digits) so sub-cent per-tick accrual does not drift over
/// millions of settlements. Boost multipliers are applied to the rate at
/// read time, never written into it, so every historical settlement remains
/// auditable against the rate that was actually in effect.
///
/// Invariant: `last_settled_at_ms <= now`. Each settlement advances
/// `last_settled_at_ms` atomically with the balance credit, so an elapsed
/// interval is never counted twice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Deposit {
    /// Deposit identifier.
    pub id: DepositId,
    /// Owning account.
    pub owner: UserId,
    /// Principal amount.
    pub principal: Decimal,
    /// Accrual rate per second, as a fraction of the principal.
    pub rate_per_second: Decimal,
    /// Creation timestamp, milliseconds since the Unix epoch.
    pub created_at_ms: i64,
    /// Instant up to which yield has already been credited.
    pub last_settled_at_ms: i64,
    /// Inactive deposits accrue nothing and refuse settlement.
    pub active: bool,
}

impl Deposit {
    /// Creates an active deposit settled up to its creation instant.
    pub fn new(
        id: DepositId,
        owner: UserId,
        principal: Decimal,
        rate_per_second: Decimal,
        created_at_ms: i64,
    ) -> Self {
        Self {
            id,
            owner,
            principal,
            rate_per_second,
            created_at_ms,
            last_settled_at_ms: created_at_ms,
            active: true,
        }
    }
}
