//! Ledger entry type definitions.
//!
//! Every balance-affecting event appends exactly one immutable entry; the sum
//! of entries for an account must always equal that account's current balance
//! (reconciliation invariant).

use super::account::{Currency, UserId};
use super::batch::BatchId;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Ledger entry type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LedgerEntryType {
    /// Yield credited by settling a deposit.
    AccrualSettlement,
    /// Commission cascaded from a descendant's earning event.
    CommissionCredit,
    /// Flat bonus distributed on referral registration.
    SignupBonus,
    /// Principal paid in.
    Deposit,
    /// Funds paid out (negative amount).
    Withdrawal,
}

/// Ledger entry status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryStatus {
    /// Committed together with its balance change.
    Completed,
    /// Awaiting external confirmation (withdrawals only).
    Pending,
    /// Rejected by the external settlement layer.
    Failed,
}

/// One immutable record of a balance-affecting event. Never updated or
/// deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// Entry identifier.
    pub id: Uuid,
    /// Account whose balance changed.
    pub account: UserId,
    /// What kind of event produced this entry.
    #[serde(rename = "type")]
    pub entry_type: LedgerEntryType,
    /// Currency of the amount.
    pub currency: Currency,
    /// Signed amount: credits positive, debits negative.
    pub amount: Decimal,
    /// Entry status.
    pub status: EntryStatus,
    /// Whose earning event generated this entry, for commission credits.
    pub source_user: Option<UserId>,
    /// Distribution batch this entry belongs to, if any.
    pub batch_id: Option<BatchId>,
    /// Referral level the commission was paid for.
    pub level: Option<u8>,
    /// Percentage applied at that level, for auditability.
    pub percent: Option<Decimal>,
    /// Creation timestamp, milliseconds since the Unix epoch.
    pub created_at_ms: i64,
}

impl LedgerEntry {
    /// Entry for a deposit settlement crediting the owner's own yield.
    pub fn accrual(account: UserId, currency: Currency, amount: Decimal, now_ms: i64) -> Self {
        Self {
            id: Uuid::new_v4(),
            account,
            entry_type: LedgerEntryType::AccrualSettlement,
            currency,
            amount,
            status: EntryStatus::Completed,
            source_user: None,
            batch_id: None,
            level: None,
            percent: None,
            created_at_ms: now_ms,
        }
    }

    /// Entry for one commission credit within a distribution batch, tagged
    /// with the source user and the level/percent used.
    #[allow(clippy::too_many_arguments)]
    pub fn commission(
        account: UserId,
        currency: Currency,
        amount: Decimal,
        source_user: UserId,
        batch_id: BatchId,
        level: u8,
        percent: Decimal,
        now_ms: i64,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            account,
            entry_type: LedgerEntryType::CommissionCredit,
            currency,
            amount,
            status: EntryStatus::Completed,
            source_user: Some(source_user),
            batch_id: Some(batch_id),
            level: Some(level),
            percent: Some(percent),
            created_at_ms: now_ms,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn accrual_entry_carries_no_batch() {
        let e = LedgerEntry::accrual(UserId::new(1), Currency::Token, dec!(0.5), 1000);
        assert_eq!(e.entry_type, LedgerEntryType::AccrualSettlement);
        assert_eq!(e.status, EntryStatus::Completed);
        assert!(e.batch_id.is_none());
        assert!(e.source_user.is_none());
    }

    #[test]
    fn commission_entry_records_audit_fields() {
        let batch = BatchId::new();
        let e = LedgerEntry::commission(
            UserId::new(2),
            Currency::Token,
            dec!(0.2),
            UserId::new(9),
            batch,
            2,
            dec!(2),
            1000,
        );
        assert_eq!(e.source_user, Some(UserId::new(9)));
        assert_eq!(e.batch_id, Some(batch));
        assert_eq!(e.level, Some(2));
        assert_eq!(e.percent, Some(dec!(2)));
    }

    #[test]
    fn serde_uses_type_field() {
        let e = LedgerEntry::accrual(UserId::new(1), Currency::Token, dec!(1), 0);
        let json = serde_json::to_value(&e).unwrap();
        assert_eq!(json["type"], "accrual_settlement");
        assert_eq!(json["currency"], "token");
    }
}
