//! Continuous-accrual calculator and deposit settlement.
//!
//! Yield is `principal * rate_per_second * multiplier * elapsed_seconds`,
//! computed entirely in [`Decimal`] arithmetic. A deposit may be settled
//! millions of times over its lifetime; binary floating point would drift at
//! sub-cent per-tick amounts, so it never appears here.

use crate::engine::LedgerEngine;
use crate::error::{Error, Result};
use crate::types::{Currency, Deposit, DepositId, LedgerEntry};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Pure accrual math. No clock, no store: callers supply `now`.
pub struct AccrualCalculator;

impl AccrualCalculator {
    /// Elapsed interval in seconds as an exact decimal (millisecond
    /// resolution). Non-positive intervals clamp to zero; that is the
    /// engine's guard against clock skew and duplicate-trigger races.
    #[must_use]
    pub fn elapsed_seconds(last_settled_at_ms: i64, now_ms: i64) -> Decimal {
        let elapsed_ms = now_ms.saturating_sub(last_settled_at_ms);
        if elapsed_ms <= 0 {
            return Decimal::ZERO;
        }
        Decimal::from(elapsed_ms) / dec!(1000)
    }

    /// Yield owed for a deposit up to `now_ms`, with the live boost
    /// `multiplier` applied to the stored rate at read time. The stored rate
    /// is never mutated, so historical settlements stay auditable.
    #[must_use]
    pub fn accrued(deposit: &Deposit, multiplier: Decimal, now_ms: i64) -> Decimal {
        let elapsed = Self::elapsed_seconds(deposit.last_settled_at_ms, now_ms);
        if elapsed.is_zero() {
            return Decimal::ZERO;
        }
        deposit.principal * deposit.rate_per_second * multiplier * elapsed
    }
}

/// Result of a deposit settlement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settlement {
    /// Yield credited by this call. Zero for the elapsed-time no-op.
    pub settled_amount: Decimal,
    /// Owner's yield-currency balance after the credit.
    pub new_balance: Decimal,
}

impl LedgerEngine {
    /// Settles a deposit: credits the accrued yield to the owner, appends
    /// one accrual-settlement ledger entry and advances the deposit's
    /// last-settled timestamp, all in one store transaction.
    ///
    /// Fails with `NotFound` if the deposit does not exist and
    /// `InvalidState` if it is inactive. Zero elapsed time is a successful
    /// no-op, which makes the operation naturally idempotent and safe to
    /// retry after a transient store failure.
    pub async fn settle_deposit(&self, deposit_id: DepositId) -> Result<Settlement> {
        // Pre-transaction reads: owner for the live boost lookup plus a fast
        // path for the common error cases. The authoritative deposit row is
        // re-read inside the transaction.
        let deposit = self
            .store
            .deposit(deposit_id)
            .await?
            .ok_or_else(|| Error::not_found(format!("deposit {deposit_id}")))?;
        if !deposit.active {
            return Err(Error::invalid_state(format!(
                "deposit {deposit_id} is inactive"
            )));
        }
        let multiplier = self.store.rate_multiplier(deposit.owner).await?;
        let now_ms = self.clock.now_ms();

        let mut tx = self.store.begin().await?;
        let outcome: Result<Option<Settlement>> = async {
            let deposit = tx
                .deposit(deposit_id)
                .await?
                .ok_or_else(|| Error::not_found(format!("deposit {deposit_id}")))?;
            if !deposit.active {
                return Err(Error::invalid_state(format!(
                    "deposit {deposit_id} is inactive"
                )));
            }
            if now_ms <= deposit.last_settled_at_ms {
                // Clock skew or a duplicate trigger racing a concurrent
                // settlement; nothing to credit, nothing to advance.
                return Ok(None);
            }

            let amount = AccrualCalculator::accrued(&deposit, multiplier, now_ms);
            let new_balance = tx
                .credit_balance(deposit.owner, Currency::Token, amount)
                .await?;
            tx.append_entry(LedgerEntry::accrual(
                deposit.owner,
                Currency::Token,
                amount,
                now_ms,
            ))
            .await?;
            tx.mark_deposit_settled(deposit_id, now_ms).await?;

            Ok(Some(Settlement {
                settled_amount: amount,
                new_balance,
            }))
        }
        .await;

        match outcome {
            Ok(Some(settlement)) => {
                tx.commit().await?;
                tracing::info!(
                    deposit_id = %deposit_id,
                    user_id = %deposit.owner,
                    amount = %settlement.settled_amount,
                    "deposit settled"
                );
                Ok(settlement)
            }
            Ok(None) => {
                tx.rollback().await?;
                let balance = self
                    .store
                    .account(deposit.owner)
                    .await?
                    .map(|a| a.balance(Currency::Token))
                    .unwrap_or(Decimal::ZERO);
                Ok(Settlement {
                    settled_amount: Decimal::ZERO,
                    new_balance: balance,
                })
            }
            Err(e) => {
                let _ = tx.rollback().await;
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::UserId;

    fn deposit(principal: Decimal, rate: Decimal, settled_at_ms: i64) -> Deposit {
        let mut dep = Deposit::new(DepositId::new(1), UserId::new(1), principal, rate, 0);
        dep.last_settled_at_ms = settled_at_ms;
        dep
    }

    #[test]
    fn elapsed_is_decimal_seconds() {
        assert_eq!(AccrualCalculator::elapsed_seconds(0, 1500), dec!(1.5));
        assert_eq!(AccrualCalculator::elapsed_seconds(1000, 1001), dec!(0.001));
    }

    #[test]
    fn non_positive_elapsed_clamps_to_zero() {
        assert_eq!(AccrualCalculator::elapsed_seconds(1000, 1000), Decimal::ZERO);
        assert_eq!(AccrualCalculator::elapsed_seconds(2000, 1000), Decimal::ZERO);
    }

    #[test]
    fn accrued_is_principal_times_rate_times_elapsed() {
        let dep = deposit(dec!(1000), dec!(0.0001), 0);
        // 10 seconds at 0.01%/s on 1000 = 1.0
        assert_eq!(
            AccrualCalculator::accrued(&dep, Decimal::ONE, 10_000),
            dec!(1.00000)
        );
    }

    #[test]
    fn multiplier_scales_the_rate_at_read_time() {
        let dep = deposit(dec!(1000), dec!(0.0001), 0);
        let boosted = AccrualCalculator::accrued(&dep, dec!(2), 10_000);
        let plain = AccrualCalculator::accrued(&dep, Decimal::ONE, 10_000);
        assert_eq!(boosted, plain * dec!(2));
        // The stored rate is untouched.
        assert_eq!(dep.rate_per_second, dec!(0.0001));
    }

    #[test]
    fn tiny_rates_do_not_collapse_to_zero() {
        // ~1e-18 per second on one unit of principal.
        let dep = deposit(dec!(1), dec!(0.000000000000000001), 0);
        let amount = AccrualCalculator::accrued(&dep, Decimal::ONE, 1_000);
        assert!(amount > Decimal::ZERO);
    }
}
