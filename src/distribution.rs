//! Commission distribution engine.
//!
//! One earning event in, one audited batch out. All credits for a batch
//! commit together or not at all; the pending batch row is written before
//! the transaction so even a crash mid-flight leaves an auditable record.

use crate::engine::LedgerEngine;
use crate::error::{Error, Result};
use crate::store::BatchOutcome;
use crate::types::{BatchId, Currency, DistributionBatch, LedgerEntry, UserId};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Result of a distribution call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistributionResult {
    /// Audit batch written for this earning event.
    pub batch_id: BatchId,
    /// Sum of all commission credits applied.
    pub total_distributed: Decimal,
    /// Number of levels actually credited.
    pub levels_processed: u32,
}

impl LedgerEngine {
    /// Distributes commission for one earning event to the source user's
    /// ancestor chain.
    ///
    /// Ancestors are processed in ascending level order; level L receives
    /// `earned_amount * percent[L] / 100`. A bonus below the per-currency
    /// dust threshold is omitted without aborting the batch, and a missing
    /// ancestor account is logged as a data-integrity warning and skipped.
    /// Everything else is all-or-nothing: any failure rolls the transaction
    /// back in full and marks the batch `Failed`.
    ///
    /// Fails with `InvalidArgument` for a non-positive amount. "No ancestors"
    /// is not an error; the batch completes with zero distribution, as does
    /// an earning amount below the minimum-distribution threshold.
    pub async fn distribute(
        &self,
        source_user: UserId,
        earned_amount: Decimal,
        currency: Currency,
    ) -> Result<DistributionResult> {
        if earned_amount <= Decimal::ZERO {
            return Err(Error::invalid_argument(format!(
                "earned amount must be positive, got {earned_amount}"
            )));
        }

        let batch_id = BatchId::new();
        let now_ms = self.clock.now_ms();
        let batch =
            DistributionBatch::pending(batch_id, source_user, earned_amount, currency, now_ms);
        self.store.insert_batch(&batch).await?;

        // Near-zero accruals are common; dropping them here keeps dust out
        // of the ledger.
        if earned_amount < self.policy.min_distribution {
            return self
                .complete(batch_id, source_user, 0, 0, Decimal::ZERO)
                .await;
        }

        // Edges are write-once, so this pre-transaction read observes the
        // same chain the transaction would.
        let ancestors = self.store.ancestors(source_user).await?;
        let ancestor_count = ancestors.len() as u32;
        let dust_threshold = self.policy.dust_threshold(currency);

        let mut tx = self.store.begin().await?;
        let mut total_distributed = Decimal::ZERO;
        let mut levels_processed = 0u32;

        let outcome: Result<()> = async {
            for edge in &ancestors {
                let percent = self.policy.percent_for_level(edge.level);
                let bonus = earned_amount * percent / dec!(100);
                if bonus.is_zero() || bonus < dust_threshold {
                    tracing::trace!(
                        batch_id = %batch_id,
                        level = edge.level,
                        bonus = %bonus,
                        "dust bonus skipped"
                    );
                    continue;
                }

                match tx.credit_balance(edge.ancestor, currency, bonus).await {
                    Ok(_) => {}
                    Err(e) if e.as_not_found().is_some() => {
                        // Data-integrity anomaly, not a transactional
                        // failure: skip this one credit, keep the batch.
                        tracing::warn!(
                            batch_id = %batch_id,
                            ancestor_id = %edge.ancestor,
                            level = edge.level,
                            "ancestor account missing, credit skipped"
                        );
                        continue;
                    }
                    Err(e) => return Err(e),
                }

                tx.append_entry(LedgerEntry::commission(
                    edge.ancestor,
                    currency,
                    bonus,
                    source_user,
                    batch_id,
                    edge.level,
                    percent,
                    now_ms,
                ))
                .await?;
                total_distributed += bonus;
                levels_processed += 1;
            }
            Ok(())
        }
        .await;

        match outcome {
            Ok(()) => match tx.commit().await {
                Ok(()) => {
                    self.complete(
                        batch_id,
                        source_user,
                        levels_processed,
                        ancestor_count,
                        total_distributed,
                    )
                    .await
                }
                Err(e) => self.fail(batch_id, e).await,
            },
            Err(e) => {
                let _ = tx.rollback().await;
                self.fail(batch_id, e).await
            }
        }
    }

    async fn complete(
        &self,
        batch_id: BatchId,
        source_user: UserId,
        levels_processed: u32,
        ancestor_count: u32,
        total_distributed: Decimal,
    ) -> Result<DistributionResult> {
        self.store
            .finish_batch(
                batch_id,
                BatchOutcome::Completed {
                    levels_processed,
                    ancestor_count,
                    total_distributed,
                },
                self.clock.now_ms(),
            )
            .await?;
        tracing::info!(
            batch_id = %batch_id,
            user_id = %source_user,
            levels = levels_processed,
            total = %total_distributed,
            "distribution completed"
        );
        Ok(DistributionResult {
            batch_id,
            total_distributed,
            levels_processed,
        })
    }

    async fn fail(&self, batch_id: BatchId, error: Error) -> Result<DistributionResult> {
        tracing::error!(batch_id = %batch_id, error = %error, "distribution failed");
        let finish = self
            .store
            .finish_batch(
                batch_id,
                BatchOutcome::Failed {
                    error: error.to_string(),
                },
                self.clock.now_ms(),
            )
            .await;
        if let Err(finish_err) = finish {
            tracing::error!(
                batch_id = %batch_id,
                error = %finish_err,
                "could not mark batch failed; row stays pending for the sweep"
            );
        }
        Err(error.context(format!("distribution batch {batch_id} rolled back")))
    }
}
