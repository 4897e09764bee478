//! Engine policy configuration.
//!
//! Loaded once at process start by the policy/config collaborator and treated
//! as constants by the engine for the duration of a run. The engine receives
//! the struct through its constructor; there is no module-level state.

use crate::error::{Error, Result};
use crate::types::{Currency, MAX_REFERRAL_DEPTH};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Commission and threshold policy for the ledger engine.
///
/// # Example
///
/// ```rust
/// use farmledger_core::config::PolicyConfig;
/// use rust_decimal_macros::dec;
///
/// let policy = PolicyConfig::default()
///     .with_level_percents(vec![dec!(100), dec!(2), dec!(3)])
///     .with_min_distribution(dec!(0.0001));
/// assert_eq!(policy.percent_for_level(2), dec!(2));
/// assert_eq!(policy.percent_for_level(4), dec!(0));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct PolicyConfig {
    /// Commission percentage per referral level, index 0 = level 1. Levels
    /// beyond the table earn nothing. At most [`MAX_REFERRAL_DEPTH`] entries.
    pub level_percents: Vec<Decimal>,
    /// Earning amounts strictly below this short-circuit to a completed batch
    /// with zero distribution. May be zero.
    pub min_distribution: Decimal,
    /// Per-credit dust threshold for the yield currency: a level bonus below
    /// it is omitted without aborting the batch.
    pub dust_threshold_token: Decimal,
    /// Per-credit dust threshold for the settlement currency.
    pub dust_threshold_usdt: Decimal,
    /// Flat bonus distributed when a referred user registers. Zero disables
    /// the registration-bonus trigger.
    pub signup_bonus: Decimal,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            // Level 1 full-rate, strictly decreasing below it.
            level_percents: vec![
                dec!(100),
                dec!(10),
                dec!(5),
                dec!(4),
                dec!(3),
                dec!(2.5),
                dec!(2),
                dec!(1.5),
                dec!(1.2),
                dec!(1),
                dec!(0.9),
                dec!(0.8),
                dec!(0.7),
                dec!(0.6),
                dec!(0.5),
                dec!(0.4),
                dec!(0.3),
                dec!(0.2),
                dec!(0.15),
                dec!(0.1),
            ],
            min_distribution: dec!(0.00000001),
            dust_threshold_token: dec!(0.00000001),
            dust_threshold_usdt: dec!(0.000001),
            signup_bonus: Decimal::ZERO,
        }
    }
}

impl PolicyConfig {
    /// Replaces the per-level percentage table.
    #[must_use]
    pub fn with_level_percents(mut self, percents: Vec<Decimal>) -> Self {
        self.level_percents = percents;
        self
    }

    /// Sets the minimum earning amount worth distributing.
    #[must_use]
    pub fn with_min_distribution(mut self, threshold: Decimal) -> Self {
        self.min_distribution = threshold;
        self
    }

    /// Sets the per-credit dust threshold for `currency`.
    #[must_use]
    pub fn with_dust_threshold(mut self, currency: Currency, threshold: Decimal) -> Self {
        match currency {
            Currency::Token => self.dust_threshold_token = threshold,
            Currency::Usdt => self.dust_threshold_usdt = threshold,
        }
        self
    }

    /// Sets the flat registration bonus.
    #[must_use]
    pub fn with_signup_bonus(mut self, bonus: Decimal) -> Self {
        self.signup_bonus = bonus;
        self
    }

    /// Commission percentage for a 1-indexed referral level; zero beyond the
    /// configured table.
    #[must_use]
    pub fn percent_for_level(&self, level: u8) -> Decimal {
        if level == 0 {
            return Decimal::ZERO;
        }
        self.level_percents
            .get(usize::from(level) - 1)
            .copied()
            .unwrap_or(Decimal::ZERO)
    }

    /// Per-credit dust threshold for `currency`.
    #[must_use]
    pub fn dust_threshold(&self, currency: Currency) -> Decimal {
        match currency {
            Currency::Token => self.dust_threshold_token,
            Currency::Usdt => self.dust_threshold_usdt,
        }
    }

    /// Validates the policy. Called by the engine constructor so a bad table
    /// is rejected at wiring time rather than mid-distribution.
    pub fn validate(&self) -> Result<()> {
        if self.level_percents.len() > usize::from(MAX_REFERRAL_DEPTH) {
            return Err(Error::invalid_argument(format!(
                "percentage table has {} levels, maximum is {}",
                self.level_percents.len(),
                MAX_REFERRAL_DEPTH
            )));
        }
        for (i, p) in self.level_percents.iter().enumerate() {
            if *p < Decimal::ZERO || *p > dec!(100) {
                return Err(Error::invalid_argument(format!(
                    "level {} percentage {} outside [0, 100]",
                    i + 1,
                    p
                )));
            }
        }
        if self.min_distribution < Decimal::ZERO
            || self.dust_threshold_token < Decimal::ZERO
            || self.dust_threshold_usdt < Decimal::ZERO
            || self.signup_bonus < Decimal::ZERO
        {
            return Err(Error::invalid_argument(
                "thresholds and bonuses must be non-negative",
            ));
        }
        Ok(())
    }
}
