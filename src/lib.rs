//! Reward ledger engine for a yield-farming platform.
//!
//! Users deposit capital that continuously accrues yield; every unit of
//! yield triggers a cascading commission payout to up to 20 levels of
//! referring users. This crate is the ledger engine behind that product:
//!
//! - **Accrual calculator**: converts elapsed time and deposit principal
//!   into earned yield with [`rust_decimal::Decimal`] arithmetic.
//! - **Commission chain registry**: the flattened, immutable ancestor list
//!   per user (closure table, bounded at 20 levels).
//! - **Distribution engine**: atomically applies per-level commission
//!   credits with idempotent batch tracking.
//! - **Batch audit log**: append-only record of every distribution attempt.
//!
//! Transport layers (HTTP, bot), authentication and withdrawal UI are
//! external collaborators that call into [`engine::LedgerEngine`]. The
//! storage seam is the async [`store::LedgerStore`] trait; correctness under
//! concurrent triggers relies on its transaction contract, not on
//! application-level locks.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use farmledger_core::prelude::*;
//!
//! # async fn example() -> farmledger_core::error::Result<()> {
//! let engine = LedgerEngine::new(
//!     Arc::new(MemoryStore::new()),
//!     PolicyConfig::default(),
//!     Arc::new(SystemClock),
//! )?;
//!
//! let bound = engine.bind_inviter(UserId::new(2), "ref-1").await?;
//! let settlement = engine.settle_deposit(DepositId::new(1)).await?;
//! engine
//!     .distribute(UserId::new(2), settlement.settled_amount, Currency::Token)
//!     .await?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)]

// Re-exports of external dependencies
pub use rust_decimal;
pub use serde;
pub use serde_json;

pub mod accrual;
pub mod chain;
pub mod config;
pub mod distribution;
pub mod engine;
pub mod error;
pub mod logging;
pub mod registration;
pub mod store;
pub mod time;
pub mod types;

pub use accrual::{AccrualCalculator, Settlement};
pub use config::PolicyConfig;
pub use distribution::DistributionResult;
pub use engine::LedgerEngine;
pub use error::{ContextExt, Error, Result, StoreError};
pub use registration::RegistrationOutcome;
pub use store::{BatchOutcome, LedgerStore, MemoryStore, StoreTransaction};
pub use types::{
    Account, BatchId, BatchStatus, CommissionEdge, Currency, Deposit, DepositId,
    DistributionBatch, EntryStatus, LedgerEntry, LedgerEntryType, UserId, MAX_REFERRAL_DEPTH,
};

/// Prelude module for convenient imports.
///
/// ```rust
/// use farmledger_core::prelude::*;
/// ```
pub mod prelude {
    pub use crate::accrual::{AccrualCalculator, Settlement};
    pub use crate::chain::derive_edges;
    pub use crate::config::PolicyConfig;
    pub use crate::distribution::DistributionResult;
    pub use crate::engine::LedgerEngine;
    pub use crate::error::{ContextExt, Error, Result, StoreError};
    pub use crate::logging::{init_logging, try_init_logging, LogConfig, LogFormat, LogLevel};
    pub use crate::registration::RegistrationOutcome;
    pub use crate::store::{BatchOutcome, LedgerStore, MemoryStore, StoreTransaction};
    pub use crate::time::{Clock, ManualClock, SystemClock};
    pub use crate::types::{
        Account, BatchId, BatchStatus, CommissionEdge, Currency, Deposit, DepositId,
        DistributionBatch, EntryStatus, LedgerEntry, LedgerEntryType, UserId,
        MAX_REFERRAL_DEPTH,
    };
    pub use rust_decimal::Decimal;
    pub use serde::{Deserialize, Serialize};
}

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name.
pub const NAME: &str = env!("CARGO_PKG_NAME");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
        assert_eq!(NAME, "farmledger-core");
    }
}
