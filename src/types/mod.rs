//! Core data-model types for the ledger engine.
//!
//! All monetary values are [`rust_decimal::Decimal`]; binary floating point
//! never touches a balance.

pub mod account;
pub mod batch;
pub mod deposit;
pub mod edge;
pub mod ledger;

pub use account::{Account, Currency, UserId};
pub use batch::{BatchId, BatchStatus, DistributionBatch};
pub use deposit::{Deposit, DepositId};
pub use edge::{CommissionEdge, MAX_REFERRAL_DEPTH};
pub use ledger::{EntryStatus, LedgerEntry, LedgerEntryType};
