//! Error handling for the ledger engine.
//!
//! The taxonomy distinguishes four caller-visible classes:
//!
//! ```text
//! Error
//! ├── InvalidArgument - bad input, caller's fault, never retried
//! ├── InvalidState    - entity exists but is not eligible for the operation
//! ├── NotFound        - referenced entity absent
//! ├── Store           - transient store failure (via StoreError), retryable
//! └── Context         - error with additional context, preserving the chain
//! ```
//!
//! Data-integrity anomalies (e.g. a commission credit pointing at a missing
//! account) are deliberately *not* errors: the engine logs a warning and skips
//! the single credit instead of aborting the batch.
//!
//! # Example
//!
//! ```rust
//! use farmledger_core::error::{Error, Result};
//!
//! fn check_amount(amount: i64) -> Result<()> {
//!     if amount <= 0 {
//!         return Err(Error::invalid_argument("amount must be positive"));
//!     }
//!     Ok(())
//! }
//! ```

mod store;

use std::borrow::Cow;
use std::error::Error as StdError;
use thiserror::Error;

pub use store::StoreError;

/// Result type alias for all ledger operations.
pub type Result<T> = std::result::Result<T, Error>;

/// The primary error type for the ledger engine.
///
/// String payloads use `Cow<'static, str>` so static messages allocate
/// nothing; the `Store` variant is boxed to keep the enum small.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// Bad input from the caller. Not retried by the engine.
    #[error("Invalid argument: {0}")]
    InvalidArgument(Cow<'static, str>),

    /// The referenced entity exists but is not eligible for the operation,
    /// e.g. settling an inactive deposit or finishing a terminal batch.
    #[error("Invalid state: {0}")]
    InvalidState(Cow<'static, str>),

    /// A referenced entity is absent.
    #[error("Not found: {0}")]
    NotFound(Cow<'static, str>),

    /// Failure reported by the ledger store (connection loss, timeout,
    /// deadlock, conflict). The surrounding transaction is guaranteed rolled
    /// back when this surfaces; whether a retry is safe depends on
    /// [`StoreError::is_transient`].
    #[error("Store error: {0}")]
    Store(Box<StoreError>),

    /// Error with additional context, preserving the error chain.
    #[error("{context}")]
    Context {
        /// Context message describing what operation failed.
        context: String,
        /// The underlying error.
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Creates an invalid-argument error.
    /// Accepts both `&'static str` (zero allocation) and `String`.
    pub fn invalid_argument(msg: impl Into<Cow<'static, str>>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    /// Creates an invalid-state error.
    pub fn invalid_state(msg: impl Into<Cow<'static, str>>) -> Self {
        Self::InvalidState(msg.into())
    }

    /// Creates a not-found error.
    pub fn not_found(msg: impl Into<Cow<'static, str>>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Creates a store error from a [`StoreError`].
    pub fn store(err: StoreError) -> Self {
        Self::Store(Box::new(err))
    }

    /// Attaches context to an existing error.
    ///
    /// # Example
    ///
    /// ```rust
    /// use farmledger_core::error::Error;
    ///
    /// let err = Error::not_found("deposit 42")
    ///     .context("failed to settle deposit");
    /// assert!(err.to_string().contains("failed to settle"));
    /// ```
    #[must_use]
    pub fn context(self, context: impl Into<String>) -> Self {
        Self::Context {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Internal helper: iterator over the error chain, penetrating Context
    /// layers.
    fn iter_chain(&self) -> impl Iterator<Item = &Error> {
        std::iter::successors(Some(self), |err| match err {
            Error::Context { source, .. } => Some(source.as_ref()),
            _ => None,
        })
    }

    /// Returns the root cause of the error, skipping Context layers.
    #[must_use]
    pub fn root_cause(&self) -> &Error {
        self.iter_chain().last().unwrap_or(self)
    }

    /// Checks whether retrying the whole operation is safe (penetrates
    /// Context layers).
    ///
    /// Only transient store failures are retryable: `distribute` is
    /// idempotent at the batch-id level and `settle_deposit` is naturally
    /// idempotent thanks to the elapsed-time no-op guard, so the caller may
    /// reissue the call after a transient failure without double-crediting.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self.root_cause() {
            Error::Store(e) => e.is_transient(),
            _ => false,
        }
    }

    /// Checks if this is a not-found error (penetrates Context layers).
    /// Returns the message.
    #[must_use]
    pub fn as_not_found(&self) -> Option<&str> {
        match self.root_cause() {
            Error::NotFound(msg) => Some(msg.as_ref()),
            _ => None,
        }
    }

    /// Checks if this is an invalid-state error (penetrates Context layers).
    #[must_use]
    pub fn as_invalid_state(&self) -> Option<&str> {
        match self.root_cause() {
            Error::InvalidState(msg) => Some(msg.as_ref()),
            _ => None,
        }
    }

    /// Generates a detailed report with the full error chain.
    #[must_use]
    pub fn report(&self) -> String {
        use std::fmt::Write;
        let mut report = String::new();
        report.push_str(&self.to_string());

        let mut current: Option<&(dyn StdError + 'static)> = self.source();
        while let Some(err) = current {
            let _ = write!(report, "\nCaused by: {err}");
            current = err.source();
        }
        report
    }
}

impl From<StoreError> for Error {
    fn from(err: StoreError) -> Self {
        Self::Store(Box::new(err))
    }
}

/// Extension trait for attaching context to `Result` values.
///
/// # Example
///
/// ```rust
/// use farmledger_core::error::{ContextExt, Error, Result};
///
/// fn lookup() -> Result<()> {
///     Err(Error::not_found("account 7"))
/// }
///
/// let err = lookup().context("resolving inviter").unwrap_err();
/// assert!(err.to_string().contains("resolving inviter"));
/// ```
pub trait ContextExt<T> {
    /// Attaches a static context message.
    fn context(self, context: impl Into<String>) -> Result<T>;

    /// Attaches a lazily-evaluated context message.
    fn with_context<F, S>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> S,
        S: Into<String>;
}

impl<T> ContextExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.context(context))
    }

    fn with_context<F, S>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> S,
        S: Into<String>,
    {
        self.map_err(|e| e.context(f()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructors_produce_expected_variants() {
        assert!(matches!(
            Error::invalid_argument("x"),
            Error::InvalidArgument(_)
        ));
        assert!(matches!(Error::invalid_state("x"), Error::InvalidState(_)));
        assert!(matches!(Error::not_found("x"), Error::NotFound(_)));
        assert!(matches!(
            Error::store(StoreError::Timeout("t".into())),
            Error::Store(_)
        ));
    }

    #[test]
    fn context_preserves_root_cause() {
        let err = Error::not_found("deposit 42")
            .context("settling")
            .context("farming tick");
        assert_eq!(err.as_not_found(), Some("deposit 42"));
        assert!(matches!(err.root_cause(), Error::NotFound(_)));
    }

    #[test]
    fn only_transient_store_errors_are_retryable() {
        assert!(Error::store(StoreError::Timeout("t".into())).is_retryable());
        assert!(Error::store(StoreError::Deadlock("d".into())).is_retryable());
        assert!(!Error::store(StoreError::Conflict("dup".into())).is_retryable());
        assert!(!Error::invalid_argument("x").is_retryable());
        assert!(!Error::not_found("x").is_retryable());
    }

    #[test]
    fn retryable_penetrates_context() {
        let err = Error::store(StoreError::Unavailable("down".into())).context("distributing");
        assert!(err.is_retryable());
    }

    #[test]
    fn report_includes_chain() {
        let err = Error::store(StoreError::Timeout("lock wait".into())).context("crediting");
        let report = err.report();
        assert!(report.contains("crediting"));
        assert!(report.contains("lock wait"));
    }

    #[test]
    fn result_context_ext() {
        let res: Result<()> = Err(Error::not_found("account"));
        let err = res.with_context(|| format!("binding user {}", 9)).unwrap_err();
        assert!(err.to_string().contains("binding user 9"));
        assert_eq!(err.as_not_found(), Some("account"));
    }
}
