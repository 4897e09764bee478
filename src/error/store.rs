//! Store-layer error details.

use thiserror::Error;

/// Errors reported by the ledger store.
///
/// The engine never retries internally; [`StoreError::is_transient`] tells
/// the caller whether reissuing the whole operation is safe.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum StoreError {
    /// The store is unreachable or the connection was lost.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// The store did not answer within the configured deadline.
    #[error("store timeout: {0}")]
    Timeout(String),

    /// The transaction was chosen as a deadlock or serialization victim.
    #[error("transaction deadlock: {0}")]
    Deadlock(String),

    /// A uniqueness or constraint conflict, e.g. a duplicate batch id.
    #[error("constraint conflict: {0}")]
    Conflict(String),

    /// The store returned data the engine cannot interpret.
    #[error("corrupted record: {0}")]
    Corrupted(String),
}

impl StoreError {
    /// Returns `true` when the failure is transient and the operation may be
    /// retried as a whole. Conflicts and corrupted records are not transient:
    /// retrying them verbatim reproduces the failure.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            StoreError::Unavailable(_) | StoreError::Timeout(_) | StoreError::Deadlock(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_classification() {
        assert!(StoreError::Unavailable("x".into()).is_transient());
        assert!(StoreError::Timeout("x".into()).is_transient());
        assert!(StoreError::Deadlock("x".into()).is_transient());
        assert!(!StoreError::Conflict("x".into()).is_transient());
        assert!(!StoreError::Corrupted("x".into()).is_transient());
    }

    #[test]
    fn display_includes_detail() {
        let err = StoreError::Conflict("duplicate batch id".into());
        assert!(err.to_string().contains("duplicate batch id"));
    }
}
