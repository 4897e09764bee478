//! Commission-chain edge definitions.
//!
//! The referral chain is materialized as a closure table: at registration the
//! new user copies the inviter's whole ancestor list with level + 1, plus the
//! direct edge at level 1. Distribution then reads a flat, bounded list and
//! never walks a graph, so no recursion or cycle detection exists anywhere in
//! the engine.

use super::account::UserId;
use serde::{Deserialize, Serialize};

/// Maximum referral depth. An inviter already at this level produces no
/// deeper edge for their invitees.
pub const MAX_REFERRAL_DEPTH: u8 = 20;

/// Directed edge from a descendant to one of its ancestor inviters.
///
/// Unique per `(descendant, ancestor)`; write-once. The first inviter binding
/// is permanent, there is no re-parenting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CommissionEdge {
    /// The invited user.
    pub descendant: UserId,
    /// The inviter reachable `level` steps up the chain.
    pub ancestor: UserId,
    /// Distance from descendant to ancestor, 1..=20.
    pub level: u8,
}

impl CommissionEdge {
    /// Creates a new edge.
    pub fn new(descendant: UserId, ancestor: UserId, level: u8) -> Self {
        Self {
            descendant,
            ancestor,
            level,
        }
    }

    /// Returns `true` when the level is within 1..=[`MAX_REFERRAL_DEPTH`].
    #[must_use]
    pub fn is_valid(&self) -> bool {
        (1..=MAX_REFERRAL_DEPTH).contains(&self.level)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_bounds() {
        let ok = CommissionEdge::new(UserId::new(2), UserId::new(1), 1);
        assert!(ok.is_valid());
        let cap = CommissionEdge::new(UserId::new(2), UserId::new(1), MAX_REFERRAL_DEPTH);
        assert!(cap.is_valid());
        let zero = CommissionEdge::new(UserId::new(2), UserId::new(1), 0);
        assert!(!zero.is_valid());
        let deep = CommissionEdge::new(UserId::new(2), UserId::new(1), MAX_REFERRAL_DEPTH + 1);
        assert!(!deep.is_valid());
    }
}
