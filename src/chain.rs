//! Commission chain registry.
//!
//! Maintains the flattened ancestor list per user. Edges are derived once at
//! registration by copying the inviter's own ancestor list with level + 1
//! plus the direct edge at level 1, and are immutable afterwards: the first
//! inviter binding is permanent.

use crate::engine::LedgerEngine;
use crate::error::{Error, Result};
use crate::types::{CommissionEdge, UserId, MAX_REFERRAL_DEPTH};

/// Derives the full edge batch for binding `new_user` under `inviter`.
///
/// Produces the direct edge at level 1 plus one edge per inviter ancestor at
/// level + 1, capped at [`MAX_REFERRAL_DEPTH`]: an inviter ancestor already
/// at level 20 yields no level-21 edge.
///
/// # Example
///
/// ```rust
/// use farmledger_core::chain::derive_edges;
/// use farmledger_core::types::{CommissionEdge, UserId};
///
/// let inviter_ancestors = vec![CommissionEdge::new(UserId::new(2), UserId::new(1), 1)];
/// let edges = derive_edges(UserId::new(3), UserId::new(2), &inviter_ancestors);
/// assert_eq!(edges.len(), 2);
/// assert_eq!(edges[0].level, 1);
/// assert_eq!(edges[1].level, 2);
/// ```
#[must_use]
pub fn derive_edges(
    new_user: UserId,
    inviter: UserId,
    inviter_ancestors: &[CommissionEdge],
) -> Vec<CommissionEdge> {
    let mut edges = Vec::with_capacity(inviter_ancestors.len() + 1);
    edges.push(CommissionEdge::new(new_user, inviter, 1));
    for edge in inviter_ancestors {
        // new_user may itself sit in the inviter's chain (it invited someone
        // upstream before binding); copying that edge would create a
        // self-ancestor.
        if edge.level < MAX_REFERRAL_DEPTH && edge.ancestor != new_user {
            edges.push(CommissionEdge::new(new_user, edge.ancestor, edge.level + 1));
        }
    }
    edges
}

impl LedgerEngine {
    /// Binds `user` under the inviter owning `inviter_ref_code`.
    ///
    /// Returns `true` when the chain was created, `false` (silently, not an
    /// error) when `user` already has a chain: first-binding-wins,
    /// irreversible. Fails with `NotFound` if the code resolves to no
    /// account and `InvalidArgument` on self-referral.
    pub async fn bind_inviter(&self, user: UserId, inviter_ref_code: &str) -> Result<bool> {
        let inviter = self
            .store
            .resolve_ref_code(inviter_ref_code)
            .await?
            .ok_or_else(|| Error::not_found(format!("referral code {inviter_ref_code:?}")))?;
        self.bind_to(user, inviter).await
    }

    pub(crate) async fn bind_to(&self, user: UserId, inviter: UserId) -> Result<bool> {
        if inviter == user {
            return Err(Error::invalid_argument("self-referral is not allowed"));
        }
        if !self.store.ancestors(user).await?.is_empty() {
            tracing::debug!(user_id = %user, "inviter already bound, ignoring");
            return Ok(false);
        }

        let inviter_ancestors = self.store.ancestors(inviter).await?;
        let edges = derive_edges(user, inviter, &inviter_ancestors);
        // The store ignores per-edge conflicts, so a concurrent double
        // invocation cannot abort the whole batch; the loser simply inserts
        // nothing.
        let inserted = self.store.insert_edges(&edges).await?;

        tracing::info!(
            user_id = %user,
            inviter_id = %inviter,
            edges = inserted,
            "inviter chain bound"
        );
        Ok(inserted > 0)
    }

    /// The flattened ancestor list for `user`, ascending by level. Used by
    /// the distribution engine and exposed for collaborators.
    pub async fn ancestors(&self, user: UserId) -> Result<Vec<CommissionEdge>> {
        self.store.ancestors(user).await
    }
}
