//! Registration-bonus trigger.
//!
//! Thin adapter over the chain registry and the distribution engine: the
//! only external entry point that creates new chain edges. Registration
//! itself (account creation, session, transport) belongs to collaborators;
//! this module covers the state machine step "registration → chain bound →
//! eligible for future distributions".

use crate::engine::LedgerEngine;
use crate::error::Result;
use crate::types::{BatchId, Currency, UserId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// What the registration trigger did.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistrationOutcome {
    /// Whether a new inviter chain was created.
    pub bound: bool,
    /// Batch distributing the flat signup bonus, when one was configured
    /// and the bind succeeded.
    pub bonus_batch: Option<BatchId>,
}

impl LedgerEngine {
    /// Handles a new-user registration that may carry a referral code.
    ///
    /// Without a code this is a no-op. With one, the code is resolved and
    /// the chain bound (first-binding-wins); if the bind created a chain and
    /// the policy configures a non-zero signup bonus, the bonus is
    /// distributed up the fresh chain like any other earning event.
    pub async fn register_with_referral(
        &self,
        new_user: UserId,
        ref_code: Option<&str>,
    ) -> Result<RegistrationOutcome> {
        let Some(code) = ref_code else {
            return Ok(RegistrationOutcome {
                bound: false,
                bonus_batch: None,
            });
        };

        let bound = self.bind_inviter(new_user, code).await?;
        let mut bonus_batch = None;
        if bound && self.policy.signup_bonus > Decimal::ZERO {
            let result = self
                .distribute(new_user, self.policy.signup_bonus, Currency::Token)
                .await?;
            bonus_batch = Some(result.batch_id);
        }

        Ok(RegistrationOutcome { bound, bonus_batch })
    }
}
