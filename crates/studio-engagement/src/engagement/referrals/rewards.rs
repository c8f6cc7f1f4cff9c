use std::sync::Arc;

use chrono::Utc;
use tracing::info;

use super::domain::{RewardKind, RewardSpec};
use crate::engagement::clients::{ClientDirectory, ClientId, CreditNote, StoreError};

/// Applies a single reward to a client, dispatched on the reward kind.
///
/// Deliberately NOT idempotent: calling it twice double-applies. The
/// referral state machine owns idempotency through its per-side
/// applied-flags.
pub struct RewardApplicator<C> {
    clients: Arc<C>,
}

impl<C> RewardApplicator<C>
where
    C: ClientDirectory + 'static,
{
    pub fn new(clients: Arc<C>) -> Self {
        Self { clients }
    }

    pub fn apply(&self, client: &ClientId, reward: &RewardSpec) -> Result<(), RewardError> {
        match reward.kind {
            RewardKind::Credits => {
                self.clients.add_credits(client, reward.value)?;
                info!(client = %client.0, credits = reward.value, "credit reward applied");
            }
            RewardKind::Discount => {
                self.clients.issue_credit_note(CreditNote {
                    client_id: client.clone(),
                    percent: reward.value,
                    description: reward.description.clone(),
                    issued_at: Utc::now(),
                    redeemed: false,
                })?;
                info!(client = %client.0, percent = reward.value, "discount credit note issued");
            }
            RewardKind::Cash => {
                // No ledger write; staff pays out manually from the log.
                info!(
                    client = %client.0,
                    amount = reward.value,
                    "cash reward recorded for manual payout"
                );
            }
        }

        Ok(())
    }
}

/// Error raised while applying a reward.
#[derive(Debug, thiserror::Error)]
pub enum RewardError {
    #[error(transparent)]
    Store(#[from] StoreError),
}
