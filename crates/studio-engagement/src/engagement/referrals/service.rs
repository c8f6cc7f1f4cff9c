use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use tracing::info;

use super::domain::{
    AppliedRewards, NewReferral, QualificationEvent, ReferralId, ReferralRecord,
    ReferralSettings, ReferralSettingsPatch, ReferralStats, ReferralStatus, TopReferrer,
};
use super::repository::{default_settings, ReferralRepository};
use super::rewards::{RewardApplicator, RewardError};
use crate::engagement::clients::{ClientDirectory, ClientId, StoreError, TenantId};

const TOP_REFERRER_LIMIT: usize = 5;

/// Service driving referral records through the forward-only lifecycle and
/// applying snapshotted rewards exactly once per side.
pub struct ReferralService<R, C> {
    referrals: Arc<R>,
    applicator: RewardApplicator<C>,
}

impl<R, C> ReferralService<R, C>
where
    R: ReferralRepository + 'static,
    C: ClientDirectory + 'static,
{
    pub fn new(referrals: Arc<R>, clients: Arc<C>) -> Self {
        Self {
            referrals,
            applicator: RewardApplicator::new(clients),
        }
    }

    /// Tenant settings, creating the default row on first use.
    pub fn get_settings(
        &self,
        tenant: &TenantId,
    ) -> Result<ReferralSettings, ReferralServiceError> {
        if let Some(settings) = self.referrals.settings(tenant)? {
            return Ok(settings);
        }

        let settings = default_settings(tenant);
        self.referrals.store_settings(settings.clone())?;
        Ok(settings)
    }

    /// Patch tenant settings. Affects future qualifications only; rewards
    /// already snapshotted onto qualified referrals are untouched.
    pub fn update_settings(
        &self,
        tenant: &TenantId,
        patch: ReferralSettingsPatch,
    ) -> Result<ReferralSettings, ReferralServiceError> {
        let mut settings = self.get_settings(tenant)?;

        if let Some(reward) = patch.referrer_reward {
            settings.referrer_reward = reward;
        }
        if let Some(reward) = patch.referred_reward {
            settings.referred_reward = reward;
        }
        if let Some(criteria) = patch.qualification_criteria {
            settings.qualification_criteria = criteria;
        }

        self.referrals.store_settings(settings.clone())?;
        Ok(settings)
    }

    /// Create a `pending` referral when a referral code is used.
    pub fn open_referral(
        &self,
        tenant: &TenantId,
        referrer: &ClientId,
    ) -> Result<ReferralRecord, ReferralServiceError> {
        Ok(self.referrals.create(NewReferral {
            tenant_id: tenant.clone(),
            referrer_id: referrer.clone(),
        })?)
    }

    /// Attach the referred client once they signed up. Valid only from
    /// `pending`.
    pub fn mark_signed_up(
        &self,
        id: &ReferralId,
        referred: &ClientId,
    ) -> Result<(), ReferralServiceError> {
        let mut record = self.fetch(id)?;

        if record.status != ReferralStatus::Pending {
            return Err(ReferralServiceError::InvalidTransition {
                from: record.status,
                attempted: "signed_up",
            });
        }

        record.referred_id = Some(referred.clone());
        record.signed_up_at = Some(Utc::now());
        record.status = ReferralStatus::SignedUp;
        self.referrals.update(record)?;
        Ok(())
    }

    /// Qualify a signed-up referral when the event matches the tenant's
    /// configured criteria. Snapshots the current reward settings onto the
    /// record so later settings edits cannot retroactively change it.
    /// Returns `false` without touching the record on a state or event
    /// mismatch.
    pub fn check_and_qualify(
        &self,
        id: &ReferralId,
        event: QualificationEvent,
    ) -> Result<bool, ReferralServiceError> {
        let mut record = self.fetch(id)?;

        if record.status != ReferralStatus::SignedUp {
            return Ok(false);
        }

        let settings = self.get_settings(&record.tenant_id)?;
        if event != settings.qualification_criteria {
            return Ok(false);
        }

        record.referrer_reward = Some(settings.referrer_reward);
        record.referred_reward = Some(settings.referred_reward);
        record.qualified_at = Some(Utc::now());
        record.status = ReferralStatus::Qualified;
        self.referrals.update(record)?;

        info!(referral = %id.0, ?event, "referral qualified");
        Ok(true)
    }

    /// Apply the snapshotted rewards of a `qualified` referral.
    ///
    /// Each side is guarded by its own applied-flag and persisted
    /// immediately after it is applied, so a retry after partial failure
    /// only applies the remaining side. A missing referred client does not
    /// block the referrer's reward. Status moves to `rewarded`
    /// unconditionally once both sides were evaluated.
    pub fn apply_rewards(
        &self,
        id: &ReferralId,
    ) -> Result<AppliedRewards, ReferralServiceError> {
        let mut record = self.fetch(id)?;

        if record.status != ReferralStatus::Qualified {
            return Err(ReferralServiceError::NotQualified {
                status: record.status,
            });
        }

        let mut applied = AppliedRewards::default();

        if !record.referrer_reward_applied {
            if let Some(reward) = record.referrer_reward.clone() {
                self.applicator.apply(&record.referrer_id, &reward)?;
                applied.referrer_reward = Some(reward);
            }
            record.referrer_reward_applied = true;
            self.referrals.update(record.clone())?;
        }

        if let Some(referred) = record.referred_id.clone() {
            if !record.referred_reward_applied {
                if let Some(reward) = record.referred_reward.clone() {
                    self.applicator.apply(&referred, &reward)?;
                    applied.referred_reward = Some(reward);
                }
                record.referred_reward_applied = true;
                self.referrals.update(record.clone())?;
            }
        }

        record.rewarded_at = Some(Utc::now());
        record.status = ReferralStatus::Rewarded;
        self.referrals.update(record)?;

        info!(referral = %id.0, "referral rewards applied");
        Ok(applied)
    }

    /// Program statistics for a tenant, including a small leaderboard of
    /// referrers ranked by converted referrals.
    pub fn stats(&self, tenant: &TenantId) -> Result<ReferralStats, ReferralServiceError> {
        let records = self.referrals.for_tenant(tenant)?;
        let mut stats = ReferralStats {
            total: records.len() as u32,
            ..ReferralStats::default()
        };

        let mut per_referrer: BTreeMap<ClientId, (u32, u32)> = BTreeMap::new();
        for record in &records {
            let converted = matches!(
                record.status,
                ReferralStatus::Qualified | ReferralStatus::Rewarded
            );
            match record.status {
                ReferralStatus::Pending => stats.pending += 1,
                ReferralStatus::SignedUp => stats.signed_up += 1,
                ReferralStatus::Qualified => stats.qualified += 1,
                ReferralStatus::Rewarded => stats.rewarded += 1,
            }

            let entry = per_referrer.entry(record.referrer_id.clone()).or_default();
            entry.0 += 1;
            if converted {
                entry.1 += 1;
            }
        }

        if stats.total > 0 {
            stats.conversion_rate =
                f64::from(stats.qualified + stats.rewarded) / f64::from(stats.total);
        }

        let mut leaderboard: Vec<TopReferrer> = per_referrer
            .into_iter()
            .map(|(referrer_id, (total, converted))| TopReferrer {
                referrer_id,
                total,
                converted,
            })
            .collect();
        leaderboard.sort_by(|a, b| {
            b.converted
                .cmp(&a.converted)
                .then(b.total.cmp(&a.total))
                .then(a.referrer_id.cmp(&b.referrer_id))
        });
        leaderboard.truncate(TOP_REFERRER_LIMIT);
        stats.top_referrers = leaderboard;

        Ok(stats)
    }

    fn fetch(&self, id: &ReferralId) -> Result<ReferralRecord, ReferralServiceError> {
        self.referrals
            .fetch(id)?
            .ok_or_else(|| ReferralServiceError::NotFound(id.clone()))
    }
}

/// Error raised by the referral service.
#[derive(Debug, thiserror::Error)]
pub enum ReferralServiceError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Reward(#[from] RewardError),
    #[error("referral '{}' not found", .0 .0)]
    NotFound(ReferralId),
    #[error("cannot move referral from '{}' to '{attempted}'", from.label())]
    InvalidTransition {
        from: ReferralStatus,
        attempted: &'static str,
    },
    #[error("rewards require a qualified referral, current status is '{}'", status.label())]
    NotQualified { status: ReferralStatus },
}
