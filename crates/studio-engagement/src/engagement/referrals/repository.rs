use super::domain::{
    NewReferral, QualificationEvent, ReferralId, ReferralRecord, ReferralSettings, RewardKind,
    RewardSpec,
};
use crate::engagement::clients::{StoreError, TenantId};

/// Storage abstraction for referral records and per-tenant program settings.
pub trait ReferralRepository: Send + Sync {
    /// Persist a fresh `pending` record and return it with its assigned id.
    /// The store mints the `ReferralId`; a durable adapter keeps its
    /// sequence alive across restarts.
    fn create(&self, draft: NewReferral) -> Result<ReferralRecord, StoreError>;
    fn fetch(&self, id: &ReferralId) -> Result<Option<ReferralRecord>, StoreError>;
    fn update(&self, record: ReferralRecord) -> Result<(), StoreError>;
    fn for_tenant(&self, tenant: &TenantId) -> Result<Vec<ReferralRecord>, StoreError>;

    fn settings(&self, tenant: &TenantId) -> Result<Option<ReferralSettings>, StoreError>;
    fn store_settings(&self, settings: ReferralSettings) -> Result<(), StoreError>;
}

/// Program defaults written on first use: one free credit for the referrer,
/// a 10% discount for the referred client, qualification on first session.
pub fn default_settings(tenant: &TenantId) -> ReferralSettings {
    ReferralSettings {
        tenant_id: tenant.clone(),
        referrer_reward: RewardSpec::new(RewardKind::Credits, 1, "1 kredit zdarma"),
        referred_reward: RewardSpec::new(RewardKind::Discount, 10, "Sleva 10 % na další nákup"),
        qualification_criteria: QualificationEvent::FirstSession,
    }
}
