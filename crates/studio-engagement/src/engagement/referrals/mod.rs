//! Referral lifecycle: pending → signed_up → qualified → rewarded, with
//! reward snapshots taken at qualification and per-side applied-flags
//! guarding reward application.

pub mod domain;
pub mod repository;
pub mod rewards;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use domain::{
    AppliedRewards, NewReferral, QualificationEvent, ReferralId, ReferralRecord,
    ReferralSettings, ReferralSettingsPatch, ReferralStats, ReferralStatus, RewardKind,
    RewardSpec, TopReferrer,
};
pub use repository::ReferralRepository;
pub use rewards::{RewardApplicator, RewardError};
pub use router::referral_router;
pub use service::{ReferralService, ReferralServiceError};
