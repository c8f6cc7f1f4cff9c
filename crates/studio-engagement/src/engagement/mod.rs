//! Engagement domain: badge achievements and the referral reward lifecycle.

pub mod badges;
pub mod clients;
pub mod referrals;
