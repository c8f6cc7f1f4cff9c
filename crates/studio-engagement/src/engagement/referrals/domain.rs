use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::engagement::clients::{ClientId, TenantId};

/// Identifier wrapper for a tracked referral.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReferralId(pub String);

/// Lifecycle states of a referral, monotonically forward-only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferralStatus {
    Pending,
    SignedUp,
    Qualified,
    Rewarded,
}

impl ReferralStatus {
    pub const fn label(self) -> &'static str {
        match self {
            ReferralStatus::Pending => "pending",
            ReferralStatus::SignedUp => "signed_up",
            ReferralStatus::Qualified => "qualified",
            ReferralStatus::Rewarded => "rewarded",
        }
    }
}

/// Event that can move a signed-up referral to `qualified`. Covers the full
/// `qualification_criteria` domain so a signup-qualified tenant flows
/// through the same path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualificationEvent {
    Signup,
    FirstSession,
    FirstPayment,
}

/// What a reward grants when applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RewardKind {
    Credits,
    Discount,
    Cash,
}

pub const REWARD_SCHEMA_VERSION: u8 = 1;

fn reward_schema_version() -> u8 {
    REWARD_SCHEMA_VERSION
}

/// Versioned reward description. Snapshotted onto the referral at
/// qualification time; later settings edits never touch the snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RewardSpec {
    #[serde(default = "reward_schema_version")]
    pub schema_version: u8,
    #[serde(rename = "type")]
    pub kind: RewardKind,
    pub value: u32,
    pub description: String,
}

impl RewardSpec {
    pub fn new(kind: RewardKind, value: u32, description: impl Into<String>) -> Self {
        Self {
            schema_version: REWARD_SCHEMA_VERSION,
            kind,
            value,
            description: description.into(),
        }
    }
}

/// Referral fields known before the store has assigned an id.
#[derive(Debug, Clone, PartialEq)]
pub struct NewReferral {
    pub tenant_id: TenantId,
    pub referrer_id: ClientId,
}

/// A tracked introduction of a new client by an existing one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferralRecord {
    pub id: ReferralId,
    pub tenant_id: TenantId,
    pub referrer_id: ClientId,
    pub referred_id: Option<ClientId>,
    pub status: ReferralStatus,
    pub created_at: DateTime<Utc>,
    pub signed_up_at: Option<DateTime<Utc>>,
    pub qualified_at: Option<DateTime<Utc>>,
    pub rewarded_at: Option<DateTime<Utc>>,
    pub referrer_reward: Option<RewardSpec>,
    pub referred_reward: Option<RewardSpec>,
    pub referrer_reward_applied: bool,
    pub referred_reward_applied: bool,
}

impl ReferralRecord {
    /// Fresh `pending` record, created when a referral code is used.
    pub fn open(id: ReferralId, tenant_id: TenantId, referrer_id: ClientId) -> Self {
        Self {
            id,
            tenant_id,
            referrer_id,
            referred_id: None,
            status: ReferralStatus::Pending,
            created_at: Utc::now(),
            signed_up_at: None,
            qualified_at: None,
            rewarded_at: None,
            referrer_reward: None,
            referred_reward: None,
            referrer_reward_applied: false,
            referred_reward_applied: false,
        }
    }
}

/// Per-tenant referral program configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferralSettings {
    pub tenant_id: TenantId,
    pub referrer_reward: RewardSpec,
    pub referred_reward: RewardSpec,
    pub qualification_criteria: QualificationEvent,
}

/// Partial update applied to a tenant's referral settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReferralSettingsPatch {
    pub referrer_reward: Option<RewardSpec>,
    pub referred_reward: Option<RewardSpec>,
    pub qualification_criteria: Option<QualificationEvent>,
}

/// Rewards actually applied (or found already applied) by a successful
/// `apply_rewards` call.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AppliedRewards {
    pub referrer_reward: Option<RewardSpec>,
    pub referred_reward: Option<RewardSpec>,
}

/// Aggregate program statistics for a tenant.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ReferralStats {
    pub total: u32,
    pub pending: u32,
    pub signed_up: u32,
    pub qualified: u32,
    pub rewarded: u32,
    /// Share of referrals that reached qualification (qualified or
    /// rewarded), in the range 0.0..=1.0.
    pub conversion_rate: f64,
    pub top_referrers: Vec<TopReferrer>,
}

/// One entry of the per-referrer leaderboard.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopReferrer {
    pub referrer_id: ClientId,
    pub total: u32,
    pub converted: u32,
}
