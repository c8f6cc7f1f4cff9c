use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::engagement::clients::{ClientId, TenantId};

/// Identifier wrapper for a badge rule definition.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RuleId(pub String);

/// A single testable condition determining whether a badge is earned.
///
/// One variant per criterion kind, carrying its own parameters, so dispatch
/// is an exhaustive match and an unknown kind is unrepresentable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Criterion {
    /// At least one completed session.
    FirstSession,
    /// Completed session count reaches the threshold (inclusive).
    SessionsCompleted { required: u32 },
    /// Completed sessions starting before 9:00 tenant-local time.
    MorningSessions { required: u32 },
    /// Completed sessions falling on Saturday or Sunday.
    WeekendSessions { required: u32 },
    /// Current weight has reached the target weight; both must be present.
    WeightGoal,
    /// Logged measurement count reaches the threshold.
    MeasurementLogged { required: u32 },
    /// A run of adjacent ISO weeks each containing a completed session.
    ConsecutiveWeeks { required: u32 },
    /// Paid-order total reaches the spend threshold, in the tenant's minor
    /// currency unit. The monetary semantics are deliberate; the legacy
    /// field doubled as a "credit count" and that ambiguity is retired here.
    CreditsPurchased { minimum_spend: u32 },
}

/// Versioned stored form of a criterion, so persisted rule definitions stay
/// decodable as the criterion set evolves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CriteriaSpec {
    pub schema_version: u8,
    #[serde(flatten)]
    pub criterion: Criterion,
}

pub const CRITERIA_SCHEMA_VERSION: u8 = 1;

impl CriteriaSpec {
    pub fn new(criterion: Criterion) -> Self {
        Self {
            schema_version: CRITERIA_SCHEMA_VERSION,
            criterion,
        }
    }
}

/// Rule fields known before the store has assigned an id.
#[derive(Debug, Clone, PartialEq)]
pub struct NewRule {
    pub tenant_id: TenantId,
    pub name: String,
    pub criteria: CriteriaSpec,
    pub active: bool,
}

/// Tenant-scoped badge rule, seeded from the canonical catalog and toggled
/// by admins through `active`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleDefinition {
    pub id: RuleId,
    pub tenant_id: TenantId,
    pub name: String,
    pub criteria: CriteriaSpec,
    pub active: bool,
}

/// Immutable record of a client having earned a badge. At most one grant may
/// exist per `(client, rule)` pair; the storage layer's uniqueness guarantee
/// is the real guard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AchievementGrant {
    pub client_id: ClientId,
    pub rule_id: RuleId,
    pub granted_at: DateTime<Utc>,
}
