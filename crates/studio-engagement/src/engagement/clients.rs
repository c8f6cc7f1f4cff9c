use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier wrapper for an isolated studio account.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TenantId(pub String);

/// Identifier wrapper for a studio's client.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ClientId(pub String);

/// Scheduling status of a booked session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Scheduled,
    Completed,
    Cancelled,
    NoShow,
}

/// A single booked session as seen by the engagement engine.
///
/// `scheduled_at` is a tenant-local wall-clock time; a studio operates in one
/// timezone, so the store adapter localizes timestamps once when assembling
/// the snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub status: SessionStatus,
    pub scheduled_at: NaiveDateTime,
}

/// Read-only view of a client's recorded activity, fetched once per
/// evaluation pass. Missing fields evaluate criteria to `false` rather than
/// erroring.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActivitySnapshot {
    pub sessions: Vec<SessionRecord>,
    pub measurement_count: u32,
    pub current_weight: Option<f32>,
    pub target_weight: Option<f32>,
    /// Sum of paid-order totals, in the tenant's minor currency unit.
    pub paid_order_total: u32,
}

/// First-class discount entity issued by the reward applicator, replacing
/// the legacy free-text note.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreditNote {
    pub client_id: ClientId,
    pub percent: u32,
    pub description: String,
    pub issued_at: DateTime<Utc>,
    pub redeemed: bool,
}

/// Storage failures surfaced by any of the engine's ports.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Client-facing storage port shared by the achievement engine and the
/// reward applicator.
pub trait ClientDirectory: Send + Sync {
    /// One page of active client ids for a tenant; the sweep drives paging.
    fn active_clients(
        &self,
        tenant: &TenantId,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<ClientId>, StoreError>;

    /// Activity snapshot for a single client, or `None` when unknown.
    fn activity_snapshot(&self, client: &ClientId) -> Result<Option<ActivitySnapshot>, StoreError>;

    /// Atomically increment the client's credit balance.
    fn add_credits(&self, client: &ClientId, amount: u32) -> Result<(), StoreError>;

    /// Record a pending percentage discount for the client.
    fn issue_credit_note(&self, note: CreditNote) -> Result<(), StoreError>;
}
