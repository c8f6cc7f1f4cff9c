use std::sync::{Arc, Mutex};

use chrono::NaiveDate;

use crate::engagement::badges::domain::{
    AchievementGrant, CriteriaSpec, Criterion, NewRule, RuleDefinition, RuleId,
};
use crate::engagement::badges::repository::BadgeRepository;
use crate::engagement::badges::AchievementService;
use crate::engagement::clients::{
    ActivitySnapshot, ClientDirectory, ClientId, CreditNote, SessionRecord, SessionStatus,
    StoreError, TenantId,
};

pub(super) fn tenant() -> TenantId {
    TenantId("studio-praha".to_string())
}

pub(super) fn client(suffix: &str) -> ClientId {
    ClientId(format!("client-{suffix}"))
}

pub(super) fn session_at(date: NaiveDate, hour: u32) -> SessionRecord {
    SessionRecord {
        status: SessionStatus::Completed,
        scheduled_at: date
            .and_hms_opt(hour, 0, 0)
            .expect("valid session time"),
    }
}

pub(super) fn cancelled_at(date: NaiveDate, hour: u32) -> SessionRecord {
    SessionRecord {
        status: SessionStatus::Cancelled,
        scheduled_at: date
            .and_hms_opt(hour, 0, 0)
            .expect("valid session time"),
    }
}

pub(super) fn day(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
}

pub(super) fn snapshot_with_sessions(sessions: Vec<SessionRecord>) -> ActivitySnapshot {
    ActivitySnapshot {
        sessions,
        ..ActivitySnapshot::default()
    }
}

pub(super) fn rule(name: &str, criterion: Criterion, active: bool) -> NewRule {
    NewRule {
        tenant_id: tenant(),
        name: name.to_string(),
        criteria: CriteriaSpec::new(criterion),
        active,
    }
}

/// In-memory store implementing both engine ports for module tests.
#[derive(Default, Clone)]
pub(super) struct MemoryStore {
    rules: Arc<Mutex<Vec<RuleDefinition>>>,
    grants: Arc<Mutex<Vec<AchievementGrant>>>,
    clients: Arc<Mutex<Vec<(TenantId, ClientId, Option<ActivitySnapshot>)>>>,
    credit_notes: Arc<Mutex<Vec<CreditNote>>>,
}

impl MemoryStore {
    pub(super) fn add_client(
        &self,
        tenant: &TenantId,
        client: &ClientId,
        snapshot: ActivitySnapshot,
    ) {
        self.clients.lock().expect("client mutex poisoned").push((
            tenant.clone(),
            client.clone(),
            Some(snapshot),
        ));
    }

    /// Register a client whose snapshot read will come back empty, as a
    /// deleted client row would.
    pub(super) fn add_broken_client(&self, tenant: &TenantId, client: &ClientId) {
        self.clients.lock().expect("client mutex poisoned").push((
            tenant.clone(),
            client.clone(),
            None,
        ));
    }

    pub(super) fn grant_count(&self, client: &ClientId) -> usize {
        self.grants
            .lock()
            .expect("grant mutex poisoned")
            .iter()
            .filter(|grant| &grant.client_id == client)
            .count()
    }

    pub(super) fn rule_count(&self) -> usize {
        self.rules.lock().expect("rule mutex poisoned").len()
    }
}

impl BadgeRepository for MemoryStore {
    fn rules(&self, tenant: &TenantId) -> Result<Vec<RuleDefinition>, StoreError> {
        Ok(self
            .rules
            .lock()
            .expect("rule mutex poisoned")
            .iter()
            .filter(|rule| &rule.tenant_id == tenant)
            .cloned()
            .collect())
    }

    fn create_rule(&self, draft: NewRule) -> Result<RuleDefinition, StoreError> {
        let mut guard = self.rules.lock().expect("rule mutex poisoned");
        let rule = RuleDefinition {
            id: RuleId(format!("rule-{:06}", guard.len() + 1)),
            tenant_id: draft.tenant_id,
            name: draft.name,
            criteria: draft.criteria,
            active: draft.active,
        };
        guard.push(rule.clone());
        Ok(rule)
    }

    fn grants_for_client(&self, client: &ClientId) -> Result<Vec<AchievementGrant>, StoreError> {
        Ok(self
            .grants
            .lock()
            .expect("grant mutex poisoned")
            .iter()
            .filter(|grant| &grant.client_id == client)
            .cloned()
            .collect())
    }

    fn insert_grant(&self, grant: AchievementGrant) -> Result<(), StoreError> {
        let mut guard = self.grants.lock().expect("grant mutex poisoned");
        if guard
            .iter()
            .any(|existing| existing.client_id == grant.client_id && existing.rule_id == grant.rule_id)
        {
            return Err(StoreError::Conflict);
        }
        guard.push(grant);
        Ok(())
    }
}

impl ClientDirectory for MemoryStore {
    fn active_clients(
        &self,
        tenant: &TenantId,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<ClientId>, StoreError> {
        Ok(self
            .clients
            .lock()
            .expect("client mutex poisoned")
            .iter()
            .filter(|(owner, _, _)| owner == tenant)
            .map(|(_, id, _)| id.clone())
            .skip(offset)
            .take(limit)
            .collect())
    }

    fn activity_snapshot(&self, client: &ClientId) -> Result<Option<ActivitySnapshot>, StoreError> {
        Ok(self
            .clients
            .lock()
            .expect("client mutex poisoned")
            .iter()
            .find(|(_, id, _)| id == client)
            .and_then(|(_, _, snapshot)| snapshot.clone()))
    }

    fn add_credits(&self, _client: &ClientId, _amount: u32) -> Result<(), StoreError> {
        Ok(())
    }

    fn issue_credit_note(&self, note: CreditNote) -> Result<(), StoreError> {
        self.credit_notes
            .lock()
            .expect("note mutex poisoned")
            .push(note);
        Ok(())
    }
}

/// Store whose grant insert always reports a conflict, standing in for a
/// concurrent writer that won the race.
#[derive(Default, Clone)]
pub(super) struct RacingGrantStore {
    inner: MemoryStore,
}

impl RacingGrantStore {
    pub(super) fn inner(&self) -> &MemoryStore {
        &self.inner
    }
}

impl BadgeRepository for RacingGrantStore {
    fn rules(&self, tenant: &TenantId) -> Result<Vec<RuleDefinition>, StoreError> {
        self.inner.rules(tenant)
    }

    fn create_rule(&self, draft: NewRule) -> Result<RuleDefinition, StoreError> {
        self.inner.create_rule(draft)
    }

    fn grants_for_client(&self, client: &ClientId) -> Result<Vec<AchievementGrant>, StoreError> {
        self.inner.grants_for_client(client)
    }

    fn insert_grant(&self, _grant: AchievementGrant) -> Result<(), StoreError> {
        Err(StoreError::Conflict)
    }
}

/// Store that always fails, for error-path routing tests.
pub(super) struct UnavailableStore;

impl BadgeRepository for UnavailableStore {
    fn rules(&self, _tenant: &TenantId) -> Result<Vec<RuleDefinition>, StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }

    fn create_rule(&self, _draft: NewRule) -> Result<RuleDefinition, StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }

    fn grants_for_client(&self, _client: &ClientId) -> Result<Vec<AchievementGrant>, StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }

    fn insert_grant(&self, _grant: AchievementGrant) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }
}

pub(super) fn build_service() -> (AchievementService<MemoryStore, MemoryStore>, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::default());
    let service = AchievementService::new(store.clone(), store.clone());
    (service, store)
}
