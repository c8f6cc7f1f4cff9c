use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use studio_engagement::engagement::badges::{
    AchievementGrant, BadgeRepository, NewRule, RuleDefinition, RuleId,
};
use studio_engagement::engagement::clients::{
    ActivitySnapshot, ClientDirectory, ClientId, CreditNote, StoreError, TenantId,
};
use studio_engagement::engagement::referrals::{
    NewReferral, ReferralId, ReferralRecord, ReferralRepository, ReferralSettings,
};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

struct ClientProfile {
    tenant_id: TenantId,
    snapshot: ActivitySnapshot,
}

/// Single in-memory store backing every engine port. A deployment swaps
/// this for a database-backed adapter without touching the engines.
#[derive(Default)]
pub(crate) struct InMemoryEngagementStore {
    rules: Mutex<Vec<RuleDefinition>>,
    rule_sequence: AtomicU64,
    grants: Mutex<Vec<AchievementGrant>>,
    clients: Mutex<BTreeMap<ClientId, ClientProfile>>,
    referrals: Mutex<HashMap<ReferralId, ReferralRecord>>,
    referral_sequence: AtomicU64,
    settings: Mutex<HashMap<TenantId, ReferralSettings>>,
    credits: Mutex<HashMap<ClientId, u32>>,
    credit_notes: Mutex<Vec<CreditNote>>,
}

impl InMemoryEngagementStore {
    pub(crate) fn upsert_client(
        &self,
        tenant: &TenantId,
        client: ClientId,
        snapshot: ActivitySnapshot,
    ) {
        self.clients.lock().expect("client mutex poisoned").insert(
            client,
            ClientProfile {
                tenant_id: tenant.clone(),
                snapshot,
            },
        );
    }

    pub(crate) fn credits_of(&self, client: &ClientId) -> u32 {
        self.credits
            .lock()
            .expect("credit mutex poisoned")
            .get(client)
            .copied()
            .unwrap_or(0)
    }

    pub(crate) fn credit_notes_for(&self, client: &ClientId) -> Vec<CreditNote> {
        self.credit_notes
            .lock()
            .expect("note mutex poisoned")
            .iter()
            .filter(|note| &note.client_id == client)
            .cloned()
            .collect()
    }
}

impl BadgeRepository for InMemoryEngagementStore {
    fn rules(&self, tenant: &TenantId) -> Result<Vec<RuleDefinition>, StoreError> {
        let guard = self.rules.lock().expect("rule mutex poisoned");
        Ok(guard
            .iter()
            .filter(|rule| &rule.tenant_id == tenant)
            .cloned()
            .collect())
    }

    fn create_rule(&self, draft: NewRule) -> Result<RuleDefinition, StoreError> {
        let sequence = self.rule_sequence.fetch_add(1, Ordering::Relaxed) + 1;
        let rule = RuleDefinition {
            id: RuleId(format!("rule-{sequence:06}")),
            tenant_id: draft.tenant_id,
            name: draft.name,
            criteria: draft.criteria,
            active: draft.active,
        };
        self.rules
            .lock()
            .expect("rule mutex poisoned")
            .push(rule.clone());
        Ok(rule)
    }

    fn grants_for_client(&self, client: &ClientId) -> Result<Vec<AchievementGrant>, StoreError> {
        let guard = self.grants.lock().expect("grant mutex poisoned");
        Ok(guard
            .iter()
            .filter(|grant| &grant.client_id == client)
            .cloned()
            .collect())
    }

    fn insert_grant(&self, grant: AchievementGrant) -> Result<(), StoreError> {
        let mut guard = self.grants.lock().expect("grant mutex poisoned");
        if guard
            .iter()
            .any(|held| held.client_id == grant.client_id && held.rule_id == grant.rule_id)
        {
            return Err(StoreError::Conflict);
        }
        guard.push(grant);
        Ok(())
    }
}

impl ClientDirectory for InMemoryEngagementStore {
    fn active_clients(
        &self,
        tenant: &TenantId,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<ClientId>, StoreError> {
        let guard = self.clients.lock().expect("client mutex poisoned");
        Ok(guard
            .iter()
            .filter(|(_, profile)| &profile.tenant_id == tenant)
            .map(|(client, _)| client.clone())
            .skip(offset)
            .take(limit)
            .collect())
    }

    fn activity_snapshot(&self, client: &ClientId) -> Result<Option<ActivitySnapshot>, StoreError> {
        let guard = self.clients.lock().expect("client mutex poisoned");
        Ok(guard.get(client).map(|profile| profile.snapshot.clone()))
    }

    fn add_credits(&self, client: &ClientId, amount: u32) -> Result<(), StoreError> {
        let mut guard = self.credits.lock().expect("credit mutex poisoned");
        *guard.entry(client.clone()).or_insert(0) += amount;
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

impl ReferralRepository for InMemoryEngagementStore {
    fn create(&self, draft: NewReferral) -> Result<ReferralRecord, StoreError> {
        let sequence = self.referral_sequence.fetch_add(1, Ordering::Relaxed) + 1;
        let record = ReferralRecord::open(
            ReferralId(format!("ref-{sequence:06}")),
            draft.tenant_id,
            draft.referrer_id,
        );
        self.referrals
            .lock()
            .expect("referral mutex poisoned")
            .insert(record.id.clone(), record.clone());
        Ok(record)
    }

    fn fetch(&self, id: &ReferralId) -> Result<Option<ReferralRecord>, StoreError> {
        let guard = self.referrals.lock().expect("referral mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn update(&self, record: ReferralRecord) -> Result<(), StoreError> {
        let mut guard = self.referrals.lock().expect("referral mutex poisoned");
        if !guard.contains_key(&record.id) {
            return Err(StoreError::NotFound);
        }
        guard.insert(record.id.clone(), record);
        Ok(())
    }

    fn for_tenant(&self, tenant: &TenantId) -> Result<Vec<ReferralRecord>, StoreError> {
        let guard = self.referrals.lock().expect("referral mutex poisoned");
        Ok(guard
            .values()
            .filter(|record| &record.tenant_id == tenant)
            .cloned()
            .collect())
    }

    fn settings(&self, tenant: &TenantId) -> Result<Option<ReferralSettings>, StoreError> {
        let guard = self.settings.lock().expect("settings mutex poisoned");
        Ok(guard.get(tenant).cloned())
    }

    fn store_settings(&self, settings: ReferralSettings) -> Result<(), StoreError> {
        self.settings
            .lock()
            .expect("settings mutex poisoned")
            .insert(settings.tenant_id.clone(), settings);
        Ok(())
    }
}
