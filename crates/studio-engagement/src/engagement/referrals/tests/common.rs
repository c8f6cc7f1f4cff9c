use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use crate::engagement::clients::{
    ActivitySnapshot, ClientDirectory, ClientId, CreditNote, StoreError, TenantId,
};
use crate::engagement::referrals::domain::{
    NewReferral, ReferralId, ReferralRecord, ReferralSettings, ReferralStatus,
};
use crate::engagement::referrals::repository::ReferralRepository;
use crate::engagement::referrals::ReferralService;

pub(super) fn tenant() -> TenantId {
    TenantId("studio-praha".to_string())
}

pub(super) fn referrer() -> ClientId {
    ClientId("client-referrer".to_string())
}

pub(super) fn referred() -> ClientId {
    ClientId("client-referred".to_string())
}

/// In-memory referral store doubling as the client directory, with a toggle
/// to make credit-note writes fail for partial-failure scenarios.
#[derive(Default)]
pub(super) struct MemoryStore {
    referrals: Mutex<HashMap<ReferralId, ReferralRecord>>,
    settings: Mutex<HashMap<TenantId, ReferralSettings>>,
    credits: Mutex<HashMap<ClientId, u32>>,
    credit_notes: Mutex<Vec<CreditNote>>,
    fail_credit_notes: AtomicBool,
}

impl MemoryStore {
    pub(super) fn credits_of(&self, client: &ClientId) -> u32 {
        self.credits
            .lock()
            .expect("credit mutex poisoned")
            .get(client)
            .copied()
            .unwrap_or(0)
    }

    pub(super) fn credit_notes_for(&self, client: &ClientId) -> Vec<CreditNote> {
        self.credit_notes
            .lock()
            .expect("note mutex poisoned")
            .iter()
            .filter(|note| &note.client_id == client)
            .cloned()
            .collect()
    }

    pub(super) fn record(&self, id: &ReferralId) -> ReferralRecord {
        self.referrals
            .lock()
            .expect("referral mutex poisoned")
            .get(id)
            .cloned()
            .expect("referral present")
    }

    pub(super) fn set_credit_note_failure(&self, fail: bool) {
        self.fail_credit_notes.store(fail, Ordering::Relaxed);
    }
}

impl ReferralRepository for MemoryStore {
    fn create(&self, draft: NewReferral) -> Result<ReferralRecord, StoreError> {
        let mut guard = self.referrals.lock().expect("referral mutex poisoned");
        let id = ReferralId(format!("ref-{:06}", guard.len() + 1));
        let record = ReferralRecord::open(id, draft.tenant_id, draft.referrer_id);
        guard.insert(record.id.clone(), record.clone());
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
        let mut records: Vec<ReferralRecord> = guard
            .values()
            .filter(|record| &record.tenant_id == tenant)
            .cloned()
            .collect();
        records.sort_by(|a, b| a.id.0.cmp(&b.id.0));
        Ok(records)
    }

    fn settings(&self, tenant: &TenantId) -> Result<Option<ReferralSettings>, StoreError> {
        let guard = self.settings.lock().expect("settings mutex poisoned");
        Ok(guard.get(tenant).cloned())
    }

    fn store_settings(&self, settings: ReferralSettings) -> Result<(), StoreError> {
        let mut guard = self.settings.lock().expect("settings mutex poisoned");
        guard.insert(settings.tenant_id.clone(), settings);
        Ok(())
    }
}

impl ClientDirectory for MemoryStore {
    fn active_clients(
        &self,
        _tenant: &TenantId,
        _offset: usize,
        _limit: usize,
    ) -> Result<Vec<ClientId>, StoreError> {
        Ok(Vec::new())
    }

    fn activity_snapshot(
        &self,
        _client: &ClientId,
    ) -> Result<Option<ActivitySnapshot>, StoreError> {
        Ok(None)
    }

    fn add_credits(&self, client: &ClientId, amount: u32) -> Result<(), StoreError> {
        let mut guard = self.credits.lock().expect("credit mutex poisoned");
        *guard.entry(client.clone()).or_insert(0) += amount;
        Ok(())
    }

    fn issue_credit_note(&self, note: CreditNote) -> Result<(), StoreError> {
        if self.fail_credit_notes.load(Ordering::Relaxed) {
            return Err(StoreError::Unavailable("note ledger offline".to_string()));
        }
        self.credit_notes
            .lock()
            .expect("note mutex poisoned")
            .push(note);
        Ok(())
    }
}

pub(super) fn build_service() -> (ReferralService<MemoryStore, MemoryStore>, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::default());
    let service = ReferralService::new(store.clone(), store.clone());
    (service, store)
}

/// Drive a fresh referral to the given lifecycle stage using the default
/// tenant settings (qualification on first session).
pub(super) fn referral_at(
    service: &ReferralService<MemoryStore, MemoryStore>,
    stage: ReferralStatus,
) -> ReferralId {
    let record = service
        .open_referral(&tenant(), &referrer())
        .expect("referral opens");
    let id = record.id;

    if stage == ReferralStatus::Pending {
        return id;
    }

    service
        .mark_signed_up(&id, &referred())
        .expect("signup transition");
    if stage == ReferralStatus::SignedUp {
        return id;
    }

    let qualified = service
        .check_and_qualify(&id, crate::engagement::referrals::QualificationEvent::FirstSession)
        .expect("qualify transition");
    assert!(qualified, "fixture referral should qualify");
    if stage == ReferralStatus::Qualified {
        return id;
    }

    service.apply_rewards(&id).expect("rewards apply");
    id
}
