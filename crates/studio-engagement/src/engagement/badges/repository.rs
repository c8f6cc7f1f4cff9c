use super::domain::{AchievementGrant, NewRule, RuleDefinition};
use crate::engagement::clients::{ClientId, StoreError, TenantId};

/// Storage abstraction for badge rules and grants, so the engine can be
/// exercised against an in-memory fake.
pub trait BadgeRepository: Send + Sync {
    /// Rule definitions for a tenant, active or not.
    fn rules(&self, tenant: &TenantId) -> Result<Vec<RuleDefinition>, StoreError>;

    /// Only the rules an admin has left active.
    fn active_rules(&self, tenant: &TenantId) -> Result<Vec<RuleDefinition>, StoreError> {
        Ok(self
            .rules(tenant)?
            .into_iter()
            .filter(|rule| rule.active)
            .collect())
    }

    /// Persist a new rule and return it with its assigned id. The store
    /// mints the `RuleId`, so id uniqueness lives with the layer that can
    /// actually enforce it across restarts.
    fn create_rule(&self, draft: NewRule) -> Result<RuleDefinition, StoreError>;

    fn grants_for_client(&self, client: &ClientId) -> Result<Vec<AchievementGrant>, StoreError>;

    /// Insert a grant. Implementations must enforce uniqueness on
    /// `(client, rule)` and report a duplicate as `StoreError::Conflict`;
    /// the engine's existence check alone is not safe under concurrency.
    fn insert_grant(&self, grant: AchievementGrant) -> Result<(), StoreError>;
}
