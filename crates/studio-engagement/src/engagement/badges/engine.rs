use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, warn};

use super::catalog::default_badge_templates;
use super::domain::{AchievementGrant, CriteriaSpec, NewRule, RuleDefinition, RuleId};
use super::evaluator;
use super::repository::BadgeRepository;
use crate::engagement::clients::{ClientDirectory, ClientId, StoreError, TenantId};

const DEFAULT_SWEEP_CHUNK: usize = 100;

/// Service iterating tenant badge rules against client activity and
/// persisting grants idempotently.
pub struct AchievementService<B, C> {
    badges: Arc<B>,
    clients: Arc<C>,
    sweep_chunk_size: usize,
}

impl<B, C> AchievementService<B, C>
where
    B: BadgeRepository + 'static,
    C: ClientDirectory + 'static,
{
    pub fn new(badges: Arc<B>, clients: Arc<C>) -> Self {
        Self::with_sweep_chunk(badges, clients, DEFAULT_SWEEP_CHUNK)
    }

    pub fn with_sweep_chunk(badges: Arc<B>, clients: Arc<C>, sweep_chunk_size: usize) -> Self {
        Self {
            badges,
            clients,
            sweep_chunk_size: sweep_chunk_size.max(1),
        }
    }

    /// Insert each canonical badge that the tenant does not already have a
    /// rule name for. Returns the number of rules created.
    pub fn seed_default_badges(
        &self,
        tenant: &TenantId,
    ) -> Result<usize, AchievementServiceError> {
        let existing: HashSet<String> = self
            .badges
            .rules(tenant)?
            .into_iter()
            .map(|rule| rule.name)
            .collect();

        let mut created = 0;
        for template in default_badge_templates() {
            if existing.contains(template.name) {
                continue;
            }
            self.badges.create_rule(NewRule {
                tenant_id: tenant.clone(),
                name: template.name.to_string(),
                criteria: CriteriaSpec::new(template.criterion),
                active: true,
            })?;
            created += 1;
        }

        Ok(created)
    }

    /// Grant a single rule to a client if earned and not already granted.
    /// Returns whether a new grant was created.
    pub fn grant_if_earned(
        &self,
        client: &ClientId,
        rule: &RuleDefinition,
    ) -> Result<bool, AchievementServiceError> {
        let granted: HashSet<RuleId> = self
            .badges
            .grants_for_client(client)?
            .into_iter()
            .map(|grant| grant.rule_id)
            .collect();
        if granted.contains(&rule.id) {
            return Ok(false);
        }

        let activity = self
            .clients
            .activity_snapshot(client)?
            .ok_or_else(|| AchievementServiceError::UnknownClient(client.clone()))?;

        if !evaluator::evaluate(&rule.criteria.criterion, &activity) {
            return Ok(false);
        }

        self.persist_grant(client, &rule.id)
    }

    /// Evaluate every active, ungranted rule for a client and return the
    /// names of newly granted badges. Rules and grants are loaded once.
    pub fn check_and_award(
        &self,
        client: &ClientId,
        tenant: &TenantId,
    ) -> Result<Vec<String>, AchievementServiceError> {
        let rules = self.badges.active_rules(tenant)?;
        self.award_against_rules(client, &rules)
    }

    /// Sequentially sweep every active client of a tenant, reading client
    /// pages in chunks. Per-client failures are recorded and the sweep
    /// continues.
    pub fn check_all_clients(
        &self,
        tenant: &TenantId,
    ) -> Result<SweepReport, AchievementServiceError> {
        let rules = self.badges.active_rules(tenant)?;
        let mut report = SweepReport::default();
        let mut offset = 0;

        loop {
            let page = self
                .clients
                .active_clients(tenant, offset, self.sweep_chunk_size)?;
            if page.is_empty() {
                break;
            }
            offset += page.len();

            for client in page {
                report.checked += 1;
                match self.award_against_rules(&client, &rules) {
                    Ok(badges) => {
                        report.awarded += badges.len() as u32;
                        report.details.push(ClientSweepDetail {
                            client_id: client,
                            badges,
                            error: None,
                        });
                    }
                    Err(err) => {
                        warn!(client = %client.0, %err, "badge check failed, continuing sweep");
                        report.failed += 1;
                        report.details.push(ClientSweepDetail {
                            client_id: client,
                            badges: Vec::new(),
                            error: Some(err.to_string()),
                        });
                    }
                }
            }
        }

        Ok(report)
    }

    fn award_against_rules(
        &self,
        client: &ClientId,
        rules: &[RuleDefinition],
    ) -> Result<Vec<String>, AchievementServiceError> {
        let granted: HashSet<RuleId> = self
            .badges
            .grants_for_client(client)?
            .into_iter()
            .map(|grant| grant.rule_id)
            .collect();

        let activity = self
            .clients
            .activity_snapshot(client)?
            .ok_or_else(|| AchievementServiceError::UnknownClient(client.clone()))?;

        let mut awarded = Vec::new();
        for rule in rules {
            if granted.contains(&rule.id) {
                continue;
            }
            if !evaluator::evaluate(&rule.criteria.criterion, &activity) {
                continue;
            }
            if self.persist_grant(client, &rule.id)? {
                awarded.push(rule.name.clone());
            }
        }

        Ok(awarded)
    }

    fn persist_grant(
        &self,
        client: &ClientId,
        rule: &RuleId,
    ) -> Result<bool, AchievementServiceError> {
        let grant = AchievementGrant {
            client_id: client.clone(),
            rule_id: rule.clone(),
            granted_at: Utc::now(),
        };
        match self.badges.insert_grant(grant) {
            Ok(()) => Ok(true),
            // The store's uniqueness guarantee is the real duplicate guard;
            // losing the race to another writer is not an error.
            Err(StoreError::Conflict) => {
                debug!(client = %client.0, rule = %rule.0, "grant already present");
                Ok(false)
            }
            Err(err) => Err(err.into()),
        }
    }
}

/// Error raised by the achievement engine.
#[derive(Debug, thiserror::Error)]
pub enum AchievementServiceError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("unknown client '{}'", .0 .0)]
    UnknownClient(ClientId),
}

/// Aggregate result of a tenant-wide badge sweep.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SweepReport {
    pub checked: u32,
    pub awarded: u32,
    pub failed: u32,
    pub details: Vec<ClientSweepDetail>,
}

/// Per-client outcome inside a sweep.
#[derive(Debug, Clone, Serialize)]
pub struct ClientSweepDetail {
    pub client_id: ClientId,
    pub badges: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
