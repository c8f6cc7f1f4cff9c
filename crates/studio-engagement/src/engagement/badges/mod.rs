//! Achievement badges: criterion evaluation and idempotent grant awarding.

mod catalog;
pub mod domain;
pub mod evaluator;
pub mod engine;
pub mod repository;
pub mod router;

#[cfg(test)]
mod tests;

pub use catalog::{default_badge_templates, BadgeTemplate};
pub use domain::{AchievementGrant, CriteriaSpec, Criterion, NewRule, RuleDefinition, RuleId};
pub use engine::{AchievementService, AchievementServiceError, ClientSweepDetail, SweepReport};
pub use repository::BadgeRepository;
pub use router::badge_router;
