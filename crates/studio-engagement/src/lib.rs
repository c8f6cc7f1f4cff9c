//! Client engagement engine for a multi-tenant studio booking CRM.
//!
//! The `engagement` module tree holds the domain logic: achievement-badge
//! criteria evaluation and the referral reward lifecycle. Persistence is
//! reached exclusively through storage-port traits so the engine can run
//! against an in-memory store in tests and demos.

pub mod config;
pub mod engagement;
pub mod error;
pub mod telemetry;
