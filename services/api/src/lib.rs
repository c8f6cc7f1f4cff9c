//! HTTP service and CLI for the studio engagement engines: badge seeding,
//! per-client checks, tenant-wide sweeps and the referral reward lifecycle,
//! backed by an in-memory store adapter.

mod cli;
mod demo;
mod infra;
mod routes;
mod server;

use studio_engagement::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
