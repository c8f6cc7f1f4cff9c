use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Router,
};
use serde_json::json;

use super::engine::{AchievementService, AchievementServiceError};
use super::repository::BadgeRepository;
use crate::engagement::clients::{ClientDirectory, ClientId, StoreError, TenantId};

/// Router builder exposing the badge seeding, per-client check, and tenant
/// sweep endpoints.
pub fn badge_router<B, C>(service: Arc<AchievementService<B, C>>) -> Router
where
    B: BadgeRepository + 'static,
    C: ClientDirectory + 'static,
{
    Router::new()
        .route(
            "/api/v1/tenants/:tenant_id/badges/seed",
            post(seed_handler::<B, C>),
        )
        .route(
            "/api/v1/tenants/:tenant_id/clients/:client_id/badges/check",
            post(check_handler::<B, C>),
        )
        .route(
            "/api/v1/tenants/:tenant_id/badges/sweep",
            post(sweep_handler::<B, C>),
        )
        .with_state(service)
}

pub(crate) async fn seed_handler<B, C>(
    State(service): State<Arc<AchievementService<B, C>>>,
    Path(tenant_id): Path<String>,
) -> Response
where
    B: BadgeRepository + 'static,
    C: ClientDirectory + 'static,
{
    let tenant = TenantId(tenant_id);
    match service.seed_default_badges(&tenant) {
        Ok(created) => {
            let payload = json!({ "created": created });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Err(err) => error_response(err),
    }
}

pub(crate) async fn check_handler<B, C>(
    State(service): State<Arc<AchievementService<B, C>>>,
    Path((tenant_id, client_id)): Path<(String, String)>,
) -> Response
where
    B: BadgeRepository + 'static,
    C: ClientDirectory + 'static,
{
    let tenant = TenantId(tenant_id);
    let client = ClientId(client_id);
    match service.check_and_award(&client, &tenant) {
        Ok(badges) => {
            let payload = json!({ "awarded": badges });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Err(err) => error_response(err),
    }
}

pub(crate) async fn sweep_handler<B, C>(
    State(service): State<Arc<AchievementService<B, C>>>,
    Path(tenant_id): Path<String>,
) -> Response
where
    B: BadgeRepository + 'static,
    C: ClientDirectory + 'static,
{
    let tenant = TenantId(tenant_id);
    match service.check_all_clients(&tenant) {
        Ok(report) => (StatusCode::OK, axum::Json(report)).into_response(),
        Err(err) => error_response(err),
    }
}

fn error_response(err: AchievementServiceError) -> Response {
    let status = match &err {
        AchievementServiceError::UnknownClient(_)
        | AchievementServiceError::Store(StoreError::NotFound) => StatusCode::NOT_FOUND,
        AchievementServiceError::Store(StoreError::Conflict) => StatusCode::CONFLICT,
        AchievementServiceError::Store(StoreError::Unavailable(_)) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    let payload = json!({ "error": err.to_string() });
    (status, axum::Json(payload)).into_response()
}
