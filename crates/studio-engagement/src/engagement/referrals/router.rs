use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::json;

use super::domain::{QualificationEvent, ReferralId, ReferralSettingsPatch};
use super::repository::ReferralRepository;
use super::service::{ReferralService, ReferralServiceError};
use crate::engagement::clients::{ClientDirectory, ClientId, StoreError, TenantId};

/// Router builder exposing the referral lifecycle, settings, and stats
/// endpoints.
pub fn referral_router<R, C>(service: Arc<ReferralService<R, C>>) -> Router
where
    R: ReferralRepository + 'static,
    C: ClientDirectory + 'static,
{
    Router::new()
        .route(
            "/api/v1/tenants/:tenant_id/referrals/settings",
            get(get_settings_handler::<R, C>).put(update_settings_handler::<R, C>),
        )
        .route(
            "/api/v1/tenants/:tenant_id/referrals/stats",
            get(stats_handler::<R, C>),
        )
        .route(
            "/api/v1/tenants/:tenant_id/referrals",
            post(open_handler::<R, C>),
        )
        .route(
            "/api/v1/referrals/:referral_id/signup",
            post(signup_handler::<R, C>),
        )
        .route(
            "/api/v1/referrals/:referral_id/qualify",
            post(qualify_handler::<R, C>),
        )
        .route(
            "/api/v1/referrals/:referral_id/rewards",
            post(rewards_handler::<R, C>),
        )
        .with_state(service)
}

#[derive(Debug, Deserialize)]
pub(crate) struct OpenReferralRequest {
    pub(crate) referrer_id: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SignupRequest {
    pub(crate) referred_client_id: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct QualifyRequest {
    pub(crate) event: QualificationEvent,
}

pub(crate) async fn get_settings_handler<R, C>(
    State(service): State<Arc<ReferralService<R, C>>>,
    Path(tenant_id): Path<String>,
) -> Response
where
    R: ReferralRepository + 'static,
    C: ClientDirectory + 'static,
{
    match service.get_settings(&TenantId(tenant_id)) {
        Ok(settings) => (StatusCode::OK, axum::Json(settings)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn update_settings_handler<R, C>(
    State(service): State<Arc<ReferralService<R, C>>>,
    Path(tenant_id): Path<String>,
    axum::Json(patch): axum::Json<ReferralSettingsPatch>,
) -> Response
where
    R: ReferralRepository + 'static,
    C: ClientDirectory + 'static,
{
    match service.update_settings(&TenantId(tenant_id), patch) {
        Ok(settings) => (StatusCode::OK, axum::Json(settings)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn stats_handler<R, C>(
    State(service): State<Arc<ReferralService<R, C>>>,
    Path(tenant_id): Path<String>,
) -> Response
where
    R: ReferralRepository + 'static,
    C: ClientDirectory + 'static,
{
    match service.stats(&TenantId(tenant_id)) {
        Ok(stats) => (StatusCode::OK, axum::Json(stats)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn open_handler<R, C>(
    State(service): State<Arc<ReferralService<R, C>>>,
    Path(tenant_id): Path<String>,
    axum::Json(request): axum::Json<OpenReferralRequest>,
) -> Response
where
    R: ReferralRepository + 'static,
    C: ClientDirectory + 'static,
{
    match service.open_referral(&TenantId(tenant_id), &ClientId(request.referrer_id)) {
        Ok(record) => (StatusCode::CREATED, axum::Json(record)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn signup_handler<R, C>(
    State(service): State<Arc<ReferralService<R, C>>>,
    Path(referral_id): Path<String>,
    axum::Json(request): axum::Json<SignupRequest>,
) -> Response
where
    R: ReferralRepository + 'static,
    C: ClientDirectory + 'static,
{
    let id = ReferralId(referral_id);
    match service.mark_signed_up(&id, &ClientId(request.referred_client_id)) {
        Ok(()) => {
            let payload = json!({ "status": "signed_up" });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Err(err) => error_response(err),
    }
}

pub(crate) async fn qualify_handler<R, C>(
    State(service): State<Arc<ReferralService<R, C>>>,
    Path(referral_id): Path<String>,
    axum::Json(request): axum::Json<QualifyRequest>,
) -> Response
where
    R: ReferralRepository + 'static,
    C: ClientDirectory + 'static,
{
    let id = ReferralId(referral_id);
    match service.check_and_qualify(&id, request.event) {
        Ok(qualified) => {
            let payload = json!({ "qualified": qualified });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Err(err) => error_response(err),
    }
}

pub(crate) async fn rewards_handler<R, C>(
    State(service): State<Arc<ReferralService<R, C>>>,
    Path(referral_id): Path<String>,
) -> Response
where
    R: ReferralRepository + 'static,
    C: ClientDirectory + 'static,
{
    let id = ReferralId(referral_id);
    match service.apply_rewards(&id) {
        Ok(applied) => {
            let payload = json!({
                "success": true,
                "referrer_reward": applied.referrer_reward,
                "referred_reward": applied.referred_reward,
            });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Err(err @ ReferralServiceError::NotQualified { .. }) => {
            let payload = json!({
                "success": false,
                "error": err.to_string(),
            });
            (StatusCode::CONFLICT, axum::Json(payload)).into_response()
        }
        Err(err) => error_response(err),
    }
}

fn error_response(err: ReferralServiceError) -> Response {
    let status = match &err {
        ReferralServiceError::NotFound(_) => StatusCode::NOT_FOUND,
        ReferralServiceError::InvalidTransition { .. }
        | ReferralServiceError::NotQualified { .. } => StatusCode::CONFLICT,
        ReferralServiceError::Store(StoreError::Conflict) => StatusCode::CONFLICT,
        ReferralServiceError::Store(StoreError::NotFound) => StatusCode::NOT_FOUND,
        ReferralServiceError::Store(StoreError::Unavailable(_))
        | ReferralServiceError::Reward(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    let payload = json!({ "error": err.to_string() });
    (status, axum::Json(payload)).into_response()
}
