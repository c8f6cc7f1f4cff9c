use crate::infra::AppState;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Extension;
use axum::Json;
use serde_json::json;
use std::sync::Arc;
use studio_engagement::engagement::badges::{badge_router, AchievementService, BadgeRepository};
use studio_engagement::engagement::clients::ClientDirectory;
use studio_engagement::engagement::referrals::{
    referral_router, ReferralRepository, ReferralService,
};

pub(crate) fn with_engagement_routes<S>(
    achievements: Arc<AchievementService<S, S>>,
    referrals: Arc<ReferralService<S, S>>,
) -> axum::Router
where
    S: BadgeRepository + ClientDirectory + ReferralRepository + 'static,
{
    badge_router(achievements)
        .merge(referral_router(referrals))
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status, Json(json!({ "ready": ready })))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}
