use crate::config::ConfigError;
use crate::engagement::badges::AchievementServiceError;
use crate::engagement::referrals::ReferralServiceError;
use crate::telemetry::TelemetryError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

/// Top-level error for service startup and request handling.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("telemetry: {0}")]
    Telemetry(#[from] TelemetryError),
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("server: {0}")]
    Server(#[from] axum::Error),
    #[error("achievement engine: {0}")]
    Achievement(#[from] AchievementServiceError),
    #[error("referral engine: {0}")]
    Referral(#[from] ReferralServiceError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Domain failures are the caller's problem; everything else is ours.
        let status = match self {
            AppError::Achievement(_) | AppError::Referral(_) => StatusCode::BAD_REQUEST,
            AppError::Config(_)
            | AppError::Telemetry(_)
            | AppError::Io(_)
            | AppError::Server(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
