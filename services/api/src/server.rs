use crate::cli::ServeArgs;
use crate::infra::{AppState, InMemoryEngagementStore};
use crate::routes::with_engagement_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use studio_engagement::config::AppConfig;
use studio_engagement::engagement::badges::AchievementService;
use studio_engagement::engagement::referrals::ReferralService;
use studio_engagement::error::AppError;
use studio_engagement::telemetry;
use tracing::info;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let store = Arc::new(InMemoryEngagementStore::default());
    let achievements = Arc::new(AchievementService::with_sweep_chunk(
        store.clone(),
        store.clone(),
        config.engagement.sweep_chunk_size,
    ));
    let referrals = Arc::new(ReferralService::new(store.clone(), store));

    let app = with_engagement_routes(achievements, referrals)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "studio engagement service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
