use crate::cli::ServeArgs;
use crate::infra::{seeded_coordinator, AppState};
use crate::routes::with_allocation_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use bto_allocation::allocation::SystemClock;
use bto_allocation::config::AppConfig;
use bto_allocation::error::AppError;
use bto_allocation::telemetry;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::info;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }
    if let Some(path) = args.projects_csv.take() {
        config.catalog.projects_csv = Some(path);
    }
    if let Some(path) = args.applicants_csv.take() {
        config.catalog.applicants_csv = Some(path);
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let coordinator = Arc::new(seeded_coordinator(&config.catalog, Arc::new(SystemClock))?);

    let app = with_allocation_routes(coordinator)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "bto allocation service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
