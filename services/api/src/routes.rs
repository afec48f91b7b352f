use crate::infra::AppState;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Extension;
use axum::Json;
use bto_allocation::allocation::{
    allocation_router, AllocationCoordinator, ApplicantRepository, ApplicationRepository,
    ProjectRepository,
};
use serde_json::json;
use std::sync::Arc;

pub(crate) fn with_allocation_routes<P, A, U>(
    coordinator: Arc<AllocationCoordinator<P, A, U>>,
) -> axum::Router
where
    P: ProjectRepository + 'static,
    A: ApplicationRepository + 'static,
    U: ApplicantRepository + 'static,
{
    allocation_router(coordinator)
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

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::seeded_coordinator;
    use axum::body::Body;
    use axum::http::Request;
    use bto_allocation::allocation::FixedClock;
    use bto_allocation::config::CatalogConfig;
    use chrono::{TimeZone, Utc};
    use metrics_exporter_prometheus::PrometheusBuilder;
    use std::sync::atomic::AtomicBool;
    use tower::ServiceExt;

    fn app(ready: bool) -> axum::Router {
        let clock = Utc
            .with_ymd_and_hms(2025, 3, 1, 9, 0, 0)
            .single()
            .expect("valid timestamp");
        let coordinator = seeded_coordinator(&CatalogConfig::default(), Arc::new(FixedClock(clock)))
            .expect("empty catalogs load");
        let state = AppState {
            readiness: Arc::new(AtomicBool::new(ready)),
            metrics: Arc::new(PrometheusBuilder::new().build_recorder().handle()),
        };

        with_allocation_routes(Arc::new(coordinator)).layer(Extension(state))
    }

    fn get(uri: &str) -> Request<Body> {
        Request::get(uri).body(Body::empty()).expect("request builds")
    }

    #[tokio::test]
    async fn health_route_reports_ok() {
        let response = app(true)
            .oneshot(get("/health"))
            .await
            .expect("route executes");

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn readiness_reflects_startup_flag() {
        let response = app(false)
            .oneshot(get("/ready"))
            .await
            .expect("route executes");
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        let response = app(true)
            .oneshot(get("/ready"))
            .await
            .expect("route executes");
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn allocation_routes_are_mounted() {
        let response = app(true)
            .oneshot(get("/api/v1/applications/app-unknown"))
            .await
            .expect("route executes");

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = axum::body::to_bytes(response.into_body(), 4096)
            .await
            .expect("read body");
        let payload: serde_json::Value = serde_json::from_slice(&body).expect("json payload");
        assert_eq!(payload.get("kind"), Some(&json!("not_found")));
    }
}
