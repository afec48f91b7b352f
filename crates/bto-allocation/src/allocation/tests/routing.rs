use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{header, Request, StatusCode};
use axum::response::Response;
use serde_json::{json, Value};
use tower::ServiceExt;

use super::common::*;
use crate::allocation::domain::FlatType;
use crate::allocation::router::{allocation_router, approve_handler, ManagerActionRequest};

async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

fn post_json(uri: &str, payload: Value) -> Request<Body> {
    Request::post(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(payload.to_string()))
        .expect("request builds")
}

#[tokio::test]
async fn submit_route_creates_pending_application() {
    let harness = Harness::standard();
    let router = allocation_router(harness.coordinator.clone());

    let response = router
        .oneshot(post_json(
            "/api/v1/applications",
            json!({
                "applicant_id": MARRIED_APPLICANT,
                "project": PROJECT,
                "flat_type": "three_room",
            }),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::CREATED);
    let payload = read_json_body(response).await;
    assert_eq!(payload.get("status"), Some(&json!("pending")));
    assert_eq!(payload.get("project"), Some(&json!(PROJECT)));
    assert!(payload.get("application_id").is_some());
}

#[tokio::test]
async fn ineligible_submission_maps_to_conflict() {
    let harness = Harness::standard();
    let router = allocation_router(harness.coordinator.clone());

    let response = router
        .oneshot(post_json(
            "/api/v1/applications",
            json!({
                "applicant_id": SINGLE_APPLICANT,
                "project": PROJECT,
                "flat_type": "three_room",
            }),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::CONFLICT);
    let payload = read_json_body(response).await;
    assert_eq!(payload.get("kind"), Some(&json!("business_rule_violation")));
}

#[tokio::test]
async fn blank_project_maps_to_bad_request() {
    let harness = Harness::standard();
    let router = allocation_router(harness.coordinator.clone());

    let response = router
        .oneshot(post_json(
            "/api/v1/applications",
            json!({
                "applicant_id": MARRIED_APPLICANT,
                "project": "",
                "flat_type": "two_room",
            }),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unknown_application_maps_to_not_found() {
    let harness = Harness::standard();
    let router = allocation_router(harness.coordinator.clone());

    let response = router
        .oneshot(
            Request::get("/api/v1/applications/app-missing")
                .body(Body::empty())
                .expect("request builds"),
        )
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let payload = read_json_body(response).await;
    assert_eq!(payload.get("kind"), Some(&json!("not_found")));
}

#[tokio::test]
async fn approve_handler_refuses_unrelated_manager() {
    let harness = Harness::standard();
    let submitted = harness
        .coordinator
        .submit(&married_applicant(), PROJECT, FlatType::TwoRoom)
        .expect("submitted");

    let response = approve_handler(
        State(harness.coordinator.clone()),
        Path(submitted.id.0.clone()),
        axum::Json(ManagerActionRequest {
            manager_id: other_manager().id,
        }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let payload = read_json_body(response).await;
    assert_eq!(payload.get("kind"), Some(&json!("unauthorized")));
}

#[tokio::test]
async fn booking_and_withdrawal_routes_drive_the_lifecycle() {
    let harness = Harness::standard();
    let approved = harness.approved(MARRIED_APPLICANT, FlatType::TwoRoom);
    let base = format!("/api/v1/applications/{}", approved.id);

    let response = allocation_router(harness.coordinator.clone())
        .oneshot(post_json(
            &format!("{base}/book"),
            json!({ "officer_id": OFFICER }),
        ))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        read_json_body(response).await.get("status"),
        Some(&json!("booked"))
    );

    let response = allocation_router(harness.coordinator.clone())
        .oneshot(post_json(
            &format!("{base}/withdrawal"),
            json!({ "applicant_id": MARRIED_APPLICANT }),
        ))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::ACCEPTED);

    let response = allocation_router(harness.coordinator.clone())
        .oneshot(post_json(
            &format!("{base}/withdrawal/approve"),
            json!({ "manager_id": MANAGER }),
        ))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload.get("status"), Some(&json!("unsuccessful")));
    assert_eq!(harness.remaining(FlatType::TwoRoom), 1);
}

#[tokio::test]
async fn project_listing_is_filtered_for_the_applicant() {
    let harness = Harness::standard();

    let response = allocation_router(harness.coordinator.clone())
        .oneshot(
            Request::get(format!("/api/v1/projects?applicant_id={SINGLE_APPLICANT}"))
                .body(Body::empty())
                .expect("request builds"),
        )
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    let listings = payload.as_array().expect("array of listings");
    assert_eq!(listings.len(), 1);
    let flats = listings[0]
        .get("flats")
        .and_then(Value::as_array)
        .expect("flats listed");
    assert_eq!(flats.len(), 1);
    assert_eq!(flats[0].get("flat_type"), Some(&json!("two_room")));
}
