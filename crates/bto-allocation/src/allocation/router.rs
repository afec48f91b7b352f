use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{error, warn};

use super::coordinator::{AllocationCoordinator, AllocationError, ErrorKind};
use super::domain::{ApplicationId, FlatType, Manager, Officer, UserId};
use super::repository::{ApplicantRepository, ApplicationRepository, ProjectRepository};

type SharedCoordinator<P, A, U> = Arc<AllocationCoordinator<P, A, U>>;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitApplicationRequest {
    pub applicant_id: UserId,
    pub project: String,
    pub flat_type: FlatType,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManagerActionRequest {
    pub manager_id: UserId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OfficerActionRequest {
    pub officer_id: UserId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicantActionRequest {
    pub applicant_id: UserId,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProjectListingQuery {
    pub applicant_id: UserId,
}

/// Router builder exposing the allocation lifecycle over HTTP.
///
/// Actor ids in request bodies are trusted; authentication happens upstream.
pub fn allocation_router<P, A, U>(coordinator: SharedCoordinator<P, A, U>) -> Router
where
    P: ProjectRepository + 'static,
    A: ApplicationRepository + 'static,
    U: ApplicantRepository + 'static,
{
    Router::new()
        .route("/api/v1/projects", get(projects_handler::<P, A, U>))
        .route("/api/v1/applications", post(submit_handler::<P, A, U>))
        .route(
            "/api/v1/applications/:application_id",
            get(application_handler::<P, A, U>),
        )
        .route(
            "/api/v1/applications/:application_id/approve",
            post(approve_handler::<P, A, U>),
        )
        .route(
            "/api/v1/applications/:application_id/reject",
            post(reject_handler::<P, A, U>),
        )
        .route(
            "/api/v1/applications/:application_id/book",
            post(book_handler::<P, A, U>),
        )
        .route(
            "/api/v1/applications/:application_id/withdrawal",
            post(request_withdrawal_handler::<P, A, U>),
        )
        .route(
            "/api/v1/applications/:application_id/withdrawal/approve",
            post(approve_withdrawal_handler::<P, A, U>),
        )
        .route(
            "/api/v1/applications/:application_id/withdrawal/reject",
            post(reject_withdrawal_handler::<P, A, U>),
        )
        .with_state(coordinator)
}

pub(crate) fn error_response(err: AllocationError) -> Response {
    let kind = err.kind();
    let status = match kind {
        ErrorKind::Validation => StatusCode::BAD_REQUEST,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::Unauthorized => StatusCode::FORBIDDEN,
        ErrorKind::BusinessRuleViolation => StatusCode::CONFLICT,
        ErrorKind::Persistence => StatusCode::INTERNAL_SERVER_ERROR,
    };

    if kind == ErrorKind::Persistence {
        error!(error = %err, "allocation request failed");
    } else {
        warn!(kind = kind.label(), error = %err, "allocation request refused");
    }

    let payload = json!({
        "error": err.to_string(),
        "kind": kind.label(),
    });
    (status, Json(payload)).into_response()
}

fn respond<T: Serialize>(status: StatusCode, result: Result<T, AllocationError>) -> Response {
    match result {
        Ok(body) => (status, Json(body)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn projects_handler<P, A, U>(
    State(coordinator): State<SharedCoordinator<P, A, U>>,
    Query(query): Query<ProjectListingQuery>,
) -> Response
where
    P: ProjectRepository + 'static,
    A: ApplicationRepository + 'static,
    U: ApplicantRepository + 'static,
{
    let result = coordinator
        .applicant(&query.applicant_id)
        .and_then(|applicant| coordinator.visible_projects(&applicant));
    respond(StatusCode::OK, result)
}

pub(crate) async fn submit_handler<P, A, U>(
    State(coordinator): State<SharedCoordinator<P, A, U>>,
    Json(request): Json<SubmitApplicationRequest>,
) -> Response
where
    P: ProjectRepository + 'static,
    A: ApplicationRepository + 'static,
    U: ApplicantRepository + 'static,
{
    let result = coordinator
        .applicant(&request.applicant_id)
        .and_then(|applicant| {
            coordinator.submit(&applicant, &request.project, request.flat_type)
        })
        .map(|application| application.view());
    respond(StatusCode::CREATED, result)
}

pub(crate) async fn application_handler<P, A, U>(
    State(coordinator): State<SharedCoordinator<P, A, U>>,
    Path(application_id): Path<String>,
) -> Response
where
    P: ProjectRepository + 'static,
    A: ApplicationRepository + 'static,
    U: ApplicantRepository + 'static,
{
    let result = coordinator
        .application(&ApplicationId(application_id))
        .map(|application| application.view());
    respond(StatusCode::OK, result)
}

pub(crate) async fn approve_handler<P, A, U>(
    State(coordinator): State<SharedCoordinator<P, A, U>>,
    Path(application_id): Path<String>,
    Json(request): Json<ManagerActionRequest>,
) -> Response
where
    P: ProjectRepository + 'static,
    A: ApplicationRepository + 'static,
    U: ApplicantRepository + 'static,
{
    let manager = Manager {
        id: request.manager_id,
    };
    let result = coordinator
        .approve(&manager, &ApplicationId(application_id))
        .map(|application| application.view());
    respond(StatusCode::OK, result)
}

pub(crate) async fn reject_handler<P, A, U>(
    State(coordinator): State<SharedCoordinator<P, A, U>>,
    Path(application_id): Path<String>,
    Json(request): Json<ManagerActionRequest>,
) -> Response
where
    P: ProjectRepository + 'static,
    A: ApplicationRepository + 'static,
    U: ApplicantRepository + 'static,
{
    let manager = Manager {
        id: request.manager_id,
    };
    let result = coordinator
        .reject(&manager, &ApplicationId(application_id))
        .map(|application| application.view());
    respond(StatusCode::OK, result)
}

pub(crate) async fn book_handler<P, A, U>(
    State(coordinator): State<SharedCoordinator<P, A, U>>,
    Path(application_id): Path<String>,
    Json(request): Json<OfficerActionRequest>,
) -> Response
where
    P: ProjectRepository + 'static,
    A: ApplicationRepository + 'static,
    U: ApplicantRepository + 'static,
{
    let officer = Officer {
        id: request.officer_id,
    };
    let result = coordinator
        .book_flat(&officer, &ApplicationId(application_id))
        .map(|application| application.view());
    respond(StatusCode::OK, result)
}

pub(crate) async fn request_withdrawal_handler<P, A, U>(
    State(coordinator): State<SharedCoordinator<P, A, U>>,
    Path(application_id): Path<String>,
    Json(request): Json<ApplicantActionRequest>,
) -> Response
where
    P: ProjectRepository + 'static,
    A: ApplicationRepository + 'static,
    U: ApplicantRepository + 'static,
{
    let id = ApplicationId(application_id);
    let result = coordinator
        .applicant(&request.applicant_id)
        .and_then(|applicant| coordinator.request_withdrawal(&applicant, &id))
        .map(|application| application.view());
    respond(StatusCode::ACCEPTED, result)
}

pub(crate) async fn approve_withdrawal_handler<P, A, U>(
    State(coordinator): State<SharedCoordinator<P, A, U>>,
    Path(application_id): Path<String>,
    Json(request): Json<ManagerActionRequest>,
) -> Response
where
    P: ProjectRepository + 'static,
    A: ApplicationRepository + 'static,
    U: ApplicantRepository + 'static,
{
    let manager = Manager {
        id: request.manager_id,
    };
    let result = coordinator
        .approve_withdrawal(&manager, &ApplicationId(application_id))
        .map(|application| application.view());
    respond(StatusCode::OK, result)
}

pub(crate) async fn reject_withdrawal_handler<P, A, U>(
    State(coordinator): State<SharedCoordinator<P, A, U>>,
    Path(application_id): Path<String>,
    Json(request): Json<ManagerActionRequest>,
) -> Response
where
    P: ProjectRepository + 'static,
    A: ApplicationRepository + 'static,
    U: ApplicantRepository + 'static,
{
    let manager = Manager {
        id: request.manager_id,
    };
    let result = coordinator
        .reject_withdrawal(&manager, &ApplicationId(application_id))
        .map(|application| application.view());
    respond(StatusCode::OK, result)
}
