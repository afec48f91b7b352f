use bto_allocation::allocation::{AllocationCoordinator, Clock};
use bto_allocation::config::CatalogConfig;
use bto_allocation::error::AppError;
use bto_allocation::persistence::{
    CatalogImporter, InMemoryApplicantRepository, InMemoryApplicationRepository,
    InMemoryProjectRepository,
};
use chrono::NaiveDate;
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::info;

pub(crate) type InMemoryCoordinator = AllocationCoordinator<
    InMemoryProjectRepository,
    InMemoryApplicationRepository,
    InMemoryApplicantRepository,
>;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Build a coordinator over in-memory stores seeded from the configured catalogs.
pub(crate) fn seeded_coordinator(
    catalog: &CatalogConfig,
    clock: Arc<dyn Clock>,
) -> Result<InMemoryCoordinator, AppError> {
    let projects = match &catalog.projects_csv {
        Some(path) => CatalogImporter::projects_from_path(path)?,
        None => Vec::new(),
    };
    let applicants = match &catalog.applicants_csv {
        Some(path) => CatalogImporter::applicants_from_path(path)?,
        None => Vec::new(),
    };
    info!(
        projects = projects.len(),
        applicants = applicants.len(),
        "catalogs loaded"
    );

    Ok(AllocationCoordinator::with_clock(
        Arc::new(InMemoryProjectRepository::with_projects(projects)),
        Arc::new(InMemoryApplicationRepository::default()),
        Arc::new(InMemoryApplicantRepository::with_applicants(applicants)),
        clock,
    ))
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}
