use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::Serialize;
use tracing::{error, info};

use super::clock::{Clock, SystemClock};
use super::domain::{
    Applicant, Application, ApplicationId, FlatType, Manager, Officer, Project, ProjectListing,
    UserId,
};
use super::eligibility::EligibilityRules;
use super::lifecycle::TransitionError;
use super::repository::{
    ApplicantRepository, ApplicationRepository, ProjectRepository, RepositoryError,
};

static APPLICATION_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_application_id() -> ApplicationId {
    let id = APPLICATION_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    ApplicationId(format!("app-{id:06}"))
}

/// Classification of coordinator failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    NotFound,
    Unauthorized,
    BusinessRuleViolation,
    Persistence,
}

impl ErrorKind {
    pub const fn label(self) -> &'static str {
        match self {
            ErrorKind::Validation => "validation",
            ErrorKind::NotFound => "not_found",
            ErrorKind::Unauthorized => "unauthorized",
            ErrorKind::BusinessRuleViolation => "business_rule_violation",
            ErrorKind::Persistence => "persistence",
        }
    }
}

/// Error raised by the allocation coordinator.
#[derive(Debug, thiserror::Error)]
pub enum AllocationError {
    #[error("{0} is required")]
    Validation(&'static str),
    #[error("project {0} not found")]
    ProjectNotFound(String),
    #[error("application {0} not found")]
    ApplicationNotFound(ApplicationId),
    #[error("applicant {0} not found")]
    ApplicantNotFound(UserId),
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    #[error(transparent)]
    BusinessRule(#[from] TransitionError),
    #[error("persistence failure: {0}")]
    Persistence(#[from] RepositoryError),
}

impl AllocationError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AllocationError::Validation(_) => ErrorKind::Validation,
            AllocationError::ProjectNotFound(_)
            | AllocationError::ApplicationNotFound(_)
            | AllocationError::ApplicantNotFound(_) => ErrorKind::NotFound,
            AllocationError::Unauthorized(_) => ErrorKind::Unauthorized,
            AllocationError::BusinessRule(_) => ErrorKind::BusinessRuleViolation,
            AllocationError::Persistence(_) => ErrorKind::Persistence,
        }
    }
}

fn require<'a>(field: &'static str, value: &'a str) -> Result<&'a str, AllocationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(AllocationError::Validation(field))
    } else {
        Ok(trimmed)
    }
}

/// Orchestrates lifecycle transitions with authorization checks and persistence.
///
/// Every mutating call holds the transition lock from the first read to the last save,
/// so concurrent callers observe each transition as a single step.
pub struct AllocationCoordinator<P, A, U> {
    projects: Arc<P>,
    applications: Arc<A>,
    applicants: Arc<U>,
    clock: Arc<dyn Clock>,
    transitions: Mutex<()>,
}

impl<P, A, U> AllocationCoordinator<P, A, U>
where
    P: ProjectRepository + 'static,
    A: ApplicationRepository + 'static,
    U: ApplicantRepository + 'static,
{
    pub fn new(projects: Arc<P>, applications: Arc<A>, applicants: Arc<U>) -> Self {
        Self::with_clock(projects, applications, applicants, Arc::new(SystemClock))
    }

    pub fn with_clock(
        projects: Arc<P>,
        applications: Arc<A>,
        applicants: Arc<U>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            projects,
            applications,
            applicants,
            clock,
            transitions: Mutex::new(()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, ()> {
        self.transitions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn load_project(&self, name: &str) -> Result<Project, AllocationError> {
        self.projects
            .fetch(name)?
            .ok_or_else(|| AllocationError::ProjectNotFound(name.to_string()))
    }

    fn load_application(&self, id: &ApplicationId) -> Result<Application, AllocationError> {
        self.applications
            .fetch(id)?
            .ok_or_else(|| AllocationError::ApplicationNotFound(id.clone()))
    }

    fn load_applicant(&self, id: &UserId) -> Result<Applicant, AllocationError> {
        self.applicants
            .fetch(id)?
            .ok_or_else(|| AllocationError::ApplicantNotFound(id.clone()))
    }

    fn save_application(&self, application: &Application) -> Result<(), AllocationError> {
        self.applications
            .update(application.clone())
            .map_err(|err| persistence_failure("application", &application.id.0, err))
    }

    fn save_project(&self, project: &Project) -> Result<(), AllocationError> {
        self.projects
            .save(project.clone())
            .map_err(|err| persistence_failure("project", &project.name, err))
    }

    fn save_applicant(&self, applicant: &Applicant) -> Result<(), AllocationError> {
        self.applicants
            .save(applicant.clone())
            .map_err(|err| persistence_failure("applicant", applicant.id.as_str(), err))
    }

    pub fn project(&self, name: &str) -> Result<Project, AllocationError> {
        let name = require("project name", name)?;
        self.load_project(name)
    }

    pub fn application(&self, id: &ApplicationId) -> Result<Application, AllocationError> {
        require("application id", &id.0)?;
        self.load_application(id)
    }

    pub fn applicant(&self, id: &UserId) -> Result<Applicant, AllocationError> {
        require("applicant id", id.as_str())?;
        self.load_applicant(id)
    }

    /// Visible projects offering at least one flat type the applicant may apply for.
    pub fn visible_projects(
        &self,
        applicant: &Applicant,
    ) -> Result<Vec<ProjectListing>, AllocationError> {
        let listings = self
            .projects
            .list()?
            .into_iter()
            .filter(|project| project.visible)
            .filter(|project| EligibilityRules::is_eligible_for_project(applicant, project))
            .map(|project| {
                let flats = project
                    .inventory
                    .cells()
                    .iter()
                    .filter(|cell| {
                        EligibilityRules::is_eligible_for_flat_type(applicant, cell.flat_type())
                    })
                    .map(|cell| cell.availability())
                    .collect();
                ProjectListing {
                    name: project.name,
                    neighborhood: project.neighborhood,
                    opening_date: project.opening_date,
                    closing_date: project.closing_date,
                    flats,
                }
            })
            .collect();

        Ok(listings)
    }

    pub fn submit(
        &self,
        applicant: &Applicant,
        project_name: &str,
        flat_type: FlatType,
    ) -> Result<Application, AllocationError> {
        require("applicant id", applicant.id.as_str())?;
        let project_name = require("project name", project_name)?;

        let _guard = self.lock();
        let mut applicant = self.load_applicant(&applicant.id)?;
        let project = self.load_project(project_name)?;

        if project.has_officer(&applicant.id) {
            return Err(AllocationError::Unauthorized(format!(
                "officer {} handles project {} and may not apply for it",
                applicant.id, project.name
            )));
        }

        if let Some(active) = self
            .applications
            .for_applicant(&applicant.id)?
            .into_iter()
            .find(Application::is_active)
        {
            return Err(TransitionError::ActiveApplicationExists(active.id).into());
        }

        let application = Application::submit(
            next_application_id(),
            &mut applicant,
            &project,
            flat_type,
            self.clock.today(),
            self.clock.now(),
        )?;

        let application_id = application.id.clone();
        let stored = self
            .applications
            .insert(application)
            .map_err(|err| persistence_failure("application", &application_id.0, err))?;
        self.save_applicant(&applicant)?;

        info!(
            application = %stored.id,
            applicant = %stored.applicant_id,
            project = %stored.project,
            flat_type = %stored.flat_type,
            "application submitted"
        );
        Ok(stored)
    }

    pub fn approve(
        &self,
        manager: &Manager,
        id: &ApplicationId,
    ) -> Result<Application, AllocationError> {
        require("application id", &id.0)?;

        let _guard = self.lock();
        let mut application = self.load_application(id)?;
        let project = self.load_project(&application.project)?;
        authorize_manager(manager, &project)?;

        application.approve(&project.inventory)?;
        self.save_application(&application)?;

        info!(application = %application.id, manager = %manager.id, "application approved");
        Ok(application)
    }

    pub fn reject(
        &self,
        manager: &Manager,
        id: &ApplicationId,
    ) -> Result<Application, AllocationError> {
        require("application id", &id.0)?;

        let _guard = self.lock();
        let mut application = self.load_application(id)?;
        let project = self.load_project(&application.project)?;
        let mut applicant = self.load_applicant(&application.applicant_id)?;
        authorize_manager(manager, &project)?;

        application.reject(&mut applicant)?;
        self.save_application(&application)?;
        self.save_applicant(&applicant)?;

        info!(application = %application.id, manager = %manager.id, "application rejected");
        Ok(application)
    }

    pub fn book_flat(
        &self,
        officer: &Officer,
        id: &ApplicationId,
    ) -> Result<Application, AllocationError> {
        require("application id", &id.0)?;

        let _guard = self.lock();
        let mut application = self.load_application(id)?;
        let mut project = self.load_project(&application.project)?;
        let mut applicant = self.load_applicant(&application.applicant_id)?;
        if !project.has_officer(&officer.id) {
            return Err(AllocationError::Unauthorized(format!(
                "officer {} is not assigned to project {}",
                officer.id, project.name
            )));
        }

        application.book(&mut project.inventory, &mut applicant, self.clock.now())?;
        self.save_application(&application)?;
        self.save_project(&project)?;
        self.save_applicant(&applicant)?;

        info!(
            application = %application.id,
            officer = %officer.id,
            flat_type = %application.flat_type,
            remaining = project.inventory.remaining_units(application.flat_type).unwrap_or(0),
            "flat booked"
        );
        Ok(application)
    }

    pub fn request_withdrawal(
        &self,
        applicant: &Applicant,
        id: &ApplicationId,
    ) -> Result<Application, AllocationError> {
        require("application id", &id.0)?;

        let _guard = self.lock();
        let mut application = self.load_application(id)?;
        if application.applicant_id != applicant.id {
            return Err(AllocationError::Unauthorized(format!(
                "application {} does not belong to applicant {}",
                application.id, applicant.id
            )));
        }

        let already_requested = application.withdrawal_requested;
        application.request_withdrawal()?;
        if !already_requested {
            self.save_application(&application)?;
            info!(application = %application.id, "withdrawal requested");
        }
        Ok(application)
    }

    pub fn approve_withdrawal(
        &self,
        manager: &Manager,
        id: &ApplicationId,
    ) -> Result<Application, AllocationError> {
        require("application id", &id.0)?;

        let _guard = self.lock();
        let mut application = self.load_application(id)?;
        let mut project = self.load_project(&application.project)?;
        let mut applicant = self.load_applicant(&application.applicant_id)?;
        authorize_manager(manager, &project)?;

        let released = application.approve_withdrawal(&mut project.inventory, &mut applicant)?;
        self.save_application(&application)?;
        if released {
            self.save_project(&project)?;
        }
        self.save_applicant(&applicant)?;

        info!(
            application = %application.id,
            manager = %manager.id,
            released,
            "withdrawal approved"
        );
        Ok(application)
    }

    pub fn reject_withdrawal(
        &self,
        manager: &Manager,
        id: &ApplicationId,
    ) -> Result<Application, AllocationError> {
        require("application id", &id.0)?;

        let _guard = self.lock();
        let mut application = self.load_application(id)?;
        let project = self.load_project(&application.project)?;
        authorize_manager(manager, &project)?;

        application.reject_withdrawal()?;
        self.save_application(&application)?;

        info!(application = %application.id, manager = %manager.id, "withdrawal rejected");
        Ok(application)
    }

    pub fn applications_for_project(
        &self,
        manager: &Manager,
        project_name: &str,
    ) -> Result<Vec<Application>, AllocationError> {
        let project_name = require("project name", project_name)?;
        let project = self.load_project(project_name)?;
        authorize_manager(manager, &project)?;

        Ok(self.applications.for_project(&project.name)?)
    }

    /// Outstanding withdrawal requests across every project the manager runs.
    pub fn pending_withdrawals(
        &self,
        manager: &Manager,
    ) -> Result<Vec<Application>, AllocationError> {
        let mut pending = Vec::new();
        for project in self.projects.list()? {
            if !project.is_managed_by(&manager.id) {
                continue;
            }
            pending.extend(
                self.applications
                    .for_project(&project.name)?
                    .into_iter()
                    .filter(|application| application.withdrawal_requested),
            );
        }
        Ok(pending)
    }

    pub fn set_project_visibility(
        &self,
        manager: &Manager,
        project_name: &str,
        visible: bool,
    ) -> Result<Project, AllocationError> {
        let project_name = require("project name", project_name)?;

        let _guard = self.lock();
        let mut project = self.load_project(project_name)?;
        authorize_manager(manager, &project)?;

        if project.visible != visible {
            project.visible = visible;
            self.save_project(&project)?;
            info!(project = %project.name, visible, "project visibility changed");
        }
        Ok(project)
    }
}

fn authorize_manager(manager: &Manager, project: &Project) -> Result<(), AllocationError> {
    if project.is_managed_by(&manager.id) {
        Ok(())
    } else {
        Err(AllocationError::Unauthorized(format!(
            "manager {} is not in charge of project {}",
            manager.id, project.name
        )))
    }
}

fn persistence_failure(entity: &'static str, key: &str, err: RepositoryError) -> AllocationError {
    error!(entity, key, error = %err, "failed to persist allocation state");
    AllocationError::Persistence(err)
}
