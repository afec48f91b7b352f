use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, TimeZone, Utc};

use crate::allocation::domain::{
    Applicant, Application, ApplicationId, Manager, MaritalStatus, Officer, Project, UserId,
};
use crate::allocation::inventory::{FlatInventory, FlatTypeInfo};
use crate::allocation::repository::{
    ApplicationRepository, ProjectRepository, RepositoryError,
};
use crate::allocation::{AllocationCoordinator, FixedClock, FlatType};
use crate::persistence::memory::{
    InMemoryApplicantRepository, InMemoryApplicationRepository, InMemoryProjectRepository,
};

pub(super) const PROJECT: &str = "Acacia Breeze";
pub(super) const MANAGER: &str = "M1000001A";
pub(super) const OTHER_MANAGER: &str = "M1000002B";
pub(super) const OFFICER: &str = "O2000001B";
pub(super) const MARRIED_APPLICANT: &str = "S1234567A";
pub(super) const SECOND_APPLICANT: &str = "S2345678B";
pub(super) const SINGLE_APPLICANT: &str = "S3456789C";

pub(super) fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0)
        .single()
        .expect("valid timestamp")
}

pub(super) fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
}

pub(super) fn manager() -> Manager {
    Manager {
        id: UserId::new(MANAGER),
    }
}

pub(super) fn other_manager() -> Manager {
    Manager {
        id: UserId::new(OTHER_MANAGER),
    }
}

pub(super) fn officer() -> Officer {
    Officer {
        id: UserId::new(OFFICER),
    }
}

pub(super) fn applicant(id: &str, age: u8, marital_status: MaritalStatus) -> Applicant {
    Applicant::new(UserId::new(id), format!("Applicant {id}"), age, marital_status)
}

pub(super) fn married_applicant() -> Applicant {
    applicant(MARRIED_APPLICANT, 25, MaritalStatus::Married)
}

pub(super) fn second_applicant() -> Applicant {
    applicant(SECOND_APPLICANT, 30, MaritalStatus::Married)
}

pub(super) fn single_applicant() -> Applicant {
    applicant(SINGLE_APPLICANT, 40, MaritalStatus::Single)
}

pub(super) fn inventory(cells: &[(FlatType, u32)]) -> FlatInventory {
    FlatInventory::new(
        cells
            .iter()
            .map(|(flat_type, units)| FlatTypeInfo::new(*flat_type, *units, 350_000))
            .collect(),
    )
    .expect("distinct flat types")
}

/// Project P: one 2-room unit and two 3-room units, open through March 2025.
pub(super) fn project() -> Project {
    project_named(
        PROJECT,
        MANAGER,
        inventory(&[(FlatType::TwoRoom, 1), (FlatType::ThreeRoom, 2)]),
    )
}

pub(super) fn project_named(name: &str, manager: &str, inventory: FlatInventory) -> Project {
    Project {
        name: name.to_string(),
        neighborhood: "Yishun".to_string(),
        opening_date: date(2025, 2, 15),
        closing_date: date(2025, 3, 20),
        manager_in_charge: UserId::new(manager),
        officer_slots: 3,
        officers: BTreeSet::from([UserId::new(OFFICER)]),
        visible: true,
        inventory,
    }
}

pub(super) type TestCoordinator = AllocationCoordinator<
    InMemoryProjectRepository,
    InMemoryApplicationRepository,
    InMemoryApplicantRepository,
>;

pub(super) struct Harness {
    pub(super) coordinator: Arc<TestCoordinator>,
    pub(super) projects: Arc<InMemoryProjectRepository>,
    pub(super) applications: Arc<InMemoryApplicationRepository>,
}

impl Harness {
    pub(super) fn new(projects: Vec<Project>, applicants: Vec<Applicant>) -> Self {
        let projects = Arc::new(InMemoryProjectRepository::with_projects(projects));
        let applications = Arc::new(InMemoryApplicationRepository::default());
        let applicants = Arc::new(InMemoryApplicantRepository::with_applicants(applicants));
        let coordinator = Arc::new(AllocationCoordinator::with_clock(
            projects.clone(),
            applications.clone(),
            applicants,
            Arc::new(FixedClock(now())),
        ));

        Self {
            coordinator,
            projects,
            applications,
        }
    }

    pub(super) fn standard() -> Self {
        Self::new(
            vec![project()],
            vec![married_applicant(), second_applicant(), single_applicant()],
        )
    }

    pub(super) fn project(&self, name: &str) -> Project {
        self.projects
            .fetch(name)
            .expect("fetch succeeds")
            .expect("project present")
    }

    pub(super) fn remaining(&self, flat_type: FlatType) -> u32 {
        self.project(PROJECT)
            .inventory
            .remaining_units(flat_type)
            .expect("flat type offered")
    }

    pub(super) fn stored(&self, id: &ApplicationId) -> Application {
        self.applications
            .fetch(id)
            .expect("fetch succeeds")
            .expect("application present")
    }

    pub(super) fn applicant(&self, id: &str) -> Applicant {
        self.coordinator
            .applicant(&UserId::new(id))
            .expect("applicant present")
    }

    /// Submit and approve an application for the given applicant.
    pub(super) fn approved(&self, id: &str, flat_type: FlatType) -> Application {
        let submitted = self
            .coordinator
            .submit(&self.applicant(id), PROJECT, flat_type)
            .expect("submission accepted");
        self.coordinator
            .approve(&manager(), &submitted.id)
            .expect("approval accepted")
    }
}

/// Application store whose updates always fail.
#[derive(Default)]
pub(super) struct ReadOnlyApplicationRepository {
    inner: InMemoryApplicationRepository,
}

impl ApplicationRepository for ReadOnlyApplicationRepository {
    fn insert(&self, application: Application) -> Result<Application, RepositoryError> {
        self.inner.insert(application)
    }

    fn update(&self, _application: Application) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("read only".to_string()))
    }

    fn fetch(&self, id: &ApplicationId) -> Result<Option<Application>, RepositoryError> {
        self.inner.fetch(id)
    }

    fn for_applicant(&self, applicant: &UserId) -> Result<Vec<Application>, RepositoryError> {
        self.inner.for_applicant(applicant)
    }

    fn for_project(&self, project: &str) -> Result<Vec<Application>, RepositoryError> {
        self.inner.for_project(project)
    }
}
