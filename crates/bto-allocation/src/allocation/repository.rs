use super::domain::{Applicant, Application, ApplicationId, Project, UserId};

/// Project storage, keyed by project name.
pub trait ProjectRepository: Send + Sync {
    fn fetch(&self, name: &str) -> Result<Option<Project>, RepositoryError>;
    fn save(&self, project: Project) -> Result<(), RepositoryError>;
    fn list(&self) -> Result<Vec<Project>, RepositoryError>;
}

/// Application storage. Applications are never deleted.
pub trait ApplicationRepository: Send + Sync {
    fn insert(&self, application: Application) -> Result<Application, RepositoryError>;
    fn update(&self, application: Application) -> Result<(), RepositoryError>;
    fn fetch(&self, id: &ApplicationId) -> Result<Option<Application>, RepositoryError>;
    fn for_applicant(&self, applicant: &UserId) -> Result<Vec<Application>, RepositoryError>;
    fn for_project(&self, project: &str) -> Result<Vec<Application>, RepositoryError>;
}

pub trait ApplicantRepository: Send + Sync {
    fn fetch(&self, id: &UserId) -> Result<Option<Applicant>, RepositoryError>;
    fn save(&self, applicant: Applicant) -> Result<(), RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}
