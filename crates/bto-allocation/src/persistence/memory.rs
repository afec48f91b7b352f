use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::allocation::domain::{Applicant, Application, ApplicationId, Project, UserId};
use crate::allocation::repository::{
    ApplicantRepository, ApplicationRepository, ProjectRepository, RepositoryError,
};

fn lock<T>(records: &Mutex<T>) -> Result<MutexGuard<'_, T>, RepositoryError> {
    records
        .lock()
        .map_err(|_| RepositoryError::Unavailable("repository mutex poisoned".to_string()))
}

#[derive(Default, Clone)]
pub struct InMemoryProjectRepository {
    records: Arc<Mutex<BTreeMap<String, Project>>>,
}

impl InMemoryProjectRepository {
    pub fn with_projects(projects: impl IntoIterator<Item = Project>) -> Self {
        let records = projects
            .into_iter()
            .map(|project| (project.name.clone(), project))
            .collect();
        Self {
            records: Arc::new(Mutex::new(records)),
        }
    }
}

impl ProjectRepository for InMemoryProjectRepository {
    fn fetch(&self, name: &str) -> Result<Option<Project>, RepositoryError> {
        Ok(lock(&self.records)?.get(name).cloned())
    }

    fn save(&self, project: Project) -> Result<(), RepositoryError> {
        lock(&self.records)?.insert(project.name.clone(), project);
        Ok(())
    }

    fn list(&self) -> Result<Vec<Project>, RepositoryError> {
        Ok(lock(&self.records)?.values().cloned().collect())
    }
}

#[derive(Default, Clone)]
pub struct InMemoryApplicationRepository {
    records: Arc<Mutex<BTreeMap<ApplicationId, Application>>>,
}

impl InMemoryApplicationRepository {
    fn matching(
        &self,
        predicate: impl Fn(&Application) -> bool,
    ) -> Result<Vec<Application>, RepositoryError> {
        Ok(lock(&self.records)?
            .values()
            .filter(|application| predicate(application))
            .cloned()
            .collect())
    }
}

impl ApplicationRepository for InMemoryApplicationRepository {
    fn insert(&self, application: Application) -> Result<Application, RepositoryError> {
        let mut guard = lock(&self.records)?;
        if guard.contains_key(&application.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(application.id.clone(), application.clone());
        Ok(application)
    }

    fn update(&self, application: Application) -> Result<(), RepositoryError> {
        let mut guard = lock(&self.records)?;
        if guard.contains_key(&application.id) {
            guard.insert(application.id.clone(), application);
            Ok(())
        } else {
            Err(RepositoryError::NotFound)
        }
    }

    fn fetch(&self, id: &ApplicationId) -> Result<Option<Application>, RepositoryError> {
        Ok(lock(&self.records)?.get(id).cloned())
    }

    fn for_applicant(&self, applicant: &UserId) -> Result<Vec<Application>, RepositoryError> {
        self.matching(|application| &application.applicant_id == applicant)
    }

    fn for_project(&self, project: &str) -> Result<Vec<Application>, RepositoryError> {
        self.matching(|application| application.project == project)
    }
}

#[derive(Default, Clone)]
pub struct InMemoryApplicantRepository {
    records: Arc<Mutex<BTreeMap<UserId, Applicant>>>,
}

impl InMemoryApplicantRepository {
    pub fn with_applicants(applicants: impl IntoIterator<Item = Applicant>) -> Self {
        let records = applicants
            .into_iter()
            .map(|applicant| (applicant.id.clone(), applicant))
            .collect();
        Self {
            records: Arc::new(Mutex::new(records)),
        }
    }
}

impl ApplicantRepository for InMemoryApplicantRepository {
    fn fetch(&self, id: &UserId) -> Result<Option<Applicant>, RepositoryError> {
        Ok(lock(&self.records)?.get(id).cloned())
    }

    fn save(&self, applicant: Applicant) -> Result<(), RepositoryError> {
        lock(&self.records)?.insert(applicant.id.clone(), applicant);
        Ok(())
    }
}
