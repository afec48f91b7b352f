//! Application lifecycle and flat-inventory allocation.
//!
//! [`EligibilityRules`] gate submissions, [`FlatInventory`] tracks units per flat type,
//! the lifecycle transitions live on [`Application`], and [`AllocationCoordinator`]
//! ties them together with authorization checks and repository persistence.

pub mod clock;
pub mod coordinator;
pub mod domain;
pub mod eligibility;
pub mod inventory;
pub mod lifecycle;
pub mod repository;
pub mod router;

#[cfg(test)]
mod tests;

pub use clock::{Clock, FixedClock, SystemClock};
pub use coordinator::{AllocationCoordinator, AllocationError, ErrorKind};
pub use domain::{
    Applicant, Application, ApplicationId, ApplicationStatus, ApplicationView, BookedFlat,
    FlatAvailability, FlatType, Manager, MaritalStatus, Officer, Project, ProjectListing, UserId,
};
pub use eligibility::{EligibilityRules, IneligibilityReason};
pub use inventory::{FlatInventory, FlatTypeInfo, InventoryError};
pub use lifecycle::{Transition, TransitionError};
pub use repository::{
    ApplicantRepository, ApplicationRepository, ProjectRepository, RepositoryError,
};
pub use router::allocation_router;
