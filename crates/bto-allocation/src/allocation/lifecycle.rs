//! Application state machine.
//!
//! ```text
//! PENDING ──approve──▶ SUCCESSFUL ──book──▶ BOOKED
//!    │
//!    └──reject──▶ UNSUCCESSFUL
//! ```
//!
//! Any status other than `UNSUCCESSFUL` may carry a withdrawal request. Approving the
//! request moves the application to `UNSUCCESSFUL` and, for booked flats, hands the unit
//! back to the project inventory. Every guard is evaluated before anything is written, so
//! a failed transition leaves the application, applicant, and inventory untouched.

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};

use super::domain::{
    Applicant, Application, ApplicationId, ApplicationStatus, BookedFlat, FlatType, Project,
};
use super::eligibility::{EligibilityRules, IneligibilityReason};
use super::inventory::{FlatInventory, InventoryError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Approve,
    Reject,
    Book,
    RequestWithdrawal,
    ApproveWithdrawal,
    RejectWithdrawal,
}

impl Transition {
    pub const fn label(self) -> &'static str {
        match self {
            Transition::Approve => "approve",
            Transition::Reject => "reject",
            Transition::Book => "book",
            Transition::RequestWithdrawal => "request withdrawal for",
            Transition::ApproveWithdrawal => "approve withdrawal for",
            Transition::RejectWithdrawal => "reject withdrawal for",
        }
    }
}

impl fmt::Display for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Guard failures raised by lifecycle transitions.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransitionError {
    #[error("applicant already has an active application ({0})")]
    ActiveApplicationExists(ApplicationId),
    #[error("project {project} is not open for applications on {today}")]
    ApplicationWindowClosed { project: String, today: NaiveDate },
    #[error("project {project} does not offer {flat_type} flats")]
    FlatTypeNotOffered { project: String, flat_type: FlatType },
    #[error("applicant is not eligible: {0}")]
    Ineligible(IneligibilityReason),
    #[error("cannot {action} an application that is {status}")]
    InvalidTransition {
        action: Transition,
        status: ApplicationStatus,
    },
    #[error("no withdrawal has been requested for application {0}")]
    WithdrawalNotRequested(ApplicationId),
    #[error(transparent)]
    Inventory(#[from] InventoryError),
}

impl Application {
    /// Create a pending application and point the applicant at it.
    ///
    /// `today` is the local calendar date checked against the project window; `now`
    /// stamps the application.
    pub fn submit(
        id: ApplicationId,
        applicant: &mut Applicant,
        project: &Project,
        flat_type: FlatType,
        today: NaiveDate,
        now: DateTime<Utc>,
    ) -> Result<Application, TransitionError> {
        if let Some(existing) = &applicant.current_application {
            return Err(TransitionError::ActiveApplicationExists(existing.clone()));
        }

        if !project.is_open_for_applications(today) {
            return Err(TransitionError::ApplicationWindowClosed {
                project: project.name.clone(),
                today,
            });
        }

        if !project.offers(flat_type) {
            return Err(TransitionError::FlatTypeNotOffered {
                project: project.name.clone(),
                flat_type,
            });
        }

        EligibilityRules::check_flat_type(applicant, flat_type)
            .map_err(TransitionError::Ineligible)?;

        applicant.current_application = Some(id.clone());

        Ok(Application {
            id,
            applicant_id: applicant.id.clone(),
            project: project.name.clone(),
            flat_type,
            status: ApplicationStatus::Pending,
            withdrawal_requested: false,
            created_at: now,
            booked_at: None,
        })
    }

    fn require_status(
        &self,
        expected: ApplicationStatus,
        action: Transition,
    ) -> Result<(), TransitionError> {
        if self.status == expected {
            Ok(())
        } else {
            Err(TransitionError::InvalidTransition {
                action,
                status: self.status,
            })
        }
    }

    fn require_withdrawal_requested(&self, action: Transition) -> Result<(), TransitionError> {
        if !self.status.is_active() {
            return Err(TransitionError::InvalidTransition {
                action,
                status: self.status,
            });
        }
        if self.withdrawal_requested {
            Ok(())
        } else {
            Err(TransitionError::WithdrawalNotRequested(self.id.clone()))
        }
    }

    /// Approval is optimistic: it checks availability but does not hold a unit.
    pub fn approve(&mut self, inventory: &FlatInventory) -> Result<(), TransitionError> {
        self.require_status(ApplicationStatus::Pending, Transition::Approve)?;

        if !inventory.offers(self.flat_type) {
            return Err(InventoryError::NotOffered(self.flat_type).into());
        }
        if !inventory.has_available(self.flat_type) {
            return Err(InventoryError::Exhausted(self.flat_type).into());
        }

        self.status = ApplicationStatus::Successful;
        Ok(())
    }

    pub fn reject(&mut self, applicant: &mut Applicant) -> Result<(), TransitionError> {
        self.require_status(ApplicationStatus::Pending, Transition::Reject)?;

        self.status = ApplicationStatus::Unsuccessful;
        self.withdrawal_requested = false;
        self.detach_from(applicant);
        Ok(())
    }

    /// Take one unit from the inventory and record the booking on the applicant.
    pub fn book(
        &mut self,
        inventory: &mut FlatInventory,
        applicant: &mut Applicant,
        now: DateTime<Utc>,
    ) -> Result<(), TransitionError> {
        self.require_status(ApplicationStatus::Successful, Transition::Book)?;

        inventory.reserve(self.flat_type)?;

        self.status = ApplicationStatus::Booked;
        self.booked_at = Some(now);
        applicant.booked_flat = Some(BookedFlat {
            project: self.project.clone(),
            flat_type: self.flat_type,
        });
        Ok(())
    }

    /// Flag the application for withdrawal. Repeating the request is accepted.
    pub fn request_withdrawal(&mut self) -> Result<(), TransitionError> {
        if !self.status.is_active() {
            return Err(TransitionError::InvalidTransition {
                action: Transition::RequestWithdrawal,
                status: self.status,
            });
        }

        self.withdrawal_requested = true;
        Ok(())
    }

    /// Returns `true` when a booked unit went back into the inventory.
    pub fn approve_withdrawal(
        &mut self,
        inventory: &mut FlatInventory,
        applicant: &mut Applicant,
    ) -> Result<bool, TransitionError> {
        self.require_withdrawal_requested(Transition::ApproveWithdrawal)?;

        let released = self.status == ApplicationStatus::Booked;
        if released {
            inventory.release(self.flat_type)?;
            let holds_this_flat = applicant.booked_flat.as_ref().is_some_and(|booked| {
                booked.project == self.project && booked.flat_type == self.flat_type
            });
            if holds_this_flat {
                applicant.booked_flat = None;
            }
        }

        self.status = ApplicationStatus::Unsuccessful;
        self.withdrawal_requested = false;
        self.detach_from(applicant);
        Ok(released)
    }

    pub fn reject_withdrawal(&mut self) -> Result<(), TransitionError> {
        self.require_withdrawal_requested(Transition::RejectWithdrawal)?;

        self.withdrawal_requested = false;
        Ok(())
    }

    fn detach_from(&self, applicant: &mut Applicant) {
        if applicant.current_application.as_ref() == Some(&self.id) {
            applicant.current_application = None;
        }
    }
}
