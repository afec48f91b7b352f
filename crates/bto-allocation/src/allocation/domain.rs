use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::inventory::FlatInventory;

/// NRIC-style identifier shared by applicants, officers, and managers.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct UserId(pub String);

impl UserId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier wrapper for submitted applications.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ApplicationId(pub String);

impl fmt::Display for ApplicationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaritalStatus {
    Single,
    Married,
}

impl MaritalStatus {
    pub const fn label(self) -> &'static str {
        match self {
            MaritalStatus::Single => "single",
            MaritalStatus::Married => "married",
        }
    }
}

impl FromStr for MaritalStatus {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "single" => Ok(Self::Single),
            "married" => Ok(Self::Married),
            other => Err(format!("unknown marital status '{other}'")),
        }
    }
}

/// Flat types offered by BTO projects, ordered smallest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlatType {
    TwoRoom,
    ThreeRoom,
}

impl FlatType {
    pub const ALL: [FlatType; 2] = [FlatType::TwoRoom, FlatType::ThreeRoom];

    /// The only flat type open to single applicants.
    pub const SMALLEST: FlatType = FlatType::TwoRoom;

    pub const fn label(self) -> &'static str {
        match self {
            FlatType::TwoRoom => "2-Room",
            FlatType::ThreeRoom => "3-Room",
        }
    }
}

impl fmt::Display for FlatType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for FlatType {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let normalized: String = raw
            .chars()
            .filter(|ch| ch.is_ascii_alphanumeric())
            .collect::<String>()
            .to_ascii_lowercase();

        match normalized.as_str() {
            "2room" | "tworoom" => Ok(Self::TwoRoom),
            "3room" | "threeroom" => Ok(Self::ThreeRoom),
            _ => Err(format!("unknown flat type '{}'", raw.trim())),
        }
    }
}

/// Flat secured by a booked application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookedFlat {
    pub project: String,
    pub flat_type: FlatType,
}

/// Applicant record as tracked by the allocation engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Applicant {
    pub id: UserId,
    pub name: String,
    pub age: u8,
    pub marital_status: MaritalStatus,
    /// Weak reference; the application's lifecycle is owned by the coordinator.
    pub current_application: Option<ApplicationId>,
    pub booked_flat: Option<BookedFlat>,
}

impl Applicant {
    pub fn new(
        id: UserId,
        name: impl Into<String>,
        age: u8,
        marital_status: MaritalStatus,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            age,
            marital_status,
            current_application: None,
            booked_flat: None,
        }
    }
}

/// Authenticated HDB officer acting on a project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Officer {
    pub id: UserId,
}

/// Authenticated HDB manager acting on a project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manager {
    pub id: UserId,
}

/// BTO project with its application window, staffing, and flat inventory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub name: String,
    pub neighborhood: String,
    pub opening_date: NaiveDate,
    pub closing_date: NaiveDate,
    pub manager_in_charge: UserId,
    pub officer_slots: u8,
    pub officers: BTreeSet<UserId>,
    pub visible: bool,
    pub inventory: FlatInventory,
}

impl Project {
    /// Window bounds are inclusive on both ends.
    pub fn is_open_for_applications(&self, today: NaiveDate) -> bool {
        self.opening_date <= today && today <= self.closing_date
    }

    pub fn offers(&self, flat_type: FlatType) -> bool {
        self.inventory.offers(flat_type)
    }

    pub fn offered_flat_types(&self) -> impl Iterator<Item = FlatType> + '_ {
        self.inventory.flat_types()
    }

    pub fn is_managed_by(&self, manager: &UserId) -> bool {
        &self.manager_in_charge == manager
    }

    pub fn has_officer(&self, officer: &UserId) -> bool {
        self.officers.contains(officer)
    }
}

/// Status tracked throughout the application lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    Pending,
    Successful,
    Unsuccessful,
    Booked,
}

impl ApplicationStatus {
    pub const fn label(self) -> &'static str {
        match self {
            ApplicationStatus::Pending => "pending",
            ApplicationStatus::Successful => "successful",
            ApplicationStatus::Unsuccessful => "unsuccessful",
            ApplicationStatus::Booked => "booked",
        }
    }

    /// Every status except `Unsuccessful` counts towards the one-application limit.
    pub const fn is_active(self) -> bool {
        !matches!(self, ApplicationStatus::Unsuccessful)
    }
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Application {
    pub id: ApplicationId,
    pub applicant_id: UserId,
    pub project: String,
    pub flat_type: FlatType,
    pub status: ApplicationStatus,
    pub withdrawal_requested: bool,
    pub created_at: DateTime<Utc>,
    pub booked_at: Option<DateTime<Utc>>,
}

impl Application {
    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }

    pub fn view(&self) -> ApplicationView {
        ApplicationView {
            application_id: self.id.clone(),
            applicant_id: self.applicant_id.clone(),
            project: self.project.clone(),
            flat_type: self.flat_type,
            status: self.status.label(),
            withdrawal_requested: self.withdrawal_requested,
            created_at: self.created_at,
            booked_at: self.booked_at,
        }
    }
}

/// Sanitized representation of an application for API responses.
#[derive(Debug, Clone, Serialize)]
pub struct ApplicationView {
    pub application_id: ApplicationId,
    pub applicant_id: UserId,
    pub project: String,
    pub flat_type: FlatType,
    pub status: &'static str,
    pub withdrawal_requested: bool,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub booked_at: Option<DateTime<Utc>>,
}

/// Project listing as seen by a prospective applicant.
#[derive(Debug, Clone, Serialize)]
pub struct ProjectListing {
    pub name: String,
    pub neighborhood: String,
    pub opening_date: NaiveDate,
    pub closing_date: NaiveDate,
    pub flats: Vec<FlatAvailability>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlatAvailability {
    pub flat_type: FlatType,
    pub remaining_units: u32,
    pub total_units: u32,
    pub price: u32,
}
