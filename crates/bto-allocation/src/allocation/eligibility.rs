use std::fmt;

use serde::{Deserialize, Serialize};

use super::domain::{Applicant, FlatType, MaritalStatus, Project};

const SINGLE_MINIMUM_AGE: u8 = 35;
const MARRIED_MINIMUM_AGE: u8 = 21;

/// Reason an applicant may not apply for a flat type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum IneligibilityReason {
    SingleUnderAge { age: u8 },
    MarriedUnderAge { age: u8 },
    SingleRestrictedFlatType { requested: FlatType },
}

impl IneligibilityReason {
    pub fn summary(&self) -> String {
        match self {
            IneligibilityReason::SingleUnderAge { age } => format!(
                "single applicants must be at least {SINGLE_MINIMUM_AGE} (age {age})"
            ),
            IneligibilityReason::MarriedUnderAge { age } => format!(
                "married applicants must be at least {MARRIED_MINIMUM_AGE} (age {age})"
            ),
            IneligibilityReason::SingleRestrictedFlatType { requested } => format!(
                "single applicants may only apply for {} flats, not {}",
                FlatType::SMALLEST,
                requested
            ),
        }
    }
}

impl fmt::Display for IneligibilityReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.summary())
    }
}

/// Fixed eligibility policy keyed on age and marital status.
pub struct EligibilityRules;

impl EligibilityRules {
    pub fn check_flat_type(
        applicant: &Applicant,
        flat_type: FlatType,
    ) -> Result<(), IneligibilityReason> {
        let age = applicant.age;
        match applicant.marital_status {
            MaritalStatus::Single if age < SINGLE_MINIMUM_AGE => {
                Err(IneligibilityReason::SingleUnderAge { age })
            }
            MaritalStatus::Single if flat_type != FlatType::SMALLEST => {
                Err(IneligibilityReason::SingleRestrictedFlatType {
                    requested: flat_type,
                })
            }
            MaritalStatus::Single => Ok(()),
            MaritalStatus::Married if age < MARRIED_MINIMUM_AGE => {
                Err(IneligibilityReason::MarriedUnderAge { age })
            }
            MaritalStatus::Married => Ok(()),
        }
    }

    pub fn is_eligible_for_flat_type(applicant: &Applicant, flat_type: FlatType) -> bool {
        Self::check_flat_type(applicant, flat_type).is_ok()
    }

    pub fn is_eligible_for_bto(applicant: &Applicant) -> bool {
        FlatType::ALL
            .iter()
            .any(|flat_type| Self::is_eligible_for_flat_type(applicant, *flat_type))
    }

    pub fn is_eligible_for_project(applicant: &Applicant, project: &Project) -> bool {
        project
            .offered_flat_types()
            .any(|flat_type| Self::is_eligible_for_flat_type(applicant, flat_type))
    }

    pub fn eligible_flat_types(applicant: &Applicant, project: &Project) -> Vec<FlatType> {
        project
            .offered_flat_types()
            .filter(|flat_type| Self::is_eligible_for_flat_type(applicant, *flat_type))
            .collect()
    }
}
