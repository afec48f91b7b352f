mod parser;

use std::collections::{BTreeSet, HashSet};
use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::allocation::domain::{Applicant, FlatType, MaritalStatus, Project, UserId};
use crate::allocation::inventory::{FlatInventory, FlatTypeInfo};

use parser::{parse_date, parse_rows, ApplicantRow, FlatColumns, ProjectRow};

/// Header row is line 1, so the first record sits on line 2.
const FIRST_DATA_LINE: usize = 2;

#[derive(Debug)]
pub enum CatalogImportError {
    Io(std::io::Error),
    Csv(csv::Error),
    InvalidRow { line: usize, reason: String },
}

impl std::fmt::Display for CatalogImportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CatalogImportError::Io(err) => write!(f, "failed to read catalog: {}", err),
            CatalogImportError::Csv(err) => write!(f, "invalid catalog CSV data: {}", err),
            CatalogImportError::InvalidRow { line, reason } => {
                write!(f, "invalid catalog row on line {}: {}", line, reason)
            }
        }
    }
}

impl std::error::Error for CatalogImportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CatalogImportError::Io(err) => Some(err),
            CatalogImportError::Csv(err) => Some(err),
            CatalogImportError::InvalidRow { .. } => None,
        }
    }
}

impl From<std::io::Error> for CatalogImportError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<csv::Error> for CatalogImportError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err)
    }
}

fn invalid(line: usize, reason: impl Into<String>) -> CatalogImportError {
    CatalogImportError::InvalidRow {
        line,
        reason: reason.into(),
    }
}

fn parse_count(line: usize, field: &str, raw: &str) -> Result<u32, CatalogImportError> {
    raw.trim()
        .replace(',', "")
        .parse::<u32>()
        .map_err(|_| invalid(line, format!("{field} must be a whole number, found '{raw}'")))
}

/// Loads seed catalogs of projects and applicants from CSV exports.
pub struct CatalogImporter;

impl CatalogImporter {
    pub fn projects_from_path(path: impl AsRef<Path>) -> Result<Vec<Project>, CatalogImportError> {
        let file = File::open(path)?;
        Self::projects_from_reader(file)
    }

    pub fn projects_from_reader<R: Read>(reader: R) -> Result<Vec<Project>, CatalogImportError> {
        let rows: Vec<ProjectRow> = parse_rows(reader)?;
        let mut seen = HashSet::new();
        let mut projects = Vec::with_capacity(rows.len());

        for (index, row) in rows.into_iter().enumerate() {
            let line = index + FIRST_DATA_LINE;
            let project = project_from_row(line, row)?;
            if !seen.insert(project.name.clone()) {
                return Err(invalid(
                    line,
                    format!("duplicate project name '{}'", project.name),
                ));
            }
            projects.push(project);
        }

        Ok(projects)
    }

    pub fn applicants_from_path(
        path: impl AsRef<Path>,
    ) -> Result<Vec<Applicant>, CatalogImportError> {
        let file = File::open(path)?;
        Self::applicants_from_reader(file)
    }

    pub fn applicants_from_reader<R: Read>(
        reader: R,
    ) -> Result<Vec<Applicant>, CatalogImportError> {
        let rows: Vec<ApplicantRow> = parse_rows(reader)?;
        rows.into_iter()
            .enumerate()
            .map(|(index, row)| applicant_from_row(index + FIRST_DATA_LINE, row))
            .collect()
    }
}

fn project_from_row(line: usize, row: ProjectRow) -> Result<Project, CatalogImportError> {
    if row.name.trim().is_empty() {
        return Err(invalid(line, "project name is required"));
    }
    if row.manager.trim().is_empty() {
        return Err(invalid(line, "manager is required"));
    }

    let opening_date = parse_date(&row.opening_date)
        .ok_or_else(|| invalid(line, format!("bad opening date '{}'", row.opening_date)))?;
    let closing_date = parse_date(&row.closing_date)
        .ok_or_else(|| invalid(line, format!("bad closing date '{}'", row.closing_date)))?;
    if closing_date < opening_date {
        return Err(invalid(line, "closing date precedes opening date"));
    }

    let mut cells = Vec::new();
    for columns in row.flat_columns() {
        if let Some(cell) = flat_cell(line, columns)? {
            cells.push(cell);
        }
    }
    if cells.is_empty() {
        return Err(invalid(line, "project offers no flat types"));
    }
    let inventory = FlatInventory::new(cells).map_err(|err| invalid(line, err.to_string()))?;

    let officer_slots = match row.officer_slots.as_deref() {
        Some(raw) => {
            let slots = parse_count(line, "officer slot", raw)?;
            u8::try_from(slots).map_err(|_| invalid(line, "officer slot out of range"))?
        }
        None => 0,
    };
    let officers: BTreeSet<UserId> = row.officer_ids().into_iter().map(UserId).collect();
    if officer_slots > 0 && officers.len() > usize::from(officer_slots) {
        return Err(invalid(
            line,
            format!(
                "{} officers assigned but only {} slots",
                officers.len(),
                officer_slots
            ),
        ));
    }

    Ok(Project {
        name: row.name.trim().to_string(),
        neighborhood: row.neighborhood.trim().to_string(),
        opening_date,
        closing_date,
        manager_in_charge: UserId::new(row.manager.trim()),
        officer_slots,
        officers,
        visible: true,
        inventory,
    })
}

fn flat_cell(
    line: usize,
    columns: FlatColumns<'_>,
) -> Result<Option<FlatTypeInfo>, CatalogImportError> {
    let Some(label) = columns.label else {
        return Ok(None);
    };
    let flat_type: FlatType = label.parse().map_err(|reason: String| invalid(line, reason))?;
    let units = match columns.units {
        Some(raw) => parse_count(line, "number of units", raw)?,
        None => return Err(invalid(line, format!("{flat_type} is missing a unit count"))),
    };
    let price = match columns.price {
        Some(raw) => parse_count(line, "selling price", raw)?,
        None => 0,
    };

    Ok(Some(FlatTypeInfo::new(flat_type, units, price)))
}

fn applicant_from_row(line: usize, row: ApplicantRow) -> Result<Applicant, CatalogImportError> {
    if row.nric.trim().is_empty() {
        return Err(invalid(line, "NRIC is required"));
    }
    let age = row
        .age
        .trim()
        .parse::<u8>()
        .map_err(|_| invalid(line, format!("bad age '{}'", row.age)))?;
    let marital_status: MaritalStatus = row
        .marital_status
        .parse()
        .map_err(|reason: String| invalid(line, reason))?;

    Ok(Applicant::new(
        UserId::new(row.nric.trim()),
        row.name.trim(),
        age,
        marital_status,
    ))
}
