use chrono::NaiveDate;
use serde::{Deserialize, Deserializer};
use std::io::Read;

#[derive(Debug, Deserialize)]
pub(crate) struct ProjectRow {
    #[serde(rename = "Project Name")]
    pub(crate) name: String,
    #[serde(rename = "Neighborhood", default)]
    pub(crate) neighborhood: String,
    #[serde(rename = "Type 1", default, deserialize_with = "empty_string_as_none")]
    pub(crate) type_1: Option<String>,
    #[serde(
        rename = "Number of units for Type 1",
        default,
        deserialize_with = "empty_string_as_none"
    )]
    pub(crate) units_1: Option<String>,
    #[serde(
        rename = "Selling price for Type 1",
        default,
        deserialize_with = "empty_string_as_none"
    )]
    pub(crate) price_1: Option<String>,
    #[serde(rename = "Type 2", default, deserialize_with = "empty_string_as_none")]
    pub(crate) type_2: Option<String>,
    #[serde(
        rename = "Number of units for Type 2",
        default,
        deserialize_with = "empty_string_as_none"
    )]
    pub(crate) units_2: Option<String>,
    #[serde(
        rename = "Selling price for Type 2",
        default,
        deserialize_with = "empty_string_as_none"
    )]
    pub(crate) price_2: Option<String>,
    #[serde(rename = "Application opening date")]
    pub(crate) opening_date: String,
    #[serde(rename = "Application closing date")]
    pub(crate) closing_date: String,
    #[serde(rename = "Manager")]
    pub(crate) manager: String,
    #[serde(
        rename = "Officer Slot",
        default,
        deserialize_with = "empty_string_as_none"
    )]
    pub(crate) officer_slots: Option<String>,
    #[serde(rename = "Officer", default, deserialize_with = "empty_string_as_none")]
    pub(crate) officers: Option<String>,
}

impl ProjectRow {
    pub(crate) fn flat_columns(&self) -> [FlatColumns<'_>; 2] {
        [
            FlatColumns {
                label: self.type_1.as_deref(),
                units: self.units_1.as_deref(),
                price: self.price_1.as_deref(),
            },
            FlatColumns {
                label: self.type_2.as_deref(),
                units: self.units_2.as_deref(),
                price: self.price_2.as_deref(),
            },
        ]
    }

    pub(crate) fn officer_ids(&self) -> Vec<String> {
        self.officers
            .as_deref()
            .map(|raw| {
                raw.split([',', ';'])
                    .map(str::trim)
                    .filter(|id| !id.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }
}

pub(crate) struct FlatColumns<'a> {
    pub(crate) label: Option<&'a str>,
    pub(crate) units: Option<&'a str>,
    pub(crate) price: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApplicantRow {
    #[serde(rename = "Name")]
    pub(crate) name: String,
    #[serde(rename = "NRIC")]
    pub(crate) nric: String,
    #[serde(rename = "Age")]
    pub(crate) age: String,
    #[serde(rename = "Marital Status")]
    pub(crate) marital_status: String,
}

pub(crate) fn parse_rows<R, T>(reader: R) -> Result<Vec<T>, csv::Error>
where
    R: Read,
    T: for<'de> Deserialize<'de>,
{
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    csv_reader.deserialize::<T>().collect()
}

/// Accepts ISO dates and the `M/D/YYYY` form spreadsheets export.
pub(crate) fn parse_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(trimmed, "%m/%d/%Y"))
        .ok()
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.and_then(|raw| {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    }))
}
