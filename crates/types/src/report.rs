//! The report record handed to the compositor by a report store.
//!
//! The compositor treats a record as read-only input. Every optional field has
//! a rendering fallback, so a sparse record still produces a full document.

use crate::ids::ResourceUri;
use crate::redline::RedlineOffset;
use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize, Serializer, de};

/// Text rendered wherever a value is missing.
pub const NOT_AVAILABLE: &str = "N/A";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReportRecord {
    pub id: String,
    pub site_code: String,
    pub site_name: String,
    pub region: String,
    pub job_number: String,
    pub customer: Option<String>,
    pub engineer: Option<String>,
    pub inspection_date: Option<NaiveDate>,
    pub front_images: Vec<ResourceUri>,
    pub signature_image: Option<ResourceUri>,
    pub scope_of_work: Vec<String>,
    pub antennas: Vec<AntennaRow>,
    pub transmission_lines: Vec<TransmissionLineRow>,
    pub deficiencies: Vec<Deficiency>,
    pub checklist: Vec<ChecklistRow>,
    pub appendices: Vec<Appendix>,
    pub redline: RedlineOffset,
    /// A PDF of redline drawings to merge into the generated document.
    pub redline_document: Option<ResourceUri>,
}

impl ReportRecord {
    pub fn engineer_name(&self) -> &str {
        non_blank(self.engineer.as_deref()).unwrap_or(NOT_AVAILABLE)
    }

    pub fn customer_name(&self) -> &str {
        non_blank(self.customer.as_deref()).unwrap_or(NOT_AVAILABLE)
    }

    pub fn display_date(&self) -> String {
        self.inspection_date
            .map(|d| d.format("%B %-d, %Y").to_string())
            .unwrap_or_else(|| NOT_AVAILABLE.to_string())
    }

    pub fn title_cased_site_name(&self) -> String {
        title_case(&self.site_name)
    }

    /// Front images that actually name something.
    pub fn usable_front_images(&self) -> impl Iterator<Item = &ResourceUri> {
        self.front_images.iter().filter(|uri| !uri.is_blank())
    }
}

/// Uppercases the first letter of each whitespace-separated word and
/// lowercases the rest.
pub fn title_case(s: &str) -> String {
    s.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(char::to_lowercase))
                    .collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn non_blank(s: Option<&str>) -> Option<&str> {
    s.map(str::trim).filter(|s| !s.is_empty())
}

/// Renders an optional cell value, substituting `N/A`.
pub fn cell(value: &Option<String>) -> String {
    non_blank(value.as_deref())
        .unwrap_or(NOT_AVAILABLE)
        .to_string()
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AntennaRow {
    pub sector: Option<String>,
    pub position: Option<String>,
    pub carrier: Option<String>,
    pub model: Option<String>,
    pub height: Option<String>,
    pub azimuth: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TransmissionLineRow {
    pub size: Option<String>,
    pub count: Option<String>,
    pub carrier: Option<String>,
    pub location: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Deficiency {
    pub description: String,
    pub location: Option<String>,
    pub severity: Option<String>,
    pub photos: Vec<ResourceUri>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ChecklistRow {
    pub item: String,
    pub status: ChecklistStatus,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Appendix {
    pub title: String,
    pub notes: Vec<String>,
    pub images: Vec<ResourceUri>,
}

/// A checklist flag that may be explicitly unset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ChecklistStatus {
    Yes,
    No,
    #[default]
    Unset,
}

impl ChecklistStatus {
    pub fn label(self) -> &'static str {
        match self {
            ChecklistStatus::Yes => "Yes",
            ChecklistStatus::No => "No",
            ChecklistStatus::Unset => NOT_AVAILABLE,
        }
    }
}

impl Serialize for ChecklistStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ChecklistStatus::Yes => serializer.serialize_bool(true),
            ChecklistStatus::No => serializer.serialize_bool(false),
            ChecklistStatus::Unset => serializer.serialize_none(),
        }
    }
}

impl<'de> Deserialize<'de> for ChecklistStatus {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Flag(bool),
            Text(String),
        }

        match Option::<Raw>::deserialize(deserializer)? {
            None => Ok(ChecklistStatus::Unset),
            Some(Raw::Flag(true)) => Ok(ChecklistStatus::Yes),
            Some(Raw::Flag(false)) => Ok(ChecklistStatus::No),
            Some(Raw::Text(text)) => match text.trim().to_ascii_lowercase().as_str() {
                "yes" | "y" | "true" => Ok(ChecklistStatus::Yes),
                "no" | "n" | "false" => Ok(ChecklistStatus::No),
                "" | "unset" | "n/a" | "na" | "null" => Ok(ChecklistStatus::Unset),
                other => Err(de::Error::invalid_value(
                    de::Unexpected::Str(other),
                    &"yes, no or unset",
                )),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sparse_record_deserializes_with_defaults() {
        let record: ReportRecord =
            serde_json::from_str(r#"{"id":"r1","siteCode":"TX-001"}"#).unwrap();
        assert_eq!(record.site_code, "TX-001");
        assert!(record.front_images.is_empty());
        assert_eq!(record.engineer_name(), NOT_AVAILABLE);
        assert_eq!(record.display_date(), NOT_AVAILABLE);
        assert!(record.redline.is_noop());
    }

    #[test]
    fn checklist_status_accepts_tri_state_inputs() {
        let rows: Vec<ChecklistRow> = serde_json::from_str(
            r#"[
                {"item":"a","status":true},
                {"item":"b","status":false},
                {"item":"c","status":null},
                {"item":"d"},
                {"item":"e","status":"N/A"},
                {"item":"f","status":"yes"}
            ]"#,
        )
        .unwrap();
        let statuses: Vec<_> = rows.iter().map(|r| r.status).collect();
        assert_eq!(
            statuses,
            vec![
                ChecklistStatus::Yes,
                ChecklistStatus::No,
                ChecklistStatus::Unset,
                ChecklistStatus::Unset,
                ChecklistStatus::Unset,
                ChecklistStatus::Yes,
            ]
        );
        assert_eq!(ChecklistStatus::Unset.label(), "N/A");
    }

    #[test]
    fn checklist_status_rejects_garbage() {
        let result: Result<ChecklistRow, _> =
            serde_json::from_str(r#"{"item":"x","status":"maybe"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn title_case_normalizes_words() {
        assert_eq!(title_case("TOWER hill   north"), "Tower Hill North");
        assert_eq!(title_case(""), "");
    }

    #[test]
    fn blank_engineer_falls_back() {
        let record = ReportRecord {
            engineer: Some("   ".into()),
            ..Default::default()
        };
        assert_eq!(record.engineer_name(), NOT_AVAILABLE);
    }

    #[test]
    fn date_is_formatted_long_form() {
        let record = ReportRecord {
            inspection_date: NaiveDate::from_ymd_opt(2024, 3, 7),
            ..Default::default()
        };
        assert_eq!(record.display_date(), "March 7, 2024");
    }
}
