//! Core data types for the dataset catalogue
//!
//! This module defines the records the backend hands out:
//! - `DatasetRecord`: one harvested environmental dataset
//! - `UNSPECIFIED_ORGANISATION`: the backend's placeholder organisation
//!
//! Records are read-only on the client side. Timestamps are kept exactly as
//! received and parsed on demand, so a malformed date never prevents a record
//! from being listed.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize};

/// Organisation label the harvester assigns when the source did not name one
pub const UNSPECIFIED_ORGANISATION: &str = "Organisation non spécifiée";

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// A single dataset harvested from an external catalogue
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DatasetRecord {
    /// Unique identifier assigned by the backend
    pub id: i64,
    /// Dataset title; empty when the backend sent none
    #[serde(rename = "titre", default, deserialize_with = "null_as_empty")]
    pub title: String,
    /// Free-form description
    #[serde(default)]
    pub description: Option<String>,
    /// Publishing organisation (may be the unspecified sentinel)
    #[serde(default)]
    pub organisation: Option<String>,
    /// Name of the catalogue the record was harvested from
    #[serde(rename = "source_catalogue", default)]
    pub source_catalogue: Option<String>,
    /// Link to the dataset on its source catalogue
    #[serde(rename = "url_source", default)]
    pub source_url: Option<String>,
    /// Creation timestamp at source, as received
    #[serde(rename = "date_creation_source", default)]
    pub created_at_source: Option<String>,
    /// Modification timestamp at source, as received
    #[serde(rename = "date_modification_source", default)]
    pub modified_at_source: Option<String>,
}

impl DatasetRecord {
    /// Create a record with only an id and a title
    pub fn new(id: i64, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            description: None,
            organisation: None,
            source_catalogue: None,
            source_url: None,
            created_at_source: None,
            modified_at_source: None,
        }
    }

    /// Builder method: set the organisation
    pub fn organisation(mut self, organisation: impl Into<String>) -> Self {
        self.organisation = Some(organisation.into());
        self
    }

    /// Builder method: set the description
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Builder method: set the source catalogue name
    pub fn source(mut self, catalogue: impl Into<String>) -> Self {
        self.source_catalogue = Some(catalogue.into());
        self
    }

    /// Builder method: set the source URL
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.source_url = Some(url.into());
        self
    }

    /// Builder method: set the creation timestamp string
    pub fn created(mut self, timestamp: impl Into<String>) -> Self {
        self.created_at_source = Some(timestamp.into());
        self
    }

    /// Builder method: set the modification timestamp string
    pub fn modified(mut self, timestamp: impl Into<String>) -> Self {
        self.modified_at_source = Some(timestamp.into());
        self
    }

    /// Creation date at source, if present and parsable
    pub fn created_on(&self) -> Option<NaiveDate> {
        self.created_at_source.as_deref().and_then(parse_source_date)
    }

    /// Modification date at source, if present and parsable
    pub fn modified_on(&self) -> Option<NaiveDate> {
        self.modified_at_source.as_deref().and_then(parse_source_date)
    }

    /// Organisation name, unless missing, blank or the unspecified sentinel
    pub fn known_organisation(&self) -> Option<&str> {
        self.organisation
            .as_deref()
            .map(str::trim)
            .filter(|org| !org.is_empty() && *org != UNSPECIFIED_ORGANISATION)
    }
}

/// Parse a backend timestamp into a calendar date
///
/// Accepts RFC 3339, naive ISO date-times and plain `YYYY-MM-DD` dates.
pub fn parse_source_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.date_naive());
    }

    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, format) {
            return Some(dt.date());
        }
    }

    NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_backend_record() {
        let json = r#"{
            "id": 42,
            "titre": "Qualité de l'eau des rivières",
            "description": "Mesures mensuelles",
            "organisation": "Ministère de l'Environnement",
            "source_catalogue": "Données Québec",
            "url_source": "https://example.org/42",
            "date_creation_source": "2020-01-15T08:30:00Z",
            "date_modification_source": null
        }"#;

        let record: DatasetRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.id, 42);
        assert_eq!(record.title, "Qualité de l'eau des rivières");
        assert_eq!(record.source_catalogue.as_deref(), Some("Données Québec"));
        assert_eq!(record.created_on(), NaiveDate::from_ymd_opt(2020, 1, 15));
        assert_eq!(record.modified_on(), None);
    }

    #[test]
    fn test_missing_optional_fields() {
        let record: DatasetRecord = serde_json::from_str(r#"{"id": 1, "titre": "Air"}"#).unwrap();
        assert!(record.description.is_none());
        assert!(record.organisation.is_none());
        assert!(record.created_on().is_none());
    }

    #[test]
    fn test_null_title_is_empty() {
        let json = r#"[{"id": 1, "titre": "Eau"}, {"id": 2, "titre": null, "organisation": "MELCC"}]"#;
        let records: Vec<DatasetRecord> = serde_json::from_str(json).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].title, "");
        assert_eq!(records[1].organisation.as_deref(), Some("MELCC"));

        let record: DatasetRecord = serde_json::from_str(r#"{"id": 3}"#).unwrap();
        assert_eq!(record.title, "");
    }

    #[test]
    fn test_parse_source_date_formats() {
        let expected = NaiveDate::from_ymd_opt(2021, 3, 10);
        assert_eq!(parse_source_date("2021-03-10"), expected);
        assert_eq!(parse_source_date("2021-03-10T12:00:00"), expected);
        assert_eq!(parse_source_date("2021-03-10T12:00:00.123456"), expected);
        assert_eq!(parse_source_date("2021-03-10T12:00:00+02:00"), expected);
        assert_eq!(parse_source_date("2021-03-10 12:00:00"), expected);
        assert_eq!(parse_source_date("not a date"), None);
        assert_eq!(parse_source_date("   "), None);
    }

    #[test]
    fn test_known_organisation() {
        let record = DatasetRecord::new(1, "x").organisation(UNSPECIFIED_ORGANISATION);
        assert_eq!(record.known_organisation(), None);

        let record = DatasetRecord::new(2, "x").organisation("  ");
        assert_eq!(record.known_organisation(), None);

        let record = DatasetRecord::new(3, "x").organisation("Environnement Canada");
        assert_eq!(record.known_organisation(), Some("Environnement Canada"));
    }
}
