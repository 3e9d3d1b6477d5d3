//! Filter Engine
//!
//! Reduces the full record list to the visible subset for a view.
//! Filtering is a pure function of (records, predicate); nothing is cached.

use super::types::DatasetRecord;
use serde::Serialize;

/// Organisation selector of a filter predicate
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase", tag = "kind", content = "name")]
pub enum OrganisationFilter {
    /// Match every organisation
    #[default]
    All,
    /// Match records whose organisation equals this name exactly
    Exactly(String),
}

impl OrganisationFilter {
    /// Build a selector from user input, where `None` or "all" selects everything
    pub fn from_input(input: Option<&str>) -> Self {
        match input.map(str::trim) {
            None | Some("") => Self::All,
            Some(s) if s.eq_ignore_ascii_case("all") => Self::All,
            Some(s) => Self::Exactly(s.to_string()),
        }
    }

    fn matches(&self, organisation: Option<&str>) -> bool {
        match self {
            Self::All => true,
            Self::Exactly(name) => organisation.map(str::trim) == Some(name.as_str()),
        }
    }
}

/// Transient combination of a search text and an organisation selector
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FilterPredicate {
    /// Case-insensitive substring matched against the title
    pub search: String,
    /// Organisation selector
    pub organisation: OrganisationFilter,
}

impl FilterPredicate {
    /// Predicate that keeps every record
    pub fn all() -> Self {
        Self::default()
    }

    /// Builder method: set the search text
    pub fn search(mut self, search: impl Into<String>) -> Self {
        self.search = search.into();
        self
    }

    /// Builder method: restrict to one organisation
    pub fn organisation(mut self, organisation: impl Into<String>) -> Self {
        self.organisation = OrganisationFilter::Exactly(organisation.into());
        self
    }

    /// Whether this predicate keeps everything
    pub fn is_match_all(&self) -> bool {
        self.search.is_empty() && self.organisation == OrganisationFilter::All
    }

    /// Check a single record against the predicate
    pub fn matches(&self, record: &DatasetRecord) -> bool {
        let needle = self.search.to_lowercase();
        matches_with(record, &needle, &self.organisation)
    }
}

fn matches_with(record: &DatasetRecord, needle: &str, organisation: &OrganisationFilter) -> bool {
    let title_matches = needle.is_empty() || record.title.to_lowercase().contains(needle);
    title_matches && organisation.matches(record.organisation.as_deref())
}

/// Return the records matching `predicate`, preserving their relative order
pub fn filter_records<'a>(
    records: &'a [DatasetRecord],
    predicate: &FilterPredicate,
) -> Vec<&'a DatasetRecord> {
    let needle = predicate.search.to_lowercase();
    records
        .iter()
        .filter(|record| matches_with(record, &needle, &predicate.organisation))
        .collect()
}

/// Distinct organisation names for the selector, sorted alphabetically
///
/// Missing, blank and unspecified organisations are left out, the same set
/// the organisation ranking ignores.
pub fn unique_organisations(records: &[DatasetRecord]) -> Vec<String> {
    let mut orgs: Vec<String> = records
        .iter()
        .filter_map(DatasetRecord::known_organisation)
        .map(str::to_string)
        .collect();
    orgs.sort();
    orgs.dedup();
    orgs
}
