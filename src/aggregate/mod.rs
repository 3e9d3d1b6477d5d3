//! Aggregator
//!
//! Pure functions deriving chart-ready summaries from a (filtered) list of
//! dataset records. Identical input, including order, always yields identical
//! output.
//!
//! ## Summaries
//!
//! - [`count_by_category`]: keyword themes, multi-match, catch-all "Other"
//! - [`top_organisations`]: top 5 publishers, sentinel excluded
//! - [`count_by_source`]: records per source catalogue
//! - [`count_by_year`]: creation year histogram, ascending
//! - [`count_by_season`]: four fixed seasonal buckets

mod categories;
mod ranking;
mod timeline;

pub use categories::{count_by_category, default_category_rules, CategoryRule, OTHER_CATEGORY};
pub use ranking::{
    count_by_source, top_organisations, truncate_label, RankedGroup, LABEL_PREFIX_LEN, TOP_N,
    UNKNOWN_SOURCE,
};
pub use timeline::{
    count_by_season, count_by_year, Season, SeasonCount, YearCount, MIN_YEAR_EXCLUSIVE,
};

use chrono::{Datelike, Utc};
use serde::Serialize;

use crate::catalog::DatasetRecord;

/// A label with its record count
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct LabelCount {
    pub label: String,
    pub count: u64,
}

impl LabelCount {
    pub fn new(label: impl Into<String>, count: u64) -> Self {
        Self {
            label: label.into(),
            count,
        }
    }
}

/// Every summary the statistics and dashboard views need
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct StatisticsSummary {
    /// Number of records summarized
    pub total_records: usize,
    /// Records with a parsable creation date
    pub dated_records: usize,
    pub categories: Vec<LabelCount>,
    pub sources: Vec<LabelCount>,
    pub top_organisations: Vec<RankedGroup>,
    pub years: Vec<YearCount>,
    pub seasons: Vec<SeasonCount>,
}

impl StatisticsSummary {
    /// Summarize `records` against an explicit current year
    pub fn compute(records: &[&DatasetRecord], rules: &[CategoryRule], current_year: i32) -> Self {
        let records = records.iter().copied();

        Self {
            total_records: records.len(),
            dated_records: records.clone().filter(|r| r.created_on().is_some()).count(),
            categories: count_by_category(records.clone(), rules),
            sources: count_by_source(records.clone()),
            top_organisations: top_organisations(records.clone()),
            years: count_by_year(records.clone(), current_year),
            seasons: count_by_season(records),
        }
    }

    /// Summarize `records` using today's year as the upper bound
    pub fn compute_now(records: &[&DatasetRecord], rules: &[CategoryRule]) -> Self {
        Self::compute(records, rules, Utc::now().year())
    }
}
