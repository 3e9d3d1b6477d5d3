//! Dataset catalogue model
//!
//! - [`types`]: the `DatasetRecord` returned by the backend
//! - [`filter`]: the filter engine behind list, dashboard and statistics views

pub mod filter;
pub mod types;

pub use filter::{filter_records, unique_organisations, FilterPredicate, OrganisationFilter};
pub use types::{parse_source_date, DatasetRecord, UNSPECIFIED_ORGANISATION};
