//! # ecocat
//!
//! Environmental Dataset Catalogue - browse, filter, chart and export a
//! catalogue of environmental datasets served by a remote REST/GraphQL backend.
//!
//! ## Modules
//!
//! - [`catalog`]: dataset records and the filter engine
//! - [`aggregate`]: pure summaries (themes, sources, top organisations, years, seasons)
//! - [`chart`]: chart specifications and off-screen rasterization
//! - [`export`]: A4 PDF reports
//! - [`client`]: typed backend client
//! - [`session`]: persisted login, state slices and the route gate
//! - [`graphql`]: free-form GraphQL queries
//! - [`views`]: table / JSON / CSV renderings
//! - [`config`]: TOML configuration with environment overrides
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use ecocat::*;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load_default();
//!     let backend = Arc::new(CatalogClient::new(config.client_config())?);
//!     let store = AppStore::new(backend, TokenStore::new(config.data_dir()));
//!
//!     store.login(&Credentials::new("alice", "s3cret")?).await?;
//!     let records = store.fetch_datasets().await?;
//!
//!     let predicate = FilterPredicate::all().search("eau");
//!     let visible = filter_records(&records, &predicate);
//!     let summary = StatisticsSummary::compute_now(&visible, &config.categories);
//!
//!     let exporter = Exporter::new(config.export_config());
//!     let path = exporter.export(&statistics_report("Catalogue", &summary))?;
//!     println!("Report written to {}", path.display());
//!     Ok(())
//! }
//! ```

pub mod aggregate;
pub mod catalog;
pub mod chart;
pub mod client;
pub mod config;
pub mod export;
pub mod graphql;
pub mod session;
pub mod views;

// Re-export top-level types for convenience
pub use catalog::{
    filter_records, unique_organisations, DatasetRecord, FilterPredicate, OrganisationFilter,
    UNSPECIFIED_ORGANISATION,
};

pub use aggregate::{CategoryRule, LabelCount, RankedGroup, Season, StatisticsSummary};

pub use chart::{dashboard_charts, render_chart, statistics_charts, ChartKind, ChartSpec, RasterOptions};

pub use export::{
    dashboard_report, dataset_sheet, statistics_report, ExportConfig, ExportError, ExportResult,
    Exporter, Report, ReportKind,
};

pub use client::{
    CatalogBackend, CatalogClient, ClientConfig, ClientError, ClientResult, Credentials,
    ProfileUpdate, Registration, UserProfile, ValidationError,
};

pub use session::{
    Action, AppStore, AuthState, DataState, Resolution, Route, SessionError, SessionGate,
    SessionResult, TokenStore,
};

pub use graphql::{QueryError, QueryNode, QueryOutcome, QueryResult, DEFAULT_QUERY};

pub use views::{OutputFormat, ViewError};

pub use config::{generate_default_config, Config, ConfigError, LoggingConfig};
