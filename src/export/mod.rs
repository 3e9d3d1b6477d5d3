//! Export Pipeline
//!
//! Turns a [`Report`] into a PDF on disk:
//!
//! 1. each chart is drawn into its own off-screen bitmap at 2x
//! 2. bitmaps are fitted into the A4 content box and flowed onto pages
//! 3. the document is written next to its final name and renamed into place
//!
//! An [`Exporter`] runs one export at a time.

pub mod error;
pub mod layout;
pub mod pdf;
pub mod report;

pub use error::{ExportError, ExportResult};
pub use layout::PageGeometry;
pub use pdf::{build_document, plan_document, DocumentPlan};
pub use report::{dashboard_report, dataset_sheet, statistics_report, Report, ReportKind, Section};

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use tracing::{error, info, info_span};
use uuid::Uuid;

use crate::chart::RasterOptions;

/// Export configuration
#[derive(Debug, Clone)]
pub struct ExportConfig {
    /// Directory reports are written to
    pub output_dir: PathBuf,
    pub raster: RasterOptions,
    pub geometry: PageGeometry,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
            raster: RasterOptions::default(),
            geometry: PageGeometry::a4(),
        }
    }
}

/// Held while an export runs; releases the guard on drop
struct ExportTicket<'a> {
    flag: &'a AtomicBool,
}

impl Drop for ExportTicket<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// Produces report files, one at a time
pub struct Exporter {
    config: ExportConfig,
    in_flight: AtomicBool,
}

impl Exporter {
    pub fn new(config: ExportConfig) -> Self {
        Self {
            config,
            in_flight: AtomicBool::new(false),
        }
    }

    pub fn config(&self) -> &ExportConfig {
        &self.config
    }

    /// Whether an export is currently running
    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    fn acquire(&self) -> ExportResult<ExportTicket<'_>> {
        self.in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| ExportError::AlreadyRunning)?;
        Ok(ExportTicket {
            flag: &self.in_flight,
        })
    }

    /// Render and write a report, returning the path of the written file
    pub fn export(&self, report: &Report) -> ExportResult<PathBuf> {
        let _ticket = self.acquire()?;

        let job_id = Uuid::new_v4();
        let span = info_span!("export", %job_id, kind = ?report.kind);
        let _enter = span.enter();

        let started = Instant::now();
        let target = self.config.output_dir.join(report.kind.filename());

        let result = build_document(report, self.config.raster, self.config.geometry)
            .and_then(|bytes| write_atomically(&target, &bytes).map(|_| bytes.len()));

        match result {
            Ok(bytes) => {
                info!(
                    path = %target.display(),
                    bytes,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Report exported"
                );
                Ok(target)
            }
            Err(e) => {
                error!(error = %e, "Report export failed");
                Err(e)
            }
        }
    }
}

/// Write `bytes` to a `.part` sibling of `target`, then rename it over `target`
fn write_atomically(target: &Path, bytes: &[u8]) -> ExportResult<()> {
    if let Some(parent) = target.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let mut partial = target.as_os_str().to_owned();
    partial.push(".part");
    let partial = PathBuf::from(partial);

    if let Err(e) = std::fs::write(&partial, bytes) {
        let _ = std::fs::remove_file(&partial);
        return Err(e.into());
    }
    if let Err(e) = std::fs::rename(&partial, target) {
        let _ = std::fs::remove_file(&partial);
        return Err(e.into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::{ChartKind, ChartSpec};
    use tempfile::TempDir;

    fn exporter(dir: &Path) -> Exporter {
        Exporter::new(ExportConfig {
            output_dir: dir.to_path_buf(),
            ..Default::default()
        })
    }

    fn sample_report() -> Report {
        let chart = ChartSpec::new(ChartKind::Bar, "Top 5 organisations", "Number of datasets")
            .point("MELCC", "MELCC: 4", 4.0)
            .point("MFFP", "MFFP: 2", 2.0);
        Report::new(ReportKind::Dashboard, "Ecocat - Dashboard")
            .text("Overview", vec!["2 result(s)".to_string()])
            .section(Section::Chart(chart))
    }

    #[test]
    fn test_export_writes_fixed_filename() {
        let temp = TempDir::new().unwrap();
        let exporter = exporter(temp.path());

        let path = exporter.export(&sample_report()).unwrap();
        assert_eq!(path, temp.path().join("dashboard-report.pdf"));

        let bytes = std::fs::read(&path).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
        assert!(!temp.path().join("dashboard-report.pdf.part").exists());
        assert!(!exporter.is_busy());
    }

    #[test]
    fn test_export_creates_output_dir() {
        let temp = TempDir::new().unwrap();
        let nested = temp.path().join("reports").join("2024");
        let exporter = exporter(&nested);

        let report = Report::new(ReportKind::DatasetSheet(12), "Relevés")
            .text("Details", vec!["Identifier: 12".to_string()]);
        let path = exporter.export(&report).unwrap();
        assert_eq!(path, nested.join("dataset-12-sheet.pdf"));
        assert!(path.exists());
    }

    #[test]
    fn test_second_export_rejected_while_in_flight() {
        let temp = TempDir::new().unwrap();
        let exporter = exporter(temp.path());

        let ticket = exporter.acquire().unwrap();
        assert!(exporter.is_busy());
        let err = exporter.export(&sample_report()).unwrap_err();
        assert!(matches!(err, ExportError::AlreadyRunning));
        assert!(!temp.path().join("dashboard-report.pdf").exists());

        drop(ticket);
        assert!(!exporter.is_busy());
        assert!(exporter.export(&sample_report()).is_ok());
    }

    #[test]
    fn test_guard_released_after_failure() {
        let temp = TempDir::new().unwrap();
        let exporter = Exporter::new(ExportConfig {
            output_dir: temp.path().to_path_buf(),
            raster: RasterOptions {
                width: 0,
                height: 300,
                oversampling: 2,
            },
            ..Default::default()
        });

        let err = exporter.export(&sample_report()).unwrap_err();
        assert!(matches!(err, ExportError::Raster(_)));
        assert!(!exporter.is_busy());
        assert!(!temp.path().join("dashboard-report.pdf").exists());
    }

    #[test]
    fn test_existing_file_is_replaced() {
        let temp = TempDir::new().unwrap();
        let target = temp.path().join("statistics-report.pdf");
        std::fs::write(&target, b"stale").unwrap();

        let exporter = exporter(temp.path());
        let report = Report::new(ReportKind::Statistics, "Stats");
        exporter.export(&report).unwrap();

        let bytes = std::fs::read(&target).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }
}
