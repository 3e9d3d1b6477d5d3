//! Report contents
//!
//! A report is a title, a generation timestamp and an ordered list of
//! sections. Builders here assemble the three downloadable documents from the
//! same summaries the text views use.

use chrono::{DateTime, Utc};

use crate::aggregate::StatisticsSummary;
use crate::catalog::{DatasetRecord, FilterPredicate, OrganisationFilter};
use crate::chart::{dashboard_charts, statistics_charts, ChartSpec};

/// Which document is being produced; decides the file name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportKind {
    Dashboard,
    Statistics,
    DatasetSheet(i64),
}

impl ReportKind {
    /// Fixed download name
    pub fn filename(&self) -> String {
        match self {
            ReportKind::Dashboard => "dashboard-report.pdf".to_string(),
            ReportKind::Statistics => "statistics-report.pdf".to_string(),
            ReportKind::DatasetSheet(id) => format!("dataset-{}-sheet.pdf", id),
        }
    }
}

/// One block of report content
#[derive(Debug, Clone, PartialEq)]
pub enum Section {
    /// A chart rendered to a bitmap, followed by its legend
    Chart(ChartSpec),
    /// A heading and paragraphs of plain text
    Text { heading: String, lines: Vec<String> },
}

/// A document ready for the export pipeline
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub kind: ReportKind,
    pub title: String,
    pub generated_at: DateTime<Utc>,
    pub sections: Vec<Section>,
}

impl Report {
    pub fn new(kind: ReportKind, title: impl Into<String>) -> Self {
        Self {
            kind,
            title: title.into(),
            generated_at: Utc::now(),
            sections: Vec::new(),
        }
    }

    /// Builder method: pin the generation timestamp
    pub fn generated_at(mut self, at: DateTime<Utc>) -> Self {
        self.generated_at = at;
        self
    }

    /// Builder method: append a section
    pub fn section(mut self, section: Section) -> Self {
        self.sections.push(section);
        self
    }

    /// Builder method: append a text section
    pub fn text(self, heading: impl Into<String>, lines: Vec<String>) -> Self {
        self.section(Section::Text {
            heading: heading.into(),
            lines,
        })
    }

    /// Header line under the title
    pub fn subtitle(&self) -> String {
        format!(
            "Generated on {}",
            self.generated_at.format("%Y-%m-%d %H:%M UTC")
        )
    }

    pub fn chart_count(&self) -> usize {
        self.sections
            .iter()
            .filter(|s| matches!(s, Section::Chart(_)))
            .count()
    }
}

/// Human-readable description of the active filters
pub fn describe_filter(predicate: &FilterPredicate) -> String {
    let search = if predicate.search.is_empty() {
        "any title".to_string()
    } else {
        format!("title contains \"{}\"", predicate.search)
    };
    let organisation = match &predicate.organisation {
        OrganisationFilter::All => "all organisations".to_string(),
        OrganisationFilter::Exactly(name) => format!("organisation = {}", name),
    };
    format!("{}; {}", search, organisation)
}

/// Dashboard: filters, overview charts and the visible record titles
pub fn dashboard_report(
    title: &str,
    predicate: &FilterPredicate,
    visible: &[&DatasetRecord],
    summary: &StatisticsSummary,
) -> Report {
    let overview = vec![
        format!("Filters: {}", describe_filter(predicate)),
        format!("{} result(s)", visible.len()),
    ];

    let listing: Vec<String> = if visible.is_empty() {
        vec!["No dataset matches the current filters.".to_string()]
    } else {
        visible
            .iter()
            .map(|r| {
                format!(
                    "#{} {} ({})",
                    r.id,
                    r.title,
                    r.organisation.as_deref().unwrap_or("Not specified")
                )
            })
            .collect()
    };

    let report = Report::new(ReportKind::Dashboard, format!("{} - Dashboard", title))
        .text("Overview", overview);

    dashboard_charts(summary)
        .into_iter()
        .fold(report, |report, chart| report.section(Section::Chart(chart)))
        .text("Datasets", listing)
}

/// Statistics page: every chart
pub fn statistics_report(title: &str, summary: &StatisticsSummary) -> Report {
    let overview = vec![
        format!("Datasets: {}", summary.total_records),
        format!("Datasets with a creation date: {}", summary.dated_records),
    ];

    let report = Report::new(ReportKind::Statistics, format!("{} - Statistics", title))
        .text("Overview", overview);

    statistics_charts(summary)
        .into_iter()
        .fold(report, |report, chart| report.section(Section::Chart(chart)))
}

/// Detail sheet for one record
pub fn dataset_sheet(record: &DatasetRecord) -> Report {
    let na = |value: Option<String>| value.unwrap_or_else(|| "N/A".to_string());

    let fields = vec![
        format!("Identifier: {}", record.id),
        format!(
            "Organisation: {}",
            na(record.organisation.clone())
        ),
        format!("Source catalogue: {}", na(record.source_catalogue.clone())),
        format!("Source URL: {}", na(record.source_url.clone())),
        format!(
            "Created: {}",
            na(record.created_on().map(|d| d.format("%Y-%m-%d").to_string()))
        ),
        format!(
            "Modified: {}",
            na(record.modified_on().map(|d| d.format("%Y-%m-%d").to_string()))
        ),
    ];

    let description = record
        .description
        .clone()
        .filter(|d| !d.trim().is_empty())
        .unwrap_or_else(|| "No description available.".to_string());

    Report::new(ReportKind::DatasetSheet(record.id), record.title.clone())
        .text("Details", fields)
        .text("Description", vec![description])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::default_category_rules;

    fn records() -> Vec<DatasetRecord> {
        vec![
            DatasetRecord::new(1, "Qualité de l'eau")
                .organisation("MELCC")
                .created("2020-01-15"),
            DatasetRecord::new(2, "Inventaire forestier").organisation("MFFP"),
        ]
    }

    #[test]
    fn test_filenames_are_fixed() {
        assert_eq!(ReportKind::Dashboard.filename(), "dashboard-report.pdf");
        assert_eq!(ReportKind::Statistics.filename(), "statistics-report.pdf");
        assert_eq!(ReportKind::DatasetSheet(7).filename(), "dataset-7-sheet.pdf");
    }

    #[test]
    fn test_dashboard_report_layout() {
        let records = records();
        let visible: Vec<&DatasetRecord> = records.iter().collect();
        let summary = StatisticsSummary::compute(&visible, &default_category_rules(), 2024);
        let predicate = FilterPredicate::all().search("eau");

        let report = dashboard_report("Ecocat", &predicate, &visible, &summary);
        assert_eq!(report.kind, ReportKind::Dashboard);
        assert_eq!(report.chart_count(), 2);
        assert_eq!(report.sections.len(), 4);

        match &report.sections[0] {
            Section::Text { lines, .. } => {
                assert_eq!(lines[0], "Filters: title contains \"eau\"; all organisations");
                assert_eq!(lines[1], "2 result(s)");
            }
            other => panic!("unexpected section {:?}", other),
        }
    }

    #[test]
    fn test_statistics_report_has_all_charts() {
        let records = records();
        let visible: Vec<&DatasetRecord> = records.iter().collect();
        let summary = StatisticsSummary::compute(&visible, &default_category_rules(), 2024);
        let report = statistics_report("Ecocat", &summary);
        assert_eq!(report.chart_count(), 5);
    }

    #[test]
    fn test_dataset_sheet_placeholders() {
        let record = DatasetRecord::new(3, "Relevés").created("bogus");
        let report = dataset_sheet(&record);
        assert_eq!(report.kind, ReportKind::DatasetSheet(3));

        let Section::Text { lines, .. } = &report.sections[0] else {
            panic!("expected details section");
        };
        assert!(lines.contains(&"Organisation: N/A".to_string()));
        assert!(lines.contains(&"Created: N/A".to_string()));

        let Section::Text { lines, .. } = &report.sections[1] else {
            panic!("expected description section");
        };
        assert_eq!(lines, &vec!["No description available.".to_string()]);
    }

    #[test]
    fn test_describe_filter_organisation() {
        let predicate = FilterPredicate::all().organisation("MFFP");
        assert_eq!(describe_filter(&predicate), "any title; organisation = MFFP");
    }
}
