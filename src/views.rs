//! Text views
//!
//! Every command renders into a `String` in one of three formats so the
//! binary only has to print. Tables are aligned on character counts, CSV goes
//! through the `csv` writer, JSON is pretty-printed.

use serde::Serialize;
use thiserror::Error;

use crate::aggregate::{truncate_label, StatisticsSummary};
use crate::catalog::DatasetRecord;
use crate::chart::{ChartKind, ChartSpec};
use crate::client::UserProfile;
use crate::graphql::QueryOutcome;

/// Organisation column width in the list view
pub const ORGANISATION_WIDTH: usize = 30;

/// Bar width of text charts
const BAR_WIDTH: usize = 40;

const NOT_SPECIFIED: &str = "Not specified";

/// Output format of a view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
    Csv,
}

#[derive(Error, Debug)]
pub enum ViewError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Output is not valid UTF-8")]
    Utf8(#[from] std::string::FromUtf8Error),
}

pub type ViewResult<T> = Result<T, ViewError>;

/// Align rows under headers
pub fn format_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate().take(widths.len()) {
            widths[i] = widths[i].max(cell.chars().count());
        }
    }

    let line = |cells: Vec<&str>| -> String {
        cells
            .iter()
            .zip(&widths)
            .map(|(cell, width)| {
                let pad = width.saturating_sub(cell.chars().count());
                format!("{}{}", cell, " ".repeat(pad))
            })
            .collect::<Vec<_>>()
            .join(" | ")
            .trim_end()
            .to_string()
    };

    let mut out = String::new();
    out.push_str(&line(headers.to_vec()));
    out.push('\n');
    let total: usize = widths.iter().sum::<usize>() + 3 * widths.len().saturating_sub(1);
    out.push_str(&"-".repeat(total));
    out.push('\n');
    for row in rows {
        out.push_str(&line(row.iter().map(String::as_str).collect()));
        out.push('\n');
    }
    out
}

/// Write rows as CSV with a header line
pub fn format_csv(headers: &[&str], rows: &[Vec<String>]) -> ViewResult<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(headers)?;
    for row in rows {
        writer.write_record(row)?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| csv::Error::from(e.into_error()))?;
    Ok(String::from_utf8(bytes)?)
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> ViewResult<String> {
    Ok(format!("{}\n", serde_json::to_string_pretty(value)?))
}

fn organisation_cell(record: &DatasetRecord) -> String {
    match record.organisation.as_deref() {
        Some(org) if !org.trim().is_empty() => truncate_label(org, ORGANISATION_WIDTH),
        _ => NOT_SPECIFIED.to_string(),
    }
}

fn date_cell(date: Option<chrono::NaiveDate>) -> String {
    date.map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "N/A".to_string())
}

/// Filtered dataset list
///
/// The table shows at most `limit` rows; JSON and CSV carry every match.
pub fn render_list(records: &[&DatasetRecord], limit: usize, format: OutputFormat) -> ViewResult<String> {
    match format {
        OutputFormat::Json => to_json(records),
        OutputFormat::Csv => {
            let rows: Vec<Vec<String>> = records
                .iter()
                .map(|r| {
                    vec![
                        r.id.to_string(),
                        r.title.clone(),
                        r.organisation.clone().unwrap_or_default(),
                        r.source_catalogue.clone().unwrap_or_default(),
                        r.created_at_source.clone().unwrap_or_default(),
                    ]
                })
                .collect();
            format_csv(&["id", "title", "organisation", "source", "created"], &rows)
        }
        OutputFormat::Table => {
            let mut out = format!("{} result(s)\n\n", records.len());
            if records.is_empty() {
                out.push_str("No dataset matches the current filters.\n");
                return Ok(out);
            }

            let rows: Vec<Vec<String>> = records
                .iter()
                .take(limit)
                .map(|r| {
                    vec![
                        r.id.to_string(),
                        r.title.clone(),
                        organisation_cell(r),
                        date_cell(r.created_on()),
                    ]
                })
                .collect();
            out.push_str(&format_table(&["ID", "Title", "Organisation", "Created"], &rows));

            if records.len() > limit {
                out.push_str(&format!("\nShowing the first {} of {}.\n", limit, records.len()));
            }
            Ok(out)
        }
    }
}

/// Detail view of one record
pub fn render_detail(record: &DatasetRecord, format: OutputFormat) -> ViewResult<String> {
    let fields = vec![
        vec!["id".to_string(), record.id.to_string()],
        vec!["title".to_string(), record.title.clone()],
        vec![
            "organisation".to_string(),
            record.organisation.clone().unwrap_or_else(|| NOT_SPECIFIED.to_string()),
        ],
        vec![
            "source".to_string(),
            record.source_catalogue.clone().unwrap_or_else(|| "N/A".to_string()),
        ],
        vec![
            "url".to_string(),
            record.source_url.clone().unwrap_or_else(|| "N/A".to_string()),
        ],
        vec!["created".to_string(), date_cell(record.created_on())],
        vec!["modified".to_string(), date_cell(record.modified_on())],
    ];

    match format {
        OutputFormat::Json => to_json(record),
        OutputFormat::Csv => format_csv(&["field", "value"], &fields),
        OutputFormat::Table => {
            let mut out = format!("{}\n{}\n\n", record.title, "=".repeat(record.title.chars().count()));
            for field in &fields[2..] {
                out.push_str(&format!("{:<14}{}\n", format!("{}:", field[0]), field[1]));
            }
            out.push('\n');
            out.push_str(
                record
                    .description
                    .as_deref()
                    .filter(|d| !d.trim().is_empty())
                    .unwrap_or("No description available."),
            );
            out.push('\n');
            Ok(out)
        }
    }
}

/// Organisation selector values
pub fn render_organisations(organisations: &[String], format: OutputFormat) -> ViewResult<String> {
    match format {
        OutputFormat::Json => to_json(organisations),
        OutputFormat::Csv => {
            let rows: Vec<Vec<String>> = organisations.iter().map(|o| vec![o.clone()]).collect();
            format_csv(&["organisation"], &rows)
        }
        OutputFormat::Table => {
            let mut out = String::from("All organisations\n");
            for org in organisations {
                out.push_str(org);
                out.push('\n');
            }
            Ok(out)
        }
    }
}

/// One chart as horizontal text bars
pub fn text_chart(chart: &ChartSpec) -> String {
    let mut out = format!("{} ({})\n", chart.title, chart.kind);
    if chart.is_empty() {
        out.push_str("  No data available.\n");
        return out;
    }

    let label_width = chart
        .points
        .iter()
        .map(|p| p.label.chars().count())
        .max()
        .unwrap_or(0);
    let max = chart.max_value();

    for (i, point) in chart.points.iter().enumerate() {
        let filled = if max > 0.0 {
            ((point.value / max) * BAR_WIDTH as f64).round() as usize
        } else {
            0
        };
        let pad = label_width - point.label.chars().count();
        let suffix = match chart.kind {
            ChartKind::Pie => format!("{} ({:.1}%)", point.value, chart.percent(i)),
            _ => format!("{}", point.value),
        };
        out.push_str(&format!(
            "  {}{}  {} {}\n",
            point.label,
            " ".repeat(pad),
            "#".repeat(filled),
            suffix
        ));
    }
    out
}

#[derive(Serialize)]
struct ChartsView<'a> {
    total_records: usize,
    dated_records: usize,
    charts: &'a [ChartSpec],
}

/// Statistics or dashboard charts
pub fn render_charts(summary: &StatisticsSummary, charts: &[ChartSpec], format: OutputFormat) -> ViewResult<String> {
    match format {
        OutputFormat::Json => to_json(&ChartsView {
            total_records: summary.total_records,
            dated_records: summary.dated_records,
            charts,
        }),
        OutputFormat::Csv => {
            let rows: Vec<Vec<String>> = charts
                .iter()
                .flat_map(|chart| {
                    chart.points.iter().map(move |p| {
                        vec![chart.title.clone(), p.label.clone(), p.value.to_string()]
                    })
                })
                .collect();
            format_csv(&["chart", "label", "value"], &rows)
        }
        OutputFormat::Table => {
            let mut out = format!(
                "{} dataset(s), {} with a creation date\n",
                summary.total_records, summary.dated_records
            );
            for chart in charts {
                out.push('\n');
                out.push_str(&text_chart(chart));
            }
            Ok(out)
        }
    }
}

/// Landing page
pub fn render_home(user: Option<&str>, dataset_count: usize, organisation_count: usize) -> String {
    let greeting = match user {
        Some(user) => format!("Welcome, {}.", user),
        None => "Welcome.".to_string(),
    };
    format!(
        "{}\n\n\
         Explore, analyse and visualise environmental datasets harvested from multiple sources.\n\
         The catalogue holds {} dataset(s) from {} organisation(s).\n\n\
         ecocat list        browse and filter the catalogue\n\
         ecocat stats       charts by theme, source, organisation and date\n\
         ecocat dashboard   overview with report export\n",
        greeting, dataset_count, organisation_count
    )
}

pub fn render_profile(profile: &UserProfile, format: OutputFormat) -> ViewResult<String> {
    let fields = vec![
        vec!["username".to_string(), profile.username.clone()],
        vec!["first_name".to_string(), profile.first_name.clone()],
        vec!["last_name".to_string(), profile.last_name.clone()],
        vec!["email".to_string(), profile.email.clone()],
    ];
    match format {
        OutputFormat::Json => to_json(profile),
        OutputFormat::Csv => format_csv(&["field", "value"], &fields),
        OutputFormat::Table => Ok(format_table(&["Field", "Value"], &fields)),
    }
}

/// GraphQL result; falls back to the tree when no table can be built
pub fn render_query(outcome: &QueryOutcome, format: OutputFormat) -> ViewResult<String> {
    match (format, &outcome.table) {
        (OutputFormat::Json, _) => to_json(&outcome.data),
        (OutputFormat::Csv, Some(table)) => {
            let headers: Vec<&str> = table.columns.iter().map(String::as_str).collect();
            format_csv(&headers, &table.rows)
        }
        (OutputFormat::Csv, None) => to_json(&outcome.data),
        (OutputFormat::Table, Some(table)) => {
            let headers: Vec<&str> = table.columns.iter().map(String::as_str).collect();
            Ok(format!(
                "{} ({} row(s))\n\n{}",
                table.field,
                table.rows.len(),
                format_table(&headers, &table.rows)
            ))
        }
        (OutputFormat::Table, None) => Ok(outcome.tree.render()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graphql::{tabulate, QueryNode};

    fn records() -> Vec<DatasetRecord> {
        (1..=60)
            .map(|i| {
                DatasetRecord::new(i, format!("Jeu {}", i))
                    .organisation("Ministère de l'Environnement et de la Lutte contre les changements climatiques")
            })
            .collect()
    }

    #[test]
    fn test_list_table_limits_rows_and_truncates() {
        let records = records();
        let visible: Vec<&DatasetRecord> = records.iter().collect();
        let out = render_list(&visible, 50, OutputFormat::Table).unwrap();

        assert!(out.starts_with("60 result(s)"));
        assert!(out.contains("Jeu 50 "));
        assert!(!out.contains("Jeu 51"));
        assert!(out.contains("Ministère de l'Environnement e..."));
        assert!(out.contains("Showing the first 50 of 60."));
    }

    #[test]
    fn test_list_json_and_csv_carry_all_matches() {
        let records = records();
        let visible: Vec<&DatasetRecord> = records.iter().collect();

        let json = render_list(&visible, 50, OutputFormat::Json).unwrap();
        let parsed: Vec<serde_json::Value> = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.len(), 60);
        assert_eq!(parsed[0]["titre"], "Jeu 1");

        let csv = render_list(&visible, 50, OutputFormat::Csv).unwrap();
        assert_eq!(csv.lines().count(), 61);
        assert!(csv.starts_with("id,title,organisation,source,created\n"));
    }

    #[test]
    fn test_empty_list() {
        let out = render_list(&[], 50, OutputFormat::Table).unwrap();
        assert!(out.contains("No dataset matches"));
    }

    #[test]
    fn test_format_table_alignment() {
        let out = format_table(
            &["ID", "Name"],
            &[vec!["1".to_string(), "Eau".to_string()], vec!["22".to_string(), "Forêt".to_string()]],
        );
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "ID | Name");
        assert_eq!(lines[1], "----------");
        assert_eq!(lines[2], "1  | Eau");
        assert_eq!(lines[3], "22 | Forêt");
    }

    #[test]
    fn test_csv_quotes_fields() {
        let out = format_csv(&["a"], &[vec!["x, y".to_string()]]).unwrap();
        assert_eq!(out, "a\n\"x, y\"\n");
    }

    #[test]
    fn test_detail_placeholders() {
        let record = DatasetRecord::new(4, "Relevés");
        let out = render_detail(&record, OutputFormat::Table).unwrap();
        assert!(out.contains("organisation: Not specified"));
        assert!(out.contains("created:      N/A"));
        assert!(out.contains("No description available."));
    }

    #[test]
    fn test_text_chart_pie() {
        let chart = ChartSpec::new(ChartKind::Pie, "Sources", "Datasets")
            .point("A", "A: 3", 3.0)
            .point("BB", "BB: 1", 1.0);
        let out = text_chart(&chart);
        assert!(out.starts_with("Sources (pie)\n"));
        assert!(out.contains(&format!("  A   {} 3 (75.0%)", "#".repeat(40))));
        assert!(out.contains(&format!("  BB  {} 1 (25.0%)", "#".repeat(13))));
    }

    #[test]
    fn test_query_rendering() {
        let data = serde_json::json!({"allJeuDonnees": [{"id": "1", "titre": "Eau"}]});
        let outcome = QueryOutcome {
            tree: QueryNode::from_value(&data),
            table: tabulate(&data),
            data,
        };
        let table = render_query(&outcome, OutputFormat::Table).unwrap();
        assert!(table.starts_with("allJeuDonnees (1 row(s))"));
        let csv = render_query(&outcome, OutputFormat::Csv).unwrap();
        assert_eq!(csv, "id,titre\n1,Eau\n");
    }

    #[test]
    fn test_home_mentions_counts() {
        let out = render_home(Some("alice"), 12, 3);
        assert!(out.starts_with("Welcome, alice."));
        assert!(out.contains("12 dataset(s) from 3 organisation(s)"));
    }
}
