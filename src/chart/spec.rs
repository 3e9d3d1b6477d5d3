//! Chart specifications
//!
//! Maps aggregate summaries onto renderer-neutral chart descriptions. The
//! text views print them, the export pipeline rasterizes them.

use serde::Serialize;

use super::palette::SERIES_COLORS;
use crate::aggregate::{LabelCount, RankedGroup, SeasonCount, StatisticsSummary, YearCount};

/// Visual form of a chart
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    Pie,
    Bar,
    Line,
    Radar,
}

impl std::fmt::Display for ChartKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChartKind::Pie => write!(f, "pie"),
            ChartKind::Bar => write!(f, "bar"),
            ChartKind::Line => write!(f, "line"),
            ChartKind::Radar => write!(f, "radar"),
        }
    }
}

/// One data point of a chart
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ChartPoint {
    /// Axis or legend label
    pub label: String,
    /// Hover text / export caption
    pub tooltip: String,
    pub value: f64,
    /// CSS-style color string
    pub color: String,
}

/// A complete chart description
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ChartSpec {
    pub kind: ChartKind,
    pub title: String,
    /// Caption of the value axis
    pub value_label: String,
    pub points: Vec<ChartPoint>,
}

impl ChartSpec {
    pub fn new(kind: ChartKind, title: impl Into<String>, value_label: impl Into<String>) -> Self {
        Self {
            kind,
            title: title.into(),
            value_label: value_label.into(),
            points: Vec::new(),
        }
    }

    /// Builder method: append a point, colored from the series palette
    pub fn point(mut self, label: impl Into<String>, tooltip: impl Into<String>, value: f64) -> Self {
        let color = SERIES_COLORS[self.points.len() % SERIES_COLORS.len()].to_string();
        self.points.push(ChartPoint {
            label: label.into(),
            tooltip: tooltip.into(),
            value,
            color,
        });
        self
    }

    /// Sum of all point values
    pub fn total(&self) -> f64 {
        self.points.iter().map(|p| p.value).sum()
    }

    /// Largest point value, or 0 for an empty chart
    pub fn max_value(&self) -> f64 {
        self.points.iter().map(|p| p.value).fold(0.0, f64::max)
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Share of a point in the total, as a percentage
    pub fn percent(&self, idx: usize) -> f64 {
        let total = self.total();
        match self.points.get(idx) {
            Some(p) if total > 0.0 => p.value / total * 100.0,
            _ => 0.0,
        }
    }
}

fn labelled(kind: ChartKind, title: &str, value_label: &str, counts: &[LabelCount]) -> ChartSpec {
    counts.iter().fold(ChartSpec::new(kind, title, value_label), |chart, entry| {
        chart.point(
            entry.label.clone(),
            format!("{}: {}", entry.label, entry.count),
            entry.count as f64,
        )
    })
}

/// Theme distribution as a pie chart
pub fn category_chart(categories: &[LabelCount]) -> ChartSpec {
    labelled(ChartKind::Pie, "Datasets by theme", "Datasets", categories)
}

/// Source catalogue distribution as a pie chart
pub fn source_chart(sources: &[LabelCount]) -> ChartSpec {
    labelled(ChartKind::Pie, "Distribution by source", "Datasets", sources)
}

/// Top organisations as a bar chart; tooltips carry the full name
pub fn organisation_chart(groups: &[RankedGroup]) -> ChartSpec {
    groups.iter().fold(
        ChartSpec::new(ChartKind::Bar, "Top 5 organisations", "Number of datasets"),
        |chart, group| {
            chart.point(
                group.label.clone(),
                format!("{}: {}", group.full_label, group.count),
                group.count as f64,
            )
        },
    )
}

/// Creation years as a line chart
pub fn yearly_chart(years: &[YearCount]) -> ChartSpec {
    years.iter().fold(
        ChartSpec::new(ChartKind::Line, "Datasets created per year", "Datasets"),
        |chart, entry| {
            chart.point(
                entry.year.to_string(),
                format!("{}: {}", entry.year, entry.count),
                entry.count as f64,
            )
        },
    )
}

/// Seasonal buckets as a radar chart
pub fn seasonal_chart(seasons: &[SeasonCount]) -> ChartSpec {
    seasons.iter().fold(
        ChartSpec::new(ChartKind::Radar, "Datasets created per season", "Datasets"),
        |chart, entry| {
            chart.point(
                entry.season.to_string(),
                format!("{}: {}", entry.season, entry.count),
                entry.count as f64,
            )
        },
    )
}

/// Charts shown on the dashboard
pub fn dashboard_charts(summary: &StatisticsSummary) -> Vec<ChartSpec> {
    vec![
        source_chart(&summary.sources),
        organisation_chart(&summary.top_organisations),
    ]
}

/// Charts shown on the statistics page
pub fn statistics_charts(summary: &StatisticsSummary) -> Vec<ChartSpec> {
    vec![
        source_chart(&summary.sources),
        organisation_chart(&summary.top_organisations),
        category_chart(&summary.categories),
        yearly_chart(&summary.years),
        seasonal_chart(&summary.seasons),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::Season;

    #[test]
    fn test_organisation_chart_keeps_full_label_in_tooltip() {
        let groups = vec![RankedGroup {
            label: "Ministère de l'Envir...".to_string(),
            full_label: "Ministère de l'Environnement".to_string(),
            count: 12,
        }];
        let chart = organisation_chart(&groups);
        assert_eq!(chart.kind, ChartKind::Bar);
        assert_eq!(chart.points[0].label, "Ministère de l'Envir...");
        assert_eq!(chart.points[0].tooltip, "Ministère de l'Environnement: 12");
        assert_eq!(chart.points[0].value, 12.0);
    }

    #[test]
    fn test_colors_cycle_through_palette() {
        let counts: Vec<LabelCount> = (0..SERIES_COLORS.len() + 1)
            .map(|i| LabelCount::new(format!("s{}", i), 1))
            .collect();
        let chart = source_chart(&counts);
        assert_eq!(chart.points[0].color, chart.points[SERIES_COLORS.len()].color);
        assert_ne!(chart.points[0].color, chart.points[1].color);
    }

    #[test]
    fn test_percent() {
        let chart = category_chart(&[LabelCount::new("a", 1), LabelCount::new("b", 3)]);
        assert_eq!(chart.percent(0), 25.0);
        assert_eq!(chart.percent(1), 75.0);
        assert_eq!(chart.percent(5), 0.0);
        assert_eq!(ChartSpec::new(ChartKind::Pie, "x", "y").percent(0), 0.0);
    }

    #[test]
    fn test_seasonal_chart_is_radar_in_fixed_order() {
        let seasons: Vec<SeasonCount> = Season::all()
            .iter()
            .map(|&season| SeasonCount { season, count: 1 })
            .collect();
        let chart = seasonal_chart(&seasons);
        assert_eq!(chart.kind, ChartKind::Radar);
        let labels: Vec<&str> = chart.points.iter().map(|p| p.label.as_str()).collect();
        assert_eq!(labels, vec!["Winter", "Spring", "Summer", "Autumn"]);
    }

    #[test]
    fn test_yearly_chart_max_value() {
        let chart = yearly_chart(&[
            YearCount { year: 2019, count: 4 },
            YearCount { year: 2020, count: 9 },
        ]);
        assert_eq!(chart.kind, ChartKind::Line);
        assert_eq!(chart.max_value(), 9.0);
        assert_eq!(chart.total(), 13.0);
    }
}
