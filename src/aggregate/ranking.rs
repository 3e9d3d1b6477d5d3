//! Group rankings: top organisations and source catalogues

use serde::Serialize;
use std::collections::HashMap;

use super::LabelCount;
use crate::catalog::DatasetRecord;

/// Number of organisations kept by [`top_organisations`]
pub const TOP_N: usize = 5;

/// Display labels are cut to this many characters
pub const LABEL_PREFIX_LEN: usize = 20;

/// Label for records without a source catalogue
pub const UNKNOWN_SOURCE: &str = "Unknown";

/// One entry of a top-N ranking
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RankedGroup {
    /// Truncated label for chart axes
    pub label: String,
    /// Untruncated label for tooltips and exports
    pub full_label: String,
    pub count: u64,
}

/// Count occurrences per label, in first-encountered order
fn tally<'a, I>(labels: I) -> Vec<LabelCount>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut index: HashMap<&'a str, usize> = HashMap::new();
    let mut counts: Vec<LabelCount> = Vec::new();

    for label in labels {
        match index.get(label) {
            Some(&idx) => counts[idx].count += 1,
            None => {
                index.insert(label, counts.len());
                counts.push(LabelCount::new(label, 1));
            }
        }
    }

    counts
}

/// Top organisations by record count
///
/// Unspecified and missing organisations are excluded. At most [`TOP_N`]
/// entries, sorted by descending count; ties keep first-encountered order.
pub fn top_organisations<'a, I>(records: I) -> Vec<RankedGroup>
where
    I: IntoIterator<Item = &'a DatasetRecord>,
{
    let mut counts = tally(records.into_iter().filter_map(DatasetRecord::known_organisation));
    counts.sort_by(|a, b| b.count.cmp(&a.count));

    counts
        .into_iter()
        .take(TOP_N)
        .map(|entry| RankedGroup {
            label: truncate_label(&entry.label, LABEL_PREFIX_LEN),
            full_label: entry.label,
            count: entry.count,
        })
        .collect()
}

/// Records per source catalogue, sorted by descending count
pub fn count_by_source<'a, I>(records: I) -> Vec<LabelCount>
where
    I: IntoIterator<Item = &'a DatasetRecord>,
{
    let mut counts = tally(records.into_iter().map(|r| {
        r.source_catalogue
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(UNKNOWN_SOURCE)
    }));
    counts.sort_by(|a, b| b.count.cmp(&a.count));
    counts
}

/// Cut a label to `max_chars` characters, marking the cut with "..."
pub fn truncate_label(label: &str, max_chars: usize) -> String {
    if label.chars().count() <= max_chars {
        label.to_string()
    } else {
        let prefix: String = label.chars().take(max_chars).collect();
        format!("{}...", prefix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::UNSPECIFIED_ORGANISATION;

    fn with_orgs(orgs: &[&str]) -> Vec<DatasetRecord> {
        orgs.iter()
            .enumerate()
            .map(|(i, org)| DatasetRecord::new(i as i64, "t").organisation(*org))
            .collect()
    }

    #[test]
    fn test_top_organisations_sorted_and_truncated_to_five() {
        let records = with_orgs(&[
            "A", "B", "B", "C", "C", "C", "D", "E", "F", "F", "F", "F", "G",
        ]);
        let top = top_organisations(&records);

        assert_eq!(top.len(), TOP_N);
        let labels: Vec<&str> = top.iter().map(|g| g.full_label.as_str()).collect();
        // A, D, E and G tie at 1; A was seen first
        assert_eq!(labels, vec!["F", "C", "B", "A", "D"]);
        assert!(top.windows(2).all(|w| w[0].count >= w[1].count));
    }

    #[test]
    fn test_top_organisations_excludes_sentinel() {
        let records = with_orgs(&[
            UNSPECIFIED_ORGANISATION,
            UNSPECIFIED_ORGANISATION,
            UNSPECIFIED_ORGANISATION,
            "Hydro-Québec",
        ]);
        let mut records = records;
        records.push(DatasetRecord::new(99, "no org"));

        let top = top_organisations(&records);
        assert_eq!(top.len(), 1);
        assert_eq!(top[0].full_label, "Hydro-Québec");
        assert!(top.iter().all(|g| g.full_label != UNSPECIFIED_ORGANISATION));
    }

    #[test]
    fn test_long_labels_keep_full_value() {
        let long = "Ministère de l'Environnement et de la Lutte contre les changements climatiques";
        let top = top_organisations(&with_orgs(&[long]));
        assert_eq!(top[0].label, "Ministère de l'Envir...");
        assert_eq!(top[0].full_label, long);
    }

    #[test]
    fn test_count_by_source() {
        let records = vec![
            DatasetRecord::new(1, "a").source("Données Québec"),
            DatasetRecord::new(2, "b"),
            DatasetRecord::new(3, "c").source("Données Québec"),
            DatasetRecord::new(4, "d").source("Open Canada"),
            DatasetRecord::new(5, "e").source(""),
        ];
        assert_eq!(
            count_by_source(&records),
            vec![
                LabelCount::new("Données Québec", 2),
                LabelCount::new(UNKNOWN_SOURCE, 2),
                LabelCount::new("Open Canada", 1),
            ]
        );
    }

    #[test]
    fn test_truncate_label_counts_chars() {
        assert_eq!(truncate_label("éééé", 4), "éééé");
        assert_eq!(truncate_label("ééééé", 4), "éééé...");
    }
}
