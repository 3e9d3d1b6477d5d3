//! Keyword-based theme classification
//!
//! Categories are configuration data: each has a display name and a list of
//! keywords matched case-insensitively against record titles.

use serde::{Deserialize, Serialize};

use super::LabelCount;
use crate::catalog::DatasetRecord;

/// Label of the catch-all bucket
pub const OTHER_CATEGORY: &str = "Other";

/// A named category and the title keywords that select it
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CategoryRule {
    pub name: String,
    #[serde(default)]
    pub keywords: Vec<String>,
}

impl CategoryRule {
    pub fn new(name: impl Into<String>, keywords: &[&str]) -> Self {
        Self {
            name: name.into(),
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
        }
    }

    fn matches(&self, lowered_title: &str) -> bool {
        self.keywords
            .iter()
            .filter(|k| !k.is_empty())
            .any(|k| lowered_title.contains(&k.to_lowercase()))
    }
}

/// Default environmental themes (French and English keywords)
///
/// Short stems carry a leading or trailing space or an elision so that they
/// only hit whole words: "eau" alone would also match "réseau" and "bureau".
pub fn default_category_rules() -> Vec<CategoryRule> {
    vec![
        CategoryRule::new(
            "Water",
            &[
                "l'eau",
                "d'eau",
                " eau",
                " eaux",
                "eau potable",
                "eaux usées",
                "eaux souterraines",
                "water",
                "hydrolog",
                "hydrograph",
                "rivière",
                "river",
                "lacs",
                "lake",
                "nappe",
            ],
        ),
        CategoryRule::new(
            "Air & Climate",
            &[
                "qualité de l'air",
                "air quality",
                "atmosph",
                "climat",
                "climate",
                "météo",
                "weather",
                "émission",
                "emission",
            ],
        ),
        CategoryRule::new(
            "Biodiversity",
            &["biodiversité", "biodiversity", "espèce", "species", "faune", "flore", "habitat"],
        ),
        CategoryRule::new("Forest", &["forêt", "forest", "forestier", "arbre", "trees", " tree"]),
        CategoryRule::new(
            "Land & Soil",
            &[
                " sol",
                "sols ",
                "soil",
                "territoire",
                "land use",
                "land cover",
                "terres agricoles",
                "agricol",
                "agricult",
            ],
        ),
        CategoryRule::new("Energy", &["énergie", "energy", "électricité", "electricity"]),
        CategoryRule::new("Waste", &["déchet", "waste", "recycl", "matières résiduelles"]),
    ]
}

/// Count records per category
///
/// A record increments every category it matches; records matching none go
/// to [`OTHER_CATEGORY`]. Sorted by descending count, ties in rule order with
/// the catch-all last. Empty buckets are omitted.
pub fn count_by_category<'a, I>(records: I, rules: &[CategoryRule]) -> Vec<LabelCount>
where
    I: IntoIterator<Item = &'a DatasetRecord>,
{
    let mut counts = vec![0u64; rules.len()];
    let mut other = 0u64;

    for record in records {
        let title = record.title.to_lowercase();
        let mut matched = false;
        for (idx, rule) in rules.iter().enumerate() {
            if rule.matches(&title) {
                counts[idx] += 1;
                matched = true;
            }
        }
        if !matched {
            other += 1;
        }
    }

    let mut histogram: Vec<LabelCount> = rules
        .iter()
        .zip(counts)
        .map(|(rule, count)| LabelCount::new(rule.name.clone(), count))
        .chain(std::iter::once(LabelCount::new(OTHER_CATEGORY, other)))
        .filter(|entry| entry.count > 0)
        .collect();

    // Stable sort keeps rule order for ties
    histogram.sort_by(|a, b| b.count.cmp(&a.count));
    histogram
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules() -> Vec<CategoryRule> {
        vec![
            CategoryRule::new("Water", &["eau", "river"]),
            CategoryRule::new("Air", &["air"]),
        ]
    }

    #[test]
    fn test_multi_match_and_other() {
        let records = vec![
            DatasetRecord::new(1, "Qualité de l'EAU et de l'air"),
            DatasetRecord::new(2, "River levels"),
            DatasetRecord::new(3, "Population census"),
            DatasetRecord::new(4, "Budget annuel"),
        ];

        let histogram = count_by_category(&records, &rules());
        assert_eq!(
            histogram,
            vec![
                LabelCount::new("Water", 2),
                LabelCount::new(OTHER_CATEGORY, 2),
                LabelCount::new("Air", 1),
            ]
        );

        let total: u64 = histogram.iter().map(|e| e.count).sum();
        assert!(total >= records.len() as u64);
    }

    #[test]
    fn test_other_counts_unmatched_records_only() {
        let records = vec![
            DatasetRecord::new(1, "Census"),
            DatasetRecord::new(2, "Budget"),
            DatasetRecord::new(3, "Air quality"),
        ];
        let histogram = count_by_category(&records, &rules());
        let other = histogram
            .iter()
            .find(|e| e.label == OTHER_CATEGORY)
            .map(|e| e.count);
        assert_eq!(other, Some(2));
        assert!(histogram.iter().all(|e| e.label != "Water"));
    }

    #[test]
    fn test_ties_keep_rule_order() {
        let records = vec![DatasetRecord::new(1, "air"), DatasetRecord::new(2, "eau")];
        let histogram = count_by_category(&records, &rules());
        assert_eq!(histogram[0].label, "Water");
        assert_eq!(histogram[1].label, "Air");
    }

    #[test]
    fn test_no_rules_sends_everything_to_other() {
        let records = vec![DatasetRecord::new(1, "anything")];
        let histogram = count_by_category(&records, &[]);
        assert_eq!(histogram, vec![LabelCount::new(OTHER_CATEGORY, 1)]);
    }

    #[test]
    fn test_empty_input() {
        assert!(count_by_category(&[], &rules()).is_empty());
    }

    #[test]
    fn test_default_keywords_match_whole_words() {
        let rules = default_category_rules();
        let label_of = |title: &str| {
            let record = DatasetRecord::new(1, title);
            count_by_category([&record], &rules)
                .into_iter()
                .map(|e| e.label)
                .collect::<Vec<_>>()
        };

        for title in [
            "Réseau routier",
            "Bureau des mines",
            "Niveau sonore",
            "Données consolidées",
            "Iceland glaciers",
            "Street lighting",
        ] {
            assert_eq!(label_of(title), vec![OTHER_CATEGORY], "{}", title);
        }

        assert_eq!(label_of("Qualité de l'eau des rivières"), vec!["Water"]);
        assert_eq!(label_of("Eaux usées municipales"), vec!["Water"]);
        assert_eq!(label_of("Sols contaminés"), vec!["Land & Soil"]);
        assert_eq!(label_of("Occupation du sol"), vec!["Land & Soil"]);
        assert_eq!(label_of("Urban trees"), vec!["Forest"]);
    }

    #[test]
    fn test_rule_from_toml() {
        let rules = default_category_rules();
        assert!(rules.iter().all(|r| !r.keywords.is_empty()));
        let toml = r#"
            name = "Noise"
            keywords = ["bruit", "noise"]
        "#;
        let rule: CategoryRule = toml::from_str(toml).unwrap();
        assert_eq!(rule, CategoryRule::new("Noise", &["bruit", "noise"]));
    }
}
