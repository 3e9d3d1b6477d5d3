//! Time-bucketed histograms over the creation date at source
//!
//! Records with a missing or unparsable creation date are skipped here; they
//! still count in the category and organisation aggregates.

use chrono::Datelike;
use serde::Serialize;
use std::collections::BTreeMap;

use crate::catalog::DatasetRecord;

/// Years at or before this one are treated as bogus source metadata
pub const MIN_YEAR_EXCLUSIVE: i32 = 1900;

/// Records created in one calendar year
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct YearCount {
    pub year: i32,
    pub count: u64,
}

/// Northern-Hemisphere meteorological season
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Hash)]
pub enum Season {
    Winter,
    Spring,
    Summer,
    Autumn,
}

impl Season {
    /// All seasons in display order
    pub fn all() -> &'static [Season; 4] {
        &[Season::Winter, Season::Spring, Season::Summer, Season::Autumn]
    }

    /// Season of a calendar month (1-12)
    pub fn from_month(month: u32) -> Option<Season> {
        match month {
            12 | 1 | 2 => Some(Season::Winter),
            3..=5 => Some(Season::Spring),
            6..=8 => Some(Season::Summer),
            9..=11 => Some(Season::Autumn),
            _ => None,
        }
    }

    fn index(self) -> usize {
        match self {
            Season::Winter => 0,
            Season::Spring => 1,
            Season::Summer => 2,
            Season::Autumn => 3,
        }
    }
}

impl std::fmt::Display for Season {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Season::Winter => write!(f, "Winter"),
            Season::Spring => write!(f, "Spring"),
            Season::Summer => write!(f, "Summer"),
            Season::Autumn => write!(f, "Autumn"),
        }
    }
}

/// Records created in one season, across all years
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct SeasonCount {
    pub season: Season,
    pub count: u64,
}

/// Records per creation year, ascending
///
/// Only years in `(1900, current_year]` are kept.
pub fn count_by_year<'a, I>(records: I, current_year: i32) -> Vec<YearCount>
where
    I: IntoIterator<Item = &'a DatasetRecord>,
{
    let mut years: BTreeMap<i32, u64> = BTreeMap::new();

    for date in records.into_iter().filter_map(DatasetRecord::created_on) {
        let year = date.year();
        if year > MIN_YEAR_EXCLUSIVE && year <= current_year {
            *years.entry(year).or_insert(0) += 1;
        }
    }

    years
        .into_iter()
        .map(|(year, count)| YearCount { year, count })
        .collect()
}

/// Records per season; always four entries, Winter to Autumn
pub fn count_by_season<'a, I>(records: I) -> Vec<SeasonCount>
where
    I: IntoIterator<Item = &'a DatasetRecord>,
{
    let mut counts = [0u64; 4];

    for date in records.into_iter().filter_map(DatasetRecord::created_on) {
        if let Some(season) = Season::from_month(date.month()) {
            counts[season.index()] += 1;
        }
    }

    Season::all()
        .iter()
        .map(|&season| SeasonCount {
            season,
            count: counts[season.index()],
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dated(dates: &[&str]) -> Vec<DatasetRecord> {
        dates
            .iter()
            .enumerate()
            .map(|(i, d)| DatasetRecord::new(i as i64, "t").created(*d))
            .collect()
    }

    #[test]
    fn test_three_record_scenario() {
        let records = dated(&["2020-01-15", "2020-07-01", "2021-03-10"]);

        assert_eq!(
            count_by_year(&records, 2024),
            vec![
                YearCount { year: 2020, count: 2 },
                YearCount { year: 2021, count: 1 },
            ]
        );

        let seasons: Vec<(Season, u64)> = count_by_season(&records)
            .into_iter()
            .map(|s| (s.season, s.count))
            .collect();
        assert_eq!(
            seasons,
            vec![
                (Season::Winter, 1),
                (Season::Spring, 1),
                (Season::Summer, 1),
                (Season::Autumn, 0),
            ]
        );
    }

    #[test]
    fn test_year_bounds() {
        let records = dated(&["1900-06-01", "1901-06-01", "2030-01-01", "2024-12-31"]);
        let years: Vec<i32> = count_by_year(&records, 2024).iter().map(|y| y.year).collect();
        assert_eq!(years, vec![1901, 2024]);
    }

    #[test]
    fn test_unparsable_dates_skipped() {
        let mut records = dated(&["garbage", "2019-02-30", "2019-11-05"]);
        records.push(DatasetRecord::new(10, "undated"));

        let years = count_by_year(&records, 2024);
        assert_eq!(years, vec![YearCount { year: 2019, count: 1 }]);

        let seasons = count_by_season(&records);
        assert_eq!(seasons.len(), 4);
        assert_eq!(seasons.iter().map(|s| s.count).sum::<u64>(), 1);
        assert_eq!(seasons[3].count, 1);
    }

    #[test]
    fn test_years_strictly_ascending() {
        let records = dated(&["2022-01-01", "2010-01-01", "2022-05-05", "2015-03-03", "2010-09-09"]);
        let years = count_by_year(&records, 2024);
        assert!(years.windows(2).all(|w| w[0].year < w[1].year));
        assert_eq!(years.iter().map(|y| y.count).sum::<u64>(), 5);
    }

    #[test]
    fn test_december_is_winter() {
        assert_eq!(Season::from_month(12), Some(Season::Winter));
        assert_eq!(Season::from_month(2), Some(Season::Winter));
        assert_eq!(Season::from_month(9), Some(Season::Autumn));
        assert_eq!(Season::from_month(13), None);
    }

    #[test]
    fn test_empty_input_has_four_zero_seasons() {
        let seasons = count_by_season(&[]);
        assert_eq!(seasons.len(), 4);
        assert!(seasons.iter().all(|s| s.count == 0));
        assert_eq!(seasons[0].season, Season::Winter);
    }
}
