use crate::model::period::{DateRange, DayLength};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Regional public holiday calendar, e.g. `GERMANY_BADEN_WUERTTEMBERG`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Region(pub String);

impl Region {
    pub fn new(code: &str) -> Self {
        Self(code.trim().to_ascii_uppercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicHoliday {
    pub date: NaiveDate,
    pub day_length: DayLength,
    pub description: String,
}

/// A person's working-time setting valid from a given day on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkingTimeEntry {
    pub valid_from: NaiveDate,
    pub region: Region,
}

/// Maps every part of `range` to the region effective on those days.
/// Days before the first entry fall back to `default_region`.
pub fn regions_in_range(
    history: &[WorkingTimeEntry],
    range: DateRange,
    default_region: &Region,
) -> Vec<(DateRange, Region)> {
    if range.is_empty() {
        return Vec::new();
    }

    let mut entries: Vec<&WorkingTimeEntry> = history.iter().collect();
    entries.sort_by_key(|entry| entry.valid_from);

    let mut parts = Vec::new();
    let mut cursor = range.from;
    let mut current = entries
        .iter()
        .rev()
        .find(|entry| entry.valid_from <= cursor)
        .map(|entry| entry.region.clone())
        .unwrap_or_else(|| default_region.clone());

    for entry in entries.iter().filter(|entry| entry.valid_from > range.from) {
        if entry.valid_from > range.to {
            break;
        }
        if entry.region != current {
            if let Some(end) = entry.valid_from.pred_opt() {
                parts.push((DateRange::new(cursor, end), current.clone()));
            }
            cursor = entry.valid_from;
            current = entry.region.clone();
        }
    }
    parts.push((DateRange::new(cursor, range.to), current));
    parts
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn entry(valid_from: NaiveDate, region: &str) -> WorkingTimeEntry {
        WorkingTimeEntry {
            valid_from,
            region: Region::new(region),
        }
    }

    #[test]
    fn without_history_the_default_region_covers_everything() {
        let range = DateRange::new(date(2022, 1, 1), date(2022, 1, 31));
        let default = Region::new("GERMANY_RHEINLAND_PFALZ");

        assert_eq!(regions_in_range(&[], range, &default), vec![(range, default)]);
    }

    #[test]
    fn splits_range_where_region_changes() {
        let range = DateRange::new(date(2022, 1, 1), date(2022, 1, 31));
        let history = vec![
            entry(date(2022, 1, 15), "GERMANY_BAYERN"),
            entry(date(2021, 6, 1), "GERMANY_BADEN_WUERTTEMBERG"),
            entry(date(2022, 3, 1), "GERMANY_BERLIN"),
        ];

        let parts = regions_in_range(&history, range, &Region::new("GERMANY_RHEINLAND_PFALZ"));

        assert_eq!(
            parts,
            vec![
                (
                    DateRange::new(date(2022, 1, 1), date(2022, 1, 14)),
                    Region::new("GERMANY_BADEN_WUERTTEMBERG")
                ),
                (
                    DateRange::new(date(2022, 1, 15), date(2022, 1, 31)),
                    Region::new("GERMANY_BAYERN")
                ),
            ]
        );
    }
}
