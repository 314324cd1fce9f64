use chrono::{Datelike, NaiveDate, Weekday};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Which part of a day an absence or holiday covers.
#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DayLength {
    Full,
    Morning,
    Noon,
}

impl DayLength {
    /// Share of a working day.
    pub fn fraction(self) -> Decimal {
        match self {
            DayLength::Full => Decimal::ONE,
            DayLength::Morning | DayLength::Noon => dec!(0.5),
        }
    }

    pub fn covers_morning(self) -> bool {
        matches!(self, DayLength::Full | DayLength::Morning)
    }

    pub fn covers_noon(self) -> bool {
        matches!(self, DayLength::Full | DayLength::Noon)
    }

    /// Whether both lengths claim the same half of a day.
    pub fn shares_half_with(self, other: DayLength) -> bool {
        (self.covers_morning() && other.covers_morning())
            || (self.covers_noon() && other.covers_noon())
    }

    /// Union of several coverages of the same day, `None` when nothing is covered.
    pub fn merge(parts: impl IntoIterator<Item = DayLength>) -> Option<DayLength> {
        let (mut morning, mut noon) = (false, false);
        for part in parts {
            morning |= part.covers_morning();
            noon |= part.covers_noon();
        }
        match (morning, noon) {
            (true, true) => Some(DayLength::Full),
            (true, false) => Some(DayLength::Morning),
            (false, true) => Some(DayLength::Noon),
            (false, false) => None,
        }
    }
}

/// Inclusive range of calendar days.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct DateRange {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl DateRange {
    pub fn new(from: NaiveDate, to: NaiveDate) -> Self {
        Self { from, to }
    }

    pub fn of_year(year: i32) -> Option<Self> {
        Some(Self {
            from: NaiveDate::from_ymd_opt(year, 1, 1)?,
            to: NaiveDate::from_ymd_opt(year, 12, 31)?,
        })
    }

    pub fn of_month(year: i32, month: u32) -> Option<Self> {
        let from = NaiveDate::from_ymd_opt(year, month, 1)?;
        let next = if month == 12 {
            NaiveDate::from_ymd_opt(year + 1, 1, 1)?
        } else {
            NaiveDate::from_ymd_opt(year, month + 1, 1)?
        };
        Some(Self {
            from,
            to: next.pred_opt()?,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.from > self.to
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.from <= date && date <= self.to
    }

    pub fn overlaps(&self, other: &DateRange) -> bool {
        self.from <= other.to && other.from <= self.to
    }

    pub fn intersect(&self, other: &DateRange) -> Option<DateRange> {
        let clipped = DateRange::new(self.from.max(other.from), self.to.min(other.to));
        (!clipped.is_empty()).then_some(clipped)
    }

    pub fn days(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.from.iter_days().take_while(move |day| *day <= self.to)
    }

    pub fn day_count(&self) -> i64 {
        if self.is_empty() {
            0
        } else {
            (self.to - self.from).num_days() + 1
        }
    }

    /// Splits the range at every year boundary it crosses.
    pub fn split_by_year(&self) -> Vec<(i32, DateRange)> {
        (self.from.year()..=self.to.year())
            .filter_map(|year| {
                let part = DateRange::of_year(year)?.intersect(self)?;
                Some((year, part))
            })
            .collect()
    }
}

pub fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn month_range_handles_december_and_leap_years() {
        let december = DateRange::of_month(2022, 12).unwrap();
        assert_eq!(december.to, date(2022, 12, 31));
        assert_eq!(DateRange::of_month(2024, 2).unwrap().day_count(), 29);
        assert!(DateRange::of_month(2024, 13).is_none());
    }

    #[test]
    fn splits_range_at_year_boundary() {
        let range = DateRange::new(date(2022, 12, 30), date(2023, 1, 2));
        let parts = range.split_by_year();

        assert_eq!(
            parts,
            vec![
                (2022, DateRange::new(date(2022, 12, 30), date(2022, 12, 31))),
                (2023, DateRange::new(date(2023, 1, 1), date(2023, 1, 2))),
            ]
        );
    }

    #[test]
    fn only_opposite_halves_can_share_a_day() {
        assert!(!DayLength::Morning.shares_half_with(DayLength::Noon));
        assert!(DayLength::Morning.shares_half_with(DayLength::Morning));
        assert!(DayLength::Full.shares_half_with(DayLength::Noon));
    }

    #[test]
    fn merges_half_days_into_full_day() {
        assert_eq!(
            DayLength::merge([DayLength::Morning, DayLength::Noon]),
            Some(DayLength::Full)
        );
        assert_eq!(DayLength::merge([DayLength::Noon]), Some(DayLength::Noon));
        assert_eq!(DayLength::merge([]), None);
    }

    #[test]
    fn iterates_days_inclusively() {
        let range = DateRange::new(date(2020, 12, 30), date(2021, 1, 1));
        let days: Vec<_> = range.days().collect();
        assert_eq!(days, vec![date(2020, 12, 30), date(2020, 12, 31), date(2021, 1, 1)]);
        assert!(is_weekend(date(2020, 12, 5)));
        assert!(!is_weekend(date(2020, 12, 7)));
    }
}
