use crate::absence::AbsenceRecordCollector;
use crate::calendar::CalendarError;
use crate::calendar::day_type::{DayType, DayTypeResolver};
use crate::calendar::holidays::coverage_for_person;
use crate::calendar::visibility::VisibilityPolicy;
use crate::clock::Clock;
use crate::model::absence::HalfDayRecord;
use crate::model::category::Categories;
use crate::model::period::{DateRange, DayLength, is_weekend};
use crate::model::person::{Person, PersonId};
use crate::store::{CategoryCatalog, HolidayProvider, WorkingTimeHistory};
use chrono::{Datelike, NaiveDate};
use futures::future::try_join_all;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::debug;
use utoipa::ToSchema;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct CalendarDay {
    /// Two digit day of month, e.g. `"07"`.
    #[schema(example = "07")]
    pub day_of_month: String,
    #[schema(example = "2020-12-07", format = "date", value_type = String)]
    pub date: NaiveDate,
    pub weekend: bool,
    pub today: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct CalendarPerson {
    pub id: PersonId,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    /// One entry per day of the month.
    pub days: Vec<DayType>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct CalendarMonth {
    pub year: i32,
    pub month: u32,
    pub days: Vec<CalendarDay>,
    pub persons: Vec<CalendarPerson>,
}

/// Everything known about one subject inside the requested window.
struct SubjectAbsences {
    records: HashMap<NaiveDate, Vec<HalfDayRecord>>,
    holidays: HashMap<NaiveDate, DayLength>,
}

pub struct CalendarGridBuilder<S: ?Sized> {
    holidays: Arc<S>,
    categories: Arc<dyn CategoryCatalog>,
    collector: Arc<dyn AbsenceRecordCollector>,
    policy: VisibilityPolicy,
}

impl<S> CalendarGridBuilder<S>
where
    S: HolidayProvider + WorkingTimeHistory + ?Sized,
{
    pub fn new(
        holidays: Arc<S>,
        categories: Arc<dyn CategoryCatalog>,
        collector: Arc<dyn AbsenceRecordCollector>,
        policy: VisibilityPolicy,
    ) -> Self {
        Self {
            holidays,
            categories,
            collector,
            policy,
        }
    }

    pub fn policy(&self) -> &VisibilityPolicy {
        &self.policy
    }

    /// Builds one month, or all twelve months of `year` when `month` is `None`.
    pub async fn build(
        &self,
        viewer: &Person,
        subjects: &[Person],
        year: i32,
        month: Option<u32>,
        clock: &dyn Clock,
    ) -> Result<Vec<CalendarMonth>, CalendarError> {
        let months: Vec<u32> = match month {
            Some(month) => vec![month],
            None => (1..=12).collect(),
        };
        let ranges = months
            .iter()
            .map(|month| {
                DateRange::of_month(year, *month).ok_or_else(|| {
                    CalendarError::InvalidRequest(format!("no month {} in year {}", month, year))
                })
            })
            .collect::<Result<Vec<DateRange>, CalendarError>>()?;

        let (Some(first), Some(last)) = (ranges.first(), ranges.last()) else {
            return Ok(Vec::new());
        };
        let window = DateRange::new(first.from, last.to);

        let persons = distinct_active_sorted(subjects);
        let categories: Categories = self.categories.categories().await?.into_iter().collect();
        let resolver = DayTypeResolver::new(&categories);

        let absences = try_join_all(persons.iter().map(|person| self.fetch(person.id, window))).await?;
        debug!(
            viewer_id = viewer.id,
            subjects = persons.len(),
            from = %window.from,
            to = %window.to,
            "Absences loaded for calendar"
        );

        let today = clock.today();
        let mut grid = Vec::with_capacity(ranges.len());
        for range in ranges {
            let days: Vec<CalendarDay> = range
                .days()
                .map(|date| CalendarDay {
                    day_of_month: format!("{:02}", date.day()),
                    date,
                    weekend: is_weekend(date),
                    today: date == today,
                })
                .collect();

            let mut rows = Vec::with_capacity(persons.len());
            for (person, absences) in persons.iter().zip(&absences) {
                let grant = self.policy.grant_for(viewer, person);
                let mut person_days = Vec::with_capacity(days.len());
                for day in &days {
                    let records = absences
                        .records
                        .get(&day.date)
                        .map(Vec::as_slice)
                        .unwrap_or_default();
                    let mut day_type = resolver.resolve(records, grant)?;
                    if let Some(coverage) = absences.holidays.get(&day.date) {
                        day_type.overlay_public_holiday(*coverage);
                    }
                    person_days.push(day_type);
                }

                rows.push(CalendarPerson {
                    id: person.id,
                    first_name: person.first_name.clone(),
                    last_name: person.last_name.clone(),
                    email: person.email.clone(),
                    days: person_days,
                });
            }

            grid.push(CalendarMonth {
                year: range.from.year(),
                month: range.from.month(),
                days,
                persons: rows,
            });
        }

        Ok(grid)
    }

    async fn fetch(
        &self,
        person_id: PersonId,
        window: DateRange,
    ) -> Result<SubjectAbsences, CalendarError> {
        let ids = [person_id];
        let (records, holidays) = futures::try_join!(
            self.collector.open_absences(&ids, window.from, window.to),
            coverage_for_person(self.holidays.as_ref(), person_id, window),
        )?;

        let mut by_date: HashMap<NaiveDate, Vec<HalfDayRecord>> = HashMap::new();
        for record in records
            .into_iter()
            .filter(|record| record.person_id == person_id)
        {
            by_date.entry(record.date).or_default().push(record);
        }

        Ok(SubjectAbsences {
            records: by_date,
            holidays,
        })
    }
}

/// Drops duplicates and inactive persons, then orders by first name
/// ignoring case. Equal names keep their input order.
fn distinct_active_sorted(subjects: &[Person]) -> Vec<Person> {
    let mut seen = HashSet::new();
    let mut persons: Vec<Person> = subjects
        .iter()
        .filter(|person| person.is_active() && seen.insert(person.id))
        .cloned()
        .collect();
    persons.sort_by_key(|person| person.first_name.to_lowercase());
    persons
}
