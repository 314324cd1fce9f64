use crate::model::period::{DateRange, DayLength};
use crate::model::person::PersonId;
use crate::store::{HolidayProvider, StoreError, WorkingTimeHistory};
use chrono::NaiveDate;
use std::collections::HashMap;

/// Public holidays a person has off inside `window`, following the region
/// of their working time on each day.
pub async fn coverage_for_person<S>(
    store: &S,
    person_id: PersonId,
    window: DateRange,
) -> Result<HashMap<NaiveDate, DayLength>, StoreError>
where
    S: HolidayProvider + WorkingTimeHistory + ?Sized,
{
    let mut coverage: HashMap<NaiveDate, DayLength> = HashMap::new();

    for (range, region) in store.regions_for_person_in_range(person_id, window).await? {
        for holiday in store.holidays_in_range(range.from, range.to, &region).await? {
            let merged = match coverage.get(&holiday.date) {
                Some(existing) => DayLength::merge([*existing, holiday.day_length]),
                None => Some(holiday.day_length),
            };
            if let Some(merged) = merged {
                coverage.insert(holiday.date, merged);
            }
        }
    }

    Ok(coverage)
}
