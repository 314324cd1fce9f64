use crate::calendar::holidays::coverage_for_person;
use crate::model::category::QuantityUnit;
use crate::model::leave_request::Quantity;
use crate::model::period::{DateRange, DayLength, is_weekend};
use crate::model::person::PersonId;
use crate::store::{HolidayProvider, StoreError, WorkingTimeHistory};
use async_trait::async_trait;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::Arc;

/// Computes how much leave a period costs a person.
#[async_trait]
pub trait WorkingTimeCalculator: Send + Sync {
    async fn quantity(
        &self,
        person_id: PersonId,
        period: DateRange,
        day_length: DayLength,
        unit: QuantityUnit,
    ) -> Result<Quantity, StoreError>;
}

/// Counts Monday to Friday, minus the public holidays of the region the
/// person works in on each day.
pub struct HolidayAwareCalculator<S: ?Sized> {
    store: Arc<S>,
    hours_per_day: Decimal,
}

impl<S: ?Sized> HolidayAwareCalculator<S> {
    pub fn new(store: Arc<S>, hours_per_day: Decimal) -> Self {
        Self {
            store,
            hours_per_day,
        }
    }
}

/// Share of `day` still to be worked when `holiday` is off anyway.
fn billable_fraction(day_length: DayLength, holiday: Option<DayLength>) -> Decimal {
    let off_morning = holiday.is_some_and(DayLength::covers_morning);
    let off_noon = holiday.is_some_and(DayLength::covers_noon);

    let mut fraction = Decimal::ZERO;
    if day_length.covers_morning() && !off_morning {
        fraction += dec!(0.5);
    }
    if day_length.covers_noon() && !off_noon {
        fraction += dec!(0.5);
    }
    fraction
}

#[async_trait]
impl<S> WorkingTimeCalculator for HolidayAwareCalculator<S>
where
    S: HolidayProvider + WorkingTimeHistory + ?Sized,
{
    async fn quantity(
        &self,
        person_id: PersonId,
        period: DateRange,
        day_length: DayLength,
        unit: QuantityUnit,
    ) -> Result<Quantity, StoreError> {
        let holidays = coverage_for_person(self.store.as_ref(), person_id, period).await?;

        let days: Decimal = period
            .days()
            .filter(|day| !is_weekend(*day))
            .map(|day| billable_fraction(day_length, holidays.get(&day).copied()))
            .sum();

        Ok(match unit {
            QuantityUnit::Days => Quantity::Days(days),
            QuantityUnit::Hours => Quantity::Hours(days * self.hours_per_day),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::holiday::{PublicHoliday, Region};
    use crate::store::memory::MemoryStore;
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn calculator(store: MemoryStore) -> HolidayAwareCalculator<MemoryStore> {
        HolidayAwareCalculator::new(Arc::new(store), dec!(8))
    }

    fn holiday(date: NaiveDate, day_length: DayLength) -> PublicHoliday {
        PublicHoliday {
            date,
            day_length,
            description: "holiday".to_string(),
        }
    }

    #[actix_web::test]
    async fn weekends_are_not_counted() {
        let store = MemoryStore::new(Region::new("GERMANY_BERLIN"));
        // Friday to Monday
        let period = DateRange::new(date(2022, 3, 4), date(2022, 3, 7));

        let quantity = calculator(store)
            .quantity(1, period, DayLength::Full, QuantityUnit::Days)
            .await
            .unwrap();

        assert_eq!(quantity, Quantity::Days(dec!(2)));
    }

    #[actix_web::test]
    async fn regional_holidays_reduce_the_quantity() {
        let berlin = Region::new("GERMANY_BERLIN");
        let store = MemoryStore::new(berlin.clone());
        store
            .add_holiday(berlin.clone(), holiday(date(2022, 12, 26), DayLength::Full))
            .unwrap();
        store
            .add_holiday(berlin.clone(), holiday(date(2022, 12, 30), DayLength::Noon))
            .unwrap();
        store
            .add_holiday(
                Region::new("GERMANY_BAYERN"),
                holiday(date(2022, 12, 27), DayLength::Full),
            )
            .unwrap();

        let period = DateRange::new(date(2022, 12, 26), date(2022, 12, 30));
        let quantity = calculator(store)
            .quantity(1, period, DayLength::Full, QuantityUnit::Days)
            .await
            .unwrap();

        assert_eq!(quantity, Quantity::Days(dec!(3.5)));
    }

    #[actix_web::test]
    async fn half_days_and_hours() {
        let store = MemoryStore::new(Region::new("GERMANY_BERLIN"));
        let period = DateRange::new(date(2022, 3, 7), date(2022, 3, 8));

        let quantity = calculator(store)
            .quantity(1, period, DayLength::Morning, QuantityUnit::Hours)
            .await
            .unwrap();

        assert_eq!(quantity, Quantity::Hours(dec!(8)));
    }

    #[test]
    fn half_day_holiday_only_frees_its_own_half() {
        assert_eq!(
            billable_fraction(DayLength::Morning, Some(DayLength::Noon)),
            dec!(0.5)
        );
        assert_eq!(
            billable_fraction(DayLength::Noon, Some(DayLength::Noon)),
            Decimal::ZERO
        );
        assert_eq!(billable_fraction(DayLength::Full, None), Decimal::ONE);
    }
}
