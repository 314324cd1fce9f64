use crate::lifecycle::error::LifecycleError;
use crate::lifecycle::working_time::WorkingTimeCalculator;
use crate::model::leave_request::{LeaveRequest, LeaveStatus};
use crate::model::supplemental::SupplementalRequest;
use crate::store::SupplementalStore;
use chrono::Datelike;
use std::sync::Arc;
use tracing::debug;

/// Keeps the year-scoped shadows of a year-crossing request in step with it.
pub struct SupplementalLinker<S: ?Sized> {
    store: Arc<S>,
}

impl<S> SupplementalLinker<S>
where
    S: SupplementalStore + ?Sized,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// The two shadows of `request`, or none when it stays within one year.
    pub async fn pair_for(
        &self,
        request: &LeaveRequest,
    ) -> Result<Vec<SupplementalRequest>, LifecycleError> {
        if !request.crosses_year() {
            return Ok(Vec::new());
        }

        let mut pair = self.store.for_parent(request.id).await?;
        pair.sort_by_key(|supplemental| supplemental.year);

        let years: Vec<i32> = pair.iter().map(|supplemental| supplemental.year).collect();
        let expected = vec![request.start_date.year(), request.end_date.year()];
        if years != expected {
            return Err(LifecycleError::DataIntegrity(format!(
                "leave request {} crosses {:?} but has supplemental requests for {:?}",
                request.id, expected, years
            )));
        }

        Ok(pair)
    }

    /// Persists `status` on every shadow, one by one.
    pub async fn apply(
        &self,
        pair: &[SupplementalRequest],
        status: LeaveStatus,
    ) -> Result<(), LifecycleError> {
        for supplemental in pair {
            self.store
                .update_supplemental_status(supplemental.id, status)
                .await?;
            debug!(
                supplemental_id = supplemental.id,
                parent_id = supplemental.parent_id,
                status = %status,
                "Supplemental request updated"
            );
        }
        Ok(())
    }
}

/// One shadow per touched year, each priced for its own part of the period.
/// Nothing is written; `parent_id` is filled in when the parent is stored.
pub async fn plan_shadows(
    request: &LeaveRequest,
    calculator: &dyn WorkingTimeCalculator,
) -> Result<Vec<SupplementalRequest>, LifecycleError> {
    if !request.crosses_year() {
        return Ok(Vec::new());
    }

    let mut planned = Vec::new();
    for (year, period) in request.period().split_by_year() {
        let quantity = calculator
            .quantity(
                request.person_id,
                period,
                request.day_length,
                request.category.unit,
            )
            .await?;

        planned.push(SupplementalRequest {
            id: 0,
            parent_id: 0,
            person_id: request.person_id,
            year,
            period,
            day_length: request.day_length,
            category_id: request.category.id,
            status: request.status,
            quantity,
        });
    }

    debug!(
        person_id = request.person_id,
        count = planned.len(),
        "Supplemental requests planned"
    );
    Ok(planned)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::working_time::HolidayAwareCalculator;
    use crate::model::holiday::Region;
    use crate::model::leave_request::tests::{date, request};
    use crate::store::LeaveRequestStore;
    use crate::store::memory::MemoryStore;
    use rust_decimal_macros::dec;

    fn crossing_request() -> LeaveRequest {
        let mut leave = request(LeaveStatus::Waiting);
        leave.id = 7;
        leave.start_date = date(2022, 12, 30);
        leave.end_date = date(2023, 1, 2);
        leave
    }

    #[actix_web::test]
    async fn single_year_request_has_no_pair() {
        let store = Arc::new(MemoryStore::new(Region::new("GERMANY_BERLIN")));
        let linker = SupplementalLinker::new(store);

        let pair = linker.pair_for(&request(LeaveStatus::Waiting)).await.unwrap();
        assert!(pair.is_empty());
    }

    #[actix_web::test]
    async fn missing_pair_is_a_data_integrity_error() {
        let store = Arc::new(MemoryStore::new(Region::new("GERMANY_BERLIN")));
        let linker = SupplementalLinker::new(store);

        let err = linker.pair_for(&crossing_request()).await.unwrap_err();
        assert!(matches!(err, LifecycleError::DataIntegrity(_)));
    }

    #[actix_web::test]
    async fn shadows_get_their_own_quantity_and_follow_status() {
        let store = Arc::new(MemoryStore::new(Region::new("GERMANY_BERLIN")));
        let calculator = HolidayAwareCalculator::new(store.clone(), dec!(8));
        let linker = SupplementalLinker::new(store.clone());
        let mut leave = crossing_request();

        let planned = plan_shadows(&leave, &calculator).await.unwrap();
        assert_eq!(planned.len(), 2);
        // Fri Dec 30 and Mon Jan 2
        assert_eq!(planned[0].quantity.amount(), dec!(1));
        assert_eq!(planned[1].quantity.amount(), dec!(1));
        assert!(store.for_parent(leave.id).await.unwrap().is_empty());

        leave.id = store.insert(&leave, &planned).await.unwrap();
        let pair = linker.pair_for(&leave).await.unwrap();
        linker.apply(&pair, LeaveStatus::Cancelled).await.unwrap();

        let stored = store.for_parent(leave.id).await.unwrap();
        assert_eq!(stored.len(), 2);
        assert!(
            stored
                .iter()
                .all(|supplemental| supplemental.status == LeaveStatus::Cancelled)
        );
    }

    #[actix_web::test]
    async fn single_year_request_plans_no_shadows() {
        let store = Arc::new(MemoryStore::new(Region::new("GERMANY_BERLIN")));
        let calculator = HolidayAwareCalculator::new(store, dec!(8));

        let planned = plan_shadows(&request(LeaveStatus::Waiting), &calculator)
            .await
            .unwrap();
        assert!(planned.is_empty());
    }
}
