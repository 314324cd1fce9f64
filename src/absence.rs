//! Turns open leave requests and sick notes into half-day records.

use crate::model::absence::{AbsenceStatus, Half, HalfDayRecord};
use crate::model::leave_request::LeaveRequest;
use crate::model::period::{DateRange, DayLength};
use crate::model::person::PersonId;
use crate::model::sick_note::SickNote;
use crate::store::{LeaveRequestStore, SickNoteStore, StoreError};
use async_trait::async_trait;
use chrono::NaiveDate;
use std::sync::Arc;

#[async_trait]
pub trait AbsenceRecordCollector: Send + Sync {
    /// Every open leave and sickness half day of `persons` between `from`
    /// and `to`, both inclusive.
    async fn open_absences(
        &self,
        persons: &[PersonId],
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<HalfDayRecord>, StoreError>;
}

fn halves(day_length: DayLength) -> &'static [Half] {
    match day_length {
        DayLength::Full => &[Half::Morning, Half::Noon],
        DayLength::Morning => &[Half::Morning],
        DayLength::Noon => &[Half::Noon],
    }
}

/// Half days of an open request inside `window`; closed requests yield none.
pub fn expand_leave(request: &LeaveRequest, window: DateRange) -> Vec<HalfDayRecord> {
    let Some(status) = AbsenceStatus::from_leave_status(request.status) else {
        return Vec::new();
    };
    let Some(range) = request.period().intersect(&window) else {
        return Vec::new();
    };

    range
        .days()
        .flat_map(|date| {
            halves(request.day_length).iter().map(move |half| {
                HalfDayRecord::leave(
                    request.person_id,
                    date,
                    *half,
                    request.id,
                    request.category.id,
                    status,
                )
            })
        })
        .collect()
}

pub fn expand_sick_note(note: &SickNote, window: DateRange) -> Vec<HalfDayRecord> {
    if !note.active {
        return Vec::new();
    }
    let Some(range) = note.period.intersect(&window) else {
        return Vec::new();
    };

    range
        .days()
        .flat_map(|date| {
            halves(note.day_length)
                .iter()
                .map(move |half| HalfDayRecord::sickness(note.person_id, date, *half, note.id))
        })
        .collect()
}

/// Collects records straight from the request and sick note stores.
pub struct StoreAbsenceCollector<S: ?Sized> {
    store: Arc<S>,
}

impl<S: ?Sized> StoreAbsenceCollector<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl<S> AbsenceRecordCollector for StoreAbsenceCollector<S>
where
    S: LeaveRequestStore + SickNoteStore + ?Sized,
{
    async fn open_absences(
        &self,
        persons: &[PersonId],
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<HalfDayRecord>, StoreError> {
        let window = DateRange::new(from, to);
        if window.is_empty() || persons.is_empty() {
            return Ok(Vec::new());
        }

        let requests = self.store.open_in_range(persons, window).await?;
        let sick_notes = self.store.active_in_range(persons, window).await?;

        let mut records: Vec<HalfDayRecord> = requests
            .iter()
            .flat_map(|request| expand_leave(request, window))
            .collect();
        records.extend(
            sick_notes
                .iter()
                .flat_map(|note| expand_sick_note(note, window)),
        );
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::absence::RecordKind;
    use crate::model::holiday::Region;
    use crate::model::leave_request::LeaveStatus;
    use crate::model::leave_request::tests::{date, request};
    use crate::store::memory::MemoryStore;

    #[test]
    fn full_day_request_yields_both_halves_with_same_origin() {
        let mut leave = request(LeaveStatus::Allowed);
        leave.id = 4;

        let records = expand_leave(&leave, DateRange::of_month(2022, 3).unwrap());

        assert_eq!(records.len(), 4);
        assert!(records.iter().all(|record| matches!(
            record.kind,
            RecordKind::Leave {
                request_id: 4,
                status: AbsenceStatus::Allowed,
                ..
            }
        )));
        assert_eq!(records[0].half, Half::Morning);
        assert_eq!(records[1].half, Half::Noon);
    }

    #[test]
    fn expansion_is_clipped_to_the_window() {
        let mut leave = request(LeaveStatus::Waiting);
        leave.start_date = date(2022, 2, 27);
        leave.end_date = date(2022, 3, 2);
        leave.day_length = DayLength::Noon;

        let records = expand_leave(&leave, DateRange::of_month(2022, 3).unwrap());

        let days: Vec<NaiveDate> = records.iter().map(|record| record.date).collect();
        assert_eq!(days, vec![date(2022, 3, 1), date(2022, 3, 2)]);
        assert!(records.iter().all(|record| record.half == Half::Noon));
    }

    #[test]
    fn closed_requests_are_not_absences() {
        let cancelled = request(LeaveStatus::Cancelled);
        assert!(expand_leave(&cancelled, DateRange::of_month(2022, 3).unwrap()).is_empty());
    }

    #[actix_web::test]
    async fn collector_merges_leave_and_sickness() {
        let store = Arc::new(MemoryStore::new(Region::new("GERMANY_BERLIN")));
        store.insert(&request(LeaveStatus::Waiting), &[]).await.unwrap();
        store
            .add_sick_note(SickNote {
                id: 3,
                person_id: 10,
                period: DateRange::new(date(2022, 3, 4), date(2022, 3, 4)),
                day_length: DayLength::Morning,
                active: true,
            })
            .unwrap();
        store
            .add_sick_note(SickNote {
                id: 4,
                person_id: 10,
                period: DateRange::new(date(2022, 3, 8), date(2022, 3, 8)),
                day_length: DayLength::Full,
                active: false,
            })
            .unwrap();

        let collector = StoreAbsenceCollector::new(store);
        let records = collector
            .open_absences(&[10], date(2022, 3, 1), date(2022, 3, 31))
            .await
            .unwrap();

        assert_eq!(records.len(), 5);
        assert_eq!(
            records
                .iter()
                .filter(|record| matches!(record.kind, RecordKind::Sickness { sick_note_id: 3 }))
                .count(),
            1
        );
    }
}
