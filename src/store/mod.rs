//! Storage contracts the core consumes, with a MySQL and an in-memory backend.

use crate::model::category::LeaveCategory;
use crate::model::department::Department;
use crate::model::holiday::{PublicHoliday, Region};
use crate::model::leave_request::{LeaveRequest, LeaveRequestId, LeaveStatus};
use crate::model::period::DateRange;
use crate::model::person::{Person, PersonId};
use crate::model::sick_note::SickNote;
use crate::model::supplemental::SupplementalRequest;
use async_trait::async_trait;
use chrono::NaiveDate;
use derive_more::Display;

pub mod memory;
pub mod mysql;

#[derive(Debug, Display)]
pub enum StoreError {
    #[display(fmt = "record not found")]
    NotFound,
    #[display(fmt = "record was modified concurrently")]
    Conflict,
    #[display(fmt = "corrupt record: {}", _0)]
    Corrupt(String),
    #[display(fmt = "database error: {}", _0)]
    Database(sqlx::Error),
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StoreError::Database(err) => Some(err),
            StoreError::NotFound | StoreError::Conflict | StoreError::Corrupt(_) => None,
        }
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(value: sqlx::Error) -> Self {
        match value {
            sqlx::Error::RowNotFound => StoreError::NotFound,
            other => StoreError::Database(other),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LeaveRequestFilter {
    pub person_id: Option<PersonId>,
    pub status: Option<LeaveStatus>,
    /// Requests touching this window.
    pub period: Option<DateRange>,
}

#[async_trait]
pub trait LeaveRequestStore: Send + Sync {
    async fn find(&self, id: LeaveRequestId) -> Result<Option<LeaveRequest>, StoreError>;

    /// Stores `request` and its supplemental requests in one unit: either all
    /// rows land or none. The supplementals' `parent_id` is set to the new id.
    async fn insert(
        &self,
        request: &LeaveRequest,
        supplementals: &[SupplementalRequest],
    ) -> Result<LeaveRequestId, StoreError>;

    /// Writes `request` if the stored version still equals `request.version`
    /// and returns the new version.
    async fn update(&self, request: &LeaveRequest) -> Result<u32, StoreError>;

    async fn list(&self, filter: &LeaveRequestFilter) -> Result<Vec<LeaveRequest>, StoreError>;

    async fn open_in_range(
        &self,
        persons: &[PersonId],
        range: DateRange,
    ) -> Result<Vec<LeaveRequest>, StoreError>;
}

#[async_trait]
pub trait SupplementalStore: Send + Sync {
    async fn for_parent(
        &self,
        parent_id: LeaveRequestId,
    ) -> Result<Vec<SupplementalRequest>, StoreError>;

    async fn update_supplemental_status(
        &self,
        id: u64,
        status: LeaveStatus,
    ) -> Result<(), StoreError>;
}

#[async_trait]
pub trait SickNoteStore: Send + Sync {
    async fn active_in_range(
        &self,
        persons: &[PersonId],
        range: DateRange,
    ) -> Result<Vec<SickNote>, StoreError>;
}

/// Persons, their roles and departments.
#[async_trait]
pub trait Directory: Send + Sync {
    async fn person(&self, id: PersonId) -> Result<Option<Person>, StoreError>;

    async fn active_persons(&self) -> Result<Vec<Person>, StoreError>;

    async fn persons(&self, ids: &[PersonId]) -> Result<Vec<Person>, StoreError>;

    async fn departments(&self) -> Result<Vec<Department>, StoreError>;
}

#[async_trait]
pub trait CategoryCatalog: Send + Sync {
    async fn categories(&self) -> Result<Vec<LeaveCategory>, StoreError>;
}

#[async_trait]
pub trait HolidayProvider: Send + Sync {
    async fn holidays_in_range(
        &self,
        from: NaiveDate,
        to: NaiveDate,
        region: &Region,
    ) -> Result<Vec<PublicHoliday>, StoreError>;
}

#[async_trait]
pub trait WorkingTimeHistory: Send + Sync {
    async fn regions_for_person_in_range(
        &self,
        person_id: PersonId,
        range: DateRange,
    ) -> Result<Vec<(DateRange, Region)>, StoreError>;
}

/// A backend serving every storage contract.
pub trait Backend:
    LeaveRequestStore
    + SupplementalStore
    + SickNoteStore
    + Directory
    + CategoryCatalog
    + HolidayProvider
    + WorkingTimeHistory
{
}

impl<T> Backend for T where
    T: LeaveRequestStore
        + SupplementalStore
        + SickNoteStore
        + Directory
        + CategoryCatalog
        + HolidayProvider
        + WorkingTimeHistory
{
}
