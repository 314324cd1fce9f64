//! Absence calendar: merges leave and sickness half days into a colored,
//! viewer-scoped month grid.

pub mod day_type;
pub mod grid;
pub mod holidays;
pub mod selection;
pub mod visibility;

use crate::store::StoreError;
use derive_more::Display;

pub use day_type::{DayType, DayTypeResolver};
pub use grid::{CalendarDay, CalendarGridBuilder, CalendarMonth, CalendarPerson};
pub use visibility::{VisibilityGrant, VisibilityPolicy};

#[derive(Debug, Display)]
pub enum CalendarError {
    #[display(fmt = "invalid calendar request: {}", _0)]
    InvalidRequest(String),
    #[display(fmt = "malformed absence data: {}", _0)]
    DataIntegrity(String),
    #[display(fmt = "storage error: {}", _0)]
    Store(StoreError),
}

impl std::error::Error for CalendarError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CalendarError::Store(err) => Some(err),
            CalendarError::InvalidRequest(_) | CalendarError::DataIntegrity(_) => None,
        }
    }
}

impl From<StoreError> for CalendarError {
    fn from(value: StoreError) -> Self {
        CalendarError::Store(value)
    }
}
