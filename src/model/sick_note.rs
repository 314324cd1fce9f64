use crate::model::period::{DateRange, DayLength};
use crate::model::person::PersonId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SickNote {
    pub id: u64,
    pub person_id: PersonId,
    pub period: DateRange,
    pub day_length: DayLength,
    pub active: bool,
}
