use crate::model::category::CategoryId;
use crate::model::leave_request::{LeaveRequestId, LeaveStatus, Quantity};
use crate::model::period::{DateRange, DayLength};
use crate::model::person::PersonId;
use serde::{Deserialize, Serialize};

/// Year-scoped shadow of a leave request that crosses a year boundary.
/// Only its status follows the parent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupplementalRequest {
    pub id: u64,
    pub parent_id: LeaveRequestId,
    pub person_id: PersonId,
    pub year: i32,
    pub period: DateRange,
    pub day_length: DayLength,
    pub category_id: CategoryId,
    pub status: LeaveStatus,
    pub quantity: Quantity,
}
