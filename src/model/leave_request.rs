use crate::model::category::{CategoryId, LeaveCategory, QuantityUnit};
use crate::model::period::{DateRange, DayLength};
use crate::model::person::PersonId;
use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use derive_more::Display;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use strum_macros::{AsRefStr, Display as StrumDisplay, EnumString};

pub type LeaveRequestId = u64;

#[derive(
    Debug,
    Copy,
    Clone,
    Eq,
    PartialEq,
    Hash,
    Serialize,
    Deserialize,
    StrumDisplay,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum LeaveStatus {
    Waiting,
    TemporarilyAllowed,
    Allowed,
    Rejected,
    Cancelled,
    Revoked,
}

impl LeaveStatus {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            LeaveStatus::Rejected | LeaveStatus::Cancelled | LeaveStatus::Revoked
        )
    }

    /// Waiting, temporarily allowed and allowed requests still occupy the calendar.
    pub fn is_open(self) -> bool {
        matches!(
            self,
            LeaveStatus::Waiting | LeaveStatus::TemporarilyAllowed | LeaveStatus::Allowed
        )
    }

    pub fn can_transition_to(self, next: LeaveStatus) -> bool {
        use LeaveStatus::*;
        match (self, next) {
            (Waiting, TemporarilyAllowed) => true,
            (Waiting | TemporarilyAllowed, Allowed | Rejected | Cancelled | Revoked) => true,
            (Allowed, Cancelled) => true,
            _ => false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[display(fmt = "cannot move leave request from {} to {}", from, to)]
pub struct InvalidTransition {
    pub from: LeaveStatus,
    pub to: LeaveStatus,
}

impl std::error::Error for InvalidTransition {}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "unit", content = "amount", rename_all = "snake_case")]
pub enum Quantity {
    Days(Decimal),
    Hours(Decimal),
}

impl Quantity {
    pub fn of(unit: QuantityUnit, amount: Decimal) -> Self {
        match unit {
            QuantityUnit::Days => Quantity::Days(amount),
            QuantityUnit::Hours => Quantity::Hours(amount),
        }
    }

    pub fn unit(&self) -> QuantityUnit {
        match self {
            Quantity::Days(_) => QuantityUnit::Days,
            Quantity::Hours(_) => QuantityUnit::Hours,
        }
    }

    pub fn amount(&self) -> Decimal {
        match self {
            Quantity::Days(amount) | Quantity::Hours(amount) => *amount,
        }
    }
}

/// Everything an applicant provides when asking for leave.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaveRequestDraft {
    pub category_id: CategoryId,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub day_length: DayLength,
    pub two_stage_approval: bool,
    pub holiday_replacement_notes: Option<String>,
}

impl LeaveRequestDraft {
    pub fn new(category_id: CategoryId, start_date: NaiveDate, end_date: NaiveDate) -> Self {
        Self {
            category_id,
            start_date,
            end_date,
            start_time: None,
            end_time: None,
            day_length: DayLength::Full,
            two_stage_approval: false,
            holiday_replacement_notes: None,
        }
    }

    pub fn period(&self) -> DateRange {
        DateRange::new(self.start_date, self.end_date)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaveRequest {
    pub id: LeaveRequestId,
    pub person_id: PersonId,
    pub submitter_id: PersonId,
    pub approver_id: Option<PersonId>,
    pub status: LeaveStatus,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub day_length: DayLength,
    pub category: LeaveCategory,
    pub(crate) quantity: Quantity,
    pub submitted_at: Option<DateTime<Utc>>,
    pub decided_at: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
    #[serde(skip)]
    pub submitter_signature: Option<Vec<u8>>,
    #[serde(skip)]
    pub approver_signature: Option<Vec<u8>>,
    pub two_stage_approval: bool,
    pub holiday_replacement_notes: Option<String>,
    pub version: u32,
}

impl LeaveRequest {
    /// A not yet persisted request in state `Waiting`.
    pub fn from_draft(
        draft: LeaveRequestDraft,
        person_id: PersonId,
        submitter_id: PersonId,
        category: LeaveCategory,
        quantity: Quantity,
        submitted_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: 0,
            person_id,
            submitter_id,
            approver_id: None,
            status: LeaveStatus::Waiting,
            start_date: draft.start_date,
            end_date: draft.end_date,
            start_time: draft.start_time,
            end_time: draft.end_time,
            day_length: draft.day_length,
            two_stage_approval: draft.two_stage_approval || category.two_stage_approval,
            category,
            quantity,
            submitted_at: Some(submitted_at),
            decided_at: None,
            cancelled_at: None,
            submitter_signature: None,
            approver_signature: None,
            holiday_replacement_notes: draft.holiday_replacement_notes,
            version: 0,
        }
    }

    pub fn quantity(&self) -> Quantity {
        self.quantity
    }

    pub fn period(&self) -> DateRange {
        DateRange::new(self.start_date, self.end_date)
    }

    pub fn has_status(&self, status: LeaveStatus) -> bool {
        self.status == status
    }

    /// Cancelled requests were allowed before, revoked ones never were.
    pub fn is_formerly_allowed(&self) -> bool {
        self.has_status(LeaveStatus::Cancelled)
    }

    pub fn crosses_year(&self) -> bool {
        self.start_date.year() != self.end_date.year()
    }

    pub fn start_date_time(&self) -> Option<NaiveDateTime> {
        self.start_time.map(|time| self.start_date.and_time(time))
    }

    pub fn end_date_time(&self) -> Option<NaiveDateTime> {
        self.end_time.map(|time| self.end_date.and_time(time))
    }

    /// Distributes the quantity over the calendar years the request touches,
    /// proportionally to the calendar days in each year.
    pub fn quantity_by_year(&self) -> BTreeMap<i32, Decimal> {
        let period = self.period();
        let total = Decimal::from(period.day_count());
        if total.is_zero() {
            return BTreeMap::new();
        }

        period
            .split_by_year()
            .into_iter()
            .map(|(year, part)| {
                let share = self.quantity.amount() * Decimal::from(part.day_count()) / total;
                (year, share)
            })
            .collect()
    }

    pub fn transition(&mut self, next: LeaveStatus) -> Result<(), InvalidTransition> {
        if !self.status.can_transition_to(next) {
            return Err(InvalidTransition {
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        Ok(())
    }
}
