use crate::model::category::CategoryId;
use crate::model::leave_request::{LeaveRequestId, LeaveStatus};
use crate::model::person::PersonId;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Half {
    Morning,
    Noon,
}

/// Status of a leave that still shows up in the calendar.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AbsenceStatus {
    Waiting,
    TemporarilyAllowed,
    Allowed,
}

impl AbsenceStatus {
    pub fn from_leave_status(status: LeaveStatus) -> Option<Self> {
        match status {
            LeaveStatus::Waiting => Some(AbsenceStatus::Waiting),
            LeaveStatus::TemporarilyAllowed => Some(AbsenceStatus::TemporarilyAllowed),
            LeaveStatus::Allowed => Some(AbsenceStatus::Allowed),
            LeaveStatus::Rejected | LeaveStatus::Cancelled | LeaveStatus::Revoked => None,
        }
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RecordKind {
    Leave {
        request_id: LeaveRequestId,
        category_id: CategoryId,
        status: AbsenceStatus,
    },
    Sickness {
        sick_note_id: u64,
    },
}

/// One person, one day, one half.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct HalfDayRecord {
    pub person_id: PersonId,
    pub date: NaiveDate,
    pub half: Half,
    pub kind: RecordKind,
}

impl HalfDayRecord {
    pub fn leave(
        person_id: PersonId,
        date: NaiveDate,
        half: Half,
        request_id: LeaveRequestId,
        category_id: CategoryId,
        status: AbsenceStatus,
    ) -> Self {
        Self {
            person_id,
            date,
            half,
            kind: RecordKind::Leave {
                request_id,
                category_id,
                status,
            },
        }
    }

    pub fn sickness(person_id: PersonId, date: NaiveDate, half: Half, sick_note_id: u64) -> Self {
        Self {
            person_id,
            date,
            half,
            kind: RecordKind::Sickness { sick_note_id },
        }
    }
}
