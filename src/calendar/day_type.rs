use crate::calendar::CalendarError;
use crate::calendar::visibility::VisibilityGrant;
use crate::model::absence::{AbsenceStatus, Half, HalfDayRecord, RecordKind};
use crate::model::category::{Categories, CategoryColor, CategoryId, GENERIC_ABSENCE_COLOR};
use crate::model::leave_request::LeaveRequestId;
use crate::model::period::DayLength;
use serde::Serialize;
use utoipa::ToSchema;

/// One flag per part of the day. `full` is only set when morning and noon
/// collapsed, in which case both halves stay false.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, ToSchema)]
pub struct HalfFlags {
    pub morning: bool,
    pub noon: bool,
    pub full: bool,
}

impl HalfFlags {
    pub fn any(&self) -> bool {
        self.morning || self.noon || self.full
    }

    fn set(&mut self, part: DayPart) {
        match part {
            DayPart::Morning => self.morning = true,
            DayPart::Noon => self.noon = true,
            DayPart::Full => self.full = true,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, ToSchema)]
pub struct DayColors {
    pub morning: Option<CategoryColor>,
    pub noon: Option<CategoryColor>,
    pub full: Option<CategoryColor>,
}

impl DayColors {
    fn set(&mut self, part: DayPart, color: Option<CategoryColor>) {
        match part {
            DayPart::Morning => self.morning = color,
            DayPart::Noon => self.noon = color,
            DayPart::Full => self.full = color,
        }
    }
}

/// Viewer-scoped rendering of one person's day.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, ToSchema)]
pub struct DayType {
    pub approved_absence: HalfFlags,
    pub pending_absence: HalfFlags,
    pub sickness: HalfFlags,
    pub public_holiday: HalfFlags,
    pub color: DayColors,
}

impl DayType {
    /// ORs a public holiday onto the day without touching absences.
    pub fn overlay_public_holiday(&mut self, coverage: DayLength) {
        match coverage {
            DayLength::Full => self.public_holiday.full = true,
            DayLength::Morning => self.public_holiday.morning = true,
            DayLength::Noon => self.public_holiday.noon = true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DayPart {
    Morning,
    Noon,
    Full,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeaveState {
    Pending,
    Approved,
}

impl From<AbsenceStatus> for LeaveState {
    fn from(status: AbsenceStatus) -> Self {
        match status {
            AbsenceStatus::Waiting | AbsenceStatus::TemporarilyAllowed => LeaveState::Pending,
            AbsenceStatus::Allowed => LeaveState::Approved,
        }
    }
}

/// What occupies one half of a day, before visibility is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordCategory {
    Sickness,
    Leave {
        request_id: LeaveRequestId,
        category_id: CategoryId,
        state: LeaveState,
    },
}

impl RecordCategory {
    /// Morning and noon merge into one full day: sickness always, leave only
    /// when both halves come from the same request in the same state.
    fn collapses_with(&self, other: &RecordCategory) -> bool {
        match (self, other) {
            (RecordCategory::Sickness, RecordCategory::Sickness) => true,
            (
                RecordCategory::Leave {
                    request_id: a,
                    state: state_a,
                    ..
                },
                RecordCategory::Leave {
                    request_id: b,
                    state: state_b,
                    ..
                },
            ) => a == b && state_a == state_b,
            (RecordCategory::Sickness, RecordCategory::Leave { .. })
            | (RecordCategory::Leave { .. }, RecordCategory::Sickness) => false,
        }
    }
}

#[derive(Debug, Default)]
struct Slot {
    leave: Option<(LeaveRequestId, CategoryId, AbsenceStatus)>,
    sickness: Option<u64>,
}

impl Slot {
    fn add(&mut self, record: &HalfDayRecord) -> Result<(), CalendarError> {
        match record.kind {
            RecordKind::Leave {
                request_id,
                category_id,
                status,
            } => {
                let entry = (request_id, category_id, status);
                match self.leave {
                    Some(existing) if existing != entry => {
                        return Err(CalendarError::DataIntegrity(format!(
                            "person {} has two leave records on {} {:?}",
                            record.person_id, record.date, record.half
                        )));
                    }
                    _ => self.leave = Some(entry),
                }
            }
            RecordKind::Sickness { sick_note_id } => match self.sickness {
                Some(existing) if existing != sick_note_id => {
                    return Err(CalendarError::DataIntegrity(format!(
                        "person {} has two sickness records on {} {:?}",
                        record.person_id, record.date, record.half
                    )));
                }
                _ => self.sickness = Some(sick_note_id),
            },
        }
        Ok(())
    }

    fn category(&self) -> Option<RecordCategory> {
        if self.sickness.is_some() {
            return Some(RecordCategory::Sickness);
        }
        self.leave
            .map(|(request_id, category_id, status)| RecordCategory::Leave {
                request_id,
                category_id,
                state: status.into(),
            })
    }
}

/// Reduces the half-day records of one person and day into a [`DayType`].
#[derive(Debug, Clone, Copy)]
pub struct DayTypeResolver<'a> {
    categories: &'a Categories,
}

impl<'a> DayTypeResolver<'a> {
    pub fn new(categories: &'a Categories) -> Self {
        Self { categories }
    }

    pub fn resolve(
        &self,
        records: &[HalfDayRecord],
        grant: VisibilityGrant,
    ) -> Result<DayType, CalendarError> {
        let mut morning = Slot::default();
        let mut noon = Slot::default();
        for record in records {
            match record.half {
                Half::Morning => morning.add(record)?,
                Half::Noon => noon.add(record)?,
            }
        }

        let mut day = DayType::default();
        match (morning.category(), noon.category()) {
            (Some(a), Some(b)) if a.collapses_with(&b) => {
                self.render(&mut day, DayPart::Full, a, grant);
            }
            (a, b) => {
                if let Some(a) = a {
                    self.render(&mut day, DayPart::Morning, a, grant);
                }
                if let Some(b) = b {
                    self.render(&mut day, DayPart::Noon, b, grant);
                }
            }
        }
        Ok(day)
    }

    fn render(
        &self,
        day: &mut DayType,
        part: DayPart,
        category: RecordCategory,
        grant: VisibilityGrant,
    ) {
        match (grant, category) {
            (VisibilityGrant::Masked, _) => {
                day.approved_absence.set(part);
                day.color.set(part, Some(GENERIC_ABSENCE_COLOR));
            }
            (VisibilityGrant::Full, RecordCategory::Sickness) => {
                day.sickness.set(part);
            }
            (
                VisibilityGrant::Full,
                RecordCategory::Leave {
                    category_id, state, ..
                },
            ) => {
                match state {
                    LeaveState::Pending => day.pending_absence.set(part),
                    LeaveState::Approved => day.approved_absence.set(part),
                }
                day.color.set(part, self.categories.color_of(category_id));
            }
        }
    }
}
