use crate::model::category::LeaveCategory;
use crate::model::department::Department;
use crate::model::holiday::{PublicHoliday, Region, WorkingTimeEntry, regions_in_range};
use crate::model::leave_request::{LeaveRequest, LeaveRequestId, LeaveStatus};
use crate::model::period::DateRange;
use crate::model::person::{Person, PersonId};
use crate::model::sick_note::SickNote;
use crate::model::supplemental::SupplementalRequest;
use crate::store::{
    CategoryCatalog, Directory, HolidayProvider, LeaveRequestFilter, LeaveRequestStore,
    SickNoteStore, StoreError, SupplementalStore, WorkingTimeHistory,
};
use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::{BTreeMap, HashMap};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

#[derive(Debug, Default)]
struct State {
    persons: BTreeMap<PersonId, Person>,
    departments: Vec<Department>,
    categories: Vec<LeaveCategory>,
    requests: BTreeMap<LeaveRequestId, LeaveRequest>,
    supplementals: BTreeMap<u64, SupplementalRequest>,
    sick_notes: Vec<SickNote>,
    holidays: Vec<(Region, PublicHoliday)>,
    working_time: HashMap<PersonId, Vec<WorkingTimeEntry>>,
    next_request_id: LeaveRequestId,
    next_supplemental_id: u64,
}

/// Process-local backend for tests and `STORAGE_BACKEND=memory`.
#[derive(Debug)]
pub struct MemoryStore {
    state: RwLock<State>,
    default_region: Region,
}

impl MemoryStore {
    pub fn new(default_region: Region) -> Self {
        Self {
            state: RwLock::new(State {
                next_request_id: 1,
                next_supplemental_id: 1,
                ..State::default()
            }),
            default_region,
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, State>, StoreError> {
        self.state
            .read()
            .map_err(|_| StoreError::Corrupt("memory store lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, State>, StoreError> {
        self.state
            .write()
            .map_err(|_| StoreError::Corrupt("memory store lock poisoned".to_string()))
    }

    pub fn add_person(&self, person: Person) -> Result<(), StoreError> {
        self.write()?.persons.insert(person.id, person);
        Ok(())
    }

    pub fn add_department(&self, department: Department) -> Result<(), StoreError> {
        self.write()?.departments.push(department);
        Ok(())
    }

    pub fn add_category(&self, category: LeaveCategory) -> Result<(), StoreError> {
        let mut state = self.write()?;
        state.categories.retain(|existing| existing.id != category.id);
        state.categories.push(category);
        Ok(())
    }

    pub fn add_sick_note(&self, note: SickNote) -> Result<(), StoreError> {
        self.write()?.sick_notes.push(note);
        Ok(())
    }

    pub fn add_holiday(&self, region: Region, holiday: PublicHoliday) -> Result<(), StoreError> {
        self.write()?.holidays.push((region, holiday));
        Ok(())
    }

    pub fn add_working_time(
        &self,
        person_id: PersonId,
        entry: WorkingTimeEntry,
    ) -> Result<(), StoreError> {
        self.write()?
            .working_time
            .entry(person_id)
            .or_default()
            .push(entry);
        Ok(())
    }

    pub fn remove_supplementals_of(&self, parent_id: LeaveRequestId) -> Result<(), StoreError> {
        self.write()?
            .supplementals
            .retain(|_, supplemental| supplemental.parent_id != parent_id);
        Ok(())
    }
}

fn matches_filter(request: &LeaveRequest, filter: &LeaveRequestFilter) -> bool {
    filter.person_id.is_none_or(|id| request.person_id == id)
        && filter.status.is_none_or(|status| request.status == status)
        && filter
            .period
            .is_none_or(|period| request.period().overlaps(&period))
}

#[async_trait]
impl LeaveRequestStore for MemoryStore {
    async fn find(&self, id: LeaveRequestId) -> Result<Option<LeaveRequest>, StoreError> {
        Ok(self.read()?.requests.get(&id).cloned())
    }

    async fn insert(
        &self,
        request: &LeaveRequest,
        supplementals: &[SupplementalRequest],
    ) -> Result<LeaveRequestId, StoreError> {
        let mut state = self.write()?;
        let id = state.next_request_id;
        state.next_request_id += 1;

        let mut stored = request.clone();
        stored.id = id;
        stored.version = 0;
        state.requests.insert(id, stored);

        for supplemental in supplementals {
            let supplemental_id = state.next_supplemental_id;
            state.next_supplemental_id += 1;

            let mut shadow = supplemental.clone();
            shadow.id = supplemental_id;
            shadow.parent_id = id;
            state.supplementals.insert(supplemental_id, shadow);
        }
        Ok(id)
    }

    async fn update(&self, request: &LeaveRequest) -> Result<u32, StoreError> {
        let mut state = self.write()?;
        let stored = state
            .requests
            .get_mut(&request.id)
            .ok_or(StoreError::NotFound)?;
        if stored.version != request.version {
            return Err(StoreError::Conflict);
        }

        let version = request.version + 1;
        *stored = request.clone();
        stored.version = version;
        Ok(version)
    }

    async fn list(&self, filter: &LeaveRequestFilter) -> Result<Vec<LeaveRequest>, StoreError> {
        Ok(self
            .read()?
            .requests
            .values()
            .filter(|request| matches_filter(request, filter))
            .cloned()
            .collect())
    }

    async fn open_in_range(
        &self,
        persons: &[PersonId],
        range: DateRange,
    ) -> Result<Vec<LeaveRequest>, StoreError> {
        Ok(self
            .read()?
            .requests
            .values()
            .filter(|request| {
                persons.contains(&request.person_id)
                    && request.status.is_open()
                    && request.period().overlaps(&range)
            })
            .cloned()
            .collect())
    }
}

#[async_trait]
impl SupplementalStore for MemoryStore {
    async fn for_parent(
        &self,
        parent_id: LeaveRequestId,
    ) -> Result<Vec<SupplementalRequest>, StoreError> {
        Ok(self
            .read()?
            .supplementals
            .values()
            .filter(|supplemental| supplemental.parent_id == parent_id)
            .cloned()
            .collect())
    }

    async fn update_supplemental_status(
        &self,
        id: u64,
        status: LeaveStatus,
    ) -> Result<(), StoreError> {
        let mut state = self.write()?;
        let stored = state.supplementals.get_mut(&id).ok_or(StoreError::NotFound)?;
        stored.status = status;
        Ok(())
    }
}

#[async_trait]
impl SickNoteStore for MemoryStore {
    async fn active_in_range(
        &self,
        persons: &[PersonId],
        range: DateRange,
    ) -> Result<Vec<SickNote>, StoreError> {
        Ok(self
            .read()?
            .sick_notes
            .iter()
            .filter(|note| {
                note.active && persons.contains(&note.person_id) && note.period.overlaps(&range)
            })
            .cloned()
            .collect())
    }
}

#[async_trait]
impl Directory for MemoryStore {
    async fn person(&self, id: PersonId) -> Result<Option<Person>, StoreError> {
        Ok(self.read()?.persons.get(&id).cloned())
    }

    async fn active_persons(&self) -> Result<Vec<Person>, StoreError> {
        Ok(self
            .read()?
            .persons
            .values()
            .filter(|person| person.is_active())
            .cloned()
            .collect())
    }

    async fn persons(&self, ids: &[PersonId]) -> Result<Vec<Person>, StoreError> {
        let state = self.read()?;
        Ok(ids
            .iter()
            .filter_map(|id| state.persons.get(id).cloned())
            .collect())
    }

    async fn departments(&self) -> Result<Vec<Department>, StoreError> {
        Ok(self.read()?.departments.clone())
    }
}

#[async_trait]
impl CategoryCatalog for MemoryStore {
    async fn categories(&self) -> Result<Vec<LeaveCategory>, StoreError> {
        Ok(self.read()?.categories.clone())
    }
}

#[async_trait]
impl HolidayProvider for MemoryStore {
    async fn holidays_in_range(
        &self,
        from: NaiveDate,
        to: NaiveDate,
        region: &Region,
    ) -> Result<Vec<PublicHoliday>, StoreError> {
        let range = DateRange::new(from, to);
        Ok(self
            .read()?
            .holidays
            .iter()
            .filter(|(holiday_region, holiday)| {
                holiday_region == region && range.contains(holiday.date)
            })
            .map(|(_, holiday)| holiday.clone())
            .collect())
    }
}

#[async_trait]
impl WorkingTimeHistory for MemoryStore {
    async fn regions_for_person_in_range(
        &self,
        person_id: PersonId,
        range: DateRange,
    ) -> Result<Vec<(DateRange, Region)>, StoreError> {
        let state = self.read()?;
        let history = state
            .working_time
            .get(&person_id)
            .map(Vec::as_slice)
            .unwrap_or_default();
        Ok(regions_in_range(history, range, &self.default_region))
    }
}
