use crate::model::department::Department;
use crate::model::person::Person;
use crate::model::role::Role;
use crate::store::{Directory, StoreError};
use serde::Serialize;
use std::collections::HashSet;

const LEADING_ROLES: [Role; 2] = [Role::DepartmentHead, Role::SecondStageAuthority];
const ORGANIZATION_ROLES: [Role; 2] = [Role::Office, Role::Boss];

/// Departments and persons shown in one calendar request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Selection {
    pub visible_departments: Vec<String>,
    pub selected_departments: Vec<String>,
    #[serde(skip)]
    pub subjects: Vec<Person>,
}

/// Office and boss see every department, heads and second stage
/// authorities the ones they lead, everybody else their own.
pub fn visible_departments<'a>(viewer: &Person, departments: &'a [Department]) -> Vec<&'a Department> {
    if viewer.has_any_role(&ORGANIZATION_ROLES) {
        return departments.iter().collect();
    }

    let leads = viewer.has_any_role(&LEADING_ROLES);
    departments
        .iter()
        .filter(|department| {
            if leads {
                department.is_led_by(viewer.id)
            } else {
                department.is_member(viewer.id)
            }
        })
        .collect()
}

pub fn select(
    viewer: &Person,
    departments: &[Department],
    active_persons: &[Person],
    requested: &[String],
) -> Selection {
    if departments.is_empty() {
        let privileged = viewer.has_any_role(&ORGANIZATION_ROLES) || viewer.has_any_role(&LEADING_ROLES);
        return Selection {
            visible_departments: Vec::new(),
            selected_departments: Vec::new(),
            subjects: if privileged {
                active_persons.to_vec()
            } else {
                vec![viewer.clone()]
            },
        };
    }

    let visible = visible_departments(viewer, departments);
    if visible.is_empty() {
        return Selection {
            visible_departments: Vec::new(),
            selected_departments: Vec::new(),
            subjects: vec![viewer.clone()],
        };
    }

    let wanted: HashSet<&str> = requested
        .iter()
        .map(|name| name.trim())
        .filter(|name| !name.is_empty())
        .collect();

    let mut selected: Vec<&Department> = visible
        .iter()
        .copied()
        .filter(|department| wanted.contains(department.name.as_str()))
        .collect();
    if selected.is_empty() {
        selected = visible.iter().copied().take(1).collect();
    }

    let mut seen = HashSet::new();
    let subjects = selected
        .iter()
        .flat_map(|department| department.members.iter())
        .filter(|id| seen.insert(**id))
        .filter_map(|id| active_persons.iter().find(|person| person.id == *id))
        .cloned()
        .collect();

    Selection {
        visible_departments: visible.iter().map(|d| d.name.clone()).collect(),
        selected_departments: selected.iter().map(|d| d.name.clone()).collect(),
        subjects,
    }
}

/// Loads departments and active persons and applies [`select`].
pub async fn select_from<D>(
    directory: &D,
    viewer: &Person,
    requested: &[String],
) -> Result<Selection, StoreError>
where
    D: Directory + ?Sized,
{
    let departments = directory.departments().await?;
    let active_persons = directory.active_persons().await?;
    Ok(select(viewer, &departments, &active_persons, requested))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn person(id: u64, name: &str, roles: Vec<Role>) -> Person {
        Person::new(id, name, "doe", roles)
    }

    fn department(id: u64, name: &str, members: &[u64]) -> Department {
        let mut department = Department::new(id, name);
        department.members = members.to_vec();
        department
    }

    #[test]
    fn outsider_only_sees_themselves() {
        let viewer = person(1, "sandra", vec![Role::User]);
        let departments = vec![department(1, "heroes", &[2])];

        let selection = select(&viewer, &departments, &[], &[]);

        assert!(selection.visible_departments.is_empty());
        assert_eq!(selection.subjects, vec![viewer]);
    }

    #[test]
    fn without_departments_privileged_viewers_see_all_active_persons() {
        let active = vec![person(2, "kim", vec![Role::User]), person(3, "ali", vec![Role::User])];

        for role in [Role::Office, Role::Boss, Role::DepartmentHead, Role::SecondStageAuthority] {
            let viewer = person(1, "sandra", vec![Role::User, role]);
            assert_eq!(select(&viewer, &[], &active, &[]).subjects, active);
        }

        let user = person(1, "sandra", vec![Role::User]);
        assert_eq!(select(&user, &[], &active, &[]).subjects, vec![user]);
    }

    #[test]
    fn first_visible_department_is_selected_by_default() {
        let viewer = person(1, "sandra", vec![Role::Office]);
        let active = vec![person(2, "kim", vec![Role::User]), person(3, "ali", vec![Role::User])];
        let departments = vec![department(1, "superheroes", &[2]), department(2, "villains", &[3])];

        for requested in [vec![], vec!["  ".to_string()], vec!["unknown".to_string()]] {
            let selection = select(&viewer, &departments, &active, &requested);
            assert_eq!(selection.selected_departments, vec!["superheroes".to_string()]);
            assert_eq!(selection.visible_departments.len(), 2);
        }
    }

    #[test]
    fn overlapping_departments_list_members_once() {
        let viewer = person(1, "sandra", vec![Role::Boss]);
        let active = vec![
            person(2, "kim", vec![Role::User]),
            person(3, "ali", vec![Role::User]),
            person(4, "gone", vec![Role::Inactive]),
        ];
        let departments = vec![department(1, "heroes", &[2, 3]), department(2, "villains", &[3, 4])];
        let requested = vec!["heroes".to_string(), "villains".to_string()];

        let selection = select(&viewer, &departments, &active[..2], &requested);

        let ids: Vec<u64> = selection.subjects.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![2, 3]);
    }

    #[test]
    fn department_heads_see_departments_they_lead() {
        let viewer = person(1, "sandra", vec![Role::DepartmentHead]);
        let mut led = department(1, "heroes", &[2]);
        led.department_heads.push(1);
        let departments = vec![led, department(2, "villains", &[1, 3])];

        let visible = visible_departments(&viewer, &departments);

        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].name, "heroes");
    }
}
