use crate::model::department::Department;
use crate::model::person::{MailNotification, Person};
use crate::model::role::Role;
use crate::store::{Directory, StoreError};
use std::collections::HashSet;

/// Managers who get mail about leave requests of `subject`.
///
/// Office and boss with `ApplicationManagementAll` always qualify. With
/// departments configured, `ApplicationManagementDepartment` adds bosses
/// sharing a department with the subject and the heads and second stage
/// authorities leading one. Every recipient appears once.
pub fn recipients_of_interest(
    subject: &Person,
    departments: &[Department],
    active_persons: &[Person],
) -> Vec<Person> {
    let own: Vec<&Department> = departments
        .iter()
        .filter(|department| department.is_member(subject.id))
        .collect();

    let mut seen = HashSet::new();
    active_persons
        .iter()
        .filter(|person| person.id != subject.id)
        .filter(|person| {
            let for_all = person.wants(MailNotification::ApplicationManagementAll)
                && person.has_any_role(&[Role::Office, Role::Boss]);
            for_all
                || (!departments.is_empty()
                    && person.wants(MailNotification::ApplicationManagementDepartment)
                    && responsible_in(person, &own))
        })
        .filter(|person| seen.insert(person.id))
        .cloned()
        .collect()
}

fn responsible_in(person: &Person, departments: &[&Department]) -> bool {
    departments.iter().any(|department| {
        (person.has_role(Role::Boss) && department.is_member(person.id))
            || (person.has_role(Role::DepartmentHead)
                && department.department_heads.contains(&person.id))
            || (person.has_role(Role::SecondStageAuthority)
                && department.second_stage_authorities.contains(&person.id))
    })
}

/// Loads departments and active persons and applies [`recipients_of_interest`].
pub async fn recipients_for<D>(directory: &D, subject: &Person) -> Result<Vec<Person>, StoreError>
where
    D: Directory + ?Sized,
{
    let departments = directory.departments().await?;
    let active_persons = directory.active_persons().await?;
    Ok(recipients_of_interest(subject, &departments, &active_persons))
}
