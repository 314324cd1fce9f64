use crate::model::person::Person;
use crate::model::role::Role;
use serde::{Deserialize, Serialize};

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VisibilityGrant {
    /// Actual categories, colors and pending state.
    Full,
    /// Only a generic absence marker.
    Masked,
}

/// Decides how much of a subject's absences a viewer may see.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisibilityPolicy {
    privileged_roles: Vec<Role>,
}

impl Default for VisibilityPolicy {
    fn default() -> Self {
        Self::new(vec![Role::Office, Role::Boss])
    }
}

impl VisibilityPolicy {
    pub fn new(privileged_roles: Vec<Role>) -> Self {
        Self { privileged_roles }
    }

    pub fn privileged_roles(&self) -> &[Role] {
        &self.privileged_roles
    }

    pub fn is_privileged(&self, person: &Person) -> bool {
        person.has_any_role(&self.privileged_roles)
    }

    pub fn grant_for(&self, viewer: &Person, subject: &Person) -> VisibilityGrant {
        if self.is_privileged(viewer) || viewer.id == subject.id {
            VisibilityGrant::Full
        } else {
            VisibilityGrant::Masked
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn office_boss_and_self_see_everything() {
        let policy = VisibilityPolicy::default();
        let user = Person::new(1, "sandra", "smith", vec![Role::User]);
        let colleague = Person::new(2, "kim", "jones", vec![Role::User]);
        let office = Person::new(3, "otto", "office", vec![Role::User, Role::Office]);
        let boss = Person::new(4, "bernd", "boss", vec![Role::Boss]);

        assert_eq!(policy.grant_for(&office, &user), VisibilityGrant::Full);
        assert_eq!(policy.grant_for(&boss, &user), VisibilityGrant::Full);
        assert_eq!(policy.grant_for(&user, &user), VisibilityGrant::Full);
        assert_eq!(policy.grant_for(&colleague, &user), VisibilityGrant::Masked);
    }

    #[test]
    fn department_heads_are_masked_unless_configured() {
        let head = Person::new(5, "dana", "head", vec![Role::DepartmentHead]);
        let user = Person::new(1, "sandra", "smith", vec![Role::User]);

        assert_eq!(
            VisibilityPolicy::default().grant_for(&head, &user),
            VisibilityGrant::Masked
        );

        let widened = VisibilityPolicy::new(vec![Role::Office, Role::Boss, Role::DepartmentHead]);
        assert_eq!(widened.grant_for(&head, &user), VisibilityGrant::Full);
    }
}
