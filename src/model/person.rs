use crate::model::role::Role;
use serde::{Deserialize, Serialize};
use std::fmt;
use strum_macros::{AsRefStr, Display, EnumString};

pub type PersonId = u64;

/// Which leave request mails a manager wants to receive.
#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum MailNotification {
    /// Requests of every person
    ApplicationManagementAll,
    /// Requests of persons in departments shared with or led by the recipient
    ApplicationManagementDepartment,
}

/// Stored asymmetric key of a person, used to attest leave decisions.
#[derive(Clone, PartialEq, Eq)]
pub struct KeyMaterial {
    pub algorithm: String,
    pub bytes: Vec<u8>,
}

impl KeyMaterial {
    pub fn new(algorithm: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            algorithm: algorithm.into(),
            bytes,
        }
    }
}

impl fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyMaterial")
            .field("algorithm", &self.algorithm)
            .field("bytes", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    pub id: PersonId,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub roles: Vec<Role>,
    #[serde(default)]
    pub notifications: Vec<MailNotification>,
    #[serde(skip)]
    pub key_material: Option<KeyMaterial>,
}

impl Person {
    pub fn new(id: PersonId, first_name: &str, last_name: &str, roles: Vec<Role>) -> Self {
        Self {
            id,
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            email: format!("{}@example.org", first_name.to_lowercase()),
            roles,
            notifications: Vec::new(),
            key_material: None,
        }
    }

    pub fn with_key(mut self, key: KeyMaterial) -> Self {
        self.key_material = Some(key);
        self
    }

    pub fn with_notifications(mut self, notifications: Vec<MailNotification>) -> Self {
        self.notifications = notifications;
        self
    }

    pub fn wants(&self, notification: MailNotification) -> bool {
        self.notifications.contains(&notification)
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }

    pub fn has_any_role(&self, roles: &[Role]) -> bool {
        roles.iter().any(|role| self.has_role(*role))
    }

    /// Persons carrying the inactive role are hidden from overviews.
    pub fn is_active(&self) -> bool {
        !self.has_role(Role::Inactive)
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inactive_role_deactivates_person() {
        let active = Person::new(1, "sandra", "smith", vec![Role::User]);
        let inactive = Person::new(2, "sandra", "smith", vec![Role::Inactive]);

        assert!(active.is_active());
        assert!(!inactive.is_active());
    }

    #[test]
    fn notifications_parse_from_column_values() {
        let parsed: MailNotification = "application_management_department".parse().unwrap();
        assert_eq!(parsed, MailNotification::ApplicationManagementDepartment);

        let boss = Person::new(3, "bernd", "boss", vec![Role::Boss])
            .with_notifications(vec![MailNotification::ApplicationManagementAll]);
        assert!(boss.wants(MailNotification::ApplicationManagementAll));
        assert!(!boss.wants(MailNotification::ApplicationManagementDepartment));
    }

    #[test]
    fn key_material_is_not_printed() {
        let key = KeyMaterial::new("ed25519", vec![7; 32]);
        let printed = format!("{:?}", key);
        assert!(printed.contains("redacted"));
        assert!(!printed.contains('7'));
    }
}
