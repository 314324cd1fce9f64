use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Role {
    User = 1,
    Office = 2,
    Boss = 3,
    DepartmentHead = 4,
    SecondStageAuthority = 5,
    Inactive = 6,
}

impl Role {
    pub fn from_id(id: u8) -> Option<Self> {
        match id {
            1 => Some(Role::User),
            2 => Some(Role::Office),
            3 => Some(Role::Boss),
            4 => Some(Role::DepartmentHead),
            5 => Some(Role::SecondStageAuthority),
            6 => Some(Role::Inactive),
            _ => None,
        }
    }

    pub fn id(self) -> u8 {
        self as u8
    }

    /// Roles allowed to decide on leave requests of others.
    pub fn decides_leave(self) -> bool {
        matches!(
            self,
            Role::Office | Role::Boss | Role::DepartmentHead | Role::SecondStageAuthority
        )
    }
}
