use crate::model::person::PersonId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Department {
    pub id: u64,
    pub name: String,
    pub members: Vec<PersonId>,
    pub department_heads: Vec<PersonId>,
    pub second_stage_authorities: Vec<PersonId>,
}

impl Department {
    pub fn new(id: u64, name: &str) -> Self {
        Self {
            id,
            name: name.to_string(),
            members: Vec::new(),
            department_heads: Vec::new(),
            second_stage_authorities: Vec::new(),
        }
    }

    pub fn is_member(&self, person_id: PersonId) -> bool {
        self.members.contains(&person_id)
    }

    pub fn is_led_by(&self, person_id: PersonId) -> bool {
        self.department_heads.contains(&person_id)
            || self.second_stage_authorities.contains(&person_id)
    }
}
