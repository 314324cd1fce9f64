use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use strum_macros::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

pub type CategoryId = u64;

#[derive(
    Debug,
    Copy,
    Clone,
    Eq,
    PartialEq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
    ToSchema,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum CategoryColor {
    Gray,
    Orange,
    Yellow,
    Emerald,
    Cyan,
    Blue,
    Violet,
    Pink,
}

/// Marker shown to viewers who may not see the actual leave category.
pub const GENERIC_ABSENCE_COLOR: CategoryColor = CategoryColor::Yellow;

#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum QuantityUnit {
    Days,
    Hours,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaveCategory {
    pub id: CategoryId,
    pub message_key: String,
    pub active: bool,
    pub two_stage_approval: bool,
    pub unit: QuantityUnit,
    pub color: CategoryColor,
}

impl LeaveCategory {
    pub fn new(id: CategoryId, message_key: &str, color: CategoryColor) -> Self {
        Self {
            id,
            message_key: message_key.to_string(),
            active: true,
            two_stage_approval: false,
            unit: QuantityUnit::Days,
            color,
        }
    }
}

/// Category lookup by id, built once per calendar request.
#[derive(Debug, Clone, Default)]
pub struct Categories {
    by_id: HashMap<CategoryId, LeaveCategory>,
}

impl Categories {
    pub fn get(&self, id: CategoryId) -> Option<&LeaveCategory> {
        self.by_id.get(&id)
    }

    pub fn color_of(&self, id: CategoryId) -> Option<CategoryColor> {
        self.get(id).map(|category| category.color)
    }
}

impl FromIterator<LeaveCategory> for Categories {
    fn from_iter<I: IntoIterator<Item = LeaveCategory>>(iter: I) -> Self {
        Self {
            by_id: iter
                .into_iter()
                .map(|category| (category.id, category))
                .collect(),
        }
    }
}
