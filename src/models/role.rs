use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub title: String,
}

impl Role {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
        }
    }
}

/// Request body for creating or renaming a role.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RoleInput {
    #[serde(default)]
    pub title: Option<String>,
}
