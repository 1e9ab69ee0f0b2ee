use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::access::AccessMode;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub owner_id: Uuid,
    /// Role required for role-scoped access.
    pub role: Option<Uuid>,
    pub access: AccessMode,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Document {
    pub fn new(title: impl Into<String>, owner_id: Uuid) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            content: String::new(),
            owner_id,
            role: None,
            access: AccessMode::Public,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = content.into();
        self
    }

    pub fn with_access(mut self, access: AccessMode) -> Self {
        self.access = access;
        self
    }

    pub fn with_role(mut self, role: Uuid) -> Self {
        self.role = Some(role);
        self
    }

    /// Applies a patch in place. Ownership is never touched.
    pub fn apply(&mut self, patch: DocumentPatch) {
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(content) = patch.content {
            self.content = content;
        }
        if let Some(access) = patch.access {
            self.access = access;
        }
        if let Some(role) = patch.role {
            self.role = Some(role);
        }
        self.updated_at = Utc::now();
    }
}

/// Request body for creating a document.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewDocument {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub access: AccessMode,
    pub role: Option<Uuid>,
}

/// Partial update of a document.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentPatch {
    pub title: Option<String>,
    pub content: Option<String>,
    pub access: Option<AccessMode>,
    pub role: Option<Uuid>,
}
