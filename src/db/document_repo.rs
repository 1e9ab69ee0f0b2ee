use chrono::Utc;
use sqlx::SqlitePool;
use std::str::FromStr;
use uuid::Uuid;

use super::{parse_id, parse_timestamp};
use crate::models::{AccessMode, Document};

/// Persistent document store; the source of truth for document state.
#[derive(Clone)]
pub struct DocumentRepository {
    pool: SqlitePool,
}

#[derive(sqlx::FromRow)]
struct DocumentRow {
    id: String,
    title: String,
    content: String,
    owner_id: String,
    role_id: Option<String>,
    access: String,
    created_at: String,
    updated_at: String,
}

impl TryFrom<DocumentRow> for Document {
    type Error = sqlx::Error;

    fn try_from(row: DocumentRow) -> Result<Self, Self::Error> {
        Ok(Document {
            id: parse_id(&row.id)?,
            title: row.title,
            content: row.content,
            owner_id: parse_id(&row.owner_id)?,
            role: row.role_id.as_deref().map(parse_id).transpose()?,
            access: AccessMode::from_str(&row.access)
                .map_err(|e| sqlx::Error::Decode(e.into()))?,
            created_at: parse_timestamp(&row.created_at)?,
            updated_at: parse_timestamp(&row.updated_at)?,
        })
    }
}

impl DocumentRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, document: &Document) -> Result<Document, sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO documents (id, title, content, owner_id, role_id, access, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(document.id.to_string())
        .bind(&document.title)
        .bind(&document.content)
        .bind(document.owner_id.to_string())
        .bind(document.role.map(|r| r.to_string()))
        .bind(document.access.as_str())
        .bind(document.created_at.to_rfc3339())
        .bind(document.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        self.find(document.id)
            .await?
            .ok_or(sqlx::Error::RowNotFound)
    }

    pub async fn find(&self, id: Uuid) -> Result<Option<Document>, sqlx::Error> {
        let row: Option<DocumentRow> = sqlx::query_as("SELECT * FROM documents WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        row.map(Document::try_from).transpose()
    }

    pub async fn list(&self) -> Result<Vec<Document>, sqlx::Error> {
        let rows: Vec<DocumentRow> =
            sqlx::query_as("SELECT * FROM documents ORDER BY created_at, id")
                .fetch_all(&self.pool)
                .await?;

        rows.into_iter().map(Document::try_from).collect()
    }

    /// Overwrites every mutable column. `RowNotFound` if the id is unknown.
    pub async fn update(&self, document: &Document) -> Result<Document, sqlx::Error> {
        let row: Option<DocumentRow> = sqlx::query_as(
            r#"
            UPDATE documents
            SET title = ?, content = ?, role_id = ?, access = ?, updated_at = ?
            WHERE id = ?
            RETURNING *
            "#,
        )
        .bind(&document.title)
        .bind(&document.content)
        .bind(document.role.map(|r| r.to_string()))
        .bind(document.access.as_str())
        .bind(Utc::now().to_rfc3339())
        .bind(document.id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.ok_or(sqlx::Error::RowNotFound)?.try_into()
    }

    /// Deletes and returns the document. `RowNotFound` if the id is unknown.
    pub async fn delete(&self, id: Uuid) -> Result<Document, sqlx::Error> {
        let row: Option<DocumentRow> =
            sqlx::query_as("DELETE FROM documents WHERE id = ? RETURNING *")
                .bind(id.to_string())
                .fetch_optional(&self.pool)
                .await?;

        row.ok_or(sqlx::Error::RowNotFound)?.try_into()
    }
}
