use chrono::Utc;
use sqlx::SqlitePool;
use uuid::Uuid;

use super::parse_id;
use crate::models::Role;

#[derive(Clone)]
pub struct RoleRepository {
    pool: SqlitePool,
}

#[derive(sqlx::FromRow)]
struct RoleRow {
    id: String,
    title: String,
}

impl TryFrom<RoleRow> for Role {
    type Error = sqlx::Error;

    fn try_from(row: RoleRow) -> Result<Self, Self::Error> {
        Ok(Role {
            id: parse_id(&row.id)?,
            title: row.title,
        })
    }
}

impl RoleRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, role: &Role) -> Result<Role, sqlx::Error> {
        sqlx::query("INSERT INTO roles (id, title, created_at) VALUES (?, ?, ?)")
            .bind(role.id.to_string())
            .bind(&role.title)
            .bind(Utc::now().to_rfc3339())
            .execute(&self.pool)
            .await?;
        Ok(role.clone())
    }

    pub async fn find(&self, id: Uuid) -> Result<Option<Role>, sqlx::Error> {
        let row: Option<RoleRow> = sqlx::query_as("SELECT id, title FROM roles WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;
        row.map(Role::try_from).transpose()
    }

    /// Exact title match; titles are unique.
    pub async fn find_by_title(&self, title: &str) -> Result<Option<Role>, sqlx::Error> {
        let row: Option<RoleRow> = sqlx::query_as("SELECT id, title FROM roles WHERE title = ?")
            .bind(title)
            .fetch_optional(&self.pool)
            .await?;
        row.map(Role::try_from).transpose()
    }

    pub async fn list(&self) -> Result<Vec<Role>, sqlx::Error> {
        let rows: Vec<RoleRow> = sqlx::query_as("SELECT id, title FROM roles ORDER BY title")
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(Role::try_from).collect()
    }

    pub async fn rename(&self, id: Uuid, title: &str) -> Result<Role, sqlx::Error> {
        let row: Option<RoleRow> =
            sqlx::query_as("UPDATE roles SET title = ? WHERE id = ? RETURNING id, title")
                .bind(title)
                .bind(id.to_string())
                .fetch_optional(&self.pool)
                .await?;
        row.ok_or(sqlx::Error::RowNotFound)?.try_into()
    }

    pub async fn delete(&self, id: Uuid) -> Result<Role, sqlx::Error> {
        let row: Option<RoleRow> =
            sqlx::query_as("DELETE FROM roles WHERE id = ? RETURNING id, title")
                .bind(id.to_string())
                .fetch_optional(&self.pool)
                .await?;
        row.ok_or(sqlx::Error::RowNotFound)?.try_into()
    }

    /// Number of users currently assigned to the role.
    pub async fn member_count(&self, id: Uuid) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users WHERE role_id = ?")
            .bind(id.to_string())
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
