use chrono::Utc;
use sqlx::SqlitePool;
use uuid::Uuid;

use super::parse_id;
use crate::models::{PersonName, User};

#[derive(Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

#[derive(sqlx::FromRow)]
struct UserRow {
    id: String,
    first_name: String,
    last_name: String,
    email: String,
    user_name: String,
    credential_hash: String,
    role_id: String,
}

impl TryFrom<UserRow> for User {
    type Error = sqlx::Error;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        Ok(User {
            id: parse_id(&row.id)?,
            name: PersonName {
                first: row.first_name,
                last: row.last_name,
            },
            email: row.email,
            user_name: row.user_name,
            credential_hash: row.credential_hash,
            role: parse_id(&row.role_id)?,
        })
    }
}

const USER_COLUMNS: &str =
    "id, first_name, last_name, email, user_name, credential_hash, role_id";

impl UserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, user: &User) -> Result<User, sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO users (id, first_name, last_name, email, user_name, credential_hash, role_id, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(user.id.to_string())
        .bind(&user.name.first)
        .bind(&user.name.last)
        .bind(&user.email)
        .bind(&user.user_name)
        .bind(&user.credential_hash)
        .bind(user.role.to_string())
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;
        Ok(user.clone())
    }

    pub async fn find(&self, id: Uuid) -> Result<Option<User>, sqlx::Error> {
        let row: Option<UserRow> =
            sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?"))
                .bind(id.to_string())
                .fetch_optional(&self.pool)
                .await?;
        row.map(User::try_from).transpose()
    }

    /// Case-insensitive lookup by email.
    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>, sqlx::Error> {
        let row: Option<UserRow> = sqlx::query_as(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE LOWER(email) = LOWER(?)"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        row.map(User::try_from).transpose()
    }

    /// True if either the email or the user name is already taken.
    pub async fn is_taken(&self, email: &str, user_name: &str) -> Result<bool, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM users WHERE LOWER(email) = LOWER(?) OR LOWER(user_name) = LOWER(?)",
        )
        .bind(email)
        .bind(user_name)
        .fetch_one(&self.pool)
        .await?;
        Ok(count > 0)
    }

    pub async fn list(&self) -> Result<Vec<User>, sqlx::Error> {
        let rows: Vec<UserRow> =
            sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM users ORDER BY email"))
                .fetch_all(&self.pool)
                .await?;
        rows.into_iter().map(User::try_from).collect()
    }

    pub async fn delete_by_email(&self, email: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM users WHERE LOWER(email) = LOWER(?)")
            .bind(email)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::setup_db;
    use crate::db::RoleRepository;
    use crate::models::Role;

    fn user(email: &str, user_name: &str, role: Uuid) -> User {
        User {
            id: Uuid::new_v4(),
            name: PersonName {
                first: "Test".into(),
                last: "User".into(),
            },
            email: email.into(),
            user_name: user_name.into(),
            credential_hash: "hash".into(),
            role,
        }
    }

    #[tokio::test]
    async fn test_create_and_find_user() {
        let db = setup_db().await;
        let roles = RoleRepository::new(db.pool.clone());
        let repo = UserRepository::new(db.pool.clone());
        let role = roles.create(&Role::new("regular")).await.unwrap();

        let created = repo
            .create(&user("alice@example.com", "alice", role.id))
            .await
            .unwrap();

        let by_id = repo.find(created.id).await.unwrap().unwrap();
        assert_eq!(by_id.email, "alice@example.com");
        assert_eq!(by_id.role, role.id);

        let by_email = repo.find_by_email("ALICE@example.com").await.unwrap();
        assert_eq!(by_email.unwrap().id, created.id);
    }

    #[tokio::test]
    async fn test_unknown_role_rejected_by_foreign_key() {
        let db = setup_db().await;
        let repo = UserRepository::new(db.pool.clone());

        let result = repo
            .create(&user("bob@example.com", "bob", Uuid::new_v4()))
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_is_taken_and_member_count() {
        let db = setup_db().await;
        let roles = RoleRepository::new(db.pool.clone());
        let repo = UserRepository::new(db.pool.clone());
        let role = roles.create(&Role::new("regular")).await.unwrap();

        repo.create(&user("carol@example.com", "carol", role.id))
            .await
            .unwrap();

        assert!(repo.is_taken("carol@example.com", "other").await.unwrap());
        assert!(repo.is_taken("other@example.com", "Carol").await.unwrap());
        assert!(!repo.is_taken("dave@example.com", "dave").await.unwrap());
        assert_eq!(roles.member_count(role.id).await.unwrap(), 1);

        assert!(repo.delete_by_email("carol@example.com").await.unwrap());
        assert_eq!(roles.member_count(role.id).await.unwrap(), 0);
    }
}
