//! Users repository
//!
//! Accounts are created by administrators outside the claim workflow; the
//! tracker itself only reads them. `insert` exists for seeding and tests.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::DatabaseError;

const USER_COLUMNS: &str =
    "user_id, username, full_name, student_id, role, department, is_active, created_at";

/// User role enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "user_role", rename_all = "snake_case")]
pub enum UserRole {
    Applicant,
    Lead,
    Admin,
}

/// Row in `users`
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserRow {
    pub user_id: Uuid,
    pub username: String,
    pub full_name: String,
    pub student_id: Option<String>,
    pub role: UserRole,
    pub department: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct UsersRepository {
    pool: PgPool,
}

impl UsersRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn get_by_id(&self, user_id: Uuid) -> Result<UserRow, DatabaseError> {
        sqlx::query_as::<_, UserRow>(&format!("SELECT {USER_COLUMNS} FROM users WHERE user_id = $1"))
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DatabaseError::not_found("User", user_id))
    }

    /// Loads the users among `ids`; unknown ids are skipped
    pub async fn get_many(&self, ids: &[Uuid]) -> Result<Vec<UserRow>, DatabaseError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let rows = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE user_id = ANY($1) ORDER BY username"
        ))
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    pub async fn find_by_username(&self, username: &str) -> Result<Option<UserRow>, DatabaseError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE username = $1"
        ))
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    pub async fn insert(&self, user: &UserRow) -> Result<(), DatabaseError> {
        sqlx::query(
            r#"
            INSERT INTO users (user_id, username, full_name, student_id, role, department, is_active, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(user.user_id)
        .bind(&user.username)
        .bind(&user.full_name)
        .bind(user.student_id.as_deref())
        .bind(user.role)
        .bind(&user.department)
        .bind(user.is_active)
        .bind(user.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
