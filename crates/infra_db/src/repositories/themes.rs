//! Activity themes repository
//!
//! `(name, department)` is unique in the schema; a losing concurrent insert
//! surfaces as `DatabaseError::DuplicateEntry`.

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::DatabaseError;

/// Row in `activity_themes`
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ThemeRow {
    pub theme_id: Uuid,
    pub name: String,
    pub department: String,
    pub activity_date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct ThemesRepository {
    pool: PgPool,
}

impl ThemesRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_key(
        &self,
        name: &str,
        department: &str,
    ) -> Result<Option<ThemeRow>, DatabaseError> {
        let row = sqlx::query_as::<_, ThemeRow>(
            r#"
            SELECT theme_id, name, department, activity_date, created_at
            FROM activity_themes
            WHERE name = $1 AND department = $2
            "#,
        )
        .bind(name)
        .bind(department)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    pub async fn insert(&self, theme: &ThemeRow) -> Result<(), DatabaseError> {
        sqlx::query(
            r#"
            INSERT INTO activity_themes (theme_id, name, department, activity_date, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(theme.theme_id)
        .bind(&theme.name)
        .bind(&theme.department)
        .bind(theme.activity_date)
        .bind(theme.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Themes of a department, newest first
    pub async fn list_by_department(&self, department: &str) -> Result<Vec<ThemeRow>, DatabaseError> {
        let rows = sqlx::query_as::<_, ThemeRow>(
            r#"
            SELECT theme_id, name, department, activity_date, created_at
            FROM activity_themes
            WHERE department = $1
            ORDER BY created_at DESC, name
            "#,
        )
        .bind(department)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}
