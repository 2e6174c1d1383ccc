//! PostgreSQL user directory

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::{debug, instrument};
use uuid::Uuid;

use core_kernel::{DomainPort, HealthCheckResult, HealthCheckable, PortError, UserId};
use domain_claims::{Role, User, UserDirectory};

use crate::repositories::users::{UserRole as DbUserRole, UserRow, UsersRepository};

/// PostgreSQL-backed [`UserDirectory`]
#[derive(Debug, Clone)]
pub struct PostgresUserDirectory {
    repository: UsersRepository,
    pool: PgPool,
}

impl PostgresUserDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self {
            repository: UsersRepository::new(pool.clone()),
            pool,
        }
    }

    /// Direct access for seeding accounts
    pub fn repository(&self) -> &UsersRepository {
        &self.repository
    }
}

impl DomainPort for PostgresUserDirectory {}

#[async_trait]
impl HealthCheckable for PostgresUserDirectory {
    async fn health_check(&self) -> HealthCheckResult {
        super::ping(&self.pool, "postgres-user-directory").await
    }
}

#[async_trait]
impl UserDirectory for PostgresUserDirectory {
    #[instrument(skip(self), fields(user_id = %id))]
    async fn get_user(&self, id: UserId) -> Result<User, PortError> {
        debug!("Fetching user");
        let row = self.repository.get_by_id(id.into()).await?;
        Ok(row_to_user(row))
    }

    #[instrument(skip(self, ids), fields(count = ids.len()))]
    async fn get_users(&self, ids: &[UserId]) -> Result<Vec<User>, PortError> {
        let ids: Vec<Uuid> = ids.iter().map(|id| Uuid::from(*id)).collect();
        let rows = self.repository.get_many(&ids).await?;
        Ok(rows.into_iter().map(row_to_user).collect())
    }
}

fn db_to_domain_role(role: DbUserRole) -> Role {
    match role {
        DbUserRole::Applicant => Role::Applicant,
        DbUserRole::Lead => Role::Lead,
        DbUserRole::Admin => Role::Admin,
    }
}

/// Maps a domain role onto the database enum
pub fn domain_to_db_role(role: Role) -> DbUserRole {
    match role {
        Role::Applicant => DbUserRole::Applicant,
        Role::Lead => DbUserRole::Lead,
        Role::Admin => DbUserRole::Admin,
    }
}

/// Row for inserting a domain user
pub fn user_to_row(user: &User) -> UserRow {
    UserRow {
        user_id: user.id.into(),
        username: user.username.clone(),
        full_name: user.full_name.clone(),
        student_id: user.student_id.clone(),
        role: domain_to_db_role(user.role),
        department: user.department.clone(),
        is_active: user.is_active,
        created_at: user.created_at,
    }
}

fn row_to_user(row: UserRow) -> User {
    User {
        id: UserId::from(row.user_id),
        username: row.username,
        full_name: row.full_name,
        student_id: row.student_id,
        role: db_to_domain_role(row.role),
        department: row.department,
        is_active: row.is_active,
        created_at: row.created_at,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_row_round_trip_keeps_optional_student_id() {
        let user = User::new("li.hua", Role::Lead, "Arts")
            .with_full_name("Li Hua")
            .with_student_id("2021001");
        let back = row_to_user(user_to_row(&user));

        assert_eq!(back.id, user.id);
        assert_eq!(back.role, Role::Lead);
        assert_eq!(back.student_id.as_deref(), Some("2021001"));
        assert_eq!(back.display_name(), "Li Hua");

        let plain = User::new("zhang", Role::Applicant, "Arts");
        assert_eq!(row_to_user(user_to_row(&plain)).student_id, None);
    }
}
