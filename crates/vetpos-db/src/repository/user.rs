//! # User Repository
//!
//! Local mirror of identities owned by the upstream auth provider, plus the
//! role table that answers "is this user an admin?".

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::DbResult;
use vetpos_core::validation::{validate_required_text, MAX_NAME_LEN};
use vetpos_core::{User, ADMIN_ROLE};

/// Repository for users and roles.
#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        UserRepository { pool }
    }

    /// Inserts or refreshes a mirrored user. The id comes from the provider.
    pub async fn upsert(&self, id: &str, email: &str, name: Option<&str>) -> DbResult<User> {
        validate_required_text(id, "id", MAX_NAME_LEN)?;
        validate_required_text(email, "email", MAX_NAME_LEN)?;

        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, email, name, created_at)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(id) DO UPDATE SET email = excluded.email, name = excluded.name
            RETURNING id, email, name, created_at
            "#,
        )
        .bind(id)
        .bind(email)
        .bind(name)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        debug!(id = %user.id, "User mirrored");
        Ok(user)
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, email, name, created_at FROM users WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Returns the id of the named role, creating it if needed.
    pub async fn ensure_role(&self, name: &str) -> DbResult<String> {
        sqlx::query("INSERT INTO roles (id, name) VALUES (?1, ?2) ON CONFLICT(name) DO NOTHING")
            .bind(Uuid::new_v4().to_string())
            .bind(name)
            .execute(&self.pool)
            .await?;

        let id: String = sqlx::query_scalar("SELECT id FROM roles WHERE name = ?1")
            .bind(name)
            .fetch_one(&self.pool)
            .await?;
        Ok(id)
    }

    pub async fn assign_role(&self, user_id: &str, role: &str) -> DbResult<()> {
        let role_id = self.ensure_role(role).await?;

        sqlx::query("INSERT OR IGNORE INTO user_roles (user_id, role_id) VALUES (?1, ?2)")
            .bind(user_id)
            .bind(&role_id)
            .execute(&self.pool)
            .await?;

        info!(user_id = %user_id, role = %role, "Role assigned");
        Ok(())
    }

    pub async fn has_role(&self, user_id: &str, role: &str) -> DbResult<bool> {
        let found: Option<i64> = sqlx::query_scalar(
            r#"
            SELECT 1 FROM user_roles ur
            JOIN roles r ON r.id = ur.role_id
            WHERE ur.user_id = ?1 AND r.name = ?2
            LIMIT 1
            "#,
        )
        .bind(user_id)
        .bind(role)
        .fetch_optional(&self.pool)
        .await?;

        Ok(found.is_some())
    }

    pub async fn is_admin(&self, user_id: &str) -> DbResult<bool> {
        self.has_role(user_id, ADMIN_ROLE).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};

    #[tokio::test]
    async fn test_admin_role() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let users = db.users();

        users.upsert("u-admin", "admin@clinic.test", Some("Dr. Admin")).await.unwrap();
        users.upsert("u-staff", "staff@clinic.test", None).await.unwrap();
        users.assign_role("u-admin", ADMIN_ROLE).await.unwrap();
        // Idempotent
        users.assign_role("u-admin", ADMIN_ROLE).await.unwrap();

        assert!(users.is_admin("u-admin").await.unwrap());
        assert!(!users.is_admin("u-staff").await.unwrap());
        assert!(!users.is_admin("unknown").await.unwrap());
    }

    #[tokio::test]
    async fn test_upsert_refreshes_profile() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let users = db.users();

        let first = users.upsert("u-1", "old@clinic.test", None).await.unwrap();
        let second = users.upsert("u-1", "new@clinic.test", Some("Ana")).await.unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(second.email, "new@clinic.test");
        assert_eq!(second.name.as_deref(), Some("Ana"));
        assert_eq!(second.created_at, first.created_at);
    }
}
