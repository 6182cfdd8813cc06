//! # Service Repository
//!
//! Billable clinic services. Services are sold as sale lines but carry no stock.

use chrono::Utc;
use serde::Deserialize;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::info;
use uuid::Uuid;

use crate::error::DbResult;
use vetpos_core::validation::{validate_non_negative_cents, validate_required_text, MAX_NAME_LEN};
use vetpos_core::{Service, ValidationError};

const SERVICE_COLUMNS: &str = "id, name, category, price_cents, is_active, created_at";

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewService {
    pub name: String,
    pub category: String,
    pub price_cents: i64,
}

impl NewService {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_required_text(&self.name, "name", MAX_NAME_LEN)?;
        validate_required_text(&self.category, "category", MAX_NAME_LEN)?;
        validate_non_negative_cents(self.price_cents, "priceCents")?;
        Ok(())
    }
}

/// Repository for service database operations.
#[derive(Debug, Clone)]
pub struct ServiceRepository {
    pool: SqlitePool,
}

impl ServiceRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ServiceRepository { pool }
    }

    pub async fn insert(&self, new: &NewService) -> DbResult<Service> {
        new.validate()?;

        let service = Service {
            id: Uuid::new_v4().to_string(),
            name: new.name.trim().to_string(),
            category: new.category.trim().to_string(),
            price_cents: new.price_cents,
            is_active: true,
            created_at: Utc::now(),
        };

        sqlx::query(
            r#"
            INSERT INTO services (id, name, category, price_cents, is_active, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&service.id)
        .bind(&service.name)
        .bind(&service.category)
        .bind(service.price_cents)
        .bind(service.is_active)
        .bind(service.created_at)
        .execute(&self.pool)
        .await?;

        info!(id = %service.id, name = %service.name, "Service created");
        Ok(service)
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Service>> {
        let mut conn = self.pool.acquire().await?;
        fetch_service(&mut conn, id).await
    }

    /// Active services ordered by category, then name.
    pub async fn list_active(&self) -> DbResult<Vec<Service>> {
        let services = sqlx::query_as::<_, Service>(&format!(
            "SELECT {SERVICE_COLUMNS} FROM services WHERE is_active = 1 ORDER BY category, name"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(services)
    }
}

pub(crate) async fn fetch_service(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Service>> {
    let service = sqlx::query_as::<_, Service>(&format!(
        "SELECT {SERVICE_COLUMNS} FROM services WHERE id = ?1"
    ))
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(service)
}
