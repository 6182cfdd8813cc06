//! # Inventory Repository
//!
//! Items, the movement ledger and bulk price adjustments.
//!
//! ## Stock Changes
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Every quantity change goes through `change_stock` inside a tx:         │
//! │                                                                         │
//! │  1. UPDATE quantity = quantity ± n  WHERE quantity ± n >= 0             │
//! │     (0 rows → item missing or insufficient stock)                       │
//! │  2. re-read item, recompute status                                      │
//! │  3. INSERT inventory_movements row                                      │
//! │                                                                         │
//! │  Quantity and ledger move together or not at all.                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Starting with the UPDATE takes SQLite's write lock before anything is
//! read, so two concurrent sales never act on the same stale quantity.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use vetpos_core::inventory::{apply_movement, derive_status, LedgerReconciliation};
use vetpos_core::pricing::{preview, ItemFilter, PriceAdjustment, PriceAdjustmentSummary};
use vetpos_core::validation::{
    validate_non_negative_cents, validate_optional_text, validate_quantity, validate_required_text,
    validate_stock_level, MAX_NAME_LEN, MAX_NOTE_LEN,
};
use vetpos_core::{CoreError, InventoryItem, InventoryMovement, MovementType, ValidationError};

const ITEM_COLUMNS: &str = "id, name, category, description, quantity, min_stock, status, \
     price_cents, cost_cents, is_active, created_at, updated_at";

const MOVEMENT_COLUMNS: &str = "id, item_id, movement_type, quantity, reason, \
     related_record_type, related_record_id, user_id, created_at";

/// Fields accepted when creating an item.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewInventoryItem {
    pub name: String,
    pub category: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub quantity: i64,
    #[serde(default)]
    pub min_stock: i64,
    pub price_cents: i64,
    #[serde(default)]
    pub cost_cents: i64,
}

impl NewInventoryItem {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_required_text(&self.name, "name", MAX_NAME_LEN)?;
        validate_required_text(&self.category, "category", MAX_NAME_LEN)?;
        validate_optional_text(&self.description, "description", MAX_NOTE_LEN)?;
        validate_stock_level(self.quantity, "quantity")?;
        validate_stock_level(self.min_stock, "minStock")?;
        validate_non_negative_cents(self.price_cents, "priceCents")?;
        validate_non_negative_cents(self.cost_cents, "costCents")?;
        Ok(())
    }
}

/// What caused a stock change, recorded on the movement row.
#[derive(Debug, Clone, Copy)]
pub(crate) struct MovementSource<'a> {
    pub reason: &'a str,
    pub record_type: Option<&'a str>,
    pub record_id: Option<&'a str>,
    pub user_id: Option<&'a str>,
}

/// Repository for inventory database operations.
#[derive(Debug, Clone)]
pub struct InventoryRepository {
    pool: SqlitePool,
}

impl InventoryRepository {
    pub fn new(pool: SqlitePool) -> Self {
        InventoryRepository { pool }
    }

    /// Creates an item and records its opening stock as an `in` movement.
    pub async fn insert(
        &self,
        new: &NewInventoryItem,
        user_id: Option<&str>,
    ) -> DbResult<InventoryItem> {
        new.validate()?;

        let id = Uuid::new_v4().to_string();
        let now = Utc::now();
        let status = derive_status(new.quantity, new.min_stock);

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO inventory_items (
                id, name, category, description, quantity, min_stock, status,
                price_cents, cost_cents, is_active, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, 1, ?10, ?10)
            "#,
        )
        .bind(&id)
        .bind(new.name.trim())
        .bind(new.category.trim())
        .bind(&new.description)
        .bind(new.quantity)
        .bind(new.min_stock)
        .bind(status)
        .bind(new.price_cents)
        .bind(new.cost_cents)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        if new.quantity > 0 {
            insert_movement(
                &mut tx,
                &id,
                MovementType::In,
                new.quantity,
                MovementSource {
                    reason: "Opening stock",
                    record_type: Some("opening_stock"),
                    record_id: None,
                    user_id,
                },
            )
            .await?;
        }

        let item = fetch_item(&mut tx, &id)
            .await?
            .ok_or_else(|| DbError::not_found("InventoryItem", &id))?;

        tx.commit().await?;

        info!(id = %item.id, name = %item.name, quantity = item.quantity, "Inventory item created");
        Ok(item)
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<InventoryItem>> {
        let mut conn = self.pool.acquire().await?;
        fetch_item(&mut conn, id).await
    }

    /// Lists items matching the filter, ordered by name.
    pub async fn list(&self, filter: &ItemFilter, active_only: bool) -> DbResult<Vec<InventoryItem>> {
        let mut conn = self.pool.acquire().await?;
        fetch_filtered(&mut conn, filter, active_only).await
    }

    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM inventory_items")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Manual stock adjustment (delivery received, breakage, expiry).
    ///
    /// Returns the updated item and the ledger row written for it.
    pub async fn record_movement(
        &self,
        item_id: &str,
        movement_type: MovementType,
        quantity: i64,
        reason: &str,
        user_id: Option<&str>,
    ) -> DbResult<(InventoryItem, InventoryMovement)> {
        validate_quantity(quantity)?;
        validate_required_text(reason, "reason", MAX_NOTE_LEN)?;

        let mut tx = self.pool.begin().await?;
        let result = change_stock(
            &mut tx,
            item_id,
            movement_type,
            quantity,
            MovementSource {
                reason: reason.trim(),
                record_type: Some("manual_adjustment"),
                record_id: None,
                user_id,
            },
        )
        .await?;
        tx.commit().await?;

        info!(
            item_id = %item_id,
            movement = ?movement_type,
            quantity,
            on_hand = result.0.quantity,
            "Stock movement recorded"
        );
        Ok(result)
    }

    /// Ledger of an item, oldest first.
    pub async fn movements(&self, item_id: &str) -> DbResult<Vec<InventoryMovement>> {
        let movements = sqlx::query_as::<_, InventoryMovement>(&format!(
            "SELECT {MOVEMENT_COLUMNS} FROM inventory_movements \
             WHERE item_id = ?1 ORDER BY created_at, rowid"
        ))
        .bind(item_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(movements)
    }

    /// Compares the stored quantity with the sum of the ledger.
    pub async fn reconcile(&self, item_id: &str) -> DbResult<LedgerReconciliation> {
        let item = self
            .get_by_id(item_id)
            .await?
            .ok_or_else(|| CoreError::ItemNotFound(item_id.to_string()))?;
        let movements = self.movements(item_id).await?;

        let report = LedgerReconciliation::compute(&item.id, item.quantity, &movements);
        if !report.is_consistent {
            warn!(item_id = %item.id, drift = report.drift, "Inventory ledger drift");
        }
        Ok(report)
    }

    /// Computes a price adjustment over the filtered items. Writes nothing.
    pub async fn preview_price_adjustment(
        &self,
        filter: &ItemFilter,
        adjustment: &PriceAdjustment,
    ) -> DbResult<PriceAdjustmentSummary> {
        adjustment.validate()?;
        let items = self.list(filter, true).await?;
        Ok(preview(&items, adjustment)?)
    }

    /// Persists a price adjustment for the filtered items in one transaction.
    pub async fn apply_price_adjustment(
        &self,
        filter: &ItemFilter,
        adjustment: &PriceAdjustment,
    ) -> DbResult<PriceAdjustmentSummary> {
        adjustment.validate()?;

        let now = Utc::now();
        let mut tx = self.pool.begin().await?;
        touch_filtered(&mut tx, filter, now).await?;
        let items = fetch_filtered(&mut tx, filter, true).await?;
        let summary = preview(&items, adjustment)?;

        for change in &summary.changes {
            sqlx::query(
                "UPDATE inventory_items SET price_cents = ?2, cost_cents = ?3, updated_at = ?4 WHERE id = ?1",
            )
            .bind(&change.item_id)
            .bind(change.price_after.cents())
            .bind(change.cost_after.cents())
            .bind(now)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        info!(
            items = summary.item_count,
            total_before = summary.price.total_before.cents(),
            total_after = summary.price.total_after.cents(),
            "Price adjustment applied"
        );
        Ok(summary)
    }
}

pub(crate) async fn fetch_item(
    conn: &mut SqliteConnection,
    id: &str,
) -> DbResult<Option<InventoryItem>> {
    let item = sqlx::query_as::<_, InventoryItem>(&format!(
        "SELECT {ITEM_COLUMNS} FROM inventory_items WHERE id = ?1"
    ))
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(item)
}

async fn fetch_filtered(
    conn: &mut SqliteConnection,
    filter: &ItemFilter,
    active_only: bool,
) -> DbResult<Vec<InventoryItem>> {
    let mut qb: QueryBuilder<Sqlite> =
        QueryBuilder::new(format!("SELECT {ITEM_COLUMNS} FROM inventory_items WHERE 1 = 1"));
    push_filter(&mut qb, filter, active_only);
    qb.push(" ORDER BY name, id");

    debug!(sql = qb.sql(), "Listing inventory items");

    let items = qb
        .build_query_as::<InventoryItem>()
        .fetch_all(&mut *conn)
        .await?;
    Ok(items)
}

/// Stamps `updated_at` on the active items matching `filter`.
///
/// Run first in a transaction so it holds the write lock before reading.
async fn touch_filtered(
    conn: &mut SqliteConnection,
    filter: &ItemFilter,
    now: DateTime<Utc>,
) -> DbResult<u64> {
    let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new("UPDATE inventory_items SET updated_at = ");
    qb.push_bind(now).push(" WHERE 1 = 1");
    push_filter(&mut qb, filter, true);

    let result = qb.build().execute(&mut *conn).await?;
    Ok(result.rows_affected())
}

fn push_filter(qb: &mut QueryBuilder<'_, Sqlite>, filter: &ItemFilter, active_only: bool) {
    if active_only {
        qb.push(" AND is_active = 1");
    }
    if let Some(category) = filter.category.as_deref().filter(|c| !c.trim().is_empty()) {
        qb.push(" AND category = ").push_bind(category.trim().to_string());
    }
    if let Some(status) = filter.status {
        qb.push(" AND status = ").push_bind(status);
    }
    if let Some(search) = filter.search.as_deref().filter(|s| !s.trim().is_empty()) {
        qb.push(" AND name LIKE ")
            .push_bind(format!("%{}%", search.trim()))
            .push(" COLLATE NOCASE");
    }
    if !filter.item_ids.is_empty() {
        qb.push(" AND id IN (");
        let mut ids = qb.separated(", ");
        for id in &filter.item_ids {
            ids.push_bind(id.clone());
        }
        ids.push_unseparated(")");
    }
}

/// Applies a quantity change and writes its ledger row. Must run inside a tx.
pub(crate) async fn change_stock(
    conn: &mut SqliteConnection,
    item_id: &str,
    movement_type: MovementType,
    quantity: i64,
    source: MovementSource<'_>,
) -> DbResult<(InventoryItem, InventoryMovement)> {
    let delta = movement_type.signed(quantity);
    let now = Utc::now();

    let updated = sqlx::query(
        r#"
        UPDATE inventory_items
        SET quantity = quantity + ?2, updated_at = ?3
        WHERE id = ?1 AND quantity + ?2 >= 0
        "#,
    )
    .bind(item_id)
    .bind(delta)
    .bind(now)
    .execute(&mut *conn)
    .await?;

    if updated.rows_affected() == 0 {
        let item = fetch_item(conn, item_id)
            .await?
            .ok_or_else(|| CoreError::ItemNotFound(item_id.to_string()))?;
        apply_movement(&item.name, item.quantity, movement_type, quantity)?;
        return Err(DbError::Internal(format!(
            "stock update for {item_id} matched no rows"
        )));
    }

    let mut item = fetch_item(conn, item_id)
        .await?
        .ok_or_else(|| CoreError::ItemNotFound(item_id.to_string()))?;

    let status = derive_status(item.quantity, item.min_stock);
    if status != item.status {
        sqlx::query("UPDATE inventory_items SET status = ?2 WHERE id = ?1")
            .bind(item_id)
            .bind(status)
            .execute(&mut *conn)
            .await?;
        debug!(item_id = %item_id, from = item.status.as_str(), to = status.as_str(), "Stock status changed");
        item.status = status;
    }

    let movement = insert_movement(conn, item_id, movement_type, quantity, source).await?;
    Ok((item, movement))
}

async fn insert_movement(
    conn: &mut SqliteConnection,
    item_id: &str,
    movement_type: MovementType,
    quantity: i64,
    source: MovementSource<'_>,
) -> DbResult<InventoryMovement> {
    let movement = InventoryMovement {
        id: Uuid::new_v4().to_string(),
        item_id: item_id.to_string(),
        movement_type,
        quantity,
        reason: source.reason.to_string(),
        related_record_type: source.record_type.map(str::to_string),
        related_record_id: source.record_id.map(str::to_string),
        user_id: source.user_id.map(str::to_string),
        created_at: Utc::now(),
    };

    sqlx::query(
        r#"
        INSERT INTO inventory_movements (
            id, item_id, movement_type, quantity, reason,
            related_record_type, related_record_id, user_id, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
        "#,
    )
    .bind(&movement.id)
    .bind(&movement.item_id)
    .bind(movement.movement_type)
    .bind(movement.quantity)
    .bind(&movement.reason)
    .bind(&movement.related_record_type)
    .bind(&movement.related_record_id)
    .bind(&movement.user_id)
    .bind(movement.created_at)
    .execute(&mut *conn)
    .await?;

    Ok(movement)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};
    use vetpos_core::pricing::{AdjustmentDirection, AdjustmentTarget, AdjustmentType};
    use vetpos_core::InventoryStatus;

    async fn db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    fn new_item(name: &str, category: &str, quantity: i64, price_cents: i64) -> NewInventoryItem {
        NewInventoryItem {
            name: name.to_string(),
            category: category.to_string(),
            description: None,
            quantity,
            min_stock: 2,
            price_cents,
            cost_cents: price_cents / 2,
        }
    }

    #[tokio::test]
    async fn test_insert_records_opening_movement() {
        let db = db().await;
        let repo = db.inventory();

        let item = repo.insert(&new_item("Flea collar", "accessories", 12, 25_000), None).await.unwrap();
        assert_eq!(item.status, InventoryStatus::Active);

        let movements = repo.movements(&item.id).await.unwrap();
        assert_eq!(movements.len(), 1);
        assert_eq!(movements[0].movement_type, MovementType::In);
        assert_eq!(movements[0].quantity, 12);

        assert!(repo.reconcile(&item.id).await.unwrap().is_consistent);
    }

    #[tokio::test]
    async fn test_insert_without_stock_is_out_of_stock() {
        let db = db().await;
        let item = db.inventory().insert(&new_item("Rabies vaccine", "vaccines", 0, 30_000), None).await.unwrap();
        assert_eq!(item.status, InventoryStatus::OutOfStock);
        assert!(db.inventory().movements(&item.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_insert_rejects_invalid_item() {
        let db = db().await;
        let mut bad = new_item("", "medicine", 1, 100);
        assert!(db.inventory().insert(&bad, None).await.is_err());

        bad.name = "Antibiotic".to_string();
        bad.price_cents = -1;
        assert!(db.inventory().insert(&bad, None).await.is_err());
        assert_eq!(db.inventory().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_manual_movements_update_status() {
        let db = db().await;
        let repo = db.inventory();
        let item = repo.insert(&new_item("Shampoo", "grooming", 5, 9_000), None).await.unwrap();

        let (after, movement) = repo
            .record_movement(&item.id, MovementType::Out, 3, "Damaged in transit", Some("user-1"))
            .await
            .unwrap();
        assert_eq!(after.quantity, 2);
        assert_eq!(after.status, InventoryStatus::LowStock);
        assert_eq!(movement.user_id.as_deref(), Some("user-1"));

        let (after, _) = repo
            .record_movement(&item.id, MovementType::Out, 2, "Expired", None)
            .await
            .unwrap();
        assert_eq!(after.quantity, 0);
        assert_eq!(after.status, InventoryStatus::OutOfStock);

        let (after, _) = repo
            .record_movement(&item.id, MovementType::In, 10, "Delivery", None)
            .await
            .unwrap();
        assert_eq!(after.status, InventoryStatus::Active);

        let report = repo.reconcile(&item.id).await.unwrap();
        assert!(report.is_consistent);
        assert_eq!(report.movement_count, 4);
    }

    #[tokio::test]
    async fn test_movement_cannot_go_negative() {
        let db = db().await;
        let repo = db.inventory();
        let item = repo.insert(&new_item("Dewormer", "medicine", 1, 5_000), None).await.unwrap();

        let err = repo
            .record_movement(&item.id, MovementType::Out, 2, "Count correction", None)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DbError::Domain(CoreError::InsufficientStock { available: 1, requested: 2, .. })
        ));

        // Nothing written
        let item = repo.get_by_id(&item.id).await.unwrap().unwrap();
        assert_eq!(item.quantity, 1);
        assert_eq!(repo.movements(&item.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_movement_on_unknown_item() {
        let db = db().await;
        let err = db
            .inventory()
            .record_movement("missing", MovementType::In, 1, "Delivery", None)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::ItemNotFound(_))));
    }

    #[tokio::test]
    async fn test_list_filters() {
        let db = db().await;
        let repo = db.inventory();
        repo.insert(&new_item("Canine vaccine", "vaccines", 10, 30_000), None).await.unwrap();
        repo.insert(&new_item("Feline vaccine", "vaccines", 0, 28_000), None).await.unwrap();
        let collar = repo.insert(&new_item("Collar", "accessories", 4, 8_000), None).await.unwrap();

        let vaccines = ItemFilter {
            category: Some("vaccines".into()),
            ..Default::default()
        };
        assert_eq!(repo.list(&vaccines, true).await.unwrap().len(), 2);

        let out = ItemFilter {
            status: Some(InventoryStatus::OutOfStock),
            ..Default::default()
        };
        let out = repo.list(&out, true).await.unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].name, "Feline vaccine");

        let search = ItemFilter {
            search: Some("VACC".into()),
            ..Default::default()
        };
        assert_eq!(repo.list(&search, true).await.unwrap().len(), 2);

        let by_id = ItemFilter {
            item_ids: vec![collar.id.clone()],
            ..Default::default()
        };
        let listed = repo.list(&by_id, true).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, collar.id);
    }

    #[tokio::test]
    async fn test_preview_does_not_persist() {
        let db = db().await;
        let repo = db.inventory();
        let item = repo.insert(&new_item("Leash", "accessories", 3, 10_000), None).await.unwrap();

        let adjustment = PriceAdjustment {
            adjustment_type: AdjustmentType::Percent,
            direction: AdjustmentDirection::Increase,
            value: 10.0,
            target: AdjustmentTarget::Price,
        };
        let summary = repo
            .preview_price_adjustment(&ItemFilter::default(), &adjustment)
            .await
            .unwrap();
        assert_eq!(summary.item_count, 1);
        assert_eq!(summary.price.average_after.cents(), 11_000);

        let unchanged = repo.get_by_id(&item.id).await.unwrap().unwrap();
        assert_eq!(unchanged.price_cents, 10_000);
    }

    #[tokio::test]
    async fn test_apply_persists_filtered_items_only() {
        let db = db().await;
        let repo = db.inventory();
        let food = repo.insert(&new_item("Kibble 10kg", "food", 8, 60_000), None).await.unwrap();
        let toy = repo.insert(&new_item("Chew toy", "accessories", 8, 5_000), None).await.unwrap();
        let toy = repo.get_by_id(&toy.id).await.unwrap().unwrap();

        let adjustment = PriceAdjustment {
            adjustment_type: AdjustmentType::Fixed,
            direction: AdjustmentDirection::Decrease,
            value: 50.0,
            target: AdjustmentTarget::Both,
        };
        let filter = ItemFilter {
            category: Some("food".into()),
            ..Default::default()
        };
        let summary = repo.apply_price_adjustment(&filter, &adjustment).await.unwrap();
        assert_eq!(summary.item_count, 1);

        let food = repo.get_by_id(&food.id).await.unwrap().unwrap();
        assert_eq!(food.price_cents, 55_000);
        assert_eq!(food.cost_cents, 25_000);

        let toy_after = repo.get_by_id(&toy.id).await.unwrap().unwrap();
        assert_eq!(toy_after.price_cents, 5_000);
        assert_eq!(toy_after.updated_at, toy.updated_at);
    }

    #[tokio::test]
    async fn test_rejected_apply_writes_nothing() {
        let db = db().await;
        let repo = db.inventory();
        let unit = new_item("Ultrasound unit", "equipment", 1, vetpos_core::MAX_AMOUNT_CENTS);
        repo.insert(&unit, None).await.unwrap();
        repo.insert(&new_item("Gauze", "equipment", 40, 500), None).await.unwrap();
        let before = repo.list(&ItemFilter::default(), true).await.unwrap();
        assert_eq!(before.len(), 2);

        let adjustment = PriceAdjustment {
            adjustment_type: AdjustmentType::Percent,
            direction: AdjustmentDirection::Increase,
            value: 10.0,
            target: AdjustmentTarget::Price,
        };
        let err = repo
            .apply_price_adjustment(&ItemFilter::default(), &adjustment)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DbError::Domain(CoreError::Validation(ValidationError::OutOfRange { .. }))
        ));

        // The opening updated_at stamp was rolled back with the rest.
        for before in &before {
            let after = repo.get_by_id(&before.id).await.unwrap().unwrap();
            assert_eq!(after.price_cents, before.price_cents);
            assert_eq!(after.updated_at, before.updated_at);
        }
    }
}
