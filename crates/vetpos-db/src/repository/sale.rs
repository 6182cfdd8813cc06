//! # Sale Repository
//!
//! Creating and cancelling sales. Each is one database transaction.
//!
//! ## Sale Creation
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  create_sale(NewSale, TaxRate)                                          │
//! │                                                                         │
//! │  validate + totals (pure, vetpos-core)                                  │
//! │     │                                                                   │
//! │  BEGIN                                                                  │
//! │     ├── receipt_sequences upsert → YYYYMMDD-NNNN                        │
//! │     ├── open drawer?              (none → NoOpenDrawer)                 │
//! │     ├── resolve lines             (snapshot item/service names)         │
//! │     ├── INSERT sales, sale_items  (input order)                         │
//! │     ├── per item line: stock −qty, status, `out` movement               │
//! │     └── cash: `sale` transaction on the open drawer                     │
//! │  COMMIT   (any error above → nothing persisted)                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Cancellation
//! Restocks item lines with `in` movements and, for cash sales, records a
//! refund on whichever drawer is open at the time.

use chrono::{NaiveDate, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::repository::cash_drawer::{find_open_drawer, insert_transaction, NewCashTransaction};
use crate::repository::inventory::{change_stock, fetch_item, MovementSource};
use crate::repository::service::fetch_service;
use vetpos_core::receipt::{day_key, format_receipt_number};
use vetpos_core::sale::{LineTarget, NewSale, SaleTotals};
use vetpos_core::{
    CoreError, MovementType, Sale, SaleItem, SaleStatus, SaleWithItems, TaxRate, TransactionType,
};

const SALE_COLUMNS: &str = "id, receipt_number, client_id, pet_id, cash_drawer_id, \
     subtotal_cents, discount_cents, tax_cents, total_cents, payment_method, status, notes, \
     user_id, created_at, cancelled_at";

const SALE_ITEM_COLUMNS: &str = "id, sale_id, position, item_id, service_id, description, \
     quantity, unit_price_cents, discount_cents, total_cents";

/// Repository for sale database operations.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    /// Creates a completed sale with its lines, stock movements and drawer
    /// bookkeeping.
    ///
    /// ## Errors
    /// - `NoOpenDrawer` when no drawer is open
    /// - `ItemNotFound` / `ServiceNotFound` for unknown or inactive references
    /// - `InsufficientStock` when an item line exceeds the quantity on hand
    /// - validation errors for malformed lines
    pub async fn create_sale(&self, new: &NewSale, tax_rate: TaxRate) -> DbResult<SaleWithItems> {
        new.validate()?;
        let totals = SaleTotals::compute(&new.lines, tax_rate);

        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let receipt_number = next_receipt_number(&mut tx, now.date_naive()).await?;

        let drawer = find_open_drawer(&mut tx)
            .await?
            .ok_or(CoreError::NoOpenDrawer)?;

        let sale = Sale {
            id: Uuid::new_v4().to_string(),
            receipt_number,
            client_id: new.client_id.clone(),
            pet_id: new.pet_id.clone(),
            cash_drawer_id: drawer.id.clone(),
            subtotal_cents: totals.subtotal.cents(),
            discount_cents: totals.discount.cents(),
            tax_cents: totals.tax.cents(),
            total_cents: totals.total.cents(),
            payment_method: new.payment_method,
            status: SaleStatus::Completed,
            notes: new.notes.clone(),
            user_id: new.user_id.clone(),
            created_at: now,
            cancelled_at: None,
        };

        debug!(id = %sale.id, receipt_number = %sale.receipt_number, lines = new.lines.len(), "Creating sale");

        // Resolve every reference before writing lines so the descriptions
        // are the names at the time of sale.
        let mut items = Vec::with_capacity(new.lines.len());
        for (position, line) in new.lines.iter().enumerate() {
            let (item_id, service_id, description) = match line.target()? {
                LineTarget::Item(id) => {
                    let item = fetch_item(&mut tx, id)
                        .await?
                        .filter(|i| i.is_active)
                        .ok_or_else(|| CoreError::ItemNotFound(id.to_string()))?;
                    (Some(item.id), None, item.name)
                }
                LineTarget::Service(id) => {
                    let service = fetch_service(&mut tx, id)
                        .await?
                        .filter(|s| s.is_active)
                        .ok_or_else(|| CoreError::ServiceNotFound(id.to_string()))?;
                    (None, Some(service.id), service.name)
                }
            };

            items.push(SaleItem {
                id: Uuid::new_v4().to_string(),
                sale_id: sale.id.clone(),
                position: position as i64,
                item_id,
                service_id,
                description,
                quantity: line.quantity,
                unit_price_cents: line.unit_price_cents,
                discount_cents: line.discount_cents,
                total_cents: line.total().cents(),
            });
        }

        insert_sale(&mut tx, &sale).await?;

        for item in &items {
            insert_sale_item(&mut tx, item).await?;

            if let Some(item_id) = &item.item_id {
                let reason = format!("Sale {}", sale.receipt_number);
                change_stock(
                    &mut tx,
                    item_id,
                    MovementType::Out,
                    item.quantity,
                    MovementSource {
                        reason: &reason,
                        record_type: Some("sale"),
                        record_id: Some(&sale.id),
                        user_id: sale.user_id.as_deref(),
                    },
                )
                .await?;
            }
        }

        if sale.payment_method.affects_drawer() && sale.total_cents > 0 {
            insert_transaction(
                &mut tx,
                NewCashTransaction {
                    drawer_id: &drawer.id,
                    transaction_type: TransactionType::Sale,
                    amount_cents: sale.total_cents,
                    description: Some(format!("Sale {}", sale.receipt_number)),
                    sale_id: Some(&sale.id),
                    user_id: sale.user_id.as_deref(),
                },
            )
            .await?;
        }

        tx.commit().await?;

        info!(
            id = %sale.id,
            receipt_number = %sale.receipt_number,
            total = sale.total_cents,
            payment = ?sale.payment_method,
            "Sale completed"
        );

        Ok(SaleWithItems { sale, items })
    }

    pub async fn get(&self, id: &str) -> DbResult<Option<SaleWithItems>> {
        let mut conn = self.pool.acquire().await?;
        let Some(sale) = fetch_sale(&mut conn, id).await? else {
            return Ok(None);
        };
        let items = fetch_sale_items(&mut conn, id).await?;
        Ok(Some(SaleWithItems { sale, items }))
    }

    /// Sales of one business day, newest first.
    pub async fn list_for_day(&self, day: NaiveDate) -> DbResult<Vec<Sale>> {
        let sales = sqlx::query_as::<_, Sale>(&format!(
            "SELECT {SALE_COLUMNS} FROM sales WHERE receipt_number LIKE ?1 \
             ORDER BY created_at DESC, rowid DESC"
        ))
        .bind(format!("{}-%", day_key(day)))
        .fetch_all(&self.pool)
        .await?;

        Ok(sales)
    }

    /// Cancels a completed sale: restocks item lines and refunds cash.
    ///
    /// ## Errors
    /// - `SaleNotFound`
    /// - `InvalidSaleStatus` when the sale is already cancelled
    /// - `NoOpenDrawer` for a cash sale when no drawer is open to pay out of
    pub async fn cancel_sale(&self, id: &str, user_id: Option<&str>) -> DbResult<SaleWithItems> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let claimed = sqlx::query(
            "UPDATE sales SET status = 'cancelled', cancelled_at = ?2 WHERE id = ?1 AND status = 'completed'",
        )
        .bind(id)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        if claimed.rows_affected() == 0 {
            return match fetch_sale(&mut tx, id).await? {
                Some(sale) => Err(CoreError::InvalidSaleStatus {
                    sale_id: sale.id,
                    current_status: sale.status.as_str().to_string(),
                }
                .into()),
                None => Err(CoreError::SaleNotFound(id.to_string()).into()),
            };
        }

        let sale = fetch_sale(&mut tx, id)
            .await?
            .ok_or_else(|| CoreError::SaleNotFound(id.to_string()))?;
        let items = fetch_sale_items(&mut tx, id).await?;

        let reason = format!("Cancellation of sale {}", sale.receipt_number);
        for item in &items {
            if let Some(item_id) = &item.item_id {
                change_stock(
                    &mut tx,
                    item_id,
                    MovementType::In,
                    item.quantity,
                    MovementSource {
                        reason: &reason,
                        record_type: Some("sale_cancellation"),
                        record_id: Some(&sale.id),
                        user_id,
                    },
                )
                .await?;
            }
        }

        if sale.payment_method.affects_drawer() && sale.total_cents > 0 {
            let drawer = find_open_drawer(&mut tx)
                .await?
                .ok_or(CoreError::NoOpenDrawer)?;
            insert_transaction(
                &mut tx,
                NewCashTransaction {
                    drawer_id: &drawer.id,
                    transaction_type: TransactionType::Refund,
                    amount_cents: sale.total_cents,
                    description: Some(reason.clone()),
                    sale_id: Some(&sale.id),
                    user_id,
                },
            )
            .await?;
        }

        tx.commit().await?;

        info!(id = %sale.id, receipt_number = %sale.receipt_number, "Sale cancelled");
        Ok(SaleWithItems { sale, items })
    }
}

/// Allocates the next receipt number of the day. Serialized by the counter row.
async fn next_receipt_number(conn: &mut SqliteConnection, day: NaiveDate) -> DbResult<String> {
    let seq: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO receipt_sequences (day, last_seq) VALUES (?1, 1)
        ON CONFLICT(day) DO UPDATE SET last_seq = last_seq + 1
        RETURNING last_seq
        "#,
    )
    .bind(day_key(day))
    .fetch_one(&mut *conn)
    .await?;

    Ok(format_receipt_number(day, seq))
}

async fn insert_sale(conn: &mut SqliteConnection, sale: &Sale) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO sales (
            id, receipt_number, client_id, pet_id, cash_drawer_id,
            subtotal_cents, discount_cents, tax_cents, total_cents,
            payment_method, status, notes, user_id, created_at, cancelled_at
        ) VALUES (
            ?1, ?2, ?3, ?4, ?5,
            ?6, ?7, ?8, ?9,
            ?10, ?11, ?12, ?13, ?14, ?15
        )
        "#,
    )
    .bind(&sale.id)
    .bind(&sale.receipt_number)
    .bind(&sale.client_id)
    .bind(&sale.pet_id)
    .bind(&sale.cash_drawer_id)
    .bind(sale.subtotal_cents)
    .bind(sale.discount_cents)
    .bind(sale.tax_cents)
    .bind(sale.total_cents)
    .bind(sale.payment_method)
    .bind(sale.status)
    .bind(&sale.notes)
    .bind(&sale.user_id)
    .bind(sale.created_at)
    .bind(sale.cancelled_at)
    .execute(&mut *conn)
    .await
    .map_err(|e| match DbError::from(e) {
        err if err.is_unique_violation_on("sales.receipt_number") => {
            DbError::duplicate("receipt_number", &sale.receipt_number)
        }
        err => err,
    })?;

    Ok(())
}

async fn insert_sale_item(conn: &mut SqliteConnection, item: &SaleItem) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO sale_items (
            id, sale_id, position, item_id, service_id, description,
            quantity, unit_price_cents, discount_cents, total_cents
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
        "#,
    )
    .bind(&item.id)
    .bind(&item.sale_id)
    .bind(item.position)
    .bind(&item.item_id)
    .bind(&item.service_id)
    .bind(&item.description)
    .bind(item.quantity)
    .bind(item.unit_price_cents)
    .bind(item.discount_cents)
    .bind(item.total_cents)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

async fn fetch_sale(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Sale>> {
    let sale = sqlx::query_as::<_, Sale>(&format!("SELECT {SALE_COLUMNS} FROM sales WHERE id = ?1"))
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(sale)
}

async fn fetch_sale_items(conn: &mut SqliteConnection, sale_id: &str) -> DbResult<Vec<SaleItem>> {
    let items = sqlx::query_as::<_, SaleItem>(&format!(
        "SELECT {SALE_ITEM_COLUMNS} FROM sale_items WHERE sale_id = ?1 ORDER BY position"
    ))
    .bind(sale_id)
    .fetch_all(&mut *conn)
    .await?;
    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::inventory::NewInventoryItem;
    use crate::repository::service::NewService;
    use crate::{Database, DbConfig};
    use std::collections::HashSet;
    use vetpos_core::receipt::parse_receipt_number;
    use vetpos_core::sale::SaleLineInput;
    use vetpos_core::{InventoryStatus, PaymentMethod};

    struct Fixture {
        db: Database,
        vaccine_id: String,
        collar_id: String,
        consult_id: String,
    }

    async fn fixture() -> Fixture {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        let vaccine = db
            .inventory()
            .insert(
                &NewInventoryItem {
                    name: "Rabies vaccine".into(),
                    category: "vaccines".into(),
                    description: None,
                    quantity: 3,
                    min_stock: 1,
                    price_cents: 30_000,
                    cost_cents: 12_000,
                },
                None,
            )
            .await
            .unwrap();
        let collar = db
            .inventory()
            .insert(
                &NewInventoryItem {
                    name: "Collar".into(),
                    category: "accessories".into(),
                    description: None,
                    quantity: 10,
                    min_stock: 2,
                    price_cents: 8_000,
                    cost_cents: 3_000,
                },
                None,
            )
            .await
            .unwrap();
        let consult = db
            .services()
            .insert(&NewService {
                name: "General consultation".into(),
                category: "consultation".into(),
                price_cents: 45_000,
            })
            .await
            .unwrap();

        Fixture {
            db,
            vaccine_id: vaccine.id,
            collar_id: collar.id,
            consult_id: consult.id,
        }
    }

    fn item_line(id: &str, quantity: i64, price: i64) -> SaleLineInput {
        SaleLineInput {
            item_id: Some(id.to_string()),
            service_id: None,
            quantity,
            unit_price_cents: price,
            discount_cents: 0,
        }
    }

    fn service_line(id: &str, price: i64) -> SaleLineInput {
        SaleLineInput {
            item_id: None,
            service_id: Some(id.to_string()),
            quantity: 1,
            unit_price_cents: price,
            discount_cents: 0,
        }
    }

    fn new_sale(lines: Vec<SaleLineInput>, payment_method: PaymentMethod) -> NewSale {
        NewSale {
            client_id: Some("client-1".into()),
            pet_id: Some("pet-1".into()),
            lines,
            payment_method,
            notes: None,
            user_id: Some("user-1".into()),
        }
    }

    #[tokio::test]
    async fn test_sale_without_open_drawer_fails() {
        let f = fixture().await;
        let err = f
            .db
            .sales()
            .create_sale(&new_sale(vec![item_line(&f.collar_id, 1, 8_000)], PaymentMethod::Cash), TaxRate::zero())
            .await
            .unwrap_err();

        assert!(matches!(err, DbError::Domain(CoreError::NoOpenDrawer)));
        assert_eq!(err.to_string(), "No open cash drawer");

        // Nothing persisted, stock untouched
        let collar = f.db.inventory().get_by_id(&f.collar_id).await.unwrap().unwrap();
        assert_eq!(collar.quantity, 10);
        assert!(f.db.sales().list_for_day(Utc::now().date_naive()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_sale_decrements_stock_and_records_everything() {
        let f = fixture().await;
        let drawer = f.db.cash_drawers().open(100_000, None, None).await.unwrap();

        let created = f
            .db
            .sales()
            .create_sale(
                &new_sale(
                    vec![
                        item_line(&f.vaccine_id, 3, 30_000),
                        service_line(&f.consult_id, 45_000),
                        item_line(&f.collar_id, 2, 8_000),
                    ],
                    PaymentMethod::Cash,
                ),
                TaxRate::zero(),
            )
            .await
            .unwrap();

        assert_eq!(created.sale.total_cents, 90_000 + 45_000 + 16_000);
        assert_eq!(created.sale.cash_drawer_id, drawer.id);
        assert_eq!(created.items.len(), 3);
        assert_eq!(created.items[0].description, "Rabies vaccine");
        assert_eq!(created.items[1].description, "General consultation");
        assert_eq!(created.items[2].position, 2);

        let vaccine = f.db.inventory().get_by_id(&f.vaccine_id).await.unwrap().unwrap();
        assert_eq!(vaccine.quantity, 0);
        assert_eq!(vaccine.status, InventoryStatus::OutOfStock);

        let collar = f.db.inventory().get_by_id(&f.collar_id).await.unwrap().unwrap();
        assert_eq!(collar.quantity, 8);
        assert_eq!(collar.status, InventoryStatus::Active);

        let movements = f.db.inventory().movements(&f.collar_id).await.unwrap();
        let sale_movement = movements.last().unwrap();
        assert_eq!(sale_movement.movement_type, MovementType::Out);
        assert_eq!(sale_movement.quantity, 2);
        assert_eq!(sale_movement.related_record_type.as_deref(), Some("sale"));
        assert_eq!(sale_movement.related_record_id.as_deref(), Some(created.sale.id.as_str()));
        assert!(f.db.inventory().reconcile(&f.collar_id).await.unwrap().is_consistent);

        let txs = f.db.cash_drawers().transactions(&drawer.id).await.unwrap();
        assert_eq!(txs.len(), 1);
        assert_eq!(txs[0].transaction_type, TransactionType::Sale);
        assert_eq!(txs[0].amount_cents, created.sale.total_cents);

        let fetched = f.db.sales().get(&created.sale.id).await.unwrap().unwrap();
        assert_eq!(fetched.items.len(), 3);
        assert_eq!(fetched.sale.receipt_number, created.sale.receipt_number);
    }

    #[tokio::test]
    async fn test_insufficient_stock_rolls_back() {
        let f = fixture().await;
        let drawer = f.db.cash_drawers().open(0, None, None).await.unwrap();

        let err = f
            .db
            .sales()
            .create_sale(
                &new_sale(
                    vec![item_line(&f.collar_id, 1, 8_000), item_line(&f.vaccine_id, 4, 30_000)],
                    PaymentMethod::Cash,
                ),
                TaxRate::zero(),
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DbError::Domain(CoreError::InsufficientStock { available: 3, requested: 4, .. })
        ));

        // The collar line before it was rolled back too
        let collar = f.db.inventory().get_by_id(&f.collar_id).await.unwrap().unwrap();
        assert_eq!(collar.quantity, 10);
        assert!(f.db.cash_drawers().transactions(&drawer.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_card_sale_skips_drawer_and_applies_tax() {
        let f = fixture().await;
        let drawer = f.db.cash_drawers().open(0, None, None).await.unwrap();

        let created = f
            .db
            .sales()
            .create_sale(
                &new_sale(vec![service_line(&f.consult_id, 45_000)], PaymentMethod::Card),
                TaxRate::from_bps(1600),
            )
            .await
            .unwrap();

        assert_eq!(created.sale.tax_cents, 7_200);
        assert_eq!(created.sale.total_cents, 52_200);
        assert!(f.db.cash_drawers().transactions(&drawer.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_references_fail() {
        let f = fixture().await;
        f.db.cash_drawers().open(0, None, None).await.unwrap();
        let sales = f.db.sales();

        let err = sales
            .create_sale(&new_sale(vec![item_line("missing", 1, 100)], PaymentMethod::Cash), TaxRate::zero())
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::ItemNotFound(_))));

        let err = sales
            .create_sale(&new_sale(vec![service_line("missing", 100)], PaymentMethod::Cash), TaxRate::zero())
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::ServiceNotFound(_))));
    }

    #[tokio::test]
    async fn test_receipt_numbers_unique_and_sequential() {
        let f = fixture().await;
        f.db.cash_drawers().open(0, None, None).await.unwrap();

        let mut receipts = Vec::new();
        for _ in 0..5 {
            let sale = f
                .db
                .sales()
                .create_sale(&new_sale(vec![service_line(&f.consult_id, 45_000)], PaymentMethod::Transfer), TaxRate::zero())
                .await
                .unwrap();
            receipts.push(sale.sale.receipt_number);
        }

        let unique: HashSet<_> = receipts.iter().collect();
        assert_eq!(unique.len(), receipts.len());

        let seqs: Vec<i64> = receipts
            .iter()
            .map(|r| parse_receipt_number(r).unwrap().1)
            .collect();
        assert_eq!(seqs, vec![1, 2, 3, 4, 5]);
        assert!(receipts[0].ends_with("-0001"));

        let today = f.db.sales().list_for_day(Utc::now().date_naive()).await.unwrap();
        assert_eq!(today.len(), 5);
    }

    #[tokio::test]
    async fn test_failed_sale_does_not_consume_receipt_number() {
        let f = fixture().await;

        // No drawer: the counter increment is rolled back with everything else
        assert!(f
            .db
            .sales()
            .create_sale(&new_sale(vec![service_line(&f.consult_id, 100)], PaymentMethod::Card), TaxRate::zero())
            .await
            .is_err());

        f.db.cash_drawers().open(0, None, None).await.unwrap();
        let sale = f
            .db
            .sales()
            .create_sale(&new_sale(vec![service_line(&f.consult_id, 100)], PaymentMethod::Card), TaxRate::zero())
            .await
            .unwrap();
        assert!(sale.sale.receipt_number.ends_with("-0001"));
    }

    #[tokio::test]
    async fn test_cancel_restocks_and_refunds() {
        let f = fixture().await;
        let drawer = f.db.cash_drawers().open(10_000, None, None).await.unwrap();

        let created = f
            .db
            .sales()
            .create_sale(&new_sale(vec![item_line(&f.vaccine_id, 2, 30_000)], PaymentMethod::Cash), TaxRate::zero())
            .await
            .unwrap();

        let cancelled = f.db.sales().cancel_sale(&created.sale.id, Some("user-2")).await.unwrap();
        assert_eq!(cancelled.sale.status, SaleStatus::Cancelled);
        assert!(cancelled.sale.cancelled_at.is_some());

        let vaccine = f.db.inventory().get_by_id(&f.vaccine_id).await.unwrap().unwrap();
        assert_eq!(vaccine.quantity, 3);
        assert!(f.db.inventory().reconcile(&f.vaccine_id).await.unwrap().is_consistent);

        let (_, rec) = f.db.cash_drawers().close(&drawer.id, 10_000, None, None).await.unwrap();
        assert_eq!(rec.expected.cents(), 10_000);
        assert!(rec.is_balanced());

        let err = f.db.sales().cancel_sale(&created.sale.id, None).await.unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::InvalidSaleStatus { .. })));

        let err = f.db.sales().cancel_sale("missing", None).await.unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::SaleNotFound(_))));
    }
}
