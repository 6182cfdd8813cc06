//! # Cash Drawer Repository
//!
//! Register sessions and the cash moving through them.
//!
//! ## Drawer Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  open(initial)          status = open      (at most one, unique index)  │
//! │     │                                                                   │
//! │     ├── sale (cash)     + amount     ← SaleRepository::create_sale      │
//! │     ├── deposit         + amount                                        │
//! │     ├── withdrawal      − amount                                        │
//! │     ├── refund          − amount     ← SaleRepository::cancel_sale      │
//! │     ▼                                                                   │
//! │  close(final)           expected   = initial + Σ signed                 │
//! │                         difference = final − expected                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use serde::Serialize;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use vetpos_core::drawer::{expected_amount, DrawerReconciliation};
use vetpos_core::validation::{
    validate_non_negative_cents, validate_optional_text, validate_positive_cents, MAX_NOTE_LEN,
};
use vetpos_core::{
    CashDrawer, CashTransaction, CoreError, DrawerStatus, Money, TransactionType, ValidationError,
};

const DRAWER_COLUMNS: &str = "id, status, initial_amount_cents, final_amount_cents, \
     expected_amount_cents, difference_cents, opened_by, closed_by, notes, opened_at, closed_at";

const TRANSACTION_COLUMNS: &str =
    "id, drawer_id, transaction_type, amount_cents, description, sale_id, user_id, created_at";

/// A drawer with its transactions and the amount it should hold right now.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DrawerSummary {
    pub drawer: CashDrawer,
    pub transactions: Vec<CashTransaction>,
    pub expected_amount_cents: i64,
}

/// Cash to add to a drawer row.
pub(crate) struct NewCashTransaction<'a> {
    pub drawer_id: &'a str,
    pub transaction_type: TransactionType,
    pub amount_cents: i64,
    pub description: Option<String>,
    pub sale_id: Option<&'a str>,
    pub user_id: Option<&'a str>,
}

/// Repository for cash drawer database operations.
#[derive(Debug, Clone)]
pub struct CashDrawerRepository {
    pool: SqlitePool,
}

impl CashDrawerRepository {
    pub fn new(pool: SqlitePool) -> Self {
        CashDrawerRepository { pool }
    }

    /// The currently open drawer, if any.
    pub async fn find_open(&self) -> DbResult<Option<CashDrawer>> {
        let mut conn = self.pool.acquire().await?;
        find_open_drawer(&mut conn).await
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<CashDrawer>> {
        let mut conn = self.pool.acquire().await?;
        fetch_drawer(&mut conn, id).await
    }

    /// Opens a new drawer session.
    ///
    /// ## Errors
    /// `DrawerAlreadyOpen` when another drawer is open. The check below gives
    /// the friendly error; the partial unique index catches the race where
    /// two opens pass the check at the same time.
    pub async fn open(
        &self,
        initial_amount_cents: i64,
        opened_by: Option<&str>,
        notes: Option<String>,
    ) -> DbResult<CashDrawer> {
        validate_non_negative_cents(initial_amount_cents, "initialAmountCents")?;
        validate_optional_text(&notes, "notes", MAX_NOTE_LEN)?;

        if let Some(open) = self.find_open().await? {
            return Err(CoreError::DrawerAlreadyOpen(open.id).into());
        }

        let drawer = CashDrawer {
            id: Uuid::new_v4().to_string(),
            status: DrawerStatus::Open,
            initial_amount_cents,
            final_amount_cents: None,
            expected_amount_cents: None,
            difference_cents: None,
            opened_by: opened_by.map(str::to_string),
            closed_by: None,
            notes,
            opened_at: Utc::now(),
            closed_at: None,
        };

        let inserted = sqlx::query(
            r#"
            INSERT INTO cash_drawers (id, status, initial_amount_cents, opened_by, notes, opened_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&drawer.id)
        .bind(drawer.status)
        .bind(drawer.initial_amount_cents)
        .bind(&drawer.opened_by)
        .bind(&drawer.notes)
        .bind(drawer.opened_at)
        .execute(&self.pool)
        .await;

        match inserted.map_err(DbError::from) {
            Ok(_) => {}
            Err(err) if err.is_unique_violation_on("cash_drawers.status") => {
                warn!("Concurrent drawer open rejected by unique index");
                let open_id = self
                    .find_open()
                    .await?
                    .map(|d| d.id)
                    .unwrap_or_default();
                return Err(CoreError::DrawerAlreadyOpen(open_id).into());
            }
            Err(err) => return Err(err),
        }

        info!(
            id = %drawer.id,
            initial = drawer.initial_amount_cents,
            opened_by = ?drawer.opened_by,
            "Cash drawer opened"
        );
        Ok(drawer)
    }

    /// Transactions of a drawer, oldest first.
    pub async fn transactions(&self, drawer_id: &str) -> DbResult<Vec<CashTransaction>> {
        let mut conn = self.pool.acquire().await?;
        fetch_transactions(&mut conn, drawer_id).await
    }

    /// The open drawer with its transactions and running expected amount.
    pub async fn current(&self) -> DbResult<Option<DrawerSummary>> {
        let Some(drawer) = self.find_open().await? else {
            return Ok(None);
        };
        let transactions = self.transactions(&drawer.id).await?;
        let expected = expected_amount(Money::from_cents(drawer.initial_amount_cents), &transactions);

        Ok(Some(DrawerSummary {
            drawer,
            transactions,
            expected_amount_cents: expected.cents(),
        }))
    }

    /// Records a manual deposit or withdrawal on the open drawer.
    ///
    /// Sales and refunds are written by the sale flow, not through here.
    pub async fn record_transaction(
        &self,
        transaction_type: TransactionType,
        amount_cents: i64,
        description: Option<String>,
        user_id: Option<&str>,
    ) -> DbResult<CashTransaction> {
        if !matches!(
            transaction_type,
            TransactionType::Deposit | TransactionType::Withdrawal
        ) {
            return Err(ValidationError::InvalidFormat {
                field: "transactionType".to_string(),
                reason: "must be deposit or withdrawal".to_string(),
            }
            .into());
        }
        validate_positive_cents(amount_cents, "amountCents")?;
        validate_optional_text(&description, "description", MAX_NOTE_LEN)?;

        let mut tx = self.pool.begin().await?;
        let drawer = claim_open_drawer(&mut tx)
            .await?
            .ok_or(CoreError::NoOpenDrawer)?;

        let transaction = insert_transaction(
            &mut tx,
            NewCashTransaction {
                drawer_id: &drawer.id,
                transaction_type,
                amount_cents,
                description,
                sale_id: None,
                user_id,
            },
        )
        .await?;
        tx.commit().await?;

        info!(
            drawer_id = %drawer.id,
            kind = ?transaction_type,
            amount = amount_cents,
            "Cash transaction recorded"
        );
        Ok(transaction)
    }

    /// Closes a drawer with the counted amount.
    ///
    /// ## What This Does
    /// 1. Marks the drawer closed (only if it is still open)
    /// 2. Sums its transactions: expected = initial + Σ signed amounts
    /// 3. Stores final, expected and difference = final − expected
    pub async fn close(
        &self,
        drawer_id: &str,
        final_amount_cents: i64,
        closed_by: Option<&str>,
        notes: Option<String>,
    ) -> DbResult<(CashDrawer, DrawerReconciliation)> {
        validate_non_negative_cents(final_amount_cents, "finalAmountCents")?;
        validate_optional_text(&notes, "notes", MAX_NOTE_LEN)?;

        let mut tx = self.pool.begin().await?;
        let now = Utc::now();

        // Claim the drawer before summing its transactions.
        let claimed = sqlx::query(
            "UPDATE cash_drawers SET status = 'closed', closed_at = ?2 WHERE id = ?1 AND status = 'open'",
        )
        .bind(drawer_id)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        if claimed.rows_affected() == 0 {
            return match fetch_drawer(&mut tx, drawer_id).await? {
                Some(_) => Err(CoreError::DrawerNotOpen(drawer_id.to_string()).into()),
                None => Err(CoreError::DrawerNotFound(drawer_id.to_string()).into()),
            };
        }

        let drawer = fetch_drawer(&mut tx, drawer_id)
            .await?
            .ok_or_else(|| CoreError::DrawerNotFound(drawer_id.to_string()))?;
        let transactions = fetch_transactions(&mut tx, drawer_id).await?;

        let reconciliation = DrawerReconciliation::compute(
            Money::from_cents(drawer.initial_amount_cents),
            &transactions,
            Money::from_cents(final_amount_cents),
        );

        sqlx::query(
            r#"
            UPDATE cash_drawers SET
                final_amount_cents = ?2,
                expected_amount_cents = ?3,
                difference_cents = ?4,
                closed_by = ?5,
                notes = COALESCE(?6, notes)
            WHERE id = ?1
            "#,
        )
        .bind(drawer_id)
        .bind(reconciliation.counted.cents())
        .bind(reconciliation.expected.cents())
        .bind(reconciliation.difference.cents())
        .bind(closed_by)
        .bind(&notes)
        .execute(&mut *tx)
        .await?;

        let closed = fetch_drawer(&mut tx, drawer_id)
            .await?
            .ok_or_else(|| CoreError::DrawerNotFound(drawer_id.to_string()))?;

        tx.commit().await?;

        if reconciliation.is_balanced() {
            info!(id = %drawer_id, expected = reconciliation.expected.cents(), "Cash drawer closed");
        } else {
            warn!(
                id = %drawer_id,
                expected = reconciliation.expected.cents(),
                counted = reconciliation.counted.cents(),
                difference = reconciliation.difference.cents(),
                "Cash drawer closed with a difference"
            );
        }

        Ok((closed, reconciliation))
    }

    /// Drawer history, newest first.
    pub async fn list(&self, limit: i64, offset: i64) -> DbResult<Vec<CashDrawer>> {
        let drawers = sqlx::query_as::<_, CashDrawer>(&format!(
            "SELECT {DRAWER_COLUMNS} FROM cash_drawers ORDER BY opened_at DESC, rowid DESC LIMIT ?1 OFFSET ?2"
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(drawers)
    }
}

pub(crate) async fn find_open_drawer(conn: &mut SqliteConnection) -> DbResult<Option<CashDrawer>> {
    let drawer = sqlx::query_as::<_, CashDrawer>(&format!(
        "SELECT {DRAWER_COLUMNS} FROM cash_drawers WHERE status = 'open' LIMIT 1"
    ))
    .fetch_optional(&mut *conn)
    .await?;

    Ok(drawer)
}

/// Same as [`find_open_drawer`], but through a no-op UPDATE so the caller's
/// transaction holds the write lock before it reads the drawer.
async fn claim_open_drawer(conn: &mut SqliteConnection) -> DbResult<Option<CashDrawer>> {
    let drawer = sqlx::query_as::<_, CashDrawer>(&format!(
        "UPDATE cash_drawers SET status = status WHERE status = 'open' RETURNING {DRAWER_COLUMNS}"
    ))
    .fetch_optional(&mut *conn)
    .await?;

    Ok(drawer)
}

async fn fetch_drawer(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<CashDrawer>> {
    let drawer = sqlx::query_as::<_, CashDrawer>(&format!(
        "SELECT {DRAWER_COLUMNS} FROM cash_drawers WHERE id = ?1"
    ))
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(drawer)
}

async fn fetch_transactions(
    conn: &mut SqliteConnection,
    drawer_id: &str,
) -> DbResult<Vec<CashTransaction>> {
    let transactions = sqlx::query_as::<_, CashTransaction>(&format!(
        "SELECT {TRANSACTION_COLUMNS} FROM cash_transactions \
         WHERE drawer_id = ?1 ORDER BY created_at, rowid"
    ))
    .bind(drawer_id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(transactions)
}

pub(crate) async fn insert_transaction(
    conn: &mut SqliteConnection,
    new: NewCashTransaction<'_>,
) -> DbResult<CashTransaction> {
    let transaction = CashTransaction {
        id: Uuid::new_v4().to_string(),
        drawer_id: new.drawer_id.to_string(),
        transaction_type: new.transaction_type,
        amount_cents: new.amount_cents,
        description: new.description,
        sale_id: new.sale_id.map(str::to_string),
        user_id: new.user_id.map(str::to_string),
        created_at: Utc::now(),
    };

    sqlx::query(
        r#"
        INSERT INTO cash_transactions (
            id, drawer_id, transaction_type, amount_cents, description, sale_id, user_id, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
        "#,
    )
    .bind(&transaction.id)
    .bind(&transaction.drawer_id)
    .bind(transaction.transaction_type)
    .bind(transaction.amount_cents)
    .bind(&transaction.description)
    .bind(&transaction.sale_id)
    .bind(&transaction.user_id)
    .bind(transaction.created_at)
    .execute(&mut *conn)
    .await?;

    Ok(transaction)
}
