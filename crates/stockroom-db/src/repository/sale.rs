//! # Sale Repository
//!
//! Reads of committed sales, plus the row writes the ledger performs inside
//! its transaction.
//!
//! ## Who Writes What
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Sale Rows                                         │
//! │                                                                         │
//! │  Ledger::place_order (one transaction)                                 │
//! │     ├── insert_sale_in()   → sales      (total, customer, commit time) │
//! │     └── insert_line_in()   → sale_lines (one per input line, frozen    │
//! │                                          unit price)                   │
//! │                                                                         │
//! │  Ledger::delete_sale                                                   │
//! │     └── delete_in()        → sales row; lines go by ON DELETE CASCADE  │
//! │                                                                         │
//! │  Everyone else: get_by_id / get_lines / get_with_lines / count         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use stockroom_core::{Sale, SaleLine, SaleWithLines};

/// Repository for sale database operations.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    /// Creates a new SaleRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    /// Gets a sale header by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Sale>> {
        let mut conn = self.pool.acquire().await?;
        get_sale_in(&mut conn, id).await
    }

    /// Gets the lines of a sale in submission order.
    pub async fn get_lines(&self, sale_id: &str) -> DbResult<Vec<SaleLine>> {
        let mut conn = self.pool.acquire().await?;
        get_lines_in(&mut conn, sale_id).await
    }

    /// Gets a sale with its lines from one consistent snapshot.
    pub async fn get_with_lines(&self, id: &str) -> DbResult<Option<SaleWithLines>> {
        let mut tx = self.pool.begin().await?;

        let Some(sale) = get_sale_in(&mut tx, id).await? else {
            return Ok(None);
        };
        let lines = get_lines_in(&mut tx, id).await?;
        tx.commit().await?;

        Ok(Some(SaleWithLines { sale, lines }))
    }

    /// Counts sales (for diagnostics).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sales")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

// =============================================================================
// Transaction-scoped operations
// =============================================================================

async fn get_sale_in(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Sale>> {
    let sale = sqlx::query_as::<_, Sale>(
        "SELECT id, customer_id, total_cents, created_at FROM sales WHERE id = ?1",
    )
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(sale)
}

async fn get_lines_in(conn: &mut SqliteConnection, sale_id: &str) -> DbResult<Vec<SaleLine>> {
    let lines = sqlx::query_as::<_, SaleLine>(
        r#"
        SELECT
            id, sale_id, product_id, position,
            quantity, unit_price_cents, subtotal_cents
        FROM sale_lines
        WHERE sale_id = ?1
        ORDER BY position
        "#,
    )
    .bind(sale_id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(lines)
}

pub(crate) async fn insert_sale_in(conn: &mut SqliteConnection, sale: &Sale) -> DbResult<()> {
    debug!(id = %sale.id, customer_id = %sale.customer_id, total_cents = sale.total_cents, "Inserting sale");

    sqlx::query(
        r#"
        INSERT INTO sales (id, customer_id, total_cents, created_at)
        VALUES (?1, ?2, ?3, ?4)
        "#,
    )
    .bind(&sale.id)
    .bind(&sale.customer_id)
    .bind(sale.total_cents)
    .bind(sale.created_at)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Inserts one sale line.
///
/// ## Snapshot Pattern
/// The unit price is copied from the product as it was read under lock.
/// Later price changes never touch committed lines.
pub(crate) async fn insert_line_in(conn: &mut SqliteConnection, line: &SaleLine) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO sale_lines (
            id, sale_id, product_id, position,
            quantity, unit_price_cents, subtotal_cents
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
        "#,
    )
    .bind(&line.id)
    .bind(&line.sale_id)
    .bind(&line.product_id)
    .bind(line.position)
    .bind(line.quantity)
    .bind(line.unit_price_cents)
    .bind(line.subtotal_cents)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Deletes a sale; returns whether it existed.
pub(crate) async fn delete_in(conn: &mut SqliteConnection, id: &str) -> DbResult<bool> {
    let result = sqlx::query("DELETE FROM sales WHERE id = ?1")
        .bind(id)
        .execute(&mut *conn)
        .await?;

    Ok(result.rows_affected() == 1)
}
