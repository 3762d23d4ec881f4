//! # Reporting Engine
//!
//! Read-only aggregate queries over committed sales and the catalog.
//! Nothing here writes; unknown ids give empty reports, not errors.
//!
//! ## Reports
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  low_stock()                    products WHERE qty <= min_stock         │
//! │                                 ordered by name                         │
//! │                                                                         │
//! │  sales_history_by_customer(c)   sales of c, newest first, lines with   │
//! │                                 product names, lifetime total          │
//! │                                                                         │
//! │  sales_history_by_product(p)    lines of p with sale + customer,       │
//! │                                 newest first                            │
//! │                                                                         │
//! │  sales_history_by_period(a, b)  sales with a <= date(created_at) <= b, │
//! │                                 oldest first, window total             │
//! │                                                                         │
//! │  list_sales()                   every sale with customer name,         │
//! │                                 newest first                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Multi-query reports run inside one read transaction so every part of the
//! report sees the same snapshot. In WAL mode that never blocks the ledger.

use std::collections::HashMap;

use chrono::NaiveDate;
use sqlx::SqlitePool;
use tokio_stream::{Stream, StreamExt};
use tracing::debug;

use crate::error::{DbError, DbResult};
use stockroom_core::{
    CustomerHistory, CustomerId, CustomerSaleRecord, PeriodReport, Product, ProductSaleRecord,
    Sale, SaleLineDetail, SaleSummary,
};

const LOW_STOCK_SQL: &str = r#"
    SELECT
        id, name, category, price_cents,
        quantity_on_hand, min_stock, supplier_id,
        created_at, updated_at
    FROM products
    WHERE quantity_on_hand <= min_stock
    ORDER BY name, id
"#;

/// Read-side queries.
#[derive(Debug, Clone)]
pub struct Reports {
    pool: SqlitePool,
}

impl Reports {
    /// Creates a new Reports handle.
    pub fn new(pool: SqlitePool) -> Self {
        Reports { pool }
    }

    /// Streams products at or below their minimum stock, by name.
    ///
    /// Rows are pulled lazily from the database. Call again to restart.
    pub fn low_stock_stream(&self) -> impl Stream<Item = DbResult<Product>> + Send + Unpin + '_ {
        debug!("Streaming low-stock report");

        sqlx::query_as::<_, Product>(LOW_STOCK_SQL)
            .fetch(&self.pool)
            .map(|row| row.map_err(DbError::from))
    }

    /// Products at or below their minimum stock, by name.
    pub async fn low_stock(&self) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(LOW_STOCK_SQL)
            .fetch_all(&self.pool)
            .await?;

        debug!(count = products.len(), "Low-stock report");
        Ok(products)
    }

    /// Every sale of a customer, newest first, with line detail and the
    /// customer's lifetime total.
    pub async fn sales_history_by_customer(
        &self,
        customer_id: &CustomerId,
    ) -> DbResult<CustomerHistory> {
        debug!(customer_id = %customer_id, "Customer sales history");

        let mut tx = self.pool.begin().await?;

        let sales = sqlx::query_as::<_, Sale>(
            r#"
            SELECT id, customer_id, total_cents, created_at
            FROM sales
            WHERE customer_id = ?1
            ORDER BY created_at DESC, rowid DESC
            "#,
        )
        .bind(customer_id)
        .fetch_all(&mut *tx)
        .await?;

        let details = sqlx::query_as::<_, SaleLineDetail>(
            r#"
            SELECT
                sl.sale_id, sl.product_id, p.name AS product_name,
                sl.quantity, sl.unit_price_cents, sl.subtotal_cents
            FROM sale_lines sl
            JOIN sales s ON s.id = sl.sale_id
            JOIN products p ON p.id = sl.product_id
            WHERE s.customer_id = ?1
            ORDER BY sl.sale_id, sl.position
            "#,
        )
        .bind(customer_id)
        .fetch_all(&mut *tx)
        .await?;

        let lifetime_total_cents: i64 = sqlx::query_scalar(
            "SELECT COALESCE(SUM(total_cents), 0) FROM sales WHERE customer_id = ?1",
        )
        .bind(customer_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        let mut lines_by_sale: HashMap<String, Vec<SaleLineDetail>> = HashMap::new();
        for detail in details {
            lines_by_sale
                .entry(detail.sale_id.clone())
                .or_default()
                .push(detail);
        }

        let sales = sales
            .into_iter()
            .map(|sale| CustomerSaleRecord {
                lines: lines_by_sale.remove(&sale.id).unwrap_or_default(),
                sale,
            })
            .collect();

        Ok(CustomerHistory {
            customer_id: customer_id.clone(),
            sales,
            lifetime_total_cents,
        })
    }

    /// Every line that sold a product, newest sale first, with the sale's
    /// total and the customer's name.
    pub async fn sales_history_by_product(&self, product_id: &str) -> DbResult<Vec<ProductSaleRecord>> {
        debug!(product_id = %product_id, "Product sales history");

        let records = sqlx::query_as::<_, ProductSaleRecord>(
            r#"
            SELECT
                s.id AS sale_id,
                s.created_at,
                s.total_cents AS sale_total_cents,
                s.customer_id,
                c.name AS customer_name,
                sl.quantity,
                sl.unit_price_cents,
                sl.subtotal_cents
            FROM sale_lines sl
            JOIN sales s ON s.id = sl.sale_id
            JOIN parties c ON c.id = s.customer_id
            WHERE sl.product_id = ?1
            ORDER BY s.created_at DESC, s.rowid DESC, sl.position
            "#,
        )
        .bind(product_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    /// Sales committed on any UTC date in `[start, end]`, oldest first.
    ///
    /// `start > end` is an empty window, not an error.
    pub async fn sales_history_by_period(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> DbResult<PeriodReport> {
        debug!(%start, %end, "Period sales history");

        if start > end {
            return Ok(PeriodReport::new(start, end, Vec::new())?);
        }

        let sales = sqlx::query_as::<_, SaleSummary>(
            r#"
            SELECT
                s.id AS sale_id,
                s.customer_id,
                c.name AS customer_name,
                s.total_cents,
                s.created_at
            FROM sales s
            JOIN parties c ON c.id = s.customer_id
            WHERE date(s.created_at) BETWEEN ?1 AND ?2
            ORDER BY s.created_at ASC, s.rowid ASC
            "#,
        )
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;

        Ok(PeriodReport::new(start, end, sales)?)
    }

    /// Every sale with its customer's name, newest first.
    pub async fn list_sales(&self) -> DbResult<Vec<SaleSummary>> {
        let sales = sqlx::query_as::<_, SaleSummary>(
            r#"
            SELECT
                s.id AS sale_id,
                s.customer_id,
                c.name AS customer_name,
                s.total_cents,
                s.created_at
            FROM sales s
            JOIN parties c ON c.id = s.customer_id
            ORDER BY s.created_at DESC, s.rowid DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(sales)
    }
}
