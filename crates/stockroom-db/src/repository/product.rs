//! # Product Repository
//!
//! Database operations for the catalog.
//!
//! ## Key Operations
//! - CRUD with validation
//! - Locked reads inside an order transaction
//! - Guarded stock decrements
//!
//! ## Locking a Row on SQLite
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    lock_for_update on SQLite                            │
//! │                                                                         │
//! │  SQLite has no SELECT ... FOR UPDATE. A no-op write does the job:      │
//! │                                                                         │
//! │    UPDATE products                                                     │
//! │       SET quantity_on_hand = quantity_on_hand                          │
//! │     WHERE id = ?1                                                      │
//! │    RETURNING id, name, ..., quantity_on_hand, ...                      │
//! │                                                                         │
//! │  • Takes the database write lock (waits up to busy_timeout)            │
//! │  • Returns the row as of that moment                                   │
//! │  • The lock lives until COMMIT / ROLLBACK                              │
//! │                                                                         │
//! │  Must be the first statement of the transaction: a plain read first    │
//! │  would pin an older snapshot and the later write would fail with       │
//! │  SQLITE_BUSY_SNAPSHOT instead of waiting.                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use stockroom_core::validation::validate_stock_level;
use stockroom_core::{NewProduct, PartyRole, Product, ProductListing, SupplierId};

/// Repository for product database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = db.products();
///
/// let rice = repo.insert(&new_product).await?;
/// let same = repo.get_by_id(&rice.id).await?;
/// ```
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Inserts a new product.
    ///
    /// ## Returns
    /// * `Ok(Product)` - Inserted product with generated id and timestamps
    /// * `Err(DbError::Validation)` - A field broke a catalog rule
    /// * `Err(DbError::NotFound)` - `supplier_id` is not a supplier
    pub async fn insert(&self, new: &NewProduct) -> DbResult<Product> {
        new.validate()?;
        self.ensure_supplier(new.supplier_id.as_ref()).await?;

        let now = Utc::now();
        let product = Product {
            id: generate_product_id(),
            name: new.name.trim().to_string(),
            category: new.category.trim().to_string(),
            price_cents: new.price_cents,
            quantity_on_hand: new.quantity_on_hand,
            min_stock: new.min_stock,
            supplier_id: new.supplier_id.clone(),
            created_at: now,
            updated_at: now,
        };

        debug!(id = %product.id, name = %product.name, "Inserting product");

        sqlx::query(
            r#"
            INSERT INTO products (
                id, name, category, price_cents,
                quantity_on_hand, min_stock, supplier_id,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(&product.id)
        .bind(&product.name)
        .bind(&product.category)
        .bind(product.price_cents)
        .bind(product.quantity_on_hand)
        .bind(product.min_stock)
        .bind(&product.supplier_id)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(product)
    }

    /// Gets a product by its ID.
    ///
    /// ## Returns
    /// * `Ok(Some(Product))` - Product found
    /// * `Ok(None)` - Product not found
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(
            r#"
            SELECT
                id, name, category, price_cents,
                quantity_on_hand, min_stock, supplier_id,
                created_at, updated_at
            FROM products
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    /// Lists the whole catalog by name, with supplier names joined.
    pub async fn list(&self) -> DbResult<Vec<ProductListing>> {
        debug!("Listing products");

        let products = sqlx::query_as::<_, ProductListing>(
            r#"
            SELECT
                p.id, p.name, p.category, p.price_cents,
                p.quantity_on_hand, p.min_stock, p.supplier_id,
                p.created_at, p.updated_at,
                s.name AS supplier_name
            FROM products p
            LEFT JOIN parties s ON s.id = p.supplier_id
            ORDER BY p.name, p.id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    /// Finds a product by exact name and supplier.
    ///
    /// `None` as the supplier matches products without one.
    pub async fn find_by_name_and_supplier(
        &self,
        name: &str,
        supplier_id: Option<&SupplierId>,
    ) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(
            r#"
            SELECT
                id, name, category, price_cents,
                quantity_on_hand, min_stock, supplier_id,
                created_at, updated_at
            FROM products
            WHERE name = ?1 AND supplier_id IS ?2
            ORDER BY created_at
            LIMIT 1
            "#,
        )
        .bind(name.trim())
        .bind(supplier_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    /// Replaces every editable field of a product.
    ///
    /// Past sale lines keep the price they were sold at.
    pub async fn update(&self, id: &str, new: &NewProduct) -> DbResult<Product> {
        new.validate()?;
        self.ensure_supplier(new.supplier_id.as_ref()).await?;

        debug!(id = %id, "Updating product");

        let product = sqlx::query_as::<_, Product>(
            r#"
            UPDATE products SET
                name = ?2,
                category = ?3,
                price_cents = ?4,
                quantity_on_hand = ?5,
                min_stock = ?6,
                supplier_id = ?7,
                updated_at = ?8
            WHERE id = ?1
            RETURNING
                id, name, category, price_cents,
                quantity_on_hand, min_stock, supplier_id,
                created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(new.name.trim())
        .bind(new.category.trim())
        .bind(new.price_cents)
        .bind(new.quantity_on_hand)
        .bind(new.min_stock)
        .bind(&new.supplier_id)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?;

        product.ok_or_else(|| DbError::not_found("Product", id))
    }

    /// Sets the quantity on hand outright (stock count correction).
    pub async fn set_quantity(&self, id: &str, quantity: i64) -> DbResult<()> {
        validate_stock_level("quantity", quantity)?;

        debug!(id = %id, quantity, "Setting stock");

        let result = sqlx::query(
            "UPDATE products SET quantity_on_hand = ?2, updated_at = ?3 WHERE id = ?1",
        )
        .bind(id)
        .bind(quantity)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }

    /// Deletes a product.
    ///
    /// Fails with [`DbError::ForeignKeyViolation`] while any sale line
    /// references it.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting product");

        let result = sqlx::query("DELETE FROM products WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }

    /// Counts products (for diagnostics).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    // =========================================================================
    // Transaction-scoped operations
    // =========================================================================

    /// Reads a product while taking the write lock on it.
    ///
    /// Call on the connection of an open transaction, before any other
    /// statement of that transaction. Blocks up to the configured lock
    /// timeout, then fails with [`DbError::Busy`].
    pub async fn lock_for_update(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Product>> {
        debug!(id = %id, "Locking product");

        let product = sqlx::query_as::<_, Product>(
            r#"
            UPDATE products
            SET quantity_on_hand = quantity_on_hand
            WHERE id = ?1
            RETURNING
                id, name, category, price_cents,
                quantity_on_hand, min_stock, supplier_id,
                created_at, updated_at
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

        Ok(product)
    }

    /// Adds `delta` to a product's stock inside a transaction.
    ///
    /// The row is only touched when the result stays non-negative; otherwise
    /// nothing changes and [`DbError::CheckViolation`] is returned.
    pub(crate) async fn adjust_quantity_in(
        conn: &mut SqliteConnection,
        id: &str,
        delta: i64,
        now: DateTime<Utc>,
    ) -> DbResult<()> {
        debug!(id = %id, delta, "Adjusting stock");

        let result = sqlx::query(
            r#"
            UPDATE products
            SET quantity_on_hand = quantity_on_hand + ?2,
                updated_at = ?3
            WHERE id = ?1 AND quantity_on_hand + ?2 >= 0
            "#,
        )
        .bind(id)
        .bind(delta)
        .bind(now)
        .execute(&mut *conn)
        .await?;

        if result.rows_affected() != 1 {
            return Err(DbError::CheckViolation {
                message: format!("stock of product {id} cannot change by {delta}"),
            });
        }

        Ok(())
    }

    async fn ensure_supplier(&self, supplier_id: Option<&SupplierId>) -> DbResult<()> {
        let Some(supplier_id) = supplier_id else {
            return Ok(());
        };

        let found: Option<String> =
            sqlx::query_scalar("SELECT id FROM parties WHERE id = ?1 AND role = ?2")
                .bind(supplier_id)
                .bind(PartyRole::Supplier)
                .fetch_optional(&self.pool)
                .await?;

        match found {
            Some(_) => Ok(()),
            None => Err(DbError::not_found("Supplier", supplier_id.as_str())),
        }
    }
}

/// Generates a new product ID.
pub fn generate_product_id() -> String {
    Uuid::new_v4().to_string()
}
