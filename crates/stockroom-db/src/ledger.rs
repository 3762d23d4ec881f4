//! # Ledger
//!
//! The only writer of sales and stock decrements. Placing an order either
//! commits a whole sale with every stock change, or changes nothing.
//!
//! ## Order Transaction
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    place_order(customer, lines)                         │
//! │                                                                         │
//! │  validate_order_lines        empty? quantity <= 0? too many lines?     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  BEGIN                                                                 │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  lock_for_update(p) for each distinct product, ascending id            │
//! │       │   first statement takes the write lock; a competing order     │
//! │       │   waits here until we COMMIT or ROLLBACK                       │
//! │       ▼                                                                 │
//! │  customer exists?            ── no → CustomerNotFound                  │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  plan_order(lines, locked)   ── ProductNotFound / InsufficientStock    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  INSERT sale, INSERT lines, decrement stock per product                │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  COMMIT ──► Committed(sale_id)                                         │
//! │                                                                         │
//! │  Any `?` above drops the transaction: ROLLBACK ──► Aborted(rejection)  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;

use chrono::Utc;
use serde::Serialize;
use sqlx::SqlitePool;
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

use stockroom_core::order::validate_order_lines;
use stockroom_core::{
    plan_order, CoreError, CustomerId, OrderLine, PartyRole, Sale, SaleLine, SaleWithLines,
};

use crate::error::DbError;
use crate::repository::product::ProductRepository;
use crate::repository::sale::{self as sale_rows, SaleRepository};

// =============================================================================
// Outcomes
// =============================================================================

/// Why an order was not committed.
///
/// Serializes with a machine-readable `code`:
/// ```json
/// { "code": "INSUFFICIENT_STOCK", "product_id": "...", "product_name": "Rice 5kg",
///   "available": 1, "requested": 2 }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "code", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderRejection {
    #[error("Order must contain at least one line")]
    EmptyOrder,

    #[error("Order cannot have more than {max} lines")]
    TooManyLines { max: usize },

    #[error("Line {line}: quantity must be positive, got {quantity}")]
    InvalidQuantity { line: usize, quantity: i64 },

    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    #[error("Customer not found: {customer_id}")]
    CustomerNotFound { customer_id: String },

    #[error("Product not found: {product_id}")]
    ProductNotFound { product_id: String },

    #[error(
        "Insufficient stock for {product_name}: available {available}, requested {requested}"
    )]
    InsufficientStock {
        product_id: String,
        product_name: String,
        available: i64,
        requested: i64,
    },

    /// The product locks were not acquired within the lock timeout.
    #[error("Timed out waiting for stock locks")]
    ConcurrencyTimeout,

    /// The store rejected a statement or the commit.
    #[error("Transaction failed: {reason}")]
    TransactionFailure { reason: String },
}

impl From<CoreError> for OrderRejection {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::EmptyOrder => OrderRejection::EmptyOrder,
            CoreError::TooManyLines { max } => OrderRejection::TooManyLines { max },
            CoreError::InvalidQuantity { line, quantity } => {
                OrderRejection::InvalidQuantity { line, quantity }
            }
            CoreError::ProductNotFound(product_id) => OrderRejection::ProductNotFound { product_id },
            CoreError::InsufficientStock {
                product_id,
                product_name,
                available,
                requested,
            } => OrderRejection::InsufficientStock {
                product_id,
                product_name,
                available,
                requested,
            },
            CoreError::Validation(err) => OrderRejection::InvalidInput {
                message: err.to_string(),
            },
        }
    }
}

impl From<DbError> for OrderRejection {
    fn from(err: DbError) -> Self {
        if err.is_busy() {
            OrderRejection::ConcurrencyTimeout
        } else {
            OrderRejection::TransactionFailure {
                reason: err.to_string(),
            }
        }
    }
}

impl From<sqlx::Error> for OrderRejection {
    fn from(err: sqlx::Error) -> Self {
        DbError::from(err).into()
    }
}

/// Result of one order attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum OrderOutcome {
    /// The sale was committed under this id.
    Committed(String),
    /// Nothing was written.
    Aborted(OrderRejection),
}

impl OrderOutcome {
    pub fn is_committed(&self) -> bool {
        matches!(self, OrderOutcome::Committed(_))
    }

    /// The committed sale id, if any.
    pub fn sale_id(&self) -> Option<&str> {
        match self {
            OrderOutcome::Committed(id) => Some(id),
            OrderOutcome::Aborted(_) => None,
        }
    }

    pub fn into_result(self) -> Result<String, OrderRejection> {
        match self {
            OrderOutcome::Committed(id) => Ok(id),
            OrderOutcome::Aborted(rejection) => Err(rejection),
        }
    }
}

/// Ledger errors.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// The order was rejected; nothing was written.
    #[error(transparent)]
    Rejected(#[from] OrderRejection),

    #[error("Sale not found: {0}")]
    SaleNotFound(String),

    #[error(transparent)]
    Db(#[from] DbError),
}

impl LedgerError {
    /// The rejection behind this error, if the error is an order rejection.
    pub fn rejection(&self) -> Option<&OrderRejection> {
        match self {
            LedgerError::Rejected(rejection) => Some(rejection),
            _ => None,
        }
    }
}

/// Result type for ledger operations.
pub type LedgerResult<T> = Result<T, LedgerError>;

// =============================================================================
// Ledger
// =============================================================================

/// Transactional sale placement and deletion.
///
/// ## Usage
/// ```rust,ignore
/// let ledger = db.ledger();
///
/// let sale_id = ledger
///     .place_order(&customer.id, &[OrderLine::new(&rice.id, 2)])
///     .await?;
/// ```
#[derive(Debug, Clone)]
pub struct Ledger {
    pool: SqlitePool,
}

impl Ledger {
    /// Creates a new Ledger.
    pub fn new(pool: SqlitePool) -> Self {
        Ledger { pool }
    }

    /// Places an order and reports the outcome as a value.
    pub async fn try_place_order(&self, customer_id: &CustomerId, lines: &[OrderLine]) -> OrderOutcome {
        match self.commit_order(customer_id, lines).await {
            Ok(sale_id) => OrderOutcome::Committed(sale_id),
            Err(rejection) => {
                warn!(
                    customer_id = %customer_id,
                    lines = lines.len(),
                    reason = %rejection,
                    "Order rejected"
                );
                OrderOutcome::Aborted(rejection)
            }
        }
    }

    /// Places an order, returning the new sale id.
    pub async fn place_order(
        &self,
        customer_id: &CustomerId,
        lines: &[OrderLine],
    ) -> LedgerResult<String> {
        self.try_place_order(customer_id, lines)
            .await
            .into_result()
            .map_err(LedgerError::from)
    }

    /// Places an order, giving up after `timeout`.
    ///
    /// On expiry the in-flight transaction is dropped and rolled back, and
    /// the caller gets [`OrderRejection::ConcurrencyTimeout`].
    pub async fn place_order_within(
        &self,
        timeout: Duration,
        customer_id: &CustomerId,
        lines: &[OrderLine],
    ) -> LedgerResult<String> {
        match tokio::time::timeout(timeout, self.place_order(customer_id, lines)).await {
            Ok(result) => result,
            Err(_) => {
                warn!(
                    customer_id = %customer_id,
                    timeout_ms = timeout.as_millis() as u64,
                    "Order timed out"
                );
                Err(OrderRejection::ConcurrencyTimeout.into())
            }
        }
    }

    /// Deletes a sale and its lines. Stock is NOT restored.
    pub async fn delete_sale(&self, sale_id: &str) -> LedgerResult<()> {
        let mut tx = self.pool.begin().await.map_err(DbError::from)?;

        if !sale_rows::delete_in(&mut tx, sale_id).await? {
            return Err(LedgerError::SaleNotFound(sale_id.to_string()));
        }
        tx.commit().await.map_err(DbError::from)?;

        info!(sale_id = %sale_id, "Sale deleted");
        Ok(())
    }

    /// Gets a committed sale with its lines in submission order.
    pub async fn get_sale(&self, sale_id: &str) -> LedgerResult<Option<SaleWithLines>> {
        let sale = SaleRepository::new(self.pool.clone())
            .get_with_lines(sale_id)
            .await?;
        Ok(sale)
    }

    /// The order transaction. Every early return drops `tx`, which rolls
    /// back everything done so far.
    async fn commit_order(
        &self,
        customer_id: &CustomerId,
        lines: &[OrderLine],
    ) -> Result<String, OrderRejection> {
        validate_order_lines(lines)?;

        let product_ids: BTreeSet<&str> = lines.iter().map(|l| l.product_id.as_str()).collect();

        let mut tx = self.pool.begin().await?;

        // Locks come first and in a fixed order.
        let mut locked = BTreeMap::new();
        for product_id in product_ids {
            match ProductRepository::lock_for_update(&mut tx, product_id).await? {
                Some(product) => {
                    locked.insert(product.id.clone(), product);
                }
                None => {
                    return Err(OrderRejection::ProductNotFound {
                        product_id: product_id.to_string(),
                    })
                }
            }
        }
        debug!(products = locked.len(), "Stock locked");

        let customer: Option<String> =
            sqlx::query_scalar("SELECT id FROM parties WHERE id = ?1 AND role = ?2")
                .bind(customer_id.as_str())
                .bind(PartyRole::Customer)
                .fetch_optional(&mut *tx)
                .await?;
        if customer.is_none() {
            return Err(OrderRejection::CustomerNotFound {
                customer_id: customer_id.to_string(),
            });
        }

        let plan = plan_order(lines, &locked)?;

        let now = Utc::now();
        let sale = Sale {
            id: Uuid::new_v4().to_string(),
            customer_id: customer_id.clone(),
            total_cents: plan.total.cents(),
            created_at: now,
        };
        sale_rows::insert_sale_in(&mut tx, &sale).await?;

        for priced in &plan.lines {
            let line = SaleLine {
                id: Uuid::new_v4().to_string(),
                sale_id: sale.id.clone(),
                product_id: priced.product_id.clone(),
                position: priced.position as i64,
                quantity: priced.quantity,
                unit_price_cents: priced.unit_price.cents(),
                subtotal_cents: priced.subtotal.cents(),
            };
            sale_rows::insert_line_in(&mut tx, &line).await?;
        }

        for (product_id, quantity) in &plan.decrements {
            ProductRepository::adjust_quantity_in(&mut tx, product_id, -quantity, now).await?;
        }

        tx.commit().await?;

        info!(
            sale_id = %sale.id,
            customer_id = %customer_id,
            lines = plan.lines.len(),
            total = %plan.total,
            "Sale committed"
        );
        Ok(sale.id)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use stockroom_core::ValidationError;

    #[test]
    fn test_rejection_serializes_with_code() {
        let rejection = OrderRejection::InsufficientStock {
            product_id: "p-1".to_string(),
            product_name: "Rice 5kg".to_string(),
            available: 1,
            requested: 2,
        };
        let json = serde_json::to_value(&rejection).unwrap();
        assert_eq!(json["code"], "INSUFFICIENT_STOCK");
        assert_eq!(json["available"], 1);
        assert_eq!(json["requested"], 2);

        let json = serde_json::to_value(OrderRejection::ConcurrencyTimeout).unwrap();
        assert_eq!(json["code"], "CONCURRENCY_TIMEOUT");
    }

    #[test]
    fn test_busy_maps_to_timeout() {
        let rejection: OrderRejection = DbError::Busy("database is locked".into()).into();
        assert_eq!(rejection, OrderRejection::ConcurrencyTimeout);

        let rejection: OrderRejection = DbError::QueryFailed("boom".into()).into();
        assert!(matches!(rejection, OrderRejection::TransactionFailure { .. }));
    }

    #[test]
    fn test_core_errors_map_one_to_one() {
        let rejection: OrderRejection = CoreError::ProductNotFound("p-9".into()).into();
        assert_eq!(
            rejection,
            OrderRejection::ProductNotFound {
                product_id: "p-9".into()
            }
        );
        assert_eq!(
            OrderRejection::from(CoreError::EmptyOrder),
            OrderRejection::EmptyOrder
        );
    }

    #[test]
    fn test_validation_becomes_invalid_input() {
        let rejection: OrderRejection = CoreError::Validation(ValidationError::OutOfRange {
            field: "order total".into(),
            min: 0,
            max: i64::MAX,
        })
        .into();
        assert!(matches!(
            rejection,
            OrderRejection::InvalidInput { ref message } if message.contains("order total")
        ));
    }

    #[test]
    fn test_outcome_accessors() {
        let committed = OrderOutcome::Committed("s-1".to_string());
        assert!(committed.is_committed());
        assert_eq!(committed.sale_id(), Some("s-1"));

        let aborted = OrderOutcome::Aborted(OrderRejection::EmptyOrder);
        assert!(!aborted.is_committed());
        assert_eq!(aborted.into_result(), Err(OrderRejection::EmptyOrder));
    }
}
