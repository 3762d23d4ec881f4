//! # Order Planning
//!
//! Turns a requested list of [`OrderLine`]s into an [`OrderPlan`]: priced
//! lines, the sale total, and how much to take from each product's stock.
//!
//! ## Where This Runs
//! ```text
//! Ledger::place_order
//!   │
//!   ├── validate_order_lines(lines)        ◄── before any lock is taken
//!   ├── BEGIN; lock each product (ascending id)
//!   ├── plan_order(lines, locked)          ◄── THIS MODULE, on locked rows
//!   ├── INSERT sale + lines, decrement stock
//!   └── COMMIT
//! ```
//!
//! ## Duplicate Lines
//! The same product may appear on several lines. Each line is priced and
//! stored on its own, but stock is checked against the running total per
//! product:
//! ```text
//! stock(P1) = 5
//! line 0: P1 × 3   → remaining 2
//! line 1: P1 × 3   → InsufficientStock { available: 2, requested: 3 }
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::types::{OrderLine, Product};
use crate::validation::validate_order_quantity;
use crate::MAX_ORDER_LINES;

// =============================================================================
// Plan Types
// =============================================================================

/// One order line with its price frozen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct PricedLine {
    /// Zero-based position in the order as submitted.
    pub position: usize,
    pub product_id: String,
    pub quantity: i64,
    pub unit_price: Money,
    pub subtotal: Money,
}

/// Everything the ledger needs to write a sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct OrderPlan {
    /// Priced lines in submission order.
    pub lines: Vec<PricedLine>,
    /// Sum of the line subtotals.
    pub total: Money,
    /// Units to remove per product id, duplicates merged.
    pub decrements: BTreeMap<String, i64>,
}

// =============================================================================
// Planning
// =============================================================================

/// Checks the shape of an order without looking at stock.
///
/// ## Rules
/// - At least one line
/// - At most [`MAX_ORDER_LINES`] lines
/// - Every quantity positive
pub fn validate_order_lines(lines: &[OrderLine]) -> CoreResult<()> {
    if lines.is_empty() {
        return Err(CoreError::EmptyOrder);
    }

    if lines.len() > MAX_ORDER_LINES {
        return Err(CoreError::TooManyLines {
            max: MAX_ORDER_LINES,
        });
    }

    for (line, requested) in lines.iter().enumerate() {
        if validate_order_quantity(requested.quantity).is_err() {
            return Err(CoreError::InvalidQuantity {
                line,
                quantity: requested.quantity,
            });
        }
    }

    Ok(())
}

/// Prices an order against a stock snapshot.
///
/// `stock` maps product id to the product as read under lock. The first
/// failing line decides the error; nothing is partially planned.
///
/// ## Example
/// ```rust
/// use std::collections::BTreeMap;
/// use chrono::Utc;
/// use stockroom_core::{plan_order, OrderLine, Product};
///
/// let now = Utc::now();
/// let rice = Product {
///     id: "p-1".into(),
///     name: "Rice 5kg".into(),
///     category: "Grocery".into(),
///     price_cents: 1000,
///     quantity_on_hand: 3,
///     min_stock: 5,
///     supplier_id: None,
///     created_at: now,
///     updated_at: now,
/// };
/// let stock = BTreeMap::from([(rice.id.clone(), rice)]);
///
/// let plan = plan_order(&[OrderLine::new("p-1", 2)], &stock).unwrap();
/// assert_eq!(plan.total.cents(), 2000);
/// assert_eq!(plan.decrements["p-1"], 2);
/// ```
pub fn plan_order(lines: &[OrderLine], stock: &BTreeMap<String, Product>) -> CoreResult<OrderPlan> {
    validate_order_lines(lines)?;

    let mut priced = Vec::with_capacity(lines.len());
    let mut decrements: BTreeMap<String, i64> = BTreeMap::new();
    let mut total = Money::zero();

    for (position, line) in lines.iter().enumerate() {
        let product = stock
            .get(&line.product_id)
            .ok_or_else(|| CoreError::ProductNotFound(line.product_id.clone()))?;

        let already_taken = decrements.get(&product.id).copied().unwrap_or(0);
        let enough = already_taken
            .checked_add(line.quantity)
            .is_some_and(|wanted| product.has_stock_for(wanted));
        if !enough {
            return Err(CoreError::InsufficientStock {
                product_id: product.id.clone(),
                product_name: product.name.clone(),
                available: product.quantity_on_hand - already_taken,
                requested: line.quantity,
            });
        }

        let unit_price = product.price();
        let subtotal = unit_price
            .checked_multiply_quantity(line.quantity)
            .ok_or_else(|| amount_overflow(format!("line {position} subtotal")))?;
        total = total
            .checked_add(subtotal)
            .ok_or_else(|| amount_overflow("order total".to_string()))?;

        *decrements.entry(product.id.clone()).or_insert(0) += line.quantity;
        priced.push(PricedLine {
            position,
            product_id: product.id.clone(),
            quantity: line.quantity,
            unit_price,
            subtotal,
        });
    }

    Ok(OrderPlan {
        lines: priced,
        total,
        decrements,
    })
}

fn amount_overflow(field: String) -> CoreError {
    CoreError::Validation(ValidationError::OutOfRange {
        field,
        min: 0,
        max: i64::MAX,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================
