//! # Report Records
//!
//! Read-side shapes produced by the reporting engine. None of these are
//! stored; they are assembled from joins over sales, sale lines, products,
//! and parties.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::Money;
use crate::types::{CustomerId, Sale};

/// A sale line joined with the product's current name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct SaleLineDetail {
    pub sale_id: String,
    pub product_id: String,
    pub product_name: String,
    pub quantity: i64,
    pub unit_price_cents: i64,
    pub subtotal_cents: i64,
}

/// One sale in a customer's history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CustomerSaleRecord {
    pub sale: Sale,
    pub lines: Vec<SaleLineDetail>,
}

/// Every sale of one customer, most recent first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CustomerHistory {
    pub customer_id: CustomerId,
    pub sales: Vec<CustomerSaleRecord>,
    /// Sum of every sale total for this customer.
    pub lifetime_total_cents: i64,
}

impl CustomerHistory {
    pub fn lifetime_total(&self) -> Money {
        Money::from_cents(self.lifetime_total_cents)
    }
}

/// One line of one product's sales history, with its sale's context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ProductSaleRecord {
    pub sale_id: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    pub sale_total_cents: i64,
    pub customer_id: CustomerId,
    pub customer_name: String,
    pub quantity: i64,
    pub unit_price_cents: i64,
    pub subtotal_cents: i64,
}

/// A sale header with the customer's name, for listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct SaleSummary {
    pub sale_id: String,
    pub customer_id: CustomerId,
    pub customer_name: String,
    pub total_cents: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl SaleSummary {
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }
}

/// Sales whose commit date falls in `[start, end]` (UTC dates, inclusive).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct PeriodReport {
    #[ts(as = "String")]
    pub start: NaiveDate,
    #[ts(as = "String")]
    pub end: NaiveDate,
    /// Chronological, oldest first.
    pub sales: Vec<SaleSummary>,
    /// Sum of `sales[..].total_cents`.
    pub total_cents: i64,
}

impl PeriodReport {
    /// Builds a report, summing the window total from the rows.
    ///
    /// Fails with [`ValidationError::OutOfRange`] if the total does not fit
    /// in an `i64`.
    pub fn new(
        start: NaiveDate,
        end: NaiveDate,
        sales: Vec<SaleSummary>,
    ) -> Result<Self, ValidationError> {
        let total_cents = sales
            .iter()
            .try_fold(0i64, |acc, s| acc.checked_add(s.total_cents))
            .ok_or_else(|| ValidationError::OutOfRange {
                field: "period total".to_string(),
                min: i64::MIN,
                max: i64::MAX,
            })?;

        Ok(PeriodReport {
            start,
            end,
            sales,
            total_cents,
        })
    }

    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }
}
