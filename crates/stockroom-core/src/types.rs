//! # Domain Types
//!
//! Core domain records used throughout Stockroom.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │      Sale       │   │    SaleLine     │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │   │  id (UUID)      │   │  sale_id (FK)   │       │
//! │  │  price_cents    │   │  customer_id    │   │  product_id(FK) │       │
//! │  │  qty on hand    │   │  total_cents    │   │  unit price     │       │
//! │  │  min_stock      │   │  created_at     │   │  (snapshot)     │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │ Customer        │   │    Address      │──►│ City ──► State  │       │
//! │  │ Supplier        │──►│  street, number │   └─────────────────┘       │
//! │  │ (PartyDetails)  │   │  postal code    │                              │
//! │  └─────────────────┘   └─────────────────┘                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Party Roles
//! Customers and suppliers share one shape ([`PartyDetails`]) and one table,
//! but they are different types with different id types. A `SupplierId` can
//! never be passed where a `CustomerId` is expected.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::Money;
use crate::validation;

// =============================================================================
// Typed Party Ids
// =============================================================================

/// Identifier of a customer.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(transparent))]
#[serde(transparent)]
#[ts(export)]
pub struct CustomerId(String);

/// Identifier of a supplier.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(transparent))]
#[serde(transparent)]
#[ts(export)]
pub struct SupplierId(String);

impl CustomerId {
    pub fn new(id: impl Into<String>) -> Self {
        CustomerId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl SupplierId {
    pub fn new(id: impl Into<String>) -> Self {
        SupplierId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for CustomerId {
    fn from(id: String) -> Self {
        CustomerId(id)
    }
}

impl From<String> for SupplierId {
    fn from(id: String) -> Self {
        SupplierId(id)
    }
}

impl AsRef<str> for CustomerId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for SupplierId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CustomerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for SupplierId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// =============================================================================
// Product
// =============================================================================

/// A product in the distributor's catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Display name.
    pub name: String,

    /// Free-text category ("Beverages", "Cleaning", ...).
    pub category: String,

    /// Current unit price in cents.
    pub price_cents: i64,

    /// Units available to sell. Never negative.
    pub quantity_on_hand: i64,

    /// At or below this level the product shows up in the low-stock report.
    pub min_stock: i64,

    /// Supplier the product is bought from, if known.
    pub supplier_id: Option<SupplierId>,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Returns the price as a Money type.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }

    /// Whether the product belongs in the low-stock report.
    #[inline]
    pub fn is_low_stock(&self) -> bool {
        self.quantity_on_hand <= self.min_stock
    }

    /// Whether `quantity` units can be taken from stock.
    #[inline]
    pub fn has_stock_for(&self, quantity: i64) -> bool {
        self.quantity_on_hand >= quantity
    }
}

/// A product row for catalog listings, with its supplier's name joined.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ProductListing {
    #[cfg_attr(feature = "sqlx", sqlx(flatten))]
    #[serde(flatten)]
    pub product: Product,
    pub supplier_name: Option<String>,
}

/// Input for creating or replacing a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct NewProduct {
    pub name: String,
    pub category: String,
    pub price_cents: i64,
    pub quantity_on_hand: i64,
    pub min_stock: i64,
    pub supplier_id: Option<SupplierId>,
}

impl NewProduct {
    /// Checks every field against the catalog rules.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validation::validate_name("name", &self.name)?;
        validation::validate_name("category", &self.category)?;
        validation::validate_price_cents(self.price_cents)?;
        validation::validate_stock_level("quantity", self.quantity_on_hand)?;
        validation::validate_stock_level("minimum stock", self.min_stock)?;
        Ok(())
    }
}

// =============================================================================
// Parties
// =============================================================================

/// The role a party plays. Stored in the `role` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum PartyRole {
    Customer,
    Supplier,
}

impl PartyRole {
    /// Entity label used in error messages.
    pub fn label(&self) -> &'static str {
        match self {
            PartyRole::Customer => "Customer",
            PartyRole::Supplier => "Supplier",
        }
    }
}

/// Fields shared by customers and suppliers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct PartyDetails {
    pub name: String,
    /// Digits only, area code included.
    pub phone: String,
    pub email: String,
    pub address_id: Option<String>,
}

impl PartyDetails {
    /// Checks every field against the party rules.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validation::validate_name("name", &self.name)?;
        validation::validate_phone(&self.phone)?;
        validation::validate_email(&self.email)?;
        Ok(())
    }
}

/// A customer: the buying side of a sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Customer {
    pub id: CustomerId,
    #[serde(flatten)]
    pub details: PartyDetails,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

/// A supplier: where catalog products come from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Supplier {
    pub id: SupplierId,
    #[serde(flatten)]
    pub details: PartyDetails,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

/// A party record of one fixed role.
///
/// Lets one repository serve both roles while keeping the record and id
/// types apart.
pub trait PartyRecord: Sized + Send + 'static {
    /// The role every record of this type carries.
    const ROLE: PartyRole;

    /// Role-specific id type.
    type Id: AsRef<str> + From<String> + Clone + fmt::Display + Send + Sync;

    fn from_parts(
        id: Self::Id,
        details: PartyDetails,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self;

    fn id(&self) -> &Self::Id;

    fn details(&self) -> &PartyDetails;
}

impl PartyRecord for Customer {
    const ROLE: PartyRole = PartyRole::Customer;
    type Id = CustomerId;

    fn from_parts(
        id: CustomerId,
        details: PartyDetails,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Customer {
            id,
            details,
            created_at,
            updated_at,
        }
    }

    fn id(&self) -> &CustomerId {
        &self.id
    }

    fn details(&self) -> &PartyDetails {
        &self.details
    }
}

impl PartyRecord for Supplier {
    const ROLE: PartyRole = PartyRole::Supplier;
    type Id = SupplierId;

    fn from_parts(
        id: SupplierId,
        details: PartyDetails,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Supplier {
            id,
            details,
            created_at,
            updated_at,
        }
    }

    fn id(&self) -> &SupplierId {
        &self.id
    }

    fn details(&self) -> &PartyDetails {
        &self.details
    }
}

/// A party with its address resolved down to city and state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PartyWithAddress<P> {
    pub party: P,
    pub address: Option<ResolvedAddress>,
}

// =============================================================================
// Addresses
// =============================================================================

/// A federative unit. The id is its two-letter abbreviation ("SP").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct State {
    pub id: String,
    pub name: String,
}

/// A city within a state. `(state_id, name)` is unique.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct City {
    pub id: String,
    pub name: String,
    pub state_id: String,
}

/// A stored street address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Address {
    pub id: String,
    pub street: String,
    pub number: i64,
    pub neighborhood: String,
    pub postal_code: String,
    pub city_id: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

/// An address joined with its city and state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ResolvedAddress {
    pub id: String,
    pub street: String,
    pub number: i64,
    pub neighborhood: String,
    pub postal_code: String,
    pub city_id: String,
    pub city_name: String,
    pub state_id: String,
    pub state_name: String,
}

/// Input for creating or replacing an address.
///
/// The city is given by name; an unknown name within the state creates the
/// city.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct NewAddress {
    pub street: String,
    pub number: i64,
    pub neighborhood: String,
    pub postal_code: String,
    pub city_name: String,
    pub state_id: String,
}

impl NewAddress {
    /// Checks every field against the address rules.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validation::validate_required("street", &self.street)?;
        validation::validate_required("neighborhood", &self.neighborhood)?;
        validation::validate_street_number(self.number)?;
        validation::validate_postal_code(&self.postal_code)?;
        validation::validate_name("city", &self.city_name)?;
        validation::validate_required("state", &self.state_id)?;
        Ok(())
    }
}

// =============================================================================
// Sales
// =============================================================================

/// One requested line of an order: which product, how many.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct OrderLine {
    pub product_id: String,
    pub quantity: i64,
}

impl OrderLine {
    pub fn new(product_id: impl Into<String>, quantity: i64) -> Self {
        OrderLine {
            product_id: product_id.into(),
            quantity,
        }
    }
}

/// A committed sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Sale {
    pub id: String,
    pub customer_id: CustomerId,
    /// Sum of the line subtotals. Never set independently.
    pub total_cents: i64,
    /// Commit time.
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl Sale {
    /// Returns the total as Money.
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }
}

/// A line item in a sale.
/// Uses snapshot pattern to freeze the product price at time of sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct SaleLine {
    pub id: String,
    pub sale_id: String,
    pub product_id: String,
    /// Zero-based position in the order as submitted.
    pub position: i64,
    pub quantity: i64,
    /// Unit price in cents at time of sale (frozen).
    pub unit_price_cents: i64,
    /// quantity × unit_price_cents.
    pub subtotal_cents: i64,
}

impl SaleLine {
    /// Returns the unit price as Money.
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }

    /// Returns the subtotal as Money.
    #[inline]
    pub fn subtotal(&self) -> Money {
        Money::from_cents(self.subtotal_cents)
    }
}

/// A sale together with its lines, in submission order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SaleWithLines {
    pub sale: Sale,
    pub lines: Vec<SaleLine>,
}

impl SaleWithLines {
    /// Checks the money invariants of a committed sale:
    /// every subtotal is quantity × unit price and the total is their sum.
    pub fn is_consistent(&self) -> bool {
        let lines_ok = self
            .lines
            .iter()
            .all(|l| l.unit_price().multiply_quantity(l.quantity) == l.subtotal());
        let sum: Money = self.lines.iter().map(SaleLine::subtotal).sum();
        lines_ok && sum == self.sale.total()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn product(qty: i64, min: i64) -> Product {
        let now = Utc::now();
        Product {
            id: "p-1".to_string(),
            name: "Rice 5kg".to_string(),
            category: "Grocery".to_string(),
            price_cents: 1000,
            quantity_on_hand: qty,
            min_stock: min,
            supplier_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_low_stock_is_inclusive() {
        assert!(product(3, 5).is_low_stock());
        assert!(product(5, 5).is_low_stock());
        assert!(!product(6, 5).is_low_stock());
    }

    #[test]
    fn test_has_stock_for() {
        let p = product(3, 0);
        assert!(p.has_stock_for(3));
        assert!(!p.has_stock_for(4));
    }

    #[test]
    fn test_party_ids_serialize_as_plain_strings() {
        let id = CustomerId::new("c-1");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"c-1\"");
        assert_eq!(<Customer as PartyRecord>::ROLE, PartyRole::Customer);
        assert_eq!(<Supplier as PartyRecord>::ROLE, PartyRole::Supplier);
    }

    #[test]
    fn test_sale_consistency() {
        let now = Utc::now();
        let line = |position, quantity, unit, subtotal| SaleLine {
            id: format!("l-{position}"),
            sale_id: "s-1".to_string(),
            product_id: "p-1".to_string(),
            position,
            quantity,
            unit_price_cents: unit,
            subtotal_cents: subtotal,
        };
        let mut sale = SaleWithLines {
            sale: Sale {
                id: "s-1".to_string(),
                customer_id: CustomerId::new("c-1"),
                total_cents: 2500,
                created_at: now,
            },
            lines: vec![line(0, 2, 1000, 2000), line(1, 1, 500, 500)],
        };
        assert!(sale.is_consistent());

        sale.sale.total_cents = 2400;
        assert!(!sale.is_consistent());
    }
}
