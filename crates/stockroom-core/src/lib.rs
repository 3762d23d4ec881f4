//! # stockroom-core: Pure Business Logic for Stockroom
//!
//! This crate holds the domain model of a small distributor: catalog,
//! customers and suppliers, addresses, and sales. Everything here is a pure
//! function or a plain type with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Stockroom Architecture                           │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │               Presentation layer (external)                     │   │
//! │  │    Product forms ── Party forms ── Sale dialog ── Reports       │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                stockroom-db (Ledger, Reports, stores)           │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │             ★ stockroom-core (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   money   │  │   order   │  │ validation│  │   │
//! │  │   │  Product  │  │   Money   │  │ plan_order│  │   rules   │  │   │
//! │  │   │  Party    │  │  (cents)  │  │ OrderPlan │  │  checks   │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain records (Product, Customer, Supplier, Address, Sale)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`order`] - Pricing and stock checks for a requested order
//! - [`report`] - Read-side records produced by the reporting engine
//! - [`error`] - Domain error types
//! - [`validation`] - Field rules for catalog, party, and address input
//!
//! ## Example Usage
//!
//! ```rust
//! use stockroom_core::money::Money;
//!
//! let unit_price = Money::from_cents(1000); // $10.00
//! let subtotal = unit_price.multiply_quantity(2);
//! assert_eq!(subtotal.cents(), 2000);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod money;
pub mod order;
pub mod report;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use order::{plan_order, OrderPlan, PricedLine};
pub use report::*;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum length of free-text names (product, category, party).
pub const MAX_NAME_LEN: usize = 200;

/// Maximum number of lines accepted in a single order.
///
/// ## Business Reason
/// Bounds the number of rows one order transaction locks.
pub const MAX_ORDER_LINES: usize = 500;
