//! # Repository Module
//!
//! Database repository implementations for Stockroom.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern                                   │
//! │                                                                         │
//! │  Caller                                                                │
//! │       │                                                                 │
//! │       │  db.products().get_by_id("...")                                │
//! │       ▼                                                                 │
//! │  ProductRepository                                                     │
//! │  ├── insert / update / delete     (validated CRUD)                     │
//! │  ├── get_by_id / list                                                  │
//! │  └── lock_for_update              (inside a ledger transaction)        │
//! │       │                                                                 │
//! │       │  SQL Query                                                      │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`ProductRepository`](product::ProductRepository) - Catalog CRUD and row locks
//! - [`PartyRepository`](party::PartyRepository) - Customers and suppliers
//! - [`AddressRepository`](address::AddressRepository) - Addresses, cities, states
//! - [`SaleRepository`](sale::SaleRepository) - Committed sale reads

pub mod address;
pub mod party;
pub mod product;
pub mod sale;
