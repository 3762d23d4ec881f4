//! # stockroom-db: Database Layer for Stockroom
//!
//! SQLite persistence for the distributor's catalog, parties, and sales,
//! the transactional Ledger that places orders, and the read-side reports.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Stockroom Data Flow                              │
//! │                                                                         │
//! │  Caller (forms, sale dialog, report screens)                           │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                   stockroom-db (THIS CRATE)                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │    Ledger    │  │   │
//! │  │   │   (pool.rs)   │    │  products     │    │  place_order │  │   │
//! │  │   │               │◄───│  parties      │    │  delete_sale │  │   │
//! │  │   │  SqlitePool   │    │  addresses    │    └──────────────┘  │   │
//! │  │   │  Migrations   │    │  sales        │    ┌──────────────┐  │   │
//! │  │   └───────────────┘    └───────────────┘    │   Reports    │  │   │
//! │  │                                             │  low stock   │  │   │
//! │  │                                             │  histories   │  │   │
//! │  │                                             └──────────────┘  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite (WAL mode)                                                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust,ignore
//! use stockroom_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::from_env()?).await?;
//! let sale_id = db.ledger().place_order(&customer_id, &lines).await?;
//! ```

pub mod error;
pub mod ledger;
pub mod migrations;
pub mod pool;
pub mod reporting;
pub mod repository;

pub use error::{DbError, DbResult};
pub use ledger::{Ledger, LedgerError, LedgerResult, OrderOutcome, OrderRejection};
pub use pool::{Database, DbConfig};
pub use reporting::Reports;
pub use repository::address::AddressRepository;
pub use repository::party::PartyRepository;
pub use repository::product::ProductRepository;
pub use repository::sale::SaleRepository;

use tracing_subscriber::EnvFilter;

/// Default log filter when `RUST_LOG` is unset.
pub const DEFAULT_LOG_FILTER: &str = "info,stockroom=debug,sqlx=warn";

/// Installs a `tracing` subscriber for binaries.
///
/// Honours `RUST_LOG`; falls back to [`DEFAULT_LOG_FILTER`]. Calling it
/// twice is harmless.
pub fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init();
}
