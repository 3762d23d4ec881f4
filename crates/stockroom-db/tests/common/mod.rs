//! Shared fixtures for the integration tests.
//!
//! Each test gets its own SQLite file inside a temporary directory, so
//! several pool connections (and so real lock contention) are available.

#![allow(dead_code)]

use std::time::Duration;

use stockroom_core::{Customer, NewProduct, PartyDetails, Product, Supplier, SupplierId};
use stockroom_db::{Database, DbConfig};
use tempfile::TempDir;

/// A migrated database that lives as long as this value.
pub struct TestDb {
    pub db: Database,
    _dir: TempDir,
}

impl std::ops::Deref for TestDb {
    type Target = Database;

    fn deref(&self) -> &Database {
        &self.db
    }
}

pub async fn test_db() -> TestDb {
    test_db_with_lock_timeout(Duration::from_secs(5)).await
}

pub async fn test_db_with_lock_timeout(lock_timeout: Duration) -> TestDb {
    let dir = tempfile::tempdir().expect("create temp dir");
    let config = DbConfig::new(dir.path().join("stockroom-test.db"))
        .max_connections(4)
        .lock_timeout(lock_timeout);
    let db = Database::new(config).await.expect("open test database");

    TestDb { db, _dir: dir }
}

pub fn details(name: &str) -> PartyDetails {
    PartyDetails {
        name: name.to_string(),
        phone: "11987654321".to_string(),
        email: format!("{}@example.com", name.to_lowercase().replace(' ', ".")),
        address_id: None,
    }
}

pub async fn customer(db: &Database, name: &str) -> Customer {
    db.customers()
        .insert(&details(name))
        .await
        .expect("insert customer")
}

pub async fn supplier(db: &Database, name: &str) -> Supplier {
    db.suppliers()
        .insert(&details(name))
        .await
        .expect("insert supplier")
}

pub fn new_product(name: &str, price_cents: i64, quantity: i64, min_stock: i64) -> NewProduct {
    NewProduct {
        name: name.to_string(),
        category: "Grocery".to_string(),
        price_cents,
        quantity_on_hand: quantity,
        min_stock,
        supplier_id: None,
    }
}

pub async fn product(
    db: &Database,
    name: &str,
    price_cents: i64,
    quantity: i64,
    min_stock: i64,
) -> Product {
    db.products()
        .insert(&new_product(name, price_cents, quantity, min_stock))
        .await
        .expect("insert product")
}

pub async fn supplied_product(db: &Database, name: &str, supplier_id: &SupplierId) -> Product {
    let mut new = new_product(name, 500, 10, 2);
    new.supplier_id = Some(supplier_id.clone());
    db.products().insert(&new).await.expect("insert product")
}

pub async fn quantity_of(db: &Database, product_id: &str) -> i64 {
    db.products()
        .get_by_id(product_id)
        .await
        .expect("read product")
        .expect("product exists")
        .quantity_on_hand
}
