//! Catalog, parties, and addresses.

mod common;

use common::*;
use stockroom_core::{
    CustomerId, NewAddress, OrderLine, PartyRecord, SupplierId, ValidationError,
};
use stockroom_db::DbError;

fn sample_address(city: &str, state: &str) -> NewAddress {
    NewAddress {
        street: "Rua das Flores".to_string(),
        number: 120,
        neighborhood: "Centro".to_string(),
        postal_code: "01310100".to_string(),
        city_name: city.to_string(),
        state_id: state.to_string(),
    }
}

// =============================================================================
// Products
// =============================================================================

#[tokio::test]
async fn test_product_insert_rejects_bad_fields() {
    let t = test_db().await;
    let repo = t.products();

    let err = repo.insert(&new_product("", 100, 1, 0)).await.unwrap_err();
    assert!(matches!(err, DbError::Validation(ValidationError::Required { .. })));

    let err = repo.insert(&new_product("Rice", 0, 1, 0)).await.unwrap_err();
    assert!(matches!(err, DbError::Validation(ValidationError::MustBePositive { .. })));

    let err = repo.insert(&new_product("Rice", 100, -1, 0)).await.unwrap_err();
    assert!(matches!(err, DbError::Validation(ValidationError::OutOfRange { .. })));

    let err = repo.insert(&new_product("Rice", 100, 1, -1)).await.unwrap_err();
    assert!(matches!(err, DbError::Validation(ValidationError::OutOfRange { .. })));

    assert_eq!(repo.count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_product_update_and_stock_correction() {
    let t = test_db().await;
    let rice = product(&t, "Rice 5kg", 1000, 10, 2).await;

    let mut changes = new_product("Rice 5kg Premium", 1250, 12, 4);
    changes.category = "Premium".to_string();
    let updated = t.products().update(&rice.id, &changes).await.unwrap();
    assert_eq!(updated.id, rice.id);
    assert_eq!(updated.name, "Rice 5kg Premium");
    assert_eq!(updated.price_cents, 1250);
    assert_eq!(updated.quantity_on_hand, 12);
    assert_eq!(updated.created_at, rice.created_at);

    t.products().set_quantity(&rice.id, 0).await.unwrap();
    assert_eq!(quantity_of(&t, &rice.id).await, 0);

    let err = t.products().set_quantity(&rice.id, -1).await.unwrap_err();
    assert!(matches!(err, DbError::Validation(_)));
    assert_eq!(quantity_of(&t, &rice.id).await, 0);

    let err = t.products().update("missing", &changes).await.unwrap_err();
    assert!(matches!(err, DbError::NotFound { .. }));
}

#[tokio::test]
async fn test_product_with_sales_cannot_be_deleted() {
    let t = test_db().await;
    let ana = customer(&t, "Ana").await;
    let sold = product(&t, "Coffee", 1500, 5, 0).await;
    let unsold = product(&t, "Tea", 900, 5, 0).await;

    t.ledger()
        .place_order(&ana.id, &[OrderLine::new(&sold.id, 1)])
        .await
        .unwrap();

    let err = t.products().delete(&sold.id).await.unwrap_err();
    assert!(matches!(err, DbError::ForeignKeyViolation { .. }));
    assert!(t.products().get_by_id(&sold.id).await.unwrap().is_some());

    t.products().delete(&unsold.id).await.unwrap();
    assert!(t.products().get_by_id(&unsold.id).await.unwrap().is_none());

    let err = t.products().delete(&unsold.id).await.unwrap_err();
    assert!(matches!(err, DbError::NotFound { .. }));
}

#[tokio::test]
async fn test_product_lookup_by_name_and_supplier() {
    let t = test_db().await;
    let acme = supplier(&t, "Acme Foods").await;
    let other = supplier(&t, "Other Foods").await;

    let supplied = supplied_product(&t, "Flour", &acme.id).await;
    let loose = product(&t, "Flour", 400, 3, 1).await;

    let found = t
        .products()
        .find_by_name_and_supplier("Flour", Some(&acme.id))
        .await
        .unwrap();
    assert_eq!(found.map(|p| p.id), Some(supplied.id));

    let found = t
        .products()
        .find_by_name_and_supplier("Flour", None)
        .await
        .unwrap();
    assert_eq!(found.map(|p| p.id), Some(loose.id));

    assert!(t
        .products()
        .find_by_name_and_supplier("Flour", Some(&other.id))
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_product_list_carries_supplier_name() {
    let t = test_db().await;
    let acme = supplier(&t, "Acme Foods").await;
    supplied_product(&t, "Beans", &acme.id).await;
    product(&t, "Apples", 300, 10, 1).await;

    let listing = t.products().list().await.unwrap();
    let rows: Vec<(&str, Option<&str>)> = listing
        .iter()
        .map(|l| (l.product.name.as_str(), l.supplier_name.as_deref()))
        .collect();
    assert_eq!(rows, vec![("Apples", None), ("Beans", Some("Acme Foods"))]);
}

#[tokio::test]
async fn test_product_supplier_must_be_a_supplier() {
    let t = test_db().await;
    let ana = customer(&t, "Ana").await;

    let mut new = new_product("Rice", 1000, 1, 0);
    new.supplier_id = Some(SupplierId::new(ana.id.as_str()));
    let err = t.products().insert(&new).await.unwrap_err();
    assert!(matches!(err, DbError::NotFound { .. }));
}

#[tokio::test]
async fn test_deleting_supplier_clears_product_link() {
    let t = test_db().await;
    let acme = supplier(&t, "Acme Foods").await;
    let beans = supplied_product(&t, "Beans", &acme.id).await;

    t.suppliers().delete(&acme.id).await.unwrap();

    let beans = t.products().get_by_id(&beans.id).await.unwrap().unwrap();
    assert_eq!(beans.supplier_id, None);
}

// =============================================================================
// Parties
// =============================================================================

#[tokio::test]
async fn test_customers_and_suppliers_are_separate() {
    let t = test_db().await;
    let ana = customer(&t, "Ana").await;
    let acme = supplier(&t, "Acme Foods").await;

    assert!(t
        .suppliers()
        .get_by_id(&SupplierId::new(ana.id.as_str()))
        .await
        .unwrap()
        .is_none());
    assert!(t
        .customers()
        .get_by_id(&CustomerId::new(acme.id.as_str()))
        .await
        .unwrap()
        .is_none());

    let customers = t.customers().list().await.unwrap();
    assert_eq!(customers.len(), 1);
    assert_eq!(customers[0].id(), &ana.id);

    let err = t
        .customers()
        .delete(&CustomerId::new(acme.id.as_str()))
        .await
        .unwrap_err();
    assert!(matches!(err, DbError::NotFound { .. }));
    assert_eq!(t.suppliers().list().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_party_validation_and_update() {
    let t = test_db().await;
    let ana = customer(&t, "Ana").await;

    let mut bad = details("Ana");
    bad.email = "not-an-email".to_string();
    let err = t.customers().insert(&bad).await.unwrap_err();
    assert!(matches!(err, DbError::Validation(ValidationError::InvalidFormat { .. })));

    let mut bad = details("Ana");
    bad.phone = "123".to_string();
    let err = t.customers().update(&ana.id, &bad).await.unwrap_err();
    assert!(matches!(err, DbError::Validation(_)));

    let mut renamed = details("Ana Souza");
    renamed.phone = "2133334444".to_string();
    let updated = t.customers().update(&ana.id, &renamed).await.unwrap();
    assert_eq!(updated.details().name, "Ana Souza");
    assert_eq!(updated.details().phone, "2133334444");
    assert_eq!(updated.created_at, ana.created_at);
}

#[tokio::test]
async fn test_customer_with_sales_cannot_be_deleted() {
    let t = test_db().await;
    let ana = customer(&t, "Ana").await;
    let bia = customer(&t, "Bia").await;
    let rice = product(&t, "Rice", 1000, 5, 0).await;

    t.ledger()
        .place_order(&ana.id, &[OrderLine::new(&rice.id, 1)])
        .await
        .unwrap();

    let err = t.customers().delete(&ana.id).await.unwrap_err();
    assert!(matches!(err, DbError::ForeignKeyViolation { .. }));

    t.customers().delete(&bia.id).await.unwrap();
    assert!(t.customers().get_by_id(&bia.id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_list_with_addresses_resolves_city_and_state() {
    let t = test_db().await;
    let address = t
        .addresses()
        .insert(&sample_address("São Paulo", "sp"))
        .await
        .unwrap();

    let mut with_address = details("Ana");
    with_address.address_id = Some(address.id.clone());
    t.customers().insert(&with_address).await.unwrap();
    customer(&t, "Bia").await;

    let listing = t.customers().list_with_addresses().await.unwrap();
    assert_eq!(listing.len(), 2);

    let ana = &listing[0];
    assert_eq!(ana.party.details.name, "Ana");
    let resolved = ana.address.as_ref().expect("Ana has an address");
    assert_eq!(resolved.id, address.id);
    assert_eq!(resolved.city_name, "São Paulo");
    assert_eq!(resolved.state_id, "SP");
    assert_eq!(resolved.state_name, "São Paulo");

    assert_eq!(listing[1].party.details.name, "Bia");
    assert!(listing[1].address.is_none());
}

// =============================================================================
// States, cities, addresses
// =============================================================================

#[tokio::test]
async fn test_all_states_are_seeded() {
    let t = test_db().await;

    let states = t.addresses().list_states().await.unwrap();
    assert_eq!(states.len(), 27);

    let rj = t.addresses().get_state("rj").await.unwrap().unwrap();
    assert_eq!(rj.id, "RJ");
    assert_eq!(rj.name, "Rio de Janeiro");

    assert!(t.addresses().get_state("XX").await.unwrap().is_none());
}

#[tokio::test]
async fn test_city_is_created_once_per_state() {
    let t = test_db().await;
    let repo = t.addresses();

    let first = repo.insert(&sample_address("Campinas", "SP")).await.unwrap();
    let second = repo.insert(&sample_address("Campinas", "SP")).await.unwrap();
    assert_ne!(first.id, second.id);
    assert_eq!(first.city_id, second.city_id);

    let city = repo.get_or_create_city("SP", "Campinas").await.unwrap();
    assert_eq!(city.id, first.city_id);

    let cities = repo.list_cities("SP").await.unwrap();
    assert_eq!(cities.len(), 1);

    let elsewhere = repo.get_or_create_city("MG", "Campinas").await.unwrap();
    assert_ne!(elsewhere.id, first.city_id);
}

#[tokio::test]
async fn test_concurrent_address_inserts_share_one_city() {
    let t = test_db().await;

    let tasks: Vec<_> = (0..8)
        .map(|_| {
            let db = t.db.clone();
            tokio::spawn(async move { db.addresses().insert(&sample_address("Sorocaba", "SP")).await })
        })
        .collect();

    let mut city_ids = Vec::new();
    for task in tasks {
        let address = task.await.unwrap().expect("every insert succeeds");
        city_ids.push(address.city_id);
    }
    city_ids.dedup();
    assert_eq!(city_ids.len(), 1);

    let cities = t.addresses().list_cities("SP").await.unwrap();
    assert_eq!(cities.len(), 1);
    assert_eq!(cities[0].name, "Sorocaba");
}

#[tokio::test]
async fn test_address_insert_waits_for_another_writer() {
    let t = test_db().await;
    let ana = customer(&t, "Ana").await;

    let mut blocker = t.pool().begin().await.unwrap();
    sqlx::query("UPDATE parties SET name = name WHERE id = ?1")
        .bind(ana.id.as_str())
        .execute(&mut *blocker)
        .await
        .unwrap();

    let db = t.db.clone();
    let insert =
        tokio::spawn(async move { db.addresses().insert(&sample_address("Campinas", "SP")).await });

    tokio::time::sleep(std::time::Duration::from_millis(200)).await;
    blocker.commit().await.unwrap();

    let address = insert.await.unwrap().expect("insert goes through once the lock is free");
    assert_eq!(address.city_name, "Campinas");
    assert_eq!(address.state_id, "SP");
}

#[tokio::test]
async fn test_address_with_unknown_state_is_rejected() {
    let t = test_db().await;

    let err = t
        .addresses()
        .insert(&sample_address("Atlantis", "XX"))
        .await
        .unwrap_err();
    assert!(matches!(err, DbError::NotFound { .. }));
    assert!(t.addresses().list_cities("XX").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_address_update_and_delete() {
    let t = test_db().await;
    let address = t
        .addresses()
        .insert(&sample_address("Campinas", "SP"))
        .await
        .unwrap();

    let mut moved = sample_address("Niterói", "RJ");
    moved.number = 0;
    let updated = t.addresses().update(&address.id, &moved).await.unwrap();
    assert_eq!(updated.city_name, "Niterói");
    assert_eq!(updated.state_id, "RJ");
    assert_eq!(updated.number, 0);

    let mut with_address = details("Ana");
    with_address.address_id = Some(address.id.clone());
    let ana = t.customers().insert(&with_address).await.unwrap();

    t.addresses().delete(&address.id).await.unwrap();
    assert!(t.addresses().get_by_id(&address.id).await.unwrap().is_none());

    let ana = t.customers().get_by_id(&ana.id).await.unwrap().unwrap();
    assert_eq!(ana.details.address_id, None);
}
