//! Read-side reports over committed sales.

mod common;

use chrono::{Duration as Days, NaiveDate};
use common::*;
use stockroom_core::{CustomerId, OrderLine};
use tokio_stream::StreamExt;

#[tokio::test]
async fn test_low_stock_is_inclusive_sorted_and_repeatable() {
    let t = test_db().await;
    product(&t, "Sugar", 500, 20, 5).await;
    let salt = product(&t, "Salt", 200, 5, 5).await;
    let flour = product(&t, "Flour", 400, 0, 3).await;

    let first = t.reports().low_stock().await.unwrap();
    let names: Vec<&str> = first.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["Flour", "Salt"]);
    assert_eq!(first[0].id, flour.id);
    assert_eq!(first[1].id, salt.id);

    let second = t.reports().low_stock().await.unwrap();
    assert_eq!(first, second);

    let streamed: Vec<_> = t
        .reports()
        .low_stock_stream()
        .collect::<Result<Vec<_>, _>>()
        .await
        .unwrap();
    assert_eq!(streamed, first);
}

#[tokio::test]
async fn test_sale_can_push_product_into_low_stock() {
    let t = test_db().await;
    let ana = customer(&t, "Ana").await;
    let oats = product(&t, "Oats", 600, 8, 5).await;

    assert!(t.reports().low_stock().await.unwrap().is_empty());

    t.ledger()
        .place_order(&ana.id, &[OrderLine::new(&oats.id, 3)])
        .await
        .unwrap();

    let low = t.reports().low_stock().await.unwrap();
    assert_eq!(low.len(), 1);
    assert_eq!(low[0].quantity_on_hand, 5);
}

#[tokio::test]
async fn test_customer_history_newest_first_with_lifetime_total() {
    let t = test_db().await;
    let ana = customer(&t, "Ana").await;
    let bia = customer(&t, "Bia").await;
    let rice = product(&t, "Rice 5kg", 1000, 50, 0).await;
    let beans = product(&t, "Black Beans", 800, 50, 0).await;

    let ledger = t.ledger();
    let older = ledger
        .place_order(&ana.id, &[OrderLine::new(&rice.id, 1)])
        .await
        .unwrap();
    let newer = ledger
        .place_order(
            &ana.id,
            &[OrderLine::new(&beans.id, 2), OrderLine::new(&rice.id, 1)],
        )
        .await
        .unwrap();
    ledger
        .place_order(&bia.id, &[OrderLine::new(&rice.id, 7)])
        .await
        .unwrap();

    let history = t.reports().sales_history_by_customer(&ana.id).await.unwrap();
    assert_eq!(history.customer_id, ana.id);
    assert_eq!(history.lifetime_total_cents, 1000 + 1600 + 1000);

    let ids: Vec<&str> = history.sales.iter().map(|r| r.sale.id.as_str()).collect();
    assert_eq!(ids, vec![newer.as_str(), older.as_str()]);

    let newest_lines: Vec<(&str, i64)> = history.sales[0]
        .lines
        .iter()
        .map(|l| (l.product_name.as_str(), l.subtotal_cents))
        .collect();
    assert_eq!(newest_lines, vec![("Black Beans", 1600), ("Rice 5kg", 1000)]);

    let nobody = t
        .reports()
        .sales_history_by_customer(&CustomerId::new("nobody"))
        .await
        .unwrap();
    assert!(nobody.sales.is_empty());
    assert_eq!(nobody.lifetime_total_cents, 0);
}

#[tokio::test]
async fn test_product_history_joins_sale_and_customer() {
    let t = test_db().await;
    let ana = customer(&t, "Ana").await;
    let bia = customer(&t, "Bia").await;
    let coffee = product(&t, "Coffee", 1500, 20, 0).await;
    let sugar = product(&t, "Sugar", 500, 20, 0).await;

    let ledger = t.ledger();
    let first = ledger
        .place_order(
            &ana.id,
            &[OrderLine::new(&coffee.id, 1), OrderLine::new(&sugar.id, 2)],
        )
        .await
        .unwrap();
    let second = ledger
        .place_order(&bia.id, &[OrderLine::new(&coffee.id, 3)])
        .await
        .unwrap();

    let records = t
        .reports()
        .sales_history_by_product(&coffee.id)
        .await
        .unwrap();
    assert_eq!(records.len(), 2);

    assert_eq!(records[0].sale_id, second);
    assert_eq!(records[0].customer_name, "Bia");
    assert_eq!(records[0].quantity, 3);
    assert_eq!(records[0].sale_total_cents, 4500);

    assert_eq!(records[1].sale_id, first);
    assert_eq!(records[1].customer_id, ana.id);
    assert_eq!(records[1].subtotal_cents, 1500);
    assert_eq!(records[1].sale_total_cents, 2500);

    assert!(t
        .reports()
        .sales_history_by_product("no-such-product")
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn test_period_bounds_are_inclusive_dates() {
    let t = test_db().await;
    let ana = customer(&t, "Ana").await;
    let rice = product(&t, "Rice 5kg", 1000, 10, 0).await;

    let sale_id = t
        .ledger()
        .place_order(&ana.id, &[OrderLine::new(&rice.id, 2)])
        .await
        .unwrap();
    let sale = t.sales().get_by_id(&sale_id).await.unwrap().unwrap();
    let day: NaiveDate = sale.created_at.date_naive();

    let report = t
        .reports()
        .sales_history_by_period(day, day)
        .await
        .unwrap();
    assert_eq!(report.sales.len(), 1);
    assert_eq!(report.sales[0].sale_id, sale_id);
    assert_eq!(report.sales[0].customer_name, "Ana");
    assert_eq!(report.total_cents, 2000);

    let before = day - Days::days(30);
    let report = t
        .reports()
        .sales_history_by_period(before, day - Days::days(1))
        .await
        .unwrap();
    assert!(report.sales.is_empty());
    assert_eq!(report.total_cents, 0);

    let report = t
        .reports()
        .sales_history_by_period(day, before)
        .await
        .unwrap();
    assert!(report.sales.is_empty());
    assert_eq!(report.total_cents, 0);
}

#[tokio::test]
async fn test_period_report_is_chronological() {
    let t = test_db().await;
    let ana = customer(&t, "Ana").await;
    let rice = product(&t, "Rice 5kg", 1000, 10, 0).await;

    let ledger = t.ledger();
    let mut placed = Vec::new();
    for quantity in 1..=3 {
        placed.push(
            ledger
                .place_order(&ana.id, &[OrderLine::new(&rice.id, quantity)])
                .await
                .unwrap(),
        );
    }

    let today = chrono::Utc::now().date_naive();
    let report = t
        .reports()
        .sales_history_by_period(today - Days::days(1), today + Days::days(1))
        .await
        .unwrap();

    let ids: Vec<String> = report.sales.iter().map(|s| s.sale_id.clone()).collect();
    assert_eq!(ids, placed);
    assert_eq!(report.total_cents, 1000 + 2000 + 3000);
}

#[tokio::test]
async fn test_list_sales_and_deletion() {
    let t = test_db().await;
    let ana = customer(&t, "Ana").await;
    let rice = product(&t, "Rice 5kg", 1000, 10, 0).await;

    let ledger = t.ledger();
    let first = ledger
        .place_order(&ana.id, &[OrderLine::new(&rice.id, 1)])
        .await
        .unwrap();
    let second = ledger
        .place_order(&ana.id, &[OrderLine::new(&rice.id, 2)])
        .await
        .unwrap();

    let sales = t.reports().list_sales().await.unwrap();
    let ids: Vec<&str> = sales.iter().map(|s| s.sale_id.as_str()).collect();
    assert_eq!(ids, vec![second.as_str(), first.as_str()]);
    assert_eq!(sales[0].customer_name, "Ana");

    ledger.delete_sale(&second).await.unwrap();

    let sales = t.reports().list_sales().await.unwrap();
    assert_eq!(sales.len(), 1);
    let history = t.reports().sales_history_by_customer(&ana.id).await.unwrap();
    assert_eq!(history.lifetime_total_cents, 1000);
    assert!(t
        .reports()
        .sales_history_by_product(&rice.id)
        .await
        .unwrap()
        .iter()
        .all(|r| r.sale_id == first));
}
