//! Orders and mock payment, end to end.
//!
//! Requires a running server, database and staff credentials; see the
//! crate docs.

use atelier_integration_tests::{Session, create_product, json_body};
use reqwest::StatusCode;
use serde_json::json;

#[tokio::test]
#[ignore = "Requires running server, database and staff credentials"]
async fn test_order_prices_are_snapshotted() {
    let staff = Session::staff().await;
    let customer = Session::new_customer().await;
    let product_id = create_product(&staff, 1_500).await;

    let resp = customer
        .post(
            "/api/orders",
            &json!({ "type": "digital", "items": [{ "productId": product_id, "quantity": 3 }] }),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let order = json_body(resp).await["order"].clone();
    assert_eq!(order["totalCents"], 4_500);
    assert_eq!(order["items"][0]["unitPriceCents"], 1_500);
    assert_eq!(order["items"][0]["subtotalCents"], 4_500);

    let resp = staff
        .patch(
            &format!("/api/admin/products/{product_id}"),
            &json!({ "priceCents": 9_900 }),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::OK);

    let orders = json_body(customer.get("/api/orders?mine=1").await).await;
    let listed = &orders["orders"][0];
    assert_eq!(listed["totalCents"], 4_500);
    assert_eq!(listed["items"][0]["unitPriceCents"], 1_500);
}

#[tokio::test]
#[ignore = "Requires running server, database and staff credentials"]
async fn test_mock_pay_is_idempotent() {
    let staff = Session::staff().await;
    let customer = Session::new_customer().await;
    let product_id = create_product(&staff, 2_000).await;

    let resp = customer
        .post(
            "/api/orders",
            &json!({ "type": "digital", "items": [{ "productId": product_id, "quantity": 1 }] }),
        )
        .await;
    let order_id = json_body(resp).await["order"]["id"]
        .as_str()
        .expect("order id")
        .to_owned();

    // Two concurrent payments, then one more after the fact.
    let pay = json!({ "orderId": order_id });
    let (a, b) = tokio::join!(
        customer.post("/api/payments/mock", &pay),
        customer.post("/api/payments/mock", &pay),
    );
    assert_eq!(a.status(), StatusCode::OK);
    assert_eq!(b.status(), StatusCode::OK);
    let again = json_body(customer.post("/api/payments/mock", &pay).await).await;
    assert_eq!(again["order"]["status"], "paid");

    // The outbox writes asynchronously.
    tokio::time::sleep(std::time::Duration::from_millis(300)).await;
    let notifications = json_body(customer.get("/api/notifications").await).await;
    let ready = notifications["notifications"]
        .as_array()
        .expect("notifications array")
        .iter()
        .filter(|n| n["type"] == "order" && n["meta"]["orderId"] == order_id.as_str())
        .count();
    assert_eq!(ready, 1);
}

#[tokio::test]
#[ignore = "Requires running server, database and staff credentials"]
async fn test_other_customer_cannot_pay() {
    let staff = Session::staff().await;
    let owner = Session::new_customer().await;
    let stranger = Session::new_customer().await;
    let product_id = create_product(&staff, 2_000).await;

    let resp = owner
        .post(
            "/api/orders",
            &json!({ "type": "digital", "items": [{ "productId": product_id, "quantity": 1 }] }),
        )
        .await;
    let order_id = json_body(resp).await["order"]["id"].clone();

    let resp = stranger
        .post("/api/payments/mock", &json!({ "orderId": order_id }))
        .await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
#[ignore = "Requires running server and database"]
async fn test_invalid_order_reports_each_field() {
    let customer = Session::new_customer().await;

    let resp = customer
        .post(
            "/api/orders",
            &json!({ "type": "gift", "items": [{ "quantity": 0 }] }),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body = json_body(resp).await;
    let paths: Vec<&str> = body["details"]
        .as_array()
        .expect("details")
        .iter()
        .filter_map(|i| i["path"].as_str())
        .collect();
    assert!(paths.contains(&"type"));
    assert!(paths.contains(&"items.0.quantity"));
}
