//! Service request lifecycle, end to end.
//!
//! These tests require:
//! - A migrated `PostgreSQL` database
//! - The API server running (cargo run -p atelier-server)
//! - An admin account in `ATELIER_TEST_STAFF_EMAIL` / `ATELIER_TEST_STAFF_PASSWORD`

use atelier_integration_tests::{Session, count_notifications, create_service, json_body};
use reqwest::StatusCode;
use serde_json::{Value, json};

async fn open_request(customer: &Session, service_id: &str) -> String {
    let resp = customer
        .post(
            "/api/requests",
            &json!({ "serviceId": service_id, "brief": { "goal": "launch" } }),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body = json_body(resp).await;
    assert_eq!(body["request"]["status"], "open");
    body["request"]["id"].as_str().expect("request id").to_owned()
}

async fn request_detail(session: &Session, request_id: &str) -> Value {
    let resp = session.get(&format!("/api/requests/{request_id}")).await;
    assert_eq!(resp.status(), StatusCode::OK);
    json_body(resp).await["request"].clone()
}

async fn send_quote(staff: &Session, request_id: &str, amount: i64) -> Value {
    let resp = staff
        .post(
            &format!("/api/requests/{request_id}/quote"),
            &json!({ "amountCents": amount }),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::OK);
    json_body(resp).await["quote"].clone()
}

// ============================================================================
// Happy path
// ============================================================================

#[tokio::test]
#[ignore = "Requires running server, database and staff credentials"]
async fn test_quote_accept_and_pay_scenario() {
    let staff = Session::staff().await;
    let customer = Session::new_customer().await;
    let service_id = create_service(&staff, 40_000).await;

    let request_id = open_request(&customer, &service_id).await;

    let quote = send_quote(&staff, &request_id, 50_000).await;
    assert_eq!(quote["status"], "sent");
    assert_eq!(request_detail(&customer, &request_id).await["status"], "quoted");

    let notifications = json_body(customer.get("/api/notifications").await).await;
    let quote_notes = notifications["notifications"]
        .as_array()
        .expect("notifications array")
        .iter()
        .filter(|n| n["type"] == "quote")
        .count();
    assert_eq!(quote_notes, 1);

    let quote_id = quote["id"].as_str().expect("quote id");
    let resp = customer
        .post(&format!("/api/quotes/{quote_id}/accept"), &json!({}))
        .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let accepted = json_body(resp).await;
    assert_eq!(accepted["requestId"], request_id.as_str());
    let order_id = accepted["orderId"].as_str().expect("order id").to_owned();

    let detail = request_detail(&customer, &request_id).await;
    assert_eq!(detail["status"], "in_progress");
    assert_eq!(detail["quote"]["status"], "accepted");

    let orders = json_body(customer.get("/api/orders?mine=1").await).await;
    let order = orders["orders"]
        .as_array()
        .expect("orders array")
        .iter()
        .find(|o| o["id"] == order_id.as_str())
        .expect("accepted quote created an order")
        .clone();
    assert_eq!(order["status"], "pending");
    assert_eq!(order["type"], "service");
    assert_eq!(order["totalCents"], 50_000);

    let resp = customer
        .post("/api/payments/mock", &json!({ "orderId": order_id }))
        .await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(json_body(resp).await["order"]["status"], "paid");
    assert_eq!(request_detail(&customer, &request_id).await["status"], "paid");
}

#[tokio::test]
#[ignore = "Requires running server, database and staff credentials"]
async fn test_second_quote_replaces_first() {
    let staff = Session::staff().await;
    let customer = Session::new_customer().await;
    let service_id = create_service(&staff, 10_000).await;
    let request_id = open_request(&customer, &service_id).await;

    let first = send_quote(&staff, &request_id, 10_000).await;
    let second = send_quote(&staff, &request_id, 12_500).await;

    assert_eq!(first["id"], second["id"]);
    let detail = request_detail(&customer, &request_id).await;
    assert_eq!(detail["quote"]["amountCents"], 12_500);
    assert_eq!(detail["quote"]["status"], "sent");
}

// ============================================================================
// Quote decisions
// ============================================================================

#[tokio::test]
#[ignore = "Requires running server, database and staff credentials"]
async fn test_only_owner_decides_on_quote() {
    let staff = Session::staff().await;
    let owner = Session::new_customer().await;
    let stranger = Session::new_customer().await;
    let service_id = create_service(&staff, 10_000).await;
    let request_id = open_request(&owner, &service_id).await;
    let quote = send_quote(&staff, &request_id, 10_000).await;
    let accept = format!("/api/quotes/{}/accept", quote["id"].as_str().expect("quote id"));

    let resp = Session::anonymous().post(&accept, &json!({})).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let resp = stranger.post(&accept, &json!({})).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let resp = staff.post(&accept, &json!({})).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    // Nothing changed.
    assert_eq!(request_detail(&owner, &request_id).await["quote"]["status"], "sent");
}

#[tokio::test]
#[ignore = "Requires running server, database and staff credentials"]
async fn test_accepted_quote_cannot_be_accepted_again() {
    let staff = Session::staff().await;
    let customer = Session::new_customer().await;
    let service_id = create_service(&staff, 10_000).await;
    let request_id = open_request(&customer, &service_id).await;
    let quote = send_quote(&staff, &request_id, 10_000).await;
    let quote_id = quote["id"].as_str().expect("quote id");

    let resp = customer
        .post(&format!("/api/quotes/{quote_id}/respond"), &json!({ "action": "accept" }))
        .await;
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = customer
        .post(&format!("/api/quotes/{quote_id}/accept"), &json!({}))
        .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        json_body(resp).await["error"],
        "Quote cannot be accepted in current state"
    );

    let orders = json_body(customer.get("/api/orders?mine=1").await).await;
    assert_eq!(orders["orders"].as_array().map(Vec::len), Some(1));
}

#[tokio::test]
#[ignore = "Requires running server, database and staff credentials"]
async fn test_decline_moves_request_to_declined() {
    let staff = Session::staff().await;
    let customer = Session::new_customer().await;
    let service_id = create_service(&staff, 10_000).await;
    let request_id = open_request(&customer, &service_id).await;
    let quote = send_quote(&staff, &request_id, 10_000).await;
    let quote_id = quote["id"].as_str().expect("quote id");

    let resp = customer
        .post(&format!("/api/quotes/{quote_id}/decline"), &json!({}))
        .await;
    assert_eq!(resp.status(), StatusCode::OK);

    let detail = request_detail(&customer, &request_id).await;
    assert_eq!(detail["status"], "declined");
    assert_eq!(detail["quote"]["status"], "declined");
}

#[tokio::test]
#[ignore = "Requires running server, database and staff credentials"]
async fn test_accepted_quote_cannot_be_declined() {
    let staff = Session::staff().await;
    let customer = Session::new_customer().await;
    let service_id = create_service(&staff, 10_000).await;
    let request_id = open_request(&customer, &service_id).await;
    let quote = send_quote(&staff, &request_id, 10_000).await;
    let quote_id = quote["id"].as_str().expect("quote id");

    let resp = customer
        .post(&format!("/api/quotes/{quote_id}/accept"), &json!({}))
        .await;
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = customer
        .post(&format!("/api/quotes/{quote_id}/decline"), &json!({}))
        .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        json_body(resp).await["error"],
        "Quote cannot be declined in current state"
    );

    let detail = request_detail(&customer, &request_id).await;
    assert_eq!(detail["status"], "in_progress");
    assert_eq!(detail["quote"]["status"], "accepted");
}

#[tokio::test]
#[ignore = "Requires running server, database and staff credentials"]
async fn test_decline_notifies_staff() {
    let staff = Session::staff().await;
    let customer = Session::new_customer().await;
    let service_id = create_service(&staff, 10_000).await;
    let request_id = open_request(&customer, &service_id).await;
    // Opening a request is silent.
    assert_eq!(count_notifications(&staff, "quote", &request_id).await, 0);

    let quote = send_quote(&staff, &request_id, 10_000).await;
    let quote_id = quote["id"].as_str().expect("quote id");

    let resp = customer
        .post(&format!("/api/quotes/{quote_id}/decline"), &json!({}))
        .await;
    assert_eq!(resp.status(), StatusCode::OK);

    assert_eq!(count_notifications(&staff, "quote", &request_id).await, 1);
}

// ============================================================================
// Thread and deliverables
// ============================================================================

#[tokio::test]
#[ignore = "Requires running server, database and staff credentials"]
async fn test_messages_notify_the_other_side() {
    let staff = Session::staff().await;
    let customer = Session::new_customer().await;
    let service_id = create_service(&staff, 10_000).await;
    let request_id = open_request(&customer, &service_id).await;
    let messages = format!("/api/requests/{request_id}/messages");

    let resp = customer.post(&messages, &json!({ "body": "Any update?" })).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    assert_eq!(count_notifications(&staff, "message", &request_id).await, 1);
    assert_eq!(count_notifications(&customer, "message", &request_id).await, 0);

    let resp = staff.post(&messages, &json!({ "body": "Drafts on Friday." })).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    assert_eq!(count_notifications(&customer, "message", &request_id).await, 1);
    assert_eq!(count_notifications(&staff, "message", &request_id).await, 1);
}

#[tokio::test]
#[ignore = "Requires running server, database and staff credentials"]
async fn test_deliverable_notifies_owner() {
    let staff = Session::staff().await;
    let customer = Session::new_customer().await;
    let service_id = create_service(&staff, 10_000).await;
    let request_id = open_request(&customer, &service_id).await;

    let resp = staff
        .post(
            &format!("/api/requests/{request_id}/deliverables"),
            &json!({ "title": "Logo", "fileUrl": "https://files.example.com/logo.svg" }),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    assert_eq!(count_notifications(&customer, "deliverable", &request_id).await, 1);
}

#[tokio::test]
#[ignore = "Requires running server, database and staff credentials"]
async fn test_thread_and_deliverable_ordering() {
    let staff = Session::staff().await;
    let customer = Session::new_customer().await;
    let service_id = create_service(&staff, 10_000).await;
    let request_id = open_request(&customer, &service_id).await;

    for (session, body) in [(&customer, "first"), (&staff, "second")] {
        let resp = session
            .post(
                &format!("/api/requests/{request_id}/messages"),
                &json!({ "body": body }),
            )
            .await;
        assert_eq!(resp.status(), StatusCode::CREATED);
    }

    for title in ["Draft", "Final"] {
        let resp = staff
            .post(
                &format!("/api/requests/{request_id}/deliverables"),
                &json!({ "title": title, "fileUrl": "https://files.example.com/out.pdf" }),
            )
            .await;
        assert_eq!(resp.status(), StatusCode::CREATED);
    }

    let detail = request_detail(&customer, &request_id).await;
    assert_eq!(detail["status"], "delivered");
    assert_eq!(detail["messages"][0]["body"], "first");
    assert_eq!(detail["messages"][1]["body"], "second");
    assert_eq!(detail["deliverables"][0]["title"], "Final");
}

#[tokio::test]
#[ignore = "Requires running server, database and staff credentials"]
async fn test_manual_status_allows_any_jump() {
    let staff = Session::staff().await;
    let customer = Session::new_customer().await;
    let service_id = create_service(&staff, 10_000).await;
    let request_id = open_request(&customer, &service_id).await;

    let resp = staff
        .post(
            &format!("/api/requests/{request_id}/status"),
            &json!({ "status": "completed" }),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(request_detail(&customer, &request_id).await["status"], "completed");

    let resp = customer
        .post(
            &format!("/api/requests/{request_id}/status"),
            &json!({ "status": "open" }),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
#[ignore = "Requires running server, database and staff credentials"]
async fn test_malformed_request_id_is_a_validation_error() {
    let customer = Session::new_customer().await;

    let resp = customer.get("/api/requests/not-a-uuid").await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body = json_body(resp).await;
    assert_eq!(body["error"], "Invalid payload");
    assert_eq!(body["details"][0]["path"], "id");
}
