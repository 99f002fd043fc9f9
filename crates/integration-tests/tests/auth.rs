//! Session endpoints, end to end.
//!
//! Requires a running server and database.

use atelier_integration_tests::{Session, json_body};
use reqwest::StatusCode;
use serde_json::json;

#[tokio::test]
#[ignore = "Requires running server and database"]
async fn test_register_me_logout() {
    let session = Session::new_customer().await;

    let me = json_body(session.get("/api/auth/me").await).await;
    assert_eq!(me["user"]["role"], "customer");

    let resp = session.post("/api/auth/logout", &json!({})).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let me = json_body(session.get("/api/auth/me").await).await;
    assert!(me["user"].is_null());
}

#[tokio::test]
#[ignore = "Requires running server and database"]
async fn test_duplicate_email_is_conflict() {
    let session = Session::anonymous();
    let payload = json!({
        "email": format!("dup-{}@example.com", uuid::Uuid::new_v4().simple()),
        "password": "customer-pass",
        "name": "Dup",
    });

    assert_eq!(
        session.post("/api/auth/register", &payload).await.status(),
        StatusCode::CREATED
    );
    let resp = Session::anonymous()
        .post("/api/auth/register", &payload)
        .await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
}

#[tokio::test]
#[ignore = "Requires running server and database"]
async fn test_wrong_password_is_unauthorized() {
    let resp = Session::anonymous()
        .post(
            "/api/auth/login",
            &json!({ "email": "nobody@example.com", "password": "wrong-password" }),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(json_body(resp).await["error"], "Invalid credentials");
}

#[tokio::test]
#[ignore = "Requires running server and database"]
async fn test_notifications_of_others_are_admin_only() {
    let customer = Session::new_customer().await;
    let other = Session::new_customer().await;
    let other_id = other.user_id().await;

    let resp = customer
        .get(&format!("/api/notifications?userId={other_id}"))
        .await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}
