//! End-to-end tests for the Atelier API.
//!
//! # Running Tests
//!
//! ```bash
//! # Apply migrations and create a staff account
//! cargo run -p atelier-cli -- migrate
//! cargo run -p atelier-cli -- user create -e staff@example.com -n Staff -r admin -p 'staff-passphrase'
//!
//! # Start the server with a roomy /api quota, then run the ignored tests
//! ATELIER_API_BURST=10000 ATELIER_API_PER_SECOND=1000 cargo run -p atelier-server &
//! ATELIER_TEST_STAFF_EMAIL=staff@example.com ATELIER_TEST_STAFF_PASSWORD=staff-passphrase \
//!     cargo test -p atelier-integration-tests -- --ignored
//! ```
//!
//! # Environment Variables
//!
//! - `ATELIER_BASE_URL` - Server under test (default `http://localhost:3000`)
//! - `ATELIER_TEST_STAFF_EMAIL`, `ATELIER_TEST_STAFF_PASSWORD` - An admin
//!   account, needed to manage the catalog and send quotes. It should be the
//!   first staff account created, since customer messages go to that account.
//!
//! The whole suite sends a few hundred requests from one address. With the
//! server's default `/api` quota (burst 50, one per second) later tests hit
//! 429, so raise `ATELIER_API_BURST` and `ATELIER_API_PER_SECOND` as above.

#![allow(clippy::missing_panics_doc)]

use reqwest::{Client, Response, StatusCode};
use serde_json::{Value, json};
use uuid::Uuid;

/// Base URL for the API (configurable via environment).
#[must_use]
pub fn base_url() -> String {
    std::env::var("ATELIER_BASE_URL").unwrap_or_else(|_| "http://localhost:3000".to_string())
}

/// A client with its own cookie jar, i.e. its own session.
pub struct Session {
    pub client: Client,
    base: String,
}

impl Session {
    /// A fresh, anonymous session.
    #[must_use]
    pub fn anonymous() -> Self {
        let client = Client::builder()
            .cookie_store(true)
            .build()
            .expect("Failed to create HTTP client");
        Self {
            client,
            base: base_url(),
        }
    }

    /// Register a brand new customer and keep its session.
    pub async fn new_customer() -> Self {
        let session = Self::anonymous();
        let email = format!("customer-{}@example.com", Uuid::new_v4().simple());
        let resp = session
            .post(
                "/api/auth/register",
                &json!({ "email": email, "password": "customer-pass", "name": "Test Customer" }),
            )
            .await;
        assert_eq!(resp.status(), StatusCode::CREATED, "registration failed");
        session
    }

    /// Sign in with the staff account from the environment.
    pub async fn staff() -> Self {
        let email = std::env::var("ATELIER_TEST_STAFF_EMAIL")
            .expect("ATELIER_TEST_STAFF_EMAIL must name an admin account");
        let password = std::env::var("ATELIER_TEST_STAFF_PASSWORD")
            .expect("ATELIER_TEST_STAFF_PASSWORD must be set");

        let session = Self::anonymous();
        let resp = session
            .post(
                "/api/auth/login",
                &json!({ "email": email, "password": password }),
            )
            .await;
        assert_eq!(resp.status(), StatusCode::OK, "staff login failed");
        session
    }

    pub async fn get(&self, path: &str) -> Response {
        self.client
            .get(format!("{}{path}", self.base))
            .send()
            .await
            .expect("GET failed")
    }

    pub async fn post(&self, path: &str, body: &Value) -> Response {
        self.client
            .post(format!("{}{path}", self.base))
            .json(body)
            .send()
            .await
            .expect("POST failed")
    }

    pub async fn patch(&self, path: &str, body: &Value) -> Response {
        self.client
            .patch(format!("{}{path}", self.base))
            .json(body)
            .send()
            .await
            .expect("PATCH failed")
    }

    /// The signed-in user's id.
    pub async fn user_id(&self) -> String {
        let me = json_body(self.get("/api/auth/me").await).await;
        me["user"]["id"]
            .as_str()
            .expect("session is anonymous")
            .to_owned()
    }
}

/// Read a response body as JSON.
pub async fn json_body(resp: Response) -> Value {
    resp.json().await.expect("response was not JSON")
}

/// How many notifications of `kind` about `request_id` are in the inbox.
///
/// Notifications are written in the background; give them a moment first.
pub async fn count_notifications(session: &Session, kind: &str, request_id: &str) -> usize {
    tokio::time::sleep(std::time::Duration::from_millis(300)).await;
    let body = json_body(session.get("/api/notifications").await).await;
    body["notifications"]
        .as_array()
        .expect("notifications array")
        .iter()
        .filter(|n| n["type"] == kind && n["meta"]["requestId"] == request_id)
        .count()
}

/// Create an active service with a unique slug and return its id.
pub async fn create_service(staff: &Session, base_price_cents: i64) -> String {
    let slug = format!("svc-{}", Uuid::new_v4().simple());
    let resp = staff
        .post(
            "/api/admin/services",
            &json!({
                "slug": slug,
                "title": "Brand refresh",
                "description": "A complete refresh of an existing brand.",
                "basePriceCents": base_price_cents,
            }),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    json_body(resp).await["service"]["id"]
        .as_str()
        .expect("service id")
        .to_owned()
}

/// Create an active product with a unique slug and return its id.
pub async fn create_product(staff: &Session, price_cents: i64) -> String {
    let slug = format!("prd-{}", Uuid::new_v4().simple());
    let resp = staff
        .post(
            "/api/admin/products",
            &json!({
                "slug": slug,
                "title": "Icon pack",
                "description": "A pack of line icons for interfaces.",
                "priceCents": price_cents,
                "digitalFileUrl": "https://files.example.com/icons.zip",
            }),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    json_body(resp).await["product"]["id"]
        .as_str()
        .expect("product id")
        .to_owned()
}
