//! Payload schemas for every JSON endpoint.

use serde_json::Value;

use atelier_core::{
    Cents, Email, LineSource, NotificationId, OrderId, OrderType, ProductId, RequestStatus, Role,
    ServiceId,
};

use super::{IssueCode, Schema, ValidationError, Validator};
use crate::db::catalog::{NewProduct, NewService, ProductChanges, ServiceChanges};

const ROLE_NAMES: &[&str] = &["customer", "editor", "admin"];
const ORDER_TYPE_NAMES: &[&str] = &["digital", "service", "coaching"];
const REQUEST_STATUS_NAMES: &[&str] = &[
    "open",
    "needs_info",
    "quoted",
    "paid",
    "in_progress",
    "delivered",
    "completed",
    "declined",
];

const PASSWORD_MAX: usize = 256;
const TITLE_MAX: usize = 200;
const TEXT_MAX: usize = 10_000;
const QUANTITY_MAX: i64 = 10_000;

// =============================================================================
// Auth
// =============================================================================

#[derive(Debug, Clone)]
pub struct RegisterInput {
    pub email: Email,
    pub password: String,
    pub name: String,
}

impl Schema for RegisterInput {
    fn validate(v: &mut Validator<'_>) -> Option<Self> {
        let email = v.email("email");
        let password = v.string("password", 8, PASSWORD_MAX);
        let name = v.string("name", 2, 80);
        Some(Self {
            email: email?,
            password: password?,
            name: name?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct LoginInput {
    pub email: Email,
    pub password: String,
}

impl Schema for LoginInput {
    fn validate(v: &mut Validator<'_>) -> Option<Self> {
        let email = v.email("email");
        let password = v.string("password", 1, PASSWORD_MAX);
        Some(Self {
            email: email?,
            password: password?,
        })
    }
}

// =============================================================================
// Catalog
// =============================================================================

impl Schema for NewProduct {
    fn validate(v: &mut Validator<'_>) -> Option<Self> {
        let slug = v.string("slug", 3, TITLE_MAX);
        let title = v.string("title", 3, TITLE_MAX);
        let description = v.string("description", 10, TEXT_MAX);
        let price_cents = v.cents("priceCents");
        let is_active = v.optional_bool("isActive");
        let sku = v.optional_string("sku", 1, 64);
        let tags = v.optional_strings("tags");
        let cover_image_url = v.optional_url("coverImageUrl");
        let digital_file_url = v.optional_url("digitalFileUrl");
        Some(Self {
            slug: slug?,
            title: title?,
            description: description?,
            price_cents: price_cents?,
            is_active: is_active?,
            sku: sku?,
            tags: tags?,
            cover_image_url: cover_image_url?,
            digital_file_url: digital_file_url?,
        })
    }
}

impl Schema for ProductChanges {
    fn validate(v: &mut Validator<'_>) -> Option<Self> {
        let slug = v.optional_string("slug", 3, TITLE_MAX);
        let title = v.optional_string("title", 3, TITLE_MAX);
        let description = v.optional_string("description", 10, TEXT_MAX);
        let price_cents = v.optional_cents("priceCents");
        let is_active = v.optional_bool("isActive");
        let sku = v.nullable("sku", |v, f| v.optional_string(f, 1, 64));
        let tags = v.optional_strings("tags");
        let cover_image_url = v.nullable("coverImageUrl", |v, f| v.optional_url(f));
        let digital_file_url = v.nullable("digitalFileUrl", |v, f| v.optional_url(f));
        Some(Self {
            slug: slug?,
            title: title?,
            description: description?,
            price_cents: price_cents?,
            is_active: is_active?,
            sku: sku?,
            tags: tags?,
            cover_image_url: cover_image_url?,
            digital_file_url: digital_file_url?,
        })
    }
}

impl Schema for NewService {
    fn validate(v: &mut Validator<'_>) -> Option<Self> {
        let slug = v.string("slug", 3, TITLE_MAX);
        let title = v.string("title", 3, TITLE_MAX);
        let description = v.string("description", 10, TEXT_MAX);
        let base_price_cents = v.cents("basePriceCents");
        let is_active = v.optional_bool("isActive");
        let tags = v.optional_strings("tags");
        Some(Self {
            slug: slug?,
            title: title?,
            description: description?,
            base_price_cents: base_price_cents?,
            is_active: is_active?,
            tags: tags?,
        })
    }
}

impl Schema for ServiceChanges {
    fn validate(v: &mut Validator<'_>) -> Option<Self> {
        let slug = v.optional_string("slug", 3, TITLE_MAX);
        let title = v.optional_string("title", 3, TITLE_MAX);
        let description = v.optional_string("description", 10, TEXT_MAX);
        let base_price_cents = v.optional_cents("basePriceCents");
        let is_active = v.optional_bool("isActive");
        let tags = v.optional_strings("tags");
        Some(Self {
            slug: slug?,
            title: title?,
            description: description?,
            base_price_cents: base_price_cents?,
            is_active: is_active?,
            tags: tags?,
        })
    }
}

// =============================================================================
// Orders
// =============================================================================

/// One requested order line. Which of product or service it references is
/// checked when the order is priced, so the client gets a specific message.
#[derive(Debug, Clone)]
pub struct OrderItemInput {
    pub product_id: Option<ProductId>,
    pub service_id: Option<ServiceId>,
    pub quantity: i64,
}

impl OrderItemInput {
    /// The single catalog entry this line references.
    ///
    /// # Errors
    ///
    /// Returns the client-facing message when the line references neither
    /// or both.
    pub const fn source(&self) -> Result<LineSource, &'static str> {
        match (self.product_id, self.service_id) {
            (Some(id), None) => Ok(LineSource::Product(id)),
            (None, Some(id)) => Ok(LineSource::Service(id)),
            (None, None) => Err("Each item must reference a product or service"),
            (Some(_), Some(_)) => Err("Item cannot reference both product and service"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct OrderCreateInput {
    pub kind: OrderType,
    pub items: Vec<OrderItemInput>,
}

impl Schema for OrderCreateInput {
    fn validate(v: &mut Validator<'_>) -> Option<Self> {
        let kind = v.one_of("type", ORDER_TYPE_NAMES);
        let items = v.objects("items", 1, |item| {
            let product_id = item.optional_id("productId");
            let service_id = item.optional_id("serviceId");
            let quantity = item.int("quantity", 1, QUANTITY_MAX);
            Some(OrderItemInput {
                product_id: product_id?,
                service_id: service_id?,
                quantity: quantity?,
            })
        });
        Some(Self {
            kind: kind?,
            items: items?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct MockPaymentInput {
    pub order_id: OrderId,
}

impl Schema for MockPaymentInput {
    fn validate(v: &mut Validator<'_>) -> Option<Self> {
        let order_id = v.id("orderId");
        Some(Self {
            order_id: order_id?,
        })
    }
}

// =============================================================================
// Service requests
// =============================================================================

#[derive(Debug, Clone)]
pub struct RequestCreateInput {
    pub service_id: ServiceId,
    /// Free-form customer brief, stored verbatim.
    pub brief: Value,
}

impl Schema for RequestCreateInput {
    fn validate(v: &mut Validator<'_>) -> Option<Self> {
        let service_id = v.id("serviceId");
        let brief = v.object("brief");
        Some(Self {
            service_id: service_id?,
            brief: brief?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct MessageInput {
    pub body: String,
    pub attachments: Vec<String>,
}

impl Schema for MessageInput {
    fn validate(v: &mut Validator<'_>) -> Option<Self> {
        let body = v.string("body", 1, TEXT_MAX);
        let attachments = v.optional_urls("attachments");
        Some(Self {
            body: body?,
            attachments: attachments?.unwrap_or_default(),
        })
    }
}

#[derive(Debug, Clone)]
pub struct QuoteInput {
    pub amount: Cents,
    pub notes: Option<String>,
}

impl Schema for QuoteInput {
    fn validate(v: &mut Validator<'_>) -> Option<Self> {
        let amount = v.cents("amountCents");
        let notes = v.optional_string("notes", 0, TEXT_MAX);
        Some(Self {
            amount: amount?,
            notes: notes?,
        })
    }
}

/// What a customer does with a sent quote.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuoteAction {
    Accept,
    Decline,
}

impl std::str::FromStr for QuoteAction {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "accept" => Ok(Self::Accept),
            "decline" => Ok(Self::Decline),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct QuoteResponseInput {
    pub action: QuoteAction,
}

impl Schema for QuoteResponseInput {
    fn validate(v: &mut Validator<'_>) -> Option<Self> {
        let action = v.one_of("action", &["accept", "decline"]);
        Some(Self { action: action? })
    }
}

#[derive(Debug, Clone)]
pub struct DeliverableInput {
    pub title: String,
    pub description: Option<String>,
    pub file_url: String,
}

impl Schema for DeliverableInput {
    fn validate(v: &mut Validator<'_>) -> Option<Self> {
        let title = v.string("title", 2, TITLE_MAX);
        let description = v.optional_string("description", 0, TEXT_MAX);
        let file_url = v.url("fileUrl");
        Some(Self {
            title: title?,
            description: description?,
            file_url: file_url?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct RequestStatusInput {
    pub status: RequestStatus,
}

impl Schema for RequestStatusInput {
    fn validate(v: &mut Validator<'_>) -> Option<Self> {
        let status = v.one_of("status", REQUEST_STATUS_NAMES);
        Some(Self { status: status? })
    }
}

// =============================================================================
// Notifications
// =============================================================================

#[derive(Debug, Clone)]
pub struct NotificationReadInput {
    pub ids: Vec<NotificationId>,
}

impl Schema for NotificationReadInput {
    fn validate(v: &mut Validator<'_>) -> Option<Self> {
        let ids = v.ids("ids", 1);
        Some(Self { ids: ids? })
    }
}

#[derive(Debug, Clone)]
pub struct BroadcastInput {
    pub title: String,
    pub body: String,
    /// Restrict to one role; everyone when absent.
    pub role: Option<Role>,
}

impl Schema for BroadcastInput {
    fn validate(v: &mut Validator<'_>) -> Option<Self> {
        let title = v.string("title", 3, TITLE_MAX);
        let body = v.string("body", 3, TEXT_MAX);
        let role = v.optional_one_of("role", ROLE_NAMES);
        Some(Self {
            title: title?,
            body: body?,
            role: role?,
        })
    }
}

// =============================================================================
// Admin users
// =============================================================================

#[derive(Debug, Clone)]
pub struct AdminUserCreateInput {
    pub email: Email,
    pub password: String,
    pub name: String,
    pub role: Role,
}

impl Schema for AdminUserCreateInput {
    fn validate(v: &mut Validator<'_>) -> Option<Self> {
        let email = v.email("email");
        let password = v.string("password", 8, PASSWORD_MAX);
        let name = v.string("name", 2, 80);
        let role = v.one_of("role", ROLE_NAMES);
        Some(Self {
            email: email?,
            password: password?,
            name: name?,
            role: role?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct AdminUserUpdateInput {
    pub email: Option<Email>,
    pub password: Option<String>,
    pub name: Option<String>,
    pub role: Option<Role>,
}

impl AdminUserUpdateInput {
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.email.is_none() && self.password.is_none() && self.name.is_none() && self.role.is_none()
    }
}

impl Schema for AdminUserUpdateInput {
    fn validate(v: &mut Validator<'_>) -> Option<Self> {
        let email = v.optional_email("email");
        let password = v.optional_string("password", 8, PASSWORD_MAX);
        let name = v.optional_string("name", 2, 80);
        let role = v.optional_one_of("role", ROLE_NAMES);
        Some(Self {
            email: email?,
            password: password?,
            name: name?,
            role: role?,
        })
    }
}

// =============================================================================
// Query strings
// =============================================================================

/// `limit`/`offset` window for list endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub limit: i64,
    pub offset: i64,
}

impl Pagination {
    pub const MAX_LIMIT: i64 = 100;

    /// Parse raw query values, falling back to `default_limit` and 0.
    ///
    /// # Errors
    ///
    /// Returns an issue per parameter that is not an integer in range.
    pub fn from_query(
        limit: Option<&str>,
        offset: Option<&str>,
        default_limit: i64,
    ) -> Result<Self, ValidationError> {
        let mut issues = Vec::new();
        let mut read = |name: &str, raw: Option<&str>, default: i64, min: i64, max: i64| {
            let Some(raw) = raw else {
                return default;
            };
            match raw.parse::<i64>() {
                Ok(n) if (min..=max).contains(&n) => n,
                _ => {
                    issues.push(super::Issue {
                        path: name.to_owned(),
                        code: IssueCode::InvalidType,
                        message: format!("{name} must be an integer between {min} and {max}"),
                    });
                    default
                }
            }
        };
        let limit = read("limit", limit, default_limit, 1, Self::MAX_LIMIT);
        let offset = read("offset", offset, 0, 0, i64::MAX);
        if issues.is_empty() {
            Ok(Self { limit, offset })
        } else {
            Err(ValidationError(issues))
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    fn issue_paths<T: Schema>(value: &Value) -> Vec<String> {
        match T::parse(value) {
            Ok(_) => Vec::new(),
            Err(err) => err.0.into_iter().map(|i| i.path).collect(),
        }
    }

    #[test]
    fn test_register_lowercases_email() {
        let input = RegisterInput::parse(&json!({
            "email": "Ada@Example.com",
            "password": "correct horse",
            "name": "Ada"
        }))
        .unwrap();
        assert_eq!(input.email.as_str(), "ada@example.com");
    }

    #[test]
    fn test_register_reports_all_fields() {
        let paths = issue_paths::<RegisterInput>(&json!({
            "email": "not-an-email",
            "password": "short",
            "name": "A"
        }));
        assert_eq!(paths, ["email", "password", "name"]);
    }

    #[test]
    fn test_product_requires_core_fields() {
        let paths = issue_paths::<NewProduct>(&json!({ "slug": "ab", "priceCents": -1 }));
        assert_eq!(paths, ["slug", "title", "description", "priceCents"]);
    }

    #[test]
    fn test_product_changes_tri_state() {
        let changes = ProductChanges::parse(&json!({
            "title": "New title",
            "sku": null,
            "coverImageUrl": "https://cdn.example.com/a.png"
        }))
        .unwrap();
        assert_eq!(changes.title.as_deref(), Some("New title"));
        assert_eq!(changes.sku, Some(None));
        assert_eq!(
            changes.cover_image_url,
            Some(Some("https://cdn.example.com/a.png".to_owned()))
        );
        assert_eq!(changes.digital_file_url, None);

        let empty = ProductChanges::parse(&json!({})).unwrap();
        assert!(empty.is_empty());
    }

    #[test]
    fn test_order_items() {
        let input = OrderCreateInput::parse(&json!({
            "type": "digital",
            "items": [{ "productId": "6f1c1b9e-3b8a-4a8e-9d51-2f2f8e6f4b10", "quantity": 2 }]
        }))
        .unwrap();
        assert_eq!(input.kind, OrderType::Digital);
        assert!(matches!(input.items[0].source(), Ok(LineSource::Product(_))));

        let paths = issue_paths::<OrderCreateInput>(&json!({
            "type": "physical",
            "items": [{ "productId": "nope", "quantity": 0 }]
        }));
        assert_eq!(paths, ["type", "items.0.productId", "items.0.quantity"]);
    }

    #[test]
    fn test_order_item_source_messages() {
        let neither = OrderItemInput {
            product_id: None,
            service_id: None,
            quantity: 1,
        };
        assert_eq!(
            neither.source(),
            Err("Each item must reference a product or service")
        );

        let both = OrderItemInput {
            product_id: Some(ProductId::generate()),
            service_id: Some(ServiceId::generate()),
            quantity: 1,
        };
        assert_eq!(
            both.source(),
            Err("Item cannot reference both product and service")
        );
    }

    #[test]
    fn test_request_create_needs_object_brief() {
        let paths = issue_paths::<RequestCreateInput>(&json!({
            "serviceId": "6f1c1b9e-3b8a-4a8e-9d51-2f2f8e6f4b10",
            "brief": "make it pop"
        }));
        assert_eq!(paths, ["brief"]);
    }

    #[test]
    fn test_message_attachments_must_be_urls() {
        let paths = issue_paths::<MessageInput>(&json!({
            "body": "see attached",
            "attachments": ["https://files.example.com/a.pdf", "a.pdf"]
        }));
        assert_eq!(paths, ["attachments.1"]);

        let input = MessageInput::parse(&json!({ "body": "hi" })).unwrap();
        assert!(input.attachments.is_empty());
    }

    #[test]
    fn test_quote_response_action() {
        let input = QuoteResponseInput::parse(&json!({ "action": "decline" })).unwrap();
        assert_eq!(input.action, QuoteAction::Decline);
        assert_eq!(
            issue_paths::<QuoteResponseInput>(&json!({ "action": "maybe" })),
            ["action"]
        );
    }

    #[test]
    fn test_request_status_accepts_every_value() {
        for status in RequestStatus::ALL {
            let input = RequestStatusInput::parse(&json!({ "status": status.as_str() })).unwrap();
            assert_eq!(input.status, *status);
        }
    }

    #[test]
    fn test_notification_read_needs_ids() {
        assert_eq!(
            issue_paths::<NotificationReadInput>(&json!({ "ids": [] })),
            ["ids"]
        );
    }

    #[test]
    fn test_broadcast_role_optional() {
        let input = BroadcastInput::parse(&json!({ "title": "Hello", "body": "World" })).unwrap();
        assert!(input.role.is_none());
        let input =
            BroadcastInput::parse(&json!({ "title": "Hello", "body": "World", "role": "editor" }))
                .unwrap();
        assert_eq!(input.role, Some(Role::Editor));
    }

    #[test]
    fn test_admin_user_update_all_optional() {
        let input = AdminUserUpdateInput::parse(&json!({})).unwrap();
        assert!(input.is_empty());
        assert_eq!(
            issue_paths::<AdminUserUpdateInput>(&json!({ "password": "short" })),
            ["password"]
        );
    }

    #[test]
    fn test_pagination() {
        assert_eq!(
            Pagination::from_query(None, None, 50).unwrap(),
            Pagination {
                limit: 50,
                offset: 0
            }
        );
        assert_eq!(
            Pagination::from_query(Some("100"), Some("20"), 50).unwrap(),
            Pagination {
                limit: 100,
                offset: 20
            }
        );
        let err = Pagination::from_query(Some("0"), Some("-1"), 50).unwrap_err();
        assert_eq!(err.0.len(), 2);
        assert!(Pagination::from_query(Some("101"), None, 50).is_err());
    }
}
