//! Request ID middleware for request tracing and correlation.
//!
//! Upstream proxies may supply `x-request-id`; otherwise a UUID v4 is
//! generated. Either way the id ends up in the tracing span, on the Sentry
//! scope and in the response.

use axum::{extract::Request, http::HeaderValue, middleware::Next, response::Response};
use tracing::Span;
use uuid::Uuid;

/// The HTTP header name for request IDs.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Longest upstream id accepted as-is.
const MAX_UPSTREAM_ID_LEN: usize = 128;

/// The upstream id if it is short, printable ASCII; a fresh UUID otherwise.
fn request_id_from(request: &Request) -> String {
    request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|h| h.to_str().ok())
        .filter(|id| !id.is_empty() && id.len() <= MAX_UPSTREAM_ID_LEN)
        .map_or_else(|| Uuid::new_v4().to_string(), str::to_owned)
}

/// Tag the request with an id and echo it on the response.
pub async fn request_id_middleware(request: Request, next: Next) -> Response {
    let request_id = request_id_from(&request);

    Span::current().record("request_id", &request_id);
    sentry::configure_scope(|scope| {
        scope.set_tag("request_id", &request_id);
    });

    let mut response = next.run(request).await;

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }

    response
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::body::Body;

    use super::*;

    fn request(id: Option<&str>) -> Request {
        let mut builder = axum::http::Request::builder().uri("/");
        if let Some(id) = id {
            builder = builder.header(REQUEST_ID_HEADER, id);
        }
        builder.body(Body::empty()).unwrap()
    }

    #[test]
    fn test_upstream_id_kept() {
        assert_eq!(request_id_from(&request(Some("cf-abc-123"))), "cf-abc-123");
    }

    #[test]
    fn test_generated_when_missing_or_oversized() {
        let generated = request_id_from(&request(None));
        assert!(Uuid::parse_str(&generated).is_ok());

        let long = "x".repeat(MAX_UPSTREAM_ID_LEN + 1);
        let replaced = request_id_from(&request(Some(&long)));
        assert!(Uuid::parse_str(&replaced).is_ok());
    }
}
