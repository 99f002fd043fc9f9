//! Request payload validation.
//!
//! Handlers take [`ValidatedJson<T>`] for any `T: Schema`. The body is read
//! as a JSON value and walked field by field with a [`Validator`], which
//! keeps going after the first problem so the client gets every issue in
//! one response:
//!
//! ```json
//! { "error": "Invalid payload",
//!   "details": [{ "path": "items.0.quantity", "code": "too_small", "message": "..." }] }
//! ```

pub mod schemas;

use std::str::FromStr;

use axum::{
    body::Bytes,
    extract::{FromRequest, Request},
};
use serde::Serialize;
use serde_json::{Map, Value};
use uuid::Uuid;

use atelier_core::{Cents, Email};

use crate::error::AppError;

pub use schemas::*;

/// Machine-readable reason for a failed field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueCode {
    InvalidJson,
    Required,
    InvalidType,
    TooShort,
    TooLong,
    TooSmall,
    TooBig,
    InvalidEmail,
    InvalidUuid,
    InvalidUrl,
    InvalidEnum,
    Custom,
}

/// One field-level problem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Issue {
    /// Dotted path to the field, array indices included (`items.0.quantity`).
    pub path: String,
    pub code: IssueCode,
    pub message: String,
}

/// All issues found in a payload. Never empty.
#[derive(Debug, Clone, thiserror::Error)]
#[error("invalid payload ({} issue(s))", .0.len())]
pub struct ValidationError(pub Vec<Issue>);

impl ValidationError {
    /// A single issue not tied to a body field.
    pub fn single(path: impl Into<String>, code: IssueCode, message: impl Into<String>) -> Self {
        Self(vec![Issue {
            path: path.into(),
            code,
            message: message.into(),
        }])
    }
}

/// A payload type that can be checked and built from untyped JSON.
pub trait Schema: Sized {
    /// Read every field of `v` and build `Self`.
    ///
    /// Return `None` when any field failed; the failures are already
    /// recorded on the validator.
    fn validate(v: &mut Validator<'_>) -> Option<Self>;

    /// Validate a whole JSON document.
    ///
    /// # Errors
    ///
    /// Returns every issue found if the document does not match.
    fn parse(value: &Value) -> Result<Self, ValidationError> {
        let Some(object) = value.as_object() else {
            return Err(ValidationError::single(
                "body",
                IssueCode::InvalidType,
                "Expected a JSON object",
            ));
        };
        let mut v = Validator::new(object);
        let parsed = Self::validate(&mut v);
        v.finish(parsed)
    }
}

/// Walks a JSON object and records issues against dotted paths.
pub struct Validator<'a> {
    object: &'a Map<String, Value>,
    prefix: String,
    issues: Vec<Issue>,
}

impl<'a> Validator<'a> {
    #[must_use]
    pub const fn new(object: &'a Map<String, Value>) -> Self {
        Self {
            object,
            prefix: String::new(),
            issues: Vec::new(),
        }
    }

    fn nested(object: &'a Map<String, Value>, prefix: String) -> Self {
        Self {
            object,
            prefix,
            issues: Vec::new(),
        }
    }

    fn path(&self, field: &str) -> String {
        if self.prefix.is_empty() {
            field.to_owned()
        } else {
            format!("{}.{field}", self.prefix)
        }
    }

    /// Record an issue against `field`.
    pub fn issue(&mut self, field: &str, code: IssueCode, message: impl Into<String>) {
        let path = self.path(field);
        self.issues.push(Issue {
            path,
            code,
            message: message.into(),
        });
    }

    #[must_use]
    pub fn has_issues(&self) -> bool {
        !self.issues.is_empty()
    }

    /// Turn the outcome of [`Schema::validate`] into a result.
    ///
    /// # Errors
    ///
    /// Returns the collected issues if any were recorded.
    pub fn finish<T>(self, parsed: Option<T>) -> Result<T, ValidationError> {
        match parsed {
            Some(value) if self.issues.is_empty() => Ok(value),
            _ if self.issues.is_empty() => Err(ValidationError::single(
                "body",
                IssueCode::Custom,
                "Invalid payload",
            )),
            _ => Err(ValidationError(self.issues)),
        }
    }

    /// The raw value of a field. `null` counts as absent.
    fn raw(&self, field: &str) -> Option<&'a Value> {
        self.object.get(field).filter(|value| !value.is_null())
    }

    /// Whether the field is present, `null` included.
    #[must_use]
    pub fn is_present(&self, field: &str) -> bool {
        self.object.contains_key(field)
    }

    /// Whether the field is present and explicitly `null`.
    #[must_use]
    pub fn is_null(&self, field: &str) -> bool {
        self.object.get(field).is_some_and(Value::is_null)
    }

    fn require(&mut self, field: &str) -> Option<&'a Value> {
        let value = self.raw(field);
        if value.is_none() {
            self.issue(field, IssueCode::Required, format!("{field} is required"));
        }
        value
    }

    fn as_str(&mut self, field: &str, value: &'a Value) -> Option<&'a str> {
        let text = value.as_str();
        if text.is_none() {
            self.issue(field, IssueCode::InvalidType, format!("{field} must be a string"));
        }
        text
    }

    fn check_length(&mut self, field: &str, text: &str, min: usize, max: usize) -> bool {
        let len = text.chars().count();
        if len < min {
            self.issue(
                field,
                IssueCode::TooShort,
                format!("{field} must be at least {min} characters"),
            );
            return false;
        }
        if len > max {
            self.issue(
                field,
                IssueCode::TooLong,
                format!("{field} must be at most {max} characters"),
            );
            return false;
        }
        true
    }

    /// A required string of `min..=max` characters.
    pub fn string(&mut self, field: &str, min: usize, max: usize) -> Option<String> {
        let value = self.require(field)?;
        let text = self.as_str(field, value)?;
        self.check_length(field, text, min, max)
            .then(|| text.to_owned())
    }

    /// An optional string of `min..=max` characters.
    ///
    /// The outer `Option` is `None` when the field failed.
    pub fn optional_string(
        &mut self,
        field: &str,
        min: usize,
        max: usize,
    ) -> Option<Option<String>> {
        let Some(value) = self.raw(field) else {
            return Some(None);
        };
        let text = self.as_str(field, value)?;
        self.check_length(field, text, min, max)
            .then(|| Some(text.to_owned()))
    }

    /// A field of a partial update that may also be cleared with `null`.
    ///
    /// Yields `Some(None)` when absent, `Some(Some(None))` when `null`, and
    /// `Some(Some(Some(value)))` when set.
    pub fn nullable<T>(
        &mut self,
        field: &str,
        read: impl FnOnce(&mut Self, &str) -> Option<Option<T>>,
    ) -> Option<Option<Option<T>>> {
        if self.is_null(field) {
            return Some(Some(None));
        }
        read(self, field).map(|value| value.map(Some))
    }

    /// A required, normalized email address.
    pub fn email(&mut self, field: &str) -> Option<Email> {
        let value = self.require(field)?;
        let text = self.as_str(field, value)?;
        match Email::parse(text) {
            Ok(email) => Some(email),
            Err(err) => {
                self.issue(field, IssueCode::InvalidEmail, err.to_string());
                None
            }
        }
    }

    /// An optional, normalized email address.
    pub fn optional_email(&mut self, field: &str) -> Option<Option<Email>> {
        if self.raw(field).is_none() {
            return Some(None);
        }
        self.email(field).map(Some)
    }

    fn as_int(&mut self, field: &str, value: &Value, min: i64, max: i64) -> Option<i64> {
        let Some(number) = value.as_i64() else {
            self.issue(field, IssueCode::InvalidType, format!("{field} must be an integer"));
            return None;
        };
        if number < min {
            self.issue(
                field,
                IssueCode::TooSmall,
                format!("{field} must be at least {min}"),
            );
            return None;
        }
        if number > max {
            self.issue(
                field,
                IssueCode::TooBig,
                format!("{field} must be at most {max}"),
            );
            return None;
        }
        Some(number)
    }

    /// A required integer in `min..=max`.
    pub fn int(&mut self, field: &str, min: i64, max: i64) -> Option<i64> {
        let value = self.require(field)?;
        self.as_int(field, value, min, max)
    }

    /// A required non-negative amount in cents.
    pub fn cents(&mut self, field: &str) -> Option<Cents> {
        self.int(field, 0, i64::MAX).map(Cents::new)
    }

    /// An optional non-negative amount in cents.
    pub fn optional_cents(&mut self, field: &str) -> Option<Option<Cents>> {
        let Some(value) = self.raw(field) else {
            return Some(None);
        };
        self.as_int(field, value, 0, i64::MAX)
            .map(|n| Some(Cents::new(n)))
    }

    /// An optional boolean.
    pub fn optional_bool(&mut self, field: &str) -> Option<Option<bool>> {
        let Some(value) = self.raw(field) else {
            return Some(None);
        };
        match value.as_bool() {
            Some(flag) => Some(Some(flag)),
            None => {
                self.issue(field, IssueCode::InvalidType, format!("{field} must be a boolean"));
                None
            }
        }
    }

    fn as_uuid(&mut self, field: &str, value: &Value) -> Option<Uuid> {
        let text = value.as_str().unwrap_or_default();
        match Uuid::parse_str(text) {
            Ok(id) => Some(id),
            Err(_) => {
                self.issue(field, IssueCode::InvalidUuid, format!("{field} must be a UUID"));
                None
            }
        }
    }

    /// A required UUID, converted into a typed id.
    pub fn id<T: From<Uuid>>(&mut self, field: &str) -> Option<T> {
        let value = self.require(field)?;
        self.as_uuid(field, value).map(T::from)
    }

    /// An optional UUID, converted into a typed id.
    pub fn optional_id<T: From<Uuid>>(&mut self, field: &str) -> Option<Option<T>> {
        let Some(value) = self.raw(field) else {
            return Some(None);
        };
        self.as_uuid(field, value).map(|id| Some(T::from(id)))
    }

    fn as_url(&mut self, field: &str, value: &Value) -> Option<String> {
        let text = value.as_str().unwrap_or_default();
        if url::Url::parse(text).is_ok() {
            Some(text.to_owned())
        } else {
            self.issue(field, IssueCode::InvalidUrl, format!("{field} must be a valid URL"));
            None
        }
    }

    /// A required absolute URL.
    pub fn url(&mut self, field: &str) -> Option<String> {
        let value = self.require(field)?;
        self.as_url(field, value)
    }

    /// An optional absolute URL.
    pub fn optional_url(&mut self, field: &str) -> Option<Option<String>> {
        let Some(value) = self.raw(field) else {
            return Some(None);
        };
        self.as_url(field, value).map(Some)
    }

    /// A required value parsed with `FromStr`, such as a role or status.
    pub fn one_of<T: FromStr>(&mut self, field: &str, allowed: &[&str]) -> Option<T> {
        let value = self.require(field)?;
        self.as_enum(field, value, allowed)
    }

    /// An optional value parsed with `FromStr`.
    pub fn optional_one_of<T: FromStr>(
        &mut self,
        field: &str,
        allowed: &[&str],
    ) -> Option<Option<T>> {
        let Some(value) = self.raw(field) else {
            return Some(None);
        };
        self.as_enum(field, value, allowed).map(Some)
    }

    fn as_enum<T: FromStr>(&mut self, field: &str, value: &Value, allowed: &[&str]) -> Option<T> {
        let parsed = value.as_str().and_then(|text| text.parse().ok());
        if parsed.is_none() {
            self.issue(
                field,
                IssueCode::InvalidEnum,
                format!("{field} must be one of: {}", allowed.join(", ")),
            );
        }
        parsed
    }

    /// A required JSON object, kept as-is.
    pub fn object(&mut self, field: &str) -> Option<Value> {
        let value = self.require(field)?;
        if value.is_object() {
            Some(value.clone())
        } else {
            self.issue(field, IssueCode::InvalidType, format!("{field} must be an object"));
            None
        }
    }

    fn array(&mut self, field: &str, value: &'a Value, min: usize) -> Option<&'a Vec<Value>> {
        let Some(items) = value.as_array() else {
            self.issue(field, IssueCode::InvalidType, format!("{field} must be an array"));
            return None;
        };
        if items.len() < min {
            self.issue(
                field,
                IssueCode::TooSmall,
                format!("{field} must contain at least {min} item(s)"),
            );
            return None;
        }
        Some(items)
    }

    /// An optional array of strings.
    pub fn optional_strings(&mut self, field: &str) -> Option<Option<Vec<String>>> {
        self.optional_list(field, |v, path, item| {
            let text = item.as_str();
            if text.is_none() {
                v.issue(path, IssueCode::InvalidType, format!("{path} must be a string"));
            }
            text.map(str::to_owned)
        })
    }

    /// An optional array of absolute URLs.
    pub fn optional_urls(&mut self, field: &str) -> Option<Option<Vec<String>>> {
        self.optional_list(field, |v, path, item| v.as_url(path, item))
    }

    /// A required array of at least `min` UUIDs.
    pub fn ids<T: From<Uuid>>(&mut self, field: &str, min: usize) -> Option<Vec<T>> {
        let value = self.require(field)?;
        let items = self.array(field, value, min)?;
        self.each(field, items, |v, path, item| v.as_uuid(path, item).map(T::from))
    }

    /// A required array of at least `min` objects, each validated by `item`.
    pub fn objects<T>(
        &mut self,
        field: &str,
        min: usize,
        mut item: impl FnMut(&mut Validator<'_>) -> Option<T>,
    ) -> Option<Vec<T>> {
        let value = self.require(field)?;
        let items = self.array(field, value, min)?;
        let mut out = Vec::with_capacity(items.len());
        let mut failed = false;
        for (index, element) in items.iter().enumerate() {
            let path = format!("{field}.{index}");
            let Some(object) = element.as_object() else {
                self.issue(&path, IssueCode::InvalidType, format!("{path} must be an object"));
                failed = true;
                continue;
            };
            let mut child = Validator::nested(object, self.path(&path));
            let parsed = item(&mut child);
            if child.has_issues() {
                self.issues.append(&mut child.issues);
                failed = true;
            } else if let Some(parsed) = parsed {
                out.push(parsed);
            }
        }
        (!failed).then_some(out)
    }

    fn optional_list<T>(
        &mut self,
        field: &str,
        check: impl FnMut(&mut Self, &str, &Value) -> Option<T>,
    ) -> Option<Option<Vec<T>>> {
        let Some(value) = self.raw(field) else {
            return Some(None);
        };
        let items = self.array(field, value, 0)?;
        self.each(field, items, check).map(Some)
    }

    fn each<T>(
        &mut self,
        field: &str,
        items: &[Value],
        mut check: impl FnMut(&mut Self, &str, &Value) -> Option<T>,
    ) -> Option<Vec<T>> {
        let before = self.issues.len();
        let out: Vec<T> = items
            .iter()
            .enumerate()
            .filter_map(|(index, item)| check(self, &format!("{field}.{index}"), item))
            .collect();
        (self.issues.len() == before).then_some(out)
    }
}

/// JSON body extractor that runs a [`Schema`].
///
/// Malformed JSON is reported as a single issue on `body`.
#[derive(Debug, Clone)]
pub struct ValidatedJson<T>(pub T);

impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    S: Send + Sync,
    T: Schema,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|_| malformed_body())?;
        Ok(Self(parse_body(&bytes)?))
    }
}

/// Decode a raw JSON body and run `T`'s schema over it.
///
/// For handlers that must do work (such as spending a rate-limit attempt)
/// before the body is judged.
///
/// # Errors
///
/// Returns a single `body` issue for malformed JSON, otherwise every field
/// issue `T` reports.
pub fn parse_body<T: Schema>(bytes: &[u8]) -> Result<T, ValidationError> {
    let value: Value = serde_json::from_slice(bytes).map_err(|_| malformed_body())?;
    T::parse(&value)
}

fn malformed_body() -> ValidationError {
    ValidationError::single("body", IssueCode::InvalidJson, "Malformed JSON body")
}

/// Parse a path segment into a typed id.
///
/// # Errors
///
/// Returns a validation error on `id` if the segment is not a UUID.
pub fn parse_id<T: From<Uuid>>(raw: &str) -> Result<T, ValidationError> {
    Uuid::parse_str(raw).map(T::from).map_err(|_| {
        ValidationError::single("id", IssueCode::InvalidUuid, "id must be a UUID")
    })
}

/// Read a boolean-ish query flag such as `mine=1` or `mine=true`.
#[must_use]
pub fn query_flag(raw: Option<&str>) -> bool {
    matches!(raw, Some("1" | "true"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    struct Sample {
        name: String,
        count: i64,
        link: Option<String>,
    }

    impl Schema for Sample {
        fn validate(v: &mut Validator<'_>) -> Option<Self> {
            let name = v.string("name", 2, 10);
            let count = v.int("count", 1, 5);
            let link = v.optional_url("link");
            Some(Self {
                name: name?,
                count: count?,
                link: link?,
            })
        }
    }

    fn paths(err: &ValidationError) -> Vec<&str> {
        err.0.iter().map(|i| i.path.as_str()).collect()
    }

    #[test]
    fn test_collects_every_issue() {
        let err = Sample::parse(&json!({ "name": "x", "count": 9, "link": "nope" }))
            .err()
            .unwrap();
        assert_eq!(paths(&err), ["name", "count", "link"]);
        assert_eq!(err.0[0].code, IssueCode::TooShort);
        assert_eq!(err.0[1].code, IssueCode::TooBig);
        assert_eq!(err.0[2].code, IssueCode::InvalidUrl);
    }

    #[test]
    fn test_missing_and_null_fields() {
        let err = Sample::parse(&json!({ "count": null })).err().unwrap();
        assert_eq!(paths(&err), ["name", "count"]);
        assert!(err.0.iter().all(|i| i.code == IssueCode::Required));

        let ok = Sample::parse(&json!({ "name": "ok", "count": 2, "link": null })).unwrap();
        assert_eq!(ok.name, "ok");
        assert_eq!(ok.count, 2);
        assert!(ok.link.is_none());
    }

    #[test]
    fn test_rejects_non_object_body() {
        let err = Sample::parse(&json!([1, 2])).err().unwrap();
        assert_eq!(paths(&err), ["body"]);
    }

    #[test]
    fn test_nested_paths() {
        struct Line {
            qty: i64,
        }
        struct Cart {
            lines: Vec<Line>,
        }
        impl Schema for Cart {
            fn validate(v: &mut Validator<'_>) -> Option<Self> {
                let lines = v.objects("lines", 1, |item| {
                    let qty = item.int("qty", 1, 10);
                    Some(Line { qty: qty? })
                });
                Some(Self { lines: lines? })
            }
        }

        let err = Cart::parse(&json!({ "lines": [{ "qty": 1 }, { "qty": 0 }, 3] }))
            .err()
            .unwrap();
        assert_eq!(paths(&err), ["lines.1.qty", "lines.2"]);

        let err = Cart::parse(&json!({ "lines": [] })).err().unwrap();
        assert_eq!(err.0[0].code, IssueCode::TooSmall);

        let cart = Cart::parse(&json!({ "lines": [{ "qty": 3 }] })).unwrap();
        assert_eq!(cart.lines[0].qty, 3);
    }

    #[test]
    fn test_query_flag() {
        assert!(query_flag(Some("1")));
        assert!(query_flag(Some("true")));
        assert!(!query_flag(Some("0")));
        assert!(!query_flag(None));
    }

    #[test]
    fn test_parse_id() {
        let id: atelier_core::OrderId = parse_id("6f1c1b9e-3b8a-4a8e-9d51-2f2f8e6f4b10").unwrap();
        assert_eq!(id.to_string(), "6f1c1b9e-3b8a-4a8e-9d51-2f2f8e6f4b10");
        assert!(parse_id::<atelier_core::OrderId>("42").is_err());
    }
}
