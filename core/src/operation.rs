//! The request-builder seam shared by every API operation.
//!
//! An operation is a plain struct holding its path, query and body parameters.
//! `ApiClient` turns any `Operation` into an `HttpRequest` and decodes the
//! matching `HttpResponse`; operations never see the configuration.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::ApiError;
use crate::http::HttpMethod;

/// One REST call: verb, templated path, optional query and body.
pub trait Operation {
    /// Decoded success payload. `()` for operations answered with no content.
    type Output: DeserializeOwned;

    fn method(&self) -> HttpMethod;

    /// Raw path segments below the API prefix. Encoding happens on assembly,
    /// so keys containing `/` or spaces are safe.
    fn path(&self) -> Vec<String>;

    fn query(&self) -> Query {
        Query::default()
    }

    fn body(&self) -> Result<Option<String>, ApiError> {
        Ok(None)
    }

    /// Whether a success response carries a payload to decode. Operations
    /// answered with no content ignore whatever body the server sends.
    fn expects_body(&self) -> bool {
        true
    }

    /// Whether `status` is a success for this operation.
    fn accepts(&self, status: u16) -> bool {
        (200..300).contains(&status)
    }
}

/// Serialize a request payload for `Operation::body`.
pub fn json_body<T: Serialize>(value: &T) -> Result<Option<String>, ApiError> {
    serde_json::to_string(value)
        .map(Some)
        .map_err(ApiError::Serialization)
}

/// Ordered query parameters. Absent optional values are never emitted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    pairs: Vec<(String, String)>,
}

impl Query {
    pub fn push(&mut self, name: &str, value: impl ToString) -> &mut Self {
        self.pairs.push((name.to_string(), value.to_string()));
        self
    }

    pub fn push_opt<V: ToString>(&mut self, name: &str, value: Option<V>) -> &mut Self {
        if let Some(value) = value {
            self.push(name, value);
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn pairs(&self) -> &[(String, String)] {
        &self.pairs
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_opt_skips_none() {
        let mut query = Query::default();
        query.push_opt("limit", Some(20)).push_opt::<u32>("offset", None);
        assert_eq!(query.pairs(), &[("limit".to_string(), "20".to_string())]);
    }

    #[test]
    fn repeated_names_are_kept_in_order() {
        let mut query = Query::default();
        query.push("env", "production").push("env", "test");
        assert_eq!(query.get("env"), Some("production"));
        assert_eq!(query.pairs().len(), 2);
        assert_eq!(query.pairs()[1], ("env".to_string(), "test".to_string()));
    }

    #[test]
    fn json_body_serializes() {
        let body = json_body(&serde_json::json!({"key": "a"})).unwrap();
        assert_eq!(body.as_deref(), Some(r#"{"key":"a"}"#));
    }
}
