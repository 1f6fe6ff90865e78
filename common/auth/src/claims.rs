use std::collections::BTreeSet;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::Serialize;
use serde_json::{Map, Value};

/// Claim set produced only after the token signature has been verified.
///
/// Authorization decisions read from this type, never from [`unverified_claims`].
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct VerifiedPayload(Map<String, Value>);

impl VerifiedPayload {
    pub(crate) fn new(claims: Map<String, Value>) -> Self {
        Self(claims)
    }

    pub fn get(&self, claim: &str) -> Option<&Value> {
        self.0.get(claim)
    }

    pub fn subject(&self) -> Option<&str> {
        self.0.get("sub").and_then(Value::as_str)
    }

    pub fn event_type(&self) -> Option<&str> {
        self.0.get("type").and_then(Value::as_str)
    }

    /// Normalised `permissions` claim.
    ///
    /// Accepts a JSON list or a single space-delimited string; anything else is empty.
    pub fn permissions(&self) -> BTreeSet<String> {
        match self.0.get("permissions") {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_owned)
                .collect(),
            Some(Value::String(joined)) => joined.split_whitespace().map(str::to_owned).collect(),
            _ => BTreeSet::new(),
        }
    }

    /// Audience claim, falling back to the non-standard `audience` key.
    pub fn audience(&self) -> Option<&Value> {
        match self.0.get("aud") {
            Some(Value::Null) | None => self.0.get("audience"),
            Some(value) => Some(value),
        }
    }

    /// Webhook events must at least carry a `type` and a `data.user.id`.
    pub fn has_event_shape(&self) -> bool {
        let has_type = self.0.get("type").is_some_and(is_truthy);
        let has_user_id = self
            .0
            .get("data")
            .and_then(Value::as_object)
            .and_then(|data| data.get("user"))
            .and_then(Value::as_object)
            .and_then(|user| user.get("id"))
            .is_some_and(is_truthy);
        has_type && has_user_id
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }
}

/// Read the claim set of a compact token without checking its signature.
///
/// Anything that is not a decodable JSON object yields an empty map so that
/// header-based key lookup can still proceed.
pub fn unverified_claims(token: &str) -> Map<String, Value> {
    let Some(segment) = token.split('.').nth(1) else {
        return Map::new();
    };

    URL_SAFE_NO_PAD
        .decode(segment.trim_end_matches('='))
        .ok()
        .and_then(|bytes| serde_json::from_slice::<Map<String, Value>>(&bytes).ok())
        .unwrap_or_default()
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::String(text) => !text.is_empty(),
        Value::Number(number) => number.as_f64().is_some_and(|n| n != 0.0),
        Value::Array(items) => !items.is_empty(),
        Value::Object(fields) => !fields.is_empty(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload(value: Value) -> VerifiedPayload {
        match value {
            Value::Object(map) => VerifiedPayload::new(map),
            other => panic!("expected object, got {other}"),
        }
    }

    #[test]
    fn permissions_split_space_delimited_string() {
        let claims = payload(json!({"permissions": "read:products  write:products"}));
        let perms = claims.permissions();
        assert!(perms.contains("read:products"));
        assert!(perms.contains("write:products"));
        assert_eq!(perms.len(), 2);
    }

    #[test]
    fn permissions_from_list_skip_non_strings() {
        let claims = payload(json!({"permissions": ["read:users", 7, null]}));
        assert_eq!(claims.permissions().into_iter().collect::<Vec<_>>(), vec!["read:users"]);
    }

    #[test]
    fn permissions_of_other_shapes_are_empty() {
        assert!(payload(json!({})).permissions().is_empty());
        assert!(payload(json!({"permissions": null})).permissions().is_empty());
        assert!(payload(json!({"permissions": {"read": true}})).permissions().is_empty());
    }

    #[test]
    fn audience_falls_back_to_audience_key() {
        let claims = payload(json!({"audience": "api"}));
        assert_eq!(claims.audience(), Some(&json!("api")));
        let claims = payload(json!({"aud": ["a", "b"], "audience": "api"}));
        assert_eq!(claims.audience(), Some(&json!(["a", "b"])));
    }

    #[test]
    fn event_shape_requires_type_and_user_id() {
        assert!(payload(json!({"type": "user.created", "data": {"user": {"id": "42"}}})).has_event_shape());
        assert!(!payload(json!({"type": "user.created", "data": {"user": {}}})).has_event_shape());
        assert!(!payload(json!({"type": "", "data": {"user": {"id": "42"}}})).has_event_shape());
        assert!(!payload(json!({"data": {"user": {"id": "42"}}})).has_event_shape());
        assert!(!payload(json!({"type": "user.created", "data": "user"})).has_event_shape());
    }

    #[test]
    fn unverified_claims_reads_middle_segment() {
        let body = URL_SAFE_NO_PAD.encode(br#"{"iss":"https://issuer.example","exp":1}"#);
        let token = format!("e30.{body}.sig");
        let claims = unverified_claims(&token);
        assert_eq!(claims.get("iss"), Some(&json!("https://issuer.example")));
    }

    #[test]
    fn unverified_claims_is_empty_for_garbage() {
        assert!(unverified_claims("not-a-token").is_empty());
        assert!(unverified_claims("a.%%%.c").is_empty());
        let array_body = URL_SAFE_NO_PAD.encode(b"[1,2]");
        assert!(unverified_claims(&format!("a.{array_body}.c")).is_empty());
    }
}
