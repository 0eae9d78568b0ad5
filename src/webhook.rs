//! Inbound release webhook payload

use serde_json::{Number, Value};
use tracing::warn;

/// Release event as received from the platform.
///
/// Every accessor is null-safe: a missing intermediate object, a field of the
/// wrong JSON type, or an unparsable body all read as `None`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InboundEvent {
    payload: Value,
}

impl InboundEvent {
    /// Parse the raw request body.
    ///
    /// Never fails: a body that is not a JSON object yields an empty event,
    /// which no filter will ever consider relevant.
    pub fn parse(raw_body: &[u8]) -> Self {
        match serde_json::from_slice::<Value>(raw_body) {
            Ok(payload @ Value::Object(_)) => Self { payload },
            Ok(other) => {
                warn!(kind = json_kind(&other), "Webhook body is not a JSON object");
                Self::default()
            }
            Err(e) => {
                warn!(error = %e, "Could not parse webhook body");
                Self::default()
            }
        }
    }

    /// Lookup of a nested value, short-circuiting to `None` on the first gap.
    fn dig(&self, path: &[&str]) -> Option<&Value> {
        path.iter()
            .try_fold(&self.payload, |value, key| value.get(*key))
            .filter(|value| !value.is_null())
    }

    fn dig_str(&self, path: &[&str]) -> Option<&str> {
        self.dig(path).and_then(Value::as_str)
    }

    pub fn action(&self) -> Option<&str> {
        self.dig_str(&["action"])
    }

    pub fn status(&self) -> Option<&str> {
        self.dig_str(&["data", "status"])
    }

    pub fn is_current(&self) -> Option<bool> {
        self.dig(&["data", "current"]).and_then(Value::as_bool)
    }

    pub fn app_name(&self) -> Option<&str> {
        self.dig_str(&["data", "app", "name"])
    }

    pub fn app_id(&self) -> Option<&str> {
        self.dig_str(&["data", "app", "id"])
    }

    pub fn commit(&self) -> Option<&str> {
        self.dig_str(&["data", "slug", "commit"])
    }

    pub fn commit_description(&self) -> Option<&str> {
        self.dig_str(&["data", "slug", "commit_description"])
    }

    /// Release version, passed through as sent. A numeric string is
    /// tolerated and read as the number it spells.
    pub fn version(&self) -> Option<Number> {
        match self.dig(&["data", "version"])? {
            Value::Number(n) => Some(n.clone()),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn actor_email(&self) -> Option<&str> {
        self.dig_str(&["actor", "email"])
    }

    /// True only for the terminal transition of a release: an `update`
    /// action on the current release whose status reached `succeeded`.
    ///
    /// Phase-start events, superseded releases and failures are all ignored,
    /// so replays and out-of-order deliveries need no sequencing state.
    pub fn is_release_finished(&self) -> bool {
        self.status() == Some("succeeded")
            && self.action() == Some("update")
            && self.is_current() == Some(true)
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn event(value: Value) -> InboundEvent {
        InboundEvent::parse(value.to_string().as_bytes())
    }

    fn release(action: &str, status: &str, current: bool) -> InboundEvent {
        event(json!({
            "action": action,
            "actor": { "email": "jane@example.com" },
            "data": {
                "app": { "id": "0e2a3f5c-1111-4b3c-9d7e-9b0d7a7a0001", "name": "sample-app" },
                "current": current,
                "slug": {
                    "commit": "48AKJH48758769671293ALFKJHL",
                    "commit_description": "  * jane: sample commit message"
                },
                "status": status,
                "version": 42
            }
        }))
    }

    #[test]
    fn reads_nested_fields() {
        let e = release("update", "succeeded", true);
        assert_eq!(e.action(), Some("update"));
        assert_eq!(e.status(), Some("succeeded"));
        assert_eq!(e.is_current(), Some(true));
        assert_eq!(e.app_name(), Some("sample-app"));
        assert_eq!(e.app_id(), Some("0e2a3f5c-1111-4b3c-9d7e-9b0d7a7a0001"));
        assert_eq!(e.commit(), Some("48AKJH48758769671293ALFKJHL"));
        assert_eq!(
            e.commit_description(),
            Some("  * jane: sample commit message")
        );
        assert_eq!(e.version(), Some(Number::from(42)));
        assert_eq!(e.actor_email(), Some("jane@example.com"));
    }

    #[test]
    fn malformed_body_is_empty_event() {
        let bodies: [&[u8]; 6] = [
            b"not json",
            b"",
            b"{\"action\":",
            b"[1,2,3]",
            b"\"update\"",
            b"null",
        ];
        for body in bodies {
            let e = InboundEvent::parse(body);
            assert_eq!(e, InboundEvent::default());
            assert_eq!(e.action(), None);
            assert_eq!(e.commit(), None);
            assert!(!e.is_release_finished());
        }
    }

    #[test]
    fn missing_intermediate_objects_read_as_none() {
        let e = event(json!({ "action": "update", "data": { "slug": null, "app": "oops" } }));
        assert_eq!(e.commit(), None);
        assert_eq!(e.app_name(), None);
        assert_eq!(e.actor_email(), None);
        assert_eq!(e.version(), None);
    }

    #[test]
    fn version_accepts_numeric_string() {
        let e = event(json!({ "data": { "version": " 7 " } }));
        assert_eq!(e.version(), Some(Number::from(7)));
        let e = event(json!({ "data": { "version": "v7" } }));
        assert_eq!(e.version(), None);
    }

    #[test]
    fn version_is_passed_through_unchanged() {
        let e = event(json!({ "data": { "version": -3 } }));
        assert_eq!(e.version(), Some(Number::from(-3)));
        let e = event(json!({ "data": { "version": 1.5 } }));
        assert_eq!(e.version().map(|n| n.to_string()), Some("1.5".to_string()));
    }

    #[test]
    fn only_finished_current_release_is_relevant() {
        assert!(release("update", "succeeded", true).is_release_finished());

        assert!(!release("create", "succeeded", true).is_release_finished());
        assert!(!release("create", "pending", true).is_release_finished());
        assert!(!release("update", "succeeded", false).is_release_finished());
        assert!(!release("update", "failed", true).is_release_finished());
        assert!(!release("update", "pending", false).is_release_finished());
    }

    #[test]
    fn current_must_be_boolean_true() {
        let e = event(json!({
            "action": "update",
            "data": { "status": "succeeded", "current": "true" }
        }));
        assert!(!e.is_release_finished());
    }
}
