//! Recursive removal of absent values before a document is written.
//!
//! Rust models serialize an unset `Option` as JSON `null`; the store treats
//! those as "absent" and drops them so that a partial update never
//! overwrites a field the caller did not mention.

use serde_json::Value;

/// Controls which values count as absent and which subtrees are opaque.
#[derive(Clone, Copy)]
pub struct StripPolicy {
    is_absent: fn(&Value) -> bool,
    is_opaque: fn(&Value) -> bool,
}

impl StripPolicy {
    pub fn new(is_absent: fn(&Value) -> bool) -> Self {
        Self {
            is_absent,
            is_opaque: |_| false,
        }
    }

    /// Values matching `is_opaque` are kept verbatim and never recursed into
    /// (e.g. a backend's tagged timestamp object).
    pub fn with_opaque(mut self, is_opaque: fn(&Value) -> bool) -> Self {
        self.is_opaque = is_opaque;
        self
    }
}

impl Default for StripPolicy {
    fn default() -> Self {
        Self::new(Value::is_null)
    }
}

impl std::fmt::Debug for StripPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StripPolicy").finish_non_exhaustive()
    }
}

/// Strip absent values from `value` at any depth.
///
/// Returns `None` when `value` itself is absent. Arrays lose their absent
/// elements, objects lose keys whose cleaned value is absent, everything else
/// passes through unchanged.
pub fn strip_absent(value: Value, policy: &StripPolicy) -> Option<Value> {
    if (policy.is_opaque)(&value) {
        return Some(value);
    }
    if (policy.is_absent)(&value) {
        return None;
    }

    match value {
        Value::Array(items) => Some(Value::Array(
            items
                .into_iter()
                .filter_map(|item| strip_absent(item, policy))
                .collect(),
        )),
        Value::Object(map) => Some(Value::Object(
            map.into_iter()
                .filter_map(|(key, item)| strip_absent(item, policy).map(|v| (key, v)))
                .collect(),
        )),
        leaf => Some(leaf),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_strips_nulls_at_every_depth() {
        let input = json!({
            "name": "Lisbon",
            "notes": null,
            "location": {"lat": 38.7, "lng": null, "extra": {"a": null}},
            "tags": ["coast", null, {"k": null, "v": 1}],
        });

        let cleaned = strip_absent(input, &StripPolicy::default()).unwrap();
        assert_eq!(
            cleaned,
            json!({
                "name": "Lisbon",
                "location": {"lat": 38.7, "extra": {}},
                "tags": ["coast", {"v": 1}],
            })
        );
    }

    #[test]
    fn test_top_level_absent_is_none() {
        assert_eq!(strip_absent(Value::Null, &StripPolicy::default()), None);
    }

    #[test]
    fn test_preserves_non_absent_structure() {
        let input = json!({
            "amount": 0,
            "paid": false,
            "label": "",
            "empty": [],
            "nested": [[1, 2], []],
            "createdAt": "2025-01-01T10:00:00.000000Z",
        });

        let cleaned = strip_absent(input.clone(), &StripPolicy::default()).unwrap();
        assert_eq!(cleaned, input);
    }

    #[test]
    fn test_opaque_values_are_not_recursed() {
        fn is_timestamp(value: &Value) -> bool {
            value
                .as_object()
                .map(|map| map.contains_key("$timestamp"))
                .unwrap_or(false)
        }

        let policy = StripPolicy::default().with_opaque(is_timestamp);
        let input = json!({
            "when": {"$timestamp": "2025-01-01T00:00:00Z", "nanos": null},
            "other": {"nanos": null},
        });

        let cleaned = strip_absent(input, &policy).unwrap();
        assert_eq!(
            cleaned,
            json!({
                "when": {"$timestamp": "2025-01-01T00:00:00Z", "nanos": null},
                "other": {},
            })
        );
    }

    #[test]
    fn test_custom_absent_predicate() {
        fn is_blank(value: &Value) -> bool {
            value.is_null() || value.as_str() == Some("")
        }

        let cleaned = strip_absent(
            json!({"a": "", "b": "x", "c": [""]}),
            &StripPolicy::new(is_blank),
        )
        .unwrap();
        assert_eq!(cleaned, json!({"b": "x", "c": []}));
    }
}
