//! Deterministic JSON serialization and content hashing.
//!
//! Two JSON values that differ only by object-key order or insignificant
//! whitespace canonicalize to identical bytes, so `content_hash` can serve
//! as a stable de-duplication anchor for the idempotency ledger.

use serde_json::Value;
use sha2::{Digest, Sha256};

/// Recursively sorts object keys so serialization is order-independent.
/// Arrays keep their order — only keys are normalized.
pub fn canonicalize(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<_> = map.iter().collect();
            entries.sort_by(|(a, _), (b, _)| a.cmp(b));
            let sorted = entries
                .into_iter()
                .map(|(k, v)| (k.clone(), canonicalize(v)))
                .collect();
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.iter().map(canonicalize).collect()),
        other => other.clone(),
    }
}

/// Lowercase hex SHA-256 over the canonical, compact serialization of `value`.
pub fn content_hash(value: &Value) -> String {
    let canonical = canonicalize(value);
    let bytes = serde_json::to_vec(&canonical).expect("serde_json::Value always serializes");
    let digest = Sha256::digest(&bytes);
    format!("{:x}", digest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn key_order_does_not_affect_hash() {
        let a = json!({"a": 1, "b": 2});
        let b = json!({"b": 2, "a": 1});
        assert_eq!(content_hash(&a), content_hash(&b));
    }

    #[test]
    fn nested_key_order_does_not_affect_hash() {
        let a = json!({"outer": {"a": 1, "b": 2}, "z": true});
        let b = json!({"z": true, "outer": {"b": 2, "a": 1}});
        assert_eq!(content_hash(&a), content_hash(&b));
    }

    #[test]
    fn different_values_hash_differently() {
        let a = json!({"a": 1});
        let b = json!({"a": 2});
        assert_ne!(content_hash(&a), content_hash(&b));
    }

    #[test]
    fn array_order_is_preserved_and_significant() {
        let a = json!({"xs": [1, 2, 3]});
        let b = json!({"xs": [3, 2, 1]});
        assert_ne!(content_hash(&a), content_hash(&b));
    }

    #[test]
    fn canonicalize_preserves_non_ascii() {
        let v = json!({"name": "caf\u{00e9}"});
        let c = canonicalize(&v);
        assert_eq!(c["name"], "caf\u{00e9}");
    }
}
