//! RFC 7396 JSON Merge Patch, applied to a canonical payload during replay.

use serde_json::Value;

/// `merge_patch(target, patch)`. Produces a value with no aliasing against
/// either input: every branch owns or clones what it returns.
pub fn merge_patch(target: &Value, patch: &Value) -> Value {
    let Value::Object(patch_obj) = patch else {
        return patch.clone();
    };

    let mut result = match target {
        Value::Object(target_obj) => target_obj.clone(),
        _ => serde_json::Map::new(),
    };

    for (key, patch_value) in patch_obj {
        if patch_value.is_null() {
            result.remove(key);
            continue;
        }

        let merged = match result.get(key) {
            Some(existing) if existing.is_object() && patch_value.is_object() => {
                merge_patch(existing, patch_value)
            }
            _ => patch_value.clone(),
        };
        result.insert(key.clone(), merged);
    }

    Value::Object(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_patch_is_identity() {
        let target = json!({"a": 1, "b": {"c": 2}});
        assert_eq!(merge_patch(&target, &json!({})), target);
    }

    #[test]
    fn null_deletes_key() {
        let target = json!({"a": 1, "b": 2});
        let patch = json!({"b": null});
        assert_eq!(merge_patch(&target, &patch), json!({"a": 1}));
    }

    #[test]
    fn nested_object_recurses() {
        let target = json!({"a": {"x": 1, "y": 2}});
        let patch = json!({"a": {"y": 3, "z": 4}});
        assert_eq!(merge_patch(&target, &patch), json!({"a": {"x": 1, "y": 3, "z": 4}}));
    }

    #[test]
    fn non_object_patch_target_replaces_value() {
        let target = json!({"a": {"x": 1}});
        let patch = json!({"a": "scalar"});
        assert_eq!(merge_patch(&target, &patch), json!({"a": "scalar"}));
    }

    #[test]
    fn non_object_patch_replaces_whole_target() {
        let target = json!({"a": 1});
        let patch = json!("replacement");
        assert_eq!(merge_patch(&target, &patch), json!("replacement"));
    }

    #[test]
    fn non_object_target_with_object_patch_treated_as_empty() {
        let target = json!("scalar");
        let patch = json!({"a": 1});
        assert_eq!(merge_patch(&target, &patch), json!({"a": 1}));
    }

    #[test]
    fn does_not_alias_input_values() {
        let target = json!({"nested": {"k": "v"}});
        let patch = json!({});
        let mut result = merge_patch(&target, &patch);
        result["nested"]["k"] = json!("mutated");
        assert_eq!(target["nested"]["k"], json!("v"));
    }
}
