//! Layered option maps.
//!
//! Options are plain JSON objects. Every node's effective options are the
//! deep merge of its ancestors' options with its own; caller overrides are
//! merged last at execution time.

use serde_json::{Map, Value};

/// Ordered mapping of option key to value.
pub type OptionMap = Map<String, Value>;

/// Deep-merge `overlay` onto `base`, returning a new map.
///
/// Mapping-valued keys present in both are merged recursively; every other
/// value (arrays included) in `overlay` replaces the one in `base`.
pub fn merge(base: &OptionMap, overlay: &OptionMap) -> OptionMap {
    let mut merged = base.clone();
    merge_into(&mut merged, overlay);
    merged
}

/// In-place form of [`merge`].
pub fn merge_into(base: &mut OptionMap, overlay: &OptionMap) {
    for (key, value) in overlay {
        match (base.get_mut(key), value) {
            (Some(Value::Object(existing)), Value::Object(incoming)) => {
                merge_into(existing, incoming);
            }
            _ => {
                base.insert(key.clone(), value.clone());
            }
        }
    }
}

/// Read a string option.
pub fn string_option<'a>(options: &'a OptionMap, key: &str) -> Option<&'a str> {
    options.get(key).and_then(Value::as_str)
}

/// Read a boolean option; anything but `true` counts as false.
pub fn bool_option(options: &OptionMap, key: &str) -> bool {
    options.get(key).and_then(Value::as_bool).unwrap_or(false)
}

/// Read a list of strings. A single string is accepted as a one-element list.
///
/// Returns `Err` with a reason when the value has another shape.
pub fn string_list_option(options: &OptionMap, key: &str) -> Result<Vec<String>, String> {
    match options.get(key) {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::String(s)) => Ok(vec![s.clone()]),
        Some(Value::Array(items)) => items
            .iter()
            .enumerate()
            .map(|(i, item)| {
                item.as_str()
                    .map(str::to_owned)
                    .ok_or_else(|| format!("entry {i} is not a string"))
            })
            .collect(),
        Some(other) => Err(format!("expected a list of strings, found {}", kind_of(other))),
    }
}

/// Short human name for a JSON value's type.
pub fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "a mapping",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn map(value: Value) -> OptionMap {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn later_layer_wins() {
        let merged = merge(&map(json!({"a": 1, "b": 2})), &map(json!({"b": 3})));
        assert_eq!(Value::Object(merged), json!({"a": 1, "b": 3}));
    }

    #[test]
    fn nested_mappings_merge_deeply() {
        let base = map(json!({"data": {"author": "a", "year": 2020}}));
        let over = map(json!({"data": {"year": 2026}}));
        assert_eq!(
            Value::Object(merge(&base, &over)),
            json!({"data": {"author": "a", "year": 2026}})
        );
    }

    #[test]
    fn arrays_are_replaced_not_concatenated() {
        let base = map(json!({"pipeline": ["a", "b"]}));
        let over = map(json!({"pipeline": ["c"]}));
        assert_eq!(merge(&base, &over)["pipeline"], json!(["c"]));
    }

    #[test]
    fn merge_keeps_declaration_order() {
        let merged = merge(&map(json!({"z": 1, "a": 2})), &map(json!({"m": 3, "z": 4})));
        let keys: Vec<_> = merged.keys().cloned().collect();
        assert_eq!(keys, ["z", "a", "m"]);
    }

    #[test]
    fn string_list_accepts_single_string() {
        let opts = map(json!({"src": "*.md"}));
        assert_eq!(string_list_option(&opts, "src").unwrap(), ["*.md"]);
    }

    #[test]
    fn string_list_rejects_non_strings() {
        let opts = map(json!({"pipeline": ["a", 1]}));
        assert!(string_list_option(&opts, "pipeline").is_err());
    }
}
