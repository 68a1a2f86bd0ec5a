use serde_json::{Map, Value};

pub const DEFAULT_SEPARATOR: &str = "_";

/// Flattens nested objects and arrays into one level of scalar fields.
///
/// Object keys are joined with `_`, array elements use their zero-based
/// index as a key segment. Objects inside arrays are flattened further; any
/// other element, a nested array included, is kept whole at its indexed key.
/// Output order follows input iteration order. Empty objects and arrays
/// produce no fields.
///
/// ```
/// use profile_enricher::core::flatten::flatten;
/// use serde_json::json;
///
/// let nested = json!({"a": {"b": 1}, "c": [1, {"d": 2}]});
/// let flat = flatten(nested.as_object().unwrap());
/// assert_eq!(serde_json::Value::Object(flat), json!({"a_b": 1, "c_0": 1, "c_1_d": 2}));
/// ```
pub fn flatten(map: &Map<String, Value>) -> Map<String, Value> {
    flatten_with_separator(map, DEFAULT_SEPARATOR)
}

pub fn flatten_with_separator(map: &Map<String, Value>, separator: &str) -> Map<String, Value> {
    let mut out = Map::new();
    flatten_object(map, None, separator, &mut out);
    out
}

fn flatten_object(
    map: &Map<String, Value>,
    prefix: Option<&str>,
    separator: &str,
    out: &mut Map<String, Value>,
) {
    for (key, value) in map {
        let full_key = match prefix {
            Some(prefix) => format!("{}{}{}", prefix, separator, key),
            None => key.clone(),
        };
        flatten_value(value, full_key, separator, out);
    }
}

fn flatten_value(value: &Value, key: String, separator: &str, out: &mut Map<String, Value>) {
    match value {
        Value::Object(nested) => flatten_object(nested, Some(key.as_str()), separator, out),
        Value::Array(items) => {
            for (index, item) in items.iter().enumerate() {
                let item_key = format!("{}{}{}", key, separator, index);
                match item {
                    Value::Object(nested) => {
                        flatten_object(nested, Some(item_key.as_str()), separator, out)
                    }
                    leaf => {
                        out.insert(item_key, leaf.clone());
                    }
                }
            }
        }
        scalar => {
            out.insert(key, scalar.clone());
        }
    }
}

/// Renders a flattened value as a table cell. Null becomes an empty cell,
/// a nested array its JSON text.
pub fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        nested => nested.to_string(),
    }
}
