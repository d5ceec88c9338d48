//! Structural diff and equality over JSON objects.

use serde_json::{Map, Value};

/// Compute the structural difference between two objects.
///
/// The result holds:
/// - keys present only in `left`, with their `left` value
/// - keys present only in `right`, with their `right` value
/// - keys present in both whose values differ: for two nested objects the
///   nested diff (only when non-empty), otherwise the `right` value
pub fn diff(left: &Map<String, Value>, right: &Map<String, Value>) -> Map<String, Value> {
    let mut out = Map::new();

    for (key, left_value) in left {
        let Some(right_value) = right.get(key) else {
            out.insert(key.clone(), left_value.clone());
            continue;
        };

        match (left_value, right_value) {
            (Value::Object(l), Value::Object(r)) => {
                let nested = diff(l, r);
                if !nested.is_empty() {
                    out.insert(key.clone(), Value::Object(nested));
                }
            }
            _ if !values_equal(left_value, right_value) => {
                out.insert(key.clone(), right_value.clone());
            }
            _ => {}
        }
    }

    for (key, right_value) in right {
        if !left.contains_key(key) {
            out.insert(key.clone(), right_value.clone());
        }
    }

    out
}

/// Structural equality: equal iff [`diff`] is empty.
pub fn equal(left: &Map<String, Value>, right: &Map<String, Value>) -> bool {
    left.len() == right.len() && diff(left, right).is_empty()
}

fn values_equal(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Object(l), Value::Object(r)) => equal(l, r),
        (Value::Array(l), Value::Array(r)) => {
            l.len() == r.len() && l.iter().zip(r).all(|(a, b)| values_equal(a, b))
        }
        // 4 and 4.0 are the same number once a document has been through JSON.
        (Value::Number(l), Value::Number(r)) if l.is_f64() || r.is_f64() => {
            l.as_f64() == r.as_f64()
        }
        _ => left == right,
    }
}
