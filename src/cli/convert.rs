//! JSON <-> cohql Value conversion utilities

use rust_decimal::prelude::ToPrimitive;

use crate::{Value, statement::StatementResult};

/// Convert serde_json::Value to a cohql Value
pub fn json_to_value(v: serde_json::Value) -> Value {
    match v {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(b) => Value::Boolean(b),
        serde_json::Value::Number(n) => match n.as_i64() {
            Some(i) => Value::Integer(i),
            None => n.as_f64().map(Value::Float).unwrap_or(Value::Null),
        },
        serde_json::Value::String(s) => Value::String(s),
        serde_json::Value::Array(arr) => Value::Array(arr.into_iter().map(json_to_value).collect()),
        serde_json::Value::Object(obj) => {
            Value::Object(obj.into_iter().map(|(k, v)| (k, json_to_value(v))).collect())
        }
    }
}

/// Convert a cohql Value to serde_json::Value
pub fn value_to_json(v: Value) -> serde_json::Value {
    let float = |f: f64| {
        serde_json::Number::from_f64(f)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null)
    };
    match v {
        Value::Null => serde_json::Value::Null,
        Value::Boolean(b) => serde_json::Value::Bool(b),
        Value::Integer(i) => serde_json::Value::Number(i.into()),
        Value::Float(f) => float(f),
        Value::Decimal(d) => d.to_f64().map(float).unwrap_or(serde_json::Value::Null),
        Value::String(s) => serde_json::Value::String(s),
        Value::Array(arr) => serde_json::Value::Array(arr.into_iter().map(value_to_json).collect()),
        Value::Object(obj) => {
            serde_json::Value::Object(obj.into_iter().map(|(k, v)| (k, value_to_json(v))).collect())
        }
    }
}

/// Render a statement result: rows as an array, counts as
/// `{"affected": n}`, messages as strings.
pub fn result_to_json(result: StatementResult) -> serde_json::Value {
    match result {
        StatementResult::Rows(rows) => serde_json::Value::Array(rows.into_iter().map(value_to_json).collect()),
        StatementResult::Affected(n) => serde_json::json!({ "affected": n }),
        StatementResult::Message(message) => serde_json::Value::String(message),
        StatementResult::Batch(results) => {
            serde_json::Value::Array(results.into_iter().map(result_to_json).collect())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_object_converts_both_ways() {
        let json = serde_json::json!({ "name": "Ann", "age": 31, "tags": ["a", null] });
        let value = json_to_value(json.clone());
        assert_eq!(value.property("age"), Value::Integer(31));
        assert_eq!(value_to_json(value), json);
    }

    #[test]
    fn test_affected_renders_as_object() {
        assert_eq!(
            result_to_json(StatementResult::Affected(2)),
            serde_json::json!({ "affected": 2 })
        );
    }
}
