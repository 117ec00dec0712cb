use crate::spec::ResultShape;
use serde_json::{Map, Value};

const MAX_DEPTH: usize = 8;

/// Fixed response body of a generated stub.
///
/// The response example wins when the document has one; otherwise a value is
/// synthesized from the schema.
#[must_use]
pub fn stub_value(shape: &ResultShape) -> Value {
    if let Some(example) = &shape.example {
        return example.clone();
    }
    shape
        .schema
        .as_ref()
        .map(|s| value_for_schema(s, 0))
        .unwrap_or(Value::Null)
}

fn primary_type(schema: &Value) -> Option<&str> {
    match schema.get("type") {
        Some(Value::String(t)) => Some(t.as_str()),
        // OpenAPI 3.1 allows `type: [string, "null"]`
        Some(Value::Array(types)) => types
            .iter()
            .filter_map(Value::as_str)
            .find(|t| *t != "null")
            .or(Some("null")),
        _ => None,
    }
}

/// Placeholder value for a JSON schema
///
/// Arrays are empty, objects carry only their required properties, scalars get a
/// recognisable dummy (`"example"`, `42`, `1.5`, `true`).
#[must_use]
pub fn value_for_schema(schema: &Value, depth: usize) -> Value {
    if depth > MAX_DEPTH {
        return Value::Null;
    }
    let Some(obj) = schema.as_object() else {
        return Value::Null;
    };

    if let Some(v) = obj.get("example").or_else(|| obj.get("default")) {
        return v.clone();
    }
    if let Some(first) = obj.get("enum").and_then(Value::as_array).and_then(|e| e.first()) {
        return first.clone();
    }
    if let Some(v) = obj.get("const") {
        return v.clone();
    }
    for key in ["oneOf", "anyOf"] {
        if let Some(first) = obj.get(key).and_then(Value::as_array).and_then(|a| a.first()) {
            return value_for_schema(first, depth + 1);
        }
    }
    if let Some(parts) = obj.get("allOf").and_then(Value::as_array) {
        let mut merged = Map::new();
        for part in parts {
            match value_for_schema(part, depth + 1) {
                Value::Object(m) => merged.extend(m),
                Value::Null => {}
                other => return other,
            }
        }
        return Value::Object(merged);
    }

    match primary_type(schema) {
        Some("array") => Value::Array(Vec::new()),
        Some("string") => Value::String("example".to_string()),
        Some("integer") => Value::from(42),
        Some("number") => Value::from(1.5),
        Some("boolean") => Value::Bool(true),
        Some("null") => Value::Null,
        Some("object") => object_value(obj, depth),
        None if obj.contains_key("properties") => object_value(obj, depth),
        _ => Value::Null,
    }
}

fn object_value(obj: &Map<String, Value>, depth: usize) -> Value {
    let required: Vec<&str> = obj
        .get("required")
        .and_then(Value::as_array)
        .map(|arr| arr.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default();

    let mut out = Map::new();
    if let Some(props) = obj.get("properties").and_then(Value::as_object) {
        for (name, prop) in props {
            if required.contains(&name.as_str()) {
                out.insert(name.clone(), value_for_schema(prop, depth + 1));
            }
        }
    }
    Value::Object(out)
}
