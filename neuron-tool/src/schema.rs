//! Minimal JSON-Schema-like parameter validation (§4.4, §6).
//!
//! Only the subset the tool declaration format (§6) actually uses:
//! `{"type": "object", "properties": {...}, "required": [...]}` with
//! per-property `"type"` one of `string|integer|number|boolean|object|array`.
//! Anything outside that shape is accepted unvalidated — this is a guard
//! against obviously-wrong calls, not a full JSON Schema implementation.

/// Validate `params` against `schema`. Returns `Ok(())` if `params` conforms,
/// or `Err(reason)` describing the first violation found.
///
/// Pure: identical `(schema, params)` always produces the same verdict
/// (§8 "Determinism of parameter validation").
pub fn validate(schema: &serde_json::Value, params: &serde_json::Value) -> Result<(), String> {
    let Some(obj) = schema.as_object() else {
        return Ok(());
    };
    if obj.get("type").and_then(|t| t.as_str()) != Some("object") {
        return Ok(());
    }

    let params_obj = match params.as_object() {
        Some(o) => o,
        None => return Err("params must be a JSON object".to_string()),
    };

    if let Some(required) = obj.get("required").and_then(|r| r.as_array()) {
        for name in required {
            let Some(name) = name.as_str() else { continue };
            if !params_obj.contains_key(name) {
                return Err(format!("missing required field: {name}"));
            }
        }
    }

    if let Some(properties) = obj.get("properties").and_then(|p| p.as_object()) {
        for (name, value) in params_obj {
            let Some(prop_schema) = properties.get(name) else {
                continue;
            };
            let Some(expected_type) = prop_schema.get("type").and_then(|t| t.as_str()) else {
                continue;
            };
            if !matches_type(expected_type, value) {
                return Err(format!(
                    "field {name} expected type {expected_type}, got {}",
                    type_name(value)
                ));
            }
        }
    }

    Ok(())
}

fn matches_type(expected: &str, value: &serde_json::Value) -> bool {
    match expected {
        "string" => value.is_string(),
        "integer" | "int" => value.is_i64() || value.is_u64(),
        "float" | "number" => value.is_number(),
        "bool" | "boolean" => value.is_boolean(),
        "object" => value.is_object(),
        "array" => value.is_array(),
        _ => true,
    }
}

fn type_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "bool",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
