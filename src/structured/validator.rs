//! Output validator for structured responses.
//!
//! Checks generated values against the JSON-schema subset the compiler emits:
//! - Primitive types (string, number, boolean, array, object)
//! - Required properties and `additionalProperties: false`
//! - Array `items`
//! - `enum` membership

use crate::structured::error::{ValidationError, ValidationResult};
use serde_json::Value;

/// Validator for structured output.
#[derive(Debug, Clone)]
pub struct OutputValidator {
    schema: Value,
}

impl OutputValidator {
    pub fn new(schema: Value) -> Self {
        Self { schema }
    }

    pub fn schema(&self) -> &Value {
        &self.schema
    }

    /// Validate a value, collecting every violation.
    pub fn validate(&self, data: &Value) -> ValidationResult {
        let mut errors = Vec::new();
        self.check(data, &self.schema, "$", &mut errors);
        if errors.is_empty() {
            ValidationResult::success(data.clone())
        } else {
            ValidationResult::failure(errors)
        }
    }

    fn check(&self, data: &Value, schema: &Value, path: &str, errors: &mut Vec<ValidationError>) {
        if let Some(expected) = schema.get("type").and_then(|t| t.as_str()) {
            if let Err(e) = check_type(data, expected, path) {
                errors.push(e);
                return;
            }
        }

        match data {
            Value::Array(items) => {
                if let Some(item_schema) = schema.get("items") {
                    for (i, item) in items.iter().enumerate() {
                        self.check(item, item_schema, &format!("{}[{}]", path, i), errors);
                    }
                }
            }
            Value::Object(_) => self.check_object(data, schema, path, errors),
            _ => {}
        }

        if let Some(allowed) = schema.get("enum").and_then(|e| e.as_array()) {
            if !allowed.contains(data) {
                let listed: Vec<String> = allowed.iter().map(|v| v.to_string()).collect();
                errors.push(ValidationError::with_path(
                    format!("Value not in allowed enum values: {}", listed.join(", ")),
                    path.to_string(),
                ));
            }
        }
    }

    fn check_object(
        &self,
        data: &Value,
        schema: &Value,
        path: &str,
        errors: &mut Vec<ValidationError>,
    ) {
        let Some(obj) = data.as_object() else {
            return;
        };
        let properties = schema.get("properties").and_then(|p| p.as_object());

        if let Some(required) = schema.get("required").and_then(|r| r.as_array()) {
            for name in required.iter().filter_map(|v| v.as_str()) {
                if !obj.contains_key(name) {
                    errors.push(ValidationError::with_path(
                        format!("Missing required property: {}", name),
                        format!("{}.{}", path, name),
                    ));
                }
            }
        }

        if let Some(properties) = properties {
            for (name, prop_schema) in properties {
                if let Some(value) = obj.get(name) {
                    self.check(value, prop_schema, &format!("{}.{}", path, name), errors);
                }
            }
        }

        let closed = schema
            .get("additionalProperties")
            .and_then(|a| a.as_bool())
            .map(|allowed| !allowed)
            .unwrap_or(false);
        if closed {
            for key in obj.keys() {
                let declared = properties.map(|p| p.contains_key(key)).unwrap_or(false);
                if !declared {
                    errors.push(ValidationError::with_path(
                        format!("Additional property not allowed: {}", key),
                        format!("{}.{}", path, key),
                    ));
                }
            }
        }
    }
}

fn type_name(data: &Value) -> &'static str {
    match data {
        Value::String(_) => "string",
        Value::Number(_) => "number",
        Value::Bool(_) => "boolean",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
        Value::Null => "null",
    }
}

fn check_type(data: &Value, expected: &str, path: &str) -> Result<(), ValidationError> {
    let ok = match expected {
        "string" => data.is_string(),
        "number" => data.is_number(),
        "integer" => data.is_i64() || data.is_u64(),
        "boolean" => data.is_boolean(),
        "array" => data.is_array(),
        "object" => data.is_object(),
        "null" => data.is_null(),
        _ => true,
    };
    if ok {
        Ok(())
    } else {
        Err(ValidationError::with_path(
            format!("Expected type '{}', got '{}'", expected, type_name(data)),
            path.to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn article_schema() -> Value {
        json!({
            "type": "object",
            "properties": {
                "title": {"type": "string"},
                "tags": {"type": "array", "items": {"type": "string"}}
            },
            "required": ["title", "tags"],
            "additionalProperties": false
        })
    }

    #[test]
    fn test_accepts_conforming_object() {
        let validator = OutputValidator::new(article_schema());
        let result = validator.validate(&json!({"title": "Rust", "tags": ["systems"]}));
        assert!(result.is_valid());
        assert_eq!(result.data().unwrap()["title"], "Rust");
    }

    #[test]
    fn test_reports_every_violation_with_paths() {
        let validator = OutputValidator::new(article_schema());
        let result = validator.validate(&json!({"tags": ["ok", 7], "extra": true}));

        let messages = result.error_messages();
        assert_eq!(messages.len(), 3);
        assert!(messages.contains(&"$.title: Missing required property: title".to_string()));
        assert!(messages.contains(&"$.tags[1]: Expected type 'string', got 'number'".to_string()));
        assert!(messages.contains(&"$.extra: Additional property not allowed: extra".to_string()));
    }

    #[test]
    fn test_array_items_are_checked() {
        let validator = OutputValidator::new(json!({"type": "array", "items": article_schema()}));
        let result = validator.validate(&json!([
            {"title": "a", "tags": []},
            {"title": 2, "tags": []}
        ]));
        assert_eq!(
            result.error_messages(),
            vec!["$[1].title: Expected type 'string', got 'number'".to_string()]
        );
    }

    #[test]
    fn test_enum_membership() {
        let validator = OutputValidator::new(json!({"type": "string", "enum": ["yes", "no"]}));
        assert!(validator.validate(&json!("yes")).is_valid());

        let result = validator.validate(&json!("maybe"));
        assert!(result.error_messages()[0].contains("not in allowed enum"));
    }

    #[test]
    fn test_type_mismatch_stops_descent() {
        let validator = OutputValidator::new(article_schema());
        let result = validator.validate(&json!(["not", "an", "object"]));
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].path.as_deref(), Some("$"));
    }
}
