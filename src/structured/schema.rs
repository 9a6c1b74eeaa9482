//! Schema compilation: declarative field lists to provider-ready JSON schemas.

use serde_json::{json, Map, Value};
use tracing::warn;

use crate::structured::validator::OutputValidator;
use crate::types::{OutputShape, PrimitiveType, SchemaDescription};
use crate::{Error, Result};

/// Envelope key for array results (strict providers need an object root).
pub const ARRAY_ENVELOPE_KEY: &str = "elements";
/// Envelope key for enum results.
pub const ENUM_ENVELOPE_KEY: &str = "result";

/// Builder for closed object schemas. Property order is insertion order.
#[derive(Debug, Clone, Default)]
pub struct SchemaGenerator {
    properties: Vec<(String, Value)>,
}

impl SchemaGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a property. A repeated name keeps its first position and takes the new schema.
    pub fn add_property(mut self, name: impl Into<String>, schema: Value) -> Self {
        let name = name.into();
        match self.properties.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = schema,
            None => self.properties.push((name, schema)),
        }
        self
    }

    /// Build an object schema where every property is required and no others are allowed.
    pub fn build(self) -> Value {
        let mut map = Map::new();
        map.insert("type".into(), json!("object"));

        let required: Vec<Value> = self
            .properties
            .iter()
            .map(|(name, _)| Value::String(name.clone()))
            .collect();
        let mut properties = Map::new();
        for (name, schema) in self.properties {
            properties.insert(name, schema);
        }
        map.insert("properties".into(), properties.into());
        map.insert("required".into(), Value::Array(required));
        map.insert("additionalProperties".into(), json!(false));
        map.into()
    }
}

/// JSON schema for one primitive field type. Unknown types map to string.
pub fn schema_from_primitive(primitive: &PrimitiveType) -> Value {
    match primitive {
        PrimitiveType::String | PrimitiveType::Other(_) => json!({"type": "string"}),
        PrimitiveType::Number => json!({"type": "number"}),
        PrimitiveType::Boolean => json!({"type": "boolean"}),
        PrimitiveType::StringList => json!({"type": "array", "items": {"type": "string"}}),
    }
}

/// Compiled request schema for one structured generation.
#[derive(Debug, Clone)]
pub struct CompiledSchema {
    shape: OutputShape,
    schema: Value,
    choices: Vec<String>,
    fallback_fields: Vec<String>,
}

impl CompiledSchema {
    pub fn shape(&self) -> OutputShape {
        self.shape
    }

    /// Schema of the result value itself (object, array of objects, or enum string).
    pub fn schema(&self) -> &Value {
        &self.schema
    }

    /// Allowed values for enum-choice schemas; empty otherwise.
    pub fn choices(&self) -> &[String] {
        &self.choices
    }

    /// Fields whose declared type was not recognised and were compiled as strings.
    pub fn fallback_fields(&self) -> &[String] {
        &self.fallback_fields
    }

    pub fn validator(&self) -> OutputValidator {
        OutputValidator::new(self.schema.clone())
    }

    /// Provider-facing schema: the result schema wrapped in an object root where needed.
    pub fn request_schema(&self) -> Value {
        match self.shape {
            OutputShape::SingleObject => self.schema.clone(),
            OutputShape::ArrayOfObjects => SchemaGenerator::new()
                .add_property(ARRAY_ENVELOPE_KEY, self.schema.clone())
                .build(),
            OutputShape::EnumChoice => SchemaGenerator::new()
                .add_property(ENUM_ENVELOPE_KEY, self.schema.clone())
                .build(),
        }
    }

    /// Strip the envelope added by [`request_schema`](Self::request_schema).
    ///
    /// Values that arrive unwrapped are passed through for the validator to judge.
    pub fn unwrap_response(&self, value: Value) -> Value {
        let key = match self.shape {
            OutputShape::SingleObject => return value,
            OutputShape::ArrayOfObjects => ARRAY_ENVELOPE_KEY,
            OutputShape::EnumChoice => ENUM_ENVELOPE_KEY,
        };
        match value {
            Value::Object(mut map) if map.len() == 1 && map.contains_key(key) => {
                map.remove(key).unwrap_or(Value::Null)
            }
            other => other,
        }
    }

    /// OpenAI-style `response_format` body for this schema.
    pub fn response_format(&self) -> Value {
        json!({
            "type": "json_schema",
            "json_schema": {
                "name": "response",
                "strict": true,
                "schema": self.request_schema()
            }
        })
    }
}

/// Compile a schema description into a request schema.
///
/// Enum descriptions need at least one choice; object and array
/// descriptions always compile, even with no fields.
pub fn compile(desc: &SchemaDescription) -> Result<CompiledSchema> {
    if desc.output_shape == OutputShape::EnumChoice {
        if desc.choices.is_empty() {
            return Err(Error::MissingChoices);
        }
        return Ok(CompiledSchema {
            shape: OutputShape::EnumChoice,
            schema: json!({"type": "string", "enum": desc.choices}),
            choices: desc.choices.clone(),
            fallback_fields: Vec::new(),
        });
    }

    let mut generator = SchemaGenerator::new();
    let mut fallback_fields = Vec::new();
    for field in &desc.fields {
        if let PrimitiveType::Other(type_name) = &field.primitive_type {
            warn!(
                field = %field.name,
                declared_type = %type_name,
                "unknown field type, compiling as string"
            );
            fallback_fields.push(field.name.clone());
        }
        let mut field_schema = schema_from_primitive(&field.primitive_type);
        if let Some(description) = &field.description {
            field_schema["description"] = Value::String(description.clone());
        }
        generator = generator.add_property(field.name.clone(), field_schema);
    }
    let object = generator.build();

    let schema = match desc.output_shape {
        OutputShape::ArrayOfObjects => json!({"type": "array", "items": object}),
        _ => object,
    };

    Ok(CompiledSchema {
        shape: desc.output_shape,
        schema,
        choices: Vec::new(),
        fallback_fields,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FieldSpec;

    fn title_and_count() -> SchemaDescription {
        SchemaDescription::object(vec![
            FieldSpec::new("title", PrimitiveType::String),
            FieldSpec::new("count", PrimitiveType::Number),
        ])
    }

    #[test]
    fn test_enum_without_choices_is_rejected() {
        let err = compile(&SchemaDescription::choice(Vec::<String>::new())).unwrap_err();
        assert!(matches!(err, Error::MissingChoices));
    }

    #[test]
    fn test_single_object_accepts_and_rejects() {
        let compiled = compile(&title_and_count()).unwrap();
        let validator = compiled.validator();

        assert!(validator.validate(&json!({"title": "x", "count": 3})).is_valid());
        assert!(!validator.validate(&json!({"title": 3, "count": 3})).is_valid());
    }

    #[test]
    fn test_field_order_and_names_preserved() {
        let desc = SchemaDescription::object(vec![
            FieldSpec::new("zeta", PrimitiveType::Boolean),
            FieldSpec::new("Alpha Field", PrimitiveType::StringList),
            FieldSpec::new("mid", PrimitiveType::Number).described("a number"),
        ]);
        let compiled = compile(&desc).unwrap();
        let keys: Vec<&String> = compiled.schema()["properties"]
            .as_object()
            .unwrap()
            .keys()
            .collect();
        assert_eq!(keys, vec!["zeta", "Alpha Field", "mid"]);
        assert_eq!(compiled.schema()["required"], json!(["zeta", "Alpha Field", "mid"]));
        assert_eq!(
            compiled.schema()["properties"]["Alpha Field"],
            json!({"type": "array", "items": {"type": "string"}})
        );
        assert_eq!(compiled.schema()["properties"]["mid"]["description"], "a number");
    }

    #[test]
    fn test_unknown_type_falls_back_to_string() {
        let desc = SchemaDescription::object(vec![
            FieldSpec::new("when", PrimitiveType::Other("date".into())),
            FieldSpec::new("ok", PrimitiveType::Boolean),
        ]);
        let compiled = compile(&desc).unwrap();
        assert_eq!(compiled.fallback_fields(), ["when".to_string()]);
        assert_eq!(compiled.schema()["properties"]["when"]["type"], "string");
    }

    #[test]
    fn test_empty_fields_compile_permissively() {
        let compiled = compile(&SchemaDescription::array(vec![])).unwrap();
        assert_eq!(compiled.schema()["type"], "array");
        assert!(compiled.validator().validate(&json!([{}, {}])).is_valid());

        let compiled = compile(&SchemaDescription::object(vec![])).unwrap();
        assert!(compiled.validator().validate(&json!({})).is_valid());
    }

    #[test]
    fn test_array_envelope() {
        let compiled = compile(&SchemaDescription::array(vec![FieldSpec::new(
            "a",
            PrimitiveType::Number,
        )]))
        .unwrap();

        let request = compiled.request_schema();
        assert_eq!(request["type"], "object");
        assert_eq!(request["properties"]["elements"]["type"], "array");

        let unwrapped = compiled.unwrap_response(json!({"elements": [{"a": 1}]}));
        assert_eq!(unwrapped, json!([{"a": 1}]));
        assert_eq!(compiled.unwrap_response(json!([{"a": 2}])), json!([{"a": 2}]));
    }

    #[test]
    fn test_enum_envelope_and_format() {
        let compiled = compile(&SchemaDescription::choice(["positive", "negative"])).unwrap();
        assert_eq!(compiled.choices(), ["positive", "negative"]);
        assert_eq!(compiled.unwrap_response(json!({"result": "negative"})), json!("negative"));

        let format = compiled.response_format();
        assert_eq!(format["type"], "json_schema");
        assert_eq!(format["json_schema"]["strict"], true);
        assert_eq!(
            format["json_schema"]["schema"]["properties"]["result"]["enum"],
            json!(["positive", "negative"])
        );
    }

    #[test]
    fn test_duplicate_field_keeps_first_position() {
        let generator = SchemaGenerator::new()
            .add_property("a", json!({"type": "string"}))
            .add_property("b", json!({"type": "string"}))
            .add_property("a", json!({"type": "number"}));
        let schema = generator.build();
        let keys: Vec<&String> = schema["properties"].as_object().unwrap().keys().collect();
        assert_eq!(keys, vec!["a", "b"]);
        assert_eq!(schema["properties"]["a"]["type"], "number");
        assert_eq!(schema["required"], json!(["a", "b"]));
    }
}
