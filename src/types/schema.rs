//! Declarative schema descriptions authored alongside Generate blocks.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Structural shape of a structured generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum OutputShape {
    #[default]
    #[serde(rename = "single-object", alias = "object")]
    SingleObject,
    #[serde(rename = "array-of-objects", alias = "array")]
    ArrayOfObjects,
    #[serde(rename = "enum-choice", alias = "enum")]
    EnumChoice,
}

impl OutputShape {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputShape::SingleObject => "single-object",
            OutputShape::ArrayOfObjects => "array-of-objects",
            OutputShape::EnumChoice => "enum-choice",
        }
    }
}

impl fmt::Display for OutputShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Field type. Names outside the known set are kept verbatim in `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum PrimitiveType {
    #[default]
    String,
    Number,
    Boolean,
    StringList,
    Other(String),
}

impl PrimitiveType {
    pub fn as_str(&self) -> &str {
        match self {
            PrimitiveType::String => "string",
            PrimitiveType::Number => "number",
            PrimitiveType::Boolean => "boolean",
            PrimitiveType::StringList => "string-list",
            PrimitiveType::Other(name) => name,
        }
    }

    /// Parse a wire type name; unknown names are preserved rather than rejected.
    pub fn from_name(name: &str) -> Self {
        match name {
            "string" => PrimitiveType::String,
            "number" => PrimitiveType::Number,
            "boolean" => PrimitiveType::Boolean,
            "string-list" | "string[]" => PrimitiveType::StringList,
            other => PrimitiveType::Other(other.to_string()),
        }
    }
}

impl std::str::FromStr for PrimitiveType {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from_name(s))
    }
}

impl fmt::Display for PrimitiveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for PrimitiveType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for PrimitiveType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(PrimitiveType::from_name(&raw))
    }
}

/// One field of an object-shaped schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldSpec {
    pub name: String,
    #[serde(alias = "type")]
    pub primitive_type: PrimitiveType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl FieldSpec {
    pub fn new(name: impl Into<String>, primitive_type: PrimitiveType) -> Self {
        Self {
            name: name.into(),
            primitive_type,
            description: None,
        }
    }

    pub fn described(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Declarative shape request.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaDescription {
    #[serde(default, alias = "outputType")]
    pub output_shape: OutputShape,
    #[serde(default, alias = "properties")]
    pub fields: Vec<FieldSpec>,
    #[serde(default, alias = "enumValues")]
    pub choices: Vec<String>,
}

impl SchemaDescription {
    pub fn object(fields: Vec<FieldSpec>) -> Self {
        Self {
            output_shape: OutputShape::SingleObject,
            fields,
            choices: Vec::new(),
        }
    }

    pub fn array(fields: Vec<FieldSpec>) -> Self {
        Self {
            output_shape: OutputShape::ArrayOfObjects,
            fields,
            choices: Vec::new(),
        }
    }

    pub fn choice<I, S>(choices: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            output_shape: OutputShape::EnumChoice,
            fields: Vec::new(),
            choices: choices.into_iter().map(Into::into).collect(),
        }
    }
}
