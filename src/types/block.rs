//! Block model: identifiers, settings and execution results.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::schema::SchemaDescription;

/// Display text of a failed generation, as seen by downstream templates.
pub const FAILURE_MARKER: &str = "Error executing block";

pub const DEFAULT_TEMPERATURE: f64 = 0.7;
pub const DEFAULT_MAX_TOKENS: u32 = 1000;

/// Opaque block identifier, stable for the block's lifetime.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlockId(String);

impl BlockId {
    pub fn generate() -> Self {
        Self(format!("block-{}", uuid::Uuid::new_v4()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for BlockId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for BlockId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Block kind (closed set).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BlockKind {
    #[serde(alias = "input")]
    Input,
    #[serde(alias = "generate")]
    Generate,
}

impl BlockKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BlockKind::Input => "Input",
            BlockKind::Generate => "Generate",
        }
    }
}

impl fmt::Display for BlockKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether a Generate block asks for free text or a structured value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GenerationShape {
    #[default]
    Text,
    Object,
}

/// Generation configuration carried by every block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockSettings {
    /// Template string (Generate only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
    /// Literal value (Input only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<String>,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default, alias = "generateType")]
    pub generation_shape: GenerationShape,
    #[serde(
        default,
        alias = "schemaDefinition",
        skip_serializing_if = "Option::is_none"
    )]
    pub schema: Option<SchemaDescription>,
}

fn default_temperature() -> f64 {
    DEFAULT_TEMPERATURE
}

fn default_max_tokens() -> u32 {
    DEFAULT_MAX_TOKENS
}

impl Default for BlockSettings {
    fn default() -> Self {
        Self {
            prompt: None,
            input: None,
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
            generation_shape: GenerationShape::Text,
            schema: None,
        }
    }
}

impl BlockSettings {
    /// Merge a partial update; fields absent from the patch are left untouched.
    pub fn apply(&mut self, patch: &SettingsPatch) {
        if let Some(prompt) = &patch.prompt {
            self.prompt = Some(prompt.clone());
        }
        if let Some(input) = &patch.input {
            self.input = Some(input.clone());
        }
        if let Some(t) = patch.temperature {
            self.temperature = t;
        }
        if let Some(m) = patch.max_tokens {
            self.max_tokens = m.max(1);
        }
        if let Some(shape) = patch.generation_shape {
            self.generation_shape = shape;
        }
        if let Some(schema) = &patch.schema {
            self.schema = Some(schema.clone());
        }
    }
}

/// Partial settings update.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsPatch {
    #[serde(default)]
    pub prompt: Option<String>,
    #[serde(default)]
    pub input: Option<String>,
    #[serde(default)]
    pub temperature: Option<f64>,
    #[serde(default)]
    pub max_tokens: Option<u32>,
    #[serde(default)]
    pub generation_shape: Option<GenerationShape>,
    #[serde(default)]
    pub schema: Option<SchemaDescription>,
}

impl SettingsPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = Some(prompt.into());
        self
    }

    pub fn input(mut self, input: impl Into<String>) -> Self {
        self.input = Some(input.into());
        self
    }

    pub fn temperature(mut self, temp: f64) -> Self {
        self.temperature = Some(temp);
        self
    }

    pub fn max_tokens(mut self, max: u32) -> Self {
        self.max_tokens = Some(max);
        self
    }

    pub fn generation_shape(mut self, shape: GenerationShape) -> Self {
        self.generation_shape = Some(shape);
        self
    }

    pub fn schema(mut self, schema: SchemaDescription) -> Self {
        self.schema = Some(schema);
        self
    }
}

/// The value a block produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum BlockResult {
    Text(String),
    Structured(serde_json::Value),
    /// Sentinel failure marker; `message` keeps the underlying error for diagnostics.
    Failed { message: String },
}

impl BlockResult {
    pub fn is_failure(&self) -> bool {
        matches!(self, BlockResult::Failed { .. })
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            BlockResult::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_value(&self) -> Option<&serde_json::Value> {
        match self {
            BlockResult::Structured(v) => Some(v),
            _ => None,
        }
    }
}

/// One pipeline step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub id: BlockId,
    pub kind: BlockKind,
    pub name: String,
    #[serde(default = "default_expanded")]
    pub expanded: bool,
    #[serde(default)]
    pub settings: BlockSettings,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<BlockResult>,
    /// True while at least one generation call for this block is in flight.
    #[serde(skip)]
    pub executing: bool,
    #[serde(skip)]
    pub(crate) in_flight: u32,
    /// Bumped on every generation start; only the latest run may store its result.
    #[serde(skip)]
    pub(crate) run: u64,
}

fn default_expanded() -> bool {
    true
}

impl Block {
    /// Create a block with default settings, named after its kind.
    pub fn new(kind: BlockKind) -> Self {
        Self {
            id: BlockId::generate(),
            kind,
            name: kind.as_str().to_string(),
            expanded: true,
            settings: BlockSettings::default(),
            result: None,
            executing: false,
            in_flight: 0,
            run: 0,
        }
    }

    pub fn input(name: impl Into<String>, value: impl Into<String>) -> Self {
        let mut block = Self::new(BlockKind::Input).named(name);
        block.settings.input = Some(value.into());
        block
    }

    pub fn generate(name: impl Into<String>, prompt: impl Into<String>) -> Self {
        let mut block = Self::new(BlockKind::Generate).named(name);
        block.settings.prompt = Some(prompt.into());
        block
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_id(mut self, id: impl Into<BlockId>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_schema(mut self, schema: SchemaDescription) -> Self {
        self.settings.generation_shape = GenerationShape::Object;
        self.settings.schema = Some(schema);
        self
    }

    pub fn with_result(mut self, result: BlockResult) -> Self {
        self.result = Some(result);
        self
    }

    pub fn is_generate(&self) -> bool {
        self.kind == BlockKind::Generate
    }
}
