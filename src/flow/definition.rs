//! Flow definition files.
//!
//! A flow file lists blocks in order. YAML (`.yaml`/`.yml`) and JSON are
//! accepted; files are only ever read.
//!
//! ```yaml
//! name: summarize
//! blocks:
//!   - kind: input
//!     name: seed
//!     input: "Rust ownership in one paragraph"
//!   - kind: generate
//!     name: Summary
//!     prompt: "Summarize: @[seed](seed)"
//!     max_tokens: 200
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::config::GenerationDefaults;
use crate::error::ErrorContext;
use crate::types::{Block, BlockId, BlockKind, BlockSettings, GenerationShape, SchemaDescription};
use crate::{Error, Result};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FlowDefinition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub blocks: Vec<BlockDefinition>,
}

/// One block as authored. Omitted generation parameters take the configured defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockDefinition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub kind: BlockKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(default, alias = "maxTokens", skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(
        default,
        alias = "generationShape",
        skip_serializing_if = "Option::is_none"
    )]
    pub generation_shape: Option<GenerationShape>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<SchemaDescription>,
}

impl FlowDefinition {
    pub fn from_yaml_str(raw: &str) -> Result<Self> {
        serde_yaml::from_str(raw).map_err(|e| invalid_definition(e.to_string()))
    }

    pub fn from_json_str(raw: &str) -> Result<Self> {
        serde_json::from_str(raw).map_err(|e| invalid_definition(e.to_string()))
    }

    /// Load by extension: `.json` as JSON, anything else as YAML.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)?;
        let is_json = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("json"));
        let parsed = if is_json {
            Self::from_json_str(&raw)
        } else {
            Self::from_yaml_str(&raw)
        };
        parsed.map_err(|e| match e {
            Error::Configuration { message, context } => Error::Configuration {
                message,
                context: context.with_field_path(path.display().to_string()),
            },
            other => other,
        })
    }

    /// Materialize blocks in declaration order.
    pub fn into_blocks(self, defaults: &GenerationDefaults) -> Vec<Block> {
        self.blocks
            .into_iter()
            .map(|def| def.into_block(defaults))
            .collect()
    }
}

impl BlockDefinition {
    pub fn into_block(self, defaults: &GenerationDefaults) -> Block {
        let generation_shape = self.generation_shape.unwrap_or(if self.schema.is_some() {
            GenerationShape::Object
        } else {
            GenerationShape::Text
        });
        let mut block = Block::new(self.kind);
        if let Some(id) = self.id {
            block.id = BlockId::from(id);
        }
        if let Some(name) = self.name {
            block.name = name;
        }
        block.settings = BlockSettings {
            prompt: self.prompt,
            input: self.input,
            temperature: self.temperature.unwrap_or(defaults.temperature),
            max_tokens: self.max_tokens.unwrap_or(defaults.max_tokens).max(1),
            generation_shape,
            schema: self.schema,
        };
        block
    }
}

fn invalid_definition(details: String) -> Error {
    Error::configuration_with_context(
        "invalid flow definition",
        ErrorContext::new()
            .with_details(details)
            .with_source("flow_definition"),
    )
}
