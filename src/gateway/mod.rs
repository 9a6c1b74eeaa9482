//! Generation gateway.
//!
//! Validates a [`GenerationRequest`], dispatches it to a
//! [`GenerationProvider`] with at most one outbound call, and checks
//! structured responses against the compiled schema.
//!
//! ```rust
//! use ai_flow_rust::gateway::{GenerationGateway, GenerationRequest};
//! use ai_flow_rust::provider::InMemoryProvider;
//! use std::sync::Arc;
//!
//! # tokio_test::block_on(async {
//! let provider = Arc::new(InMemoryProvider::new());
//! provider.push_text("Bonjour");
//! let gateway = GenerationGateway::new(provider);
//!
//! let result = gateway.generate(&GenerationRequest::text("Say hello in French")).await.unwrap();
//! assert_eq!(result.as_text(), Some("Bonjour"));
//! # });
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info};

use crate::provider::GenerationProvider;
use crate::structured::compile;
use crate::types::block::{DEFAULT_MAX_TOKENS, DEFAULT_TEMPERATURE};
use crate::types::{BlockResult, BlockSettings, GenerationShape, OutputShape, SchemaDescription};
use crate::{Error, Result};

/// A single generation request, as accepted on the gateway's wire boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationRequest {
    #[serde(default)]
    pub prompt: String,
    #[serde(default, alias = "generateType")]
    pub generation_shape: GenerationShape,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(
        default,
        alias = "schemaDefinition",
        skip_serializing_if = "Option::is_none"
    )]
    pub schema_description: Option<SchemaDescription>,
}

fn default_temperature() -> f64 {
    DEFAULT_TEMPERATURE
}

fn default_max_tokens() -> u32 {
    DEFAULT_MAX_TOKENS
}

impl GenerationRequest {
    pub fn text(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            generation_shape: GenerationShape::Text,
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
            schema_description: None,
        }
    }

    pub fn object(prompt: impl Into<String>, schema: SchemaDescription) -> Self {
        Self {
            generation_shape: GenerationShape::Object,
            schema_description: Some(schema),
            ..Self::text(prompt)
        }
    }

    /// Build a request from a block's settings and an already-resolved prompt.
    pub fn from_settings(prompt: impl Into<String>, settings: &BlockSettings) -> Self {
        Self {
            prompt: prompt.into(),
            generation_shape: settings.generation_shape,
            temperature: settings.temperature,
            max_tokens: settings.max_tokens,
            schema_description: settings.schema.clone(),
        }
    }

    pub fn temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }
}

/// Successful gateway output.
#[derive(Debug, Clone, PartialEq)]
pub enum GenerationResult {
    Text(String),
    /// Object, array of objects, or the chosen enum string.
    Structured(Value),
}

impl GenerationResult {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            GenerationResult::Text(text) => Some(text),
            GenerationResult::Structured(_) => None,
        }
    }

    pub fn into_block_result(self) -> BlockResult {
        match self {
            GenerationResult::Text(text) => BlockResult::Text(text),
            GenerationResult::Structured(value) => BlockResult::Structured(value),
        }
    }

    /// Response body: raw text, or the structured value under `result`.
    pub fn into_response_body(self) -> Value {
        match self {
            GenerationResult::Text(text) => Value::String(text),
            GenerationResult::Structured(value) => serde_json::json!({ "result": value }),
        }
    }
}

/// Stateless front door to a generation provider.
#[derive(Clone)]
pub struct GenerationGateway {
    provider: Arc<dyn GenerationProvider>,
}

impl GenerationGateway {
    pub fn new(provider: Arc<dyn GenerationProvider>) -> Self {
        Self { provider }
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    pub async fn generate(&self, request: &GenerationRequest) -> Result<GenerationResult> {
        if request.prompt.is_empty() {
            return Err(Error::MissingPrompt);
        }
        // Same floor as block settings; providers reject a zero budget.
        let max_tokens = request.max_tokens.max(1);

        info!(
            provider = self.provider.name(),
            shape = ?request.generation_shape,
            temperature = request.temperature,
            max_tokens,
            "generation requested"
        );
        debug!(prompt = %request.prompt, "generation prompt");

        match request.generation_shape {
            GenerationShape::Text => {
                let text = self
                    .provider
                    .generate_text(&request.prompt, request.temperature, max_tokens)
                    .await
                    .map_err(into_generation_failure)?;
                Ok(GenerationResult::Text(text))
            }
            GenerationShape::Object => {
                let description = request
                    .schema_description
                    .as_ref()
                    .ok_or(Error::MissingSchema)?;
                if description.output_shape == OutputShape::EnumChoice
                    && description.choices.is_empty()
                {
                    return Err(Error::MissingChoices);
                }
                let compiled = compile(description)?;

                let value = self
                    .provider
                    .generate_object(
                        &request.prompt,
                        request.temperature,
                        max_tokens,
                        &compiled,
                    )
                    .await
                    .map_err(into_generation_failure)?;

                compiled
                    .validator()
                    .validate(&value)
                    .into_result()
                    .map_err(|violations| Error::SchemaValidationFailed { violations })?;
                Ok(GenerationResult::Structured(value))
            }
        }
    }
}

/// Collapse anything a provider returns into the generation taxonomy.
fn into_generation_failure(err: Error) -> Error {
    match err {
        e @ (Error::GenerationFailed { .. } | Error::SchemaValidationFailed { .. }) => e,
        Error::Transport(t) => Error::generation(t.to_string()),
        other => Error::generation(other.to_string()),
    }
}
