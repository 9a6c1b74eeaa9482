//! OpenAI-compatible chat-completions provider.

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::debug;

use super::GenerationProvider;
use crate::config::ProviderConfig;
use crate::structured::{CompiledSchema, StructuredOutput};
use crate::transport::HttpTransport;
use crate::{Error, Result};

const CHAT_PATH: &str = "/chat/completions";

/// Provider speaking the OpenAI chat-completions wire format.
///
/// Works with any endpoint accepting `response_format: json_schema`.
pub struct OpenAiProvider {
    transport: HttpTransport,
    model: String,
}

impl OpenAiProvider {
    pub fn new(config: &ProviderConfig) -> Result<Self> {
        Ok(Self {
            transport: HttpTransport::new(config)?,
            model: config.model.clone(),
        })
    }

    fn request_body(
        &self,
        prompt: &str,
        temperature: f64,
        max_tokens: u32,
        schema: Option<&CompiledSchema>,
    ) -> Value {
        let mut body = json!({
            "model": self.model,
            "messages": [{"role": "user", "content": prompt}],
            "temperature": temperature,
            "max_tokens": max_tokens,
        });
        if let Some(schema) = schema {
            body["response_format"] = schema.response_format();
        }
        body
    }

    async fn complete(&self, body: Value) -> Result<String> {
        let response = self.transport.post_json(CHAT_PATH, &body).await?;
        let choice = response.pointer("/choices/0/message");
        if let Some(refusal) = choice
            .and_then(|m| m.get("refusal"))
            .and_then(|r| r.as_str())
        {
            return Err(Error::generation(format!("model refused: {}", refusal)));
        }
        choice
            .and_then(|m| m.get("content"))
            .and_then(|c| c.as_str())
            .map(str::to_string)
            .ok_or_else(|| Error::generation("response contained no message content"))
    }
}

#[async_trait]
impl GenerationProvider for OpenAiProvider {
    fn name(&self) -> &str {
        "openai"
    }

    async fn generate_text(
        &self,
        prompt: &str,
        temperature: f64,
        max_tokens: u32,
    ) -> Result<String> {
        self.complete(self.request_body(prompt, temperature, max_tokens, None))
            .await
    }

    async fn generate_object(
        &self,
        prompt: &str,
        temperature: f64,
        max_tokens: u32,
        schema: &CompiledSchema,
    ) -> Result<Value> {
        let content = self
            .complete(self.request_body(prompt, temperature, max_tokens, Some(schema)))
            .await?;
        debug!(shape = %schema.shape(), bytes = content.len(), "structured content received");

        let parsed = StructuredOutput::from_response(content)
            .into_parsed()
            .ok_or_else(|| Error::generation("response content is not valid JSON"))?;
        Ok(schema.unwrap_response(parsed))
    }
}
