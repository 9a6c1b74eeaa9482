//! In-memory provider for tests, demos and dry runs.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use super::GenerationProvider;
use crate::structured::CompiledSchema;
use crate::types::OutputShape;
use crate::{Error, Result};

/// A recorded provider invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderCall {
    pub prompt: String,
    pub temperature: f64,
    pub max_tokens: u32,
    /// `None` for text calls.
    pub shape: Option<OutputShape>,
}

enum Scripted {
    Text(String),
    Object(Value),
    Failure(String),
}

struct Reply {
    body: Scripted,
    delay: Option<Duration>,
}

/// Scripted provider.
///
/// Replies are consumed in order. With nothing scripted, text calls echo the
/// prompt and structured calls fail. A reply's own delay overrides the
/// provider-wide latency.
#[derive(Default)]
pub struct InMemoryProvider {
    replies: Mutex<VecDeque<Reply>>,
    calls: Mutex<Vec<ProviderCall>>,
    latency: Option<Duration>,
}

impl InMemoryProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay every call, to exercise interleaving.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    pub fn push_text(&self, text: impl Into<String>) -> &Self {
        self.push(Scripted::Text(text.into()), None)
    }

    /// Text reply delivered only after `delay`.
    pub fn push_text_delayed(&self, text: impl Into<String>, delay: Duration) -> &Self {
        self.push(Scripted::Text(text.into()), Some(delay))
    }

    pub fn push_object(&self, value: Value) -> &Self {
        self.push(Scripted::Object(value), None)
    }

    pub fn push_failure(&self, message: impl Into<String>) -> &Self {
        self.push(Scripted::Failure(message.into()), None)
    }

    fn push(&self, body: Scripted, delay: Option<Duration>) -> &Self {
        self.replies
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_back(Reply { body, delay });
        self
    }

    pub fn calls(&self) -> Vec<ProviderCall> {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn prompts(&self) -> Vec<String> {
        self.calls().into_iter().map(|c| c.prompt).collect()
    }

    fn record(&self, call: ProviderCall) -> Option<Reply> {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(call);
        self.replies
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front()
    }

    async fn pause(&self, reply: Option<&Reply>) {
        if let Some(delay) = reply.and_then(|r| r.delay).or(self.latency) {
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl GenerationProvider for InMemoryProvider {
    fn name(&self) -> &str {
        "in-memory"
    }

    async fn generate_text(
        &self,
        prompt: &str,
        temperature: f64,
        max_tokens: u32,
    ) -> Result<String> {
        let reply = self.record(ProviderCall {
            prompt: prompt.to_string(),
            temperature,
            max_tokens,
            shape: None,
        });
        self.pause(reply.as_ref()).await;
        match reply.map(|r| r.body) {
            None => Ok(prompt.to_string()),
            Some(Scripted::Text(text)) => Ok(text),
            Some(Scripted::Object(value)) => Ok(value.to_string()),
            Some(Scripted::Failure(message)) => Err(Error::generation(message)),
        }
    }

    async fn generate_object(
        &self,
        prompt: &str,
        temperature: f64,
        max_tokens: u32,
        schema: &CompiledSchema,
    ) -> Result<Value> {
        let reply = self.record(ProviderCall {
            prompt: prompt.to_string(),
            temperature,
            max_tokens,
            shape: Some(schema.shape()),
        });
        self.pause(reply.as_ref()).await;
        match reply.map(|r| r.body) {
            Some(Scripted::Object(value)) => Ok(schema.unwrap_response(value)),
            Some(Scripted::Text(text)) => Ok(Value::String(text)),
            Some(Scripted::Failure(message)) => Err(Error::generation(message)),
            None => Err(Error::generation("no scripted structured reply")),
        }
    }
}
