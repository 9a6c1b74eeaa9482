//! Generation provider abstraction.
//!
//! The gateway talks to models only through [`GenerationProvider`], so the
//! same flow runs against a real endpoint ([`OpenAiProvider`]) or a scripted
//! in-process stand-in ([`InMemoryProvider`]).
//!
//! # Design Notes
//!
//! Providers perform exactly one outbound call per method invocation and
//! never retry. Structured calls return the *unwrapped* result value; envelope
//! handling is the provider's concern, validation is the gateway's.

pub mod memory;
pub mod openai;

use async_trait::async_trait;
use serde_json::Value;

use crate::structured::CompiledSchema;
use crate::Result;

pub use memory::{InMemoryProvider, ProviderCall};
pub use openai::OpenAiProvider;

#[async_trait]
pub trait GenerationProvider: Send + Sync {
    /// Short identifier used in logs.
    fn name(&self) -> &str;

    /// Free-text generation.
    async fn generate_text(&self, prompt: &str, temperature: f64, max_tokens: u32)
        -> Result<String>;

    /// Schema-constrained generation (object, array of objects, or enum choice).
    async fn generate_object(
        &self,
        prompt: &str,
        temperature: f64,
        max_tokens: u32,
        schema: &CompiledSchema,
    ) -> Result<Value>;
}
