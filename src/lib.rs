//! # ai-flow-rust
//!
//! Linear LLM block pipelines. A flow is an ordered list of blocks: literal
//! `Input` blocks and `Generate` blocks whose prompt may reference the
//! previous block through mention markup `@[display](id)`. Generation asks
//! for free text or a schema-constrained value (one object, an array of
//! objects, or a choice from a closed enum).
//!
//! ## Quick Start
//!
//! ```rust
//! use ai_flow_rust::flow::{FlowEngine, FlowStore};
//! use ai_flow_rust::gateway::GenerationGateway;
//! use ai_flow_rust::provider::InMemoryProvider;
//! use ai_flow_rust::types::{Block, BlockResult};
//! use std::sync::Arc;
//!
//! # tokio_test::block_on(async {
//! let provider = Arc::new(InMemoryProvider::new());
//! provider.push_text("Ownership moves values; borrowing lends them.");
//!
//! let store = Arc::new(FlowStore::from_blocks(vec![
//!     Block::input("topic", "Rust ownership"),
//!     Block::generate("Summary", "Explain @[topic](topic) in one line"),
//! ]));
//! let engine = FlowEngine::new(store.clone(), GenerationGateway::new(provider.clone()));
//! engine.execute_flow().await;
//!
//! assert_eq!(provider.prompts(), vec!["Explain Rust ownership in one line"]);
//! assert!(matches!(store.blocks()[1].result, Some(BlockResult::Text(_))));
//! # });
//! ```
//!
//! ## Module Organization
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`types`] | Blocks, settings, results and schema descriptions |
//! | [`template`] | Mention parsing and prompt resolution |
//! | [`structured`] | Schema compilation, JSON extraction and validation |
//! | [`provider`] | Generation provider trait, OpenAI-compatible and in-memory providers |
//! | [`transport`] | HTTP transport with keyring/env API key lookup |
//! | [`gateway`] | Request validation and single-call dispatch |
//! | [`flow`] | Versioned block list, execution engine, flow files |
//! | [`config`] | Layered runtime configuration |
//! | [`error`] | Error taxonomy |

pub mod config;
pub mod error;
pub mod flow;
pub mod gateway;
pub mod provider;
pub mod structured;
pub mod template;
pub mod transport;
pub mod types;

pub use config::FlowConfig;
pub use error::{Error, ErrorContext};
pub use flow::{BlockOutcome, FlowEngine, FlowStore, KeyEvent};
pub use gateway::{GenerationGateway, GenerationRequest, GenerationResult};
pub use provider::{GenerationProvider, InMemoryProvider, OpenAiProvider};
pub use template::{resolve, resolve_detailed};
pub use types::{Block, BlockId, BlockKind, BlockResult, BlockSettings, SchemaDescription};

pub type Result<T> = std::result::Result<T, Error>;
