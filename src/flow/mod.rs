//! Linear block pipelines: the versioned block list and its execution engine.
//!
//! ```rust
//! use ai_flow_rust::flow::{FlowEngine, FlowStore};
//! use ai_flow_rust::gateway::GenerationGateway;
//! use ai_flow_rust::provider::InMemoryProvider;
//! use ai_flow_rust::types::Block;
//! use std::sync::Arc;
//!
//! # tokio_test::block_on(async {
//! let store = Arc::new(FlowStore::from_blocks(vec![
//!     Block::input("seed", "hi").with_id("seed"),
//!     Block::generate("Echo", "Repeat: @[seed](seed)"),
//! ]));
//! let engine = FlowEngine::new(store, GenerationGateway::new(Arc::new(InMemoryProvider::new())));
//!
//! let outcomes = engine.execute_flow().await;
//! assert_eq!(outcomes[1].resolved_prompt.as_deref(), Some("Repeat: hi"));
//! # });
//! ```

pub mod definition;
pub mod engine;
pub mod store;

pub use definition::{BlockDefinition, FlowDefinition};
pub use engine::{BlockOutcome, FlowEngine, KeyEvent};
pub use store::{FlowSnapshot, FlowStore, Variable};
