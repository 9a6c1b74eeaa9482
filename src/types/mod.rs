//! # Types Module
//!
//! Core data model for block pipelines.
//!
//! ## Key Types
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Block`] | One pipeline step (literal input or generation) |
//! | [`BlockKind`] | `Input` or `Generate` |
//! | [`BlockSettings`] | Prompt/input plus generation parameters |
//! | [`BlockResult`] | Text, structured value or the failure sentinel |
//! | [`SchemaDescription`] | Declarative shape request for structured generation |
//!
//! ## Example
//!
//! ```rust
//! use ai_flow_rust::types::{Block, BlockKind, GenerationShape};
//!
//! let block = Block::new(BlockKind::Generate);
//! assert_eq!(block.name, "Generate");
//! assert_eq!(block.settings.generation_shape, GenerationShape::Text);
//! assert!(block.result.is_none());
//! ```

pub mod block;
pub mod schema;

pub use block::{
    Block, BlockId, BlockKind, BlockResult, BlockSettings, GenerationShape, SettingsPatch,
    FAILURE_MARKER,
};
pub use schema::{FieldSpec, OutputShape, PrimitiveType, SchemaDescription};
