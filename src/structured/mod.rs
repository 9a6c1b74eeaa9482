//! Structured output: schema compilation, response parsing and validation.
//!
//! - [`compile`]: turn a [`SchemaDescription`](crate::types::SchemaDescription) into a [`CompiledSchema`]
//! - [`OutputValidator`]: check a generated value against the compiled schema
//! - [`StructuredOutput`]: pull JSON out of raw model text
//!
//! # Examples
//!
//! ```
//! use ai_flow_rust::structured::compile;
//! use ai_flow_rust::types::{FieldSpec, PrimitiveType, SchemaDescription};
//! use serde_json::json;
//!
//! let desc = SchemaDescription::object(vec![
//!     FieldSpec::new("title", PrimitiveType::String),
//!     FieldSpec::new("count", PrimitiveType::Number),
//! ]);
//! let compiled = compile(&desc).unwrap();
//!
//! assert!(compiled.validator().validate(&json!({"title": "x", "count": 3})).is_valid());
//! assert!(!compiled.validator().validate(&json!({"title": 3, "count": 3})).is_valid());
//! ```

pub mod error;
pub mod json_mode;
pub mod schema;
pub mod validator;

pub use error::{ValidationError, ValidationResult};
pub use json_mode::StructuredOutput;
pub use schema::{compile, schema_from_primitive, CompiledSchema, SchemaGenerator};
pub use validator::OutputValidator;
