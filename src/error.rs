use crate::structured::ValidationError;
use crate::transport::TransportError;
use thiserror::Error;

/// Structured error context for configuration and loading failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorContext {
    /// Field path or configuration key that caused the error (e.g., "provider.base_url", "blocks[2].settings")
    pub field_path: Option<String>,
    /// Additional context about the error (e.g., expected type, actual value)
    pub details: Option<String>,
    /// Source of the error (e.g., "config_loader", "flow_file")
    pub source: Option<String>,
}

impl ErrorContext {
    pub fn new() -> Self {
        Self {
            field_path: None,
            details: None,
            source: None,
        }
    }

    pub fn with_field_path(mut self, path: impl Into<String>) -> Self {
        self.field_path = Some(path.into());
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }
}

impl Default for ErrorContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Unified error type for flow building and generation.
///
/// The first five variants form the generation taxonomy surfaced by the
/// [`GenerationGateway`](crate::gateway::GenerationGateway). The flow engine
/// never lets any of them escape `execute_block`.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Prompt is required")]
    MissingPrompt,

    #[error("Schema definition is required for object generation")]
    MissingSchema,

    #[error("Enum values are required for enum generation")]
    MissingChoices,

    #[error("Schema validation failed: {}", format_violations(.violations))]
    SchemaValidationFailed { violations: Vec<ValidationError> },

    #[error("Failed to generate response: {message}")]
    GenerationFailed { message: String },

    #[error("Configuration error: {message}{}", format_context(.context))]
    Configuration {
        message: String,
        context: ErrorContext,
    },

    #[error("Network transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

fn format_violations(violations: &[ValidationError]) -> String {
    violations
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

// Helper function to format error context for display
fn format_context(ctx: &ErrorContext) -> String {
    let mut parts = Vec::new();
    if let Some(ref field) = ctx.field_path {
        parts.push(format!("field: {}", field));
    }
    if let Some(ref details) = ctx.details {
        parts.push(format!("details: {}", details));
    }
    if let Some(ref source) = ctx.source {
        parts.push(format!("source: {}", source));
    }
    if parts.is_empty() {
        String::new()
    } else {
        format!(" ({})", parts.join(", "))
    }
}

impl Error {
    /// Create a generation failure carrying the provider's message.
    pub fn generation(msg: impl Into<String>) -> Self {
        Error::GenerationFailed {
            message: msg.into(),
        }
    }

    /// Create a new configuration error with structured context
    pub fn configuration_with_context(msg: impl Into<String>, context: ErrorContext) -> Self {
        Error::Configuration {
            message: msg.into(),
            context,
        }
    }

    /// Extract error context if available
    pub fn context(&self) -> Option<&ErrorContext> {
        match self {
            Error::Configuration { context, .. } => Some(context),
            _ => None,
        }
    }

    /// HTTP-equivalent status for the generation endpoint.
    pub fn status_code(&self) -> u16 {
        match self {
            Error::MissingPrompt
            | Error::MissingSchema
            | Error::MissingChoices
            | Error::SchemaValidationFailed { .. } => 400,
            _ => 500,
        }
    }

    /// JSON error body in the shape the generation endpoint returns.
    pub fn to_response_body(&self) -> serde_json::Value {
        match self {
            Error::MissingPrompt => serde_json::json!({ "error": "Prompt is required" }),
            Error::MissingSchema => serde_json::json!({
                "error": "Schema definition is required for object generation"
            }),
            Error::MissingChoices => serde_json::json!({
                "error": "Enum values are required for enum generation"
            }),
            Error::SchemaValidationFailed { violations } => serde_json::json!({
                "error": "Schema validation failed",
                "details": violations.iter().map(|v| v.to_string()).collect::<Vec<_>>(),
            }),
            Error::GenerationFailed { message } => serde_json::json!({
                "error": "Failed to generate response",
                "message": message,
            }),
            other => serde_json::json!({
                "error": "Failed to generate response",
                "message": other.to_string(),
            }),
        }
    }
}
