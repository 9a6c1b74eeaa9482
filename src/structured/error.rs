//! Validation violations reported against generated values.

use std::fmt;

/// One schema violation with its location in the value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// What failed
    pub message: String,
    /// JSON path to the violation (e.g., "$.title", "$[1].tags[0]")
    pub path: Option<String>,
}

impl ValidationError {
    /// Create an error with a path.
    pub fn with_path(message: impl Into<String>, path: String) -> Self {
        Self {
            message: message.into(),
            path: Some(path),
        }
    }

    /// Create an error without path.
    pub fn without_path(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            path: None,
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.path {
            Some(path) => write!(f, "{}: {}", path, self.message),
            None => write!(f, "{}", self.message),
        }
    }
}

impl std::error::Error for ValidationError {}

/// Outcome of validating one value.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationResult {
    pub errors: Vec<ValidationError>,
    /// The accepted value (None if any violation was found)
    pub data: Option<serde_json::Value>,
}

impl ValidationResult {
    pub fn success(data: serde_json::Value) -> Self {
        Self {
            errors: Vec::new(),
            data: Some(data),
        }
    }

    pub fn failure(errors: Vec<ValidationError>) -> Self {
        Self { errors, data: None }
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn data(&self) -> Option<&serde_json::Value> {
        self.data.as_ref()
    }

    /// Get errors as formatted strings.
    pub fn error_messages(&self) -> Vec<String> {
        self.errors.iter().map(|e| e.to_string()).collect()
    }

    /// Convert to Result, handing back every violation if invalid.
    pub fn into_result(self) -> Result<serde_json::Value, Vec<ValidationError>> {
        if self.errors.is_empty() {
            Ok(self.data.unwrap_or(serde_json::Value::Null))
        } else {
            Err(self.errors)
        }
    }
}

impl From<Vec<ValidationError>> for ValidationResult {
    fn from(errors: Vec<ValidationError>) -> Self {
        Self::failure(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_display() {
        let error = ValidationError::with_path("Invalid type", "$.title".to_string());
        assert_eq!(error.to_string(), "$.title: Invalid type");
        assert_eq!(ValidationError::without_path("Invalid").to_string(), "Invalid");
    }

    #[test]
    fn test_into_result() {
        let data = serde_json::json!({"title": "x"});
        assert_eq!(ValidationResult::success(data.clone()).into_result(), Ok(data));

        let errors = vec![ValidationError::without_path("bad")];
        let result = ValidationResult::from(errors.clone());
        assert!(!result.is_valid());
        assert!(result.data().is_none());
        assert_eq!(result.into_result(), Err(errors));
    }
}
