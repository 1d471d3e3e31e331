//! Error response body.

use serde::{Deserialize, Serialize};

/// One rejected input field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    /// Field name.
    pub field: String,
    /// Why it was rejected.
    pub reason: String,
}

/// JSON body returned with every failed request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Machine-readable error kind, e.g. `validation_error`.
    pub error: String,
    /// Human-readable description.
    pub message: String,
    /// Field violations, for validation errors.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub details: Vec<FieldError>,
}

impl ErrorBody {
    /// Create an error body without field details.
    #[must_use]
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
            details: Vec::new(),
        }
    }

    /// Attach a field violation.
    #[must_use]
    pub fn with_detail(mut self, field: impl Into<String>, reason: impl Into<String>) -> Self {
        self.details.push(FieldError {
            field: field.into(),
            reason: reason.into(),
        });
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_details_omitted_when_empty() {
        let json = serde_json::to_value(ErrorBody::new("conflict", "taken")).unwrap();
        assert!(json.get("details").is_none());
    }

    #[test]
    fn test_details_serialized() {
        let body = ErrorBody::new("validation_error", "bad input")
            .with_detail("to", "must not be empty")
            .with_detail("text", "must not be empty");

        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["details"][1]["field"], "text");
    }
}
