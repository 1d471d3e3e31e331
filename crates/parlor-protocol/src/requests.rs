//! Request bodies and parameters.
//!
//! Every string field defaults to empty when absent so that the server can
//! report all missing fields at once instead of failing on the first.

use serde::{Deserialize, Serialize};

/// Header carrying the acting participant's name.
pub const USER_HEADER: &str = "user";

/// Body of `POST /participants`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterRequest {
    /// Requested display name.
    #[serde(default)]
    pub name: String,
}

/// Body of `POST /messages`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostMessageRequest {
    /// Recipient name, or the broadcast target.
    #[serde(default)]
    pub to: String,
    /// Message text.
    #[serde(default)]
    pub text: String,
    /// `message` or `private_message`.
    #[serde(default, rename = "type")]
    pub kind: String,
}

/// Query string of `GET /messages`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessagesQuery {
    /// Raw limit; parsed and range-checked by the server.
    #[serde(default)]
    pub limit: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fields_default_to_empty() {
        let body: PostMessageRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(body, PostMessageRequest::default());

        let body: RegisterRequest = serde_json::from_str("{}").unwrap();
        assert!(body.name.is_empty());
    }

    #[test]
    fn test_type_field_name() {
        let body: PostMessageRequest =
            serde_json::from_str(r#"{"to":"bob","text":"hey","type":"private_message"}"#)
                .unwrap();
        assert_eq!(body.kind, "private_message");

        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["type"], "private_message");
    }
}
