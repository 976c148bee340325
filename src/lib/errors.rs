//! Error types shared by the gateway, the session store and the feature clients.
//!
//! Server error payloads arrive either as a single message (`{"error": "..."}`,
//! `{"detail": "..."}` or a bare string) or as a field-keyed map of messages.
//! They are resolved into [`ApiError`] once, at the network boundary, so callers
//! never inspect raw JSON.

use serde_json::Value;
use std::{collections::BTreeMap, fmt};
use thiserror::Error;

/// Fallback message when the server returns an empty or unusable error body.
pub const GENERIC_FAILURE: &str = "Request failed.";
/// Maximum number of error body characters surfaced to callers.
pub const MAX_ERROR_CHARS: usize = 200;

/// Server-supplied error payload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ApiError {
    General(String),
    Fields(BTreeMap<String, Vec<String>>),
}

impl ApiError {
    /// Builds an error payload from a raw response body.
    #[must_use]
    pub fn from_body(body: &str) -> Self {
        let trimmed = body.trim();
        if trimmed.is_empty() {
            return Self::General(GENERIC_FAILURE.to_string());
        }

        match serde_json::from_str::<Value>(trimmed) {
            Ok(value) => Self::from_value(value),
            Err(_) => Self::General(trimmed.chars().take(MAX_ERROR_CHARS).collect()),
        }
    }

    /// Builds an error payload from decoded JSON.
    #[must_use]
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::String(message) => Self::General(message),
            Value::Object(map) => {
                for key in ["error", "detail"] {
                    if let Some(Value::String(message)) = map.get(key) {
                        return Self::General(message.clone());
                    }
                }

                let fields: BTreeMap<String, Vec<String>> = map
                    .into_iter()
                    .map(|(field, value)| (field, collect_messages(value)))
                    .filter(|(_, messages)| !messages.is_empty())
                    .collect();

                if fields.is_empty() {
                    Self::General(GENERIC_FAILURE.to_string())
                } else {
                    Self::Fields(fields)
                }
            }
            Value::Array(items) => {
                let messages = items.into_iter().flat_map(collect_messages).collect::<Vec<_>>();
                if messages.is_empty() {
                    Self::General(GENERIC_FAILURE.to_string())
                } else {
                    Self::General(messages.join(", "))
                }
            }
            Value::Null => Self::General(GENERIC_FAILURE.to_string()),
            other => Self::General(other.to_string()),
        }
    }

    /// Builds a field error for a single field.
    pub fn field(field: impl Into<String>, message: impl Into<String>) -> Self {
        let mut fields = BTreeMap::new();
        fields.insert(field.into(), vec![message.into()]);
        Self::Fields(fields)
    }

    /// Returns the messages attached to `field`, if any.
    #[must_use]
    pub fn messages_for(&self, field: &str) -> Option<&[String]> {
        match self {
            Self::General(_) => None,
            Self::Fields(fields) => fields.get(field).map(Vec::as_slice),
        }
    }

    /// Flattens the payload into one user-facing line.
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::General(message) => message.clone(),
            Self::Fields(fields) => fields
                .iter()
                .map(|(field, messages)| format!("{field}: {}", messages.join(", ")))
                .collect::<Vec<_>>()
                .join("; "),
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.message())
    }
}

fn collect_messages(value: Value) -> Vec<String> {
    match value {
        Value::String(message) => vec![message],
        Value::Array(items) => items.into_iter().flat_map(collect_messages).collect(),
        Value::Null => Vec::new(),
        other => vec![other.to_string()],
    }
}

#[derive(Clone, Debug, Error)]
pub enum AppError {
    #[error("Config error: {0}")]
    Config(String),
    #[error("Network error: {0}")]
    Network(String),
    #[error("Timeout: {0}")]
    Timeout(String),
    #[error("Validation failed: {0}")]
    Validation(ApiError),
    #[error("Authentication failed: {0}")]
    Authentication(ApiError),
    #[error("Session expired: {0}")]
    SessionExpired(String),
    #[error("Request failed ({status}): {error}")]
    Http { status: u16, error: ApiError },
    #[error("File unavailable: {0}")]
    NotFoundOrCorrupt(String),
    #[error("Response error: {0}")]
    Parse(String),
    #[error("Request error: {0}")]
    Serialization(String),
    #[error("Storage error: {0}")]
    Storage(String),
}

impl AppError {
    /// HTTP status carried by the error, when it came from a response.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Server payload carried by the error, when there is one.
    #[must_use]
    pub fn api_error(&self) -> Option<&ApiError> {
        match self {
            Self::Validation(error) | Self::Authentication(error) | Self::Http { error, .. } => {
                Some(error)
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ApiError, AppError, GENERIC_FAILURE, MAX_ERROR_CHARS};
    use serde_json::json;

    #[test]
    fn error_key_becomes_general_message() {
        let error = ApiError::from_body(r#"{"error": "Invalid credentials"}"#);
        assert_eq!(error, ApiError::General("Invalid credentials".to_string()));
    }

    #[test]
    fn detail_key_becomes_general_message() {
        let error = ApiError::from_value(json!({
            "detail": "Token is invalid or expired",
            "code": "token_not_valid"
        }));
        assert_eq!(
            error,
            ApiError::General("Token is invalid or expired".to_string())
        );
    }

    #[test]
    fn field_map_keeps_every_field() {
        let error = ApiError::from_value(json!({
            "username": ["A user with that username already exists."],
            "password": "Passwords do not match.",
            "email": null
        }));
        assert_eq!(
            error.messages_for("username"),
            Some(&["A user with that username already exists.".to_string()][..])
        );
        assert_eq!(
            error.messages_for("password"),
            Some(&["Passwords do not match.".to_string()][..])
        );
        assert_eq!(error.messages_for("email"), None);
    }

    #[test]
    fn plain_text_bodies_are_trimmed_and_truncated() {
        let long = format!("  {}  ", "x".repeat(MAX_ERROR_CHARS + 50));
        let ApiError::General(message) = ApiError::from_body(&long) else {
            panic!("expected a general error");
        };
        assert_eq!(message.chars().count(), MAX_ERROR_CHARS);
    }

    #[test]
    fn empty_body_falls_back_to_generic_message() {
        assert_eq!(
            ApiError::from_body("   "),
            ApiError::General(GENERIC_FAILURE.to_string())
        );
        assert_eq!(
            ApiError::from_value(json!({})),
            ApiError::General(GENERIC_FAILURE.to_string())
        );
    }

    #[test]
    fn field_message_is_flattened_in_key_order() {
        let error = ApiError::from_value(json!({
            "password": ["too short", "too common"],
            "email": ["invalid"]
        }));
        assert_eq!(error.message(), "email: invalid; password: too short, too common");
    }

    #[test]
    fn app_error_exposes_status_and_payload() {
        let error = AppError::Http {
            status: 502,
            error: ApiError::General("Bad gateway".to_string()),
        };
        assert_eq!(error.status(), Some(502));
        assert_eq!(error.to_string(), "Request failed (502): Bad gateway");
        assert!(AppError::Network("down".to_string()).api_error().is_none());
    }
}
