//! Auth payloads exchanged with the API, plus the local registration form.

use crate::app_lib::{ApiError, AppError, FilePart, MultipartBody};
use crate::features::auth::password;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Profile returned by the API. Unknown fields are kept as-is.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct User {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl User {
    /// Display name built from the optional first/last name fields.
    #[must_use]
    pub fn full_name(&self) -> Option<String> {
        let part = |key: &str| {
            self.extra
                .get(key)
                .and_then(Value::as_str)
                .map(str::trim)
                .filter(|value| !value.is_empty())
        };
        match (part("first_name"), part("last_name")) {
            (Some(first), Some(last)) => Some(format!("{first} {last}")),
            (Some(name), None) | (None, Some(name)) => Some(name.to_string()),
            (None, None) => None,
        }
    }
}

/// Raw token pair as issued by the API.
#[derive(Deserialize)]
pub struct IssuedTokens {
    pub access: String,
    pub refresh: String,
}

/// Token pair held in memory.
#[derive(Clone, Debug)]
pub struct TokenPair {
    pub access: SecretString,
    pub refresh: SecretString,
}

impl From<IssuedTokens> for TokenPair {
    fn from(tokens: IssuedTokens) -> Self {
        Self {
            access: SecretString::from(tokens.access),
            refresh: SecretString::from(tokens.refresh),
        }
    }
}

/// Body of a successful login or registration.
#[derive(Deserialize)]
pub struct AuthResponse {
    pub user: User,
    pub tokens: IssuedTokens,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Serialize)]
pub struct LoginRequest<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

/// Registration input collected by the caller.
pub struct RegistrationForm {
    pub username: String,
    pub email: String,
    pub password: SecretString,
    pub password_confirmation: SecretString,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub files: Vec<FilePart>,
}

impl RegistrationForm {
    /// Local checks run before anything is sent.
    ///
    /// # Errors
    /// Returns `AppError::Validation` with per-field messages.
    pub fn validate(&self) -> Result<(), AppError> {
        let mut fields: BTreeMap<String, Vec<String>> = BTreeMap::new();
        let mut reject = |field: &str, message: &str| {
            fields
                .entry(field.to_string())
                .or_default()
                .push(message.to_string());
        };

        if self.username.trim().is_empty() {
            reject("username", "Username is required.");
        }
        let email = self.email.trim();
        if email.is_empty() {
            reject("email", "Email is required.");
        } else if !email.contains('@') {
            reject("email", "Enter a valid email address.");
        }

        let password = self.password.expose_secret();
        if password != self.password_confirmation.expose_secret() {
            reject("password2", "Passwords do not match.");
        }
        for message in password::assess(password).errors {
            reject("password", message);
        }

        if fields.is_empty() {
            Ok(())
        } else {
            Err(AppError::Validation(ApiError::Fields(fields)))
        }
    }

    /// Multipart body in the layout the register endpoint expects.
    #[must_use]
    pub fn to_multipart(&self) -> MultipartBody {
        let mut body = MultipartBody::new()
            .text("username", self.username.trim())
            .text("email", self.email.trim())
            .text("password", self.password.expose_secret())
            .text("password2", self.password_confirmation.expose_secret());

        let optional = [
            ("first_name", &self.first_name),
            ("last_name", &self.last_name),
        ];
        for (name, value) in optional {
            if let Some(value) = value.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
                body = body.text(name, value);
            }
        }

        self.files
            .iter()
            .cloned()
            .fold(body, MultipartBody::file)
    }
}
