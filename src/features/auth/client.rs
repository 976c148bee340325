//! Auth endpoints. Login and register are public calls: they never carry a
//! bearer token and a rejection is reported as `AppError::Authentication`.

use crate::app_lib::{ApiRequest, AppError, AuthGateway};
use crate::features::auth::types::{AuthResponse, LoginRequest, RegistrationForm, User};
use secrecy::{ExposeSecret, SecretString};

pub const LOGIN_PATH: &str = "/login/";
pub const REGISTER_PATH: &str = "/register/";
pub const PROFILE_PATH: &str = "/profile/";

/// Exchanges credentials for a token pair.
///
/// # Errors
/// Returns `AppError::Authentication` when the server rejects the credentials,
/// `AppError::Validation` for malformed input, or transport errors.
pub async fn login(
    gateway: &AuthGateway,
    username: &str,
    password: &SecretString,
) -> Result<AuthResponse, AppError> {
    let request = ApiRequest::post_json(
        LOGIN_PATH,
        &LoginRequest {
            username: username.trim(),
            password: password.expose_secret(),
        },
    )?
    .public();

    gateway
        .send_json(&request)
        .await
        .map_err(into_authentication_error)
}

/// Creates an account and returns its first token pair.
///
/// # Errors
/// Returns `AppError::Validation` with the server's field errors, or the same
/// errors as [`login`].
pub async fn register(
    gateway: &AuthGateway,
    form: &RegistrationForm,
) -> Result<AuthResponse, AppError> {
    let request = ApiRequest::post_multipart(REGISTER_PATH, form.to_multipart()).public();

    gateway
        .send_json(&request)
        .await
        .map_err(into_authentication_error)
}

/// Fetches the profile of the signed-in user.
///
/// # Errors
/// Returns an `AppError` if the request fails or the session cannot be refreshed.
pub async fn fetch_profile(gateway: &AuthGateway) -> Result<User, AppError> {
    gateway.send_json(&ApiRequest::get(PROFILE_PATH)).await
}

fn into_authentication_error(err: AppError) -> AppError {
    match err {
        AppError::Http {
            status: 401 | 403,
            error,
        } => AppError::Authentication(error),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::{LOGIN_PATH, PROFILE_PATH, REGISTER_PATH, fetch_profile, login, register};
    use crate::app_lib::{ApiError, AppError, AuthGateway, TokenSink, config::AppConfig};
    use crate::features::auth::types::RegistrationForm;
    use crate::routes::HistoryNavigator;
    use anyhow::Result;
    use secrecy::SecretString;
    use serde_json::json;
    use std::{net::TcpListener, sync::Arc};
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn can_bind_localhost() -> bool {
        TcpListener::bind("127.0.0.1:0").is_ok()
    }

    struct NoTokens;

    impl TokenSink for NoTokens {
        fn access_token(&self) -> Option<SecretString> {
            Some(SecretString::from("access-1"))
        }
        fn refresh_token(&self) -> Option<SecretString> {
            None
        }
        fn store_refreshed(&self, _access: SecretString, _refresh: Option<SecretString>) {}
        fn expire(&self) {}
    }

    fn gateway(server: &MockServer) -> Result<AuthGateway> {
        let config = AppConfig {
            api_base_url: server.uri(),
            ..AppConfig::default()
        };
        Ok(AuthGateway::new(
            &config,
            Arc::new(NoTokens),
            Arc::new(HistoryNavigator::default()),
        )?)
    }

    fn auth_body() -> serde_json::Value {
        json!({
            "user": {"id": 1, "username": "ana", "email": "ana@example.com"},
            "tokens": {"access": "access-1", "refresh": "refresh-1"}
        })
    }

    #[tokio::test]
    async fn login_posts_json_credentials() -> Result<()> {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return Ok(());
        }
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(LOGIN_PATH))
            .and(body_json(json!({"username": "ana", "password": "Xk7#mQ2$vL9"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(auth_body()))
            .expect(1)
            .mount(&server)
            .await;

        let response = login(
            &gateway(&server)?,
            " ana ",
            &SecretString::from("Xk7#mQ2$vL9"),
        )
        .await?;
        assert_eq!(response.user.username, "ana");
        assert_eq!(response.tokens.refresh, "refresh-1");

        let received = server.received_requests().await.unwrap_or_default();
        assert!(received.iter().all(|r| !r.headers.contains_key("authorization")));
        Ok(())
    }

    #[tokio::test]
    async fn rejected_login_keeps_server_message() -> Result<()> {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return Ok(());
        }
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(LOGIN_PATH))
            .respond_with(
                ResponseTemplate::new(401).set_body_json(json!({"error": "Invalid credentials"})),
            )
            .mount(&server)
            .await;

        let result = login(&gateway(&server)?, "ana", &SecretString::from("nope")).await;
        match result {
            Err(AppError::Authentication(error)) => {
                assert_eq!(error, ApiError::General("Invalid credentials".to_string()));
            }
            Err(other) => panic!("expected an authentication error, got {other:?}"),
            Ok(_) => panic!("expected an authentication error, got a session"),
        }
        Ok(())
    }

    #[tokio::test]
    async fn register_reports_field_errors() -> Result<()> {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return Ok(());
        }
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(REGISTER_PATH))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "username": ["A user with that username already exists."]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let form = RegistrationForm {
            username: "ana".to_string(),
            email: "ana@example.com".to_string(),
            password: SecretString::from("Xk7#mQ2$vL9"),
            password_confirmation: SecretString::from("Xk7#mQ2$vL9"),
            first_name: None,
            last_name: None,
            files: Vec::new(),
        };
        let result = register(&gateway(&server)?, &form).await;
        let Err(AppError::Validation(error)) = result else {
            panic!("expected a validation error");
        };
        assert!(error.messages_for("username").is_some());
        Ok(())
    }

    #[tokio::test]
    async fn profile_uses_bearer_token() -> Result<()> {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return Ok(());
        }
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(PROFILE_PATH))
            .and(header("Authorization", "Bearer access-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": 1, "username": "ana", "email": "ana@example.com"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let user = fetch_profile(&gateway(&server)?).await?;
        assert_eq!(user.email, "ana@example.com");
        Ok(())
    }
}
