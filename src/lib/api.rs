//! Request pipeline for the auth API. Every call goes through [`AuthGateway`],
//! which attaches the bearer token, intercepts `401` responses and drives a
//! single-flight token refresh before replaying the request once.
//!
//! Flow Overview:
//! - Build an [`ApiRequest`] (method, path, JSON or multipart body). Requests are
//!   rebuilt from this description on replay, so multipart bodies survive a retry.
//! - Authenticated requests carry `Authorization: Bearer <access>` when a token exists.
//! - On `401`: skip refresh when no refresh token is stored; replay with the current
//!   token if another caller already refreshed; otherwise refresh once and replay.
//! - A failed refresh expires the session, navigates to the login view and
//!   surfaces `AppError::SessionExpired`.
//!
//! Public endpoints (login, register, refresh) never carry a bearer token and
//! never trigger a refresh. Token values are only exposed when writing headers.

use super::{
    APP_USER_AGENT,
    config::AppConfig,
    errors::{ApiError, AppError},
};
use crate::routes::{Navigator, paths};
use reqwest::{Client, Method, Response, StatusCode, multipart};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::Value;
use std::{
    fmt,
    sync::{Arc, Mutex, PoisonError},
    time::Duration,
};
use tokio::sync::OnceCell;
use tracing::{Instrument, debug, info, info_span, warn};

pub const REFRESH_PATH: &str = "/token/refresh/";

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Token access granted to the gateway by the session owner.
///
/// The gateway reads tokens on every request and writes back only through
/// `store_refreshed` and `expire`.
pub trait TokenSink: Send + Sync {
    fn access_token(&self) -> Option<SecretString>;
    fn refresh_token(&self) -> Option<SecretString>;
    fn store_refreshed(&self, access: SecretString, refresh: Option<SecretString>);
    fn expire(&self);
}

/// Body of an API request, kept in a form that can be sent more than once.
#[derive(Clone)]
pub enum RequestBody {
    Empty,
    Json(Value),
    Multipart(MultipartBody),
}

/// Multipart form description: text fields plus binary file parts.
#[derive(Clone, Default)]
pub struct MultipartBody {
    fields: Vec<(String, String)>,
    files: Vec<FilePart>,
}

impl MultipartBody {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn text(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push((name.into(), value.into()));
        self
    }

    #[must_use]
    pub fn file(mut self, part: FilePart) -> Self {
        self.files.push(part);
        self
    }

    #[must_use]
    pub fn field_names(&self) -> Vec<&str> {
        self.fields
            .iter()
            .map(|(name, _)| name.as_str())
            .chain(self.files.iter().map(|part| part.field.as_str()))
            .collect()
    }

    fn to_form(&self) -> Result<multipart::Form, AppError> {
        let mut form = multipart::Form::new();
        for (name, value) in &self.fields {
            form = form.text(name.clone(), value.clone());
        }
        for file in &self.files {
            let part = multipart::Part::bytes(file.bytes.clone())
                .file_name(file.file_name.clone())
                .mime_str(&file.content_type)
                .map_err(|err| {
                    AppError::Serialization(format!("Invalid content type for upload: {err}"))
                })?;
            form = form.part(file.field.clone(), part);
        }
        Ok(form)
    }
}

// Field values may hold passwords, so only names are printed.
impl fmt::Debug for MultipartBody {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("MultipartBody")
            .field("fields", &self.field_names())
            .finish()
    }
}

/// Binary file attached to a multipart request.
#[derive(Clone, PartialEq, Eq)]
pub struct FilePart {
    pub field: String,
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl fmt::Debug for FilePart {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("FilePart")
            .field("field", &self.field)
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// Rebuildable description of one API call.
#[derive(Clone)]
pub struct ApiRequest {
    method: Method,
    path: String,
    body: RequestBody,
    public: bool,
}

impl ApiRequest {
    #[must_use]
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            method: Method::GET,
            path: path.into(),
            body: RequestBody::Empty,
            public: false,
        }
    }

    /// Builds a JSON `POST`.
    ///
    /// # Errors
    /// Returns `AppError::Serialization` if the body cannot be encoded.
    pub fn post_json<B: Serialize>(path: impl Into<String>, body: &B) -> Result<Self, AppError> {
        let value = serde_json::to_value(body)
            .map_err(|err| AppError::Serialization(format!("Failed to encode request: {err}")))?;
        Ok(Self {
            method: Method::POST,
            path: path.into(),
            body: RequestBody::Json(value),
            public: false,
        })
    }

    #[must_use]
    pub fn post_multipart(path: impl Into<String>, body: MultipartBody) -> Self {
        Self {
            method: Method::POST,
            path: path.into(),
            body: RequestBody::Multipart(body),
            public: false,
        }
    }

    /// Marks the request as public: no bearer token, no refresh on `401`.
    #[must_use]
    pub fn public(mut self) -> Self {
        self.public = true;
        self
    }

    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    #[must_use]
    pub fn is_public(&self) -> bool {
        self.public
    }
}

impl fmt::Debug for ApiRequest {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("ApiRequest")
            .field("method", &self.method)
            .field("path", &self.path)
            .field("public", &self.public)
            .finish_non_exhaustive()
    }
}

#[derive(Serialize)]
struct RefreshRequest<'a> {
    refresh: &'a str,
}

#[derive(Deserialize)]
struct RefreshResponse {
    access: String,
    #[serde(default)]
    refresh: Option<String>,
}

type RefreshOutcome = Result<Arc<SecretString>, AppError>;
type RefreshSlot = Arc<OnceCell<RefreshOutcome>>;

/// HTTP boundary of the client.
#[derive(Clone)]
pub struct AuthGateway {
    inner: Arc<GatewayInner>,
}

struct GatewayInner {
    client: Client,
    base_url: String,
    tokens: Arc<dyn TokenSink>,
    navigator: Arc<dyn Navigator>,
    refresh_slot: Mutex<Option<RefreshSlot>>,
}

impl AuthGateway {
    /// Builds a gateway for the configured API base URL.
    ///
    /// # Errors
    /// Returns `AppError::Config` if the base URL is invalid or the HTTP client cannot be built.
    pub fn new(
        config: &AppConfig,
        tokens: Arc<dyn TokenSink>,
        navigator: Arc<dyn Navigator>,
    ) -> Result<Self, AppError> {
        config.validate()?;

        let client = Client::builder()
            .user_agent(APP_USER_AGENT)
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(config.request_timeout)
            .build()
            .map_err(|err| AppError::Config(format!("Failed to build HTTP client: {err}")))?;

        Ok(Self {
            inner: Arc::new(GatewayInner {
                client,
                base_url: config.api_base_url.trim().to_string(),
                tokens,
                navigator,
                refresh_slot: Mutex::new(None),
            }),
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }

    /// Sends a request and decodes a JSON response.
    ///
    /// # Errors
    /// Returns an `AppError` for transport failures, non-success statuses or undecodable bodies.
    pub async fn send_json<T: DeserializeOwned>(&self, request: &ApiRequest) -> Result<T, AppError> {
        let response = self.execute(request).await?;
        handle_json_response(response).await
    }

    /// Sends a request and returns the raw body with its content type.
    ///
    /// # Errors
    /// Returns an `AppError` for transport failures or non-success statuses.
    pub async fn send_bytes(
        &self,
        request: &ApiRequest,
    ) -> Result<(Vec<u8>, Option<String>), AppError> {
        let response = self.execute(request).await?;
        handle_bytes_response(response).await
    }

    /// Runs the request pipeline and returns the final response, successful or not.
    ///
    /// # Errors
    /// Returns an `AppError` for transport failures and `AppError::SessionExpired`
    /// when a required token refresh fails.
    pub async fn execute(&self, request: &ApiRequest) -> Result<Response, AppError> {
        if request.public {
            return self.dispatch(request, None).await;
        }

        let used = self.inner.tokens.access_token();
        let response = self.dispatch(request, used.as_ref()).await?;
        if response.status() != StatusCode::UNAUTHORIZED {
            return Ok(response);
        }

        debug!(path = %request.path, "unauthorized response, recovering access token");
        let Some(access) = self.recover_access(used.as_ref()).await? else {
            return Ok(response);
        };

        // The replay is final: a second 401 is returned to the caller as is.
        self.dispatch(request, Some(&access)).await
    }

    async fn recover_access(
        &self,
        used: Option<&SecretString>,
    ) -> Result<Option<SecretString>, AppError> {
        if self.inner.tokens.refresh_token().is_none() {
            debug!("no refresh token stored, skipping refresh");
            return Ok(None);
        }

        if let Some(current) = self.inner.tokens.access_token() {
            let replaced =
                !used.is_some_and(|used| used.expose_secret() == current.expose_secret());
            if replaced {
                debug!("access token was replaced while the request was in flight");
                return Ok(Some(current));
            }
        }

        let access = self.refresh_single_flight().await?;
        Ok(Some(SecretString::from(access.expose_secret().to_owned())))
    }

    async fn refresh_single_flight(&self) -> RefreshOutcome {
        let slot = {
            let mut guard = self
                .inner
                .refresh_slot
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            Arc::clone(guard.get_or_insert_with(|| Arc::new(OnceCell::new())))
        };

        let outcome = slot.get_or_init(|| self.refresh_access_token()).await.clone();

        let mut guard = self
            .inner
            .refresh_slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if guard
            .as_ref()
            .is_some_and(|current| Arc::ptr_eq(current, &slot))
        {
            *guard = None;
        }

        outcome
    }

    async fn refresh_access_token(&self) -> RefreshOutcome {
        let result = match self.inner.tokens.refresh_token() {
            Some(refresh) => self.request_refresh(&refresh).await,
            None => Err(AppError::SessionExpired(
                "No refresh token available.".to_string(),
            )),
        };

        match result {
            Ok(body) => {
                let rotated = body.refresh.map(SecretString::from);
                self.inner
                    .tokens
                    .store_refreshed(SecretString::from(body.access.clone()), rotated);
                info!("access token refreshed");
                Ok(Arc::new(SecretString::from(body.access)))
            }
            Err(err) => {
                warn!("token refresh failed, ending session: {err}");
                self.inner.tokens.expire();
                self.inner.navigator.navigate(paths::LOGIN);
                Err(match err {
                    AppError::SessionExpired(message) => AppError::SessionExpired(message),
                    other => AppError::SessionExpired(other.to_string()),
                })
            }
        }
    }

    async fn request_refresh(&self, refresh: &SecretString) -> Result<RefreshResponse, AppError> {
        let request = ApiRequest::post_json(
            REFRESH_PATH,
            &RefreshRequest {
                refresh: refresh.expose_secret(),
            },
        )?
        .public();

        let response = self.dispatch(&request, None).await?;
        handle_json_response(response).await
    }

    async fn dispatch(
        &self,
        request: &ApiRequest,
        bearer: Option<&SecretString>,
    ) -> Result<Response, AppError> {
        let url = build_url_with_base(&self.inner.base_url, &request.path);
        let mut builder = self.inner.client.request(request.method.clone(), &url);

        if let Some(token) = bearer {
            builder = builder.bearer_auth(token.expose_secret());
        }

        builder = match &request.body {
            RequestBody::Empty => builder,
            RequestBody::Json(value) => builder.json(value),
            RequestBody::Multipart(body) => builder.multipart(body.to_form()?),
        };

        let span = info_span!(
            "api.request",
            http.method = %request.method,
            url = %url,
            authenticated = bearer.is_some()
        );
        let response = builder
            .send()
            .instrument(span)
            .await
            .map_err(map_request_error)?;

        debug!(status = response.status().as_u16(), url = %url, "api response");

        Ok(response)
    }
}

/// Builds a URL from an explicit base URL and the provided path.
#[must_use]
pub fn build_url_with_base(base_url: &str, path: &str) -> String {
    let base = base_url.trim().trim_end_matches('/');
    let path = path.trim();

    if base.is_empty() {
        path.to_string()
    } else {
        format!("{}/{}", base, path.trim_start_matches('/'))
    }
}

/// Maps transport errors into user-facing `AppError` variants with timeout detection.
fn map_request_error(err: reqwest::Error) -> AppError {
    if err.is_timeout() {
        AppError::Timeout("Request timed out. Please try again.".to_string())
    } else {
        AppError::Network(format!("Unable to reach the server: {err}"))
    }
}

/// Parses JSON responses and surfaces HTTP errors as `AppError`.
///
/// # Errors
/// Returns an `AppError` for non-success statuses or undecodable bodies.
pub async fn handle_json_response<T: DeserializeOwned>(response: Response) -> Result<T, AppError> {
    if response.status().is_success() {
        response
            .json::<T>()
            .await
            .map_err(|err| AppError::Parse(format!("Failed to decode response: {err}")))
    } else {
        Err(error_from_response(response).await)
    }
}

/// Reads a binary response body and its declared content type.
///
/// # Errors
/// Returns an `AppError` for non-success statuses or interrupted bodies.
pub async fn handle_bytes_response(
    response: Response,
) -> Result<(Vec<u8>, Option<String>), AppError> {
    if !response.status().is_success() {
        return Err(error_from_response(response).await);
    }

    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);
    let bytes = response
        .bytes()
        .await
        .map_err(|err| AppError::Network(format!("Failed to read response body: {err}")))?;

    Ok((bytes.to_vec(), content_type))
}

async fn error_from_response(response: Response) -> AppError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    error_from_status(status, &body)
}

/// Classifies an unsuccessful response.
#[must_use]
pub fn error_from_status(status: StatusCode, body: &str) -> AppError {
    let error = ApiError::from_body(body);
    if status == StatusCode::BAD_REQUEST {
        AppError::Validation(error)
    } else {
        AppError::Http {
            status: status.as_u16(),
            error,
        }
    }
}
