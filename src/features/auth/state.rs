//! Session state for the client. A [`SessionStore`] owns the token pair, the
//! profile and the auth state; it is created explicitly and handed to whoever
//! needs it. The store hydrates once through [`SessionStore::init`], publishes
//! every state change on a `watch` channel and persists tokens through a
//! [`TokenStorage`]. In-memory locks are never held across an `.await`.

use crate::app_lib::{AppError, AuthGateway, TokenSink, config::AppConfig};
use crate::features::auth::{
    client,
    storage::{ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY, TokenStorage},
    types::{AuthResponse, RegistrationForm, TokenPair, User},
};
use crate::routes::Navigator;
use secrecy::{ExposeSecret, SecretString};
use std::sync::{Arc, PoisonError, RwLock};
use tokio::sync::{OnceCell, watch};
use tracing::{debug, info, warn};

/// Where the session stands.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AuthState {
    /// Not hydrated yet.
    Unknown,
    /// A stored access token is being checked against the profile endpoint.
    Authenticating,
    Authenticated,
    Anonymous,
}

impl AuthState {
    /// True once the session has resolved to signed in or signed out.
    #[must_use]
    pub fn is_settled(self) -> bool {
        matches!(self, Self::Authenticated | Self::Anonymous)
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::Authenticating => "authenticating",
            Self::Authenticated => "authenticated",
            Self::Anonymous => "anonymous",
        }
    }
}

#[derive(Default)]
struct Credentials {
    access: Option<SecretString>,
    refresh: Option<SecretString>,
}

struct SessionInner {
    storage: Arc<dyn TokenStorage>,
    credentials: RwLock<Credentials>,
    user: RwLock<Option<User>>,
    state: watch::Sender<AuthState>,
}

impl SessionInner {
    fn set_state(&self, next: AuthState) {
        let previous = self.state.send_replace(next);
        if previous != next {
            info!(from = previous.as_str(), to = next.as_str(), "session state changed");
        }
    }

    fn set_user(&self, user: Option<User>) {
        *self.user.write().unwrap_or_else(PoisonError::into_inner) = user;
    }

    fn persist(&self, key: &str, value: Option<&SecretString>) {
        let result = match value {
            Some(token) => self.storage.set(key, token.expose_secret()),
            None => self.storage.remove(key),
        };
        if let Err(err) = result {
            warn!(key, "failed to update token storage: {err}");
        }
    }

    /// Persists both tokens before adopting them. On a failed write the durable
    /// keys are cleared so a half-written pair never outlives the process.
    fn store_pair(&self, pair: TokenPair) -> Result<(), AppError> {
        let stored = self
            .storage
            .set(ACCESS_TOKEN_KEY, pair.access.expose_secret())
            .and_then(|()| {
                self.storage
                    .set(REFRESH_TOKEN_KEY, pair.refresh.expose_secret())
            });
        if let Err(err) = stored {
            self.persist(ACCESS_TOKEN_KEY, None);
            self.persist(REFRESH_TOKEN_KEY, None);
            return Err(err);
        }

        let mut credentials = self
            .credentials
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        credentials.access = Some(pair.access);
        credentials.refresh = Some(pair.refresh);
        Ok(())
    }

    fn forget_credentials(&self) {
        *self
            .credentials
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Credentials::default();
        self.set_user(None);
    }

    fn clear(&self) {
        self.forget_credentials();
        self.persist(ACCESS_TOKEN_KEY, None);
        self.persist(REFRESH_TOKEN_KEY, None);
        self.set_state(AuthState::Anonymous);
    }
}

impl TokenSink for SessionInner {
    fn access_token(&self) -> Option<SecretString> {
        self.credentials
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .access
            .clone()
    }

    fn refresh_token(&self) -> Option<SecretString> {
        self.credentials
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .refresh
            .clone()
    }

    fn store_refreshed(&self, access: SecretString, refresh: Option<SecretString>) {
        self.persist(ACCESS_TOKEN_KEY, Some(&access));
        if let Some(refresh) = &refresh {
            self.persist(REFRESH_TOKEN_KEY, Some(refresh));
        }

        let mut credentials = self
            .credentials
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        credentials.access = Some(access);
        if refresh.is_some() {
            credentials.refresh = refresh;
        }
    }

    fn expire(&self) {
        warn!("session expired, clearing stored credentials");
        self.clear();
    }
}

/// Owned session container.
#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<SessionInner>,
    gateway: AuthGateway,
    initialized: Arc<OnceCell<()>>,
}

impl SessionStore {
    /// Builds a store, loading any persisted tokens. The state starts as `Unknown`.
    ///
    /// # Errors
    /// Returns `AppError::Config` for an unusable configuration and
    /// `AppError::Storage` if persisted tokens cannot be read.
    pub fn new(
        config: &AppConfig,
        storage: Arc<dyn TokenStorage>,
        navigator: Arc<dyn Navigator>,
    ) -> Result<Self, AppError> {
        let credentials = Credentials {
            access: storage.get(ACCESS_TOKEN_KEY)?.map(SecretString::from),
            refresh: storage.get(REFRESH_TOKEN_KEY)?.map(SecretString::from),
        };
        let (state, _) = watch::channel(AuthState::Unknown);

        let inner = Arc::new(SessionInner {
            storage,
            credentials: RwLock::new(credentials),
            user: RwLock::new(None),
            state,
        });
        let gateway = AuthGateway::new(config, inner.clone(), navigator)?;

        Ok(Self {
            inner,
            gateway,
            initialized: Arc::new(OnceCell::new()),
        })
    }

    /// Gateway bound to this session's tokens.
    #[must_use]
    pub fn gateway(&self) -> &AuthGateway {
        &self.gateway
    }

    /// Resolves the persisted session. Runs once per store; later calls return
    /// the current state without touching the network.
    pub async fn init(&self) -> AuthState {
        self.initialized.get_or_init(|| self.hydrate()).await;
        self.state()
    }

    async fn hydrate(&self) {
        if self.inner.access_token().is_none() {
            debug!("no stored access token");
            self.inner.set_state(AuthState::Anonymous);
            return;
        }

        self.inner.set_state(AuthState::Authenticating);
        match client::fetch_profile(&self.gateway).await {
            Ok(user) => {
                info!(username = %user.username, "session restored");
                self.inner.set_user(Some(user));
                self.inner.set_state(AuthState::Authenticated);
            }
            Err(err) => {
                warn!("stored session is no longer valid: {err}");
                self.logout();
            }
        }
    }

    /// Signs in with username and password.
    ///
    /// # Errors
    /// Returns the server's rejection unchanged inside the `AppError`, or
    /// `AppError::Storage` if the issued tokens cannot be persisted.
    pub async fn login(&self, username: &str, password: &SecretString) -> Result<User, AppError> {
        let response = client::login(&self.gateway, username, password).await?;
        self.establish(response)
    }

    /// Registers a new account and signs it in.
    ///
    /// # Errors
    /// Returns `AppError::Validation` for local or server-side field errors,
    /// `AppError::Storage` if the issued tokens cannot be persisted, and any
    /// transport error.
    pub async fn register(&self, form: &RegistrationForm) -> Result<User, AppError> {
        form.validate()?;
        let response = client::register(&self.gateway, form).await?;
        if let Some(message) = response.message.as_deref() {
            debug!(message, "registration accepted");
        }
        self.establish(response)
    }

    fn establish(&self, response: AuthResponse) -> Result<User, AppError> {
        let AuthResponse { user, tokens, .. } = response;
        if let Err(err) = self.inner.store_pair(tokens.into()) {
            warn!("signed in but the tokens could not be stored: {err}");
            return Err(err);
        }
        self.inner.set_user(Some(user.clone()));
        self.inner.set_state(AuthState::Authenticated);
        let _ = self.initialized.set(());
        info!(username = %user.username, "signed in");
        Ok(user)
    }

    /// Clears profile, tokens and durable storage. Safe to call repeatedly.
    pub fn logout(&self) {
        self.inner.clear();
    }

    /// Current access token.
    #[must_use]
    pub fn token(&self) -> Option<SecretString> {
        self.inner.access_token()
    }

    #[must_use]
    pub fn state(&self) -> AuthState {
        *self.inner.state.borrow()
    }

    #[must_use]
    pub fn user(&self) -> Option<User> {
        self.inner
            .user
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.state() == AuthState::Authenticated
    }

    /// Receiver notified on every state change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.inner.state.subscribe()
    }

    /// Drops in-memory credentials without touching durable storage.
    pub fn dispose(self) {
        self.inner.forget_credentials();
        self.inner.set_state(AuthState::Unknown);
        debug!("session disposed");
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::{AuthState, SessionStore};
    use crate::app_lib::{AppError, config::AppConfig};
    use crate::features::auth::storage::{
        ACCESS_TOKEN_KEY, FileStorage, MemoryStorage, REFRESH_TOKEN_KEY, TokenStorage,
    };
    use crate::routes::{HistoryNavigator, paths};
    use anyhow::Result;
    use secrecy::{ExposeSecret, SecretString};
    use serde_json::json;
    use std::{net::TcpListener, sync::Arc};
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn can_bind_localhost() -> bool {
        TcpListener::bind("127.0.0.1:0").is_ok()
    }

    struct Fixture {
        session: SessionStore,
        storage: Arc<MemoryStorage>,
        navigator: Arc<HistoryNavigator>,
    }

    fn fixture(server: &MockServer, stored: &[(&str, &str)]) -> Fixture {
        let storage = Arc::new(MemoryStorage::new());
        for (key, value) in stored {
            storage.set(key, value).unwrap();
        }
        let navigator = Arc::new(HistoryNavigator::default());
        let config = AppConfig {
            api_base_url: server.uri(),
            ..AppConfig::default()
        };
        let session = SessionStore::new(&config, storage.clone(), navigator.clone()).unwrap();
        Fixture {
            session,
            storage,
            navigator,
        }
    }

    async fn mount_login(server: &MockServer) {
        Mock::given(method("POST"))
            .and(path("/login/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "user": {"id": 1, "username": "ana", "email": "ana@example.com"},
                "tokens": {"access": "access-1", "refresh": "refresh-1"}
            })))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn login_persists_tokens_and_logout_clears_them() -> Result<()> {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return Ok(());
        }
        let server = MockServer::start().await;
        mount_login(&server).await;
        let Fixture {
            session, storage, ..
        } = fixture(&server, &[]);
        let mut updates = session.subscribe();

        let user = session
            .login("ana", &SecretString::from("Xk7#mQ2$vL9"))
            .await?;
        assert_eq!(user.username, "ana");
        assert_eq!(session.state(), AuthState::Authenticated);
        assert!(updates.has_changed()?);
        assert_eq!(*updates.borrow_and_update(), AuthState::Authenticated);
        assert_eq!(
            session.token().map(|t| t.expose_secret().to_string()),
            Some("access-1".to_string())
        );
        assert_eq!(storage.get(ACCESS_TOKEN_KEY)?.as_deref(), Some("access-1"));
        assert_eq!(storage.get(REFRESH_TOKEN_KEY)?.as_deref(), Some("refresh-1"));

        session.logout();
        assert!(session.token().is_none());
        assert!(session.user().is_none());
        assert_eq!(session.state(), AuthState::Anonymous);
        assert_eq!(storage.get(ACCESS_TOKEN_KEY)?, None);
        assert_eq!(storage.get(REFRESH_TOKEN_KEY)?, None);

        session.logout();
        assert_eq!(session.state(), AuthState::Anonymous);
        Ok(())
    }

    #[tokio::test]
    async fn failed_login_leaves_session_untouched() -> Result<()> {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return Ok(());
        }
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/login/"))
            .respond_with(
                ResponseTemplate::new(401).set_body_json(json!({"error": "Invalid credentials"})),
            )
            .mount(&server)
            .await;
        let Fixture {
            session, storage, ..
        } = fixture(&server, &[]);
        session.init().await;

        let result = session.login("ana", &SecretString::from("wrong")).await;
        assert!(matches!(result, Err(AppError::Authentication(_))));
        assert_eq!(session.state(), AuthState::Anonymous);
        assert_eq!(storage.get(ACCESS_TOKEN_KEY)?, None);
        Ok(())
    }

    #[tokio::test]
    async fn init_without_token_is_anonymous() -> Result<()> {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return Ok(());
        }
        let server = MockServer::start().await;
        let Fixture { session, .. } = fixture(&server, &[]);

        assert_eq!(session.state(), AuthState::Unknown);
        assert_eq!(session.init().await, AuthState::Anonymous);
        assert!(server.received_requests().await.unwrap_or_default().is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn init_restores_profile_once() -> Result<()> {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return Ok(());
        }
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/profile/"))
            .and(header("Authorization", "Bearer access-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": 1, "username": "ana", "email": "ana@example.com"
            })))
            .expect(1)
            .mount(&server)
            .await;
        let Fixture { session, .. } = fixture(
            &server,
            &[(ACCESS_TOKEN_KEY, "access-1"), (REFRESH_TOKEN_KEY, "refresh-1")],
        );

        let (first, second) = tokio::join!(session.init(), session.init());
        assert_eq!(first, AuthState::Authenticated);
        assert_eq!(second, AuthState::Authenticated);
        assert_eq!(session.init().await, AuthState::Authenticated);
        assert_eq!(session.user().map(|u| u.username), Some("ana".to_string()));
        Ok(())
    }

    #[tokio::test]
    async fn init_with_stale_token_settles_anonymous() -> Result<()> {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return Ok(());
        }
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/profile/"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/token/refresh/"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "detail": "Token is invalid or expired"
            })))
            .expect(1)
            .mount(&server)
            .await;
        let Fixture {
            session,
            storage,
            navigator,
        } = fixture(
            &server,
            &[(ACCESS_TOKEN_KEY, "stale"), (REFRESH_TOKEN_KEY, "expired")],
        );

        assert_eq!(session.init().await, AuthState::Anonymous);
        assert!(session.token().is_none());
        assert_eq!(storage.get(ACCESS_TOKEN_KEY)?, None);
        assert_eq!(storage.get(REFRESH_TOKEN_KEY)?, None);
        assert_eq!(navigator.history(), vec![paths::LOGIN.to_string()]);
        Ok(())
    }

    #[tokio::test]
    async fn refreshed_tokens_reach_storage() -> Result<()> {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return Ok(());
        }
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/profile/"))
            .and(header("Authorization", "Bearer stale"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/token/refresh/"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"access": "fresh", "refresh": "refresh-2"})),
            )
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/profile/"))
            .and(header("Authorization", "Bearer fresh"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": 1, "username": "ana"
            })))
            .mount(&server)
            .await;
        let Fixture {
            session, storage, ..
        } = fixture(
            &server,
            &[(ACCESS_TOKEN_KEY, "stale"), (REFRESH_TOKEN_KEY, "refresh-1")],
        );

        assert_eq!(session.init().await, AuthState::Authenticated);
        assert_eq!(storage.get(ACCESS_TOKEN_KEY)?.as_deref(), Some("fresh"));
        assert_eq!(storage.get(REFRESH_TOKEN_KEY)?.as_deref(), Some("refresh-2"));
        Ok(())
    }

    #[tokio::test]
    async fn dispose_keeps_durable_tokens() -> Result<()> {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return Ok(());
        }
        let server = MockServer::start().await;
        mount_login(&server).await;
        let Fixture {
            session, storage, ..
        } = fixture(&server, &[]);
        let updates = session.subscribe();

        session
            .login("ana", &SecretString::from("Xk7#mQ2$vL9"))
            .await?;
        session.dispose();

        assert_eq!(*updates.borrow(), AuthState::Unknown);
        assert_eq!(storage.get(ACCESS_TOKEN_KEY)?.as_deref(), Some("access-1"));
        Ok(())
    }

    /// Accepts reads and removals but refuses every write.
    struct ReadOnlyStorage;

    impl TokenStorage for ReadOnlyStorage {
        fn get(&self, _key: &str) -> Result<Option<String>, AppError> {
            Ok(None)
        }

        fn set(&self, _key: &str, _value: &str) -> Result<(), AppError> {
            Err(AppError::Storage("read-only token store".to_string()))
        }

        fn remove(&self, _key: &str) -> Result<(), AppError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn login_fails_when_tokens_cannot_be_stored() -> Result<()> {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return Ok(());
        }
        let server = MockServer::start().await;
        mount_login(&server).await;
        let config = AppConfig {
            api_base_url: server.uri(),
            ..AppConfig::default()
        };
        let session = SessionStore::new(
            &config,
            Arc::new(ReadOnlyStorage),
            Arc::new(HistoryNavigator::default()),
        )?;
        session.init().await;

        let result = session
            .login("ana", &SecretString::from("Xk7#mQ2$vL9"))
            .await;
        assert!(matches!(result, Err(AppError::Storage(_))));
        assert_eq!(session.state(), AuthState::Anonymous);
        assert!(session.token().is_none());
        assert!(session.user().is_none());
        Ok(())
    }

    #[tokio::test]
    async fn logout_clears_a_corrupt_token_file() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let token_file = dir.path().join("tokens.json");
        std::fs::write(&token_file, "{not json")?;

        let session = SessionStore::new(
            &AppConfig::default(),
            Arc::new(FileStorage::new(&token_file)),
            Arc::new(HistoryNavigator::default()),
        )?;
        assert_eq!(session.init().await, AuthState::Anonymous);

        session.logout();
        session.logout();

        assert_eq!(session.state(), AuthState::Anonymous);
        assert!(!token_file.exists());
        Ok(())
    }
}
