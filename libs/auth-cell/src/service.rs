use std::fmt::Display;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

use shared_config::AppConfig;
use shared_models::auth::{LoginData, PublicUser};
use shared_utils::token::{token_preview, TokenCodec, UnsignedTokenCodec};

use crate::credentials::CredentialStore;
use crate::error::AuthError;
use crate::session::SessionStore;
use crate::storage::FileKeyValueStore;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthState {
    Unauthenticated,
    Authenticating,
    Authenticated(PublicUser),
}

impl AuthState {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, AuthState::Authenticated(_))
    }
}

/// Uniform `{ok, user?, token?, error?}` result for UI-facing callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthOutcome {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<PublicUser>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AuthOutcome {
    pub fn done() -> Self {
        Self {
            ok: true,
            user: None,
            token: None,
            error: None,
        }
    }

    pub fn with_user(user: PublicUser) -> Self {
        Self {
            user: Some(user),
            ..Self::done()
        }
    }

    pub fn failure(error: impl Display) -> Self {
        Self {
            ok: false,
            user: None,
            token: None,
            error: Some(error.to_string()),
        }
    }
}

impl From<Result<LoginData, AuthError>> for AuthOutcome {
    fn from(result: Result<LoginData, AuthError>) -> Self {
        match result {
            Ok(data) => Self {
                token: Some(data.token),
                ..Self::with_user(data.user)
            },
            Err(e) => Self::failure(e),
        }
    }
}

impl From<Result<PublicUser, AuthError>> for AuthOutcome {
    fn from(result: Result<PublicUser, AuthError>) -> Self {
        match result {
            Ok(user) => Self::with_user(user),
            Err(e) => Self::failure(e),
        }
    }
}

/// Both fields must be present. Email is compared trimmed, passwords are not.
pub fn require_credentials<'a>(
    email: Option<&'a str>,
    password: Option<&'a str>,
) -> Result<(&'a str, &'a str), AuthError> {
    match (email.map(str::trim), password) {
        (Some(email), Some(password)) if !email.is_empty() && !password.is_empty() => {
            Ok((email, password))
        }
        _ => Err(AuthError::Validation("Email and password are required".to_string())),
    }
}

/// Login, registration, logout and session restoration over a credential
/// table, a persisted token slot and a token codec.
///
/// Session-mutating calls are serialised through a single-flight lock, so a
/// logout issued while a login is suspended on storage runs after it.
pub struct AuthService {
    credentials: Arc<CredentialStore>,
    sessions: SessionStore,
    codec: Arc<dyn TokenCodec>,
    state: RwLock<AuthState>,
    flight: Mutex<()>,
    expose_demo_accounts: bool,
}

impl AuthService {
    pub fn new(
        credentials: Arc<CredentialStore>,
        sessions: SessionStore,
        codec: Arc<dyn TokenCodec>,
    ) -> Self {
        Self {
            credentials,
            sessions,
            codec,
            state: RwLock::new(AuthState::Unauthenticated),
            flight: Mutex::new(()),
            expose_demo_accounts: true,
        }
    }

    /// Demo accounts, unsigned tokens, and the session file named in the config.
    pub fn from_config(config: &AppConfig) -> Self {
        let storage = FileKeyValueStore::new(&config.session_store_path);
        Self::new(
            Arc::new(CredentialStore::demo()),
            SessionStore::new(Arc::new(storage)),
            Arc::new(UnsignedTokenCodec::new(config.token_ttl_ms())),
        )
        .with_demo_accounts_exposed(config.expose_demo_accounts)
    }

    /// Whether an invalid login lists the known accounts. Debug aid only.
    pub fn with_demo_accounts_exposed(mut self, expose: bool) -> Self {
        self.expose_demo_accounts = expose;
        self
    }

    pub fn credentials(&self) -> &Arc<CredentialStore> {
        &self.credentials
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    pub async fn state(&self) -> AuthState {
        self.state.read().await.clone()
    }

    async fn set_state(&self, state: AuthState) {
        *self.state.write().await = state;
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<LoginData, AuthError> {
        let _flight = self.flight.lock().await;
        debug!("Login attempt for {}", email.trim());

        self.set_state(AuthState::Authenticating).await;
        let result = self.authenticate(email, password).await;

        match &result {
            Ok(data) => {
                info!("Login successful for {}", data.user.email);
                self.set_state(AuthState::Authenticated(data.user.clone())).await;
            }
            Err(e) => {
                debug!("Login failed for {}: {}", email.trim(), e);
                if let Err(e) = self.sessions.clear().await {
                    warn!("Failed to clear session token after failed login: {}", e);
                }
                self.set_state(AuthState::Unauthenticated).await;
            }
        }

        result
    }

    async fn authenticate(&self, email: &str, password: &str) -> Result<LoginData, AuthError> {
        let (email, password) = require_credentials(Some(email), Some(password))?;

        let record = match self.credentials.find_by_credentials(email, password).await {
            Some(record) => record,
            None => return Err(self.invalid_credentials().await),
        };

        let user = record.to_public();
        let token = self.codec.encode(&user)?;
        self.sessions.persist(&token).await?;

        Ok(LoginData { token, user })
    }

    async fn invalid_credentials(&self) -> AuthError {
        if self.expose_demo_accounts {
            let emails = self.credentials.emails().await;
            AuthError::InvalidCredentials(format!(
                "Invalid email or password. Available users: {}",
                emails.join(", ")
            ))
        } else {
            AuthError::InvalidCredentials("Invalid email or password".to_string())
        }
    }

    /// Adds a user. Does not sign them in.
    pub async fn register(
        &self,
        email: &str,
        password: &str,
        name: Option<&str>,
    ) -> Result<PublicUser, AuthError> {
        let _flight = self.flight.lock().await;

        let (email, password) = require_credentials(Some(email), Some(password))?;
        let record = self.credentials.add(email, password, name).await?;

        info!("User registered: {}", record.email);
        Ok(record.to_public())
    }

    /// Clears the persisted token. Storage failures are logged and ignored.
    pub async fn logout(&self) {
        let _flight = self.flight.lock().await;

        if let Err(e) = self.sessions.clear().await {
            warn!("Failed to clear session token during logout: {}", e);
        }
        self.set_state(AuthState::Unauthenticated).await;
        info!("Logged out");
    }

    /// Rebuilds the state from the persisted token. Any failure ends in
    /// `Unauthenticated` with the stale token removed.
    pub async fn restore_session(&self) -> Option<LoginData> {
        let _flight = self.flight.lock().await;

        let token = match self.sessions.read().await {
            Ok(Some(token)) => token,
            Ok(None) => {
                debug!("No persisted session token");
                self.set_state(AuthState::Unauthenticated).await;
                return None;
            }
            Err(e) => {
                warn!("Failed to read session token: {}", e);
                self.set_state(AuthState::Unauthenticated).await;
                return None;
            }
        };

        match self.codec.decode(&token) {
            Ok(claims) => {
                let user = claims.user();
                info!("Session restored for {}", user.email);
                self.set_state(AuthState::Authenticated(user.clone())).await;
                Some(LoginData { token, user })
            }
            Err(e) => {
                debug!("Discarding stale session token {}: {}", token_preview(&token), e);
                if let Err(e) = self.sessions.clear().await {
                    warn!("Failed to clear stale session token: {}", e);
                }
                self.set_state(AuthState::Unauthenticated).await;
                None
            }
        }
    }

    /// Re-decodes the persisted token without touching the state.
    pub async fn is_valid(&self) -> bool {
        self.current_user().await.is_some()
    }

    pub async fn current_user(&self) -> Option<PublicUser> {
        let token = match self.sessions.read().await {
            Ok(token) => token?,
            Err(e) => {
                warn!("Failed to read session token: {}", e);
                return None;
            }
        };

        match self.codec.decode(&token) {
            Ok(claims) => Some(claims.user()),
            Err(e) => {
                debug!("Persisted token no longer decodes: {}", e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use shared_utils::test_utils::{TestUser, TokenTestUtils, DEMO_EMAIL, DEMO_PASSWORD};

    use crate::storage::MemoryKeyValueStore;

    fn service_with(storage: Arc<MemoryKeyValueStore>) -> AuthService {
        AuthService::new(
            Arc::new(CredentialStore::demo()),
            SessionStore::new(storage),
            Arc::new(UnsignedTokenCodec::default()),
        )
    }

    fn service() -> AuthService {
        service_with(Arc::new(MemoryKeyValueStore::new()))
    }

    #[tokio::test]
    async fn login_issues_token_for_demo_user() {
        let service = service();
        let data = service.login(DEMO_EMAIL, DEMO_PASSWORD).await.unwrap();

        assert_eq!(data.user.id, 1);
        let claims = UnsignedTokenCodec::default().decode(&data.token).unwrap();
        assert_eq!(claims.id, 1);
        assert_eq!(service.sessions().read().await.unwrap(), Some(data.token));
        assert_eq!(service.state().await, AuthState::Authenticated(TestUser::demo()));
    }

    #[tokio::test]
    async fn login_with_wrong_password_fails() {
        let service = service();
        let err = service.login(DEMO_EMAIL, "wrong").await.unwrap_err();

        assert_matches!(&err, AuthError::InvalidCredentials(msg) if msg.contains("user@test.com"));
        assert_eq!(service.state().await, AuthState::Unauthenticated);
        assert_eq!(service.sessions().read().await.unwrap(), None);
    }

    #[tokio::test]
    async fn hidden_accounts_give_generic_message() {
        let service = service().with_demo_accounts_exposed(false);
        let err = service.login(DEMO_EMAIL, "wrong").await.unwrap_err();
        assert_eq!(err.to_string(), "Invalid email or password");
    }

    #[tokio::test]
    async fn login_requires_both_fields() {
        let service = service();
        assert_matches!(service.login("", DEMO_PASSWORD).await, Err(AuthError::Validation(_)));
        assert_matches!(service.login(DEMO_EMAIL, "").await, Err(AuthError::Validation(_)));
    }

    #[tokio::test]
    async fn login_fails_when_storage_unavailable() {
        let storage = Arc::new(MemoryKeyValueStore::new());
        storage.set_available(false);
        let service = service_with(storage);

        assert_matches!(service.login(DEMO_EMAIL, DEMO_PASSWORD).await, Err(AuthError::Storage(_)));
        assert_eq!(service.state().await, AuthState::Unauthenticated);
    }

    #[tokio::test]
    async fn register_rejects_duplicate_email_any_case() {
        let service = service();
        assert_matches!(
            service.register("DEMO@EXAMPLE.COM", "pw", Some("Again")).await,
            Err(AuthError::DuplicateEmail)
        );
        assert_eq!(service.credentials().len().await, 3);
    }

    #[tokio::test]
    async fn register_does_not_sign_in() {
        let service = service();
        let user = service.register("new@example.com", "pw", Some("New")).await.unwrap();

        assert_eq!(user.id, 4);
        assert_eq!(service.state().await, AuthState::Unauthenticated);
        assert!(service.login("new@example.com", "pw").await.is_ok());
    }

    #[tokio::test]
    async fn logout_then_restore_is_unauthenticated() {
        let service = service();
        service.login(DEMO_EMAIL, DEMO_PASSWORD).await.unwrap();

        service.logout().await;
        assert!(service.restore_session().await.is_none());
        assert_eq!(service.state().await, AuthState::Unauthenticated);
        assert_eq!(service.sessions().read().await.unwrap(), None);
    }

    #[tokio::test]
    async fn logout_succeeds_when_storage_unavailable() {
        let storage = Arc::new(MemoryKeyValueStore::new());
        let service = service_with(storage.clone());
        service.login(DEMO_EMAIL, DEMO_PASSWORD).await.unwrap();

        storage.set_available(false);
        service.logout().await;
        assert_eq!(service.state().await, AuthState::Unauthenticated);
    }

    #[tokio::test]
    async fn restore_picks_up_persisted_token() {
        let storage = Arc::new(MemoryKeyValueStore::new());
        service_with(storage.clone()).login(DEMO_EMAIL, DEMO_PASSWORD).await.unwrap();

        let restarted = service_with(storage);
        let restored = restarted.restore_session().await.unwrap();
        assert_eq!(restored.user, TestUser::demo());
        assert!(restarted.state().await.is_authenticated());
    }

    #[tokio::test]
    async fn restore_clears_expired_token() {
        let service = service();
        let expired = TokenTestUtils::create_expired_unsigned_token(&TestUser::demo());
        service.sessions().persist(&expired).await.unwrap();

        assert!(!service.is_valid().await);
        assert!(service.restore_session().await.is_none());
        assert_eq!(service.sessions().read().await.unwrap(), None);
    }

    #[tokio::test]
    async fn restore_survives_unreadable_storage() {
        let storage = Arc::new(MemoryKeyValueStore::new());
        storage.set_available(false);
        let service = service_with(storage);

        assert!(service.restore_session().await.is_none());
        assert_eq!(service.state().await, AuthState::Unauthenticated);
    }

    #[tokio::test]
    async fn is_valid_does_not_change_state() {
        let service = service();
        service.login(DEMO_EMAIL, DEMO_PASSWORD).await.unwrap();
        assert!(service.is_valid().await);

        service.sessions().persist("garbage").await.unwrap();
        assert!(!service.is_valid().await);
        assert!(service.state().await.is_authenticated());
    }

    #[tokio::test]
    async fn from_config_persists_to_session_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig {
            session_store_path: dir.path().join("session.json").to_string_lossy().into_owned(),
            expose_demo_accounts: false,
            ..AppConfig::default()
        };

        AuthService::from_config(&config).login(DEMO_EMAIL, DEMO_PASSWORD).await.unwrap();

        let restarted = AuthService::from_config(&config);
        assert!(restarted.restore_session().await.is_some());
        assert_eq!(
            restarted.login(DEMO_EMAIL, "wrong").await.unwrap_err().to_string(),
            "Invalid email or password"
        );
    }

    #[test]
    fn outcome_flattens_errors() {
        let outcome = AuthOutcome::from(Err::<PublicUser, _>(AuthError::DuplicateEmail));
        assert!(!outcome.ok);
        assert_eq!(outcome.error.as_deref(), Some("User with this email already exists"));
    }
}
