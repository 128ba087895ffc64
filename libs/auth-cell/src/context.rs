//! Process-wide observable session state for UI collaborators.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::{watch, Mutex};
use tracing::{debug, info};

use shared_models::auth::{LoginData, PublicUser};

use crate::service::{AuthOutcome, AuthService};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SessionSnapshot {
    pub user: Option<PublicUser>,
    pub token: Option<String>,
    pub is_authenticated: bool,
    pub is_loading: bool,
}

/// Resets `is_loading` when dropped, whatever path the action took.
struct LoadingGuard<'a> {
    state: &'a watch::Sender<SessionSnapshot>,
}

impl<'a> LoadingGuard<'a> {
    fn start(state: &'a watch::Sender<SessionSnapshot>) -> Self {
        state.send_modify(|s| s.is_loading = true);
        Self { state }
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.state.send_modify(|s| s.is_loading = false);
    }
}

pub struct SessionContext {
    service: Arc<AuthService>,
    state: watch::Sender<SessionSnapshot>,
    actions: Mutex<()>,
}

impl SessionContext {
    /// Builds the context and restores any persisted session before returning.
    pub async fn initialize(service: Arc<AuthService>) -> Self {
        let (state, _) = watch::channel(SessionSnapshot {
            is_loading: true,
            ..SessionSnapshot::default()
        });

        let context = Self {
            service,
            state,
            actions: Mutex::new(()),
        };
        context.initialize_auth().await;
        context
    }

    async fn initialize_auth(&self) {
        let _actions = self.actions.lock().await;
        let _loading = LoadingGuard::start(&self.state);
        debug!("Initializing session context");

        match self.service.restore_session().await {
            Some(session) => self.set_authenticated(session),
            None => self.clear_state(),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.state.borrow().clone()
    }

    pub fn service(&self) -> &Arc<AuthService> {
        &self.service
    }

    fn set_authenticated(&self, session: LoginData) {
        self.state.send_modify(|s| {
            s.user = Some(session.user);
            s.token = Some(session.token);
            s.is_authenticated = true;
        });
    }

    fn clear_state(&self) {
        self.state.send_modify(|s| {
            s.user = None;
            s.token = None;
            s.is_authenticated = false;
        });
    }

    pub async fn login(&self, email: &str, password: &str) -> AuthOutcome {
        let _actions = self.actions.lock().await;
        let _loading = LoadingGuard::start(&self.state);

        let result = self.service.login(email, password).await;
        match &result {
            Ok(session) => self.set_authenticated(session.clone()),
            Err(_) => self.clear_state(),
        }
        result.into()
    }

    pub async fn logout(&self) -> AuthOutcome {
        let _actions = self.actions.lock().await;
        self.logout_locked().await
    }

    // Caller holds `actions`.
    async fn logout_locked(&self) -> AuthOutcome {
        let _loading = LoadingGuard::start(&self.state);

        self.service.logout().await;
        self.clear_state();
        AuthOutcome::done()
    }

    pub async fn register(&self, email: &str, password: &str, name: Option<&str>) -> AuthOutcome {
        let _actions = self.actions.lock().await;
        let _loading = LoadingGuard::start(&self.state);

        self.service.register(email, password, name).await.into()
    }

    /// Re-reads the user from the persisted token; logs out if it no longer decodes.
    pub async fn refresh_user(&self) -> AuthOutcome {
        let _actions = self.actions.lock().await;

        if !self.state.borrow().is_authenticated {
            return AuthOutcome::failure("Not authenticated");
        }

        match self.service.current_user().await {
            Some(user) => {
                self.state.send_modify(|s| s.user = Some(user.clone()));
                AuthOutcome::with_user(user)
            }
            None => {
                info!("Session token no longer valid, logging out");
                self.logout_locked().await;
                AuthOutcome::failure("Failed to refresh user")
            }
        }
    }

    /// Returns whether the persisted token is still valid, logging out an
    /// authenticated context whose token has lapsed.
    pub async fn check_auth_status(&self) -> bool {
        let _actions = self.actions.lock().await;

        let valid = self.service.is_valid().await;
        let authenticated = self.state.borrow().is_authenticated;
        if !valid && authenticated {
            info!("Session expired, logging out");
            self.logout_locked().await;
        }
        valid
    }

    /// Closes the state channel; subscribers observe the sender going away.
    pub fn shutdown(self) {
        debug!("Session context shut down");
    }
}
