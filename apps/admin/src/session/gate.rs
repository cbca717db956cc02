use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::redirect::LoginRedirect;
use super::{ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY};
use crate::api::ApiClient;
use crate::errors::ApiError;
use crate::models::User;

/// `Checking → {Authenticated, Unauthenticated}`.
#[derive(Debug, Clone)]
pub enum AuthState {
    Checking,
    Authenticated(User),
    Unauthenticated,
}

impl AuthState {
    pub fn user(&self) -> Option<&User> {
        match self {
            AuthState::Authenticated(user) => Some(user),
            _ => None,
        }
    }
}

/// What a protected screen should do right now.
#[derive(Debug, Clone)]
pub enum GateDecision {
    Render(User),
    RedirectToLogin,
    Wait,
}

/// Tracks who is signed in. Cloning shares the same state, so the redirect
/// hook handed to the API client and the gate used by screens stay in sync.
#[derive(Clone)]
pub struct AuthGate {
    state: Arc<RwLock<AuthState>>,
}

impl Default for AuthGate {
    fn default() -> Self {
        Self::new()
    }
}

impl AuthGate {
    pub fn new() -> Self {
        Self {
            state: Arc::new(RwLock::new(AuthState::Checking)),
        }
    }

    pub fn state(&self) -> AuthState {
        self.state.read().clone()
    }

    fn set(&self, next: AuthState) {
        *self.state.write() = next;
    }

    /// Wraps `next` so that a 401 seen by the client also flips this gate to
    /// `Unauthenticated` before navigation happens.
    pub fn redirect_hook(&self, next: Arc<dyn LoginRedirect>) -> Arc<dyn LoginRedirect> {
        Arc::new(GateRedirect {
            state: Arc::clone(&self.state),
            next,
        })
    }

    pub fn decide(&self) -> GateDecision {
        match self.state() {
            AuthState::Checking => GateDecision::Wait,
            AuthState::Authenticated(user) => GateDecision::Render(user),
            AuthState::Unauthenticated => GateDecision::RedirectToLogin,
        }
    }

    /// Entry check for protected screens. `Err` carries what to do instead
    /// of rendering.
    pub fn require_authenticated(&self) -> Result<User, GateDecision> {
        match self.decide() {
            GateDecision::Render(user) => Ok(user),
            other => Err(other),
        }
    }

    /// Resolves `Checking` by asking the backend who the stored token
    /// belongs to. Non-auth failures also land in `Unauthenticated` but keep
    /// the tokens, so a later check can still succeed.
    pub async fn check(&self, client: &ApiClient) -> AuthState {
        if client.credentials().access_token().is_none() {
            debug!("No stored access token");
            self.set(AuthState::Unauthenticated);
            return self.state();
        }

        match client.current_user().await {
            Ok(user) => self.set(AuthState::Authenticated(user)),
            Err(e) => {
                if !e.is_unauthorized() {
                    warn!("Auth check failed: {e}");
                }
                self.set(AuthState::Unauthenticated);
            }
        }
        self.state()
    }

    /// Stores the issued tokens and resolves the user. If the user cannot be
    /// resolved the tokens are dropped again, so a failed login never leaves
    /// a session behind for the next `check()`.
    pub async fn login(
        &self,
        client: &ApiClient,
        username: &str,
        password: &str,
    ) -> Result<User, ApiError> {
        let tokens = client.obtain_token(username, password).await?;
        let store = client.credentials();
        store.set(ACCESS_TOKEN_KEY, &tokens.access)?;
        store.set(REFRESH_TOKEN_KEY, &tokens.refresh)?;

        let user = match tokens.user {
            Some(user) => user,
            None => match client.current_user().await {
                Ok(user) => user,
                Err(e) => {
                    if let Err(clear) = store.clear() {
                        warn!("Failed to drop tokens after login error: {clear}");
                    }
                    self.set(AuthState::Unauthenticated);
                    return Err(e);
                }
            },
        };
        info!("Signed in as {}", user.username);
        self.set(AuthState::Authenticated(user.clone()));
        Ok(user)
    }

    /// Exchanges the stored refresh token for a new access token.
    pub async fn refresh(&self, client: &ApiClient) -> Result<(), ApiError> {
        let refresh = client
            .credentials()
            .refresh_token()
            .ok_or_else(|| ApiError::Unauthorized("No refresh token stored".to_string()))?;
        let access = client.refresh_token(&refresh).await?;
        client.credentials().set(ACCESS_TOKEN_KEY, &access.access)?;
        debug!("Access token refreshed");
        Ok(())
    }

    pub fn logout(&self, client: &ApiClient) -> Result<(), ApiError> {
        let cleared = client.credentials().clear();
        self.set(AuthState::Unauthenticated);
        info!("Signed out");
        cleared
    }

    /// Refreshes the access token every `every` while the gate stays
    /// authenticated. Stops on the first failed refresh.
    pub fn spawn_refresh_timer(&self, client: ApiClient, every: Duration) -> JoinHandle<()> {
        let gate = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            ticker.tick().await; // first tick fires immediately
            loop {
                ticker.tick().await;
                if gate.state().user().is_none() {
                    debug!("Refresh timer stopping: not authenticated");
                    break;
                }
                if let Err(e) = gate.refresh(&client).await {
                    warn!("Proactive token refresh failed: {e}");
                    break;
                }
            }
        })
    }
}

struct GateRedirect {
    state: Arc<RwLock<AuthState>>,
    next: Arc<dyn LoginRedirect>,
}

impl LoginRedirect for GateRedirect {
    fn redirect_to_login(&self) {
        *self.state.write() = AuthState::Unauthenticated;
        self.next.redirect_to_login();
    }
}
