mod retry;
mod state;

pub use retry::Backoff;
pub use state::{Session, SessionPhase};

use crate::error::SessionError;
use crate::token_storage::TokenStore;
use jobtrack_api::{ClassifiedError, Client, UserProfile};
use retry::RetryOutcome;
use secrecy::{ExposeSecret, SecretString};
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{watch, Mutex};
use tokio_util::sync::CancellationToken;

/// Owns the signed-in state for one application instance.
///
/// Bootstrap and login are single-flight: while one is running, another call
/// is rejected with [`SessionError::TransitionInFlight`]. Logout and forced
/// invalidation wait for the running transition instead, so their result is
/// always the final state.
///
/// Every change of the stored credential bumps a generation counter, so a
/// retried call that fails with an auth error only ends the session it
/// started under.
pub struct SessionManager {
    store: Arc<TokenStore>,
    client: Client,
    backoff: Backoff,
    state: watch::Sender<Session>,
    transition: Mutex<()>,
    generation: AtomicU64,
}

impl SessionManager {
    /// `client` should read its credential from `store`.
    pub fn new(store: Arc<TokenStore>, client: Client, backoff: Backoff) -> Self {
        let (state, _) = watch::channel(Session::default());
        Self {
            store,
            client,
            backoff,
            state,
            transition: Mutex::new(()),
            generation: AtomicU64::new(0),
        }
    }

    pub fn session(&self) -> Session {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.state.subscribe()
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    pub fn store(&self) -> &TokenStore {
        &self.store
    }

    /// Rehydrate the session from storage. Only the first call does any work.
    pub async fn bootstrap(&self) -> Result<Session, SessionError> {
        let _guard = self
            .transition
            .try_lock()
            .map_err(|_| SessionError::TransitionInFlight)?;

        if self.state.borrow().phase() != SessionPhase::Uninitialized {
            tracing::debug!("Session already bootstrapped");
            return Ok(self.session());
        }

        self.state.send_modify(Session::begin_bootstrap);

        if !self.store.is_authenticated() {
            tracing::info!("No stored credential, starting signed out");
            self.state.send_modify(|s| s.sign_out(None));
            return Ok(self.session());
        }

        match self.validate().await {
            Ok(user) => {
                tracing::info!(user_id = %user.id, "Restored session");
                self.state.send_modify(|s| s.authenticate(user));
            }
            Err(err) => {
                tracing::warn!(kind = %err.kind(), "Stored credential rejected: {}", err);
                self.clear_store();
                self.state.send_modify(|s| s.sign_out(Some(err)));
            }
        }

        Ok(self.session())
    }

    /// Store `provider_token` and confirm it with the identity provider.
    pub async fn login(&self, provider_token: SecretString) -> Result<UserProfile, SessionError> {
        let _guard = self
            .transition
            .try_lock()
            .map_err(|_| SessionError::TransitionInFlight)?;

        self.state.send_modify(Session::begin_transition);

        if let Err(e) = self.store.set_token(provider_token.expose_secret()) {
            tracing::warn!("Failed to store credential: {}", e);
            self.state.send_modify(Session::end_transition);
            return Err(e.into());
        }
        self.generation.fetch_add(1, Ordering::SeqCst);

        match self.validate().await {
            Ok(user) => {
                tracing::info!(user_id = %user.id, "Signed in");
                self.state.send_modify(|s| s.authenticate(user.clone()));
                Ok(user)
            }
            Err(err) => {
                tracing::warn!(kind = %err.kind(), "Sign-in rejected: {}", err);
                self.clear_store();
                self.state.send_modify(|s| s.sign_out(Some(err.clone())));
                Err(err.into())
            }
        }
    }

    pub async fn logout(&self) {
        let _guard = self.transition.lock().await;

        self.state.send_modify(Session::begin_transition);
        self.clear_store();
        self.state.send_modify(|s| s.sign_out(None));
        tracing::info!("Signed out");
    }

    /// Drop the session if `error` says the credential is no longer valid.
    ///
    /// Returns whether the session was invalidated.
    pub async fn invalidate(&self, error: &ClassifiedError) -> bool {
        self.invalidate_generation(error, None).await
    }

    async fn invalidate_generation(&self, error: &ClassifiedError, seen: Option<u64>) -> bool {
        if !error.is_auth_invalid() {
            return false;
        }

        let _guard = self.transition.lock().await;

        if let Some(seen) = seen {
            let current = self.generation.load(Ordering::SeqCst);
            if seen != current {
                tracing::debug!(seen, current, "Ignoring auth error for a replaced credential");
                return false;
            }
        }

        tracing::warn!(kind = %error.kind(), "Credential invalidated by server response");
        self.clear_store();
        self.state.send_modify(|s| s.sign_out(Some(error.clone())));
        true
    }

    /// Run `operation`, retrying network failures with exponential backoff.
    ///
    /// `max_retries` is the total number of attempts. Any other failure stops
    /// immediately; unauthorized and expired-token failures also end the
    /// session before they are returned, unless the credential was replaced
    /// while `operation` ran. Firing `abort` stops further attempts.
    pub async fn retry_with_backoff<T, F, Fut>(
        &self,
        operation: F,
        max_retries: u32,
        abort: Option<&CancellationToken>,
    ) -> Result<T, SessionError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ClassifiedError>>,
    {
        let generation = self.generation.load(Ordering::SeqCst);

        match retry::run(self.backoff, operation, max_retries, abort).await {
            RetryOutcome::Success(value) => Ok(value),
            RetryOutcome::Terminal(err) => {
                self.invalidate_generation(&err, Some(generation)).await;
                Err(err.into())
            }
            RetryOutcome::GaveUp(Some(err)) => Err(err.into()),
            RetryOutcome::GaveUp(None) => Err(SessionError::Aborted),
        }
    }

    async fn validate(&self) -> Result<UserProfile, ClassifiedError> {
        let user = self.client.fetch_user_profile().await?;
        if let Err(e) = self.store.set_user(&user) {
            tracing::warn!("Failed to cache user profile: {}", e);
        }
        Ok(user)
    }

    fn clear_store(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        if let Err(e) = self.store.clear() {
            tracing::warn!("Failed to clear token storage: {}", e);
        }
    }
}
