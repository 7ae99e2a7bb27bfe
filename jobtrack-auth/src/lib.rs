mod config;
mod error;
pub mod guard;
mod login;
pub mod session;
mod token_storage;

pub use config::Settings;
pub use error::{AuthError, SessionError};
pub use guard::{authorize, Access, Route, RouteAccess};
pub use login::interactive_login;
pub use session::{Backoff, Session, SessionManager, SessionPhase};
pub use token_storage::{TokenStore, TOKEN_KEY, USER_KEY};

use jobtrack_api::{ClassifiedError, Client};
use std::sync::Arc;

/// Wire a token store, API client and session manager from settings.
///
/// Returns the manager; the client it owns reads its credential from the store.
pub fn connect(
    settings: &Settings,
    store: Arc<TokenStore>,
) -> Result<SessionManager, ClassifiedError> {
    let client = Client::builder(store.clone())
        .base_url(settings.api_url.clone())
        .userinfo_url(settings.userinfo_url.clone())
        .timeout(settings.timeout())
        .build()?;

    Ok(SessionManager::new(
        store,
        client,
        Backoff::new(settings.retry_base_delay()),
    ))
}
