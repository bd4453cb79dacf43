use std::sync::Arc;

use chrono::Duration;
use tokio::sync::mpsc;
use tracing::info;

use crate::action::Action;
use crate::auth;
use crate::config::AccountConfig;
use crate::error::Result;
use crate::github::GitHub;
use crate::hub::Hub;
use crate::prefs::PrefStore;

/// Identity and collaborators for the signed-in account.
///
/// A session is never mutated to change accounts; switching builds a new one
/// so nothing cached for the previous account can leak into the next.
#[derive(Debug, Clone)]
pub struct Session {
    pub login: String,
    pub hub: Arc<dyn Hub>,
    pub prefs: Arc<dyn PrefStore>,
    pub tx: mpsc::UnboundedSender<Action>,
}

impl Session {
    pub fn new(
        login: String,
        hub: Arc<dyn Hub>,
        prefs: Arc<dyn PrefStore>,
        tx: mpsc::UnboundedSender<Action>,
    ) -> Self {
        Self {
            login,
            hub,
            prefs,
            tx,
        }
    }

    /// Same collaborators, different account
    pub fn switched(&self, login: String, hub: Arc<dyn Hub>) -> Self {
        Self::new(login, hub, Arc::clone(&self.prefs), self.tx.clone())
    }

    /// Logins are case-insensitive on GitHub
    pub fn is_self(&self, login: &str) -> bool {
        self.login.eq_ignore_ascii_case(login)
    }
}

/// Resolve a token for `account`, build its client and find out who it is.
pub async fn connect(account: &AccountConfig, cache_ttl: Duration) -> Result<(String, Arc<dyn Hub>)> {
    let token = auth::resolve_token(account)?;
    let github = GitHub::new(token, cache_ttl)?;

    let login = match &account.login {
        Some(login) => login.clone(),
        None => github.current_login().await?,
    };
    info!(login = %login, "connected");

    let hub: Arc<dyn Hub> = Arc::new(github.with_account(&login));
    Ok((login, hub))
}
