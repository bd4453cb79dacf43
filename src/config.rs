use serde::Deserialize;
use std::path::PathBuf;

use crate::error::{HubError, Result};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AccountConfig {
    /// Login of the account; looked up from the API when omitted
    pub login: Option<String>,
    pub token_env: Option<String>,
    pub token_command: Option<String>,
}

impl Default for AccountConfig {
    fn default() -> Self {
        Self {
            login: None,
            token_env: Some("GITHUB_TOKEN".to_string()),
            token_command: Some("gh auth token".to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Persisted key of the page to open on launch, or "last"
    pub start_page: String,
    /// How long a non-forced load may reuse a cached response
    pub cache_ttl_secs: u64,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            start_page: "newsfeed".to_string(),
            cache_ttl_secs: 300,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub accounts: Vec<AccountConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            general: GeneralConfig::default(),
            accounts: vec![AccountConfig::default()],
        }
    }
}

fn config_path() -> Option<PathBuf> {
    let config_dir = dirs::config_dir()?;
    Some(config_dir.join("hubdeck").join("config.toml"))
}

impl Config {
    pub fn load() -> Self {
        let Some(path) = config_path() else {
            return Config::default();
        };

        let Ok(content) = std::fs::read_to_string(&path) else {
            return Config::default();
        };

        match Self::parse(&content) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "ignoring invalid config");
                Config::default()
            }
        }
    }

    pub fn parse(content: &str) -> Result<Self> {
        let config = toml::from_str::<Config>(content).map_err(|e| HubError::Config(e.to_string()))?;
        if config.accounts.is_empty() {
            Ok(Config {
                accounts: Config::default().accounts,
                ..config
            })
        } else {
            Ok(config)
        }
    }

    /// Account named on the command line, else the first configured one
    pub fn account(&self, login: Option<&str>) -> Result<&AccountConfig> {
        match login {
            Some(wanted) => self
                .accounts
                .iter()
                .find(|a| {
                    a.login
                        .as_deref()
                        .is_some_and(|l| l.eq_ignore_ascii_case(wanted))
                })
                .ok_or_else(|| HubError::Config(format!("no account '{}' configured", wanted))),
            None => self
                .accounts
                .first()
                .ok_or_else(|| HubError::Config("no accounts configured".to_string())),
        }
    }

    pub fn cache_ttl(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.general.cache_ttl_secs.min(u64::from(u32::MAX)) as i64)
    }

    /// Logins of every configured account other than `current`
    pub fn other_logins(&self, current: &str) -> Vec<String> {
        self.accounts
            .iter()
            .filter_map(|a| a.login.clone())
            .filter(|l| !l.eq_ignore_ascii_case(current))
            .collect()
    }
}
