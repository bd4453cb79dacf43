use crate::config::AccountConfig;
use crate::error::{HubError, Result};

/// Try to run a CLI command and capture stdout as a token
fn try_cli_token(command: &str) -> Option<String> {
    let output = std::process::Command::new("sh")
        .args(["-c", command])
        .output()
        .ok()?;

    if output.status.success() {
        non_empty(String::from_utf8_lossy(&output.stdout).as_ref())
    } else {
        None
    }
}

fn non_empty(raw: &str) -> Option<String> {
    let token = raw.trim();
    (!token.is_empty()).then(|| token.to_string())
}

/// Find the token for an account, trying:
/// 1. The account's env var
/// 2. The account's token command (e.g. `gh auth token`)
///
/// Tokens are never written anywhere by this program.
pub fn resolve_token(account: &AccountConfig) -> Result<String> {
    if let Some(env_var) = &account.token_env {
        if let Some(token) = std::env::var(env_var).ok().as_deref().and_then(non_empty) {
            return Ok(token);
        }
    }

    if let Some(cmd) = &account.token_command {
        if let Some(token) = try_cli_token(cmd) {
            return Ok(token);
        }
    }

    Err(HubError::Auth(format!(
        "No token found for {}. Set {} or configure a token_command.",
        account.login.as_deref().unwrap_or("the default account"),
        account.token_env.as_deref().unwrap_or("a token env var")
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_command_output_is_trimmed() {
        let account = AccountConfig {
            login: Some("me".into()),
            token_env: None,
            token_command: Some("echo '  ghp_abc  '".into()),
        };
        assert_eq!(resolve_token(&account).unwrap(), "ghp_abc");
    }

    #[test]
    fn env_var_wins_over_command() {
        std::env::set_var("HUBDECK_TEST_TOKEN_ENV_WINS", "from-env");
        let account = AccountConfig {
            login: None,
            token_env: Some("HUBDECK_TEST_TOKEN_ENV_WINS".into()),
            token_command: Some("echo from-command".into()),
        };
        assert_eq!(resolve_token(&account).unwrap(), "from-env");
    }

    #[test]
    fn missing_token_is_an_auth_error() {
        let account = AccountConfig {
            login: Some("ghost".into()),
            token_env: Some("HUBDECK_TEST_TOKEN_UNSET".into()),
            token_command: Some("false".into()),
        };
        let err = resolve_token(&account).unwrap_err();
        assert!(matches!(err, HubError::Auth(ref msg) if msg.contains("ghost")));
    }
}
