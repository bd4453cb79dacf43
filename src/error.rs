use thiserror::Error;

/// Errors are `Clone` so a shared in-flight load can hand the same failure to
/// every caller attached to it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HubError {
    #[error("Network error: {0}")]
    Transport(String),

    #[error("API error: {0}")]
    Api(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(String),

    #[error("Internal error: {0}")]
    Internal(String),

    /// The owning view went away before the call finished. Never shown to the user.
    #[error("Request cancelled")]
    Cancelled,
}

impl From<std::io::Error> for HubError {
    fn from(err: std::io::Error) -> Self {
        HubError::Io(err.to_string())
    }
}

impl From<reqwest::Error> for HubError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_status() {
            HubError::Api(err.to_string())
        } else {
            HubError::Transport(err.to_string())
        }
    }
}

pub type Result<T> = std::result::Result<T, HubError>;
