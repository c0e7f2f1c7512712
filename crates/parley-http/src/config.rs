use parley_types::UserId;
use thiserror::Error;

pub const DEFAULT_SERVER_URL: &str = "http://localhost:3001";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required setting {0}")]
    Missing(&'static str),
    #[error("{0} must not be empty")]
    Empty(&'static str),
}

/// Connection settings for one signed-in user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base URL of the message store, without a trailing slash.
    pub server_url: String,
    /// Bearer credential attached to every request.
    pub token: String,
    pub user_id: UserId,
    /// Peer to open on start-up, if any.
    pub peer_id: Option<UserId>,
}

impl ClientConfig {
    /// Read `PARLEY_SERVER_URL`, `PARLEY_TOKEN`, `PARLEY_USER_ID` and
    /// `PARLEY_PEER_ID` from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let server_url = lookup("PARLEY_SERVER_URL")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_SERVER_URL.into());

        let token = required(&lookup, "PARLEY_TOKEN")?;
        let user_id = required(&lookup, "PARLEY_USER_ID")?;
        let peer_id = lookup("PARLEY_PEER_ID")
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .map(UserId::new);

        Ok(Self {
            server_url: server_url.trim().trim_end_matches('/').to_string(),
            token,
            user_id: UserId::new(user_id),
            peer_id,
        })
    }
}

fn required<F>(lookup: &F, key: &'static str) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let value = lookup(key).ok_or(ConfigError::Missing(key))?;
    let value = value.trim();
    if value.is_empty() {
        return Err(ConfigError::Empty(key));
    }
    Ok(value.to_string())
}
