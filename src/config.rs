//! Client configuration read from `MONEY_*` environment variables.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::{AppError, AppResult};

pub const DEFAULT_BASE_API: &str = "http://localhost:8085";
pub const DEFAULT_AVATAR: &str = "assets/images/profile.jpg";
pub const DEFAULT_TOKEN_FILE: &str = ".money/token";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// API base URL; also the prefix for relative avatar paths.
    pub base_api: String,
    pub default_avatar: String,
    pub token_file: PathBuf,
    /// `None` keeps the HTTP client's own defaults.
    pub timeout: Option<Duration>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_api: DEFAULT_BASE_API.to_string(),
            default_avatar: DEFAULT_AVATAR.to_string(),
            token_file: PathBuf::from(DEFAULT_TOKEN_FILE),
            timeout: None,
        }
    }
}

impl ClientConfig {
    pub fn from_env() -> AppResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let mut cfg = ClientConfig::default();
        if let Some(base) = get("MONEY_BASE_API") { cfg.base_api = base; }
        if let Some(avatar) = get("MONEY_DEFAULT_AVATAR") { cfg.default_avatar = avatar; }
        if let Some(path) = get("MONEY_TOKEN_FILE") { cfg.token_file = PathBuf::from(path); }
        if let Some(secs) = get("MONEY_HTTP_TIMEOUT_SECS") {
            let n: u64 = secs.parse().map_err(|_| {
                AppError::config("invalid_timeout".to_string(), format!("MONEY_HTTP_TIMEOUT_SECS must be a whole number of seconds, got '{}'", secs))
            })?;
            cfg.timeout = Some(Duration::from_secs(n));
        }
        Ok(cfg)
    }
}
