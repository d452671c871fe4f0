//! Process configuration read from the environment (and `.env` via dotenvy).

use chrono::Duration;
use secrecy::SecretString;
use thiserror::Error;
use tracing::warn;
use utils::assets::database_path;

const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 4000;
const DEFAULT_BASE_PATH: &str = "/api";
const DEFAULT_SESSION_TTL_HOURS: i64 = 24 * 7;

/// Signing key used by debug builds when `AUTH_SECRET` is unset.
const DEV_AUTH_SECRET: &str = "bunplate-development-secret-do-not-use-in-production";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("AUTH_SECRET must be set")]
    MissingAuthSecret,
    #[error("invalid PORT `{0}`")]
    InvalidPort(String),
    #[error("invalid SESSION_TTL_HOURS `{0}`")]
    InvalidSessionTtl(String),
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    /// Prefix for every API route, e.g. `/api`. Empty means the root.
    pub base_path: String,
    /// Allowed CORS origin. `None` allows any origin.
    pub client_url: Option<String>,
    pub auth_secret: SecretString,
    pub session_ttl: Duration,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let database_url = non_empty_var("DATABASE_URL")
            .unwrap_or_else(|| format!("sqlite://{}", database_path().to_string_lossy()));

        let host = non_empty_var("HOST").unwrap_or_else(|| DEFAULT_HOST.to_string());

        let port = match non_empty_var("PORT") {
            Some(raw) => raw
                .trim()
                .parse::<u16>()
                .map_err(|_| ConfigError::InvalidPort(raw))?,
            None => DEFAULT_PORT,
        };

        let base_path = normalize_base_path(
            &std::env::var("BASE_PATH").unwrap_or_else(|_| DEFAULT_BASE_PATH.to_string()),
        );

        let auth_secret = match non_empty_var("AUTH_SECRET") {
            Some(secret) => SecretString::from(secret),
            None if cfg!(debug_assertions) => {
                warn!("AUTH_SECRET not set; using the development signing key");
                SecretString::from(DEV_AUTH_SECRET)
            }
            None => return Err(ConfigError::MissingAuthSecret),
        };

        let session_ttl = match non_empty_var("SESSION_TTL_HOURS") {
            Some(raw) => raw
                .trim()
                .parse::<i64>()
                .ok()
                .filter(|&hours| hours > 0)
                .map(Duration::hours)
                .ok_or(ConfigError::InvalidSessionTtl(raw))?,
            None => Duration::hours(DEFAULT_SESSION_TTL_HOURS),
        };

        Ok(Self {
            database_url,
            host,
            port,
            base_path,
            client_url: non_empty_var("CLIENT_URL"),
            auth_secret,
            session_ttl,
        })
    }

    /// Configuration for tests: in-process defaults, no environment access.
    pub fn for_database(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            host: DEFAULT_HOST.to_string(),
            port: 0,
            base_path: DEFAULT_BASE_PATH.to_string(),
            client_url: None,
            auth_secret: SecretString::from(DEV_AUTH_SECRET),
            session_ttl: Duration::hours(DEFAULT_SESSION_TTL_HOURS),
        }
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// `api/` → `/api`, `/` → ``.
pub fn normalize_base_path(raw: &str) -> String {
    let trimmed = raw.trim().trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("/{trimmed}")
    }
}
