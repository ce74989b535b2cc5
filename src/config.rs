use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";
pub const DEFAULT_DAILY_TOKEN_LIMIT: i64 = 10_000;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),
    #[error("invalid value {value:?} for {name}")]
    Invalid { name: &'static str, value: String },
}

/// Settings for the model router and provider clients
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub google_api_key: Option<String>,
    pub openai_api_key: Option<String>,
    pub default_model: String,
    pub title_model: String,
    pub temperature: f32,
    pub timeout: Duration,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            google_api_key: None,
            openai_api_key: None,
            default_model: DEFAULT_MODEL.to_string(),
            title_model: DEFAULT_MODEL.to_string(),
            temperature: 0.7,
            timeout: Duration::from_secs(60),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub access_ttl: chrono::Duration,
    pub refresh_ttl: chrono::Duration,
}

impl AuthConfig {
    pub fn new(jwt_secret: impl Into<String>) -> Self {
        Self {
            jwt_secret: jwt_secret.into(),
            access_ttl: chrono::Duration::minutes(60),
            refresh_ttl: chrono::Duration::days(7),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub max_connections: u32,
    pub bind_addr: SocketAddr,
    pub auth: AuthConfig,
    pub llm: LlmConfig,
    pub daily_token_limit: i64,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup so tests need not touch the process env.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |name: &'static str| {
            lookup(name)
                .filter(|v| !v.trim().is_empty())
                .ok_or(ConfigError::Missing(name))
        };
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let llm = LlmConfig {
            google_api_key: non_empty("GOOGLE_API_KEY"),
            openai_api_key: non_empty("OPENAI_API_KEY"),
            default_model: non_empty("DEFAULT_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            title_model: non_empty("TITLE_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            temperature: 0.7,
            timeout: Duration::from_secs(parse_or(&lookup, "LLM_TIMEOUT_SECS", 60)?),
        };

        let auth = AuthConfig {
            jwt_secret: required("JWT_SECRET")?,
            access_ttl: chrono::Duration::minutes(parse_or(&lookup, "ACCESS_TOKEN_TTL_MINUTES", 60)?),
            refresh_ttl: chrono::Duration::days(parse_or(&lookup, "REFRESH_TOKEN_TTL_DAYS", 7)?),
        };

        Ok(Self {
            database_url: required("DATABASE_URL")?,
            max_connections: parse_or(&lookup, "DATABASE_MAX_CONNECTIONS", 10)?,
            bind_addr: parse_or(&lookup, "BIND_ADDR", SocketAddr::from(([0, 0, 0, 0], 3000)))?,
            auth,
            llm,
            daily_token_limit: parse_or(&lookup, "DAILY_TOKEN_LIMIT", DEFAULT_DAILY_TOKEN_LIMIT)?,
        })
    }
}

fn parse_or<F, T>(lookup: &F, name: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(name) {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value: raw }),
        _ => Ok(default),
    }
}

/// Reads `LLM_ENABLED` the way the admin toggle is documented: anything but "true" disables.
pub fn llm_enabled_from_env() -> bool {
    flag_enabled(std::env::var("LLM_ENABLED").ok().as_deref())
}

pub(crate) fn flag_enabled(raw: Option<&str>) -> bool {
    raw.unwrap_or("True").trim().eq_ignore_ascii_case("true")
}
