use std::env;
use std::time::Duration;
use tracing::warn;

const DEFAULT_API_URL: &str = "http://localhost:8000";
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_SERVER_PORT: u16 = 3000;
const DEFAULT_SESSION_IDLE_TTL_SECS: u64 = 1800;
const DEFAULT_MAX_SESSIONS: usize = 500;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub macro_period_api_url: String,
    pub request_timeout_secs: u64,
    pub server_port: u16,
    pub session_idle_ttl_secs: u64,
    pub max_sessions: usize,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let config = Self {
            macro_period_api_url: env::var("MACRO_PERIOD_API_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or_else(|_| {
                    warn!("MACRO_PERIOD_API_URL not set, using {}", DEFAULT_API_URL);
                    String::new()
                }),
            request_timeout_secs: parse_env("MACRO_PERIOD_API_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS),
            server_port: parse_env("SERVER_PORT", DEFAULT_SERVER_PORT),
            session_idle_ttl_secs: parse_env("SESSION_IDLE_TTL_SECS", DEFAULT_SESSION_IDLE_TTL_SECS),
            max_sessions: parse_env("MAX_SESSIONS", DEFAULT_MAX_SESSIONS),
        };

        if !config.is_configured() {
            warn!("Application not fully configured - missing environment variables");
        }

        config
    }

    pub fn is_configured(&self) -> bool {
        !self.macro_period_api_url.is_empty()
    }

    /// Base URL of the macro period backend, falling back to the local default.
    pub fn api_base_url(&self) -> &str {
        if self.macro_period_api_url.is_empty() {
            DEFAULT_API_URL
        } else {
            &self.macro_period_api_url
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// How long an untouched response session is kept in memory.
    pub fn session_idle_ttl(&self) -> Duration {
        Duration::from_secs(self.session_idle_ttl_secs)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            macro_period_api_url: String::new(),
            request_timeout_secs: DEFAULT_TIMEOUT_SECS,
            server_port: DEFAULT_SERVER_PORT,
            session_idle_ttl_secs: DEFAULT_SESSION_IDLE_TTL_SECS,
            max_sessions: DEFAULT_MAX_SESSIONS,
        }
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(raw) => raw.parse().unwrap_or_else(|_| {
            warn!("{} has an invalid value '{}', using default", key, raw);
            default
        }),
        Err(_) => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_falls_back_to_local_backend() {
        let config = AppConfig::default();

        assert!(!config.is_configured());
        assert_eq!(config.api_base_url(), "http://localhost:8000");
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
        assert_eq!(config.session_idle_ttl(), Duration::from_secs(1800));
        assert_eq!(config.max_sessions, 500);
    }

    #[test]
    fn test_explicit_url_is_used() {
        let config = AppConfig {
            macro_period_api_url: "http://backend:8000".to_string(),
            ..AppConfig::default()
        };

        assert!(config.is_configured());
        assert_eq!(config.api_base_url(), "http://backend:8000");
    }
}
