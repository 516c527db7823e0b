use crate::error::{FluxError, Result};
use crate::models::OutputFormat;
use std::env;
use std::fmt;
use std::time::Duration;

pub const API_TOKEN_VAR: &str = "REPLICATE_API_TOKEN";
pub const DEFAULT_BASE_URL: &str = "https://api.replicate.com/v1";
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 500;

/// Provider credential. Never printed in full.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiToken(String);

impl ApiToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    /// First few characters, enough to tell tokens apart in logs.
    pub fn hint(&self) -> String {
        let prefix: String = self.0.chars().take(5).collect();
        format!("{}...", prefix)
    }
}

impl fmt::Debug for ApiToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ApiToken({})", self.hint())
    }
}

#[derive(Debug, Clone)]
pub struct ReplicateConfig {
    pub api_token: Option<ApiToken>,
    pub base_url: String,
    pub poll_interval: Duration,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub replicate: ReplicateConfig,
    pub output_format: OutputFormat,
}

impl Default for ReplicateConfig {
    fn default() -> Self {
        ReplicateConfig {
            api_token: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
        }
    }
}

impl ReplicateConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let api_token = lookup(API_TOKEN_VAR)
            .map(|token| token.trim().to_string())
            .filter(|token| !token.is_empty())
            .map(ApiToken::new);
        let base_url = lookup("REPLICATE_API_BASE_URL")
            .map(|url| url.trim_end_matches('/').to_string())
            .filter(|url| !url.is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let poll_interval = match lookup("REPLICATE_POLL_INTERVAL_MS") {
            Some(raw) => match raw.trim().parse::<u64>() {
                Ok(ms) if ms > 0 => Duration::from_millis(ms),
                _ => {
                    log::warn!(
                        "Ignoring invalid REPLICATE_POLL_INTERVAL_MS '{}', using {}ms",
                        raw,
                        DEFAULT_POLL_INTERVAL_MS
                    );
                    Duration::from_millis(DEFAULT_POLL_INTERVAL_MS)
                }
            },
            None => Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
        };

        ReplicateConfig {
            api_token,
            base_url,
            poll_interval,
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.api_token = Some(ApiToken::new(token));
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// The credential, or the error that halts the session.
    pub fn require_token(&self) -> Result<ApiToken> {
        self.api_token.clone().ok_or_else(|| {
            FluxError::ConfigurationMissing(format!(
                "the Replicate API key is not configured ({} is not set)",
                API_TOKEN_VAR
            ))
        })
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
        }
    }
}

impl ServerConfig {
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let host = lookup("HOST")
            .filter(|host| !host.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_HOST.to_string());
        let port = match lookup("PORT") {
            Some(raw) => raw.trim().parse::<u16>().unwrap_or_else(|_| {
                log::warn!("Ignoring invalid PORT '{}', using {}", raw, DEFAULT_PORT);
                DEFAULT_PORT
            }),
            None => DEFAULT_PORT,
        };

        ServerConfig { host, port }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            server: ServerConfig::default(),
            replicate: ReplicateConfig::default(),
            output_format: OutputFormat::default(),
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from any key/value source, so tests do not have to
    /// touch the process environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let output_format = match lookup("FLUX_OUTPUT_FORMAT") {
            Some(raw) => raw.parse::<OutputFormat>().unwrap_or_else(|e| {
                log::warn!("{}; using {}", e, OutputFormat::default());
                OutputFormat::default()
            }),
            None => OutputFormat::default(),
        };

        Config {
            server: ServerConfig::from_lookup(&lookup),
            replicate: ReplicateConfig::from_lookup(&lookup),
            output_format,
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.server.port = port;
        self
    }

    pub fn with_replicate(mut self, config: ReplicateConfig) -> Self {
        self.replicate = config;
        self
    }

    pub fn with_output_format(mut self, format: OutputFormat) -> Self {
        self.output_format = format;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_without_env() {
        let config = Config::from_lookup(lookup_from(&[]));
        assert_eq!(config.server.port, DEFAULT_PORT);
        assert_eq!(config.server.host, DEFAULT_HOST);
        assert_eq!(config.output_format, OutputFormat::Webp);
        assert_eq!(config.replicate.base_url, DEFAULT_BASE_URL);
        assert_eq!(
            config.replicate.poll_interval,
            Duration::from_millis(DEFAULT_POLL_INTERVAL_MS)
        );
        assert!(config.replicate.api_token.is_none());
    }

    #[test]
    fn test_missing_token_is_configuration_error() {
        let config = Config::from_lookup(lookup_from(&[(API_TOKEN_VAR, "   ")]));
        let err = config.replicate.require_token().unwrap_err();
        assert!(err.is_fatal());
        assert!(err.to_string().contains(API_TOKEN_VAR));
    }

    #[test]
    fn test_values_from_lookup() {
        let config = Config::from_lookup(lookup_from(&[
            (API_TOKEN_VAR, "r8_abcdefghij"),
            ("REPLICATE_API_BASE_URL", "http://127.0.0.1:9000/v1/"),
            ("REPLICATE_POLL_INTERVAL_MS", "50"),
            ("FLUX_OUTPUT_FORMAT", "jpg"),
            ("PORT", "3000"),
        ]));
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.output_format, OutputFormat::Jpg);
        assert_eq!(config.replicate.base_url, "http://127.0.0.1:9000/v1");
        assert_eq!(config.replicate.poll_interval, Duration::from_millis(50));
        let token = config.replicate.require_token().unwrap();
        assert_eq!(token.expose(), "r8_abcdefghij");
    }

    #[test]
    fn test_invalid_optionals_fall_back() {
        let config = Config::from_lookup(lookup_from(&[
            ("FLUX_OUTPUT_FORMAT", "gif"),
            ("PORT", "not-a-port"),
            ("REPLICATE_POLL_INTERVAL_MS", "0"),
        ]));
        assert_eq!(config.output_format, OutputFormat::Webp);
        assert_eq!(config.server.port, DEFAULT_PORT);
        assert_eq!(
            config.replicate.poll_interval,
            Duration::from_millis(DEFAULT_POLL_INTERVAL_MS)
        );
    }

    #[test]
    fn test_token_debug_is_redacted() {
        let token = ApiToken::new("r8_supersecretvalue");
        let printed = format!("{:?}", token);
        assert_eq!(printed, "ApiToken(r8_su...)");
        assert!(!printed.contains("supersecret"));
    }
}
