// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Server configuration module
//!
//! This module provides configuration structures and logic for the Ordinals
//! API server: listener settings, upstream provider endpoints and
//! credentials, and the shared cache and rate-limit tuning.

use std::{
    net::{IpAddr, Ipv4Addr, SocketAddr},
    time::Duration,
};

use anyhow::{Result, anyhow, ensure};
use config::{Config, ConfigError, Environment as ConfigEnv, File};
use external_apis::{
    ApiKey, ProviderSettings, RegistrySettings, cache::DEFAULT_MAX_ENTRIES,
    rate_limit::DEFAULT_RATE_LIMIT_BUFFER,
};
use serde::{Deserialize, Deserializer, Serialize, de};
use shared_types::Upstream;
use url::Url;
use utoipa::ToSchema;

use crate::error::{ServerError, ServerResult};

/// A validated server port that ensures the value is appropriate for the environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ServerPort {
    port: u16,
    environment: Environment,
}

impl ServerPort {
    /// Create a new `ServerPort`, ensuring it's valid for the given environment
    ///
    /// # Errors
    ///
    /// Returns an error if the port is 0 in non-testing environments
    pub fn new(port: u16, environment: Environment) -> Result<Self> {
        if port == 0 && environment != Environment::Testing {
            return Err(anyhow!("port cannot be 0 in non-testing environments"));
        }
        Ok(Self { port, environment })
    }

    /// Default development port
    pub const fn default_development() -> Self {
        Self {
            port: 3000,
            environment: Environment::Development,
        }
    }

    /// Port 0, letting the OS pick
    pub const fn testing() -> Self {
        Self {
            port: 0,
            environment: Environment::Testing,
        }
    }

    /// Port number
    pub fn value(&self) -> u16 {
        self.port
    }
}

impl<'de> Deserialize<'de> for ServerPort {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let port = u16::deserialize(deserializer)?;
        // Re-validated in `load` once the environment is known
        Ok(Self {
            port,
            environment: Environment::Development,
        })
    }
}

/// A validated timeout duration in seconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimeoutSeconds(Duration);

impl TimeoutSeconds {
    /// Create a new `TimeoutSeconds`, ensuring the value is within valid bounds
    ///
    /// # Errors
    ///
    /// Returns an error if timeout is 0 or greater than 300 seconds
    pub fn new(seconds: u64) -> Result<Self> {
        ensure!(seconds != 0, "timeout must be greater than 0");
        ensure!(seconds <= 300, "timeout cannot exceed 300");
        Ok(Self(Duration::from_secs(seconds)))
    }

    /// 30 seconds
    pub const fn default_value() -> Self {
        Self(Duration::from_secs(30))
    }

    /// 5 seconds
    pub const fn testing() -> Self {
        Self(Duration::from_secs(5))
    }

    /// Timeout as a duration
    pub fn value(&self) -> Duration {
        self.0
    }
}

impl<'de> Deserialize<'de> for TimeoutSeconds {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let seconds = u64::deserialize(deserializer)?;
        Self::new(seconds).map_err(|e| de::Error::custom(e.to_string()))
    }
}

impl Default for TimeoutSeconds {
    fn default() -> Self {
        Self::default_value()
    }
}

/// Fraction of each upstream's published request budget actually used
///
/// Must lie in `(0, 1]`; the remainder is headroom for other consumers of
/// the same API key.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RateLimitBuffer(f64);

impl RateLimitBuffer {
    /// Create a new `RateLimitBuffer`
    ///
    /// # Errors
    ///
    /// Returns an error if the value is not in `(0, 1]`
    pub fn new(value: f64) -> Result<Self> {
        ensure!(
            value > 0.0 && value <= 1.0,
            "rate limit buffer must be in (0, 1], got {value}"
        );
        Ok(Self(value))
    }

    /// Buffer fraction
    pub fn value(&self) -> f64 {
        self.0
    }
}

impl Default for RateLimitBuffer {
    fn default() -> Self {
        Self(DEFAULT_RATE_LIMIT_BUFFER)
    }
}

impl<'de> Deserialize<'de> for RateLimitBuffer {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = f64::deserialize(deserializer)?;
        Self::new(value).map_err(|e| de::Error::custom(e.to_string()))
    }
}

/// Environment types for configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Production environment
    Production,
    /// Development environment
    Development,
    /// Testing environment
    Testing,
}

/// Endpoint, credential and budget of one upstream provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    /// Base URL of the provider API
    pub base_url: Url,
    /// API key; empty values count as not configured
    #[serde(default, skip_serializing, deserialize_with = "deserialize_api_key")]
    pub api_key: Option<ApiKey>,
    /// Published request budget; when absent the provider default for the
    /// credential state applies
    #[serde(default)]
    pub max_requests_per_minute: Option<u32>,
}

impl UpstreamConfig {
    /// Production endpoint of `upstream`, without a credential
    ///
    /// # Panics
    ///
    /// Panics if a built-in base URL does not parse.
    pub fn production(upstream: Upstream) -> Self {
        Self {
            base_url: Url::parse(upstream.default_base_url())
                .expect("built-in base URL must parse"),
            api_key: None,
            max_requests_per_minute: None,
        }
    }

    fn provider_settings(&self, timeout: Duration) -> ProviderSettings {
        ProviderSettings {
            base_url: self.base_url.clone(),
            api_key: self.api_key.clone(),
            max_requests_per_minute: self.max_requests_per_minute,
            timeout,
        }
    }
}

fn deserialize_api_key<'de, D>(deserializer: D) -> Result<Option<ApiKey>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(ApiKey::from_optional(raw))
}

/// Configuration section holding an upstream's settings
const fn section(upstream: Upstream) -> &'static str {
    match upstream {
        Upstream::Hiro => "hiro",
        Upstream::Ordiscan => "ordiscan",
        Upstream::MagicEden => "magic_eden",
    }
}

/// Server configuration for different environments
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server host address
    pub host: IpAddr,
    /// Server port (validated for environment compatibility)
    pub port: ServerPort,
    /// Inbound request timeout in seconds (validated range: 1-300)
    pub timeout_seconds: TimeoutSeconds,
    /// Environment type
    pub environment: Environment,
    /// Per-request deadline for upstream calls (validated range: 1-300)
    pub upstream_timeout_seconds: TimeoutSeconds,
    /// Fraction of each upstream budget used
    pub rate_limit_buffer: RateLimitBuffer,
    /// Maximum number of cached upstream responses
    pub cache_max_entries: usize,
    /// Hiro API settings
    pub hiro: UpstreamConfig,
    /// Ordiscan API settings
    pub ordiscan: UpstreamConfig,
    /// Magic Eden API settings
    pub magic_eden: UpstreamConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: ServerPort::default_development(),
            timeout_seconds: TimeoutSeconds::default(),
            environment: Environment::Development,
            upstream_timeout_seconds: TimeoutSeconds::default(),
            rate_limit_buffer: RateLimitBuffer::default(),
            cache_max_entries: DEFAULT_MAX_ENTRIES,
            hiro: UpstreamConfig::production(Upstream::Hiro),
            ordiscan: UpstreamConfig::production(Upstream::Ordiscan),
            magic_eden: UpstreamConfig::production(Upstream::MagicEden),
        }
    }
}

impl ServerConfig {
    /// Create configuration from environment variables and optional configuration files
    ///
    /// # Errors
    ///
    /// Returns `ServerError::Config` if configuration is invalid or cannot be loaded.
    pub fn from_env() -> ServerResult<Self> {
        Self::load().map_err(|e| ServerError::Config {
            message: format!("failed to load configuration: {e}"),
        })
    }

    /// Load configuration using the config crate with hierarchical sources
    ///
    /// Configuration is loaded in the following order (later sources override earlier ones):
    /// 1. Default values
    /// 2. Configuration file (config.json)
    /// 3. Environment-specific files (config.{env}.json)
    /// 4. Environment variables with `SERVER_` prefix, `__` between nested keys
    ///    (e.g. `SERVER_HIRO__BASE_URL`)
    /// 5. The provider variables `HIRO_API_KEY`, `ORDISCAN_API_KEY`,
    ///    `MAGIC_EDEN_API_KEY`, `RATE_LIMIT_BUFFER` and `CACHE_MAX_ENTRIES`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if configuration cannot be loaded or is invalid.
    pub fn load() -> Result<Self, ConfigError> {
        let env_var = std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string());

        let mut config_builder = Config::builder()
            .set_default("host", "127.0.0.1")?
            .set_default("port", 3000)?
            .set_default("timeout_seconds", 30)?
            .set_default("environment", "development")?
            .set_default("upstream_timeout_seconds", 30)?
            .set_default("rate_limit_buffer", DEFAULT_RATE_LIMIT_BUFFER)?
            .set_default("cache_max_entries", DEFAULT_MAX_ENTRIES as u64)?;

        for &upstream in Upstream::all() {
            config_builder = config_builder.set_default(
                format!("{}.base_url", section(upstream)),
                upstream.default_base_url(),
            )?;
        }

        config_builder = config_builder
            .add_source(File::with_name("config.json").required(false))
            .add_source(
                File::with_name(&format!("config.{}.json", env_var.to_lowercase())).required(false),
            )
            .add_source(
                ConfigEnv::with_prefix("SERVER")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            );

        for &upstream in Upstream::all() {
            config_builder = config_builder.set_override_option(
                format!("{}.api_key", section(upstream)),
                std::env::var(upstream.api_key_env()).ok(),
            )?;
        }
        config_builder = config_builder
            .set_override_option("rate_limit_buffer", std::env::var("RATE_LIMIT_BUFFER").ok())?
            .set_override_option("cache_max_entries", std::env::var("CACHE_MAX_ENTRIES").ok())?;

        if std::env::var("ENVIRONMENT").is_ok() {
            config_builder = config_builder.set_override("environment", env_var.to_lowercase())?;
        }

        let config = config_builder.build()?;
        let mut server_config: Self = config.try_deserialize()?;

        server_config.port = ServerPort::new(server_config.port.value(), server_config.environment)
            .map_err(|e| ConfigError::Message(format!("invalid port configuration: {e}")))?;

        Ok(server_config)
    }

    /// Hermetic configuration for tests: OS-assigned port, no credentials,
    /// production upstream URLs
    pub fn for_testing() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: ServerPort::testing(),
            timeout_seconds: TimeoutSeconds::testing(),
            environment: Environment::Testing,
            upstream_timeout_seconds: TimeoutSeconds::testing(),
            ..Self::default()
        }
    }

    /// Settings of one upstream
    pub const fn upstream(&self, upstream: Upstream) -> &UpstreamConfig {
        match upstream {
            Upstream::Hiro => &self.hiro,
            Upstream::Ordiscan => &self.ordiscan,
            Upstream::MagicEden => &self.magic_eden,
        }
    }

    /// Mutable settings of one upstream
    pub const fn upstream_mut(&mut self, upstream: Upstream) -> &mut UpstreamConfig {
        match upstream {
            Upstream::Hiro => &mut self.hiro,
            Upstream::Ordiscan => &mut self.ordiscan,
            Upstream::MagicEden => &mut self.magic_eden,
        }
    }

    /// Provider registry settings derived from this configuration
    pub fn registry_settings(&self) -> RegistrySettings {
        let timeout = self.upstream_timeout_seconds.value();
        RegistrySettings {
            hiro: self.hiro.provider_settings(timeout),
            ordiscan: self.ordiscan.provider_settings(timeout),
            magic_eden: self.magic_eden.provider_settings(timeout),
            rate_limit_buffer: self.rate_limit_buffer.value(),
            cache_max_entries: self.cache_max_entries,
        }
    }

    /// Get socket address for binding
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port.value())
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Production => write!(f, "production"),
            Environment::Development => write!(f, "development"),
            Environment::Testing => write!(f, "testing"),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn timeout_validation() {
        assert!(TimeoutSeconds::new(0).is_err());
        assert!(TimeoutSeconds::new(400).is_err());

        assert!(TimeoutSeconds::new(30).is_ok());
        assert!(TimeoutSeconds::new(1).is_ok());
        assert!(TimeoutSeconds::new(300).is_ok());
    }

    #[test]
    fn server_port_validation() {
        assert!(ServerPort::new(0, Environment::Testing).is_ok());
        assert!(ServerPort::new(0, Environment::Development).is_err());
        assert!(ServerPort::new(0, Environment::Production).is_err());

        assert!(ServerPort::new(3000, Environment::Development).is_ok());
        assert!(ServerPort::new(443, Environment::Production).is_ok());
    }

    #[test]
    fn rate_limit_buffer_validation() {
        assert!(RateLimitBuffer::new(0.0).is_err());
        assert!(RateLimitBuffer::new(-0.5).is_err());
        assert!(RateLimitBuffer::new(1.01).is_err());
        assert!(RateLimitBuffer::new(f64::NAN).is_err());

        assert!(RateLimitBuffer::new(1.0).is_ok());
        assert!((RateLimitBuffer::default().value() - 0.8).abs() < f64::EPSILON);
    }

    #[test]
    fn environment_display() {
        assert_eq!(Environment::Production.to_string(), "production");
        assert_eq!(Environment::Development.to_string(), "development");
        assert_eq!(Environment::Testing.to_string(), "testing");
    }

    #[test]
    fn empty_api_key_counts_as_missing() {
        let upstream: UpstreamConfig = serde_json::from_value(json!({
            "base_url": "https://api.hiro.so",
            "api_key": "  "
        }))
        .unwrap();
        assert!(upstream.api_key.is_none());

        let upstream: UpstreamConfig = serde_json::from_value(json!({
            "base_url": "https://api.hiro.so",
            "api_key": "abc"
        }))
        .unwrap();
        assert_eq!(upstream.api_key.unwrap().expose(), "abc");
    }

    #[test]
    fn api_keys_are_never_serialized() {
        let mut config = ServerConfig::for_testing();
        config.hiro.api_key = ApiKey::new("super-secret").ok();

        let rendered = serde_json::to_string(&config).unwrap();
        assert!(!rendered.contains("super-secret"));
        assert!(!format!("{config:?}").contains("super-secret"));
    }

    #[test]
    fn registry_settings_carry_upstream_overrides() {
        let mut config = ServerConfig::for_testing();
        config.ordiscan.api_key = ApiKey::new("k").ok();
        config.ordiscan.max_requests_per_minute = Some(30);

        let settings = config.registry_settings();
        assert!(settings.hiro.api_key.is_none());
        assert!(settings.ordiscan.api_key.is_some());
        assert_eq!(settings.ordiscan.max_requests_per_minute, Some(30));
        assert_eq!(settings.magic_eden.timeout, Duration::from_secs(5));
        assert_eq!(settings.cache_max_entries, 1000);
    }
}
