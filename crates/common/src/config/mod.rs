//! Configuration management for LeadForge services
//!
//! Supports loading configuration from:
//! - Environment variables (prefixed with APP__)
//! - Configuration files (config.toml, config.yaml)
//! - Default values

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Database configuration
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Redis configuration (shared rate-limit counters)
    #[serde(default)]
    pub redis: RedisConfig,

    /// Transactional email configuration
    #[serde(default)]
    pub email: EmailConfig,

    /// Business identity used in email templates
    #[serde(default)]
    pub brand: BrandConfig,

    /// Lead handling policy
    #[serde(default)]
    pub leads: LeadsConfig,

    /// Observability configuration
    #[serde(default)]
    pub observability: ObservabilityConfig,

    /// Rate limiting configuration
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// Host to bind to
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,

    /// Request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Allowed CORS origins; empty allows any origin
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    /// Database URL. When unset the service keeps leads in memory.
    pub url: Option<String>,

    /// Maximum number of connections
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Minimum number of connections
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,

    /// Connection timeout in seconds
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    /// Idle timeout in seconds
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,

    /// Upper bound for one lead persistence transaction
    #[serde(default = "default_operation_timeout")]
    pub operation_timeout_secs: u64,

    /// Apply pending SQL migrations on startup
    #[serde(default = "default_enabled")]
    pub run_migrations: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RedisConfig {
    /// Redis URL
    #[serde(default = "default_redis_url")]
    pub url: String,

    /// Key prefix for namespacing
    #[serde(default = "default_redis_prefix")]
    pub key_prefix: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EmailConfig {
    /// API key for the transactional email provider. Emails are simulated when unset.
    pub api_key: Option<String>,

    /// Provider base URL
    #[serde(default = "default_email_api_base")]
    pub api_base: String,

    /// Sender address (`Name <address>` form accepted)
    #[serde(default = "default_email_from")]
    pub from: String,

    /// Inbox receiving lead notifications
    #[serde(default = "default_business_inbox")]
    pub business_inbox: String,

    /// Request timeout in seconds
    #[serde(default = "default_email_timeout")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BrandConfig {
    #[serde(default = "default_company_name")]
    pub company_name: String,

    #[serde(default = "default_company_phone")]
    pub phone: String,

    #[serde(default = "default_company_site")]
    pub website: String,

    #[serde(default = "default_company_address")]
    pub postal_address: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LeadsConfig {
    /// Management fee recorded on every new application
    #[serde(default = "default_management_fee")]
    pub management_fee_percent: f64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ObservabilityConfig {
    /// Log level (debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Enable JSON logging
    #[serde(default = "default_json_logging")]
    pub json_logging: bool,

    /// Metrics port (0 to disable)
    #[serde(default = "default_metrics_port")]
    pub metrics_port: u16,

    /// Service name for tracing
    #[serde(default = "default_service_name")]
    pub service_name: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RateLimitConfig {
    /// Global requests per second across all clients
    #[serde(default = "default_rate_limit")]
    pub requests_per_second: u32,

    /// Global burst capacity
    #[serde(default = "default_burst")]
    pub burst: u32,

    /// Enable the global limiter
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Honor X-Forwarded-For / X-Real-IP when deriving the client identity
    #[serde(default = "default_enabled")]
    pub trust_forwarded_headers: bool,

    /// Per-client limit on contact form submissions
    #[serde(default)]
    pub contact: ContactLimitConfig,
}

/// Where fixed-window counters live
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LimiterBackend {
    Memory,
    Redis,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ContactLimitConfig {
    /// Requests allowed per window
    #[serde(default = "default_contact_max_requests")]
    pub max_requests: u32,

    /// Window length in milliseconds
    #[serde(default = "default_contact_window_ms")]
    pub window_ms: u64,

    /// Counter store
    #[serde(default = "default_limiter_backend")]
    pub backend: LimiterBackend,
}

// Default value functions
fn default_host() -> String { "0.0.0.0".to_string() }
fn default_port() -> u16 { 8080 }
fn default_request_timeout() -> u64 { 30 }
fn default_max_connections() -> u32 { 20 }
fn default_min_connections() -> u32 { 2 }
fn default_connect_timeout() -> u64 { 10 }
fn default_idle_timeout() -> u64 { 300 }
fn default_operation_timeout() -> u64 { 5 }
fn default_redis_url() -> String { "redis://localhost:6379".to_string() }
fn default_redis_prefix() -> String { "leadforge".to_string() }
fn default_email_api_base() -> String { "https://api.resend.com".to_string() }
fn default_email_from() -> String { "Alfa Retailers <info@alfaretailers.com>".to_string() }
fn default_business_inbox() -> String { "info@alfaretailers.com".to_string() }
fn default_email_timeout() -> u64 { 5 }
fn default_company_name() -> String { "Alfa Retailers".to_string() }
fn default_company_phone() -> String { "210-526-1401".to_string() }
fn default_company_site() -> String { "https://www.alfaretailers.com".to_string() }
fn default_company_address() -> String { "12370 Potranco Rd, Suite 207, San Antonio, TX 78254".to_string() }
fn default_management_fee() -> f64 { 20.0 }
fn default_log_level() -> String { "info".to_string() }
fn default_json_logging() -> bool { true }
fn default_metrics_port() -> u16 { 9090 }
fn default_service_name() -> String { "leadforge".to_string() }
fn default_rate_limit() -> u32 { 50 }
fn default_burst() -> u32 { 100 }
fn default_enabled() -> bool { true }
fn default_contact_max_requests() -> u32 { 5 }
fn default_contact_window_ms() -> u64 { 60_000 }
fn default_limiter_backend() -> LimiterBackend { LimiterBackend::Memory }

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            request_timeout_secs: default_request_timeout(),
            cors_origins: Vec::new(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            max_connections: default_max_connections(),
            min_connections: default_min_connections(),
            connect_timeout_secs: default_connect_timeout(),
            idle_timeout_secs: default_idle_timeout(),
            operation_timeout_secs: default_operation_timeout(),
            run_migrations: default_enabled(),
        }
    }
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            url: default_redis_url(),
            key_prefix: default_redis_prefix(),
        }
    }
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_base: default_email_api_base(),
            from: default_email_from(),
            business_inbox: default_business_inbox(),
            timeout_secs: default_email_timeout(),
        }
    }
}

impl Default for BrandConfig {
    fn default() -> Self {
        Self {
            company_name: default_company_name(),
            phone: default_company_phone(),
            website: default_company_site(),
            postal_address: default_company_address(),
        }
    }
}

impl Default for LeadsConfig {
    fn default() -> Self {
        Self {
            management_fee_percent: default_management_fee(),
        }
    }
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            json_logging: default_json_logging(),
            metrics_port: default_metrics_port(),
            service_name: default_service_name(),
        }
    }
}

impl Default for ContactLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: default_contact_max_requests(),
            window_ms: default_contact_window_ms(),
            backend: default_limiter_backend(),
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            requests_per_second: default_rate_limit(),
            burst: default_burst(),
            enabled: default_enabled(),
            trust_forwarded_headers: default_enabled(),
            contact: ContactLimitConfig::default(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            database: DatabaseConfig::default(),
            redis: RedisConfig::default(),
            email: EmailConfig::default(),
            brand: BrandConfig::default(),
            leads: LeadsConfig::default(),
            observability: ObservabilityConfig::default(),
            rate_limit: RateLimitConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment and files
    pub fn load() -> Result<Self, ConfigError> {
        let env = std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());

        let config = Config::builder()
            // Load base config file
            .add_source(File::with_name("config/default").required(false))

            // Load environment-specific config
            .add_source(File::with_name(&format!("config/{}", env)).required(false))

            // Load local overrides
            .add_source(File::with_name("config/local").required(false))

            // Load from environment variables with APP__ prefix
            // e.g., APP__EMAIL__API_KEY=re_123
            .add_source(
                Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true)
            )

            .build()?;

        config.try_deserialize()
    }

    /// Load from a specific TOML file
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let config = Config::builder()
            .add_source(File::with_name(path))
            .add_source(
                Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true)
            )
            .build()?;

        config.try_deserialize()
    }

    /// Get request timeout as Duration
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.server.request_timeout_secs)
    }

    /// Upper bound for one persistence transaction
    pub fn operation_timeout(&self) -> Duration {
        Duration::from_secs(self.database.operation_timeout_secs)
    }

    /// Fixed window used by the contact limiter
    pub fn contact_window(&self) -> Duration {
        Duration::from_millis(self.rate_limit.contact.window_ms)
    }

    /// Whether outgoing email is actually delivered
    pub fn email_configured(&self) -> bool {
        self.email
            .api_key
            .as_deref()
            .is_some_and(|key| !key.trim().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.rate_limit.contact.max_requests, 5);
        assert_eq!(config.contact_window(), Duration::from_secs(60));
        assert_eq!(config.leads.management_fee_percent, 20.0);
    }

    #[test]
    fn test_email_unconfigured_by_default() {
        let mut config = AppConfig::default();
        assert!(!config.email_configured());

        config.email.api_key = Some("   ".to_string());
        assert!(!config.email_configured());

        config.email.api_key = Some("re_test".to_string());
        assert!(config.email_configured());
    }

    #[test]
    fn test_partial_sections_deserialize() {
        let config: AppConfig = serde_json::from_value(serde_json::json!({
            "rate_limit": { "contact": { "backend": "redis" } },
            "database": { "url": "postgres://localhost/leads" }
        }))
        .unwrap();

        assert_eq!(config.rate_limit.contact.backend, LimiterBackend::Redis);
        assert_eq!(config.rate_limit.contact.window_ms, 60_000);
        assert_eq!(config.database.url.as_deref(), Some("postgres://localhost/leads"));
        assert_eq!(config.database.operation_timeout_secs, 5);
    }
}
