use serde::Deserialize;
use std::{env, fs, path::Path};

use crate::errors::ConfigError;

/// Deployment mode. Only `Development` exposes internal error details
/// in response bodies.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Production,
    Test,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Production => "production",
            Environment::Test => "test",
        }
    }

    pub fn is_development(&self) -> bool {
        matches!(self, Environment::Development)
    }

    fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "development" | "dev" => Some(Environment::Development),
            "production" | "prod" => Some(Environment::Production),
            "test" => Some(Environment::Test),
            _ => None,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct AppConfig {
    /// HTTP port to listen on.
    pub port: u16,

    /// Log level for tracing (e.g. "info", "debug").
    pub log_level: String,

    pub environment: Environment,

    /// Allowed CORS origin. `"*"` allows any origin.
    pub cors_origin: String,

    pub server_version: String,

    /// Maximum accepted request body, in bytes.
    pub body_limit_bytes: usize,

    pub rate_limit: RateLimitConfig,

    pub validation: ValidationConfig,

    pub contact: ContactConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Length of one counting window (seconds).
    pub window_seconds: u64,

    /// Requests allowed per client inside one window.
    pub max_requests: u32,

    /// Chance (0.0..=1.0) that a request triggers an inline sweep of
    /// expired entries.
    pub sweep_probability: f64,

    /// How often (seconds) the background sweep runs.
    ///
    /// If `None`, only the inline probabilistic sweep happens.
    pub cleanup_interval_seconds: Option<u64>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ValidationConfig {
    /// Also check phone, admission date and maximum lengths.
    pub strict: bool,
    pub max_name_length: usize,
    pub max_position_length: usize,
    pub max_department_length: usize,
    pub max_email_length: usize,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ContactConfig {
    pub name: String,
    pub email: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            log_level: "info".to_string(),
            environment: Environment::default(),
            cors_origin: "*".to_string(),
            server_version: env!("CARGO_PKG_VERSION").to_string(),
            body_limit_bytes: 10 * 1024 * 1024,
            rate_limit: RateLimitConfig::default(),
            validation: ValidationConfig::default(),
            contact: ContactConfig::default(),
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            window_seconds: 15 * 60,
            max_requests: 100,
            sweep_probability: 0.01,
            cleanup_interval_seconds: Some(60),
        }
    }
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            strict: true,
            max_name_length: 100,
            max_position_length: 100,
            max_department_length: 50,
            max_email_length: 255,
        }
    }
}

impl Default for ContactConfig {
    fn default() -> Self {
        Self {
            name: "Equipe de Desenvolvimento".to_string(),
            email: "suporte@empresa.com".to_string(),
        }
    }
}

impl AppConfig {
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let file = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;

        serde_json::from_str::<AppConfig>(&file).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    /// Apply `PORT`, `APP_ENV`/`NODE_ENV`, `CORS_ORIGIN`, `RATE_LIMIT_MAX`
    /// and `LOG_LEVEL` on top of the loaded values.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|key| env::var(key).ok())
    }

    fn with_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(raw) = lookup("PORT") {
            match raw.trim().parse() {
                Ok(port) => self.port = port,
                Err(_) => tracing::warn!("Ignoring invalid PORT value {:?}", raw),
            }
        }

        if let Some(raw) = lookup("APP_ENV").or_else(|| lookup("NODE_ENV")) {
            match Environment::parse(&raw) {
                Some(environment) => self.environment = environment,
                None => tracing::warn!("Ignoring unknown environment {:?}", raw),
            }
        }

        if let Some(origin) = lookup("CORS_ORIGIN") {
            self.cors_origin = origin;
        }

        if let Some(raw) = lookup("RATE_LIMIT_MAX") {
            match raw.trim().parse() {
                Ok(max) => self.rate_limit.max_requests = max,
                Err(_) => tracing::warn!("Ignoring invalid RATE_LIMIT_MAX value {:?}", raw),
            }
        }

        if let Some(level) = lookup("LOG_LEVEL") {
            self.log_level = level;
        }

        self
    }
}
