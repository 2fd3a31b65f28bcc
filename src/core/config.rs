//! Configuration - Type-safe, validated config

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::core::{Error, Result, SigningCredential};

pub const DEFAULT_BASE_URL: &str = "https://api.toopher.com/v1/";

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Application settings
    #[serde(default)]
    pub app: AppConfig,

    /// Toopher API settings
    pub toopher: ToopherConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Log level
    pub log_level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct ToopherConfig {
    /// Consumer key (loaded from env if not provided)
    pub consumer_key: Option<String>,

    /// Consumer secret (loaded from env if not provided)
    pub consumer_secret: Option<String>,

    /// API base URL, with trailing slash
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Maximum postback age in seconds
    #[serde(default = "default_postback_ttl")]
    pub postback_ttl: i64,

    /// Lifetime of signed iframe URLs in seconds
    #[serde(default = "default_url_ttl")]
    pub url_ttl: i64,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}
fn default_postback_ttl() -> i64 {
    100
}
fn default_url_ttl() -> i64 {
    300
}

impl std::fmt::Debug for ToopherConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToopherConfig")
            .field("consumer_key", &self.consumer_key)
            .field("consumer_secret", &self.consumer_secret.as_ref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .field("postback_ttl", &self.postback_ttl)
            .field("url_ttl", &self.url_ttl)
            .finish()
    }
}

impl Default for ToopherConfig {
    fn default() -> Self {
        Self {
            consumer_key: None,
            consumer_secret: None,
            base_url: default_base_url(),
            postback_ttl: default_postback_ttl(),
            url_ttl: default_url_ttl(),
        }
    }
}

impl Config {
    /// Load from TOML file. Credentials missing from the file fall back to
    /// `TOOPHER_CONSUMER_KEY` / `TOOPHER_CONSUMER_SECRET`.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read config: {}", e)))?;

        let mut config = Self::parse(&content)?;
        config.fill_from_env();
        Ok(config)
    }

    /// Parse a TOML document
    pub fn parse(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| Error::Config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// TTLs must be non-negative
    pub fn validate(&self) -> Result<()> {
        if self.toopher.postback_ttl < 0 {
            return Err(Error::Config(format!(
                "postback_ttl must be >= 0, got {}",
                self.toopher.postback_ttl
            )));
        }
        if self.toopher.url_ttl < 0 {
            return Err(Error::Config(format!("url_ttl must be >= 0, got {}", self.toopher.url_ttl)));
        }
        Ok(())
    }

    /// Build from environment variables (and `.env` if present)
    pub fn from_env() -> Self {
        let mut config = Config {
            app: AppConfig::default(),
            toopher: ToopherConfig::default(),
        };
        config.fill_from_env();
        if let Ok(base_url) = std::env::var("TOOPHER_BASE_URL") {
            config.toopher.base_url = base_url;
        }
        config
    }

    fn fill_from_env(&mut self) {
        dotenv::dotenv().ok();
        if self.toopher.consumer_key.is_none() {
            self.toopher.consumer_key = std::env::var("TOOPHER_CONSUMER_KEY").ok();
        }
        if self.toopher.consumer_secret.is_none() {
            self.toopher.consumer_secret = std::env::var("TOOPHER_CONSUMER_SECRET").ok();
        }
    }

    /// Validated signing credential
    pub fn credential(&self) -> Result<SigningCredential> {
        let key = self
            .toopher
            .consumer_key
            .as_deref()
            .ok_or_else(|| Error::Config("Toopher consumer key not configured".to_string()))?;
        let secret = self
            .toopher
            .consumer_secret
            .as_deref()
            .ok_or_else(|| Error::Config("Toopher consumer secret not configured".to_string()))?;
        SigningCredential::new(key, secret)
    }
}
