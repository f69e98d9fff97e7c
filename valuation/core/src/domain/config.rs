// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Service Configuration Types
//
// Defines the configuration schema for the valuation service:
// - HTTP server binding
// - Case store and blob store backends
// - RC lookup and AI valuation providers
// - Logging and metrics settings
//
// Loaded once at startup and passed to constructors; nothing below the CLI
// reads the environment directly.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::domain::repository::{PostgresConfig, StorageBackend};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServiceConfig {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub blob: BlobConfig,

    /// RC lookup provider; `with-rc` requests fail when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rc_lookup: Option<RcLookupConfig>,

    /// AI valuation provider; estimates fail when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valuation_ai: Option<ValuationAiConfig>,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub metrics: MetricsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    #[serde(default = "default_api_port")]
    pub port: u16,

    /// Upper bound on a multipart request body, in megabytes
    #[serde(default = "default_body_limit_mb")]
    pub body_limit_mb: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_api_port(),
            body_limit_mb: default_body_limit_mb(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StorageKind {
    #[default]
    InMemory,
    Postgres,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageKind,

    /// PostgreSQL connection string (supports "env:VAR_NAME")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database_url: Option<String>,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageKind::InMemory,
            database_url: None,
            max_connections: default_max_connections(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BlobKind {
    #[default]
    InMemory,
    Local,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlobConfig {
    #[serde(default)]
    pub backend: BlobKind,

    /// Root directory for the local backend
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root: Option<PathBuf>,

    /// Prefix for returned URLs
    #[serde(default = "default_public_base_url")]
    pub public_base_url: String,
}

impl Default for BlobConfig {
    fn default() -> Self {
        Self {
            backend: BlobKind::InMemory,
            root: None,
            public_base_url: default_public_base_url(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RcLookupConfig {
    pub endpoint: String,

    /// API key (supports "env:VAR_NAME" for environment variables)
    pub api_key: String,

    #[serde(default = "default_provider_timeout", with = "humantime_serde")]
    pub timeout: Duration,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValuationAiConfig {
    /// Base URL of an OpenAI-compatible API, e.g. `https://api.openai.com/v1`
    #[serde(default = "default_ai_endpoint")]
    pub endpoint: String,

    /// API key (supports "env:VAR_NAME" for environment variables)
    pub api_key: String,

    #[serde(default = "default_ai_model")]
    pub model: String,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    #[serde(default = "default_provider_timeout", with = "humantime_serde")]
    pub timeout: Duration,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (e.g., "info", "debug", "trace")
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format ("json" or "text")
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default = "default_metrics_port")]
    pub port: u16,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            port: default_metrics_port(),
        }
    }
}

// Default value functions
fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}

fn default_api_port() -> u16 {
    8080
}

fn default_body_limit_mb() -> usize {
    50
}

fn default_max_connections() -> u32 {
    5
}

fn default_public_base_url() -> String {
    "blob://valuations".to_string()
}

fn default_provider_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_ai_endpoint() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_ai_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_temperature() -> f32 {
    0.2
}

fn default_max_tokens() -> u32 {
    200
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

fn default_metrics_port() -> u16 {
    9090
}

/// Resolve a secret that may be written as `env:VAR_NAME`.
///
/// Returns `None` when the referenced variable is unset.
pub fn resolve_secret(value: &str) -> Option<String> {
    match value.strip_prefix("env:") {
        Some(var_name) => std::env::var(var_name).ok(),
        None => Some(value.to_string()),
    }
}

impl ServiceConfig {
    /// Load configuration from YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to YAML file
    pub fn to_yaml_file(&self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml)?;
        Ok(())
    }

    pub fn from_yaml_str(yaml: &str) -> anyhow::Result<Self> {
        let config = serde_yaml::from_str(yaml)?;
        Ok(config)
    }

    /// Discover configuration file using precedence order
    /// 1. VALUATION_CONFIG_PATH environment variable
    /// 2. ./valuation-config.yaml (working directory)
    /// 3. ~/.valuation/config.yaml (user home)
    /// 4. /etc/valuation/config.yaml (system)
    pub fn discover_config() -> Option<PathBuf> {
        if let Ok(path) = std::env::var("VALUATION_CONFIG_PATH") {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        let cwd = PathBuf::from("./valuation-config.yaml");
        if cwd.exists() {
            return Some(cwd);
        }

        if let Some(home) = dirs::home_dir() {
            let user_config = home.join(".valuation").join("config.yaml");
            if user_config.exists() {
                return Some(user_config);
            }
        }

        let system_config = PathBuf::from("/etc/valuation/config.yaml");
        if system_config.exists() {
            return Some(system_config);
        }

        None
    }

    /// Load configuration with discovery, fallback to default
    pub fn load_or_default(cli_path: Option<PathBuf>) -> anyhow::Result<Self> {
        // Explicit CLI path fails if missing or invalid
        if let Some(path) = cli_path {
            tracing::info!("Loading configuration from explicit path: {:?}", path);
            let mut config = Self::from_yaml_file(&path)
                .map_err(|e| anyhow::anyhow!("Failed to load config at {:?}: {}", path, e))?;
            config.apply_env_overrides();
            return Ok(config);
        }

        if let Some(config_path) = Self::discover_config() {
            tracing::info!("Loading configuration from discovered path: {:?}", config_path);
            let mut config = Self::from_yaml_file(config_path)?;
            config.apply_env_overrides();
            Ok(config)
        } else {
            tracing::warn!("No configuration file found in standard locations. Using defaults.");
            let mut config = Self::default();
            config.apply_env_overrides();
            Ok(config)
        }
    }

    /// Apply environment variable overrides to configuration
    pub fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("VALUATION_DATABASE_URL") {
            tracing::info!("Environment override: VALUATION_DATABASE_URL");
            self.storage.backend = StorageKind::Postgres;
            self.storage.database_url = Some(url);
        }

        if let Ok(root) = std::env::var("VALUATION_BLOB_ROOT") {
            tracing::info!("Environment override: VALUATION_BLOB_ROOT={}", root);
            self.blob.backend = BlobKind::Local;
            self.blob.root = Some(PathBuf::from(root));
        }

        if let Ok(key) = std::env::var("VALUATION_RC_API_KEY") {
            match self.rc_lookup.as_mut() {
                Some(rc) => rc.api_key = key,
                None => tracing::warn!(
                    "VALUATION_RC_API_KEY set but no rc_lookup section configured. Ignoring."
                ),
            }
        }

        if let Ok(key) = std::env::var("VALUATION_AI_API_KEY") {
            match self.valuation_ai.as_mut() {
                Some(ai) => ai.api_key = key,
                None => {
                    tracing::info!(
                        "Environment override: VALUATION_AI_API_KEY enables valuation_ai defaults"
                    );
                    self.valuation_ai = Some(ValuationAiConfig {
                        endpoint: default_ai_endpoint(),
                        api_key: key,
                        model: default_ai_model(),
                        temperature: default_temperature(),
                        max_tokens: default_max_tokens(),
                        timeout: default_provider_timeout(),
                    });
                }
            }
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.server.port == 0 {
            anyhow::bail!("server.port cannot be 0");
        }

        if self.storage.backend == StorageKind::Postgres
            && self.storage.database_url.as_deref().map_or(true, str::is_empty)
        {
            anyhow::bail!("storage.database_url is required for the postgres backend");
        }

        if self.blob.backend == BlobKind::Local && self.blob.root.is_none() {
            anyhow::bail!("blob.root is required for the local blob backend");
        }

        if let Some(rc) = &self.rc_lookup {
            if rc.endpoint.is_empty() {
                anyhow::bail!("rc_lookup.endpoint cannot be empty");
            }
        }

        if let Some(ai) = &self.valuation_ai {
            if ai.endpoint.is_empty() {
                anyhow::bail!("valuation_ai.endpoint cannot be empty");
            }
            if ai.model.is_empty() {
                anyhow::bail!("valuation_ai.model cannot be empty");
            }
            if !(0.0..=2.0).contains(&ai.temperature) {
                anyhow::bail!("valuation_ai.temperature must be between 0 and 2");
            }
        }

        match self.logging.format.as_str() {
            "json" | "text" => {}
            other => anyhow::bail!("logging.format must be 'json' or 'text', got '{}'", other),
        }

        Ok(())
    }

    /// Case store backend selected by this configuration
    pub fn storage_backend(&self) -> anyhow::Result<StorageBackend> {
        match self.storage.backend {
            StorageKind::InMemory => Ok(StorageBackend::InMemory),
            StorageKind::Postgres => {
                let raw = self
                    .storage
                    .database_url
                    .as_deref()
                    .ok_or_else(|| anyhow::anyhow!("storage.database_url is not set"))?;
                let connection_string = resolve_secret(raw).ok_or_else(|| {
                    anyhow::anyhow!("storage.database_url references an unset variable")
                })?;
                Ok(StorageBackend::PostgreSQL(PostgresConfig {
                    connection_string,
                    max_connections: self.storage.max_connections,
                }))
            }
        }
    }
}
