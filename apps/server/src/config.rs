//! Service configuration
//!
//! Layered in this order (later wins):
//! 1. Built-in defaults (`Config::default()`)
//! 2. Optional `config.{toml,yaml,json}` in the working directory, or the file named by
//!    `MEDORA_CONFIG`
//! 3. Environment variables prefixed `MEDORA__`, using `__` as the section separator
//!    (e.g. `MEDORA__DATABASE__BACKEND=postgres`)

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;

const ENV_PREFIX: &str = "MEDORA";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub pagination: PaginationConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Maximum accepted request body, in bytes
    pub max_request_body_size: usize,
    /// Allowed CORS origins; empty disables CORS headers
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            max_request_body_size: 1024 * 1024,
            cors_origins: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Memory,
    Postgres,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub backend: StorageBackend,
    pub url: Option<String>,
    pub pool_min_size: u32,
    pub pool_max_size: u32,
    pub pool_timeout_seconds: u64,
    pub run_migrations: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Memory,
            url: None,
            pool_min_size: 1,
            pool_max_size: 10,
            pool_timeout_seconds: 30,
            run_migrations: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// When false every request runs as the system super-admin
    pub enabled: bool,
    pub jwt_secret: Option<String>,
    /// Expected `iss` claim, checked only when set
    pub issuer: Option<String>,
    pub public_paths: Vec<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            jwt_secret: None,
            issuer: None,
            public_paths: vec!["/health".to_string()],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginationConfig {
    pub default_page_size: u32,
    pub max_page_size: u32,
    pub default_order_by: String,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            default_page_size: 10,
            max_page_size: 100,
            default_order_by: "createdAt".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub json: bool,
    pub file_enabled: bool,
    pub file_directory: String,
    pub file_prefix: String,
    /// daily | hourly | minutely | never
    pub file_rotation: String,
    pub service_name: String,
    pub deployment_environment: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            file_enabled: false,
            file_directory: "logs".to_string(),
            file_prefix: "medora".to_string(),
            file_rotation: "daily".to_string(),
            service_name: "medora".to_string(),
            deployment_environment: "development".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from defaults, optional config file and environment.
    pub fn load() -> anyhow::Result<Self> {
        let _ = dotenvy::dotenv();

        let defaults = config::Config::try_from(&Config::default())?;
        let mut builder = config::Config::builder().add_source(defaults);

        builder = match std::env::var(format!("{ENV_PREFIX}_CONFIG")) {
            Ok(path) => builder.add_source(config::File::with_name(&path)),
            Err(_) => builder.add_source(config::File::with_name("config").required(false)),
        };

        let settings = builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("server.cors_origins")
                    .with_list_parse_key("auth.public_paths"),
            )
            .build()?;

        Ok(settings.try_deserialize()?)
    }

    /// Check settings that cannot be expressed through types alone.
    pub fn validate(&self) -> Result<(), String> {
        let pagination = &self.pagination;
        if pagination.default_page_size == 0 {
            return Err("pagination.default_page_size must be greater than 0".to_string());
        }
        if pagination.max_page_size < pagination.default_page_size {
            return Err(
                "pagination.max_page_size must be at least pagination.default_page_size"
                    .to_string(),
            );
        }
        if pagination.default_order_by.trim().is_empty() {
            return Err("pagination.default_order_by must not be empty".to_string());
        }

        if self.database.backend == StorageBackend::Postgres && self.database.url.is_none() {
            return Err("database.url is required for the postgres backend".to_string());
        }
        if self.database.pool_max_size == 0 {
            return Err("database.pool_max_size must be greater than 0".to_string());
        }

        if self.auth.enabled
            && self
                .auth
                .jwt_secret
                .as_deref()
                .map_or(true, |s| s.trim().is_empty())
        {
            return Err("auth.jwt_secret is required when auth is enabled".to_string());
        }

        Ok(())
    }

    pub fn socket_addr(&self) -> anyhow::Result<SocketAddr> {
        let addr = format!("{}:{}", self.server.host, self.server.port);
        addr.parse()
            .map_err(|e| anyhow::anyhow!("Invalid listen address {addr}: {e}"))
    }
}
