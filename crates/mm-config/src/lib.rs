//! Membership Matrix Configuration
//!
//! TOML-based configuration with environment variable override support.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

mod loader;

pub use loader::ConfigLoader;

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Root application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Seed the in-memory directory with demo users and groups
    pub dev_mode: bool,

    pub http: HttpConfig,
    pub directory: DirectoryConfig,
    pub session: SessionConfig,
    pub matrix: MatrixConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub port: u16,
    pub host: String,
    pub cors_origins: Vec<String>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            host: "0.0.0.0".to_string(),
            cors_origins: vec!["http://localhost:3000".to_string()],
        }
    }
}

/// Which directory service adapter backs the matrix
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DirectoryBackend {
    Memory,
    Rest,
}

impl std::str::FromStr for DirectoryBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(Self::Memory),
            "rest" => Ok(Self::Rest),
            other => Err(ConfigError::ValidationError(format!(
                "unknown directory backend '{}'",
                other
            ))),
        }
    }
}

/// Directory service connection and sizing
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DirectoryConfig {
    pub backend: DirectoryBackend,
    /// Site root of the REST directory, e.g. `https://intranet.example.org/Plone`
    pub base_url: String,
    /// Service token sent as a bearer credential to the REST directory
    pub token: String,
    pub timeout_ms: u64,
    /// Directory holds too many users to list without a query
    pub many_users: bool,
    /// Directory holds too many groups to list without a query
    pub many_groups: bool,
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            backend: DirectoryBackend::Memory,
            base_url: String::new(),
            token: String::new(),
            timeout_ms: 10_000,
            many_users: false,
            many_groups: false,
        }
    }
}

/// Session token verification
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Shared secret the session tokens are signed with. Empty rejects every
    /// token, so nobody can change memberships.
    pub secret: String,
    /// `HS256`, `HS384` or `HS512`
    pub algorithm: String,
    /// Allowed clock skew when checking expiry
    pub leeway_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            secret: String::new(),
            algorithm: "HS256".to_string(),
            leeway_secs: 60,
        }
    }
}

/// Matrix behaviour
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MatrixConfig {
    /// Rows added per "load more"
    pub page_size: usize,
    /// Largest row limit a client may request, in pages
    pub max_pages: usize,
    /// Role that makes a principal a manager
    pub manager_role: String,
}

impl Default for MatrixConfig {
    fn default() -> Self {
        Self {
            page_size: 25,
            max_pages: 20,
            manager_role: "Manager".to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: AppConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load configuration with environment variable override
    pub fn load() -> Result<Self, ConfigError> {
        ConfigLoader::new().load()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.matrix.page_size == 0 {
            return Err(ConfigError::ValidationError(
                "matrix.page_size must be greater than zero".to_string(),
            ));
        }
        if self.matrix.max_pages == 0 {
            return Err(ConfigError::ValidationError(
                "matrix.max_pages must be greater than zero".to_string(),
            ));
        }
        if !matches!(self.session.algorithm.as_str(), "HS256" | "HS384" | "HS512") {
            return Err(ConfigError::ValidationError(format!(
                "session.algorithm '{}' is not supported (HS256, HS384 or HS512)",
                self.session.algorithm
            )));
        }
        if self.directory.backend == DirectoryBackend::Rest
            && self.directory.base_url.trim().is_empty()
        {
            return Err(ConfigError::ValidationError(
                "directory.base_url is required for the rest backend".to_string(),
            ));
        }
        Ok(())
    }

    /// Generate an example TOML configuration
    pub fn example_toml() -> String {
        r#"# Membership Matrix Configuration
# Environment variables (MEMBERSHIP_MATRIX_*) override these settings

dev_mode = false

[http]
port = 8080
host = "0.0.0.0"
cors_origins = ["http://localhost:3000"]

[directory]
backend = "memory"  # memory or rest
base_url = ""
token = ""
timeout_ms = 10000
many_users = false
many_groups = false

[session]
secret = ""  # empty: every session token is rejected
algorithm = "HS256"
leeway_secs = 60

[matrix]
page_size = 25
max_pages = 20
manager_role = "Manager"
"#
        .to_string()
    }
}
