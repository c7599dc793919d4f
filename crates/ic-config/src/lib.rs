//! Identity Console Configuration System
//!
//! TOML-based configuration with environment variable override support.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
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
    pub http: HttpConfig,
    pub store: StoreConfig,
    pub password: PasswordConfig,
    pub listing: ListingConfig,
    pub reconcile: ReconcileConfig,
    pub claims: ClaimsConfig,

    /// Seed demo users and roles on startup
    pub dev_mode: bool,
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
            cors_origins: vec!["http://localhost:5000".to_string()],
        }
    }
}

/// Backing store for principals
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Memory,
    Mongodb,
}

/// Surrogate key strategy for claim records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyAllocatorKind {
    Random,
    Sequential,
}

/// Principal store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    pub mongodb_uri: String,
    pub mongodb_database: String,
    pub key_allocator: KeyAllocatorKind,
    /// Attempts before giving up on finding an unused claim key
    pub max_key_attempts: u32,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::Memory,
            mongodb_uri: "mongodb://localhost:27017".to_string(),
            mongodb_database: "identity_console".to_string(),
            key_allocator: KeyAllocatorKind::Random,
            max_key_attempts: 8,
        }
    }
}

/// Password policy applied by the store on create and reset
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PasswordConfig {
    pub min_length: usize,
    pub require_uppercase: bool,
    pub require_lowercase: bool,
    pub require_digit: bool,
    pub require_special: bool,
}

impl Default for PasswordConfig {
    fn default() -> Self {
        Self {
            min_length: 6,
            require_uppercase: true,
            require_lowercase: true,
            require_digit: false,
            require_special: false,
        }
    }
}

/// Listing defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ListingConfig {
    pub default_limit: usize,
    pub max_limit: usize,
    pub case_sensitive_search: bool,
}

impl Default for ListingConfig {
    fn default() -> Self {
        Self {
            default_limit: 25,
            max_limit: 500,
            case_sensitive_search: false,
        }
    }
}

/// Reconciliation behaviour
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconcileConfig {
    /// Stop applying a delta at the first failed mutation
    pub stop_on_first_error: bool,
    /// Hold an in-process lock per principal across read, diff and apply
    pub serialize_per_principal: bool,
}

/// Claim catalog extensions
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ClaimsConfig {
    /// Short key -> fully-qualified claim type, merged into the well-known set
    pub extra_types: BTreeMap<String, String>,
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

    /// Reject settings that cannot work at runtime
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.listing.default_limit == 0 || self.listing.max_limit == 0 {
            return Err(ConfigError::ValidationError(
                "listing limits must be greater than zero".to_string(),
            ));
        }
        if self.listing.default_limit > self.listing.max_limit {
            return Err(ConfigError::ValidationError(format!(
                "listing.default_limit ({}) exceeds listing.max_limit ({})",
                self.listing.default_limit, self.listing.max_limit
            )));
        }
        if self.store.max_key_attempts == 0 {
            return Err(ConfigError::ValidationError(
                "store.max_key_attempts must be greater than zero".to_string(),
            ));
        }
        if self.store.backend == StoreBackend::Mongodb && self.store.mongodb_uri.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "store.mongodb_uri is required for the mongodb backend".to_string(),
            ));
        }
        for (key, claim_type) in &self.claims.extra_types {
            if key.trim().is_empty() || claim_type.trim().is_empty() {
                return Err(ConfigError::ValidationError(
                    "claims.extra_types entries need a key and a claim type".to_string(),
                ));
            }
        }
        Ok(())
    }

    /// Generate an example TOML configuration
    pub fn example_toml() -> String {
        r#"# Identity Console Configuration
# Environment variables (IDCONSOLE_*) override these settings

dev_mode = false

[http]
port = 8080
host = "0.0.0.0"
cors_origins = ["http://localhost:5000"]

[store]
backend = "memory"  # memory or mongodb
mongodb_uri = "mongodb://localhost:27017"
mongodb_database = "identity_console"
key_allocator = "random"  # random or sequential
max_key_attempts = 8

[password]
min_length = 6
require_uppercase = true
require_lowercase = true
require_digit = false
require_special = false

[listing]
default_limit = 25
max_limit = 500
case_sensitive_search = false

[reconcile]
stop_on_first_error = false
serialize_per_principal = false

[claims.extra_types]
Department = "urn:identity-console:claims:department"
"#
        .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_are_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.store.backend, StoreBackend::Memory);
        assert_eq!(config.store.key_allocator, KeyAllocatorKind::Random);
        assert!(!config.listing.case_sensitive_search);
    }

    #[test]
    fn test_example_toml_parses() {
        let config: AppConfig = toml::from_str(&AppConfig::example_toml()).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(
            config.claims.extra_types.get("Department").map(String::as_str),
            Some("urn:identity-console:claims:department")
        );
    }

    #[test]
    fn test_from_file_partial_sections() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[store]\nbackend = \"mongodb\"\n\n[listing]\nmax_limit = 50").unwrap();

        let config = AppConfig::from_file(file.path()).unwrap();
        assert_eq!(config.store.backend, StoreBackend::Mongodb);
        assert_eq!(config.store.mongodb_database, "identity_console");
        assert_eq!(config.listing.max_limit, 50);
        assert_eq!(config.listing.default_limit, 25);
    }

    #[test]
    fn test_validate_rejects_bad_limits() {
        let mut config = AppConfig::default();
        config.listing.default_limit = 0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.listing.default_limit = 100;
        config.listing.max_limit = 10;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_unknown_backend_is_parse_error() {
        let result: Result<AppConfig, _> = toml::from_str("[store]\nbackend = \"sqlite\"");
        assert!(result.is_err());
    }
}
