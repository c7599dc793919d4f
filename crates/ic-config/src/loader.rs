//! Configuration loader with file and environment variable support

use crate::{AppConfig, ConfigError, KeyAllocatorKind, StoreBackend};
use std::env;
use std::path::PathBuf;
use tracing::{info, warn};

/// Standard config file search paths
const CONFIG_PATHS: &[&str] = &[
    "config.toml",
    "identity-console.toml",
    "./config/config.toml",
    "/etc/identity-console/config.toml",
];

/// Configuration loader
pub struct ConfigLoader {
    config_path: Option<PathBuf>,
}

impl ConfigLoader {
    /// Create a new configuration loader
    pub fn new() -> Self {
        Self { config_path: None }
    }

    /// Create a loader with a specific config file path
    pub fn with_path<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            config_path: Some(path.into()),
        }
    }

    /// Load configuration from file (if found) with environment variable overrides
    pub fn load(&self) -> Result<AppConfig, ConfigError> {
        let mut config = AppConfig::default();

        if let Some(path) = self.find_config_file() {
            info!(?path, "Loading configuration from file");
            config = AppConfig::from_file(&path)?;
        }

        apply_env_overrides(&mut config, |key| env::var(key).ok());
        config.validate()?;

        Ok(config)
    }

    fn find_config_file(&self) -> Option<PathBuf> {
        if let Some(path) = &self.config_path {
            if path.exists() {
                return Some(path.clone());
            }
            warn!(?path, "Configured path does not exist, falling back to search paths");
        }

        if let Ok(path) = env::var("IDCONSOLE_CONFIG") {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        CONFIG_PATHS
            .iter()
            .map(PathBuf::from)
            .find(|path| path.exists())
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// Apply `IDCONSOLE_*` overrides. The lookup is injected so tests do not
/// have to mutate the process environment.
pub(crate) fn apply_env_overrides<F>(config: &mut AppConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    // HTTP
    if let Some(port) = lookup("IDCONSOLE_HTTP_PORT").and_then(|v| v.parse().ok()) {
        config.http.port = port;
    }
    if let Some(val) = lookup("IDCONSOLE_HTTP_HOST") {
        config.http.host = val;
    }
    if let Some(val) = lookup("IDCONSOLE_CORS_ORIGINS") {
        config.http.cors_origins = val.split(',').map(|s| s.trim().to_string()).collect();
    }

    // Store
    if let Some(val) = lookup("IDCONSOLE_STORE_BACKEND") {
        match val.to_lowercase().as_str() {
            "memory" => config.store.backend = StoreBackend::Memory,
            "mongodb" => config.store.backend = StoreBackend::Mongodb,
            other => warn!(backend = other, "Ignoring unknown IDCONSOLE_STORE_BACKEND"),
        }
    }
    if let Some(val) = lookup("IDCONSOLE_MONGODB_URI") {
        config.store.mongodb_uri = val;
    }
    if let Some(val) = lookup("IDCONSOLE_MONGODB_DATABASE") {
        config.store.mongodb_database = val;
    }
    if let Some(val) = lookup("IDCONSOLE_KEY_ALLOCATOR") {
        match val.to_lowercase().as_str() {
            "random" => config.store.key_allocator = KeyAllocatorKind::Random,
            "sequential" => config.store.key_allocator = KeyAllocatorKind::Sequential,
            other => warn!(allocator = other, "Ignoring unknown IDCONSOLE_KEY_ALLOCATOR"),
        }
    }

    // Listing
    if let Some(limit) = lookup("IDCONSOLE_LISTING_DEFAULT_LIMIT").and_then(|v| v.parse().ok()) {
        config.listing.default_limit = limit;
    }
    if let Some(limit) = lookup("IDCONSOLE_LISTING_MAX_LIMIT").and_then(|v| v.parse().ok()) {
        config.listing.max_limit = limit;
    }

    // Reconcile
    if let Some(val) = lookup("IDCONSOLE_STOP_ON_FIRST_ERROR") {
        config.reconcile.stop_on_first_error = val.parse().unwrap_or(false);
    }
    if let Some(val) = lookup("IDCONSOLE_SERIALIZE_PER_PRINCIPAL") {
        config.reconcile.serialize_per_principal = val.parse().unwrap_or(false);
    }

    // General
    if let Some(val) = lookup("IDCONSOLE_DEV_MODE") {
        config.dev_mode = val == "true" || val == "1";
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
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_env_overrides() {
        let mut config = AppConfig::default();
        apply_env_overrides(
            &mut config,
            lookup_from(&[
                ("IDCONSOLE_HTTP_PORT", "9000"),
                ("IDCONSOLE_STORE_BACKEND", "MongoDB"),
                ("IDCONSOLE_KEY_ALLOCATOR", "sequential"),
                ("IDCONSOLE_SERIALIZE_PER_PRINCIPAL", "true"),
                ("IDCONSOLE_DEV_MODE", "1"),
            ]),
        );

        assert_eq!(config.http.port, 9000);
        assert_eq!(config.store.backend, StoreBackend::Mongodb);
        assert_eq!(config.store.key_allocator, KeyAllocatorKind::Sequential);
        assert!(config.reconcile.serialize_per_principal);
        assert!(config.dev_mode);
    }

    #[test]
    fn test_invalid_env_values_are_ignored() {
        let mut config = AppConfig::default();
        apply_env_overrides(
            &mut config,
            lookup_from(&[
                ("IDCONSOLE_HTTP_PORT", "not-a-port"),
                ("IDCONSOLE_STORE_BACKEND", "sqlite"),
            ]),
        );

        assert_eq!(config.http.port, 8080);
        assert_eq!(config.store.backend, StoreBackend::Memory);
    }

    #[test]
    fn test_explicit_path_is_loaded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("console.toml");
        std::fs::write(&path, "[listing]\ndefault_limit = 10\n").unwrap();

        let config = ConfigLoader::with_path(&path).load().unwrap();
        assert_eq!(config.listing.default_limit, 10);
    }
}
