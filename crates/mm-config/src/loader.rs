//! Configuration loader with file and environment variable support

use crate::{AppConfig, ConfigError};
use std::env;
use std::path::PathBuf;
use tracing::{info, warn};

/// Standard config file search paths
const CONFIG_PATHS: &[&str] = &[
    "membership-matrix.toml",
    "config.toml",
    "./config/membership-matrix.toml",
    "/etc/membership-matrix/config.toml",
];

const CONFIG_PATH_VAR: &str = "MEMBERSHIP_MATRIX_CONFIG";

/// Configuration loader
pub struct ConfigLoader {
    config_path: Option<PathBuf>,
}

impl ConfigLoader {
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
        let mut config = match self.find_config_file() {
            Some(path) => {
                info!(?path, "Loading configuration from file");
                AppConfig::from_file(&path)?
            }
            None => AppConfig::default(),
        };

        apply_overrides(&mut config, |key| env::var(key).ok());
        config.validate()?;

        Ok(config)
    }

    fn find_config_file(&self) -> Option<PathBuf> {
        if let Some(path) = &self.config_path {
            if path.exists() {
                return Some(path.clone());
            }
            warn!(?path, "Configured path does not exist, searching defaults");
        }

        if let Ok(path) = env::var(CONFIG_PATH_VAR) {
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

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Apply `MEMBERSHIP_MATRIX_*` overrides read through `lookup`.
///
/// Unparseable values are ignored and leave the file/default value in place.
pub(crate) fn apply_overrides<F>(config: &mut AppConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    // HTTP
    if let Some(port) = lookup("MEMBERSHIP_MATRIX_HTTP_PORT").and_then(|v| v.parse().ok()) {
        config.http.port = port;
    }
    if let Some(host) = lookup("MEMBERSHIP_MATRIX_HTTP_HOST") {
        config.http.host = host;
    }
    if let Some(origins) = lookup("MEMBERSHIP_MATRIX_CORS_ORIGINS") {
        config.http.cors_origins = origins
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
    }

    // Directory
    if let Some(backend) = lookup("MEMBERSHIP_MATRIX_DIRECTORY_BACKEND") {
        match backend.parse() {
            Ok(backend) => config.directory.backend = backend,
            Err(e) => warn!(error = %e, "Ignoring directory backend override"),
        }
    }
    if let Some(url) = lookup("MEMBERSHIP_MATRIX_DIRECTORY_URL") {
        config.directory.base_url = url;
    }
    if let Some(token) = lookup("MEMBERSHIP_MATRIX_DIRECTORY_TOKEN") {
        config.directory.token = token;
    }
    if let Some(timeout) = lookup("MEMBERSHIP_MATRIX_DIRECTORY_TIMEOUT_MS").and_then(|v| v.parse().ok()) {
        config.directory.timeout_ms = timeout;
    }
    if let Some(flag) = lookup("MEMBERSHIP_MATRIX_MANY_USERS").and_then(|v| parse_flag(&v)) {
        config.directory.many_users = flag;
    }
    if let Some(flag) = lookup("MEMBERSHIP_MATRIX_MANY_GROUPS").and_then(|v| parse_flag(&v)) {
        config.directory.many_groups = flag;
    }

    // Session
    if let Some(secret) = lookup("MEMBERSHIP_MATRIX_SESSION_SECRET") {
        config.session.secret = secret;
    }
    if let Some(algorithm) = lookup("MEMBERSHIP_MATRIX_SESSION_ALGORITHM") {
        config.session.algorithm = algorithm.trim().to_ascii_uppercase();
    }

    // Matrix
    if let Some(size) = lookup("MEMBERSHIP_MATRIX_PAGE_SIZE").and_then(|v| v.parse().ok()) {
        config.matrix.page_size = size;
    }
    if let Some(pages) = lookup("MEMBERSHIP_MATRIX_MAX_PAGES").and_then(|v| v.parse().ok()) {
        config.matrix.max_pages = pages;
    }
    if let Some(role) = lookup("MEMBERSHIP_MATRIX_MANAGER_ROLE") {
        config.matrix.manager_role = role;
    }

    // General
    if let Some(flag) = lookup("MEMBERSHIP_MATRIX_DEV_MODE").and_then(|v| parse_flag(&v)) {
        config.dev_mode = flag;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DirectoryBackend;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_overrides_apply() {
        let mut config = AppConfig::default();
        apply_overrides(
            &mut config,
            lookup_from(&[
                ("MEMBERSHIP_MATRIX_HTTP_PORT", "9000"),
                ("MEMBERSHIP_MATRIX_DIRECTORY_BACKEND", "rest"),
                ("MEMBERSHIP_MATRIX_DIRECTORY_URL", "http://plone:8080/Plone"),
                ("MEMBERSHIP_MATRIX_MANY_GROUPS", "yes"),
                ("MEMBERSHIP_MATRIX_PAGE_SIZE", "50"),
                ("MEMBERSHIP_MATRIX_CORS_ORIGINS", "http://a, http://b,"),
                ("MEMBERSHIP_MATRIX_SESSION_SECRET", "s3cret"),
                ("MEMBERSHIP_MATRIX_SESSION_ALGORITHM", "hs512"),
            ]),
        );

        assert_eq!(config.http.port, 9000);
        assert_eq!(config.directory.backend, DirectoryBackend::Rest);
        assert_eq!(config.directory.base_url, "http://plone:8080/Plone");
        assert!(config.directory.many_groups);
        assert!(!config.directory.many_users);
        assert_eq!(config.matrix.page_size, 50);
        assert_eq!(config.http.cors_origins, vec!["http://a", "http://b"]);
        assert_eq!(config.session.secret, "s3cret");
        assert_eq!(config.session.algorithm, "HS512");
    }

    #[test]
    fn test_invalid_overrides_are_ignored() {
        let mut config = AppConfig::default();
        apply_overrides(
            &mut config,
            lookup_from(&[
                ("MEMBERSHIP_MATRIX_HTTP_PORT", "not-a-port"),
                ("MEMBERSHIP_MATRIX_DIRECTORY_BACKEND", "ldap"),
                ("MEMBERSHIP_MATRIX_MANY_USERS", "maybe"),
            ]),
        );

        assert_eq!(config.http.port, 8080);
        assert_eq!(config.directory.backend, DirectoryBackend::Memory);
        assert!(!config.directory.many_users);
    }

    #[test]
    fn test_explicit_path_is_loaded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("matrix.toml");
        std::fs::write(&path, "[matrix]\npage_size = 10\nmax_pages = 3\n").unwrap();

        let config = ConfigLoader::with_path(&path).load().unwrap();
        assert_eq!(config.matrix.page_size, 10);
        assert_eq!(config.matrix.max_pages, 3);
    }
}
