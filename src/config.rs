//! Server configuration module
//! Reads the gateway settings from `RUSTY_WARDEN_*` environment variables

use crate::auth::permissions::DefaultPermissions;
use crate::constants::{
    DEFAULT_ACCESS_TOKEN_TTL_SECS, DEFAULT_HOST, DEFAULT_IDENTITY_CACHE_CAPACITY,
    DEFAULT_IDENTITY_CACHE_TTL_SECS, DEFAULT_PORT, MAX_ACCESS_TOKEN_TTL_SECS,
    MAX_IDENTITY_CACHE_TTL_SECS,
};
use crate::error::{Result, WardenError};
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Server configuration parameters
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// JWT secret for token signing/validation
    pub jwt_secret: String,
    /// Lifetime of issued access tokens
    pub access_token_ttl: Duration,
    /// How long resolved users and roles stay cached
    pub identity_cache_ttl: Duration,
    /// Entry bound for each of the user and role caches
    pub identity_cache_capacity: usize,
    /// Permissions granted to roles without an explicit list
    pub default_permissions: DefaultPermissions,
    /// Optional JSON file with roles and users to load at startup
    pub seed_file: Option<PathBuf>,
    /// Redis URL for the shared revocation store
    pub redis_url: Option<String>,
    /// Development mode (relaxes production warnings)
    pub development_mode: bool,
    /// TLS configuration
    pub tls_cert_path: Option<String>,
    pub tls_key_path: Option<String>,
    /// Enable TLS
    pub enable_tls: bool,
}

fn env_flag(name: &str) -> bool {
    env::var(name)
        .map(|v| v.to_lowercase() == "true" || v == "1")
        .unwrap_or(false)
}

fn env_parse<T: std::str::FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

impl ServerConfig {
    /// Create a test configuration - DANGEROUS: Only for testing!
    #[cfg(test)]
    pub fn for_testing() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: DEFAULT_PORT,
            jwt_secret: "unit-test-jwt-key-9f3a7c1e-not-for-production".to_string(),
            access_token_ttl: Duration::from_secs(DEFAULT_ACCESS_TOKEN_TTL_SECS),
            identity_cache_ttl: Duration::from_secs(DEFAULT_IDENTITY_CACHE_TTL_SECS),
            identity_cache_capacity: 128,
            default_permissions: DefaultPermissions::new(["profile:read"]),
            seed_file: None,
            redis_url: None,
            development_mode: true,
            tls_cert_path: None,
            tls_key_path: None,
            enable_tls: false,
        }
    }

    /// Validate that a secret meets security requirements
    fn validate_secret(secret: &str, secret_type: &str) -> Result<()> {
        if secret.len() < 32 {
            return Err(WardenError::ConfigError(format!(
                "{} secret must be at least 32 characters long",
                secret_type
            )));
        }

        // Check for insecure default or example values
        let insecure_patterns = [
            "your-secret-key",
            "change-this",
            "test-secret",
            "default",
            "secret",
            "password",
            "12345",
        ];

        for pattern in &insecure_patterns {
            if secret.contains(pattern) {
                return Err(WardenError::ConfigError(format!(
                    "{} secret contains insecure pattern '{}'. Please use a secure random secret generated with: openssl rand -base64 32",
                    secret_type, pattern
                )));
            }
        }

        // Ensure some complexity
        if secret.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(WardenError::ConfigError(format!(
                "{} secret should contain mixed characters (letters, numbers, symbols) for security",
                secret_type
            )));
        }

        Ok(())
    }

    /// Validate JWT secret meets security requirements
    pub fn validate_jwt_secret(secret: &str) -> Result<()> {
        Self::validate_secret(secret, "JWT")
    }

    /// Default permissions from the inline list, else the JSON file, else none
    fn load_default_permissions() -> Result<DefaultPermissions> {
        if let Some(list) = non_empty_var("RUSTY_WARDEN_DEFAULT_PERMISSIONS") {
            return Ok(DefaultPermissions::from_list(&list));
        }

        match non_empty_var("RUSTY_WARDEN_PERMISSIONS_FILE") {
            Some(path) => DefaultPermissions::load_from_file(&path).map_err(|e| {
                WardenError::ConfigError(format!(
                    "Failed to load default permissions from {}: {}",
                    path, e
                ))
            }),
            None => {
                log::warn!("No default permissions configured; roles without a permission list grant nothing");
                Ok(DefaultPermissions::empty())
            }
        }
    }

    /// Load configuration from environment variables if available
    pub fn from_env() -> Result<Self> {
        let host = env::var("RUSTY_WARDEN_HOST").unwrap_or(DEFAULT_HOST.to_string());
        let port = env_parse("RUSTY_WARDEN_PORT", DEFAULT_PORT);

        let jwt_secret = env::var("RUSTY_WARDEN_JWT_SECRET")
            .or_else(|_| env::var("JWT_SECRET"))
            .map_err(|_| {
                WardenError::ConfigError(
                    "JWT_SECRET environment variable is required for security. \
                     Generate one with: openssl rand -base64 32"
                        .to_string(),
                )
            })?;

        let access_token_secs = env_parse(
            "RUSTY_WARDEN_ACCESS_TOKEN_TTL_SECS",
            DEFAULT_ACCESS_TOKEN_TTL_SECS,
        );
        let cache_ttl_secs = env_parse(
            "RUSTY_WARDEN_IDENTITY_CACHE_TTL_SECS",
            DEFAULT_IDENTITY_CACHE_TTL_SECS,
        );
        let identity_cache_capacity = env_parse(
            "RUSTY_WARDEN_IDENTITY_CACHE_CAPACITY",
            DEFAULT_IDENTITY_CACHE_CAPACITY,
        );

        if access_token_secs == 0 || access_token_secs > MAX_ACCESS_TOKEN_TTL_SECS {
            return Err(WardenError::ConfigError(format!(
                "RUSTY_WARDEN_ACCESS_TOKEN_TTL_SECS must be between 1 and {}",
                MAX_ACCESS_TOKEN_TTL_SECS
            )));
        }
        if cache_ttl_secs == 0 || cache_ttl_secs > MAX_IDENTITY_CACHE_TTL_SECS {
            return Err(WardenError::ConfigError(format!(
                "RUSTY_WARDEN_IDENTITY_CACHE_TTL_SECS must be between 1 and {}",
                MAX_IDENTITY_CACHE_TTL_SECS
            )));
        }
        if identity_cache_capacity == 0 {
            return Err(WardenError::ConfigError(
                "RUSTY_WARDEN_IDENTITY_CACHE_CAPACITY must be greater than zero".to_string(),
            ));
        }

        let default_permissions = Self::load_default_permissions()?;
        let seed_file = non_empty_var("RUSTY_WARDEN_SEED_FILE").map(PathBuf::from);
        let redis_url = non_empty_var("RUSTY_WARDEN_REDIS_URL");

        let development_mode = env_flag("RUSTY_WARDEN_DEVELOPMENT_MODE"); // SECURITY: Default to false (production mode)

        // TLS configuration
        let enable_tls = env_flag("RUSTY_WARDEN_ENABLE_TLS");
        let tls_cert_path = env::var("RUSTY_WARDEN_TLS_CERT_PATH").ok();
        let tls_key_path = env::var("RUSTY_WARDEN_TLS_KEY_PATH").ok();

        // Validate TLS configuration if enabled
        if enable_tls {
            let (Some(cert_path), Some(key_path)) = (&tls_cert_path, &tls_key_path) else {
                return Err(WardenError::ConfigError(
                    "TLS is enabled but RUSTY_WARDEN_TLS_CERT_PATH or RUSTY_WARDEN_TLS_KEY_PATH is not set".to_string(),
                ));
            };

            if !Path::new(cert_path).exists() {
                return Err(WardenError::ConfigError(format!(
                    "TLS certificate file does not exist: {}",
                    cert_path
                )));
            }
            if !Path::new(key_path).exists() {
                return Err(WardenError::ConfigError(format!(
                    "TLS private key file does not exist: {}",
                    key_path
                )));
            }
        }

        Self::validate_jwt_secret(&jwt_secret)?;

        Ok(Self {
            host,
            port,
            jwt_secret,
            access_token_ttl: Duration::from_secs(access_token_secs),
            identity_cache_ttl: Duration::from_secs(cache_ttl_secs),
            identity_cache_capacity,
            default_permissions,
            seed_file,
            redis_url,
            development_mode,
            tls_cert_path,
            tls_key_path,
            enable_tls,
        })
    }

    /// Socket address string for the listener
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
