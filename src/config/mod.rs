use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;

/// Fallback signing secret, only ever accepted in development.
const DEVELOPMENT_JWT_SECRET: &str = "cropwatch-development-secret-change-me";

/// Longest accepted token lifetime (one year).
pub const MAX_JWT_EXPIRY_HOURS: u64 = 24 * 365;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub storage: StorageConfig,
    pub api: ApiConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: Option<String>,
    pub max_connections: u32,
    pub connection_timeout: u64,
    pub run_migrations: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StorageBackend {
    Memory,
    Postgres,
}

impl std::str::FromStr for StorageBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" | "mem" => Ok(StorageBackend::Memory),
            "postgres" | "postgresql" | "pg" => Ok(StorageBackend::Postgres),
            other => Err(format!("unknown storage backend '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    pub seed_sample_data: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub enable_request_logging: bool,
    pub max_request_size_bytes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    /// Empty when neither JWT_SECRET nor SESSION_SECRET is set.
    #[serde(skip_serializing)]
    pub jwt_secret: String,
    pub jwt_expiry_hours: u64,
    pub bcrypt_cost: u32,
    pub enable_cors: bool,
    pub cors_origins: Vec<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("JWT_SECRET (or SESSION_SECRET) must be set in {0:?} mode")]
    MissingJwtSecret(Environment),

    #[error("token expiry must be between 1 and 8760 hours, got {0}")]
    InvalidJwtExpiry(u64),

    #[error("storage backend is postgres but DATABASE_URL is not set")]
    MissingDatabaseUrl,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(self) -> Self {
        self.with_overrides(|key| env::var(key).ok())
    }

    /// Apply per-key overrides read through `var`.
    fn with_overrides(mut self, var: impl Fn(&str) -> Option<String>) -> Self {
        // Server overrides
        if let Some(v) = var("HOST") {
            self.server.host = v;
        }
        if let Some(port) = var("CROPWATCH_PORT")
            .or_else(|| var("PORT"))
            .and_then(|v| v.parse().ok())
        {
            self.server.port = port;
        }

        // Database overrides
        if let Some(v) = var("DATABASE_URL") {
            if !v.trim().is_empty() {
                self.database.url = Some(v);
            }
        }
        if let Some(v) = var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Some(v) = var("DATABASE_CONNECTION_TIMEOUT") {
            self.database.connection_timeout = v.parse().unwrap_or(self.database.connection_timeout);
        }
        if let Some(v) = var("DATABASE_RUN_MIGRATIONS") {
            self.database.run_migrations = v.parse().unwrap_or(self.database.run_migrations);
        }

        // Storage overrides
        self.storage.backend = match var("CROPWATCH_STORAGE") {
            Some(v) => v.parse().unwrap_or(self.default_backend()),
            None => self.default_backend(),
        };
        if let Some(v) = var("CROPWATCH_SEED_SAMPLE_DATA") {
            self.storage.seed_sample_data = v.parse().unwrap_or(self.storage.seed_sample_data);
        }

        // API overrides
        if let Some(v) = var("API_ENABLE_REQUEST_LOGGING") {
            self.api.enable_request_logging = v.parse().unwrap_or(self.api.enable_request_logging);
        }
        if let Some(v) = var("API_MAX_REQUEST_SIZE_BYTES") {
            self.api.max_request_size_bytes = v.parse().unwrap_or(self.api.max_request_size_bytes);
        }

        // Security overrides
        if let Some(secret) = var("JWT_SECRET")
            .or_else(|| var("SESSION_SECRET"))
            .filter(|s| !s.is_empty())
        {
            self.security.jwt_secret = secret;
        }
        if let Some(v) = var("SECURITY_JWT_EXPIRY_HOURS") {
            self.security.jwt_expiry_hours = v
                .parse()
                .ok()
                .filter(|hours| (1..=MAX_JWT_EXPIRY_HOURS).contains(hours))
                .unwrap_or(self.security.jwt_expiry_hours);
        }
        if let Some(v) = var("SECURITY_BCRYPT_COST") {
            self.security.bcrypt_cost = v
                .parse()
                .ok()
                .filter(|cost| (4..=31).contains(cost))
                .unwrap_or(self.security.bcrypt_cost);
        }
        if let Some(v) = var("SECURITY_ENABLE_CORS") {
            self.security.enable_cors = v.parse().unwrap_or(self.security.enable_cors);
        }
        if let Some(v) = var("SECURITY_CORS_ORIGINS") {
            self.security.cors_origins = v
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }

        self
    }

    fn default_backend(&self) -> StorageBackend {
        if self.database.url.is_some() {
            StorageBackend::Postgres
        } else {
            StorageBackend::Memory
        }
    }

    /// Resolve the signing secret, refusing the development fallback outside development.
    pub fn jwt_secret(&self) -> Result<String, ConfigError> {
        if !self.security.jwt_secret.is_empty() {
            return Ok(self.security.jwt_secret.clone());
        }
        match self.environment {
            Environment::Development => {
                tracing::warn!("JWT_SECRET not set, using insecure development secret");
                Ok(DEVELOPMENT_JWT_SECRET.to_string())
            }
            env => Err(ConfigError::MissingJwtSecret(env)),
        }
    }

    pub fn database_url(&self) -> Result<&str, ConfigError> {
        self.database
            .url
            .as_deref()
            .ok_or(ConfigError::MissingDatabaseUrl)
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    pub fn development() -> Self {
        Self {
            environment: Environment::Development,
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 5000,
            },
            database: DatabaseConfig {
                url: None,
                max_connections: 10,
                connection_timeout: 30,
                run_migrations: true,
            },
            storage: StorageConfig {
                backend: StorageBackend::Memory,
                seed_sample_data: true,
            },
            api: ApiConfig {
                enable_request_logging: true,
                max_request_size_bytes: 10 * 1024 * 1024, // 10MB
            },
            security: SecurityConfig {
                jwt_secret: String::new(),
                jwt_expiry_hours: 24 * 7,
                bcrypt_cost: 10,
                enable_cors: true,
                cors_origins: vec![],
            },
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 5000,
            },
            database: DatabaseConfig {
                url: None,
                max_connections: 20,
                connection_timeout: 10,
                run_migrations: true,
            },
            storage: StorageConfig {
                backend: StorageBackend::Postgres,
                seed_sample_data: false,
            },
            api: ApiConfig {
                enable_request_logging: true,
                max_request_size_bytes: 5 * 1024 * 1024, // 5MB
            },
            security: SecurityConfig {
                jwt_secret: String::new(),
                jwt_expiry_hours: 24 * 7,
                bcrypt_cost: 10,
                enable_cors: true,
                cors_origins: vec!["https://staging.cropwatch.example.com".to_string()],
            },
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 5000,
            },
            database: DatabaseConfig {
                url: None,
                max_connections: 50,
                connection_timeout: 5,
                run_migrations: false,
            },
            storage: StorageConfig {
                backend: StorageBackend::Postgres,
                seed_sample_data: false,
            },
            api: ApiConfig {
                enable_request_logging: false,
                max_request_size_bytes: 2 * 1024 * 1024, // 2MB
            },
            security: SecurityConfig {
                jwt_secret: String::new(),
                jwt_expiry_hours: 24 * 7,
                bcrypt_cost: 12,
                enable_cors: true,
                cors_origins: vec!["https://app.cropwatch.example.com".to_string()],
            },
        }
    }
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

// Convenience function for accessing config
pub fn config() -> &'static AppConfig {
    &CONFIG
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_development_config() {
        let config = AppConfig::development();
        assert_eq!(config.storage.backend, StorageBackend::Memory);
        assert!(config.storage.seed_sample_data);
        assert_eq!(config.security.jwt_expiry_hours, 168);
        assert_eq!(config.security.bcrypt_cost, 10);
    }

    #[test]
    fn test_default_production_config() {
        let config = AppConfig::production();
        assert_eq!(config.storage.backend, StorageBackend::Postgres);
        assert!(!config.storage.seed_sample_data);
        assert!(!config.database.run_migrations);
    }

    #[test]
    fn development_falls_back_to_insecure_secret() {
        let config = AppConfig::development();
        assert_eq!(config.jwt_secret().unwrap(), DEVELOPMENT_JWT_SECRET);
    }

    #[test]
    fn production_requires_a_secret() {
        let mut config = AppConfig::production();
        assert!(matches!(
            config.jwt_secret(),
            Err(ConfigError::MissingJwtSecret(Environment::Production))
        ));

        config.security.jwt_secret = "s3cret".to_string();
        assert_eq!(config.jwt_secret().unwrap(), "s3cret");
    }

    fn overridden(pairs: &[(&str, &str)]) -> AppConfig {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::development().with_overrides(|key| vars.get(key).cloned())
    }

    #[test]
    fn out_of_range_expiry_override_keeps_the_default() {
        for raw in ["0", "8761", "18446744073709551615", "-1", "soon"] {
            let config = overridden(&[("SECURITY_JWT_EXPIRY_HOURS", raw)]);
            assert_eq!(config.security.jwt_expiry_hours, 168, "accepted {}", raw);
        }

        let config = overridden(&[("SECURITY_JWT_EXPIRY_HOURS", "24")]);
        assert_eq!(config.security.jwt_expiry_hours, 24);
    }

    #[test]
    fn overrides_apply_on_top_of_the_profile() {
        let config = overridden(&[
            ("PORT", "8080"),
            ("CROPWATCH_STORAGE", "memory"),
            ("SECURITY_BCRYPT_COST", "99"),
            ("JWT_SECRET", "from-env"),
        ]);
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.storage.backend, StorageBackend::Memory);
        assert_eq!(config.security.bcrypt_cost, 10);
        assert_eq!(config.jwt_secret().unwrap(), "from-env");
    }

    #[test]
    fn storage_backend_parses_aliases() {
        assert_eq!("pg".parse::<StorageBackend>().unwrap(), StorageBackend::Postgres);
        assert_eq!("Memory".parse::<StorageBackend>().unwrap(), StorageBackend::Memory);
        assert!("redis".parse::<StorageBackend>().is_err());
    }
}
