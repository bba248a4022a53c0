use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Expected `aud` claim of inbound identity tokens.
    pub project_id: String,
    /// Substring the `iss` claim must contain to be trusted.
    pub trusted_issuer: String,
    /// Where to fetch the identity provider's signing keys. When unset, the
    /// verifier runs claims-only and signature verification is skipped.
    pub jwks_url: Option<String>,
    /// Fallback TTL for the signing-key cache when the provider response
    /// carries no usable cache hint.
    pub key_cache_ttl_secs: u64,
}

const GOOGLE_JWKS_URL: &str =
    "https://www.googleapis.com/service_accounts/v1/jwk/securetoken@system.gserviceaccount.com";

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

    fn with_env_overrides(mut self) -> Self {
        if let Ok(v) = env::var("TEMPLOG_PORT").or_else(|_| env::var("PORT")) {
            self.server.port = v.parse().unwrap_or(self.server.port);
        }
        if let Ok(v) = env::var("DATABASE_URL") {
            self.database.url = v;
        }
        if let Ok(v) = env::var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Ok(v) = env::var("FIREBASE_PROJECT_ID") {
            self.auth.project_id = v;
        }
        if let Ok(v) = env::var("AUTH_TRUSTED_ISSUER") {
            self.auth.trusted_issuer = v;
        }
        if let Ok(v) = env::var("AUTH_JWKS_URL") {
            self.auth.jwks_url = if v.is_empty() { None } else { Some(v) };
        }
        if let Ok(v) = env::var("AUTH_KEY_CACHE_TTL_SECS") {
            self.auth.key_cache_ttl_secs = v.parse().unwrap_or(self.auth.key_cache_ttl_secs);
        }
        self
    }

    fn development() -> Self {
        Self {
            environment: Environment::Development,
            server: ServerConfig { port: 3000 },
            database: DatabaseConfig {
                url: "sqlite:templog.db".to_string(),
                max_connections: 5,
            },
            auth: AuthConfig {
                project_id: "templog-dev".to_string(),
                trusted_issuer: "securetoken.google.com".to_string(),
                // Claims-only in development; the verifier logs a warning.
                jwks_url: None,
                key_cache_ttl_secs: 3600,
            },
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            server: ServerConfig { port: 3000 },
            database: DatabaseConfig {
                url: "sqlite:templog.db".to_string(),
                max_connections: 10,
            },
            auth: AuthConfig {
                project_id: "templog-staging".to_string(),
                trusted_issuer: "securetoken.google.com".to_string(),
                jwks_url: Some(GOOGLE_JWKS_URL.to_string()),
                key_cache_ttl_secs: 3600,
            },
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            server: ServerConfig { port: 3000 },
            database: DatabaseConfig {
                url: "sqlite:templog.db".to_string(),
                max_connections: 20,
            },
            auth: AuthConfig {
                // Must be overridden via FIREBASE_PROJECT_ID in deployment.
                project_id: String::new(),
                trusted_issuer: "securetoken.google.com".to_string(),
                jwks_url: Some(GOOGLE_JWKS_URL.to_string()),
                key_cache_ttl_secs: 3600,
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
