use anyhow::anyhow;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::{env, fmt};
use url::Url;

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server configuration
    pub server: ServerConfig,
    /// Database configuration
    pub database: DatabaseConfig,
    /// JWT configuration
    pub jwt: JwtConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Mount point for the API routes; empty mounts them at the root.
    pub api_prefix: String,
    pub cors_origins: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// PostgREST base URL. `None` selects the in-memory store.
    pub url: Option<String>,
    pub service_key: String,
    pub users_table: String,
}

#[derive(Clone, Serialize, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    /// Token lifetime; zero issues tokens without an `exp` claim.
    pub expiration_hours: u64,
}

impl fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtConfig")
            .field("secret", &"<redacted>")
            .field("expiration_hours", &self.expiration_hours)
            .finish()
    }
}

impl ServerConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        // Load .env file if it exists
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from any key lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let port = match var("PORT") {
            Some(raw) => raw
                .parse()
                .map_err(|_| anyhow!("Invalid PORT value: {raw}"))?,
            None => 3000,
        };

        let database_url = match var("DATABASE_URL") {
            Some(raw) => {
                Url::parse(&raw).map_err(|e| anyhow!("Invalid DATABASE_URL: {e}"))?;
                Some(raw.trim_end_matches('/').to_string())
            }
            None => None,
        };

        let secret = var("JWT_SECRET").unwrap_or_else(|| {
            tracing::warn!("JWT_SECRET not set; using an ephemeral secret (dev only)");
            ephemeral_secret()
        });

        let expiration_hours = match var("JWT_EXPIRATION_HOURS") {
            Some(raw) => raw
                .parse()
                .map_err(|_| anyhow!("Invalid JWT_EXPIRATION_HOURS value: {raw}"))?,
            None => 24,
        };

        Ok(Self {
            server: ServerConfig {
                host: var("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
                port,
                api_prefix: normalize_prefix(&var("API_PREFIX").unwrap_or_else(|| "/api".to_string())),
                cors_origins: var("CORS_ORIGINS")
                    .unwrap_or_else(|| "*".to_string())
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect(),
            },
            database: DatabaseConfig {
                url: database_url,
                service_key: var("DATABASE_SERVICE_KEY").unwrap_or_default(),
                users_table: var("DATABASE_USERS_TABLE").unwrap_or_else(|| "users".to_string()),
            },
            jwt: JwtConfig {
                secret,
                expiration_hours,
            },
        })
    }

    /// No database configured: requests are served from the in-memory store.
    pub fn is_development(&self) -> bool {
        self.database.url.is_none()
    }
}

fn normalize_prefix(raw: &str) -> String {
    let trimmed = raw.trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("/{trimmed}")
    }
}

fn ephemeral_secret() -> String {
    let mut rng = rand::thread_rng();
    (0..32)
        .map(|_| rng.gen::<u8>())
        .map(|b| format!("{:02x}", b))
        .collect()
}
