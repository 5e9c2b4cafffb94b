use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::Utc;
use postgrest::Postgrest;
use serde_json::json;
use std::{fmt, sync::Arc};

use crate::{
    models::{NewUser, User},
    utils::config::DatabaseConfig,
};

mod memory;

pub use memory::InMemoryUserStore;

/// Unique-match condition for [`UserStore::find_first`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserFilter<'a> {
    Id(i64),
    Email(&'a str),
}

impl UserFilter<'_> {
    fn column_and_value(&self) -> (&'static str, String) {
        match self {
            UserFilter::Id(id) => ("id", id.to_string()),
            UserFilter::Email(email) => ("email", email.to_string()),
        }
    }
}

/// Failures reported by a user store.
#[derive(Debug)]
pub enum StoreError {
    /// The email is already taken (unique constraint).
    Duplicate,
    /// Connection, query or decoding failure.
    Backend(anyhow::Error),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Duplicate => write!(f, "a user with this email already exists"),
            StoreError::Backend(e) => write!(f, "user store failure: {e:#}"),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<anyhow::Error> for StoreError {
    fn from(err: anyhow::Error) -> Self {
        StoreError::Backend(err)
    }
}

/// Relational user table, reached through find-first / create queries.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// First user matching the filter, if any.
    async fn find_first(&self, filter: UserFilter<'_>) -> Result<Option<User>, StoreError>;

    /// Insert a user; the store assigns the id and timestamps.
    async fn create(&self, user: NewUser) -> Result<User, StoreError>;
}

/// Build the store selected by configuration.
pub fn connect(config: &DatabaseConfig) -> Result<Arc<dyn UserStore>> {
    match &config.url {
        Some(url) => {
            tracing::info!(url = %url, table = %config.users_table, "using PostgREST user store");
            Ok(Arc::new(Database::new(config)?))
        }
        None => {
            tracing::warn!("DATABASE_URL not set; users are kept in memory and lost on restart");
            Ok(Arc::new(InMemoryUserStore::new()))
        }
    }
}

/// PostgREST client wrapper for the users table
#[derive(Clone)]
pub struct Database {
    client: Postgrest,
    users_table: String,
}

impl Database {
    /// Create a new database client
    pub fn new(config: &DatabaseConfig) -> Result<Self> {
        let url = config
            .url
            .as_deref()
            .ok_or_else(|| anyhow!("DATABASE_URL is required for the PostgREST store"))?;

        let mut client = Postgrest::new(url);
        if !config.service_key.is_empty() {
            client = client
                .insert_header("apikey", &config.service_key)
                .insert_header("Authorization", format!("Bearer {}", config.service_key));
        }

        Ok(Self {
            client,
            users_table: config.users_table.clone(),
        })
    }
}

#[async_trait]
impl UserStore for Database {
    async fn find_first(&self, filter: UserFilter<'_>) -> Result<Option<User>, StoreError> {
        let (column, value) = filter.column_and_value();

        let response = self
            .client
            .from(&self.users_table)
            .select("*")
            .eq(column, value)
            .limit(1)
            .execute()
            .await
            .map_err(|e| anyhow!("user lookup request failed: {e}"))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| anyhow!("user lookup response unreadable: {e}"))?;

        if !status.is_success() {
            return Err(anyhow!("user lookup failed with status {status}: {body}").into());
        }

        let rows: Vec<User> =
            serde_json::from_str(&body).map_err(|e| anyhow!("invalid user row: {e}"))?;
        Ok(rows.into_iter().next())
    }

    async fn create(&self, user: NewUser) -> Result<User, StoreError> {
        let now = Utc::now();
        let row = json!({
            "name": user.name,
            "email": user.email,
            "password": user.password,
            "createdAt": now,
            "updatedAt": now,
        });

        let response = self
            .client
            .from(&self.users_table)
            .insert(row.to_string())
            .execute()
            .await
            .map_err(|e| anyhow!("user insert request failed: {e}"))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| anyhow!("user insert response unreadable: {e}"))?;

        // 409 / SQLSTATE 23505: unique violation on email
        if status.as_u16() == 409 || body.contains("\"23505\"") {
            return Err(StoreError::Duplicate);
        }
        if !status.is_success() {
            return Err(anyhow!("user insert failed with status {status}: {body}").into());
        }

        let rows: Vec<User> =
            serde_json::from_str(&body).map_err(|e| anyhow!("invalid user row: {e}"))?;
        rows.into_iter()
            .next()
            .ok_or_else(|| anyhow!("user insert returned no row").into())
    }
}
