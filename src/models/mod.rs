use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Stored user record.
///
/// `password` holds the argon2 digest and is returned as stored by signup,
/// login and `/me`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub password: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Values needed to create a user; the store assigns id and timestamps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    /// Password digest, never the plaintext.
    pub password: String,
}

/// Signup payload
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct SignupRequest {
    pub name: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 6))]
    pub password: String,
}

/// Login payload
#[derive(Debug, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Login response
#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub user: User,
    pub token: String,
}

/// Current user response
#[derive(Debug, Serialize, Deserialize)]
pub struct MeResponse {
    pub user: User,
}
