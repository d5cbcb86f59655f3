//! User model for storage and API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::ValidationError;

/// Words that cannot be claimed as usernames (they collide with routes or
/// would be confusing in the UI).
pub const RESERVED_USERNAMES: &[&str] = &[
    "admin",
    "administrator",
    "root",
    "system",
    "support",
    "help",
    "api",
    "auth",
    "login",
    "logout",
    "register",
    "signup",
    "settings",
    "profile",
    "account",
    "me",
    "shirts",
    "wishlist",
    "stats",
    "collection",
    "null",
    "undefined",
    "moderator",
    "official",
];

pub const USERNAME_MIN_LEN: usize = 3;
pub const USERNAME_MAX_LEN: usize = 20;

/// How a user signs in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthProvider {
    Local,
    Google,
}

/// User record stored in the `users` collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    /// Lowercase handle; `None` until a Google user picks one
    #[serde(default)]
    pub username: Option<String>,
    /// Lowercase email address
    pub email: String,
    /// Argon2 PHC string; only set for local accounts
    #[serde(default)]
    pub password_hash: Option<String>,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub avatar_public_id: Option<String>,
    pub auth_provider: AuthProvider,
    #[serde(default)]
    pub google_id: Option<String>,
    pub is_profile_complete: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// User as returned by the API (no credentials).
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub username: Option<String>,
    pub email: String,
    pub avatar: Option<String>,
    pub auth_provider: AuthProvider,
    pub is_profile_complete: bool,
    pub has_password: bool,
    pub created_at: DateTime<Utc>,
}

impl From<&User> for PublicUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            name: user.name.clone(),
            username: user.username.clone(),
            email: user.email.clone(),
            avatar: user.avatar.clone(),
            auth_provider: user.auth_provider,
            is_profile_complete: user.is_profile_complete,
            has_password: user.password_hash.is_some(),
            created_at: user.created_at,
        }
    }
}

/// Normalize a username the way it is stored.
pub fn normalize_username(username: &str) -> String {
    username.trim().to_lowercase()
}

/// Check length, charset and the reserved list. Expects a normalized name.
pub fn validate_username(username: &str) -> Result<(), ValidationError> {
    let len = username.chars().count();
    if !(USERNAME_MIN_LEN..=USERNAME_MAX_LEN).contains(&len) {
        return Err(ValidationError::new("username_length").with_message(
            format!(
                "Username must be between {} and {} characters",
                USERNAME_MIN_LEN, USERNAME_MAX_LEN
            )
            .into(),
        ));
    }

    if !username
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
    {
        return Err(ValidationError::new("username_charset").with_message(
            "Username can only contain lowercase letters, numbers and underscores".into(),
        ));
    }

    if RESERVED_USERNAMES.contains(&username) {
        return Err(ValidationError::new("username_reserved")
            .with_message("This username is reserved".into()));
    }

    Ok(())
}
