//! Application configuration loaded from environment variables.
//!
//! Values are read once at startup (after loading an optional `.env` file)
//! and shared read-only through `AppState`.

use std::env;

/// Which document store backs the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatabaseBackend {
    Firestore,
    Memory,
}

/// Cloudinary credentials. All three must be present to enable uploads.
#[derive(Debug, Clone)]
pub struct CloudinaryConfig {
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: String,
}

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server port
    pub port: u16,
    /// Runtime environment ("development", "production", "test")
    pub environment: String,
    /// Frontend URL allowed by CORS
    pub client_url: String,
    /// GCP project ID (Firestore)
    pub gcp_project_id: String,
    pub database_backend: DatabaseBackend,
    /// OAuth client ID expected as the audience of Google ID tokens
    pub google_client_id: Option<String>,
    pub cloudinary: Option<CloudinaryConfig>,

    /// JWT signing key for session tokens (raw bytes)
    pub jwt_secret: Vec<u8>,
    /// Session token lifetime in seconds
    pub jwt_expire_secs: u64,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let jwt_expire = env::var("JWT_EXPIRE").unwrap_or_else(|_| "30d".to_string());
        let jwt_expire_secs = parse_expiry(&jwt_expire).ok_or(ConfigError::Invalid {
            name: "JWT_EXPIRE",
            value: jwt_expire.clone(),
        })?;

        let database_backend = match env::var("DATABASE_BACKEND")
            .unwrap_or_else(|_| "firestore".to_string())
            .to_ascii_lowercase()
            .as_str()
        {
            "firestore" => DatabaseBackend::Firestore,
            "memory" => DatabaseBackend::Memory,
            other => {
                return Err(ConfigError::Invalid {
                    name: "DATABASE_BACKEND",
                    value: other.to_string(),
                })
            }
        };

        let cloudinary = match (
            non_empty_var("CLOUDINARY_CLOUD_NAME"),
            non_empty_var("CLOUDINARY_API_KEY"),
            non_empty_var("CLOUDINARY_API_SECRET"),
        ) {
            (Some(cloud_name), Some(api_key), Some(api_secret)) => Some(CloudinaryConfig {
                cloud_name,
                api_key,
                api_secret,
            }),
            _ => None,
        };

        Ok(Self {
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),
            environment: env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
            client_url: env::var("CLIENT_URL")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
            gcp_project_id: env::var("GCP_PROJECT_ID").unwrap_or_else(|_| "local-dev".to_string()),
            database_backend,
            google_client_id: non_empty_var("GOOGLE_CLIENT_ID"),
            cloudinary,
            jwt_secret: env::var("JWT_SECRET")
                .map_err(|_| ConfigError::Missing("JWT_SECRET"))?
                .trim()
                .as_bytes()
                .to_vec(),
            jwt_expire_secs,
        })
    }

    /// Default config for testing only.
    pub fn test_default() -> Self {
        Self {
            port: 8080,
            environment: "test".to_string(),
            client_url: "http://localhost:5173".to_string(),
            gcp_project_id: "test-project".to_string(),
            database_backend: DatabaseBackend::Memory,
            google_client_id: Some("test-client.apps.googleusercontent.com".to_string()),
            cloudinary: None,
            jwt_secret: b"test_jwt_key_32_bytes_minimum!!".to_vec(),
            jwt_expire_secs: 30 * 24 * 60 * 60,
        }
    }

    /// Rate limiting is switched off in the test environment.
    pub fn rate_limiting_enabled(&self) -> bool {
        self.environment != "test"
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Parse a token lifetime such as `30d`, `12h`, `45m`, `90s` or `3600`.
pub fn parse_expiry(value: &str) -> Option<u64> {
    let value = value.trim();
    let (digits, multiplier) = match value.chars().last()? {
        'd' => (&value[..value.len() - 1], 24 * 60 * 60),
        'h' => (&value[..value.len() - 1], 60 * 60),
        'm' => (&value[..value.len() - 1], 60),
        's' => (&value[..value.len() - 1], 1),
        c if c.is_ascii_digit() => (value, 1),
        _ => return None,
    };

    let amount: u64 = digits.parse().ok()?;
    if amount == 0 {
        return None;
    }
    amount.checked_mul(multiplier)
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {name}: {value}")]
    Invalid { name: &'static str, value: String },
}
