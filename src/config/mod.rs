//! Application configuration management

use std::env;

use anyhow::{Context, Result};
use chrono::Duration;

use crate::services::AuthConfig;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// Address to bind
    pub host: String,

    /// Server port
    pub port: u16,

    /// MongoDB connection string, or `memory://` for the in-process store
    pub mongodb_uri: String,

    /// Database holding the catalog collections
    pub mongodb_database: String,

    /// JWT secret for signing and verifying tokens
    pub jwt_secret: String,

    /// Token lifetime in seconds (0 = tokens never expire)
    pub token_lifetime_seconds: i64,

    /// Password every user logs in with
    pub login_secret: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),

            port: env::var("PORT")
                .unwrap_or_else(|_| "4000".to_string())
                .parse()
                .context("Invalid PORT")?,

            mongodb_uri: env::var("MONGODB_URI").context("MONGODB_URI is required")?,

            mongodb_database: env::var("MONGODB_DATABASE")
                .unwrap_or_else(|_| "library".to_string()),

            jwt_secret: env::var("JWT_SECRET")
                .context("JWT_SECRET is required")?
                .trim()
                .to_string(),

            token_lifetime_seconds: env::var("TOKEN_LIFETIME_SECONDS")
                .unwrap_or_else(|_| "3600".to_string())
                .parse()
                .context("Invalid TOKEN_LIFETIME_SECONDS")?,

            login_secret: env::var("LOGIN_SHARED_SECRET").unwrap_or_else(|_| "secret".to_string()),
        })
    }

    pub fn auth_config(&self) -> AuthConfig {
        AuthConfig {
            token_lifetime: (self.token_lifetime_seconds > 0)
                .then(|| Duration::seconds(self.token_lifetime_seconds)),
            login_secret: self.login_secret.clone(),
            ..AuthConfig::new(self.jwt_secret.clone())
        }
    }
}
