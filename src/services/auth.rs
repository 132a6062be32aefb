//! Authentication service for login and JWT handling
//!
//! Provides:
//! - Login against the shared login secret
//! - JWT token generation and validation
//! - Resolving a bearer token to a stored user

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::db::{Database, DbError, UserRecord};

// ============================================================================
// JWT Claims
// ============================================================================

/// Claims carried by a login token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    pub username: String,
    /// User ID
    pub id: String,
    /// Issued at timestamp
    pub iat: i64,
    /// Expiration timestamp, absent when tokens never expire
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,
}

#[derive(Debug, Error)]
pub enum AuthError {
    /// Unknown username or wrong password. Deliberately does not say which.
    #[error("wrong credentials")]
    InvalidCredentials,

    #[error("invalid token: {0}")]
    InvalidToken(#[from] jsonwebtoken::errors::Error),

    #[error(transparent)]
    Database(#[from] DbError),
}

// ============================================================================
// Configuration
// ============================================================================

/// Auth service configuration
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// JWT signing secret
    pub jwt_secret: String,
    /// Token lifetime; `None` issues tokens without expiry
    pub token_lifetime: Option<Duration>,
    /// Password accepted for every user
    pub login_secret: String,
}

impl AuthConfig {
    pub fn new(jwt_secret: impl Into<String>) -> Self {
        Self {
            jwt_secret: jwt_secret.into(),
            token_lifetime: Some(Duration::hours(1)),
            login_secret: "secret".to_string(),
        }
    }
}

// ============================================================================
// Auth Service
// ============================================================================

/// Authentication service
#[derive(Clone)]
pub struct AuthService {
    config: AuthConfig,
}

impl AuthService {
    pub fn new(config: AuthConfig) -> Self {
        Self { config }
    }

    /// Sign a token for `user` issued now
    pub fn issue_token(&self, user: &UserRecord) -> Result<String, AuthError> {
        self.issue_token_at(user, Utc::now())
    }

    pub(crate) fn issue_token_at(
        &self,
        user: &UserRecord,
        issued_at: DateTime<Utc>,
    ) -> Result<String, AuthError> {
        let claims = TokenClaims {
            username: user.username.clone(),
            id: user.id.clone(),
            iat: issued_at.timestamp(),
            exp: self
                .config
                .token_lifetime
                .map(|lifetime| (issued_at + lifetime).timestamp()),
        };

        Ok(encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.config.jwt_secret.as_bytes()),
        )?)
    }

    /// Check the signature and expiry of a token and return its claims
    pub fn verify_token(&self, token: &str) -> Result<TokenClaims, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_aud = false;
        validation.validate_exp = true;
        // `exp` is still checked when present
        if self.config.token_lifetime.is_none() {
            validation.required_spec_claims.clear();
        }

        let token_data = decode::<TokenClaims>(
            token,
            &DecodingKey::from_secret(self.config.jwt_secret.as_bytes()),
            &validation,
        )?;

        Ok(token_data.claims)
    }

    /// Log in with the shared secret, returning a signed token.
    ///
    /// Users have no stored password; every account accepts the configured
    /// login secret.
    pub async fn login(
        &self,
        db: &Database,
        username: &str,
        password: &str,
    ) -> Result<String, AuthError> {
        let user = db.users().get_by_username(username).await?;

        let user = match user {
            Some(user) if password == self.config.login_secret => user,
            _ => return Err(AuthError::InvalidCredentials),
        };

        self.issue_token(&user)
    }

    /// Resolve a bearer token to the user it was issued for.
    ///
    /// Returns `None` for invalid or expired tokens and for users that no
    /// longer exist.
    pub async fn authenticate(&self, db: &Database, token: &str) -> Option<UserRecord> {
        let claims = match self.verify_token(token) {
            Ok(claims) => claims,
            Err(e) => {
                tracing::debug!(error = %e, "Rejected bearer token");
                return None;
            }
        };

        match db.users().get(&claims.id).await {
            Ok(user) => user,
            Err(e) => {
                tracing::error!(user_id = %claims.id, error = %e, "Failed to load token user");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use pretty_assertions::assert_eq;

    use crate::db::CreateUser;

    fn service() -> AuthService {
        AuthService::new(AuthConfig::new("test-secret"))
    }

    async fn user(db: &Database) -> UserRecord {
        db.users()
            .create(CreateUser {
                username: "mluukkai".into(),
                favorite_genre: "refactoring".into(),
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_token_round_trip() {
        let db = Database::in_memory();
        let user = user(&db).await;
        let auth = service();

        let token = auth.issue_token(&user).unwrap();
        let claims = auth.verify_token(&token).unwrap();
        assert_eq!(claims.username, "mluukkai");
        assert_eq!(claims.id, user.id);
        assert_eq!(claims.exp, Some(claims.iat + 3600));

        assert_eq!(auth.authenticate(&db, &token).await, Some(user));
    }

    #[tokio::test]
    async fn test_expired_token_rejected() {
        let db = Database::in_memory();
        let user = user(&db).await;
        let auth = service();

        let token = auth
            .issue_token_at(&user, Utc::now() - Duration::hours(3))
            .unwrap();
        assert_matches!(auth.verify_token(&token), Err(AuthError::InvalidToken(_)));
        assert_eq!(auth.authenticate(&db, &token).await, None);
    }

    #[tokio::test]
    async fn test_token_signed_with_other_secret_rejected() {
        let db = Database::in_memory();
        let user = user(&db).await;
        let other = AuthService::new(AuthConfig::new("another-secret"));

        let token = other.issue_token(&user).unwrap();
        assert_eq!(service().authenticate(&db, &token).await, None);
    }

    #[tokio::test]
    async fn test_tokens_without_expiry() {
        let db = Database::in_memory();
        let user = user(&db).await;
        let auth = AuthService::new(AuthConfig {
            token_lifetime: None,
            ..AuthConfig::new("test-secret")
        });

        let token = auth
            .issue_token_at(&user, Utc::now() - Duration::days(30))
            .unwrap();
        let claims = auth.verify_token(&token).unwrap();
        assert_eq!(claims.exp, None);
        assert_eq!(auth.authenticate(&db, &token).await, Some(user.clone()));

        // A token carrying `exp` is still bound by it
        let expired = service()
            .issue_token_at(&user, Utc::now() - Duration::hours(3))
            .unwrap();
        assert_matches!(auth.verify_token(&expired), Err(AuthError::InvalidToken(_)));

        // A token without `exp` is refused where expiry is required
        assert_matches!(service().verify_token(&token), Err(AuthError::InvalidToken(_)));
    }

    #[tokio::test]
    async fn test_login_requires_shared_secret() {
        let db = Database::in_memory();
        user(&db).await;
        let auth = service();

        assert!(auth.login(&db, "mluukkai", "secret").await.is_ok());
        assert_matches!(
            auth.login(&db, "mluukkai", "hunter2").await,
            Err(AuthError::InvalidCredentials)
        );
        assert_matches!(
            auth.login(&db, "nobody", "secret").await,
            Err(AuthError::InvalidCredentials)
        );
    }
}
