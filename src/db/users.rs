//! Users repository
//!
//! Users carry no credential: login checks a shared secret instead.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::DbError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: String,
    pub username: String,
    pub favorite_genre: String,
}

#[derive(Debug, Clone, Validate)]
pub struct CreateUser {
    #[validate(length(min = 3, message = "username must be at least 3 characters"))]
    pub username: String,
    #[validate(length(min = 1, message = "favorite genre is required"))]
    pub favorite_genre: String,
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn get(&self, id: &str) -> Result<Option<UserRecord>, DbError>;

    async fn get_by_username(&self, username: &str) -> Result<Option<UserRecord>, DbError>;

    /// Fails with [DbError::Duplicate] if the username is taken
    async fn create(&self, user: CreateUser) -> Result<UserRecord, DbError>;
}
