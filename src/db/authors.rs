//! Authors repository

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::DbError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorRecord {
    pub id: String,
    pub name: String,
    pub born: Option<i32>,
}

#[derive(Debug, Clone, Validate)]
pub struct CreateAuthor {
    #[validate(length(min = 3, message = "name must be at least 3 characters"))]
    pub name: String,
    pub born: Option<i32>,
}

impl CreateAuthor {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            born: None,
        }
    }
}

/// Author joined with the number of books referencing it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorWithBookCount {
    pub author: AuthorRecord,
    pub book_count: u64,
}

#[async_trait]
pub trait AuthorStore: Send + Sync {
    async fn count(&self) -> Result<u64, DbError>;

    /// Authors whose id is in `ids`; unknown ids are skipped
    async fn get_many(&self, ids: &[String]) -> Result<Vec<AuthorRecord>, DbError>;

    async fn get_by_name(&self, name: &str) -> Result<Option<AuthorRecord>, DbError>;

    /// Fails with [DbError::Duplicate] if the name is taken
    async fn create(&self, author: CreateAuthor) -> Result<AuthorRecord, DbError>;

    /// Set the birth year of the named author, returning the updated record
    /// or `None` if no author has that name
    async fn set_born(&self, name: &str, born: i32) -> Result<Option<AuthorRecord>, DbError>;

    /// Every author with its computed book count. Authors without books are
    /// included with a count of zero.
    async fn list_with_book_counts(&self) -> Result<Vec<AuthorWithBookCount>, DbError>;

    /// Computed book count for a single author, `None` if the author is gone
    async fn book_count(&self, id: &str) -> Result<Option<u64>, DbError>;

    /// Delete the author if no book references it. Returns whether a
    /// record was removed.
    async fn delete_if_orphaned(&self, id: &str) -> Result<bool, DbError>;
}
