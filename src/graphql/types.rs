//! GraphQL type definitions
//!
//! These types mirror the stored records but are decorated with
//! async-graphql attributes.

use async_graphql::{ComplexObject, Context, ID, Result, SimpleObject};

use crate::db::{AuthorRecord, AuthorWithBookCount, BookRecord, Database, UserRecord};
use crate::graphql::error::DbResultExt;

/// A book in the catalog
#[derive(Debug, Clone, SimpleObject)]
pub struct Book {
    pub title: String,
    /// Year of publication
    pub published: i32,
    pub author: Author,
    pub genres: Vec<String>,
    pub id: ID,
}

impl Book {
    pub fn new(record: BookRecord, author: Author) -> Self {
        Self {
            title: record.title,
            published: record.published,
            author,
            genres: record.genres,
            id: ID(record.id),
        }
    }
}

/// A book author
#[derive(Debug, Clone, SimpleObject)]
#[graphql(complex)]
pub struct Author {
    pub name: String,
    /// Birth year, if known
    pub born: Option<i32>,
    pub id: ID,
    /// Count already computed by an aggregate query
    #[graphql(skip)]
    pub known_book_count: Option<u64>,
}

#[ComplexObject]
impl Author {
    /// Number of books referencing this author
    async fn book_count(&self, ctx: &Context<'_>) -> Result<i64> {
        if let Some(count) = self.known_book_count {
            return Ok(count as i64);
        }

        let db = ctx.data_unchecked::<Database>();
        let count = db.books().count_by_author(&self.id).await.internal()?;
        Ok(count as i64)
    }
}

impl From<AuthorRecord> for Author {
    fn from(record: AuthorRecord) -> Self {
        Self {
            name: record.name,
            born: record.born,
            id: ID(record.id),
            known_book_count: None,
        }
    }
}

impl From<AuthorWithBookCount> for Author {
    fn from(row: AuthorWithBookCount) -> Self {
        Self {
            known_book_count: Some(row.book_count),
            ..row.author.into()
        }
    }
}

/// A registered user
#[derive(Debug, Clone, SimpleObject)]
pub struct User {
    pub username: String,
    pub favorite_genre: String,
    pub id: ID,
}

impl From<UserRecord> for User {
    fn from(record: UserRecord) -> Self {
        Self {
            username: record.username,
            favorite_genre: record.favorite_genre,
            id: ID(record.id),
        }
    }
}

/// Signed login token, sent back as `Authorization: Bearer <value>`
#[derive(Debug, Clone, SimpleObject)]
pub struct Token {
    pub value: String,
}
