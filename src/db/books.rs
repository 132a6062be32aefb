//! Books repository

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::DbError;

/// Genre value that clients send to mean "any genre"
pub const ALL_GENRES: &str = "all";

// ============================================================================
// Records
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookRecord {
    pub id: String,
    pub title: String,
    pub published: i32,
    /// Id of the referenced author
    pub author_id: String,
    pub genres: Vec<String>,
}

#[derive(Debug, Clone, Validate)]
pub struct CreateBook {
    #[validate(length(min = 5, message = "title must be at least 5 characters"))]
    pub title: String,
    pub published: i32,
    pub author_id: String,
    pub genres: Vec<String>,
}

// ============================================================================
// Filters
// ============================================================================

/// Selection applied by `allBooks`.
///
/// Built from the optional query arguments with [BookFilter::from_args],
/// which resolves overlapping arguments by a fixed precedence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BookFilter {
    All,
    Author(String),
    Genre(String),
    AuthorAndGenre { author: String, genre: String },
    /// Case-insensitive substring match on the title
    TitleContains(String),
}

impl BookFilter {
    /// Title wins over everything, then author and genre together, then
    /// author alone, then genre alone. The genre `"all"` is no filter and
    /// empty strings count as absent.
    pub fn from_args(
        author_name: Option<String>,
        genre: Option<String>,
        title: Option<String>,
    ) -> Self {
        let given = |arg: Option<String>| arg.filter(|s| !s.is_empty());
        let (author_name, genre) = (given(author_name), given(genre));

        if let Some(title) = given(title) {
            return BookFilter::TitleContains(title);
        }

        match (author_name, genre) {
            (Some(author), Some(genre)) => BookFilter::AuthorAndGenre { author, genre },
            (Some(author), None) => BookFilter::Author(author),
            (None, Some(genre)) if genre == ALL_GENRES => BookFilter::All,
            (None, Some(genre)) => BookFilter::Genre(genre),
            (None, None) => BookFilter::All,
        }
    }

    /// Name of the author this filter is restricted to, if any
    pub fn author_name(&self) -> Option<&str> {
        match self {
            BookFilter::Author(author) | BookFilter::AuthorAndGenre { author, .. } => Some(author),
            _ => None,
        }
    }

    /// In-process evaluation against a record whose author is already known
    pub fn matches(&self, book: &BookRecord, author_name: &str) -> bool {
        match self {
            BookFilter::All => true,
            BookFilter::Author(author) => author == author_name,
            BookFilter::Genre(genre) => book.genres.iter().any(|g| g == genre),
            BookFilter::AuthorAndGenre { author, genre } => {
                author == author_name && book.genres.iter().any(|g| g == genre)
            }
            BookFilter::TitleContains(fragment) => book
                .title
                .to_lowercase()
                .contains(&fragment.to_lowercase()),
        }
    }
}

// ============================================================================
// Repository
// ============================================================================

#[async_trait]
pub trait BookStore: Send + Sync {
    async fn count(&self) -> Result<u64, DbError>;

    /// Books referencing the given author
    async fn count_by_author(&self, author_id: &str) -> Result<u64, DbError>;

    /// Books selected by `filter`, in insertion order. A filter naming an
    /// unknown author selects nothing.
    async fn list(&self, filter: &BookFilter) -> Result<Vec<BookRecord>, DbError>;

    /// Books whose title equals `title` exactly
    async fn list_by_title(&self, title: &str) -> Result<Vec<BookRecord>, DbError>;

    /// First book whose title equals `title` exactly
    async fn get_by_title(&self, title: &str) -> Result<Option<BookRecord>, DbError>;

    async fn create(&self, book: CreateBook) -> Result<BookRecord, DbError>;

    /// Returns false if no book had this id
    async fn delete(&self, id: &str) -> Result<bool, DbError>;
}
