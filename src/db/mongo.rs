//! MongoDB store
//!
//! Collections: `books`, `authors`, `users`. Books reference their author by
//! ObjectId in the `author` field. Uniqueness of author names and usernames
//! is enforced with unique indexes created by [MongoStore::ensure_indexes].

use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::bson::oid::ObjectId;
use mongodb::bson::{self, Document, doc};
use mongodb::error::{ErrorKind, WriteFailure};
use mongodb::options::{IndexOptions, ReturnDocument};
use mongodb::{Client, Collection, IndexModel};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};
use validator::Validate;

use super::{
    AuthorRecord, AuthorStore, AuthorWithBookCount, BookFilter, BookRecord, BookStore,
    CreateAuthor, CreateBook, CreateUser, DbError, StoreHealth, UserRecord, UserStore,
};

const BOOKS: &str = "books";
const AUTHORS: &str = "authors";
const USERS: &str = "users";

/// Server error code for a unique index violation
const DUPLICATE_KEY: i32 = 11000;

// ============================================================================
// Documents
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
struct BookDocument {
    #[serde(rename = "_id")]
    id: ObjectId,
    title: String,
    published: i32,
    author: ObjectId,
    #[serde(default)]
    genres: Vec<String>,
}

impl From<BookDocument> for BookRecord {
    fn from(doc: BookDocument) -> Self {
        Self {
            id: doc.id.to_hex(),
            title: doc.title,
            published: doc.published,
            author_id: doc.author.to_hex(),
            genres: doc.genres,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct AuthorDocument {
    #[serde(rename = "_id")]
    id: ObjectId,
    name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    born: Option<i32>,
}

impl From<AuthorDocument> for AuthorRecord {
    fn from(doc: AuthorDocument) -> Self {
        Self {
            id: doc.id.to_hex(),
            name: doc.name,
            born: doc.born,
        }
    }
}

/// Row produced by the author/book-count aggregation
#[derive(Debug, Deserialize)]
struct AuthorCountDocument {
    #[serde(rename = "_id")]
    id: ObjectId,
    name: String,
    #[serde(default)]
    born: Option<i32>,
    #[serde(rename = "bookCount")]
    book_count: i64,
}

impl From<AuthorCountDocument> for AuthorWithBookCount {
    fn from(doc: AuthorCountDocument) -> Self {
        Self {
            author: AuthorRecord {
                id: doc.id.to_hex(),
                name: doc.name,
                born: doc.born,
            },
            book_count: doc.book_count.max(0) as u64,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct UserDocument {
    #[serde(rename = "_id")]
    id: ObjectId,
    username: String,
    #[serde(rename = "favoriteGenre")]
    favorite_genre: String,
}

impl From<UserDocument> for UserRecord {
    fn from(doc: UserDocument) -> Self {
        Self {
            id: doc.id.to_hex(),
            username: doc.username,
            favorite_genre: doc.favorite_genre,
        }
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Ids that do not parse as ObjectIds cannot match any document
fn parse_id(id: &str) -> Option<ObjectId> {
    ObjectId::parse_str(id).ok()
}

fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    matches!(
        err.kind.as_ref(),
        ErrorKind::Write(WriteFailure::WriteError(write_error)) if write_error.code == DUPLICATE_KEY
    )
}

/// `$lookup` every author's books and project the count, optionally
/// restricted to the authors matched by `filter`
fn book_count_pipeline(filter: Option<Document>) -> Vec<Document> {
    let mut pipeline = Vec::with_capacity(3);
    if let Some(filter) = filter {
        pipeline.push(doc! { "$match": filter });
    }
    pipeline.push(doc! {
        "$lookup": {
            "from": BOOKS,
            "localField": "_id",
            "foreignField": "author",
            "as": "bookList",
        }
    });
    pipeline.push(doc! {
        "$project": {
            "name": "$name",
            "born": "$born",
            "bookCount": { "$size": "$bookList" },
        }
    });
    pipeline
}

// ============================================================================
// Store
// ============================================================================

#[derive(Clone)]
pub struct MongoStore {
    database: mongodb::Database,
    books: Collection<BookDocument>,
    authors: Collection<AuthorDocument>,
    users: Collection<UserDocument>,
}

impl MongoStore {
    pub async fn connect(uri: &str, database_name: &str) -> Result<Self, DbError> {
        debug!(database = database_name, "Connecting to MongoDB");
        let client = Client::with_uri_str(uri).await?;
        let database = client.database(database_name);

        Ok(Self {
            books: database.collection(BOOKS),
            authors: database.collection(AUTHORS),
            users: database.collection(USERS),
            database,
        })
    }

    /// Create the unique indexes backing the name constraints. Existing
    /// identical indexes are left alone by the server.
    pub async fn ensure_indexes(&self) -> Result<(), DbError> {
        let unique = || IndexOptions::builder().unique(true).build();

        trace!("Ensuring unique index on authors.name");
        self.authors
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "name": 1 })
                    .options(unique())
                    .build(),
            )
            .await?;

        trace!("Ensuring unique index on users.username");
        self.users
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "username": 1 })
                    .options(unique())
                    .build(),
            )
            .await?;

        trace!("Ensuring index on books.author");
        self.books
            .create_index(IndexModel::builder().keys(doc! { "author": 1 }).build())
            .await?;

        Ok(())
    }

    async fn find_books(&self, filter: Document) -> Result<Vec<BookRecord>, DbError> {
        Ok(self
            .books
            .find(filter)
            .await?
            .map_ok(BookRecord::from)
            .try_collect::<Vec<_>>()
            .await?)
    }

    async fn author_id_by_name(&self, name: &str) -> Result<Option<ObjectId>, DbError> {
        Ok(self
            .authors
            .find_one(doc! { "name": name })
            .await?
            .map(|author| author.id))
    }

    async fn aggregate_book_counts(
        &self,
        filter: Option<Document>,
    ) -> Result<Vec<AuthorWithBookCount>, DbError> {
        let mut cursor = self.authors.aggregate(book_count_pipeline(filter)).await?;

        let mut authors = Vec::new();
        while let Some(row) = cursor.try_next().await? {
            let row: AuthorCountDocument = bson::from_document(row)?;
            authors.push(row.into());
        }
        Ok(authors)
    }
}

#[async_trait]
impl StoreHealth for MongoStore {
    async fn ping(&self) -> Result<(), DbError> {
        self.database.run_command(doc! { "ping": 1 }).await?;
        Ok(())
    }
}

#[async_trait]
impl BookStore for MongoStore {
    async fn count(&self) -> Result<u64, DbError> {
        Ok(self.books.count_documents(doc! {}).await?)
    }

    async fn count_by_author(&self, author_id: &str) -> Result<u64, DbError> {
        let Some(author) = parse_id(author_id) else {
            return Ok(0);
        };
        Ok(self.books.count_documents(doc! { "author": author }).await?)
    }

    async fn list(&self, filter: &BookFilter) -> Result<Vec<BookRecord>, DbError> {
        let query = match filter {
            BookFilter::All => doc! {},
            BookFilter::Genre(genre) => doc! { "genres": genre.as_str() },
            BookFilter::TitleContains(fragment) => doc! {
                "title": { "$regex": regex::escape(fragment), "$options": "i" }
            },
            BookFilter::Author(name) => match self.author_id_by_name(name).await? {
                Some(author) => doc! { "author": author },
                None => return Ok(Vec::new()),
            },
            BookFilter::AuthorAndGenre { author, genre } => {
                match self.author_id_by_name(author).await? {
                    Some(author) => doc! { "author": author, "genres": genre.as_str() },
                    None => return Ok(Vec::new()),
                }
            }
        };

        debug!(?filter, "Listing books");
        self.find_books(query).await
    }

    async fn list_by_title(&self, title: &str) -> Result<Vec<BookRecord>, DbError> {
        self.find_books(doc! { "title": title }).await
    }

    async fn get_by_title(&self, title: &str) -> Result<Option<BookRecord>, DbError> {
        Ok(self
            .books
            .find_one(doc! { "title": title })
            .await?
            .map(BookRecord::from))
    }

    async fn create(&self, book: CreateBook) -> Result<BookRecord, DbError> {
        book.validate()?;

        let author = parse_id(&book.author_id)
            .ok_or_else(|| DbError::InvalidId(book.author_id.clone()))?;
        let document = BookDocument {
            id: ObjectId::new(),
            title: book.title,
            published: book.published,
            author,
            genres: book.genres,
        };

        self.books.insert_one(&document).await?;
        Ok(document.into())
    }

    async fn delete(&self, id: &str) -> Result<bool, DbError> {
        let Some(id) = parse_id(id) else {
            return Ok(false);
        };
        let result = self.books.delete_one(doc! { "_id": id }).await?;
        Ok(result.deleted_count > 0)
    }
}

#[async_trait]
impl AuthorStore for MongoStore {
    async fn count(&self) -> Result<u64, DbError> {
        Ok(self.authors.count_documents(doc! {}).await?)
    }

    async fn get_many(&self, ids: &[String]) -> Result<Vec<AuthorRecord>, DbError> {
        let ids: Vec<ObjectId> = ids.iter().filter_map(|id| parse_id(id)).collect();
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        Ok(self
            .authors
            .find(doc! { "_id": { "$in": ids } })
            .await?
            .map_ok(AuthorRecord::from)
            .try_collect::<Vec<_>>()
            .await?)
    }

    async fn get_by_name(&self, name: &str) -> Result<Option<AuthorRecord>, DbError> {
        Ok(self
            .authors
            .find_one(doc! { "name": name })
            .await?
            .map(AuthorRecord::from))
    }

    async fn create(&self, author: CreateAuthor) -> Result<AuthorRecord, DbError> {
        author.validate()?;

        let document = AuthorDocument {
            id: ObjectId::new(),
            name: author.name,
            born: author.born,
        };

        match self.authors.insert_one(&document).await {
            Ok(_) => Ok(document.into()),
            Err(e) if is_duplicate_key(&e) => Err(DbError::Duplicate {
                field: "name",
                value: document.name,
            }),
            Err(e) => Err(e.into()),
        }
    }

    async fn set_born(&self, name: &str, born: i32) -> Result<Option<AuthorRecord>, DbError> {
        Ok(self
            .authors
            .find_one_and_update(doc! { "name": name }, doc! { "$set": { "born": born } })
            .return_document(ReturnDocument::After)
            .await?
            .map(AuthorRecord::from))
    }

    async fn list_with_book_counts(&self) -> Result<Vec<AuthorWithBookCount>, DbError> {
        self.aggregate_book_counts(None).await
    }

    async fn book_count(&self, id: &str) -> Result<Option<u64>, DbError> {
        let Some(id) = parse_id(id) else {
            return Ok(None);
        };
        Ok(self
            .aggregate_book_counts(Some(doc! { "_id": id }))
            .await?
            .into_iter()
            .next()
            .map(|author| author.book_count))
    }

    async fn delete_if_orphaned(&self, id: &str) -> Result<bool, DbError> {
        // Count and delete are two round trips; a book added for this author
        // in between is left referencing a deleted author.
        if self.book_count(id).await? != Some(0) {
            return Ok(false);
        }

        let Some(id) = parse_id(id) else {
            return Ok(false);
        };
        let result = self.authors.delete_one(doc! { "_id": id }).await?;
        Ok(result.deleted_count > 0)
    }
}

#[async_trait]
impl UserStore for MongoStore {
    async fn get(&self, id: &str) -> Result<Option<UserRecord>, DbError> {
        let Some(id) = parse_id(id) else {
            return Ok(None);
        };
        Ok(self
            .users
            .find_one(doc! { "_id": id })
            .await?
            .map(UserRecord::from))
    }

    async fn get_by_username(&self, username: &str) -> Result<Option<UserRecord>, DbError> {
        Ok(self
            .users
            .find_one(doc! { "username": username })
            .await?
            .map(UserRecord::from))
    }

    async fn create(&self, user: CreateUser) -> Result<UserRecord, DbError> {
        user.validate()?;

        let document = UserDocument {
            id: ObjectId::new(),
            username: user.username,
            favorite_genre: user.favorite_genre,
        };

        match self.users.insert_one(&document).await {
            Ok(_) => Ok(document.into()),
            Err(e) if is_duplicate_key(&e) => Err(DbError::Duplicate {
                field: "username",
                value: document.username,
            }),
            Err(e) => Err(e.into()),
        }
    }
}
