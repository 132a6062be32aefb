//! Catalog persistence
//!
//! Books, authors and users live in three collections of a document store.
//! Resolvers never talk to a driver directly: they go through the
//! [BookStore], [AuthorStore] and [UserStore] repositories held by a
//! [Database] handle, which is backed either by MongoDB or by an in-process
//! store (tests, `MONGODB_URI=memory://`).

pub mod authors;
pub mod books;
pub mod memory;
pub mod mongo;
pub mod seed;
pub mod users;

use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use thiserror::Error;

pub use authors::{AuthorRecord, AuthorStore, AuthorWithBookCount, CreateAuthor};
pub use books::{BookFilter, BookRecord, BookStore, CreateBook};
pub use memory::MemoryStore;
pub use mongo::MongoStore;
pub use users::{CreateUser, UserRecord, UserStore};

/// URI scheme that selects the in-process store instead of MongoDB
pub const MEMORY_URI: &str = "memory://";

/// Errors raised by the storage layer
#[derive(Debug, Error)]
pub enum DbError {
    /// A field failed its length or presence constraint
    #[error("validation failed: {0}")]
    Validation(#[from] validator::ValidationErrors),

    /// A unique field collided with an existing record
    #[error("{field} `{value}` is already taken")]
    Duplicate { field: &'static str, value: String },

    /// A reference that is not a well-formed record id
    #[error("invalid record id `{0}`")]
    InvalidId(String),

    #[error("database error: {0}")]
    Backend(#[from] mongodb::error::Error),

    #[error("failed to decode document: {0}")]
    Decode(#[from] mongodb::bson::de::Error),
}

impl DbError {
    /// True for errors caused by the caller's input rather than the store
    pub fn is_constraint_violation(&self) -> bool {
        matches!(self, DbError::Validation(_) | DbError::Duplicate { .. })
    }
}

/// Connectivity check shared by all store backends
#[async_trait]
pub trait StoreHealth: Send + Sync {
    async fn ping(&self) -> Result<(), DbError>;
}

/// Handle to the catalog repositories, cloned into every request
#[derive(Clone)]
pub struct Database {
    books: Arc<dyn BookStore>,
    authors: Arc<dyn AuthorStore>,
    users: Arc<dyn UserStore>,
    health: Arc<dyn StoreHealth>,
}

impl Database {
    /// Wrap a single store implementing every repository
    pub fn from_store<S>(store: Arc<S>) -> Self
    where
        S: BookStore + AuthorStore + UserStore + StoreHealth + 'static,
    {
        Self {
            books: store.clone(),
            authors: store.clone(),
            users: store.clone(),
            health: store,
        }
    }

    /// Empty in-process catalog
    pub fn in_memory() -> Self {
        Self::from_store(Arc::new(MemoryStore::default()))
    }

    /// Connect to the store named by `uri`
    pub async fn connect(uri: &str, database_name: &str) -> Result<Self> {
        if uri.starts_with(MEMORY_URI) {
            tracing::warn!("Using in-memory store, data will not survive a restart");
            return Ok(Self::in_memory());
        }

        let store = MongoStore::connect(uri, database_name)
            .await
            .context("Failed to connect to MongoDB")?;
        store
            .ensure_indexes()
            .await
            .context("Failed to create collection indexes")?;

        Ok(Self::from_store(Arc::new(store)))
    }

    pub fn books(&self) -> &dyn BookStore {
        self.books.as_ref()
    }

    pub fn authors(&self) -> &dyn AuthorStore {
        self.authors.as_ref()
    }

    pub fn users(&self) -> &dyn UserStore {
        self.users.as_ref()
    }

    pub async fn ping(&self) -> Result<(), DbError> {
        self.health.ping().await
    }
}
