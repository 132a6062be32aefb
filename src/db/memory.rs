//! In-process store
//!
//! Holds the three collections behind one lock so multi-step operations such
//! as the orphaned-author cleanup are atomic. Ids are generated in the same
//! ObjectId format MongoDB uses.

use async_trait::async_trait;
use mongodb::bson::oid::ObjectId;
use parking_lot::RwLock;
use validator::Validate;

use super::{
    AuthorRecord, AuthorStore, AuthorWithBookCount, BookFilter, BookRecord, BookStore,
    CreateAuthor, CreateBook, CreateUser, DbError, StoreHealth, UserRecord, UserStore,
};

#[derive(Debug, Default)]
struct Collections {
    books: Vec<BookRecord>,
    authors: Vec<AuthorRecord>,
    users: Vec<UserRecord>,
}

impl Collections {
    fn author_by_name(&self, name: &str) -> Option<&AuthorRecord> {
        self.authors.iter().find(|a| a.name == name)
    }

    fn author_name(&self, id: &str) -> Option<&str> {
        self.authors
            .iter()
            .find(|a| a.id == id)
            .map(|a| a.name.as_str())
    }

    fn books_by(&self, author_id: &str) -> u64 {
        self.books.iter().filter(|b| b.author_id == author_id).count() as u64
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: RwLock<Collections>,
}

fn new_id() -> String {
    ObjectId::new().to_hex()
}

#[async_trait]
impl StoreHealth for MemoryStore {
    async fn ping(&self) -> Result<(), DbError> {
        Ok(())
    }
}

#[async_trait]
impl BookStore for MemoryStore {
    async fn count(&self) -> Result<u64, DbError> {
        Ok(self.collections.read().books.len() as u64)
    }

    async fn count_by_author(&self, author_id: &str) -> Result<u64, DbError> {
        Ok(self.collections.read().books_by(author_id))
    }

    async fn list(&self, filter: &BookFilter) -> Result<Vec<BookRecord>, DbError> {
        let collections = self.collections.read();

        if let Some(name) = filter.author_name()
            && collections.author_by_name(name).is_none()
        {
            return Ok(Vec::new());
        }

        Ok(collections
            .books
            .iter()
            .filter(|book| {
                let author = collections.author_name(&book.author_id).unwrap_or_default();
                filter.matches(book, author)
            })
            .cloned()
            .collect())
    }

    async fn list_by_title(&self, title: &str) -> Result<Vec<BookRecord>, DbError> {
        Ok(self
            .collections
            .read()
            .books
            .iter()
            .filter(|b| b.title == title)
            .cloned()
            .collect())
    }

    async fn get_by_title(&self, title: &str) -> Result<Option<BookRecord>, DbError> {
        Ok(self
            .collections
            .read()
            .books
            .iter()
            .find(|b| b.title == title)
            .cloned())
    }

    async fn create(&self, book: CreateBook) -> Result<BookRecord, DbError> {
        book.validate()?;

        let record = BookRecord {
            id: new_id(),
            title: book.title,
            published: book.published,
            author_id: book.author_id,
            genres: book.genres,
        };
        self.collections.write().books.push(record.clone());
        Ok(record)
    }

    async fn delete(&self, id: &str) -> Result<bool, DbError> {
        let mut collections = self.collections.write();
        let before = collections.books.len();
        collections.books.retain(|b| b.id != id);
        Ok(collections.books.len() != before)
    }
}

#[async_trait]
impl AuthorStore for MemoryStore {
    async fn count(&self) -> Result<u64, DbError> {
        Ok(self.collections.read().authors.len() as u64)
    }

    async fn get_many(&self, ids: &[String]) -> Result<Vec<AuthorRecord>, DbError> {
        Ok(self
            .collections
            .read()
            .authors
            .iter()
            .filter(|a| ids.contains(&a.id))
            .cloned()
            .collect())
    }

    async fn get_by_name(&self, name: &str) -> Result<Option<AuthorRecord>, DbError> {
        Ok(self.collections.read().author_by_name(name).cloned())
    }

    async fn create(&self, author: CreateAuthor) -> Result<AuthorRecord, DbError> {
        author.validate()?;

        let mut collections = self.collections.write();
        if collections.author_by_name(&author.name).is_some() {
            return Err(DbError::Duplicate {
                field: "name",
                value: author.name,
            });
        }

        let record = AuthorRecord {
            id: new_id(),
            name: author.name,
            born: author.born,
        };
        collections.authors.push(record.clone());
        Ok(record)
    }

    async fn set_born(&self, name: &str, born: i32) -> Result<Option<AuthorRecord>, DbError> {
        let mut collections = self.collections.write();
        Ok(collections
            .authors
            .iter_mut()
            .find(|a| a.name == name)
            .map(|author| {
                author.born = Some(born);
                author.clone()
            }))
    }

    async fn list_with_book_counts(&self) -> Result<Vec<AuthorWithBookCount>, DbError> {
        let collections = self.collections.read();
        Ok(collections
            .authors
            .iter()
            .map(|author| AuthorWithBookCount {
                author: author.clone(),
                book_count: collections.books_by(&author.id),
            })
            .collect())
    }

    async fn book_count(&self, id: &str) -> Result<Option<u64>, DbError> {
        let collections = self.collections.read();
        Ok(collections
            .authors
            .iter()
            .any(|a| a.id == id)
            .then(|| collections.books_by(id)))
    }

    async fn delete_if_orphaned(&self, id: &str) -> Result<bool, DbError> {
        let mut collections = self.collections.write();
        if collections.books_by(id) > 0 {
            return Ok(false);
        }

        let before = collections.authors.len();
        collections.authors.retain(|a| a.id != id);
        Ok(collections.authors.len() != before)
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn get(&self, id: &str) -> Result<Option<UserRecord>, DbError> {
        Ok(self
            .collections
            .read()
            .users
            .iter()
            .find(|u| u.id == id)
            .cloned())
    }

    async fn get_by_username(&self, username: &str) -> Result<Option<UserRecord>, DbError> {
        Ok(self
            .collections
            .read()
            .users
            .iter()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn create(&self, user: CreateUser) -> Result<UserRecord, DbError> {
        user.validate()?;

        let mut collections = self.collections.write();
        if collections.users.iter().any(|u| u.username == user.username) {
            return Err(DbError::Duplicate {
                field: "username",
                value: user.username,
            });
        }

        let record = UserRecord {
            id: new_id(),
            username: user.username,
            favorite_genre: user.favorite_genre,
        };
        collections.users.push(record.clone());
        Ok(record)
    }
}
