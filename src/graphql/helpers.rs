//! Helper functions shared across GraphQL query/mutation modules.

use std::collections::HashMap;

use crate::db::{BookRecord, Database, DbError};
use crate::graphql::types::{Author, Book};

/// Replace each book's author reference with the full author.
///
/// Authors are fetched in one query. Books whose author no longer exists
/// are dropped with a warning.
pub(crate) async fn populate_books(
    db: &Database,
    records: Vec<BookRecord>,
) -> Result<Vec<Book>, DbError> {
    let mut author_ids: Vec<String> = records.iter().map(|b| b.author_id.clone()).collect();
    author_ids.sort();
    author_ids.dedup();

    let authors: HashMap<String, Author> = db
        .authors()
        .get_many(&author_ids)
        .await?
        .into_iter()
        .map(|a| (a.id.clone(), Author::from(a)))
        .collect();

    Ok(records
        .into_iter()
        .filter_map(|record| match authors.get(&record.author_id).cloned() {
            Some(author) => Some(Book::new(record, author)),
            None => {
                tracing::warn!(
                    book_id = %record.id,
                    author_id = %record.author_id,
                    "Book references a missing author"
                );
                None
            }
        })
        .collect())
}

/// Populate a single book
pub(crate) async fn populate_book(db: &Database, record: BookRecord) -> Result<Option<Book>, DbError> {
    Ok(populate_books(db, vec![record]).await?.pop())
}
