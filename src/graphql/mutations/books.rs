//! Book mutations
//!
//! Both mutations require authentication. Authors are created on demand by
//! `addBook` and removed by `deleteBook` once their last book is gone.

use super::prelude::*;

#[derive(Default)]
pub struct BookMutations;

/// Find the author by name, creating it on first use
async fn find_or_create_author(db: &Database, name: &str) -> Result<AuthorRecord> {
    if let Some(author) = db.authors().get_by_name(name).await.internal()? {
        return Ok(author);
    }

    match db.authors().create(CreateAuthor::named(name)).await {
        Ok(author) => {
            tracing::info!(author_id = %author.id, name = %author.name, "Added new author");
            Ok(author)
        }
        // Created by a concurrent request since the lookup
        Err(DbError::Duplicate { .. }) => db
            .authors()
            .get_by_name(name)
            .await
            .internal()?
            .ok_or_else(|| {
                tracing::error!(%name, "Author vanished after duplicate insert");
                ApiError::Internal.extend()
            }),
        Err(e) => Err(ApiError::from_db(e, "Adding new author failed", name).extend()),
    }
}

#[Object]
impl BookMutations {
    /// Add a book, creating its author if needed
    #[graphql(guard = "AuthGuard")]
    async fn add_book(
        &self,
        ctx: &Context<'_>,
        title: String,
        author_name: String,
        published: i32,
        genres: Vec<String>,
    ) -> Result<Book> {
        let db = ctx.data_unchecked::<Database>();
        let author = find_or_create_author(db, &author_name).await?;

        let record = db
            .books()
            .create(CreateBook {
                title: title.clone(),
                published,
                author_id: author.id.clone(),
                genres,
            })
            .await
            .bad_input("Adding new book failed", &title)?;

        tracing::info!(
            book_id = %record.id,
            title = %record.title,
            author = %author.name,
            user = %ctx.current_user()?.username,
            "Saved new book"
        );
        Ok(Book::new(record, author.into()))
    }

    /// Delete the first book with exactly this title.
    ///
    /// The author is deleted as well when this was their last book. Returns
    /// the book as it was before deletion. A book whose author record is
    /// gone is still deleted, but the mutation then fails since it has no
    /// author to return.
    #[graphql(guard = "AuthGuard")]
    async fn delete_book(&self, ctx: &Context<'_>, title: String) -> Result<Book> {
        let db = ctx.data_unchecked::<Database>();

        let Some(record) = db.books().get_by_title(&title).await.internal()? else {
            return Err(ApiError::NotFound {
                what: "book",
                invalid_args: title,
            }
            .extend());
        };

        let book = populate_book(db, record.clone()).await.internal()?;

        if !db.books().delete(&record.id).await.internal()? {
            // Removed by someone else between lookup and delete
            return Err(ApiError::NotFound {
                what: "book",
                invalid_args: title,
            }
            .extend());
        }
        tracing::info!(book_id = %record.id, title = %record.title, "Deleted book");

        if db
            .authors()
            .delete_if_orphaned(&record.author_id)
            .await
            .internal()?
        {
            tracing::info!(author_id = %record.author_id, "Deleted author without books");
        }

        book.ok_or_else(|| {
            tracing::error!(
                book_id = %record.id,
                author_id = %record.author_id,
                "Deleted book referenced a missing author"
            );
            ApiError::Internal.extend()
        })
    }
}
