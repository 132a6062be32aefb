use super::prelude::*;

#[derive(Default)]
pub struct BookQueries;

#[Object]
impl BookQueries {
    /// Number of books in the catalog
    async fn book_count(&self, ctx: &Context<'_>) -> Result<i64> {
        let db = ctx.data_unchecked::<Database>();
        let count = db.books().count().await.internal()?;
        Ok(count as i64)
    }

    /// List books, optionally filtered.
    ///
    /// Only one filter applies: `title` (case-insensitive substring) wins,
    /// then `authorName` with `genre`, then `authorName` alone, then `genre`
    /// alone. The genre `"all"` lists every book.
    async fn all_books(
        &self,
        ctx: &Context<'_>,
        author_name: Option<String>,
        genre: Option<String>,
        title: Option<String>,
    ) -> Result<Vec<Book>> {
        let db = ctx.data_unchecked::<Database>();
        let filter = BookFilter::from_args(author_name, genre, title);
        tracing::debug!(?filter, "QUERY allBooks");

        let records = db.books().list(&filter).await.internal()?;
        populate_books(db, records).await.internal()
    }

    /// Books whose title matches exactly
    async fn find_books_by_title(&self, ctx: &Context<'_>, title: String) -> Result<Vec<Book>> {
        let db = ctx.data_unchecked::<Database>();
        tracing::debug!(%title, "QUERY findBooksByTitle");

        let records = db.books().list_by_title(&title).await.internal()?;
        populate_books(db, records).await.internal()
    }
}
