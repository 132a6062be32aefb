use super::prelude::*;

#[derive(Default)]
pub struct AuthorQueries;

#[Object]
impl AuthorQueries {
    /// Number of authors in the catalog
    async fn author_count(&self, ctx: &Context<'_>) -> Result<i64> {
        let db = ctx.data_unchecked::<Database>();
        let count = db.authors().count().await.internal()?;
        Ok(count as i64)
    }

    /// Every author with the number of books referencing them
    async fn all_authors(&self, ctx: &Context<'_>) -> Result<Vec<Author>> {
        let db = ctx.data_unchecked::<Database>();
        let rows = db.authors().list_with_book_counts().await.internal()?;
        Ok(rows.into_iter().map(Author::from).collect())
    }
}
