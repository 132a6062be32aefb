use super::prelude::*;

#[derive(Default)]
pub struct AuthorMutations;

#[Object]
impl AuthorMutations {
    /// Set an author's birth year
    #[graphql(guard = "AuthGuard")]
    async fn edit_author(
        &self,
        ctx: &Context<'_>,
        name: String,
        set_born_to: i32,
    ) -> Result<Author> {
        let db = ctx.data_unchecked::<Database>();

        match db
            .authors()
            .set_born(&name, set_born_to)
            .await
            .bad_input("Editing author failed", &name)?
        {
            Some(author) => {
                tracing::info!(author_id = %author.id, born = set_born_to, "Updated author");
                Ok(author.into())
            }
            None => Err(ApiError::NotFound {
                what: "author",
                invalid_args: name,
            }
            .extend()),
        }
    }
}
